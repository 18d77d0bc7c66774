//! Local redemption scenario
//!
//! Deploys FARM, HarvestAP and two redemption authorities on an in-memory
//! chain, mints the configured allocations, then walks the upgrade path:
//! redeem half of the first holder's AP, migrate to the upgrade authority,
//! redeem the rest, and confirm the retired authority can no longer burn.

use std::path::PathBuf;

use anyhow::{bail, Context};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use harvest_ap::{Address, Amount, ChainClient, ChainState, Deployment, HarvestConfig};

/// Parsed `simulate` options
#[derive(Default)]
struct SimulateArgs {
    config_path: Option<PathBuf>,
    json: bool,
}

fn parse_args(args: Vec<String>) -> SimulateArgs {
    let mut parsed = SimulateArgs::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    parsed.config_path = Some(PathBuf::from(&args[i]));
                }
            }
            "--json" => parsed.json = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => eprintln!("Ignoring unknown argument {other:?}"),
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!("HarvestAP local simulation");
    println!();
    println!("USAGE:");
    println!("    harvest-ap simulate [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>   Config TOML (defaults are used when omitted)");
    println!("    --json                Print the report as JSON");
    println!("    -h, --help            Print help");
}

#[derive(Debug, Serialize)]
struct RedeemStep {
    authority: String,
    amount: Amount,
    payout: Amount,
}

#[derive(Debug, Serialize)]
struct Report {
    chain_id: String,
    network: String,
    explorer_key_loaded: bool,
    farm: String,
    ap: String,
    original_authority: String,
    upgrade_authority: String,
    holder: String,
    first_redeem: RedeemStep,
    migrated: Amount,
    second_redeem: RedeemStep,
    stale_redeem_rejected: String,
    total_payout: Amount,
    ap_supply: Amount,
    original_pool: Amount,
    upgrade_pool: Amount,
    blocks: u64,
    state_root: String,
}

fn init_logging(fallback: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let args = parse_args(args);

    let config = match &args.config_path {
        Some(path) => HarvestConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let mut config = HarvestConfig::default();
            config.load_env();
            config
        }
    };

    init_logging(&config.log_filter)?;

    let report = scenario(&config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

async fn scenario(config: &HarvestConfig) -> anyhow::Result<Report> {
    let admin = config.admin_address()?;
    let mints = config.initial_mints()?;
    let Some(&(holder, _)) = mints.first() else {
        bail!("simulation needs at least one entry in `mints`");
    };

    info!(
        chain_id = %config.chain_id,
        network = %config.network.name,
        admin = %admin,
        "Starting simulation"
    );

    let client = ChainClient::new(ChainState::new(config.max_call_depth));
    let deployment = Deployment::deploy(&client, admin, config.reward_pool_amount()).await?;

    for (to, amount) in &mints {
        client.mint(admin, deployment.ap, *to, *amount).await?;
    }

    let balance = client.balance_of(deployment.ap, holder).await?;
    if balance.is_zero() {
        bail!("first holder {holder} was minted no AP");
    }
    let first_amount = Amount::from_raw(balance.raw() / 2);
    let second_amount = Amount::from_raw(balance.raw() - first_amount.raw());

    let first_payout = client
        .redeem(holder, deployment.redemption, first_amount)
        .await?;

    let migrated = client
        .set_redemption(admin, deployment.ap, deployment.upgrade)
        .await?;

    let second_payout = client
        .redeem(holder, deployment.upgrade, second_amount)
        .await?;

    client
        .mint(admin, deployment.ap, holder, Amount::from_raw(5))
        .await?;
    let stale_redeem_rejected = match client
        .redeem(holder, deployment.redemption, Amount::from_raw(5))
        .await
    {
        Ok(payout) => bail!("retired authority paid out {payout}"),
        Err(e) => e.to_string(),
    };

    let total_payout = client.reward_balance(deployment.farm, holder).await?;

    Ok(Report {
        chain_id: config.chain_id.clone(),
        network: config.network.name.clone(),
        explorer_key_loaded: config.explorer_api_key.is_some(),
        farm: deployment.farm.to_hex(),
        ap: deployment.ap.to_hex(),
        original_authority: deployment.redemption.to_hex(),
        upgrade_authority: deployment.upgrade.to_hex(),
        holder: holder.to_hex(),
        first_redeem: step(deployment.redemption, first_amount, first_payout),
        migrated,
        second_redeem: step(deployment.upgrade, second_amount, second_payout),
        stale_redeem_rejected,
        total_payout,
        ap_supply: client.total_supply(deployment.ap).await?,
        original_pool: client.pool(deployment.redemption).await?,
        upgrade_pool: client.pool(deployment.upgrade).await?,
        blocks: client.block_number().await,
        state_root: client.state_root().await.to_hex(),
    })
}

fn step(authority: Address, amount: Amount, payout: Amount) -> RedeemStep {
    RedeemStep {
        authority: authority.to_hex(),
        amount,
        payout,
    }
}

fn print_report(report: &Report) {
    println!("HarvestAP simulation on {} ({})", report.chain_id, report.network);
    println!("----------------------------------------------------------------");
    println!("FARM:                 {}", report.farm);
    println!("HarvestAP:            {}", report.ap);
    println!("Original authority:   {}", report.original_authority);
    println!("Upgrade authority:    {}", report.upgrade_authority);
    println!();
    println!(
        "Redeemed {} AP for {} FARM",
        report.first_redeem.amount, report.first_redeem.payout
    );
    println!("Migrated {} FARM to the upgrade authority", report.migrated);
    println!(
        "Redeemed {} AP for {} FARM",
        report.second_redeem.amount, report.second_redeem.payout
    );
    println!("Stale redeem rejected: {}", report.stale_redeem_rejected);
    println!();
    println!("Holder FARM:          {}", report.total_payout);
    println!("AP supply:            {}", report.ap_supply);
    println!("Original pool:        {}", report.original_pool);
    println!("Upgrade pool:         {}", report.upgrade_pool);
    println!("Blocks:               {}", report.blocks);
    println!("State root:           {}", report.state_root);
    println!("----------------------------------------------------------------");
}
