//! HarvestAP - participation token with pro-rata FARM redemption
//!
//! Single binary with subcommands:
//!   harvest-ap accounts [N]        - List development accounts
//!   harvest-ap init-config [PATH]  - Write a default config file
//!   harvest-ap simulate            - Deploy locally and run the redemption scenario

mod accounts;
mod init_config;
mod simulate;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("accounts") => {
            accounts::run(&args[2..]);
        }
        Some("init-config") => {
            if let Err(e) = init_config::run(&args[2..]) {
                eprintln!("Config error: {e}");
                std::process::exit(1);
            }
        }
        Some("simulate") => {
            let simulate_args = args[2..].to_vec();
            if let Err(e) = simulate::run(simulate_args) {
                eprintln!("Simulation error: {e:#}");
                std::process::exit(1);
            }
        }
        Some("--version") | Some("-V") => {
            println!("harvest-ap {}", harvest_ap::VERSION);
        }
        Some("--help") | Some("-h") | None => {
            print_help();
        }
        Some(other) => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_help();
            std::process::exit(2);
        }
    }
}

fn print_help() {
    println!("HarvestAP v{}", harvest_ap::VERSION);
    println!("Active Participation token with pro-rata FARM redemption");
    println!();
    println!("USAGE:");
    println!("    harvest-ap [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("    accounts [N]        List the first N development accounts (default 5)");
    println!("    init-config [PATH]  Write a default config (default ~/.harvest-ap/config.toml)");
    println!("    simulate            Deploy on a local chain and run the redemption scenario");
    println!("                          --config <PATH>  Load settings from a TOML file");
    println!("                          --json           Print the report as JSON");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help      Print help");
    println!("    -V, --version   Print version");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG        Log filter (overrides the config's log_filter)");
    println!("    ETHERSCAN_KEY   Block explorer API key (also read from .env)");
}
