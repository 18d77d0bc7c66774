//! Development account listing
//!
//! Usage:
//!   harvest-ap accounts       List the first 5 accounts
//!   harvest-ap accounts 10    List the first 10 accounts

use harvest_ap::Address;

const DEFAULT_COUNT: u32 = 5;

pub fn run(args: &[String]) {
    let count = match args.first() {
        Some(n) => match n.parse::<u32>() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("Error: account count must be a number, got {n:?}");
                std::process::exit(1);
            }
        },
        None => DEFAULT_COUNT,
    };

    for index in 0..count {
        println!("{index:>3}  {}", Address::dev_account(index));
    }
}
