//! CLI smoke entry point.
//!
//! Wires config, logging, storage and the money codec together, saves one
//! coffee and prints what a lookup by name returns.
//!
//! Usage: `coffee_cli [NAME] [PRICE_MINOR]` (defaults: `latte`, `12000`).

use coffee_core::db::{open_db, open_db_in_memory};
use coffee_core::{
    core_version, init_logging, Coffee, CoffeeRepository, ConversionRegistry, Money,
    SqliteCoffeeRepository, StoreConfig,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;

const DEFAULT_NAME: &str = "latte";
const DEFAULT_PRICE_MINOR: i64 = 12_000;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("coffee_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| DEFAULT_NAME.to_string());
    let price_minor = match args.next() {
        Some(raw) => raw.parse::<i64>()?,
        None => DEFAULT_PRICE_MINOR,
    };

    let config = StoreConfig::from_env()?;
    if let Some(logging) = &config.logging {
        init_logging(logging)?;
    }

    let conn = match &config.db_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let conversions = ConversionRegistry::with_money_codec(config.money_codec());
    let repo = SqliteCoffeeRepository::try_new(&conn, &conversions)?;

    let saved = repo.save(&Coffee::new(
        name.as_str(),
        Money::of_minor(config.currency, price_minor),
    ))?;
    info!(
        "event=cli_save module=cli status=ok id={:?} name={}",
        saved.id, saved.name
    );

    println!("coffee_core version={}", core_version());
    for coffee in repo.find_by_name(&name)? {
        println!(
            "coffee id={} name={} price={} minor={} created={}",
            coffee.id.unwrap_or_default(),
            coffee.name,
            coffee.price,
            coffee.price.minor_amount(),
            coffee.create_time.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}
