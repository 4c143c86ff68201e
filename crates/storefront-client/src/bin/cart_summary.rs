//! # Cart Summary
//!
//! Prints the guest cart stored on this device with line and order totals.
//!
//! ## Usage
//! ```bash
//! # Purchase totals for the guest cart in the default data directory
//! cargo run -p storefront-client --bin cart_summary
//!
//! # Rental totals, using a specific config file
//! cargo run -p storefront-client --bin cart_summary -- --rental --config ./storefront.toml
//! ```
//!
//! Set `RUST_LOG=debug` to see storage and pricing logs.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use storefront_client::{ApiClient, CartStore, ClientConfig, FileStorage};
use storefront_core::pricing::{aggregate, line_total};
use storefront_core::{Session, TransactionType};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut transaction_type = TransactionType::Purchase;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--rental" | "-r" => transaction_type = TransactionType::Rental,
            "--help" | "-h" => {
                println!("Storefront Cart Summary");
                println!();
                println!("Usage: cart_summary [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -r, --rental         Price lines as a rental instead of a purchase");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing();

    let config = ClientConfig::load_or_default(config_path);
    let data_dir = config.data_dir();
    let storage = Arc::new(FileStorage::new(&data_dir));
    let api = Arc::new(ApiClient::from_config(&config)?);

    let cart = CartStore::new(Session::Guest, storage, api)
        .with_cart_key(config.storage.cart_key.clone());
    let items = cart.load().await;

    println!("Cart: {}", data_dir.display());
    println!("Mode: {}", transaction_type);
    println!();

    if items.is_empty() {
        println!("The cart is empty.");
        return Ok(());
    }

    for item in &items {
        let total = match line_total(item, transaction_type) {
            Ok(total) => total.to_string(),
            Err(e) => format!("({})", e),
        };
        println!(
            "  {:<30} {:>8} {:>6} {:>10}  x{:<3} {}",
            item.product_name, item.color, item.size, item.condition, item.quantity, total
        );
    }
    println!();

    match aggregate(&items, transaction_type, None) {
        Ok(costs) => {
            println!("Subtotal:      {}", costs.sub_total);
            println!("Transport fee: {}", costs.transport_fee);
            println!("Total:         {}", costs.total_amount);
        }
        Err(e) => println!("Cannot price this cart: {}", e),
    }

    Ok(())
}
