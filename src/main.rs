//! geolocator CLI entry point
//!
//! Device / IP location lookup with reverse geocoding

use geolocator::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
