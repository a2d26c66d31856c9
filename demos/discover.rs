//! Race NAT-PMP and UPnP discovery and report the first gateway found.
//!
//! Usage: cargo run --example discover

use std::time::Duration;

use simplelog::{Config as LogConfig, LevelFilter, SimpleLogger};

#[tokio::main]
async fn main() {
    let _ = SimpleLogger::init(LevelFilter::Debug, LogConfig::default());

    let natpmp = nat::discover_natpmp();
    let upnp = nat::discover_upnp();

    let found = tokio::time::timeout(Duration::from_secs(15), async {
        tokio::select! {
            nat = natpmp => nat,
            nat = upnp => nat,
        }
    })
    .await;

    let mut gateway = match found {
        Ok(gateway) => gateway,
        Err(_) => {
            println!("No NAT-PMP or UPnP gateway found.");
            return;
        }
    };

    println!("Protocol: {}", gateway.nat_type());
    match gateway.device_address() {
        Ok(ip) => println!("Gateway: {}", ip),
        Err(err) => println!("Gateway: {}", err),
    }
    match gateway.internal_address() {
        Ok(ip) => println!("Internal address: {}", ip),
        Err(err) => println!("Internal address: {}", err),
    }
    match gateway.external_address() {
        Ok(ip) => println!("External address: {}", ip),
        Err(err) => println!("External address: {}", err),
    }
}
