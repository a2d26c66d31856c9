//! Map an external port to a local port on whichever gateway answers first.
//!
//! Usage: cargo run --example add_port -- <tcp|udp> <internal port> <external port> [lease seconds]

use std::env;
use std::time::Duration;

use simplelog::{Config as LogConfig, LevelFilter, SimpleLogger};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 3 {
        println!("Usage: add_port <tcp|udp> <internal port> <external port> [lease seconds]");
        return;
    }
    let protocol = args[0].as_str();
    let internal_port: u16 = args[1].parse().expect("Invalid internal port");
    let external_port: u16 = args[2].parse().expect("Invalid external port");
    let lease: u64 = match args.get(3) {
        Some(lease) => lease.parse().expect("Invalid lease"),
        None => 3600,
    };

    let _ = SimpleLogger::init(LevelFilter::Info, LogConfig::default());

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
            println!("No gateway found.");
            return;
        }
    };

    match gateway.add_port_mapping(
        protocol,
        internal_port,
        external_port,
        "nat-add-port-example",
        Duration::from_secs(lease),
    ) {
        Ok(()) => println!(
            "{} mapping added: external {} -> internal {} for {}s",
            gateway.nat_type(),
            external_port,
            internal_port,
            lease
        ),
        Err(err) => println!("Failed to add port mapping: {}", err),
    }
}
