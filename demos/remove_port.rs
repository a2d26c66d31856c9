//! Remove a port mapping, using NAT-PMP if available and UPnP otherwise.
//!
//! Usage: cargo run --example remove_port -- <tcp|udp> <internal port> <external port>

use std::env;
use std::time::Duration;

use simplelog::{Config as LogConfig, LevelFilter, SimpleLogger};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 3 {
        println!("Usage: remove_port <tcp|udp> <internal port> <external port>");
        return;
    }
    let internal_port: u16 = args[1].parse().expect("Invalid internal port");
    let external_port: u16 = args[2].parse().expect("Invalid external port");

    let _ = SimpleLogger::init(LevelFilter::Info, LogConfig::default());

    let natpmp = nat::discover_natpmp();
    let upnp = nat::discover_upnp();

    // Wait for both, then prefer NAT-PMP.
    let deadline = Duration::from_secs(15);
    let (natpmp, upnp) = tokio::join!(
        tokio::time::timeout(deadline, natpmp),
        tokio::time::timeout(deadline, upnp)
    );
    let mut gateway = match natpmp.or(upnp) {
        Ok(gateway) => gateway,
        Err(_) => {
            println!("No gateway found.");
            return;
        }
    };

    let protocol = args[0].as_str();
    match gateway.delete_port_mapping(protocol, internal_port, external_port) {
        Ok(()) => println!(
            "{} mapping for port {} removed.",
            gateway.nat_type(),
            external_port
        ),
        Err(err) => println!("Failed to remove port mapping: {}", err),
    }
}
