//! This library discovers the NAT gateway of the local network and controls
//! it through one interface, whichever protocol the gateway speaks.
//!
//! Two backends are supported: NAT-PMP and UPnP IGD. Each has its own
//! discovery function, which returns a [`Discovery`] immediately and searches
//! in the background. How the two are combined (first to answer, a preferred
//! protocol, a deadline) is up to the caller:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! # async fn run() {
//! let natpmp = nat::discover_natpmp();
//! let upnp = nat::discover_upnp();
//!
//! let found = tokio::time::timeout(Duration::from_secs(10), async {
//!     tokio::select! {
//!         nat = natpmp => nat,
//!         nat = upnp => nat,
//!     }
//! })
//! .await;
//!
//! if let Ok(mut nat) = found {
//!     let external = nat.external_address();
//!     println!("{} gateway, external address {:?}", nat.nat_type(), external);
//! }
//! # }
//! ```
//!
//! A backend that finds no gateway simply never resolves its [`Discovery`];
//! errors only surface from the operations of a found [`Nat`].
#![deny(missing_docs)]

#[macro_use]
extern crate log;

// data structures
pub use self::common::DiscoveryOptions;
pub use self::discovery::Discovery;
pub use self::errors::{Error, Result};
pub use self::nat::{Nat, PortMappingProtocol};

mod common;
mod discovery;
mod errors;
mod nat;
pub mod pmp;
pub mod upnp;

/// Start searching for a NAT-PMP gateway with default options.
pub fn discover_natpmp() -> Discovery {
    pmp::discover(&DiscoveryOptions::default())
}

/// Start searching for a NAT-PMP gateway.
pub fn discover_natpmp_with(options: &DiscoveryOptions) -> Discovery {
    pmp::discover(options)
}

/// Start searching for a UPnP gateway with default options.
pub fn discover_upnp() -> Discovery {
    upnp::discover(&DiscoveryOptions::default())
}

/// Start searching for a UPnP gateway.
pub fn discover_upnp_with(options: &DiscoveryOptions) -> Discovery {
    upnp::discover(options)
}
