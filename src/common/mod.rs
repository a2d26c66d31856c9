pub mod interfaces;
pub mod options;

pub use self::options::DiscoveryOptions;

use std::convert::TryFrom;
use std::time::Duration;

/// Lease duration in whole seconds, as carried on the wire by both protocols.
pub fn lease_seconds(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX)
}
