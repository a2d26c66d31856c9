use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nat::upnp::{self, IgdClient, Upnp};
use nat::{Error, Nat, PortMappingProtocol};

type Mapping = (u16, u32, String);

/// In-memory IGD keyed by (protocol, external port).
#[derive(Default)]
struct Device {
    mappings: HashMap<(PortMappingProtocol, u16), Mapping>,
    calls: usize,
}

#[derive(Clone, Default)]
struct MockDevice(Arc<Mutex<Device>>);

impl MockDevice {
    fn mappings(&self) -> HashMap<(PortMappingProtocol, u16), Mapping> {
        self.0.lock().unwrap().mappings.clone()
    }

    fn calls(&self) -> usize {
        self.0.lock().unwrap().calls
    }
}

fn io_error(kind: io::ErrorKind, message: &str) -> Error {
    Error::IoError(io::Error::new(kind, message))
}

fn ip(text: &str) -> IpAddr {
    text.parse().unwrap()
}

impl IgdClient for MockDevice {
    fn gateway_host(&self) -> String {
        "192.168.1.1".to_string()
    }

    fn local_host(&self) -> String {
        "192.168.1.50".to_string()
    }

    fn external_ip(&mut self) -> nat::Result<String> {
        self.0.lock().unwrap().calls += 1;
        Ok("198.51.100.7".to_string())
    }

    // Renewing a mapping is allowed, taking another port's slot is not.
    fn add_port_mapping(
        &mut self,
        protocol: PortMappingProtocol,
        internal_port: u16,
        external_port: u16,
        lease_duration: u32,
        description: &str,
    ) -> nat::Result<()> {
        let mut device = self.0.lock().unwrap();
        device.calls += 1;
        let key = (protocol, external_port);
        if let Some(&(mapped, _, _)) = device.mappings.get(&key) {
            if mapped != internal_port {
                let kind = io::ErrorKind::AddrInUse;
                return Err(io_error(kind, "718 ConflictInMappingEntry"));
            }
        }
        let mapping = (internal_port, lease_duration, description.to_string());
        device.mappings.insert(key, mapping);
        Ok(())
    }

    fn delete_port_mapping(
        &mut self,
        protocol: PortMappingProtocol,
        external_port: u16,
    ) -> nat::Result<()> {
        let mut device = self.0.lock().unwrap();
        device.calls += 1;
        match device.mappings.remove(&(protocol, external_port)) {
            Some(_) => Ok(()),
            None => Err(io_error(io::ErrorKind::NotFound, "714 NoSuchEntryInArray")),
        }
    }
}

#[test]
fn add_then_delete_restores_device() {
    for protocol in &["tcp", "udp", "Udp"] {
        let device = MockDevice::default();
        let mut nat = Upnp::new(device.clone(), "UPNP");

        let lease = Duration::from_secs(120);
        nat.add_port_mapping(protocol, 4000, 5000, "test mapping", lease)
            .unwrap();
        let expected = PortMappingProtocol::from_name(protocol);
        assert_eq!(
            device.mappings().get(&(expected, 5000)),
            Some(&(4000, 120, "test mapping".to_string()))
        );

        nat.delete_port_mapping(protocol, 4000, 5000).unwrap();
        assert!(device.mappings().is_empty());
    }
}

#[test]
fn conflicting_mapping_error_reaches_caller() {
    let device = MockDevice::default();
    let mut nat = Upnp::new(device.clone(), "UPNP");
    let lease = Duration::from_secs(60);
    nat.add_port_mapping("tcp", 4000, 5000, "first", lease)
        .unwrap();

    let err = nat
        .add_port_mapping("TCP", 4001, 5000, "second", lease)
        .unwrap_err();
    match err {
        Error::IoError(ref inner) => assert_eq!(inner.kind(), io::ErrorKind::AddrInUse),
        ref other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("718"));
    assert_eq!(
        device.mappings().get(&(PortMappingProtocol::TCP, 5000)),
        Some(&(4000, 60, "first".to_string()))
    );
}

#[test]
fn renewing_a_mapping_is_not_a_conflict() {
    let device = MockDevice::default();
    let mut nat = Upnp::new(device.clone(), "UPNP");

    nat.add_port_mapping("udp", 4000, 5000, "test", Duration::from_secs(60))
        .unwrap();
    nat.add_port_mapping("udp", 4000, 5000, "test", Duration::from_secs(90))
        .unwrap();
    assert_eq!(
        device.mappings().get(&(PortMappingProtocol::UDP, 5000)),
        Some(&(4000, 90, "test".to_string()))
    );
}

#[test]
fn delete_of_unknown_mapping_still_succeeds() {
    let device = MockDevice::default();
    let mut nat = Upnp::new(device.clone(), "UPNP");

    assert!(nat.delete_port_mapping("tcp", 4000, 5000).is_ok());
    assert_eq!(device.calls(), 1);
}

#[test]
fn invalid_protocol_fails_before_any_call() {
    for protocol in &["icmp", ""] {
        let device = MockDevice::default();
        let mut nat = Upnp::new(device.clone(), "UPNP");

        let added = panic::catch_unwind(AssertUnwindSafe(|| {
            let lease = Duration::from_secs(60);
            nat.add_port_mapping(protocol, 4000, 5000, "test", lease)
        }));
        assert!(added.is_err());
        let deleted = panic::catch_unwind(AssertUnwindSafe(|| {
            nat.delete_port_mapping(protocol, 4000, 5000)
        }));
        assert!(deleted.is_err());

        assert_eq!(device.calls(), 0);
    }
}

#[test]
fn addresses_are_parsed_from_device() {
    let mut nat = Upnp::new(MockDevice::default(), "UPNP");
    assert_eq!(nat.external_address().unwrap(), ip("198.51.100.7"));
    assert_eq!(nat.device_address().unwrap(), ip("192.168.1.1"));
    assert_eq!(nat.internal_address().unwrap(), ip("192.168.1.50"));
}

#[tokio::test]
async fn discovery_publishes_found_device() {
    let device = MockDevice::default();
    let discovery = upnp::discover_with(move || Ok(device), "UPNP");

    let nat = tokio::time::timeout(Duration::from_secs(5), discovery)
        .await
        .unwrap();
    assert_eq!(nat.nat_type(), "UPNP");
    assert_eq!(nat.device_address().unwrap(), ip("192.168.1.1"));
}

#[tokio::test]
async fn discovery_is_silent_when_search_times_out() {
    let discovery = upnp::discover_with(
        || -> nat::Result<MockDevice> {
            std::thread::sleep(Duration::from_millis(50));
            Err(io_error(io::ErrorKind::TimedOut, "SSDP search timed out"))
        },
        "UPNP",
    );
    let waited = tokio::time::timeout(Duration::from_millis(300), discovery).await;
    assert!(waited.is_err());
}

#[tokio::test]
async fn first_answering_backend_wins() {
    let slow = upnp::discover_with(
        || -> nat::Result<MockDevice> {
            std::thread::sleep(Duration::from_secs(2));
            Ok(MockDevice::default())
        },
        "SLOW",
    );
    let fast = upnp::discover_with(|| Ok(MockDevice::default()), "FAST");

    let winner = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::select! {
            nat = slow => nat,
            nat = fast => nat,
        }
    })
    .await
    .unwrap();
    assert_eq!(winner.nat_type(), "FAST");
}
