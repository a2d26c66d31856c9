use std::error;
use std::fmt;
use std::io;

/// Errors returned by the operations of a [`Nat`](crate::Nat).
#[derive(Debug)]
pub enum Error {
    /// No local address could be found on the gateway's network.
    NoInternalAddress,
    /// The gateway did not report a usable external address.
    NoExternalAddress,
    /// The gateway mapped a different external port than the one requested.
    ExternalPortInUse(u16),
    /// IO error while inspecting the local host.
    IoError(io::Error),
    /// The NAT-PMP client failed.
    NatPmpError(natpmp::Error),
    /// No UPnP gateway was found.
    SearchError(igd::SearchError),
    /// The UPnP gateway refused to report its external address.
    GetExternalIpError(igd::GetExternalIpError),
    /// The UPnP gateway refused to add the port mapping.
    AddPortError(igd::AddPortError),
    /// The UPnP gateway refused to remove the port mapping.
    RemovePortError(igd::RemovePortError),
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<natpmp::Error> for Error {
    fn from(err: natpmp::Error) -> Error {
        Error::NatPmpError(err)
    }
}

impl From<igd::SearchError> for Error {
    fn from(err: igd::SearchError) -> Error {
        Error::SearchError(err)
    }
}

impl From<igd::GetExternalIpError> for Error {
    fn from(err: igd::GetExternalIpError) -> Error {
        Error::GetExternalIpError(err)
    }
}

impl From<igd::AddPortError> for Error {
    fn from(err: igd::AddPortError) -> Error {
        Error::AddPortError(err)
    }
}

impl From<igd::RemovePortError> for Error {
    fn from(err: igd::RemovePortError) -> Error {
        Error::RemovePortError(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::NoInternalAddress => write!(f, "no internal address"),
            Error::NoExternalAddress => write!(f, "no external address"),
            Error::ExternalPortInUse(port) => write!(f, "external port {} already in use", port),
            Error::IoError(ref e) => write!(f, "IO error: {}", e),
            Error::NatPmpError(ref e) => write!(f, "NAT-PMP error: {:?}", e),
            Error::SearchError(ref e) => write!(f, "UPnP search error: {}", e),
            Error::GetExternalIpError(ref e) => write!(f, "UPnP external address error: {}", e),
            Error::AddPortError(ref e) => write!(f, "UPnP add port error: {}", e),
            Error::RemovePortError(ref e) => write!(f, "UPnP remove port error: {}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref e) => Some(e),
            Error::SearchError(ref e) => Some(e),
            Error::GetExternalIpError(ref e) => Some(e),
            Error::AddPortError(ref e) => Some(e),
            Error::RemovePortError(ref e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_named_conditions() {
        assert_eq!(Error::NoInternalAddress.to_string(), "no internal address");
        assert_eq!(Error::NoExternalAddress.to_string(), "no external address");
        assert_eq!(
            Error::ExternalPortInUse(8080).to_string(),
            "external port 8080 already in use"
        );
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error as _;

        let err = Error::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(err.source().is_some());
        assert!(Error::NoExternalAddress.source().is_none());
    }
}
