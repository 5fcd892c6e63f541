//! Host identity resolution for attachment requests.
//!
//! Resolution degrades gracefully: a missing initiator file yields an empty
//! initiator set and an unreachable interface table falls back to the
//! loopback address. Only the host name is allowed to fail outright, and
//! the provisioning workflow decides whether any degraded value is fatal.

use std::net::Ipv4Addr;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::HostInfo;

const INITIATOR_KEY: &str = "InitiatorName=";

/// Errors raised when the local environment cannot report host identity.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum IdentityError {
    /// Raised when the OS host name is not valid UTF-8.
    #[error("host name reported by the operating system is not valid UTF-8")]
    InvalidHostName,
    /// Raised when the OS reports an empty host name.
    #[error("operating system reported an empty host name")]
    EmptyHostName,
}

/// Reads the initiator name file and returns every configured initiator,
/// preserving file order.
///
/// An unreadable file is not an error at this layer: it logs a warning and
/// returns an empty set, leaving the caller to decide whether that is fatal.
#[must_use]
pub fn resolve_initiators(path: &Utf8Path) -> Vec<String> {
    let contents = match std::fs::read_to_string(path.as_std_path()) {
        Ok(contents) => contents,
        Err(err) => {
            warn!("could not read initiator configuration {path}: {err}");
            return Vec::new();
        }
    };

    let initiators = parse_initiators(&contents);
    debug!("found initiators in {path}: {initiators:?}");
    initiators
}

fn parse_initiators(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| {
            let record = line.trim();
            if record.starts_with('#') {
                return None;
            }
            record
                .strip_prefix(INITIATOR_KEY)
                .map(|value| value.trim().to_owned())
        })
        .filter(|value| !value.is_empty())
        .collect()
}

/// Returns the first non-loopback IPv4 interface address, falling back to
/// `127.0.0.1` when none exists.
///
/// The result is a pure function of the current interface table, so
/// repeated calls in an unchanged environment return the same address.
#[must_use]
pub fn resolve_host_ip() -> Ipv4Addr {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(err) => {
            warn!("could not enumerate network interfaces: {err}");
            return Ipv4Addr::LOCALHOST;
        }
    };

    select_host_ip(
        interfaces
            .into_iter()
            .filter_map(|interface| match interface.addr {
                if_addrs::IfAddr::V4(v4) => Some(v4.ip),
                if_addrs::IfAddr::V6(_) => None,
            }),
    )
}

fn select_host_ip(candidates: impl IntoIterator<Item = Ipv4Addr>) -> Ipv4Addr {
    candidates
        .into_iter()
        .find(|ip| !ip.is_loopback())
        .unwrap_or(Ipv4Addr::LOCALHOST)
}

/// Returns the host name reported by the operating system.
///
/// # Errors
///
/// Returns [`IdentityError`] when the OS value is empty or not valid UTF-8.
pub fn resolve_host_name() -> Result<String, IdentityError> {
    let name = gethostname::gethostname()
        .into_string()
        .map_err(|_| IdentityError::InvalidHostName)?;
    if name.trim().is_empty() {
        return Err(IdentityError::EmptyHostName);
    }
    Ok(name)
}

/// Identity of the local host, resolved fresh per attachment attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostIdentity {
    /// Host name reported by the operating system.
    pub host: String,
    /// CPU architecture of the running binary.
    pub platform: String,
    /// Operating system identifier of the running binary.
    pub os_type: String,
    /// First non-loopback IPv4 address, or the loopback fallback.
    pub ip: Ipv4Addr,
    /// Every initiator found in the initiator name file, in file order.
    pub initiators: Vec<String>,
}

impl HostIdentity {
    /// Returns the initiator the workflow should use, or `None` when the
    /// host has no configured initiator. Callers must branch on the empty
    /// case explicitly instead of indexing the set.
    #[must_use]
    pub fn primary_initiator(&self) -> Option<&str> {
        self.initiators.first().map(String::as_str)
    }

    /// Builds the attachment host info using the given initiator.
    #[must_use]
    pub fn host_info_with(&self, initiator: &str) -> HostInfo {
        HostInfo {
            host: self.host.clone(),
            platform: self.platform.clone(),
            os_type: self.os_type.clone(),
            ip: self.ip.to_string(),
            initiator: initiator.to_owned(),
        }
    }
}

/// Source of host identity, a seam for substituting fixed identities in
/// tests.
pub trait IdentitySource {
    /// Resolves the current host identity.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the host name cannot be determined.
    fn resolve(&self) -> Result<HostIdentity, IdentityError>;
}

/// Identity source backed by the running operating system.
#[derive(Clone, Debug)]
pub struct SystemIdentity {
    initiator_path: Utf8PathBuf,
}

impl SystemIdentity {
    /// Creates a system identity source reading initiators from the given
    /// path.
    #[must_use]
    pub fn new(initiator_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            initiator_path: initiator_path.into(),
        }
    }
}

impl IdentitySource for SystemIdentity {
    fn resolve(&self) -> Result<HostIdentity, IdentityError> {
        let host = resolve_host_name()?;
        Ok(HostIdentity {
            host,
            platform: std::env::consts::ARCH.to_owned(),
            os_type: std::env::consts::OS.to_owned(),
            ip: resolve_host_ip(),
            initiators: resolve_initiators(&self.initiator_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;

    use super::*;

    fn identity(initiators: Vec<String>) -> HostIdentity {
        HostIdentity {
            host: String::from("node-1"),
            platform: String::from("x86_64"),
            os_type: String::from("linux"),
            ip: Ipv4Addr::new(192, 0, 2, 10),
            initiators,
        }
    }

    #[test]
    fn parse_extracts_single_initiator() {
        let initiators = parse_initiators("InitiatorName=iqn.1994-05.com.example:test\n");
        assert_eq!(
            initiators,
            vec![String::from("iqn.1994-05.com.example:test")]
        );
    }

    #[rstest]
    #[case("# InitiatorName=iqn.commented\n", 0)]
    #[case("InitiatorName=\n", 0)]
    #[case("InitiatorAlias=alias\nInitiatorName=iqn.a\nInitiatorName=iqn.b\n", 2)]
    #[case("", 0)]
    fn parse_handles_varied_files(#[case] contents: &str, #[case] expected: usize) {
        assert_eq!(parse_initiators(contents).len(), expected);
    }

    #[test]
    fn parse_preserves_file_order() {
        let initiators = parse_initiators("InitiatorName=iqn.first\nInitiatorName=iqn.second\n");
        assert_eq!(initiators.first().map(String::as_str), Some("iqn.first"));
    }

    #[test]
    fn missing_file_yields_empty_set() {
        let initiators = resolve_initiators(Utf8Path::new("/nonexistent/initiatorname.iscsi"));
        assert!(initiators.is_empty());
    }

    #[test]
    fn readable_file_yields_initiators() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("initiatorname.iscsi");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "## DO NOT EDIT OR REMOVE THIS FILE!").expect("write");
        writeln!(file, "InitiatorName=iqn.1994-05.com.example:test").expect("write");

        let utf8_path = Utf8Path::from_path(&path).expect("utf8 path");
        let initiators = resolve_initiators(utf8_path);
        assert_eq!(
            initiators,
            vec![String::from("iqn.1994-05.com.example:test")]
        );
    }

    #[test]
    fn host_ip_resolution_is_idempotent() {
        assert_eq!(resolve_host_ip(), resolve_host_ip());
    }

    #[test]
    fn ip_selection_falls_back_to_loopback_without_candidates() {
        assert_eq!(select_host_ip([]), Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn ip_selection_skips_loopback_only_interfaces() {
        assert_eq!(
            select_host_ip([Ipv4Addr::LOCALHOST, Ipv4Addr::new(127, 0, 0, 53)]),
            Ipv4Addr::LOCALHOST
        );
    }

    #[test]
    fn ip_selection_takes_the_first_routable_address() {
        let selected = select_host_ip([
            Ipv4Addr::LOCALHOST,
            Ipv4Addr::new(192, 0, 2, 10),
            Ipv4Addr::new(198, 51, 100, 7),
        ]);
        assert_eq!(selected, Ipv4Addr::new(192, 0, 2, 10));
    }

    #[test]
    fn primary_initiator_is_first_entry() {
        let id = identity(vec![String::from("iqn.a"), String::from("iqn.b")]);
        assert_eq!(id.primary_initiator(), Some("iqn.a"));
    }

    #[test]
    fn primary_initiator_empty_set_is_none() {
        assert_eq!(identity(Vec::new()).primary_initiator(), None);
    }

    #[test]
    fn host_info_carries_selected_initiator() {
        let info = identity(vec![String::from("iqn.a")]).host_info_with("iqn.a");
        assert_eq!(info.initiator, "iqn.a");
        assert_eq!(info.ip, "192.0.2.10");
    }
}
