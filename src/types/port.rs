//! Port types with validation and parsing.
//!
//! `Port` keeps every target's port in 1-65535. `PortSpec` parses the
//! comma/range lists used to configure which ports are treated as HTTP.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Parse a decimal port token as found in target lists.
    ///
    /// Only plain ASCII digits are accepted: no sign, no whitespace.
    pub fn parse_token(token: &str) -> Option<Self> {
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        token.parse::<u16>().ok().and_then(Self::new)
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u16),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("empty port specification")]
    Empty,
}

/// An inclusive range of ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct PortRange {
    start: Port,
    end: Port,
}

impl PortRange {
    fn new(start: Port, end: Port) -> Result<Self, PortError> {
        if start.0 > end.0 {
            Err(PortError::InvalidRange(start.0, end.0))
        } else {
            Ok(Self { start, end })
        }
    }

    const fn single(port: Port) -> Self {
        Self { start: port, end: port }
    }

    fn iter(&self) -> impl Iterator<Item = u16> {
        self.start.0..=self.end.0
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A port list such as `"80,443,8000-8010"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    ranges: Vec<PortRange>,
}

impl PortSpec {
    /// Ports probed with an HTTP GET unless configured otherwise.
    pub const DEFAULT_HTTP: &'static [u16] = &[80, 8000, 8008, 8080, 8443, 8888];

    /// Build a spec from explicit port numbers, skipping port 0.
    pub fn from_ports(ports: &[u16]) -> Self {
        let ranges = ports
            .iter()
            .filter_map(|&p| Port::new(p))
            .map(PortRange::single)
            .collect();
        Self { ranges }
    }

    /// The default HTTP port set.
    pub fn default_http() -> Self {
        Self::from_ports(Self::DEFAULT_HTTP)
    }

    /// All ports as a sorted set.
    pub fn to_set(&self) -> BTreeSet<u16> {
        self.ranges.iter().flat_map(|r| r.iter()).collect()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromStr for PortSpec {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortError::Empty);
        }

        let mut ranges = Vec::new();

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('-') {
                Some((lo, hi)) => {
                    let start = parse_bound(lo)?;
                    let end = parse_bound(hi)?;
                    ranges.push(PortRange::new(start, end)?);
                }
                None => ranges.push(PortRange::single(parse_bound(part)?)),
            }
        }

        if ranges.is_empty() {
            return Err(PortError::Empty);
        }

        Ok(Self { ranges })
    }
}

fn parse_bound(token: &str) -> Result<Port, PortError> {
    let token = token.trim();
    let value: u16 = token
        .parse()
        .map_err(|_| PortError::InvalidFormat(token.to_string()))?;
    Port::new(value).ok_or(PortError::OutOfRange(value))
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(65535).is_some());
    }

    #[test]
    fn test_parse_token() {
        assert_eq!(Port::parse_token("8080"), Port::new(8080));
        assert_eq!(Port::parse_token("0"), None);
        assert_eq!(Port::parse_token("65536"), None);
        assert_eq!(Port::parse_token("+80"), None);
        assert_eq!(Port::parse_token(" 80"), None);
        assert_eq!(Port::parse_token("http"), None);
        assert_eq!(Port::parse_token(""), None);
    }

    #[test]
    fn test_port_serde_rejects_zero() {
        assert!(serde_json::from_str::<Port>("0").is_err());
        assert_eq!(serde_json::from_str::<Port>("443").unwrap().as_u16(), 443);
    }

    #[test]
    fn test_port_spec_parsing() {
        let spec: PortSpec = "80,443".parse().unwrap();
        assert_eq!(spec.to_set().len(), 2);

        let spec: PortSpec = "22,80,8000-8010".parse().unwrap();
        assert_eq!(spec.to_set().len(), 13);
        assert_eq!(spec.to_string(), "22,80,8000-8010");

        assert_eq!("100-50".parse::<PortSpec>(), Err(PortError::InvalidRange(100, 50)));
        assert!("abc".parse::<PortSpec>().is_err());
        assert_eq!("".parse::<PortSpec>(), Err(PortError::Empty));
    }

    #[test]
    fn test_default_http_set() {
        let set = PortSpec::default_http().to_set();
        for port in [80, 8000, 8008, 8080, 8443, 8888] {
            assert!(set.contains(&port));
        }
        assert!(!set.contains(&443));
    }
}
