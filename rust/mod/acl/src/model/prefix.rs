use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a host prefix string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefixError {
    #[error("invalid prefix {0:?}: no '/'")]
    MissingBits(String),

    #[error("invalid prefix {0:?}: bad address")]
    InvalidAddr(String),

    #[error("invalid prefix {0:?}: bad bits after slash")]
    InvalidBits(String),

    #[error("invalid prefix {text:?}: {bits} bits exceeds {max}")]
    OutOfRange { text: String, bits: u8, max: u8 },
}

/// An IP address with a prefix length, e.g. `100.64.0.0/10` or `fd7a::1/128`.
///
/// The address is kept exactly as written (host bits are not masked), so the
/// text form round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostPrefix {
    addr: IpAddr,
    bits: u8,
}

impl HostPrefix {
    pub fn new(addr: IpAddr, bits: u8) -> Result<Self, PrefixError> {
        let max = max_bits(&addr);
        if bits > max {
            return Err(PrefixError::OutOfRange {
                text: format!("{}/{}", addr, bits),
                bits,
                max,
            });
        }
        Ok(Self { addr, bits })
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.bits
    }
}

fn max_bits(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

impl FromStr for HostPrefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, bits) = s
            .split_once('/')
            .ok_or_else(|| PrefixError::MissingBits(s.to_string()))?;

        let addr: IpAddr = addr
            .parse()
            .map_err(|_| PrefixError::InvalidAddr(s.to_string()))?;

        // Plain decimal only: no sign, no leading zeros.
        let canonical = !bits.is_empty()
            && bits.bytes().all(|b| b.is_ascii_digit())
            && (bits == "0" || !bits.starts_with('0'));
        if !canonical {
            return Err(PrefixError::InvalidBits(s.to_string()));
        }
        let bits: u8 = bits
            .parse()
            .map_err(|_| PrefixError::InvalidBits(s.to_string()))?;

        let max = max_bits(&addr);
        if bits > max {
            return Err(PrefixError::OutOfRange {
                text: s.to_string(),
                bits,
                max,
            });
        }
        Ok(Self { addr, bits })
    }
}

impl fmt::Display for HostPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.bits)
    }
}

impl TryFrom<String> for HostPrefix {
    type Error = PrefixError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HostPrefix> for String {
    fn from(value: HostPrefix) -> Self {
        value.to_string()
    }
}
