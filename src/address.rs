//! IPv4 address classification and public address selection.
//!
//! Joyent machines report every address bound to them, including loopback,
//! link-local and RFC 1918 ranges. Bootstrapping needs an address reachable
//! from the workstation, so candidates are classified and the first publicly
//! routable one wins.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

/// Routing class of an IPv4 address.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AddressClass {
    /// `127.0.0.0/8`.
    Loopback,
    /// `169.254.0.0/16`.
    LinkLocal,
    /// `10.0.0.0/8`, `172.16.0.0/12` or `192.168.0.0/16`.
    Private,
    /// Anything outside the reserved ranges above.
    Public,
}

impl AddressClass {
    /// Returns `true` when an address of this class is usable for SSH from
    /// outside the provider's network.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

impl fmt::Display for AddressClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Loopback => "loopback",
            Self::LinkLocal => "link-local",
            Self::Private => "private",
            Self::Public => "public",
        };
        formatter.write_str(label)
    }
}

/// Errors raised while classifying addresses.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AddressError {
    /// Raised when the input is not a dotted-quad IPv4 address.
    #[error("invalid IPv4 address: '{0}'")]
    InvalidAddress(String),
}

/// A parsed address together with its derived class.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AddressCandidate {
    /// Parsed address.
    pub address: Ipv4Addr,
    /// Classification of [`AddressCandidate::address`].
    pub class: AddressClass,
}

impl AddressCandidate {
    /// Parses and classifies a textual IPv4 address.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidAddress`] when `raw` does not parse.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let address = Ipv4Addr::from_str(raw)
            .map_err(|_| AddressError::InvalidAddress(raw.to_owned()))?;
        Ok(Self {
            address,
            class: classify_addr(address),
        })
    }
}

/// Classifies an already parsed address.
#[must_use]
pub const fn classify_addr(address: Ipv4Addr) -> AddressClass {
    if address.is_loopback() {
        AddressClass::Loopback
    } else if address.is_link_local() {
        AddressClass::LinkLocal
    } else if address.is_private() {
        AddressClass::Private
    } else {
        AddressClass::Public
    }
}

/// Classifies a textual IPv4 address.
///
/// # Errors
///
/// Returns [`AddressError::InvalidAddress`] for malformed input. A malformed
/// address is never reported as public.
pub fn classify(raw: &str) -> Result<AddressClass, AddressError> {
    AddressCandidate::parse(raw).map(|candidate| candidate.class)
}

/// Returns the first public address in `addresses`, preserving provider order.
///
/// Entries that do not parse as IPv4 (including IPv6 addresses) are skipped.
/// `None` means no usable address exists.
#[must_use]
pub fn select_public_address<S: AsRef<str>>(addresses: &[S]) -> Option<Ipv4Addr> {
    addresses.iter().find_map(|raw| {
        match AddressCandidate::parse(raw.as_ref()) {
            Ok(candidate) if candidate.class.is_public() => Some(candidate.address),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "skipping unusable machine address");
                None
            }
        }
    })
}
