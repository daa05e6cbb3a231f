//! Client address dispatch
//!
//! Turns a client address into the bit string the lookup engine walks. IPv4
//! addresses are 32 bits, IPv6 addresses 128 bits, both in network byte order.
//! Anything else is rejected before the engine is consulted.

use crate::engine::LookupEngine;
use crate::error::{FieldError, Result};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Address family understood by the lookup engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    /// IPv4 (32-bit addresses)
    V4,
    /// IPv6 (128-bit addresses)
    V6,
}

impl IpFamily {
    /// Number of address bits the engine walks for this family
    pub fn bit_len(self) -> u32 {
        match self {
            IpFamily::V4 => 32,
            IpFamily::V6 => 128,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => f.write_str("IPv4"),
            IpFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Address of the client being located
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAddress {
    /// IPv4 client
    V4(Ipv4Addr),
    /// IPv6 client
    V6(Ipv6Addr),
    /// Socket of some other family (unix socket, packet socket, ...)
    Other {
        /// Raw socket family number as reported by the OS
        family: u16,
    },
}

impl ClientAddress {
    /// Family of this address, or `None` for non-IP sockets
    pub fn family(&self) -> Option<IpFamily> {
        match self {
            ClientAddress::V4(_) => Some(IpFamily::V4),
            ClientAddress::V6(_) => Some(IpFamily::V6),
            ClientAddress::Other { .. } => None,
        }
    }
}

impl From<IpAddr> for ClientAddress {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => ClientAddress::V4(v4),
            IpAddr::V6(v6) => ClientAddress::V6(v6),
        }
    }
}

impl From<Ipv4Addr> for ClientAddress {
    fn from(addr: Ipv4Addr) -> Self {
        ClientAddress::V4(addr)
    }
}

impl From<Ipv6Addr> for ClientAddress {
    fn from(addr: Ipv6Addr) -> Self {
        ClientAddress::V6(addr)
    }
}

impl From<SocketAddr> for ClientAddress {
    fn from(addr: SocketAddr) -> Self {
        addr.ip().into()
    }
}

/// Bit string handed to [`LookupEngine::lookup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressBits {
    octets: [u8; 16],
    bit_len: u32,
}

impl AddressBits {
    fn v4(addr: Ipv4Addr) -> Self {
        let mut octets = [0u8; 16];
        octets[..4].copy_from_slice(&addr.octets());
        Self { octets, bit_len: 32 }
    }

    #[cfg_attr(not(feature = "ipv6"), allow(dead_code))]
    fn v6(addr: Ipv6Addr) -> Self {
        Self {
            octets: addr.octets(),
            bit_len: 128,
        }
    }

    /// Raw address octets, network byte order
    pub fn bytes(&self) -> &[u8] {
        &self.octets[..(self.bit_len / 8) as usize]
    }

    /// Number of significant bits (32 or 128)
    pub fn bit_len(&self) -> u32 {
        self.bit_len
    }
}

/// Produce the engine input for `address`
///
/// Only asks the engine whether it supports the address family; no lookup is
/// performed.
pub fn dispatch<E>(address: &ClientAddress, engine: &E) -> Result<AddressBits>
where
    E: LookupEngine + ?Sized,
{
    match *address {
        ClientAddress::V4(addr) => {
            if !engine.is_family_supported(IpFamily::V4) {
                return Err(FieldError::UnsupportedFamily(IpFamily::V4));
            }
            Ok(AddressBits::v4(addr))
        }
        #[cfg(feature = "ipv6")]
        ClientAddress::V6(addr) => {
            if !engine.is_family_supported(IpFamily::V6) {
                return Err(FieldError::UnsupportedFamily(IpFamily::V6));
            }
            Ok(AddressBits::v6(addr))
        }
        #[cfg(not(feature = "ipv6"))]
        ClientAddress::V6(_) => Err(FieldError::InvalidAddressFormat),
        ClientAddress::Other { .. } => Err(FieldError::InvalidAddressFormat),
    }
}
