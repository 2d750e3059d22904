//! Address resolution adapter
//!
//! The connection treats resolution as a black box: given a host and port it
//! gets back an ordered list of candidates and consumes them front to back,
//! asking again only when the list runs dry. Order and address-family mix are
//! whatever the resolver returns.

use crate::error::ResolveError;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

/// Address family of a candidate endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Inet,
    Inet6,
}

impl From<&SocketAddr> for AddressFamily {
    fn from(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => AddressFamily::Inet,
            SocketAddr::V6(_) => AddressFamily::Inet6,
        }
    }
}

/// Socket type of a candidate endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
    Stream,
    Datagram,
}

/// IANA protocol number for TCP
pub const IPPROTO_TCP: u8 = 6;

/// One resolved endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub family: AddressFamily,
    pub socket_type: SocketType,
    pub protocol: u8,
    pub canonical_name: Option<String>,
    pub addr: SocketAddr,
}

impl Candidate {
    /// A TCP stream candidate for `addr`
    pub fn stream(addr: SocketAddr) -> Self {
        Self {
            family: AddressFamily::from(&addr),
            socket_type: SocketType::Stream,
            protocol: IPPROTO_TCP,
            canonical_name: None,
            addr,
        }
    }

    pub fn with_canonical_name(mut self, name: impl Into<String>) -> Self {
        self.canonical_name = Some(name.into());
        self
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.canonical_name {
            Some(name) => write!(f, "{} ({})", self.addr, name),
            None => write!(f, "{}", self.addr),
        }
    }
}

/// Turns a host/port into candidate endpoints. Must be safe to call repeatedly.
pub trait Resolver {
    fn resolve(&mut self, host: &str, port: u16) -> Result<Vec<Candidate>, ResolveError>;
}

impl<F> Resolver for F
where
    F: FnMut(&str, u16) -> Result<Vec<Candidate>, ResolveError>,
{
    fn resolve(&mut self, host: &str, port: u16) -> Result<Vec<Candidate>, ResolveError> {
        self(host, port)
    }
}

/// Resolver backed by the platform's name service
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&mut self, host: &str, port: u16) -> Result<Vec<Candidate>, ResolveError> {
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|source| ResolveError::Lookup {
                host: host.to_string(),
                port,
                source,
            })?;

        let candidates: Vec<Candidate> = addrs.map(Candidate::stream).collect();
        if candidates.is_empty() {
            return Err(ResolveError::NoAddresses {
                host: host.to_string(),
                port,
            });
        }
        Ok(candidates)
    }
}

/// Resolver that always returns the same candidates
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    candidates: Vec<Candidate>,
    calls: usize,
}

impl StaticResolver {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            calls: 0,
        }
    }

    pub fn from_addrs<I: IntoIterator<Item = SocketAddr>>(addrs: I) -> Self {
        Self::new(addrs.into_iter().map(Candidate::stream).collect())
    }

    /// How many times `resolve` has been called
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Resolver for StaticResolver {
    fn resolve(&mut self, host: &str, port: u16) -> Result<Vec<Candidate>, ResolveError> {
        self.calls += 1;
        if self.candidates.is_empty() {
            return Err(ResolveError::NoAddresses {
                host: host.to_string(),
                port,
            });
        }
        Ok(self.candidates.clone())
    }
}
