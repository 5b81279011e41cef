//! TCP connect prober.
//!
//! Resolves a target's host and performs a full TCP handshake against each
//! candidate address in resolver order. The connect timeout applies to
//! every attempt separately, never cumulatively.

use crate::classifier::Classifier;
use crate::error::{ProbeError, ProbeResult};
use crate::scanner::traits::{ProbeOutcome, TargetScanner, TargetState};
use crate::types::Target;
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Connects to targets with a bounded per-attempt timeout.
pub struct TcpProber {
    resolver: TokioAsyncResolver,
    connect_timeout: Duration,
}

impl TcpProber {
    /// Create a prober using the system resolver configuration.
    ///
    /// Falls back to the default upstream configuration when the system
    /// configuration cannot be read.
    pub fn new(connect_timeout: Duration) -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            debug!(error = %e, "system resolver configuration unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });

        Self {
            resolver,
            connect_timeout,
        }
    }

    /// Resolve the target host to candidate addresses.
    async fn resolve(&self, host: &str) -> ProbeResult<Vec<IpAddr>> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let lookup = timeout(self.connect_timeout, self.resolver.lookup_ip(host))
            .await
            .map_err(|_| ProbeError::Resolution {
                host: host.to_string(),
                reason: "lookup timed out".to_string(),
            })?
            .map_err(|e| ProbeError::Resolution {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let addrs: Vec<IpAddr> = lookup.iter().collect();
        if addrs.is_empty() {
            return Err(ProbeError::NoAddresses(host.to_string()));
        }
        Ok(addrs)
    }

    /// Attempt a single connection.
    async fn attempt_connect(&self, addr: SocketAddr) -> ProbeResult<TcpStream> {
        match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(ProbeError::from_io(&e, self.connect_timeout)),
            Err(_) => Err(ProbeError::Timeout(self.connect_timeout.as_millis() as u64)),
        }
    }

    /// Connect to the target, trying each resolved address in order.
    ///
    /// The returned stream is owned by the caller and closed when dropped.
    pub async fn connect(&self, target: &Target) -> ProbeResult<TcpStream> {
        let addrs = self.resolve(&target.host).await?;
        let port = target.port.as_u16();
        let mut last_error = ProbeError::NoAddresses(target.host.clone());

        for ip in addrs {
            let addr = SocketAddr::new(ip, port);
            match self.attempt_connect(addr).await {
                Ok(stream) => {
                    debug!(%addr, "connected");
                    return Ok(stream);
                }
                Err(e) => {
                    debug!(%addr, error = %e, "connect attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

/// Production pipeline: TCP connect followed by classification.
pub struct NetworkScanner {
    prober: TcpProber,
    classifier: Classifier,
}

impl NetworkScanner {
    /// Combine a prober and a classifier.
    pub fn new(prober: TcpProber, classifier: Classifier) -> Self {
        Self { prober, classifier }
    }
}

#[async_trait]
impl TargetScanner for NetworkScanner {
    async fn scan_target(&self, target: &Target) -> ProbeOutcome {
        debug!(%target, state = %TargetState::Connecting, "connecting");
        match self.prober.connect(target).await {
            Ok(stream) => {
                debug!(%target, state = %TargetState::Connected, "connected");
                let outcome = self.classifier.classify(stream, target).await;
                debug!(%target, state = %TargetState::Classified, outcome = %outcome, "classified");
                outcome
            }
            Err(e) => ProbeOutcome::Closed(e.to_string()),
        }
    }
}
