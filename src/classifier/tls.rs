//! TLS classification over the probed socket.
//!
//! The handshake reuses the connection the prober opened, verifies against
//! the system trust store, and sends the target host as SNI. The leaf
//! certificate's subject becomes the detail.

use crate::scanner::{ClassificationDetail, ProbeOutcome};
use crate::types::Target;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_native_tls::TlsConnector;
use tracing::debug;
use x509_parser::prelude::parse_x509_certificate;

/// Build the TLS connector shared by all handshakes.
pub fn build_connector() -> Result<TlsConnector, native_tls::Error> {
    native_tls::TlsConnector::new().map(TlsConnector::from)
}

/// Handshake and read the peer certificate subject.
///
/// A failed or timed-out handshake is reported as `Closed`.
pub async fn inspect_tls(
    connector: &TlsConnector,
    stream: TcpStream,
    target: &Target,
    budget: Duration,
) -> ProbeOutcome {
    let tls = match timeout(budget, connector.connect(&target.host, stream)).await {
        Ok(Ok(tls)) => tls,
        Ok(Err(e)) => {
            debug!(%target, error = %e, "TLS handshake failed");
            return ProbeOutcome::Closed(format!("TLS handshake failed: {}", e));
        }
        Err(_) => {
            debug!(%target, "TLS handshake timed out");
            return ProbeOutcome::Closed(format!(
                "TLS handshake timed out after {} ms",
                budget.as_millis()
            ));
        }
    };

    let subject = match tls.get_ref().peer_certificate() {
        Ok(Some(cert)) => cert
            .to_der()
            .ok()
            .and_then(|der| certificate_subject(&der))
            .unwrap_or_default(),
        Ok(None) => String::new(),
        Err(e) => {
            debug!(%target, error = %e, "could not read peer certificate");
            String::new()
        }
    };

    ProbeOutcome::Open(ClassificationDetail::Tls { subject })
}

/// Subject distinguished name of a DER certificate.
pub fn certificate_subject(der: &[u8]) -> Option<String> {
    parse_x509_certificate(der)
        .ok()
        .map(|(_, cert)| cert.subject().to_string())
}
