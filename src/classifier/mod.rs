//! Service classification for open ports.
//!
//! The port number picks the technique, first match wins:
//!
//! 1. HTTP port list: `GET /` over a fresh connection.
//! 2. TLS port list (443): handshake over the probed socket, read the
//!    certificate subject.
//! 3. Anything else: passive banner read.
//!
//! This is a heuristic. A wrong guess only degrades the detail text; every
//! error is folded into the returned outcome.

pub mod banner;
pub mod http;
pub mod tls;

use crate::config::ScanOptions;
use crate::error::{ConfigError, ConfigResult};
use crate::scanner::{ProbeOutcome, TargetState};
use crate::types::Target;
use tokio::net::TcpStream;
use tracing::debug;

/// Which technique the classifier applies to a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Technique {
    Http,
    Tls,
    Banner,
}

/// Classifies open connections.
pub struct Classifier {
    options: ScanOptions,
    http_client: reqwest::Client,
    tls_connector: tokio_native_tls::TlsConnector,
}

impl Classifier {
    /// Build a classifier from scan options.
    pub fn new(options: &ScanOptions) -> ConfigResult<Self> {
        let http_client = http::build_client(options.classify_timeout)
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {}", e)))?;
        let tls_connector = tls::build_connector()
            .map_err(|e| ConfigError::Invalid(format!("TLS connector: {}", e)))?;

        Ok(Self {
            options: options.clone(),
            http_client,
            tls_connector,
        })
    }

    /// Technique used for a port.
    pub fn technique(&self, port: u16) -> Technique {
        if self.options.is_http_port(port) {
            Technique::Http
        } else if self.options.is_tls_port(port) {
            Technique::Tls
        } else {
            Technique::Banner
        }
    }

    /// Classify an open connection. Consumes (and closes) the stream.
    pub async fn classify(&self, mut stream: TcpStream, target: &Target) -> ProbeOutcome {
        let technique = self.technique(target.port.as_u16());
        debug!(%target, state = %TargetState::Classifying, ?technique, "classifying");

        match technique {
            Technique::Http => {
                drop(stream);
                ProbeOutcome::Open(http::probe_http(&self.http_client, target).await)
            }
            Technique::Tls => {
                tls::inspect_tls(&self.tls_connector, stream, target, self.options.classify_timeout).await
            }
            Technique::Banner => ProbeOutcome::Open(
                banner::grab_banner(
                    &mut stream,
                    self.options.banner_timeout,
                    self.options.banner_nudge,
                )
                .await,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ClassificationDetail;
    use crate::types::{Port, PortSpec};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_technique_selection() {
        let classifier = Classifier::new(&ScanOptions::default()).unwrap();
        assert_eq!(classifier.technique(80), Technique::Http);
        assert_eq!(classifier.technique(8443), Technique::Http);
        assert_eq!(classifier.technique(443), Technique::Tls);
        assert_eq!(classifier.technique(22), Technique::Banner);
    }

    #[tokio::test]
    async fn test_custom_http_ports() {
        let spec: PortSpec = "9000-9001".parse().unwrap();
        let options = ScanOptions::default().with_http_ports(&spec);
        let classifier = Classifier::new(&options).unwrap();
        assert_eq!(classifier.technique(9001), Technique::Http);
        assert_eq!(classifier.technique(80), Technique::Banner);
    }

    #[tokio::test]
    async fn test_banner_path_end_to_end() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        let classifier = Classifier::new(&ScanOptions::default()).unwrap();
        let stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let target = Target::new("127.0.0.1", Port::new(port).unwrap()).unwrap();

        let outcome = classifier.classify(stream, &target).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Open(ClassificationDetail::Banner {
                preview: "SSH-2.0-OpenSSH_9.6".into()
            })
        );
    }
}
