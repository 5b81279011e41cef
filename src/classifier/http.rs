//! HTTP classification.
//!
//! Always uses a fresh connection through `reqwest` rather than the probed
//! socket, so request framing, redirects and keep-alive are handled by a real
//! client.

use crate::scanner::ClassificationDetail;
use crate::types::Target;
use hyper::ext::ReasonPhrase;
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Maximum redirects followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// Build the HTTP client shared by all classification requests.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("portrecon/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .danger_accept_invalid_certs(true)
        .no_proxy()
        .build()
}

/// `http://host:port/` for a target.
pub fn target_url(target: &Target) -> String {
    format!("http://{}/", target.authority())
}

/// Issue `GET /` and describe the response.
pub async fn probe_http(client: &Client, target: &Target) -> ClassificationDetail {
    let url = target_url(target);

    match client.get(&url).send().await {
        Ok(response) => {
            let status = response.status();
            debug!(%url, status = status.as_u16(), final_url = %response.url(), "HTTP response");
            ClassificationDetail::Http {
                status_code: status.as_u16(),
                reason_phrase: reason_phrase(&response),
                final_url: response.url().to_string(),
            }
        }
        Err(e) => {
            debug!(%url, error = %e, "HTTP request failed");
            ClassificationDetail::HttpError {
                category: failure_category(&e).to_string(),
            }
        }
    }
}

/// Reason phrase from the status line, falling back to the canonical one.
///
/// hyper only keeps the server's phrase when it differs from the canonical
/// text for the status code.
fn reason_phrase(response: &Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Coarse failure bucket for a request error.
fn failure_category(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_redirect() {
        "redirect"
    } else if err.is_body() {
        "body"
    } else if err.is_decode() {
        "decode"
    } else if err.is_builder() {
        "request"
    } else {
        "protocol"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Port;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a fixed raw response to every connection.
    async fn stub_server(response: &'static [u8]) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut request = [0u8; 2048];
                    let _ = socket.read(&mut request).await;
                    let _ = socket.write_all(response).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        port
    }

    fn target(port: u16) -> Target {
        Target::new("127.0.0.1", Port::new(port).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_status_code_is_reported() {
        let port = stub_server(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let client = build_client(Duration::from_secs(2)).unwrap();

        let detail = probe_http(&client, &target(port)).await;
        assert_eq!(
            detail,
            ClassificationDetail::Http {
                status_code: 404,
                reason_phrase: "Not Found".into(),
                final_url: format!("http://127.0.0.1:{}/", port),
            }
        );
    }

    #[tokio::test]
    async fn test_server_reason_phrase_is_kept() {
        let port = stub_server(b"HTTP/1.1 200 Custom Phrase\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let client = build_client(Duration::from_secs(2)).unwrap();

        let detail = probe_http(&client, &target(port)).await;
        assert_eq!(detail.detail_text(), "HTTP 200 Custom Phrase");
        match detail {
            ClassificationDetail::Http { reason_phrase, .. } => assert_eq!(reason_phrase, "Custom Phrase"),
            other => panic!("expected HTTP detail, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unregistered_status_keeps_server_phrase() {
        let port = stub_server(b"HTTP/1.1 299 Mostly Fine\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let client = build_client(Duration::from_secs(2)).unwrap();

        match probe_http(&client, &target(port)).await {
            ClassificationDetail::Http { status_code, reason_phrase, .. } => {
                assert_eq!(status_code, 299);
                assert_eq!(reason_phrase, "Mostly Fine");
            }
            other => panic!("expected HTTP detail, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_garbage_response_is_protocol_failure() {
        let port = stub_server(b"SSH-2.0-OpenSSH_9.0\r\n").await;
        let client = build_client(Duration::from_secs(2)).unwrap();

        match probe_http(&client, &target(port)).await {
            ClassificationDetail::HttpError { category } => {
                assert_ne!(category, "timeout");
                assert_ne!(category, "connect");
            }
            other => panic!("expected HTTP failure, got {:?}", other),
        }
    }

    #[test]
    fn test_target_url_brackets_ipv6() {
        let v6 = Target::new("::1", Port::new(8080).unwrap()).unwrap();
        assert_eq!(target_url(&v6), "http://[::1]:8080/");
    }
}
