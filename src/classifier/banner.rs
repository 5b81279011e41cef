//! Banner grabbing on an already-open TCP connection.
//!
//! Reads whatever the service sends unprompted. When nothing arrives and
//! nudging is enabled, a bare `\r\n` is sent and the read is retried once,
//! which is enough to wake up most line-oriented protocols.

use crate::scanner::ClassificationDetail;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Maximum bytes to read for a banner.
pub const MAX_BANNER_BYTES: usize = 1024;

/// Maximum characters kept in the report preview.
pub const PREVIEW_CHARS: usize = 200;

/// How long to keep reading once the first bytes have arrived.
const FOLLOW_UP_WINDOW: Duration = Duration::from_millis(100);

const NUDGE: &[u8] = b"\r\n";

/// Grab a banner from an open stream.
pub async fn grab_banner(stream: &mut TcpStream, wait: Duration, nudge: bool) -> ClassificationDetail {
    let mut data = read_available(stream, wait).await;

    if data.is_empty() && nudge {
        let sent = matches!(timeout(wait, stream.write_all(NUDGE)).await, Ok(Ok(())));
        if sent {
            data = read_available(stream, wait).await;
        }
    }

    match preview(&data) {
        Some(preview) => ClassificationDetail::Banner { preview },
        None => ClassificationDetail::NoBanner,
    }
}

/// Read up to `MAX_BANNER_BYTES`, waiting at most `wait` for the first chunk.
async fn read_available(stream: &mut TcpStream, wait: Duration) -> Vec<u8> {
    let mut buffer = vec![0u8; MAX_BANNER_BYTES];
    let mut filled = 0;
    let mut window = wait;

    while filled < MAX_BANNER_BYTES {
        match timeout(window, stream.read(&mut buffer[filled..])).await {
            Ok(Ok(n)) if n > 0 => {
                filled += n;
                window = FOLLOW_UP_WINDOW.min(wait);
            }
            _ => break,
        }
    }

    buffer.truncate(filled);
    buffer
}

/// Decode lossily, trim, and cap at `PREVIEW_CHARS` characters.
///
/// Returns `None` when nothing printable remains.
pub fn preview(data: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(data);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(PREVIEW_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn serve_once(payload: Vec<u8>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            if !payload.is_empty() {
                socket.write_all(&payload).await.unwrap();
            }
            // Hold the connection open until the client hangs up.
            let mut sink = [0u8; 64];
            let _ = timeout(Duration::from_secs(5), socket.read(&mut sink)).await;
        });
        port
    }

    #[test]
    fn test_preview_trims_and_caps() {
        assert_eq!(preview(b"SSH-2.0-OpenSSH_8.9\r\n"), Some("SSH-2.0-OpenSSH_8.9".into()));
        assert_eq!(preview(b" \r\n\t"), None);
        assert_eq!(preview(&[b'a'; 500]).unwrap().chars().count(), PREVIEW_CHARS);
    }

    #[test]
    fn test_preview_replaces_invalid_utf8() {
        let text = preview(b"\xffhello\xfe").unwrap();
        assert!(text.contains("hello"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_large_binary_banner_is_truncated() {
        let payload: Vec<u8> = (0..5000u32).map(|i| if i % 3 == 0 { 0xff } else { b'x' }).collect();
        let port = serve_once(payload).await;

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        match grab_banner(&mut stream, Duration::from_millis(500), false).await {
            ClassificationDetail::Banner { preview } => {
                assert_eq!(preview.chars().count(), PREVIEW_CHARS);
            }
            other => panic!("expected banner, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_silent_service_has_no_banner() {
        let port = serve_once(Vec::new()).await;

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let detail = grab_banner(&mut stream, Duration::from_millis(200), false).await;
        assert_eq!(detail, ClassificationDetail::NoBanner);
    }

    #[tokio::test]
    async fn test_nudge_wakes_line_protocol() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut line = [0u8; 2];
            socket.read_exact(&mut line).await.unwrap();
            socket.write_all(b"220 ready\r\n").await.unwrap();
            let _ = timeout(Duration::from_secs(5), socket.read(&mut line)).await;
        });

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let detail = grab_banner(&mut stream, Duration::from_millis(300), true).await;
        assert_eq!(detail, ClassificationDetail::Banner { preview: "220 ready".into() });
    }
}
