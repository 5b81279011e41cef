//! Target parsing from heterogeneous host/port lists.
//!
//! Input files come from many upstream tools, so each line is offered to an
//! ordered list of matchers and the first one that accepts wins:
//!
//! - `[2001:db8::1]:443` (bracketed IPv6, optional `/service` suffix)
//! - `host:port` and `host:port/service` (exactly one colon)
//! - `host,port`
//! - `host port` (any whitespace)
//!
//! Lines that no matcher accepts are dropped without error. Blank lines and
//! `#` comments are ignored.

use super::Port;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// A single host/port pair to probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Hostname or IP literal, without IPv6 brackets.
    pub host: String,
    /// Destination port.
    pub port: Port,
}

impl Target {
    /// Create a target, normalizing the host.
    ///
    /// Returns `None` when the host is empty after normalization.
    pub fn new(host: &str, port: Port) -> Option<Self> {
        let host = host
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_ascii_lowercase();
        if host.is_empty() {
            return None;
        }
        Some(Self { host, port })
    }

    /// Whether the host is an IPv6 literal.
    pub fn is_ipv6_literal(&self) -> bool {
        self.host.contains(':')
    }

    /// `host:port` form suitable for URLs, bracketing IPv6 literals.
    pub fn authority(&self) -> String {
        if self.is_ipv6_literal() {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority())
    }
}

/// A pure line matcher.
type Matcher = fn(&str) -> Option<Target>;

/// Matchers in priority order.
const MATCHERS: &[(&str, Matcher)] = &[
    ("bracketed", match_bracketed),
    ("colon", match_colon),
    ("comma", match_comma),
    ("whitespace", match_whitespace),
];

/// Parse one line, returning `None` for comments, blanks and malformed input.
pub fn parse_line(raw: &str) -> Option<Target> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    MATCHERS.iter().find_map(|(name, matcher)| {
        let target = matcher(line)?;
        tracing::trace!(matcher = name, entry = %target, "line accepted");
        Some(target)
    })
}

/// Parse target lines into an ordered, deduplicated list.
///
/// The first occurrence of a (host, port) pair fixes its position.
pub fn parse_targets<I, S>(lines: I) -> Vec<Target>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    let mut skipped = 0usize;

    for line in lines {
        let line = line.as_ref();
        match parse_line(line) {
            Some(target) => {
                if seen.insert(target.clone()) {
                    targets.push(target);
                }
            }
            None => {
                let trimmed = line.trim();
                if !trimmed.is_empty() && !trimmed.starts_with('#') {
                    skipped += 1;
                    tracing::debug!(line = trimmed, "skipping unparseable target line");
                }
            }
        }
    }

    if skipped > 0 {
        tracing::info!(skipped, "ignored malformed target lines");
    }

    targets
}

/// Read and parse a target file. Invalid UTF-8 is replaced, not fatal.
pub fn parse_targets_file(path: &Path) -> std::io::Result<Vec<Target>> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(parse_targets(text.lines()))
}

fn strip_service(token: &str) -> &str {
    token.split('/').next().unwrap_or(token)
}

fn match_bracketed(line: &str) -> Option<Target> {
    let token = strip_service(line.split_whitespace().next()?);
    let rest = token.strip_prefix('[')?;
    let (host, port) = rest.split_once("]:")?;
    Target::new(host, Port::parse_token(port)?)
}

fn match_colon(line: &str) -> Option<Target> {
    // More than one colon is most likely a bare IPv6 address.
    if line.matches(':').count() != 1 {
        return None;
    }
    let token = strip_service(line.split_whitespace().next()?);
    let (host, port) = token.rsplit_once(':')?;
    Target::new(host, Port::parse_token(port.trim())?)
}

fn match_comma(line: &str) -> Option<Target> {
    if !line.contains(',') {
        return None;
    }
    let mut parts = line.split(',').map(str::trim).filter(|p| !p.is_empty());
    let host = parts.next()?;
    let port = Port::parse_token(parts.next()?)?;
    Target::new(host, port)
}

fn match_whitespace(line: &str) -> Option<Target> {
    let mut parts = line.split_whitespace();
    let host = parts.next()?;
    let port = Port::parse_token(parts.next()?)?;
    Target::new(host, port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn t(host: &str, port: u16) -> Target {
        Target::new(host, Port::new(port).unwrap()).unwrap()
    }

    #[test]
    fn test_colon_forms() {
        assert_eq!(parse_line("example.com:80"), Some(t("example.com", 80)));
        assert_eq!(parse_line("10.0.0.1:22/ssh"), Some(t("10.0.0.1", 22)));
        assert_eq!(parse_line("  10.0.0.1:443 extra words"), Some(t("10.0.0.1", 443)));
        assert_eq!(parse_line("host:http"), None);
    }

    #[test]
    fn test_comma_and_whitespace_forms() {
        assert_eq!(parse_line("db.internal,5432"), Some(t("db.internal", 5432)));
        assert_eq!(parse_line("db.internal , 5432 , tcp"), Some(t("db.internal", 5432)));
        assert_eq!(parse_line("mail\t25"), Some(t("mail", 25)));
        assert_eq!(parse_line("mail   587 submission"), Some(t("mail", 587)));
    }

    #[test]
    fn test_ipv6_handling() {
        assert_eq!(parse_line("[::1]:8080"), Some(t("::1", 8080)));
        assert_eq!(parse_line("[2001:db8::5]:443/https"), Some(t("2001:db8::5", 443)));
        // Bare multi-colon forms are ambiguous for the colon matcher.
        assert_eq!(parse_line("2001:db8::5:443"), None);
        // They are still accepted in unambiguous layouts.
        assert_eq!(parse_line("2001:db8::5,443"), Some(t("2001:db8::5", 443)));
        assert_eq!(t("::1", 80).authority(), "[::1]:80");
    }

    #[test]
    fn test_rejects_bad_ports() {
        assert_eq!(parse_line("host:0"), None);
        assert_eq!(parse_line("host:70000"), None);
        assert_eq!(parse_line("host,-1"), None);
        assert_eq!(parse_line(":80"), None);
        assert_eq!(parse_line("just-a-hostname"), None);
    }

    #[test]
    fn test_comments_and_blanks() {
        assert_eq!(parse_line("# 10.0.0.1:80"), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn test_mixed_input_dedup_and_order() {
        let input = "\
# scan list
b.example:443
a.example,80

a.example 80
B.EXAMPLE:443/https
garbage line here
c.example:8080
a.example:80
";
        let targets = parse_targets(input.lines());
        assert_eq!(
            targets,
            vec![t("b.example", 443), t("a.example", 80), t("c.example", 8080)]
        );
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let input = vec!["x:1", "y,2", "z 3", "x:1", "bad"];
        assert_eq!(parse_targets(&input), parse_targets(&input));
    }

    #[test]
    fn test_parse_file_with_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"127.0.0.1:22\n\xff\xfe junk\n127.0.0.1,80\n").unwrap();

        let targets = parse_targets_file(file.path()).unwrap();
        assert_eq!(targets, vec![t("127.0.0.1", 22), t("127.0.0.1", 80)]);
    }
}
