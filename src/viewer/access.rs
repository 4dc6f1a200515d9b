use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use regex::Regex;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Full,
    /// Schedule views only; game detail is never polled.
    Limited,
}

impl AccessLevel {
    pub fn allows_detail(&self) -> bool {
        matches!(self, AccessLevel::Full)
    }
}

/// Soft allow-list. Local and private-network hosts always get full access, anything
/// else needs a key equal to the base64 encoding of its own hostname.
pub struct AccessGate {
    private_host: Regex,
}

impl AccessGate {
    pub fn new() -> anyhow::Result<Self> {
        let private_host = Regex::new(
            r"(?x)^(
                localhost
              | 127(\.\d{1,3}){3}
              | 10(\.\d{1,3}){3}
              | 172\.(1[6-9]|2\d|3[01])(\.\d{1,3}){2}
              | 192\.168(\.\d{1,3}){2}
              | ::1
              | \[::1\]
              | .+\.local
            )$",
        )?;
        Ok(Self { private_host })
    }

    pub fn is_private(&self, host: &str) -> bool {
        self.private_host.is_match(&strip_port(host).to_ascii_lowercase())
    }

    pub fn expected_key(host: &str) -> String {
        BASE64.encode(strip_port(host).to_ascii_lowercase())
    }

    pub fn check(&self, host: &str, key: Option<&str>) -> AccessLevel {
        if self.is_private(host) {
            return AccessLevel::Full;
        }

        let level = match key {
            Some(key) if key.trim() == Self::expected_key(host) => AccessLevel::Full,
            _ => AccessLevel::Limited,
        };
        if level == AccessLevel::Limited {
            info!(host, "No valid access key, live game detail disabled");
        }
        level
    }
}

/// "example.com:8080" -> "example.com". Bracketed IPv6 keeps its brackets off the port.
fn strip_port(host: &str) -> &str {
    let host = host.trim();
    if let Some(end) = host.find(']') {
        return &host[..=end];
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
