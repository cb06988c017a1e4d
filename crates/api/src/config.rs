//! Server configuration (environment driven).

use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: String,
    /// JSON array of stock movements loaded into the store at startup.
    pub seed_file: Option<PathBuf>,
}

impl ApiConfig {
    /// Read `COKINS_API_ADDR` and `COKINS_SEED_FILE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = lookup("COKINS_API_ADDR").unwrap_or_else(|| {
            tracing::debug!("COKINS_API_ADDR not set; using {DEFAULT_BIND_ADDR}");
            DEFAULT_BIND_ADDR.to_string()
        });
        let seed_file = lookup("COKINS_SEED_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Self {
            bind_addr,
            seed_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let config = ApiConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.seed_file, None);

        let config = ApiConfig::from_lookup(|key| match key {
            "COKINS_API_ADDR" => Some("127.0.0.1:9999".into()),
            "COKINS_SEED_FILE" => Some("seed.json".into()),
            _ => None,
        });
        assert_eq!(config.bind_addr, "127.0.0.1:9999");
        assert_eq!(config.seed_file, Some(PathBuf::from("seed.json")));
    }
}
