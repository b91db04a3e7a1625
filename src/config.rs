use std::path::Path;

use serde::Deserialize;

use crate::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Network settings. Every field has a default, so a config file only needs
/// the ones it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetConfig {
    pub address: String,
    pub port: u16,
    /// Defaults to the port just below `port`.
    pub ping_port: Option<u16>,
    pub max_players: usize,
    pub backlog: u32,
    pub connect_timeout_secs: u64,
    pub tick_millis: u64,
    /// Cap on queued outbound bytes per connection. Unbounded when unset.
    pub max_send_queue_bytes: Option<usize>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 22222,
            ping_port: None,
            max_players: 100,
            backlog: 8,
            connect_timeout_secs: 5,
            tick_millis: 50,
            max_send_queue_bytes: None,
        }
    }
}

impl NetConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_millis == 0 {
            log::warn!("tick_millis must be positive");
            return Err(ConfigError::Invalid("tick_millis must be positive".into()));
        }
        if self.port != 0 && self.ping_port() == self.port {
            log::warn!("ping port collides with game port {}", self.port);
            return Err(ConfigError::Invalid(format!("ping port collides with game port {}", self.port)));
        }
        Ok(())
    }

    /// A game port of 0 asks the OS for one, and so does the ping port then.
    pub fn ping_port(&self) -> u16 {
        self.ping_port.unwrap_or_else(|| self.port.saturating_sub(1))
    }
    pub fn connect_timeout(&self) -> time::Duration {
        time::Duration::from_secs(self.connect_timeout_secs)
    }
    pub fn tick(&self) -> time::Duration {
        time::Duration::from_millis(self.tick_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let config = NetConfig::from_json_str(r#"{ "port": 3000, "max_players": 2 }"#).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.ping_port(), 2999);
        assert_eq!(config.max_players, 2);
        assert_eq!(config.backlog, 8);
        assert_eq!(config.connect_timeout(), time::Duration::from_secs(5));
        assert_eq!(config.max_send_queue_bytes, None);
    }

    #[test]
    fn explicit_ping_port_wins() {
        let config = NetConfig::from_json_str(r#"{ "port": 3000, "ping_port": 4000 }"#).unwrap();
        assert_eq!(config.ping_port(), 4000);
    }

    #[test]
    fn bad_documents_are_rejected() {
        assert!(matches!(NetConfig::from_json_str("{ port: 1 }"), Err(ConfigError::Parse(_))));
        assert!(matches!(NetConfig::from_json_str(r#"{ "prot": 1 }"#), Err(ConfigError::Parse(_))));
        assert!(matches!(
            NetConfig::from_json_str(r#"{ "port": 10, "ping_port": 10 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(NetConfig::from_json_str(r#"{ "tick_millis": 0 }"#), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn loads_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "address": "127.0.0.1", "max_send_queue_bytes": 65536 }}"#).unwrap();
        let config = NetConfig::load(file.path()).unwrap();
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.max_send_queue_bytes, Some(65536));
        assert_eq!(config.port, NetConfig::default().port);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = NetConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }
}
