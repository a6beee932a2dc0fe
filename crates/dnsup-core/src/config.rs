//! Configuration types for dnsup
//!
//! The configuration file is TOML with one table per record name:
//!
//! ```toml
//! [engine]
//! timeout_secs = 10
//!
//! [records."host.example.com"]
//! zone = "example.com"
//! key = "c2VjcmV0LWtleS1ieXRlcw=="
//! server = "ns1.example.com"
//! update-v4 = true
//! update-v6 = true
//! ```
//!
//! Loading is all-or-nothing: any invalid entry fails the whole file.

use crate::error::{Error, Result};
use crate::wire::Name;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "DNSUP_CONFIG";

/// File name used under `$HOME` when no override is set
pub const DEFAULT_CONFIG_FILE: &str = ".dnsup.toml";

/// Main dnsup configuration
#[derive(Debug, Clone)]
pub struct DnsupConfig {
    /// Records to keep in sync, sorted by record name
    pub records: Vec<RecordConfig>,

    /// Engine settings
    pub engine: EngineConfig,
}

impl DnsupConfig {
    /// Create a configuration from already-built records
    pub fn new(records: Vec<RecordConfig>) -> Self {
        Self {
            records,
            engine: EngineConfig::default(),
        }
    }

    /// Location of the configuration file
    ///
    /// `DNSUP_CONFIG` wins; otherwise `$HOME/.dnsup.toml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let home = std::env::var("HOME").map_err(|_| {
            Error::config(format!(
                "HOME is not set; set {} to the configuration file path",
                CONFIG_PATH_ENV
            ))
        })?;

        Ok(Path::new(&home).join(DEFAULT_CONFIG_FILE))
    }

    /// Load and validate the configuration file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&text)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), strip_prefix(e))))
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| Error::config(e.to_string()))?;

        let mut records = Vec::with_capacity(file.records.len());
        for (name, entry) in file.records {
            records.push(RecordConfig::from_entry(&name, entry)?);
        }

        let config = Self {
            records,
            engine: file.engine,
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.records.is_empty() {
            return Err(Error::config("No records configured"));
        }

        for record in &self.records {
            record.validate()?;
        }

        self.engine.validate()
    }
}

fn strip_prefix(err: Error) -> String {
    match err {
        Error::Config(msg) => msg,
        other => other.to_string(),
    }
}

/// On-disk layout
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,

    #[serde(default)]
    records: BTreeMap<String, RecordEntry>,
}

/// One `[records."<name>"]` table
///
/// Holds the key still base64-encoded; dropped once decoded.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordEntry {
    zone: String,
    key: String,
    server: String,
    #[serde(rename = "update-v4")]
    update_v4: bool,
    #[serde(rename = "update-v6")]
    update_v6: bool,
}

/// A record kept in sync with the host addresses
///
/// # Security
///
/// The Debug implementation does NOT expose the key.
#[derive(Clone, PartialEq, Eq)]
pub struct RecordConfig {
    /// Fully-qualified record name, always ending in `.`
    pub name: String,

    /// Zone the update is addressed to, always ending in `.`
    pub zone: String,

    /// Decoded TSIG secret
    /// ⚠️ NEVER log this value
    pub key: Vec<u8>,

    /// Host name or IP literal of the primary server
    pub server: String,

    /// Whether A records are replaced
    pub update_v4: bool,

    /// Whether AAAA records are replaced
    pub update_v6: bool,
}

impl std::fmt::Debug for RecordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordConfig")
            .field("name", &self.name)
            .field("zone", &self.zone)
            .field("key", &"<REDACTED>")
            .field("server", &self.server)
            .field("update_v4", &self.update_v4)
            .field("update_v6", &self.update_v6)
            .finish()
    }
}

impl RecordConfig {
    /// Create a record configuration with both families disabled
    pub fn new(
        name: impl Into<String>,
        zone: impl Into<String>,
        key: impl Into<Vec<u8>>,
        server: impl Into<String>,
    ) -> Self {
        Self {
            name: normalize_fqdn(&name.into()),
            zone: normalize_fqdn(&zone.into()),
            key: key.into(),
            server: server.into().trim().to_string(),
            update_v4: false,
            update_v6: false,
        }
    }

    /// Enable or disable A record updates
    pub fn with_update_v4(mut self, enabled: bool) -> Self {
        self.update_v4 = enabled;
        self
    }

    /// Enable or disable AAAA record updates
    pub fn with_update_v6(mut self, enabled: bool) -> Self {
        self.update_v6 = enabled;
        self
    }

    fn from_entry(name: &str, entry: RecordEntry) -> Result<Self> {
        let key = base64::decode(entry.key.trim()).map_err(|e| {
            Error::config(format!("Record {}: key is not valid base64: {}", name, e))
        })?;

        Ok(Self::new(name, entry.zone, key, entry.server)
            .with_update_v4(entry.update_v4)
            .with_update_v6(entry.update_v6))
    }

    /// Validate names, key and server
    pub fn validate(&self) -> Result<()> {
        if self.name == "." {
            return Err(Error::config("Record name cannot be empty"));
        }

        Name::parse(&self.name)
            .map_err(|e| Error::config(format!("Record {}: invalid name: {}", self.name, e)))?;
        Name::parse(&self.zone)
            .map_err(|e| Error::config(format!("Record {}: invalid zone: {}", self.name, e)))?;

        let name = self.name.to_ascii_lowercase();
        let zone = self.zone.to_ascii_lowercase();
        if zone != "." && name != zone && !name.ends_with(&format!(".{}", zone)) {
            return Err(Error::config(format!(
                "Record {} is not inside zone {}",
                self.name, self.zone
            )));
        }

        if self.key.is_empty() {
            return Err(Error::config(format!("Record {}: key cannot be empty", self.name)));
        }

        if self.server.is_empty() {
            return Err(Error::config(format!(
                "Record {}: server cannot be empty",
                self.name
            )));
        }

        Ok(())
    }
}

/// Append the root label separator when missing
///
/// An empty input becomes `.`, which validation rejects as a record name.
pub fn normalize_fqdn(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.ends_with('.') {
        trimmed.to_string()
    } else {
        format!("{}.", trimmed)
    }
}

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// How long to wait for a server response (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// UDP port of the update servers
    #[serde(default = "default_port")]
    pub port: u16,

    /// Build and sign updates but do not send them
    #[serde(default)]
    pub dry_run: bool,

    /// Capacity of the engine event channel
    ///
    /// When full, events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate engine settings
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::config("engine.timeout_secs must be > 0"));
        }
        if self.port == 0 {
            return Err(Error::config("engine.port must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("engine.event_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            port: default_port(),
            dry_run: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_port() -> u16 {
    53
}

fn default_event_channel_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[records."host.example.com"]
zone = "example.com"
key = "c2VjcmV0LWtleS1ieXRlcw=="
server = "ns1.example.com"
update-v4 = true
update-v6 = false
"#;

    #[test]
    fn parses_record_and_normalizes_names() {
        let config = DnsupConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.records.len(), 1);

        let record = &config.records[0];
        assert_eq!(record.name, "host.example.com.");
        assert_eq!(record.zone, "example.com.");
        assert_eq!(record.key, b"secret-key-bytes");
        assert_eq!(record.server, "ns1.example.com");
        assert!(record.update_v4);
        assert!(!record.update_v6);

        assert_eq!(config.engine.timeout_secs, 10);
        assert_eq!(config.engine.port, 53);
        assert!(!config.engine.dry_run);
    }

    #[test]
    fn missing_flag_is_fatal() {
        let text = r#"
[records."host.example.com"]
zone = "example.com"
key = "c2VjcmV0"
server = "ns1.example.com"
update-v4 = true
"#;
        let err = DnsupConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("update-v6"), "{}", err);
    }

    #[test]
    fn invalid_base64_key_is_fatal() {
        let text = SAMPLE.replace("c2VjcmV0LWtleS1ieXRlcw==", "not base64!");
        let err = DnsupConfig::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("base64"), "{}", err);
    }

    #[test]
    fn empty_file_has_no_records() {
        let err = DnsupConfig::from_toml_str("").unwrap_err();
        assert!(err.to_string().contains("No records"));
    }

    #[test]
    fn record_outside_zone_is_rejected() {
        let text = SAMPLE.replace("zone = \"example.com\"", "zone = \"example.org\"");
        assert!(DnsupConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn engine_table_overrides_defaults() {
        let text = format!(
            "[engine]\ntimeout_secs = 3\nport = 5353\ndry_run = true\n{}",
            SAMPLE
        );
        let config = DnsupConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.engine.timeout_secs, 3);
        assert_eq!(config.engine.port, 5353);
        assert!(config.engine.dry_run);
    }

    #[test]
    fn records_are_sorted_by_name() {
        let text = format!(
            "{}\n[records.\"a.example.com\"]\nzone = \"example.com\"\nkey = \"c2VjcmV0\"\nserver = \"ns1\"\nupdate-v4 = true\nupdate-v6 = true\n",
            SAMPLE
        );
        let config = DnsupConfig::from_toml_str(&text).unwrap();
        let names: Vec<&str> = config.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a.example.com.", "host.example.com."]);
    }

    #[test]
    fn raw_file_is_debug_printable() {
        let file: ConfigFile = toml::from_str(SAMPLE).unwrap();
        let debug = format!("{:?}", file);
        assert!(debug.contains("host.example.com"), "{}", debug);
        assert!(debug.contains("ns1.example.com"), "{}", debug);
    }

    #[test]
    fn debug_output_redacts_key() {
        let record = RecordConfig::new("a.example.com", "example.com", b"topsecret".to_vec(), "ns1");
        let debug = format!("{:?}", record);
        assert!(debug.contains("<REDACTED>"));
        assert!(!debug.contains("topsecret"));
    }

    #[test]
    fn normalize_appends_separator_once() {
        assert_eq!(normalize_fqdn("example.com"), "example.com.");
        assert_eq!(normalize_fqdn("example.com."), "example.com.");
        assert_eq!(normalize_fqdn(""), ".");
    }

    #[test]
    fn load_reports_path_on_parse_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[records.\"broken\"\n").unwrap();

        let err = DnsupConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = DnsupConfig::load(file.path()).unwrap();
        assert_eq!(config.records[0].name, "host.example.com.");
    }
}
