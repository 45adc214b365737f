use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub adb: AdbConfig,
    pub monitoring: MonitoringConfig,
    pub filters: FilterConfig,
    pub otp: OtpConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdbConfig {
    /// Path to the adb binary.
    pub path: String,
    /// Device IP for wireless debugging. Required for startup.
    pub device_ip: String,
    pub port: u16,
    pub command_timeout_ms: u64,
}

impl Default for AdbConfig {
    fn default() -> Self {
        AdbConfig {
            path: "adb".to_string(),
            device_ip: String::new(),
            port: 5555,
            command_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub poll_interval_ms: u64,
    /// Cap for one-shot list mode output.
    pub max_messages_to_display: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        MonitoringConfig {
            poll_interval_ms: 5_000,
            max_messages_to_display: 50,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub mode: FilterMode,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Every sender is included.
    #[default]
    None,
    /// Only senders matching a source entry are included.
    Include,
    /// Senders matching a source entry are dropped.
    Exclude,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceEntry {
    pub value: String,
    pub match_type: MatchType,
    /// Optional human-readable label shown next to matching senders.
    pub label: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    #[default]
    Exact,
    Contains,
    Regex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    pub enabled: bool,
    /// Confidence at or above which an OTP line is rendered prominently.
    pub highlight_threshold: f64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        OtpConfig {
            enabled: true,
            highlight_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Enable remote LLM escalation. Requires an API key.
    pub enabled: bool,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    /// Remote request timeout, independent of the ADB fetch timeout.
    pub request_timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            enabled: false,
            api_key: String::new(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 256,
            request_timeout_secs: 15,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Example configuration written by `--generate-config`.
    pub fn example() -> Self {
        Config {
            adb: AdbConfig {
                device_ip: "192.168.1.50".to_string(),
                ..Default::default()
            },
            filters: FilterConfig {
                mode: FilterMode::None,
                sources: vec![SourceEntry {
                    value: "BANK".to_string(),
                    match_type: MatchType::Contains,
                    label: "My bank".to_string(),
                }],
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.adb.path, "adb");
        assert_eq!(config.adb.port, 5555);
        assert_eq!(config.monitoring.poll_interval_ms, 5_000);
        assert_eq!(config.filters.mode, FilterMode::None);
        assert!(config.otp.enabled);
        assert!(!config.classifier.enabled);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "adb:\n  device_ip: 10.0.0.5\n  port: 5556\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.adb.device_ip, "10.0.0.5");
        assert_eq!(config.adb.port, 5556);
        assert_eq!(config.adb.path, "adb");
        assert_eq!(config.monitoring.max_messages_to_display, 50);
    }

    #[test]
    fn test_filter_entries_round_trip() {
        let yaml = "filters:\n  mode: include\n  sources:\n    - value: '^\\+9725'\n      match_type: regex\n      label: Israeli numbers\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.filters.mode, FilterMode::Include);
        assert_eq!(config.filters.sources.len(), 1);
        assert_eq!(config.filters.sources[0].match_type, MatchType::Regex);
        assert_eq!(config.filters.sources[0].label, "Israeli numbers");

        let out = serde_yaml::to_string(&config).unwrap();
        let back: Config = serde_yaml::from_str(&out).unwrap();
        assert_eq!(back.filters.sources[0].value, "^\\+9725");
    }
}
