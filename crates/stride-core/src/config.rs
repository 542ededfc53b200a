use crate::error::Result;
use crate::template::DEFAULT_PLACEHOLDER;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// StrideConfig
// ---------------------------------------------------------------------------

pub const DEFAULT_BLOCKER_KEYWORDS: &[&str] = &[
    "blocked",
    "blocker",
    "cannot proceed",
    "waiting for",
    "stuck",
    "depends on external",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrideConfig {
    /// Days without a document change before a sprint counts as stale.
    #[serde(default = "default_staleness_days")]
    pub staleness_days: u32,
    #[serde(default = "default_blocker_keywords")]
    pub blocker_keywords: Vec<String>,
    #[serde(default = "default_recent_log_limit")]
    pub recent_log_limit: usize,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_staleness_days() -> u32 {
    7
}

fn default_blocker_keywords() -> Vec<String> {
    DEFAULT_BLOCKER_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

fn default_recent_log_limit() -> usize {
    5
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

impl Default for StrideConfig {
    fn default() -> Self {
        Self {
            staleness_days: default_staleness_days(),
            blocker_keywords: default_blocker_keywords(),
            recent_log_limit: default_recent_log_limit(),
            placeholder: default_placeholder(),
        }
    }
}

impl StrideConfig {
    /// An empty document yields the defaults.
    pub fn from_yaml_str(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: StrideConfig = serde_yaml::from_str(data)?;
        Ok(cfg)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.staleness_days == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "staleness_days is 0: every sprint will be reported stale".to_string(),
            });
        }

        if self.blocker_keywords.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "blocker_keywords is empty: blocker detection is disabled".to_string(),
            });
        }
        for keyword in &self.blocker_keywords {
            if keyword.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "blocker_keywords contains an empty keyword".to_string(),
                });
            }
        }

        if self.placeholder.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "placeholder must not be empty".to_string(),
            });
        } else if self.placeholder.chars().any(char::is_whitespace) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("placeholder '{}' contains whitespace", self.placeholder),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_empty_document() {
        let cfg = StrideConfig::from_yaml_str("").unwrap();
        assert_eq!(cfg.staleness_days, 7);
        assert_eq!(cfg.recent_log_limit, 5);
        assert_eq!(cfg.placeholder, "$ARGUMENTS");
        assert_eq!(cfg.blocker_keywords.len(), 6);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let cfg = StrideConfig::from_yaml_str("staleness_days: 14\nblocker_keywords: [on hold]\n")
            .unwrap();
        assert_eq!(cfg.staleness_days, 14);
        assert_eq!(cfg.blocker_keywords, vec!["on hold"]);
        assert_eq!(cfg.recent_log_limit, 5);
    }

    #[test]
    fn yaml_roundtrip() {
        let cfg = StrideConfig::default();
        let yaml = cfg.to_yaml_string().unwrap();
        let parsed = StrideConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed.blocker_keywords, cfg.blocker_keywords);
        assert_eq!(parsed.placeholder, cfg.placeholder);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(StrideConfig::from_yaml_str("staleness_days: [").is_err());
        assert!(StrideConfig::from_yaml_str("staleness_days: soon").is_err());
    }

    #[test]
    fn validate_flags_bad_values() {
        let cfg = StrideConfig {
            staleness_days: 0,
            blocker_keywords: vec!["  ".to_string()],
            recent_log_limit: 5,
            placeholder: String::new(),
        };
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 3);
        assert_eq!(
            warnings
                .iter()
                .filter(|w| w.level == WarnLevel::Error)
                .count(),
            2
        );
    }
}
