//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

/// Policy switches for resolution and the refuse/proceed decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Trim and lower-case requested domains before matching
    pub normalize_domains: bool,

    /// Refuse when every resolved source is demo or stub
    pub refuse_demo_only: bool,

    /// Refuse when only some requested domains resolve
    pub refuse_partial: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            normalize_domains: true,
            refuse_demo_only: false,
            refuse_partial: false,
        }
    }
}

impl GateConfig {
    /// Refuse only when nothing resolves; match domains exactly as given
    pub fn permissive() -> Self {
        Self {
            normalize_domains: false,
            refuse_demo_only: false,
            refuse_partial: false,
        }
    }

    /// Refuse anything short of a fully resolved, non-demo answer
    pub fn strict() -> Self {
        Self {
            normalize_domains: true,
            refuse_demo_only: true,
            refuse_partial: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GateConfig::default();
        assert!(config.normalize_domains);
        assert!(!config.refuse_demo_only);
        assert!(!config.refuse_partial);
    }

    #[test]
    fn test_permissive_config() {
        assert!(!GateConfig::permissive().normalize_domains);
    }

    #[test]
    fn test_strict_config() {
        let config = GateConfig::strict();
        assert!(config.refuse_demo_only);
        assert!(config.refuse_partial);
    }
}
