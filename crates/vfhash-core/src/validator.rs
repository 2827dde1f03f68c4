//! Allow-list of virtual mount prefixes.

use vfhash_config::{HasherConfig, DEFAULT_PREFIXES};

/// Accepts paths that start with one of a fixed set of prefixes.
///
/// Matching is a plain, case-sensitive `starts_with`; no normalization is
/// applied. Containment inside a volume is the device's concern.
#[derive(Debug, Clone)]
pub struct PathValidator {
    prefixes: Vec<String>,
}

impl Default for PathValidator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIXES)
    }
}

impl PathValidator {
    /// Build from an explicit prefix list. Empty prefixes are dropped.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty())
            .collect();
        Self { prefixes }
    }

    /// Default volumes plus the configured extra prefixes
    pub fn from_config(config: &HasherConfig) -> Self {
        Self::new(config.prefixes())
    }

    pub fn is_whitelisted(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_volumes_accepted() {
        let validator = PathValidator::default();
        for path in [
            "platform:/data/a.rpf",
            "common:/data/levels/x.meta",
            "update:/update.rpf",
            "update2:/dlc.rpf",
            "audio:/sfx/one.awc",
            "commoncrc:/data/b",
            "platformcrc:/models/c",
        ] {
            assert!(validator.is_whitelisted(path), "{} should be accepted", path);
        }
    }

    #[test]
    fn test_rejections() {
        let validator = PathValidator::default();
        for path in [
            "",
            "/etc/passwd",
            "Platform:/data/a.rpf",
            "PLATFORM:/a",
            "platform:data",
            "x:/platform:/a",
            "dlc:/a",
            "C:\\Windows\\win.ini",
        ] {
            assert!(!validator.is_whitelisted(path), "{:?} should be rejected", path);
        }
    }

    #[test]
    fn test_no_traversal_normalization() {
        // Prefix match only: containment is enforced by the device
        let validator = PathValidator::default();
        assert!(validator.is_whitelisted("common:/../../secret"));
    }

    #[test]
    fn test_extra_prefixes_from_config() {
        let config = HasherConfig {
            extra_prefixes: vec!["dlcpacks:/".into(), String::new()],
            ..Default::default()
        };
        let validator = PathValidator::from_config(&config);
        assert!(validator.is_whitelisted("dlcpacks:/mp/dlc.rpf"));
        assert!(!validator.is_whitelisted("anything"));
        assert_eq!(validator.prefixes().len(), DEFAULT_PREFIXES.len() + 1);
    }
}
