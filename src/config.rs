//! Wrapper configuration: engine launch settings, presented identity, and
//! the rating-to-weights table.

use crate::error::{Result, WrapperError};
use crate::translate::{EloRange, EngineIdentity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WrapperConfig {
    pub engine: EngineConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    pub strength: StrengthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Engine binary; bare names are resolved via PATH at launch.
    pub binary: PathBuf,
    /// Directory containing one weight file per supported rating.
    pub weights_dir: PathBuf,
}

/// Identity the wrapper presents to the GUI during the handshake.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_author")]
    pub author: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            author: default_author(),
        }
    }
}

fn default_name() -> String {
    "Maia".to_string()
}

fn default_author() -> String {
    "Maia Team".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrengthConfig {
    /// Rating used at startup and advertised as the option default.
    #[serde(default = "default_rating")]
    pub default_rating: u32,
    /// Rating -> weight-file name. Immutable after load.
    pub ratings: BTreeMap<u32, String>,
}

fn default_rating() -> u32 {
    1100
}

impl WrapperConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            WrapperError::Config(format!(
                "failed to parse {} as YAML: {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        const DEFAULT_WRAPPER_YAML: &str = include_str!("../wrapper.yaml");

        serde_yaml::from_str(DEFAULT_WRAPPER_YAML)
            .expect("Failed to parse embedded wrapper.yaml - this is a bug in the wrapper.yaml file")
    }

    fn validate(&self) -> Result<()> {
        if self.strength.ratings.is_empty() {
            return Err(WrapperError::Config(
                "strength.ratings must not be empty".to_string(),
            ));
        }
        if !self
            .strength
            .ratings
            .contains_key(&self.strength.default_rating)
        {
            return Err(WrapperError::Config(format!(
                "default_rating {} has no entry in strength.ratings",
                self.strength.default_rating
            )));
        }
        Ok(())
    }

    /// Looks up the weight-file name for an exact rating.
    pub fn resolve(&self, rating: u32) -> Result<&str> {
        self.strength
            .ratings
            .get(&rating)
            .map(String::as_str)
            .ok_or(WrapperError::UnknownRating(rating))
    }

    /// Full path to the weight file for an exact rating.
    pub fn weights_path(&self, rating: u32) -> Result<PathBuf> {
        let file = self.resolve(rating)?;
        Ok(self.engine.weights_dir.join(file))
    }

    /// Nearest configured rating to `target`. Ties resolve to the lower
    /// rating. Used for the operator hint when a request is rejected.
    pub fn closest_rating(&self, target: u32) -> Option<u32> {
        self.strength
            .ratings
            .keys()
            .copied()
            .min_by_key(|r| r.abs_diff(target))
    }

    /// Range advertised in the synthetic `UCI_Elo` option declaration.
    pub fn elo_range(&self) -> EloRange {
        let default = self.strength.default_rating;
        EloRange {
            min: self
                .strength
                .ratings
                .keys()
                .next()
                .copied()
                .unwrap_or(default),
            max: self
                .strength
                .ratings
                .keys()
                .next_back()
                .copied()
                .unwrap_or(default),
            default,
        }
    }

    pub fn engine_identity(&self) -> EngineIdentity {
        EngineIdentity {
            name: self.identity.name.clone(),
            author: self.identity.author.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_parses_and_validates() {
        let config = WrapperConfig::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.strength.default_rating, 1100);
        assert_eq!(config.strength.ratings.len(), 9);
        assert_eq!(config.identity.name, "Maia");
        assert_eq!(config.identity.author, "Maia Team");
    }

    #[test]
    fn test_resolve_exact_rating() {
        let config = WrapperConfig::default_config();
        assert_eq!(config.resolve(1500).unwrap(), "maia-1500.pb.gz");
    }

    #[test]
    fn test_resolve_unknown_rating() {
        let config = WrapperConfig::default_config();
        let err = config.resolve(1450).unwrap_err();
        assert!(matches!(err, WrapperError::UnknownRating(1450)));
    }

    #[test]
    fn test_weights_path_joins_dir() {
        let mut config = WrapperConfig::default_config();
        config.engine.weights_dir = PathBuf::from("/data/weights");
        let path = config.weights_path(1100).unwrap();
        assert_eq!(path, PathBuf::from("/data/weights/maia-1100.pb.gz"));
    }

    #[test]
    fn test_closest_rating() {
        let config = WrapperConfig::default_config();
        assert_eq!(config.closest_rating(1449), Some(1400));
        assert_eq!(config.closest_rating(1451), Some(1500));
        // Ties resolve to the lower rating
        assert_eq!(config.closest_rating(1450), Some(1400));
        assert_eq!(config.closest_rating(0), Some(1100));
        assert_eq!(config.closest_rating(5000), Some(1900));
    }

    #[test]
    fn test_elo_range_spans_table() {
        let config = WrapperConfig::default_config();
        let range = config.elo_range();
        assert_eq!(range.min, 1100);
        assert_eq!(range.max, 1900);
        assert_eq!(range.default, 1100);
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
engine:
  binary: /opt/engines/lc0
  weights_dir: /data/weights
strength:
  default_rating: 1300
  ratings:
    1200: small.pb.gz
    1300: medium.pb.gz
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = WrapperConfig::load(file.path()).unwrap();
        assert_eq!(config.engine.binary, PathBuf::from("/opt/engines/lc0"));
        assert_eq!(config.strength.default_rating, 1300);
        // Identity falls back to the built-in defaults
        assert_eq!(config.identity.name, "Maia");
        let range = config.elo_range();
        assert_eq!((range.min, range.max), (1200, 1300));
    }

    #[test]
    fn test_load_rejects_empty_table() {
        let yaml = r#"
engine:
  binary: lc0
  weights_dir: .
strength:
  ratings: {}
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let err = WrapperConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, WrapperError::Config(_)));
    }

    #[test]
    fn test_load_rejects_default_outside_table() {
        let yaml = r#"
engine:
  binary: lc0
  weights_dir: .
strength:
  default_rating: 1000
  ratings:
    1100: maia-1100.pb.gz
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let err = WrapperConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("default_rating"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = WrapperConfig::load(Path::new("/nonexistent/wrapper.yaml")).unwrap_err();
        assert!(matches!(err, WrapperError::Io(_)));
    }
}
