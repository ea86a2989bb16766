//! Configuration loaded from `lineage.toml`

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "lineage.toml";

/// Which id generator new people get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    #[default]
    Uuid,
    Sequential,
}

/// Box sizes and gaps used by the layout engine, in drawing units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Width of a root or child box.
    pub node_width: f64,
    /// Width of a spouse box; wider since it pairs two people visually.
    pub spouse_width: f64,
    pub node_height: f64,
    /// Vertical gap between generations.
    pub rank_gap: f64,
    /// Horizontal gap between neighbouring boxes.
    pub sibling_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 120.0,
            spouse_width: 240.0,
            node_height: 180.0,
            rank_gap: 60.0,
            sibling_gap: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineageConfig {
    /// Title used for new trees and written into exported files.
    pub tree_name: String,
    pub id_scheme: IdScheme,
    pub layout: LayoutConfig,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            tree_name: "Family Tree".to_string(),
            id_scheme: IdScheme::Uuid,
            layout: LayoutConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid config {path}: {reason}")]
    Invalid { path: String, reason: String },
}

impl LayoutConfig {
    /// Box sizes must be positive and gaps non-negative, otherwise
    /// neighbouring boxes can collapse onto one point.
    pub fn validate(&self) -> Result<(), String> {
        let sizes = [
            ("node_width", self.node_width),
            ("spouse_width", self.spouse_width),
            ("node_height", self.node_height),
        ];
        let gaps = [("rank_gap", self.rank_gap), ("sibling_gap", self.sibling_gap)];

        for (key, value) in sizes.iter().chain(&gaps) {
            if !value.is_finite() {
                return Err(format!("layout.{key} must be a finite number, got {value}"));
            }
        }
        if let Some((key, value)) = sizes.iter().find(|(_, v)| *v <= 0.0) {
            return Err(format!("layout.{key} must be positive, got {value}"));
        }
        if let Some((key, value)) = gaps.iter().find(|(_, v)| *v < 0.0) {
            return Err(format!("layout.{key} must not be negative, got {value}"));
        }
        Ok(())
    }
}

impl LineageConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, "<inline>")
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    fn parse(text: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.layout.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_string(),
            reason,
        })?;
        Ok(config)
    }

    /// Load `explicit` if given, else `lineage.toml` in `dir` if present,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!("Using config {}", candidate.display());
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = LineageConfig::from_toml(
            r#"
tree_name = "Okafor"

[layout]
rank_gap = 100.0
"#,
        )
        .unwrap();

        assert_eq!(config.tree_name, "Okafor");
        assert_eq!(config.id_scheme, IdScheme::Uuid);
        assert_eq!(config.layout.rank_gap, 100.0);
        assert_eq!(config.layout.spouse_width, 240.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            LineageConfig::from_toml("colour = \"red\""),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn degenerate_layout_is_rejected() {
        for layout in [
            "node_width = 0.0\nspouse_width = 0.0\nsibling_gap = 0.0",
            "node_height = -10.0",
            "sibling_gap = -1.0",
            "rank_gap = nan",
            "spouse_width = inf",
        ] {
            let text = format!("[layout]\n{layout}\n");
            let err = LineageConfig::from_toml(&text).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{layout}: {err}");
        }

        let zero_gaps = LineageConfig::from_toml("[layout]\nrank_gap = 0.0\nsibling_gap = 0.0\n").unwrap();
        assert_eq!(zero_gaps.layout.sibling_gap, 0.0);
        assert!(LayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn load_reports_invalid_layout_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[layout]\nnode_width = 0.0\n").unwrap();

        let err = LineageConfig::discover(None, dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("layout.node_width must be positive"), "{err}");
        assert!(err.to_string().contains(CONFIG_FILE), "{err}");
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LineageConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config, LineageConfig::default());

        std::fs::write(dir.path().join(CONFIG_FILE), "id_scheme = \"sequential\"\n").unwrap();
        let config = LineageConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.id_scheme, IdScheme::Sequential);
    }
}
