use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which demo variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoKind {
    /// One triangle in front of the viewer, no motion.
    Static,
    /// One triangle spinning about the vertical axis.
    #[default]
    Spin,
    /// Two triangles whose transforms are baked into the vertex data.
    Pair,
    /// First-person camera flying around a spinning triangle.
    Flythrough,
}

impl DemoKind {
    pub const ALL: [DemoKind; 4] = [
        DemoKind::Static,
        DemoKind::Spin,
        DemoKind::Pair,
        DemoKind::Flythrough,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DemoKind::Static => "static",
            DemoKind::Spin => "spin",
            DemoKind::Pair => "pair",
            DemoKind::Flythrough => "flythrough",
        }
    }

    /// Vertical field of view in degrees, or `None` when the demo draws
    /// without a projection.
    pub fn default_fov_degrees(self) -> Option<f32> {
        match self {
            DemoKind::Static | DemoKind::Spin => Some(90.0),
            DemoKind::Flythrough => Some(45.0),
            DemoKind::Pair => None,
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            DemoKind::Static => "Triangle",
            DemoKind::Spin => "Spinning triangle",
            DemoKind::Pair => "Two triangles",
            DemoKind::Flythrough => "First person camera",
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DemoKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DemoKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownDemo(s.to_string()))
    }
}

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("unknown demo '{0}' (expected static, spin, pair or flythrough)")]
    UnknownDemo(String),
    #[error("invalid window size {width}x{height}")]
    InvalidWindowSize { width: u32, height: u32 },
    #[error("target frame rate must be positive")]
    InvalidTargetFps,
}

/// Startup configuration for a demo run.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub demo: DemoKind,
    pub width: u32,
    pub height: u32,
    /// Window title; falls back to the demo's own title.
    pub title: Option<String>,
    pub clear_color: [f32; 4],
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    /// Frame rate the frame-time normalization assumes at most.
    pub target_fps: u32,
    /// Overrides the demo's field of view, in degrees.
    pub fov_degrees: Option<f32>,
    pub near: f32,
    pub far: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            demo: DemoKind::default(),
            width: 640,
            height: 480,
            title: None,
            clear_color: [0.0, 0.33, 0.5, 1.0],
            vertex_shader: PathBuf::from("shaders/vertex.wgsl"),
            fragment_shader: PathBuf::from("shaders/fragment.wgsl"),
            target_fps: 144,
            fov_degrees: None,
            near: 0.1,
            far: 10.0,
        }
    }
}

impl DemoConfig {
    pub fn for_demo(demo: DemoKind) -> Self {
        Self {
            demo,
            ..Default::default()
        }
    }

    /// Load a config file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let config: Self = match ext.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        config.validate()?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidWindowSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.target_fps == 0 {
            return Err(ConfigError::InvalidTargetFps);
        }
        Ok(())
    }

    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| self.demo.default_title())
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn fov_degrees(&self) -> Option<f32> {
        self.demo
            .default_fov_degrees()
            .map(|fov| self.fov_degrees.unwrap_or(fov))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn demo_kind_parses_case_insensitively() {
        assert_eq!("Flythrough".parse::<DemoKind>().unwrap(), DemoKind::Flythrough);
        assert_eq!(" pair ".parse::<DemoKind>().unwrap(), DemoKind::Pair);
        assert!(matches!(
            "cube".parse::<DemoKind>(),
            Err(ConfigError::UnknownDemo(_))
        ));
    }

    #[test]
    fn demo_kind_display_round_trips_through_from_str() {
        for kind in DemoKind::ALL {
            assert_eq!(kind.to_string().parse::<DemoKind>().unwrap(), kind);
        }
    }

    #[test]
    fn defaults_match_demo() {
        let cfg = DemoConfig::for_demo(DemoKind::Flythrough);
        assert_eq!(cfg.width, 640);
        assert_eq!(cfg.height, 480);
        assert_eq!(cfg.fov_degrees(), Some(45.0));
        assert_eq!(cfg.title(), "First person camera");
        assert_eq!(DemoConfig::for_demo(DemoKind::Pair).fov_degrees(), None);
    }

    #[test]
    fn fov_override_applies_only_to_projected_demos() {
        let mut cfg = DemoConfig::for_demo(DemoKind::Spin);
        cfg.fov_degrees = Some(60.0);
        assert_eq!(cfg.fov_degrees(), Some(60.0));
        cfg.demo = DemoKind::Pair;
        assert_eq!(cfg.fov_degrees(), None);
    }

    #[test]
    fn load_partial_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "demo: flythrough\nwidth: 800\ntitle: Test").unwrap();
        let cfg = DemoConfig::load(file.path()).unwrap();
        assert_eq!(cfg.demo, DemoKind::Flythrough);
        assert_eq!(cfg.width, 800);
        assert_eq!(cfg.height, 480);
        assert_eq!(cfg.title(), "Test");
    }

    #[test]
    fn load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"demo": "pair", "target_fps": 60}}"#).unwrap();
        let cfg = DemoConfig::load(file.path()).unwrap();
        assert_eq!(cfg.demo, DemoKind::Pair);
        assert_eq!(cfg.target_fps, 60);
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            DemoConfig::load(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn load_rejects_zero_size() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "width: 0").unwrap();
        assert!(matches!(
            DemoConfig::load(file.path()),
            Err(ConfigError::InvalidWindowSize { .. })
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = DemoConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
