//! Configuration System for fuzzy-tip
//!
//! Provides a configuration system supporting:
//! - TOML configuration files
//! - Environment variable overrides
//! - Engine policies (input range handling, defuzzification, empty output)
//! - Report parameters and the list of evaluated cases
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./fuzzy-tip.toml` - Project-local configuration
//! 2. `~/.config/fuzzy-tip/config.toml` - User configuration (XDG)
//! 3. `/etc/fuzzy-tip/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `FUZZY_TIP_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `FUZZY_TIP_FORMAT` - Console output format (text, json)
//! - `FUZZY_TIP_OUTPUT_DIR` - Directory for report files
//! - `FUZZY_TIP_INPUT_POLICY` - clamp or reject
//! - `FUZZY_TIP_DEFUZZIFIER` - centroid or weighted-mean
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! log_level = "normal"
//! format = "text"
//! output_dir = "output"
//!
//! [engine]
//! input_policy = "clamp"
//! defuzzifier = "centroid"
//! zero_area = "error"
//!
//! [analysis]
//! surface_step = 0.5
//! sensitivity_step = 0.2
//!
//! [[cases]]
//! servicio = 3.0
//! comida = 8.0
//! descripcion = "Servicio malo, comida excelente"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fuzzy::{Defuzzifier, EngineSettings, InputPolicy};
use crate::report::MIN_GRID_STEP;

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TipConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Inference engine policies
    pub engine: EngineSettings,
    /// Report parameters
    pub analysis: AnalysisConfig,
    /// Cases evaluated by the report
    pub cases: Vec<CaseConfig>,
}

impl Default for TipConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            engine: EngineSettings::default(),
            analysis: AnalysisConfig::default(),
            cases: CaseConfig::reference_cases(),
        }
    }
}

/// General configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
    /// Console output format
    pub format: OutputFormat,
    /// Directory the report files are written to
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Normal,
            format: OutputFormat::Text,
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Parameters of the diagnostic report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Grid step of the control surface over both inputs
    pub surface_step: f64,
    /// Step of the sensitivity sweeps
    pub sensitivity_step: f64,
    /// Service rating held fixed while sweeping food
    pub fixed_servicio: f64,
    /// Food rating held fixed while sweeping service
    pub fixed_comida: f64,
    /// Inputs of the single inference snapshot
    pub snapshot_servicio: f64,
    pub snapshot_comida: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            surface_step: 0.5,
            sensitivity_step: 0.2,
            fixed_servicio: 7.0,
            fixed_comida: 7.0,
            snapshot_servicio: 6.5,
            snapshot_comida: 9.5,
        }
    }
}

/// One evaluated case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseConfig {
    pub servicio: f64,
    pub comida: f64,
    #[serde(default)]
    pub descripcion: String,
}

impl CaseConfig {
    pub fn new(servicio: f64, comida: f64, descripcion: impl Into<String>) -> Self {
        Self {
            servicio,
            comida,
            descripcion: descripcion.into(),
        }
    }

    /// The four reference cases of the tipping report
    pub fn reference_cases() -> Vec<Self> {
        vec![
            Self::new(3.0, 8.0, "Servicio malo, comida excelente"),
            Self::new(6.5, 6.0, "Servicio y comida aceptables"),
            Self::new(9.0, 9.5, "Servicio y comida excelentes"),
            Self::new(2.0, 3.0, "Servicio y comida malos"),
        ]
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// `tracing` filter directive for this level
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "info",
            LogLevel::Debug => "debug",
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl TipConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the first existing default location, then
    /// apply environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e.to_string()))
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./fuzzy-tip.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fuzzy-tip").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/fuzzy-tip/config.toml"));

        paths
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key lookup; unparseable values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("FUZZY_TIP_LOG_LEVEL").and_then(|v| LogLevel::from_str(&v)) {
            self.general.log_level = level;
        }

        if let Some(format) = lookup("FUZZY_TIP_FORMAT").and_then(|v| OutputFormat::from_str(&v)) {
            self.general.format = format;
        }

        if let Some(dir) = lookup("FUZZY_TIP_OUTPUT_DIR") {
            self.general.output_dir = PathBuf::from(dir);
        }

        if let Some(policy) =
            lookup("FUZZY_TIP_INPUT_POLICY").and_then(|v| InputPolicy::from_str(&v))
        {
            self.engine.input_policy = policy;
        }

        if let Some(defuzz) =
            lookup("FUZZY_TIP_DEFUZZIFIER").and_then(|v| Defuzzifier::from_str(&v))
        {
            self.engine.defuzzifier = defuzz;
        }
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        let steps = [
            ("analysis.surface_step", self.analysis.surface_step),
            ("analysis.sensitivity_step", self.analysis.sensitivity_step),
        ];
        for (key, step) in steps {
            if !(step.is_finite() && step >= MIN_GRID_STEP) {
                return Err(ConfigError::InvalidValue(
                    key.to_string(),
                    format!("step must be a number >= {}, got {}", MIN_GRID_STEP, step),
                ));
            }
        }

        let inputs = [
            ("analysis.fixed_servicio", self.analysis.fixed_servicio),
            ("analysis.fixed_comida", self.analysis.fixed_comida),
            ("analysis.snapshot_servicio", self.analysis.snapshot_servicio),
            ("analysis.snapshot_comida", self.analysis.snapshot_comida),
        ];
        for (key, value) in inputs {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue(
                    key.to_string(),
                    format!("expected a finite number, got {}", value),
                ));
            }
        }
        Ok(())
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Write configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))
    }

    /// Default configuration file content
    pub fn default_config_content() -> &'static str {
        r#"# fuzzy-tip configuration

[general]
# Logging level: quiet, normal, verbose, debug
log_level = "normal"
# Console output: text, json
format = "text"
# Directory for report files
output_dir = "output"

[engine]
# Out-of-range inputs: clamp (warn and clamp to 0..10) or reject
input_policy = "clamp"
# Defuzzification: centroid (area centroid) or weighted-mean
defuzzifier = "centroid"
# When no rule fires: error or midpoint
zero_area = "error"

[analysis]
surface_step = 0.5
sensitivity_step = 0.2
fixed_servicio = 7.0
fixed_comida = 7.0
snapshot_servicio = 6.5
snapshot_comida = 9.5

[[cases]]
servicio = 3.0
comida = 8.0
descripcion = "Servicio malo, comida excelente"

[[cases]]
servicio = 6.5
comida = 6.0
descripcion = "Servicio y comida aceptables"

[[cases]]
servicio = 9.0
comida = 9.5
descripcion = "Servicio y comida excelentes"

[[cases]]
servicio = 2.0
comida = 3.0
descripcion = "Servicio y comida malos"
"#
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO error reading/writing config file
    IoError(PathBuf, String),
    /// Parse error in config file
    ParseError(PathBuf, String),
    /// Serialization error
    SerializeError(String),
    /// A value parsed but is not usable
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(f, "IO error reading {}: {}", path.display(), msg)
            }
            ConfigError::ParseError(path, msg) => {
                write!(f, "Parse error in {}: {}", path.display(), msg)
            }
            ConfigError::SerializeError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            ConfigError::InvalidValue(key, msg) => {
                write!(f, "Invalid value for {}: {}", key, msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use crate::fuzzy::ZeroAreaPolicy;

    #[test]
    fn test_default_config() {
        let config = TipConfig::new();
        assert_eq!(config.general.log_level, LogLevel::Normal);
        assert_eq!(config.engine.input_policy, InputPolicy::Clamp);
        assert_eq!(config.engine.defuzzifier, Defuzzifier::Centroid);
        assert_eq!(config.cases.len(), 4);
        assert_eq!(config.analysis.surface_step, 0.5);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [general]
            format = "json"
            log_level = "verbose"

            [engine]
            input_policy = "reject"
            defuzzifier = "weighted-mean"
            zero_area = "midpoint"

            [analysis]
            surface_step = 1.0

            [[cases]]
            servicio = 1.0
            comida = 2.0
        "#;

        let config = TipConfig::load_from_str(toml).unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.general.log_level, LogLevel::Verbose);
        assert_eq!(config.engine.input_policy, InputPolicy::Reject);
        assert_eq!(config.engine.defuzzifier, Defuzzifier::WeightedMean);
        assert_eq!(config.engine.zero_area, ZeroAreaPolicy::Midpoint);
        assert_eq!(config.analysis.surface_step, 1.0);
        assert_eq!(config.analysis.sensitivity_step, 0.2);
        assert_eq!(config.cases, vec![CaseConfig::new(1.0, 2.0, "")]);
    }

    #[test]
    fn test_default_content_matches_defaults() {
        let parsed = TipConfig::load_from_str(TipConfig::default_config_content()).unwrap();
        assert_eq!(parsed, TipConfig::default());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FUZZY_TIP_LOG_LEVEL", "debug"),
            ("FUZZY_TIP_INPUT_POLICY", "reject"),
            ("FUZZY_TIP_DEFUZZIFIER", "nonsense"),
            ("FUZZY_TIP_OUTPUT_DIR", "/tmp/propinas"),
        ]
        .into_iter()
        .collect();

        let mut config = TipConfig::new();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.general.log_level, LogLevel::Debug);
        assert_eq!(config.engine.input_policy, InputPolicy::Reject);
        // Unparseable values leave the setting alone
        assert_eq!(config.engine.defuzzifier, Defuzzifier::Centroid);
        assert_eq!(config.general.output_dir, PathBuf::from("/tmp/propinas"));
    }

    #[test]
    fn test_validate_rejects_bad_steps() {
        let mut config = TipConfig::new();
        config.analysis.surface_step = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_, _))));

        let mut config = TipConfig::new();
        config.analysis.surface_step = 1e-300;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(key, _)) if key == "analysis.surface_step"
        ));

        let mut config = TipConfig::new();
        config.analysis.sensitivity_step = MIN_GRID_STEP;
        assert!(config.validate().is_ok());

        let mut config = TipConfig::new();
        config.analysis.fixed_comida = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = TipConfig::new();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[engine]"));
        assert_eq!(TipConfig::load_from_str(&toml).unwrap(), config);
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("quiet"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::from_str("v"), Some(LogLevel::Verbose));
        assert_eq!(LogLevel::from_str("loud"), None);
        assert_eq!(LogLevel::Debug.filter_directive(), "debug");
    }

    #[test]
    fn test_config_paths() {
        let paths = TipConfig::config_paths();
        assert!(paths[0].ends_with("fuzzy-tip.toml"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fuzzy-tip.toml");
        let mut config = TipConfig::new();
        config.general.format = OutputFormat::Json;
        config.save_to_file(&path).unwrap();
        assert_eq!(TipConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TipConfig::load_from_file(Path::new("/nonexistent/fuzzy-tip.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_, _)));
    }
}
