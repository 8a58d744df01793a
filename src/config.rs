use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    fn set(&mut self, value: T, source: ConfigSource) {
        self.value = value;
        self.source = source;
    }
}

/// Text recognition settings
#[derive(Debug, Clone, Serialize)]
pub struct OcrConfig {
    /// Recognizer executable
    pub command: ConfigValue<String>,
    /// Recognition language passed to the recognizer
    pub language: ConfigValue<String>,
    /// Upper bound on a single recognition, in seconds
    pub timeout_secs: ConfigValue<u64>,
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.value)
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Base URL of the list server
    pub server_url: ConfigValue<String>,
    /// Where the logged-in session is kept
    pub session_path: ConfigValue<PathBuf>,
    pub ocr: OcrConfig,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    server_url: Option<String>,
    session_path: Option<PathBuf>,
    ocr: Option<OcrFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OcrFile {
    command: Option<String>,
    language: Option<String>,
    timeout_secs: Option<u64>,
}

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_OCR_COMMAND: &str = "tesseract";
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 60;

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::defaults();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config.apply_file(&path, file_config);
            config.config_file = Some(path);
        }

        config.apply_env();
        Ok(config)
    }

    fn defaults() -> Self {
        Self {
            server_url: ConfigValue::new(DEFAULT_SERVER_URL.to_string(), ConfigSource::Default),
            session_path: ConfigValue::new(
                Self::default_data_dir().join("session.json"),
                ConfigSource::Default,
            ),
            ocr: OcrConfig {
                command: ConfigValue::new(DEFAULT_OCR_COMMAND.to_string(), ConfigSource::Default),
                language: ConfigValue::new(
                    DEFAULT_OCR_LANGUAGE.to_string(),
                    ConfigSource::Default,
                ),
                timeout_secs: ConfigValue::new(DEFAULT_OCR_TIMEOUT_SECS, ConfigSource::Default),
            },
            config_file: None,
        }
    }

    fn apply_file(&mut self, path: &Path, file: ConfigFile) {
        if let Some(url) = file.server_url {
            self.server_url.set(url, ConfigSource::File);
        }
        if let Some(session_path) = file.session_path {
            // Resolve relative paths against config file's directory
            let resolved = if session_path.is_relative() {
                path.parent()
                    .map(|p| p.join(&session_path))
                    .unwrap_or(session_path)
            } else {
                session_path
            };
            self.session_path.set(resolved, ConfigSource::File);
        }
        if let Some(ocr) = file.ocr {
            if let Some(command) = ocr.command {
                self.ocr.command.set(command, ConfigSource::File);
            }
            if let Some(language) = ocr.language {
                self.ocr.language.set(language, ConfigSource::File);
            }
            if let Some(secs) = ocr.timeout_secs {
                self.ocr.timeout_secs.set(secs, ConfigSource::File);
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("SCANLIST_SERVER_URL") {
            self.server_url.set(url, ConfigSource::Environment);
        }
        if let Ok(path) = std::env::var("SCANLIST_SESSION_PATH") {
            self.session_path
                .set(PathBuf::from(path), ConfigSource::Environment);
        }
        if let Ok(command) = std::env::var("SCANLIST_OCR_COMMAND") {
            self.ocr.command.set(command, ConfigSource::Environment);
        }
        if let Ok(language) = std::env::var("SCANLIST_OCR_LANGUAGE") {
            self.ocr.language.set(language, ConfigSource::Environment);
        }
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/scanlist/
    /// - macOS: ~/Library/Application Support/scanlist/
    /// - Windows: %APPDATA%/scanlist/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scanlist")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/scanlist/
    /// - macOS: ~/Library/Application Support/scanlist/
    /// - Windows: %APPDATA%/scanlist/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scanlist")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config
            .session_path
            .value
            .to_string_lossy()
            .contains("session.json"));
        assert_eq!(config.session_path.source, ConfigSource::Default);
        assert_eq!(config.ocr.timeout_secs.value, 60);
        assert_eq!(config.ocr.timeout(), Duration::from_secs(60));
        assert_eq!(config.ocr.timeout_secs.source, ConfigSource::Default);
        assert_eq!(config.config_file, None);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "session_path: /custom/session.json").unwrap();
        writeln!(file, "ocr:").unwrap();
        writeln!(file, "  timeout_secs: 5").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(
            config.session_path.value,
            PathBuf::from("/custom/session.json")
        );
        assert_eq!(config.session_path.source, ConfigSource::File);
        assert_eq!(config.ocr.timeout_secs.value, 5);
        assert_eq!(config.ocr.timeout_secs.source, ConfigSource::File);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_session_path_resolves_against_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "session_path: state/session.json").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(
            config.session_path.value,
            temp_dir.path().join("state/session.json")
        );
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "server_url: http://fromfile:5000").unwrap();

        std::env::set_var("SCANLIST_SERVER_URL", "http://fromenv:5000");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.server_url.value, "http://fromenv:5000");
        assert_eq!(config.server_url.source, ConfigSource::Environment);

        std::env::remove_var("SCANLIST_SERVER_URL");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_partial_ocr_section() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "ocr:").unwrap();
        writeln!(file, "  language: deu").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.ocr.language.value, "deu");
        assert_eq!(config.ocr.language.source, ConfigSource::File);
        assert_eq!(config.ocr.timeout_secs.source, ConfigSource::Default);
    }
}
