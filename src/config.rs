use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_model_path() -> String {
    "models/yolov4-tiny.onnx".to_string()
}

fn default_labels_path() -> String {
    "models/coco.names".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path or URL of the ONNX artifact.
    #[serde(default = "default_model_path")]
    pub path: String,
    /// Class-name file, one name per line; line order defines class indices.
    #[serde(default = "default_labels_path")]
    pub labels: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            labels: default_labels_path(),
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
        }
    }
}

fn default_output_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoConfig {
    /// Scale factor applied to each frame before detection and display.
    #[serde(default = "default_output_scale")]
    pub output_scale: f64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            output_scale: default_output_scale(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub video: VideoConfig,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// A missing file is not an error: the defaults are the fixed relative
    /// paths the demo ships with.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from("does-not-exist.toml").unwrap();
        assert_eq!(config.model.path, "models/yolov4-tiny.onnx");
        assert_eq!(config.model.labels, "models/coco.names");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.video.output_scale, 1.0);
    }

    #[test]
    fn partial_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nport = 9090\n\n[model]\npath = \"people.onnx\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.http.port, 9090);
        assert_eq!(config.model.path, "people.onnx");
        assert_eq!(config.model.labels, "models/coco.names");
        assert_eq!(config.video.output_scale, 1.0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http\nport = ").unwrap();

        assert!(Config::load_from(file.path()).is_err());
    }
}
