use std::path::Path;

use encoding_rs::Encoding;
use serde::Deserialize;

use crate::job::storage::disk::DiskPath;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Semicolon => b';',
            Self::Tab => b'\t',
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MappingMode {
    #[default]
    ByHeader,
    ByColumns,
}

fn default_encoding() -> String {
    "utf-8".to_owned()
}

fn enabled() -> bool {
    true
}

/// Options of one append invocation as written in a config file.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AppendConfig {
    pub file_path: String,
    #[serde(default)]
    pub delimiter: Delimiter,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "enabled")]
    pub has_header: bool,
    #[serde(default)]
    pub mapping_mode: MappingMode,
    /// Comma separated column names, used by [`MappingMode::ByColumns`].
    #[serde(default)]
    pub columns: Option<String>,
    #[serde(default = "enabled")]
    pub create_if_missing: bool,
    #[serde(default = "enabled")]
    pub write_header_on_create: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(std::io::Error),
    #[error("Failed to parse YAML config: {0}")]
    ParseYaml(serde_yaml::Error),
    #[error("Failed to parse TOML config: {0}")]
    ParseToml(toml::de::Error),
    #[error("File path is empty")]
    EmptyPath,
    #[error("Unknown encoding label: {0}")]
    UnknownEncoding(String),
    #[error("Encoding {0} cannot be used for upload")]
    UnsupportedEncoding(&'static str),
    #[error("Mapping by columns requires a non-empty column list")]
    MissingColumns,
}

/// How records are laid out into rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapping {
    ByHeader,
    ByColumns(Vec<String>),
}

/// Validated, immutable options for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub path: DiskPath,
    pub delimiter: Delimiter,
    pub encoding: &'static Encoding,
    pub has_header: bool,
    pub mapping: Mapping,
    pub create_if_missing: bool,
    pub write_header_on_create: bool,
}

impl Settings {
    /// Whether a header row is written when the file is created.
    pub fn header_on_create(&self) -> bool {
        self.create_if_missing && self.has_header && self.write_header_on_create
    }

    pub fn content_type(&self) -> String {
        format!("{}; charset={}", mime::TEXT_CSV, self.encoding.name())
    }
}

pub fn parse_columns(columns: &str) -> Vec<String> {
    columns
        .split(',')
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(str::to_owned)
        .collect()
}

impl AppendConfig {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(ConfigError::Read)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(ConfigError::ParseToml),
            _ => serde_yaml::from_str(&content).map_err(ConfigError::ParseYaml),
        }
    }

    pub fn compile(&self) -> Result<Settings, ConfigError> {
        let path = DiskPath::resolve(&self.file_path).ok_or(ConfigError::EmptyPath)?;
        let encoding = Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| ConfigError::UnknownEncoding(self.encoding.clone()))?;
        // UTF-16 and the replacement encoding only decode
        if encoding.output_encoding() != encoding {
            return Err(ConfigError::UnsupportedEncoding(encoding.name()));
        }
        let mapping = match self.mapping_mode {
            MappingMode::ByHeader => Mapping::ByHeader,
            MappingMode::ByColumns => {
                let columns = self
                    .columns
                    .as_deref()
                    .map(parse_columns)
                    .unwrap_or_default();
                if columns.is_empty() {
                    return Err(ConfigError::MissingColumns);
                }
                Mapping::ByColumns(columns)
            }
        };
        Ok(Settings {
            path,
            delimiter: self.delimiter,
            encoding,
            has_header: self.has_header,
            mapping,
            create_if_missing: self.create_if_missing,
            write_header_on_create: self.write_header_on_create,
        })
    }
}
