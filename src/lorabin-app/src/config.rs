// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support.
//!
//! Settings live in the `[lorabin]` section of `lorabin.toml`, searched for
//! in the current directory, then the XDG config directory, then `/etc`.
//! CLI arguments override config file values.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use lorabin_core::{DecodeError, FlagWidth, ParseOptions, UnknownTypePolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),
}

/// Returns the default search paths for `lorabin.toml`
/// (current directory → XDG config → /etc).
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("lorabin.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("lorabin").join("lorabin.toml"));
    }
    paths.push(PathBuf::from("/etc/lorabin/lorabin.toml"));
    paths
}

/// Extract and deserialize a named section from a TOML file.
///
/// Returns `Ok(Some(cfg))` when the section is present and parses cleanly,
/// `Ok(None)` when the section is absent, or `Err` on I/O / parse failure.
fn load_section_from_file<T: DeserializeOwned>(
    path: &Path,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

    let table: toml::Table = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;

    let Some(section) = table.get(key) else {
        return Ok(None);
    };

    // Re-serialize the section then parse as T so all serde defaults apply.
    let section_toml = toml::to_string(section)
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
    let cfg = toml::from_str::<T>(&section_toml)
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
    Ok(Some(cfg))
}

/// Trait for loading configuration from a `lorabin.toml` section.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    /// Section key in `lorabin.toml`.
    fn section_key() -> &'static str;

    /// Load the section from a specific file path.
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// does not contain the expected `[<section_key>]` header.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        load_section_from_file::<Self>(path, Self::section_key())?.ok_or_else(|| {
            ConfigError::ParseError(
                path.to_path_buf(),
                format!("missing [{}] section", Self::section_key()),
            )
        })
    }

    /// Search default paths and load the first file that contains the
    /// expected section.
    ///
    /// Returns `(config, path_where_found)` or `(Default::default(), None)`
    /// when no config file is found.
    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        Self::load_from_search_paths(&config_search_paths())
    }

    /// Load the first of `paths` that exists and contains the section.
    fn load_from_search_paths(
        paths: &[PathBuf],
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in paths {
            if path.exists() {
                if let Some(cfg) = load_section_from_file::<Self>(path, Self::section_key())? {
                    return Ok((cfg, Some(path.clone())));
                }
            }
        }
        Ok((Self::default(), None))
    }
}

/// Top-level `[lorabin]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LorabinConfig {
    pub general: GeneralConfig,
    pub decode: DecodeConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

/// Template decoding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Width of the trailing boolean flag region: 0, 1, 2, 4 or 8
    pub flag_bytes: u64,
    /// Handling of unrecognized type markers: "lenient" or "strict"
    pub unknown_types: UnknownTypePolicy,
    /// JSON field template used when none is given on the command line
    pub template: Option<String>,
}

impl DecodeConfig {
    pub fn parse_options(&self) -> Result<ParseOptions, DecodeError> {
        Ok(ParseOptions {
            flag_width: FlagWidth::try_from(self.flag_bytes)?,
            unknown_types: self.unknown_types,
        })
    }
}

impl ConfigFile for LorabinConfig {
    fn section_key() -> &'static str {
        "lorabin"
    }
}

impl LorabinConfig {
    /// Generate an example configuration as a TOML string.
    pub fn example_toml() -> String {
        let example = LorabinConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            decode: DecodeConfig {
                flag_bytes: 1,
                unknown_types: UnknownTypePolicy::Lenient,
                template: Some(r#"{"id":14,"temp":14.1,"flag":true}"#.to_string()),
            },
        };
        let mut root = toml::Table::new();
        match toml::Value::try_from(&example) {
            Ok(section) => {
                root.insert(Self::section_key().to_string(), section);
            }
            Err(_) => return String::new(),
        }
        toml::to_string_pretty(&root).unwrap_or_default()
    }
}
