//! Configuration-file tier
//!
//! An installation can ship a flat `ember.toml` next to the executable:
//!
//! ```toml
//! home = "/opt/ember"
//! user_site = false
//! optimization_level = 1
//! ```
//!
//! The resolver only sees a flat key/text mapping; the file format is an
//! implementation detail of the provider.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{Error, Signal};

const ORIGIN: &str = "configuration file";

/// Flat key -> text mapping from an installation-layout file
pub type FileEntries = BTreeMap<String, String>;

/// Supplies the configuration-file tier
pub trait ConfigFileProvider: Send {
    /// Load the entries. A missing file is an empty mapping, not an error.
    fn load(&self) -> Signal<FileEntries>;
}

/// Provider for installations without a layout file
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLayoutFile;

impl ConfigFileProvider for NoLayoutFile {
    fn load(&self) -> Signal<FileEntries> {
        Ok(FileEntries::new())
    }
}

/// TOML-backed layout file
#[derive(Debug, Clone)]
pub struct LayoutFile {
    path: PathBuf,
}

impl LayoutFile {
    /// File name looked up beside the executable
    pub const FILE_NAME: &'static str = "ember.toml";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `ember.toml` in the directory holding `executable`
    pub fn beside(executable: &Path) -> Self {
        let dir = executable.parent().unwrap_or_else(|| Path::new("."));
        Self::new(dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse TOML content into flat entries.
    ///
    /// Strings, integers and booleans become text; tables and arrays are
    /// rejected because the tier is flat.
    pub fn parse(content: &str) -> Signal<FileEntries> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|err| Error::config(ORIGIN, format!("invalid layout file: {}", err.message())))?;

        let mut entries = FileEntries::new();
        for (key, value) in table {
            let text = match value {
                toml::Value::String(text) => text,
                toml::Value::Integer(n) => n.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Float(f) => f.to_string(),
                other => {
                    return Err(Error::config(
                        ORIGIN,
                        format!("key {:?} must be a scalar, found {}", key, other.type_str()),
                    )
                    .into());
                }
            };
            entries.insert(key, text);
        }
        Ok(entries)
    }
}

impl ConfigFileProvider for LayoutFile {
    fn load(&self) -> Signal<FileEntries> {
        if !self.path.is_file() {
            tracing::debug!(path = ?self.path, "No layout file found, skipping");
            return Ok(FileEntries::new());
        }
        tracing::debug!(path = ?self.path, "Loading layout file");
        let content = std::fs::read_to_string(&self.path).map_err(|err| {
            Error::config(ORIGIN, format!("cannot read {}: {}", self.path.display(), err))
        })?;
        Self::parse(&content)
    }
}
