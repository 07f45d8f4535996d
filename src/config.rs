// Global configuration for the weak rate libraries
use crate::error::{RateError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Environment variable naming the root directory of the vendor table sets
pub const DATA_DIR_ENV: &str = "WEAK_RATES_DATA_DIR";

/// Library keywords that can be resolved to a directory of tables
pub const ACCEPTABLE_KEYWORDS: &[&str] = &["suzuki", "langanke"];

// Global configuration for rate table directories
pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::from_env()));

/// Global configuration container for the rate table libraries.
///
/// The configuration maps library keywords (`"suzuki"`, `"langanke"`) to the
/// directory holding that vendor's table files. A keyword without an explicit
/// directory falls back to `<data_dir>/<keyword>` when a data root is set.
///
/// A single global instance is exposed via the `CONFIG` static (a
/// `Lazy<Mutex<Config>>`), whose data root is seeded from the
/// `WEAK_RATES_DATA_DIR` environment variable. Most code should obtain a
/// guard with [`Config::global`] rather than accessing the mutex directly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Map of library keyword -> directory of table files.
    pub library_paths: HashMap<String, String>,
    /// Optional root holding one sub-directory per library keyword
    pub data_dir: Option<String>,
}

fn check_keyword(keyword: &str) -> Result<String> {
    let keyword = keyword.trim().to_ascii_lowercase();
    if !ACCEPTABLE_KEYWORDS.contains(&keyword.as_str()) {
        return Err(RateError::Config(format!(
            "Invalid library keyword: '{}'. Acceptable keywords are: {}",
            keyword,
            ACCEPTABLE_KEYWORDS.join(", ")
        )));
    }
    Ok(keyword)
}

impl Config {
    /// Create an empty configuration
    pub fn new() -> Self {
        Config {
            library_paths: HashMap::new(),
            data_dir: None,
        }
    }

    /// Create a configuration whose data root comes from `WEAK_RATES_DATA_DIR`
    pub fn from_env() -> Self {
        Config {
            library_paths: HashMap::new(),
            data_dir: std::env::var(DATA_DIR_ENV).ok().filter(|d| !d.is_empty()),
        }
    }

    /// Set the table directory for one library keyword
    pub fn set_library_path(&mut self, keyword: &str, path: impl Into<String>) -> Result<()> {
        let keyword = check_keyword(keyword)?;
        self.library_paths.insert(keyword, path.into());
        Ok(())
    }

    /// Set the root directory holding one sub-directory per library
    pub fn set_data_dir(&mut self, dir: impl Into<String>) {
        self.data_dir = Some(dir.into());
    }

    /// Directory for a library keyword, falling back to `<data_dir>/<keyword>`
    pub fn get_library_path(&self, keyword: &str) -> Option<PathBuf> {
        let keyword = keyword.trim().to_ascii_lowercase();
        if let Some(path) = self.library_paths.get(&keyword) {
            return Some(PathBuf::from(path));
        }
        if !ACCEPTABLE_KEYWORDS.contains(&keyword.as_str()) {
            return None;
        }
        self.data_dir
            .as_ref()
            .map(|dir| PathBuf::from(dir).join(&keyword))
    }

    /// Set several library directories at once, or a data root
    pub fn set_library_paths<T>(&mut self, input: T) -> Result<()>
    where
        T: IntoLibraryPaths,
    {
        input.apply(self)
    }

    /// Clear all library mappings and the data root
    pub fn clear(&mut self) {
        self.library_paths.clear();
        self.data_dir = None;
    }
}

/// Trait to allow flexible input types for set_library_paths
pub trait IntoLibraryPaths {
    fn apply(self, config: &mut Config) -> Result<()>;
}

impl IntoLibraryPaths for HashMap<String, String> {
    fn apply(self, config: &mut Config) -> Result<()> {
        // Validate everything before touching the configuration
        let checked = self
            .into_iter()
            .map(|(keyword, path)| -> Result<(String, String)> {
                Ok((check_keyword(&keyword)?, path))
            })
            .collect::<Result<Vec<_>>>()?;
        config.library_paths.extend(checked);
        Ok(())
    }
}

/// A bare string sets the data root
impl IntoLibraryPaths for &str {
    fn apply(self, config: &mut Config) -> Result<()> {
        config.set_data_dir(self);
        Ok(())
    }
}

impl IntoLibraryPaths for String {
    fn apply(self, config: &mut Config) -> Result<()> {
        IntoLibraryPaths::apply(self.as_str(), config)
    }
}

impl Config {
    /// Get the global configuration instance
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
