//! Configuration for a single `c-import` run.
//!
//! The values are layered by the `c-import` binary (built-in defaults, user config file, local
//! config file, `--config` overrides, then dedicated flags); this module only defines the shape.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// The C header to import.
    pub header: PathBuf,

    /// Path of the binding module to write.
    pub output: PathBuf,

    /// Name of the generated module. Derived from the header's file name when absent.
    pub module: Option<String>,

    /// Native libraries the module links against, in order.
    #[serde(default)]
    pub links: Vec<String>,

    /// Additional include directories passed to the C front end.
    #[serde(default)]
    pub includes: Vec<PathBuf>,

    /// Macro definitions (`NAME` or `NAME=VALUE`) passed to the C front end.
    #[serde(default)]
    pub defines: Vec<String>,

    /// Target triple passed to the C front end.
    pub target: Option<String>,

    /// The clang executable used as the C front end.
    pub clang: PathBuf,

    /// C language standard the header is parsed as.
    pub std: String,

    /// Whether to emit the "auto-generated" comment lines at the top of the module.
    pub banner: bool,

    /// Directory to write intermediate representations into, for debugging.
    pub diagnostics: Option<PathBuf>,

    #[serde(flatten)]
    pub unknown: HashMap<String, Value>,
}

impl Config {
    /// Returns the module name: the configured one, or the header's file stem with `-` replaced
    /// by `_`.
    pub fn module_name(&self) -> String {
        if let Some(module) = &self.module {
            return module.clone();
        }
        module_name_for(&self.header)
    }

    /// Returns a config for `header` with every other value at its default, for tests.
    pub fn mock(header: &Path, output: &Path) -> Config {
        Config {
            header: header.into(),
            output: output.into(),
            module: None,
            links: vec![],
            includes: vec![],
            defines: vec![],
            target: None,
            clang: "clang".into(),
            std: "c11".into(),
            banner: true,
            diagnostics: None,
            unknown: HashMap::new(),
        }
    }
}

/// Derives a module name from a header path.
pub fn module_name_for(header: &Path) -> String {
    header
        .file_stem()
        .map(|stem| stem.to_string_lossy().replace('-', "_"))
        .unwrap_or_else(|| "module".into())
}

/// Prints out a warning message for every field in `unknown`.
///
/// `prefix` should be the path to this entry (e.g. a nested `front_end` table should call this
/// with a `prefix` of `front_end`).
pub fn unknown_field_warning(prefix: &str, unknown: &HashMap<String, Value>) {
    let mut entries: Vec<_> = unknown.keys().collect();
    entries.sort_unstable();
    entries.into_iter().for_each(|name| match prefix {
        "" => warn!("unknown config key {name}"),
        p => warn!("unknown config key {p}.{name}"),
    });
}
