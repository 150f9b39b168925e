//! Pieces shared by every stage of `c-import`: the run configuration, the [Representation] trait
//! implemented by each stage's output, and test utilities.

pub mod config;
pub mod test_util;

use std::fmt::Display;
use std::path::Path;

/// A value produced by one stage of the import pipeline (the extracted declarations, the rendered
/// module, ...).
///
/// Representations are immutable once built. `materialize` writes the representation to disk,
/// either as the final output or as a diagnostic artifact.
pub trait Representation: Display + Send + Sync {
    /// This representation's name. Should be snake case, as this will be used to create file
    /// names in the diagnostics directory.
    fn name(&self) -> &'static str;

    /// Writes this representation to `path`.
    fn materialize(&self, path: &Path) -> std::io::Result<()>;
}
