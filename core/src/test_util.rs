//! Place to put utilities that are only used by tests.

use std::io;
use std::path::{Path, PathBuf};

/// Returns a new temporary directory. Unlike the defaults in the `tempdir` and `tempfile` crates,
/// this directory is not world-accessible by default.
#[cfg(not(miri))]
pub fn tempdir() -> io::Result<tempfile::TempDir> {
    #[cfg(unix)]
    use std::fs::Permissions;
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(Permissions::from_mode(0o700));
    }
    builder.tempdir()
}

/// Writes an executable script into `dir` that ignores its arguments and prints `ast_json`, the
/// way `clang -Xclang -ast-dump=json` would. Returns the script's path, suitable for use as the
/// configured `clang`.
///
/// If `exit_code` is nonzero the script prints `ast_json` to stderr instead and exits with it.
#[cfg(unix)]
pub fn fake_front_end(dir: &Path, ast_json: &str, exit_code: i32) -> io::Result<PathBuf> {
    use std::fs::Permissions;
    use std::io::Write as _;
    use std::os::unix::fs::PermissionsExt;

    let dump = dir.join("ast.json");
    std::fs::write(&dump, ast_json)?;
    let script = dir.join("fake-clang");
    let body = match exit_code {
        0 => format!("#!/bin/sh\nexec cat '{}'\n", dump.display()),
        code => format!("#!/bin/sh\ncat '{}' >&2\nexit {code}\n", dump.display()),
    };
    {
        let mut file = std::fs::File::create(&script)?;
        file.write_all(body.as_bytes())?;
        file.sync_all()?;
    }
    std::fs::set_permissions(&script, Permissions::from_mode(0o700))?;
    Ok(script)
}
