//! Runs clang over a single header and captures its JSON AST dump.

use crate::{Clang, parse_ast};
use clang_ast::Node;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::{debug, info};

/// Failure to obtain a declaration tree from the C front end.
#[derive(Debug, Error)]
pub enum FrontEndError {
    #[error("failed to run {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("{} exited with {status} while parsing {}:\n{stderr}", program.display(), header.display())]
    Failed {
        program: PathBuf,
        header: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[error("could not parse the AST dump of {}: {source}", header.display())]
    Parse {
        header: PathBuf,
        source: serde_json::Error,
    },
}

/// The clang invocation used to dump a header's declaration tree: a syntax-only parse of a single
/// C translation unit with the JSON AST dumper enabled.
#[derive(Debug, Clone)]
pub struct FrontEnd {
    program: PathBuf,
    std: String,
    target: Option<String>,
    includes: Vec<PathBuf>,
    defines: Vec<String>,
}

impl FrontEnd {
    /// Creates a front end that runs `program` (normally `clang`) in C11 mode.
    pub fn new<P: Into<PathBuf>>(program: P) -> FrontEnd {
        FrontEnd {
            program: program.into(),
            std: "c11".into(),
            target: None,
            includes: vec![],
            defines: vec![],
        }
    }

    /// Sets the C language standard (the value of `-std=`).
    pub fn std<S: Into<String>>(mut self, std: S) -> FrontEnd {
        self.std = std.into();
        self
    }

    /// Sets the target triple.
    pub fn target(mut self, target: Option<String>) -> FrontEnd {
        self.target = target;
        self
    }

    /// Adds include directories, searched in order.
    pub fn includes<I: IntoIterator<Item = PathBuf>>(mut self, includes: I) -> FrontEnd {
        self.includes.extend(includes);
        self
    }

    /// Adds macro definitions, each `NAME` or `NAME=VALUE`.
    pub fn defines<I: IntoIterator<Item = String>>(mut self, defines: I) -> FrontEnd {
        self.defines.extend(defines);
        self
    }

    /// Builds the command that dumps `header`'s AST to stdout.
    pub fn command(&self, header: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-Xclang", "-ast-dump=json", "-fsyntax-only", "-x", "c"])
            .arg(format!("-std={}", self.std));
        if let Some(target) = &self.target {
            cmd.arg("--target").arg(target);
        }
        for include in &self.includes {
            cmd.arg("-I").arg(include);
        }
        for define in &self.defines {
            cmd.arg("-D").arg(define);
        }
        cmd.arg(header);
        cmd
    }

    /// Runs the front end over `header` and returns its declaration tree. Blocks until the
    /// process exits.
    pub fn parse(&self, header: &Path) -> Result<HeaderAst, FrontEndError> {
        let mut cmd = self.command(header);
        debug!("Running {cmd:?}");
        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|source| FrontEndError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(FrontEndError::Failed {
                program: self.program.clone(),
                header: header.into(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        let root = parse_ast(&output.stdout).map_err(|source| FrontEndError::Parse {
            header: header.into(),
            source,
        })?;
        info!(
            "Parsed {} ({} top-level nodes)",
            header.display(),
            root.inner.len()
        );
        Ok(HeaderAst {
            header: header.into(),
            root,
        })
    }
}

/// The declaration tree of one header.
#[derive(Debug)]
pub struct HeaderAst {
    /// The header as it was passed to the front end.
    pub header: PathBuf,
    /// The `TranslationUnitDecl` at the root of the tree.
    pub root: Node<Clang>,
}

impl std::fmt::Display for HeaderAst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C AST for {}", self.header.display())
    }
}
