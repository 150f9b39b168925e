//! Imports a C header as a foreign-binding module. This is normally used through the `c-import`
//! binary, but is exposed as a library crate as well.

pub mod cli;

use c_ast::{Clang, FrontEnd, FrontEndError, HeaderFilter};
use cimport_core::Representation;
use cimport_core::config::Config;
use clang_ast::Node;
use extract_decls::{Declarations, ExtractError, extract};
use render_module::{BindingModule, ModuleHeader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Everything that can stop an import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    FrontEnd(#[from] FrontEndError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("failed to parse config value {0:?}; no '=' found")]
    InvalidOverride(String),
    #[error("no header given")]
    MissingHeader,
    #[error("failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The result of importing one declaration tree.
#[derive(Debug)]
pub struct Import {
    pub declarations: Declarations,
    pub module: BindingModule,
}

/// Extracts the declarations of `header` from `root` and renders them. Pure: the same tree and
/// module header always give the same module.
pub fn import_ast(
    root: &Node<Clang>,
    header: &Path,
    module: &ModuleHeader,
) -> Result<Import, ExtractError> {
    let declarations = extract(&HeaderFilter::new(header), root)?;
    let module = BindingModule::render(module, &declarations);
    Ok(Import {
        declarations,
        module,
    })
}

/// Runs a complete import as configured: parses the header, extracts and renders its
/// declarations, then writes the module to `config.output`. Nothing is written unless every
/// earlier step succeeded.
pub fn run(config: &Config) -> Result<BindingModule, ImportError> {
    if config.header.as_os_str().is_empty() {
        return Err(ImportError::MissingHeader);
    }
    let ast = FrontEnd::new(&config.clang)
        .std(&config.std)
        .target(config.target.clone())
        .includes(config.includes.iter().cloned())
        .defines(config.defines.iter().cloned())
        .parse(&config.header)?;

    debug!("Extracting declarations from the {ast}");
    let name = config.module_name();
    let module_header = ModuleHeader {
        name: &name,
        links: &config.links,
        source: config.banner.then_some(config.header.as_path()),
    };
    let Import {
        declarations,
        module,
    } = import_ast(&ast.root, &config.header, &module_header)?;

    if let Some(dir) = &config.diagnostics {
        let path = dir.join(format!("{}.json", declarations.name()));
        debug!("Writing {declarations} to {}", path.display());
        std::fs::create_dir_all(dir)
            .and_then(|()| declarations.materialize(&path))
            .map_err(|source| ImportError::Output { path, source })?;
    }

    module
        .materialize(&config.output)
        .map_err(|source| ImportError::Output {
            path: config.output.clone(),
            source,
        })?;
    info!("Wrote {} (module {})", config.output.display(), module.name);
    Ok(module)
}
