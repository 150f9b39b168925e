//! The command-line arguments and configuration system for [crate::run] and the `c-import` binary.

use crate::ImportError;
use cimport_core::config::{Config, unknown_field_warning};
use clap::Parser;
use config::FileFormat::Toml;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Command-line arguments for the `c-import` binary.
#[derive(Debug, Parser)]
#[command(name = "c-import", about = "Generates a foreign-binding module from a C header")]
pub struct Args {
    /// Set a configuration value; format $NAME=$VALUE.
    #[arg(long, short)]
    pub config: Vec<String>,

    /// Additional include directory passed to clang. May be repeated.
    #[arg(short = 'I', long = "include")]
    pub includes: Vec<PathBuf>,

    /// Macro definition passed to clang, NAME or NAME=VALUE. May be repeated.
    #[arg(short = 'D', long = "define")]
    pub defines: Vec<String>,

    /// Native library the module links against. May be repeated.
    #[arg(short = 'l', long = "link")]
    pub links: Vec<String>,

    /// Path to the C header to import.
    // Should always be present unless using a flag like --print-config-path
    pub header: Option<PathBuf>,

    /// Name of the generated module. Defaults to the header's file name.
    #[arg(long)]
    pub module: Option<String>,

    /// Path of the binding module to write.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Prints out the location of the config file.
    #[arg(long)]
    pub print_config_path: bool,

    /// Target triple passed to clang.
    #[arg(long)]
    pub target: Option<String>,

    /// Log debug messages.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Performs parsing and validation of the config; to be called by main() before doing any work.
///
/// Returns the config, or None if a command line flag that calls for an early exit (such as
/// --print-config-path) was provided.
pub fn initialize(args: &Args) -> Result<Option<Config>, ImportError> {
    let dirs = ProjectDirs::from("", "", "c-import");
    if args.print_config_path {
        match &dirs {
            Some(dirs) => println!("Config file location: {:?}", config_file(dirs.config_dir())),
            None => println!("No config file location: home directory not found"),
        }
        return Ok(None);
    }
    let config = load_config(args, dirs.as_ref().map(|d| d.config_dir()))?;
    unknown_field_warning("", &config.unknown);
    Ok(Some(config))
}

/// Layers the configuration sources, lowest priority first: the built-in defaults, the user's
/// config file, `./c-import.toml`, `--config` values, then the dedicated flags.
pub fn load_config(args: &Args, config_dir: Option<&Path>) -> Result<Config, ImportError> {
    let mut settings = config::Config::builder().add_source(config::File::from_str(
        include_str!("../default_config.toml"),
        Toml,
    ));
    if let Some(config_dir) = config_dir {
        settings = settings.add_source(config::File::from(config_file(config_dir)).required(false));
    }
    settings = settings
        .add_source(config::File::from(PathBuf::from("c-import.toml")).required(false));
    for config_arg in &args.config {
        let Some((name, value)) = config_arg.split_once('=') else {
            return Err(ImportError::InvalidOverride(config_arg.clone()));
        };
        settings = settings.set_override(name, value)?;
    }

    // The config crate cannot hold a Path in an override, and a round trip through a string can
    // be lossy. A placeholder keeps deserialization from failing and is replaced afterwards.
    if args.header.is_some() {
        settings = settings.set_override("header", " ")?;
    }
    if args.output.is_some() {
        settings = settings.set_override("output", " ")?;
    }

    let mut config: Config = settings.build()?.try_deserialize()?;
    if let Some(header) = &args.header {
        config.header = header.clone();
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    config.includes.extend(args.includes.iter().cloned());
    config.defines.extend(args.defines.iter().cloned());
    config.links.extend(args.links.iter().cloned());
    if args.target.is_some() {
        config.target = args.target.clone();
    }
    if args.module.is_some() {
        config.module = args.module.clone();
    }
    Ok(config)
}

/// Returns the config file path, given the config directory.
fn config_file(config_dir: &Path) -> PathBuf {
    [config_dir, "c-import.toml".as_ref()].iter().collect()
}

#[cfg(test)]
mod tests {
    #[cfg(not(miri))]
    #[test]
    fn load_config_test() {
        use super::*;
        use cimport_core::test_util::tempdir;
        use std::{fs, io::Write as _};
        let config_dir = tempdir().unwrap();
        let load = |args: &[&str]| {
            let args = std::iter::once("c-import").chain(args.iter().copied());
            load_config(&Args::parse_from(args), Some(config_dir.path())).unwrap()
        };

        let config = load(&["a.h", "--output=/tmp/out.astra"]);
        assert_eq!(config.header, AsRef::<Path>::as_ref("a.h"));
        assert_eq!(config.clang, AsRef::<Path>::as_ref("clang"));
        assert_eq!(config.std, "c11");
        assert!(config.banner);
        assert_eq!(config.module_name(), "a");

        fs::File::create(config_file(config_dir.path()))
            .unwrap()
            .write_all(
                br#"
                    header = "b.h"
                    output = "b.astra"
                    links = ["m"]
                    includes = ["/opt/include"]
                    std = "c99"
                    banner = false
                    colour = "blue"
                "#,
            )
            .unwrap();
        let config = load(&[]);
        assert_eq!(config.header, AsRef::<Path>::as_ref("b.h"));
        assert_eq!(config.output, AsRef::<Path>::as_ref("b.astra"));
        assert_eq!(config.std, "c99");
        assert!(!config.banner);
        assert!(config.unknown.contains_key("colour"));
        // Verify the --config flag overrides the user's config file.
        assert_eq!(
            load(&["--config", "header=c.h"]).header,
            AsRef::<Path>::as_ref("c.h")
        );
        // Verify the positional header overrides all the configuration options.
        assert_eq!(
            load(&["--config", "header=c.h", "d.h"]).header,
            AsRef::<Path>::as_ref("d.h")
        );
        // Repeated flags append to the configured lists, in order.
        let config = load(&["-l", "simple_math", "-I", "inc", "-D", "FOO=1", "-D", "BAR"]);
        assert_eq!(config.links, ["m", "simple_math"]);
        assert_eq!(
            config.includes,
            [PathBuf::from("/opt/include"), PathBuf::from("inc")]
        );
        assert_eq!(config.defines, ["FOO=1", "BAR"]);
        let config = load(&["--module", "math", "--target", "x86_64-unknown-linux-gnu"]);
        assert_eq!(config.module_name(), "math");
        assert_eq!(config.target.as_deref(), Some("x86_64-unknown-linux-gnu"));

        assert!(matches!(
            load_config(
                &Args::parse_from(["c-import", "--config", "banner"]),
                Some(config_dir.path())
            ),
            Err(ImportError::InvalidOverride(_))
        ));
    }
}
