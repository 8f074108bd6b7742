//! The command-line arguments and configuration system for the `h2yaml` binary.

use clap::Parser;
use config::FileFormat::Toml;
use directories::ProjectDirs;
use h2yaml_core::Error;
use h2yaml_core::config::Config;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

const CLANG_ARG: &str = "-Wc,";

/// Convert the declarations of a C header to YAML.
///
/// Mapping keys keep their declaration order, with `kind` first in every type; they are not
/// sorted alphabetically.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// Header to process, or '-' for standard input.
    pub input: Option<PathBuf>,

    /// Only emit declarations from headers whose basename matches this regex.
    #[arg(long, value_name = "REGEX")]
    pub filter_header: Option<String>,

    /// Name anonymous function parameters `_arg<i>`.
    #[arg(long, short)]
    pub canonicalization: bool,

    /// Mimic cast-to-yaml output.
    #[arg(long)]
    pub compat_cast_to_yaml: bool,

    /// Set a configuration value; format $NAME=$VALUE.
    #[arg(long, short = 'C')]
    pub config: Vec<String>,

    /// Prints out the location of the config file.
    #[arg(long)]
    pub print_config_path: bool,

    /// Log the walk over the AST.
    #[arg(long, short)]
    pub verbose: bool,

    /// Arguments for clang, given as `-Wc,<arg>` or between `-Wc,--startgroup` and
    /// `-Wc,--endgroup`. Filled in by [split_clang_args].
    #[arg(skip)]
    pub clang_args: Vec<String>,
}

impl Args {
    /// Parses the process arguments, after taking the clang arguments out of them.
    pub fn from_env() -> Args {
        Args::parse_with_clang_args(std::env::args())
    }

    pub fn parse_with_clang_args(argv: impl IntoIterator<Item = String>) -> Args {
        let (argv, clang_args) = split_clang_args(argv);
        let mut args = Args::parse_from(argv);
        args.clang_args = clang_args;
        args
    }
}

/// Separates the arguments meant for clang from ours. `-Wc,<arg>` passes `<arg>` to clang, and
/// every argument between `-Wc,--startgroup` and `-Wc,--endgroup` goes to clang unchanged.
pub fn split_clang_args(argv: impl IntoIterator<Item = String>) -> (Vec<String>, Vec<String>) {
    let mut ours = vec![];
    let mut clang = vec![];
    let mut in_group = false;
    for arg in argv {
        match arg.split_once(CLANG_ARG) {
            None if in_group => clang.push(arg),
            None => ours.push(arg),
            Some((_, "--startgroup")) => in_group = true,
            Some((_, "--endgroup")) => in_group = false,
            Some((_, rest)) => clang.extend(rest.split(CLANG_ARG).map(String::from)),
        }
    }
    (ours, clang)
}

/// Prints out a warning message for every field in `unknown`.
pub(crate) fn unknown_field_warning(prefix: &str, unknown: &HashMap<String, Value>) {
    let mut entries: Vec<_> = unknown.keys().collect();
    entries.sort_unstable();
    entries.into_iter().for_each(|name| match prefix {
        "" => warn!("Unknown config key {name}"),
        p => warn!("Unknown config key {p}.{name}"),
    });
}

/// Performs parsing and validation of the config; to be called by main() before running the
/// conversion.
///
/// Returns the config, or None if a command line flag that calls for an early exit (such as
/// --print-config-path) was provided.
pub fn initialize(args: &Args) -> Result<Option<Config>, Error> {
    let Some(dirs) = ProjectDirs::from("", "", "h2yaml") else {
        return Err(config::ConfigError::Message("no home directory".into()).into());
    };
    if args.print_config_path {
        println!("Config file location: {:?}", config_file(dirs.config_dir()));
        return Ok(None);
    }
    let config = load_config(args, dirs.config_dir())?;
    unknown_field_warning("", &config.unknown);
    Ok(Some(config))
}

fn load_config(args: &Args, config_dir: &Path) -> Result<Config, Error> {
    let mut settings = config::Config::builder()
        .add_source(config::File::from_str(
            include_str!("../default_config.toml"),
            Toml,
        ))
        .add_source(config::File::from(config_file(config_dir)).required(false))
        .add_source(config::File::from(PathBuf::from("h2yaml.toml")).required(false));
    for config_arg in &args.config {
        let Some((name, value)) = config_arg.split_once('=') else {
            return Err(config::ConfigError::Message(format!(
                "failed to parse config value {config_arg:?}; no '=' found"
            ))
            .into());
        };
        settings = settings.set_override(name, value)?;
    }
    if let Some(pattern) = &args.filter_header {
        settings = settings.set_override("filter_header", pattern.as_str())?;
    }
    if args.canonicalization {
        settings = settings.set_override("canonicalization", true)?;
    }
    if args.compat_cast_to_yaml {
        settings = settings.set_override("compat_cast_to_yaml", true)?;
    }

    // The config crate does not take a Path as an override, so the input is patched in after
    // deserialization.
    let mut config: Config = settings.build()?.try_deserialize()?;
    if let Some(input) = &args.input {
        config.input = input.clone();
    }
    config.clang_args.extend(args.clang_args.iter().cloned());
    Ok(config)
}

/// Returns the config file path, given the config directory.
fn config_file(config_dir: &Path) -> PathBuf {
    [config_dir, "h2yaml.toml".as_ref()].iter().collect()
}
