//! h2yaml converts the declarations of a C header to YAML: structs, unions, typedefs, global
//! variables, function prototypes and enums, with every type spelled out as a tree.
//!
//! clang does the parsing. [h2yaml] runs it on the configured input, maps its AST with
//! [tree_mapper] and serializes the resulting declaration table.

pub mod cli;

use c_ast::{ClangParser, Input, STDIN_NAME, SourceCache, SystemIncludes};
use h2yaml_core::Error;
use h2yaml_core::config::Config;
use tracing::{info, warn};
use tree_mapper::{Declarations, HeaderFilter, MapOptions, map_translation_unit};

/// Parses the header `config` names and returns its declarations as a YAML document.
pub fn h2yaml(config: &Config) -> Result<String, Error> {
    let declarations = declarations(config)?;
    Ok(serde_yaml::to_string(&declarations)?)
}

/// Parses the header `config` names and maps its declarations.
pub fn declarations(config: &Config) -> Result<Declarations, Error> {
    let input = if config.reads_stdin() {
        Input::stdin()?
    } else {
        Input::File(config.input.clone())
    };

    let mut clang_args = config.clang_args.clone();
    let system = system_includes(config, &mut clang_args)?;
    let tu = ClangParser::new(config.clang.as_str(), clang_args).parse(&input)?;

    let filter = HeaderFilter::new(&config.filter_header, system)?;
    let mut sources = SourceCache::default();
    if let Input::Stdin(contents) = &input {
        sources.preload(STDIN_NAME, contents.clone());
    }
    let options = MapOptions {
        canonicalization: config.canonicalization,
        compat_cast_to_yaml: config.compat_cast_to_yaml,
    };
    let declarations = map_translation_unit(&tu, &filter, &mut sources, options);
    if declarations.is_empty() {
        warn!(
            "No declarations of {} pass the header filter `{}`",
            input.name(),
            config.filter_header
        );
    }
    info!("Converted {}", input.name());
    Ok(declarations)
}

/// The directories whose headers count as system headers: clang's own search list, which holds
/// its resource directory, plus the list of the compiler from [compiler]. That compiler's
/// directories are also added to `clang_args`.
fn system_includes(config: &Config, clang_args: &mut Vec<String>) -> Result<SystemIncludes, Error> {
    let mut system = SystemIncludes::probe(&config.clang)?;
    if let Some(cc) = compiler(config) {
        let includes = SystemIncludes::probe(&cc)?;
        clang_args.extend(includes.paths().iter().map(|p| format!("-I{}", p.display())));
        system.merge(&includes);
    }
    Ok(system)
}

/// The compiler whose system headers clang should also see: the `cc` setting, else `$CC`.
fn compiler(config: &Config) -> Option<String> {
    config
        .cc
        .clone()
        .or_else(|| std::env::var("CC").ok())
        .filter(|cc| !cc.trim().is_empty())
}
