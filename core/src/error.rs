use std::io;
use thiserror::Error;

/// Failures reported to the user. Unhandled AST constructs are not represented here: those are
/// defects in the mapper and panic instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to run `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// clang printed at least one error diagnostic. The diagnostics themselves have already been
    /// printed by the time this is returned.
    #[error("clang reported {count} error(s) while parsing {input}")]
    Diagnostics { input: String, count: usize },

    #[error("clang exited with {status} without reporting an error")]
    ClangFailed { status: std::process::ExitStatus },

    #[error("invalid AST JSON from clang: {0}")]
    AstJson(#[from] serde_json::Error),

    #[error("invalid header filter: {0}")]
    HeaderFilter(#[from] regex::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to serialize declarations: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
