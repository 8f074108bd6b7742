//! Configuration for an h2yaml run. Loading and layering of the configuration sources lives in
//! the `h2yaml` crate's CLI module; this is only the deserialized result.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Path that stands for standard input.
pub const STDIN: &str = "-";

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Header to convert, or `-` to read standard input.
    pub input: PathBuf,

    /// Only declarations from headers whose basename matches this regex are emitted.
    pub filter_header: String,

    /// Assign `_arg<i>` names to anonymous function parameters.
    pub canonicalization: bool,

    /// Mimic the text conventions of the legacy cast-to-yaml tool.
    pub compat_cast_to_yaml: bool,

    /// The clang binary used to produce the AST.
    pub clang: String,

    /// Extra arguments passed to clang.
    pub clang_args: Vec<String>,

    /// Compiler whose system include directories are added to clang's include path. Falls back
    /// to the `CC` environment variable.
    pub cc: Option<String>,

    #[serde(flatten)]
    pub unknown: HashMap<String, Value>,
}

impl Config {
    /// Returns true if the input is standard input rather than a file.
    pub fn reads_stdin(&self) -> bool {
        self.input == Path::new(STDIN)
    }

    /// Returns a config with default settings, reading `input`. For use in tests.
    pub fn mock(input: impl Into<PathBuf>) -> Config {
        Config {
            input: input.into(),
            filter_header: ".*".into(),
            canonicalization: false,
            compat_cast_to_yaml: false,
            clang: "clang".into(),
            clang_args: vec![],
            cc: None,
            unknown: HashMap::new(),
        }
    }
}
