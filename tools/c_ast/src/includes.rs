//! Discovery of the system include directories of a C compiler.
//!
//! The clang used for parsing may differ from the compiler the user builds with, and so may lack
//! headers the user expects to be found. Asking that compiler for its `#include <...>` search
//! list lets us add those directories to clang's include path, and tells the header filter which
//! files are system headers.

use h2yaml_core::Error;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tracing::debug;

const SEARCH_START: &str = "#include <...> search starts here:";
const SEARCH_END: &str = "End of search list.";

#[derive(Clone, Debug, Default)]
pub struct SystemIncludes {
    paths: Vec<PathBuf>,
}

impl SystemIncludes {
    pub fn new(paths: Vec<PathBuf>) -> SystemIncludes {
        SystemIncludes {
            paths: paths.iter().map(|p| normalize(p)).collect(),
        }
    }

    /// Runs `compiler -E -Wp,-v -xc /dev/null` and collects the `<...>` search list. `compiler`
    /// may carry arguments (`CC="ccache gcc -m32"`).
    pub fn probe(compiler: &str) -> Result<SystemIncludes, Error> {
        let mut words = compiler.split_whitespace();
        let program = words.next().unwrap_or(compiler);
        let output = Command::new(program)
            .args(words)
            .args(["-E", "-Wp,-v", "-xc", "/dev/null"])
            .output()
            .map_err(|source| Error::Launch {
                program: program.into(),
                source,
            })?;
        // The search list goes to stderr; stdout holds the (empty) preprocessed output.
        let text = String::from_utf8_lossy(&output.stderr);
        let includes = SystemIncludes::new(parse_search_list(&text));
        debug!("System include directories of {compiler}: {:?}", includes.paths);
        Ok(includes)
    }

    /// Adds the directories of `other` that are not already listed.
    pub fn merge(&mut self, other: &SystemIncludes) {
        for path in &other.paths {
            if !self.paths.contains(path) {
                self.paths.push(path.clone());
            }
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Returns true if `file` lives under one of the system include directories.
    pub fn contains(&self, file: &str) -> bool {
        let file = normalize(Path::new(file));
        self.paths.iter().any(|dir| file.starts_with(dir))
    }
}

/// Extracts the directories between the `#include <...>` marker and the end of the search list.
fn parse_search_list(text: &str) -> Vec<PathBuf> {
    let Some(start) = text.find(SEARCH_START) else {
        return vec![];
    };
    let list = &text[start + SEARCH_START.len()..];
    let list = list.find(SEARCH_END).map_or(list, |end| &list[..end]);
    list.lines()
        .map(|line| line.trim().trim_end_matches(" (framework directory)"))
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Lexically resolves `.` and `..` components; compilers print paths such as
/// `/usr/lib/gcc/x86_64-linux-gnu/12/../../../../include`.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
