use c_ast::{Node, SystemIncludes, file_location};
use clang_ast::SourceLocation;
use h2yaml_core::Error;
use regex::Regex;
use std::path::Path;

/// Decides which declarations belong to the headers the user asked about.
pub struct HeaderFilter {
    pattern: Regex,
    system: SystemIncludes,
}

impl HeaderFilter {
    /// `pattern` is searched for in the basename of each file, so `foo` accepts `libfoo.h`.
    pub fn new(pattern: &str, system: SystemIncludes) -> Result<HeaderFilter, Error> {
        Ok(HeaderFilter {
            pattern: Regex::new(pattern)?,
            system,
        })
    }

    /// Returns true for files that are neither system headers nor C standard library headers and
    /// whose basename matches the pattern.
    pub fn is_interesting_file(&self, file: &str) -> bool {
        if self.system.contains(file) {
            return false;
        }
        let basename = Path::new(file)
            .file_name()
            .map_or_else(|| file.into(), |name| name.to_string_lossy());
        if basename.starts_with("std") || basename.starts_with("__std") {
            return false;
        }
        self.pattern.is_match(&basename)
    }

    /// Locations without a file (builtins, command-line macros) are never interesting.
    pub fn is_interesting(&self, loc: Option<&SourceLocation>) -> bool {
        loc.and_then(file_location)
            .is_some_and(|loc| self.is_interesting_file(&loc.file))
    }

    /// Returns true for declarations the user wrote in an interesting header.
    pub fn accepts(&self, node: &Node) -> bool {
        !node.kind.is_implicit() && self.is_interesting(node.kind.loc())
    }
}
