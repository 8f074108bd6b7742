//! Utility functions for working with source locations and ranges.

use clang_ast::{BareSourceLocation, SourceLocation, SourceRange};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Returns the location in the file the user wrote: the expansion location for locations inside
/// macro expansions, the plain location otherwise.
pub fn file_location(loc: &SourceLocation) -> Option<&BareSourceLocation> {
    loc.expansion_loc.as_ref().or(loc.spelling_loc.as_ref())
}

/// Returns true if `loc` was produced by a macro expansion.
pub fn is_macro_location(loc: &SourceLocation) -> bool {
    match (&loc.spelling_loc, &loc.expansion_loc) {
        (Some(spelling), Some(expansion)) => {
            spelling.offset != expansion.offset || spelling.file != expansion.file
        }
        _ => false,
    }
}

/// Returns the file and byte offset of `loc`.
pub fn location_offset(loc: &SourceLocation) -> Option<(&Arc<str>, usize)> {
    file_location(loc).map(|l| (&l.file, l.offset))
}

/// Lazily loaded contents of the files clang read. Files that were not read from disk (standard
/// input) are preloaded.
#[derive(Default)]
pub struct SourceCache {
    files: HashMap<Arc<str>, Option<Arc<[u8]>>>,
}

impl SourceCache {
    /// Registers the contents of `file` so it is never read from disk.
    pub fn preload(&mut self, file: &str, contents: Arc<[u8]>) {
        self.files.insert(file.into(), Some(contents));
    }

    /// Returns the contents of `file`, or `None` if it cannot be read.
    pub fn bytes(&mut self, file: &Arc<str>) -> Option<Arc<[u8]>> {
        self.files
            .entry(file.clone())
            .or_insert_with(|| match std::fs::read(&**file) {
                Ok(contents) => Some(contents.into()),
                Err(e) => {
                    debug!("Cannot read {file}: {e}");
                    None
                }
            })
            .clone()
    }

    /// Reads the text covered by `range`, using the locations in the file the user wrote.
    ///
    /// The end location points at the start of the last token, so its token length is added to
    /// include it. Returns `None` if the range spans files, lies outside the file, or the file
    /// cannot be read.
    pub fn range_text(&mut self, range: &SourceRange) -> Option<String> {
        let begin = file_location(&range.begin)?;
        let end = file_location(&range.end)?;
        if begin.file != end.file {
            debug!(
                "SourceRange spans multiple files: {} and {}",
                begin.file, end.file
            );
            return None;
        }
        self.text(&begin.file, begin.offset, end.offset + end.tok_len)
    }

    /// Reads the bytes `start..end` of `file` as text.
    pub fn text(&mut self, file: &Arc<str>, start: usize, end: usize) -> Option<String> {
        let contents = self.bytes(file)?;
        if start > end || end > contents.len() {
            debug!(
                "Source range ({start}..{end}) exceeds file size ({}) of {file}",
                contents.len()
            );
            return None;
        }
        Some(String::from_utf8_lossy(&contents[start..end]).into_owned())
    }
}
