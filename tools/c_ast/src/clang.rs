//! Running clang and collecting its AST and diagnostics.

use crate::Node;
use h2yaml_core::Error;
use std::fmt;
use std::io::{Read as _, Write as _};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, info};

/// File name clang reports for code read from standard input.
pub const STDIN_NAME: &str = "<stdin>";

/// The header to parse.
pub enum Input {
    File(PathBuf),
    /// Contents of standard input, read up front so they can be handed to clang and read back
    /// by the mapper.
    Stdin(Arc<[u8]>),
}

impl Input {
    /// Reads all of standard input.
    pub fn stdin() -> std::io::Result<Input> {
        let mut contents = vec![];
        std::io::stdin().read_to_end(&mut contents)?;
        Ok(Input::Stdin(contents.into()))
    }

    /// The name clang uses for this input in locations and diagnostics.
    pub fn name(&self) -> String {
        match self {
            Input::File(path) => path.display().to_string(),
            Input::Stdin(_) => STDIN_NAME.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
    /// A line clang printed that does not carry a severity.
    Unknown,
}

/// One diagnostic line printed by clang.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub text: String,
}

impl Diagnostic {
    /// Classifies a line of clang's stderr. Returns `None` for the trailing
    /// "N warnings generated." summary and for blank lines.
    pub fn parse(line: &str) -> Option<Diagnostic> {
        let line = line.trim_end();
        if line.trim().is_empty() || line.ends_with(" generated.") {
            return None;
        }
        const MARKERS: [(&str, Severity); 5] = [
            ("fatal error: ", Severity::Fatal),
            ("error: ", Severity::Error),
            ("warning: ", Severity::Warning),
            ("note: ", Severity::Note),
            ("remark: ", Severity::Note),
        ];
        // The severity is the first marker that starts the line or follows the "file:line:col: "
        // prefix; messages may themselves contain marker text later on.
        let severity = MARKERS
            .iter()
            .filter_map(|(marker, severity)| {
                line.match_indices(marker)
                    .find(|(at, _)| *at == 0 || line[..*at].ends_with(": "))
                    .map(|(at, _)| (at, *severity))
            })
            .min_by_key(|(at, severity)| (*at, *severity != Severity::Fatal))
            .map_or(Severity::Unknown, |(_, severity)| severity);
        Some(Diagnostic {
            severity,
            text: line.to_string(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Fatal)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Runs clang with `-ast-dump=json` and deserializes the translation unit.
pub struct ClangParser {
    program: String,
    args: Vec<String>,
}

impl ClangParser {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> ClangParser {
        ClangParser {
            program: program.into(),
            args,
        }
    }

    /// Parses `input`. Every diagnostic clang prints is echoed on stderr as
    /// `clang diagnostic: ...`; if any of them is an error the AST is discarded and
    /// [Error::Diagnostics] is returned.
    pub fn parse(&self, input: &Input) -> Result<Node, Error> {
        let mut clang_cmd = Command::new(&self.program);
        let clang_cmd = clang_cmd
            .args(["-Xclang", "-ast-dump=json", "-fsyntax-only"])
            .args(["-fno-color-diagnostics", "-fno-caret-diagnostics"])
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        match input {
            Input::File(path) => clang_cmd.arg(path).stdin(Stdio::null()),
            Input::Stdin(_) => clang_cmd.args(["-x", "c", "-"]).stdin(Stdio::piped()),
        };
        debug!("Running {clang_cmd:?}");
        let mut clang = clang_cmd.spawn().map_err(|source| Error::Launch {
            program: self.program.clone(),
            source,
        })?;
        if let (Input::Stdin(contents), Some(mut stdin)) = (input, clang.stdin.take()) {
            // clang reads its whole input before it prints anything, so this cannot block on a
            // full stdout pipe.
            stdin.write_all(contents)?;
        }
        let output = clang.wait_with_output()?;

        let diagnostics: Vec<Diagnostic> = String::from_utf8_lossy(&output.stderr)
            .lines()
            .filter_map(Diagnostic::parse)
            .collect();
        for diagnostic in &diagnostics {
            eprintln!("clang diagnostic: {diagnostic}");
        }
        let count = diagnostics.iter().filter(|d| d.is_error()).count();
        if count > 0 {
            return Err(Error::Diagnostics {
                input: input.name(),
                count,
            });
        }
        if !output.status.success() {
            return Err(Error::ClangFailed {
                status: output.status,
            });
        }

        let ast: Node = serde_json::from_slice(&output.stdout)?;
        info!(
            "Parsed {} ({} top-level declarations)",
            input.name(),
            ast.inner.len()
        );
        Ok(ast)
    }
}
