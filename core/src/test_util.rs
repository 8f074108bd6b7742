//! Place to put utilities that are only used by tests.

use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Returns a new temporary directory. Unlike the defaults in the `tempdir` and `tempfile` crates,
/// this directory is not world-accessible by default.
#[cfg(not(miri))]
pub fn tempdir() -> std::io::Result<tempfile::TempDir> {
    use std::fs::Permissions;
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(Permissions::from_mode(0o700));
    }
    builder.tempdir()
}

/// Writes `contents` into a new file called `name` inside `dir` and returns its path.
#[cfg(not(miri))]
pub fn write_header(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::io::Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Returns true if a `clang` binary can be launched. Tests that need the real parser skip
/// themselves when this is false.
pub fn clang_available() -> bool {
    Command::new("clang")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
