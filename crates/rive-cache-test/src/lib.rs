//! Helpers for testing the Rive file cache.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all console output
//!    is captured by the test runner.
//!
//!  - When using [`tempdir`], make sure that the handle to the temp directory is held for the
//!    entire lifetime of the test, otherwise the files written into it are gone before the
//!    cache gets to read them. Assign it to a variable in the test function
//!    (e.g. `let dir = test::tempdir()`).

use std::fs;
use std::path::{Path, PathBuf};

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::fmt;

pub use tempfile::TempDir;

/// Setup the test environment.
///
///  - Initializes logs: The logger only captures logs from the `rive_cache` crate and mutes all
///    other logs.
pub fn setup() {
    fmt()
        .with_env_filter(EnvFilter::new("rive_cache=trace"))
        .with_target(false)
        .pretty()
        .with_test_writer()
        .try_init()
        .ok();
}

/// Creates a temporary directory.
///
/// The directory is deleted when the [`TempDir`] instance is dropped. Use it as a guard to
/// automatically clean up after tests.
pub fn tempdir() -> TempDir {
    TempDir::new().unwrap()
}

/// Encodes `value` as LEB128 varuint.
fn write_varuint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Builds the bytes of a minimal Rive file with the given version and file id.
///
/// The file consists of a header with an empty table of contents, followed by a few bytes
/// of opaque payload.
pub fn rive_file(major_version: u64, minor_version: u64, file_id: u64) -> Vec<u8> {
    let mut buf = b"RIVE".to_vec();
    write_varuint(&mut buf, major_version);
    write_varuint(&mut buf, minor_version);
    write_varuint(&mut buf, file_id);
    // empty table of contents
    buf.push(0);
    buf.extend_from_slice(&[0x17, 0x00, 0x01]);
    buf
}

/// Writes a file into `dir`, creating parent directories as needed, and returns its path.
pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rive_file() {
        assert_eq!(rive_file(7, 0, 1), b"RIVE\x07\x00\x01\x00\x17\x00\x01");
        assert_eq!(&rive_file(7, 1, 300)[4..9], b"\x07\x01\xac\x02\x00");
    }
}
