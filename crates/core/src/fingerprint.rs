//! Content fingerprints for run input and output files.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

const CHUNK_SIZE: usize = 64 * 1024;

/// Size and SHA-256 of a file at inspection time, or `Absent` when the
/// path did not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFingerprint {
    Present { size: u64, sha256: String },
    Absent,
}

impl FileFingerprint {
    pub fn is_absent(&self) -> bool {
        matches!(self, FileFingerprint::Absent)
    }
}

/// Serialized form used in run records: `"<size>,<hash>"`, or `""` when absent.
impl fmt::Display for FileFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFingerprint::Present { size, sha256 } => write!(f, "{},{}", size, sha256),
            FileFingerprint::Absent => Ok(()),
        }
    }
}

/// Fingerprint the file at `path`.
///
/// A missing path is a normal run fact and yields [`FileFingerprint::Absent`].
/// Anything else that goes wrong while reading (permissions, a directory
/// where a file was expected) is returned as an error.
pub fn fingerprint(path: impl AsRef<Path>) -> io::Result<FileFingerprint> {
    let mut file = match File::open(path.as_ref()) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FileFingerprint::Absent),
        Err(e) => return Err(e),
    };

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut size = 0u64;
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        size += n as u64;
    }

    Ok(FileFingerprint::Present {
        size,
        sha256: format!("{:x}", hasher.finalize()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_path_is_absent() {
        let tmp = TempDir::new().unwrap();
        let fp = fingerprint(tmp.path().join("missing.txt")).unwrap();
        assert!(fp.is_absent());
        assert_eq!(fp.to_string(), "");
    }

    #[test]
    fn empty_file_has_known_hash() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.bin");
        fs::write(&path, b"").unwrap();
        assert_eq!(
            fingerprint(&path).unwrap().to_string(),
            "0,e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn known_content_hash() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("abc.txt");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            fingerprint(&path).unwrap(),
            FileFingerprint::Present {
                size: 3,
                sha256: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
                    .to_string(),
            }
        );
    }

    #[test]
    fn fingerprint_is_deterministic_across_chunks() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.bin");
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let first = fingerprint(&path).unwrap();
        let second = fingerprint(&path).unwrap();
        assert_eq!(first, second);

        let expected = format!("{:x}", Sha256::digest(&data));
        assert_eq!(
            first,
            FileFingerprint::Present {
                size: data.len() as u64,
                sha256: expected,
            }
        );
    }

    #[test]
    fn changed_content_changes_fingerprint() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("model.bin");
        fs::write(&path, b"weights v1").unwrap();
        let before = fingerprint(&path).unwrap();
        fs::write(&path, b"weights v2").unwrap();
        let after = fingerprint(&path).unwrap();
        assert_ne!(before, after);
    }
}
