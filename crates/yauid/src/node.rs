//! Node id loading.
//!
//! A node id file is free-form text: every ASCII digit in it, in order, forms
//! the id. Everything else is ignored, so `"node-0012\n"` and `"12"` are the
//! same node.

use std::{fs, io, path::Path};

use crate::{Error, Key, Result};

/// Concatenates every ASCII decimal digit of `text` into a number.
///
/// Accumulation saturates at `u64::MAX`, which any range check reports as
/// too long.
///
/// ```
/// assert_eq!(yauid::parse_node_id(b"node-0012\n"), 12);
/// assert_eq!(yauid::parse_node_id(b"rack 3, unit 7"), 37);
/// assert_eq!(yauid::parse_node_id(b"no digits"), 0);
/// ```
pub fn parse_node_id(text: &[u8]) -> u64 {
    text.iter()
        .filter(|b| b.is_ascii_digit())
        .fold(0u64, |acc, b| {
            acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
        })
}

/// Checks that `node_id` lies within `[Key::min_node_id(), Key::max_node_id()]`.
///
/// # Errors
///
/// - [`Error::NodeIdTooShort`] below the minimum (including zero)
/// - [`Error::NodeIdTooLong`] above the maximum
pub fn validate_node_id(node_id: u64) -> Result<u64> {
    if node_id < Key::min_node_id() {
        Err(Error::NodeIdTooShort {
            node_id,
            min: Key::min_node_id(),
        })
    } else if node_id > Key::max_node_id() {
        Err(Error::NodeIdTooLong {
            node_id,
            max: Key::max_node_id(),
        })
    } else {
        Ok(node_id)
    }
}

/// Reads and validates the node id stored in the file at `path`.
///
/// # Errors
///
/// - [`Error::NodeIdFileMissing`] if the file does not exist
/// - [`Error::NodeIdFileRead`] if it can't be read
/// - [`Error::NodeIdFileEmpty`] if it has no content
/// - any error of [`validate_node_id`]
pub fn load_node_id(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let text = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => Error::NodeIdFileMissing {
            path: path.to_path_buf(),
        },
        _ => Error::NodeIdFileRead {
            path: path.to_path_buf(),
            source,
        },
    })?;

    if text.is_empty() {
        return Err(Error::NodeIdFileEmpty {
            path: path.to_path_buf(),
        });
    }

    validate_node_id(parse_node_id(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use std::io::Write;

    #[test]
    fn parses_digits_anywhere() {
        assert_eq!(parse_node_id(b"12"), 12);
        assert_eq!(parse_node_id(b"node-0012\n"), 12);
        assert_eq!(parse_node_id(b"  1\t2\r\n3 "), 123);
        assert_eq!(parse_node_id(b""), 0);
    }

    #[test]
    fn saturates_instead_of_wrapping() {
        let id = parse_node_id(b"99999999999999999999999999");
        assert_eq!(id, u64::MAX);
        assert_eq!(
            validate_node_id(id).unwrap_err().code(),
            ErrorCode::NodeIdTooLong
        );
    }

    #[test]
    fn validates_bounds() {
        assert_eq!(validate_node_id(1).unwrap(), 1);
        assert_eq!(validate_node_id(Key::max_node_id()).unwrap(), Key::max_node_id());
        assert!(matches!(
            validate_node_id(0),
            Err(Error::NodeIdTooShort { node_id: 0, min: 1 })
        ));
        assert!(matches!(
            validate_node_id(Key::max_node_id() + 1),
            Err(Error::NodeIdTooLong { .. })
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"node-0042\n").unwrap();
        assert_eq!(load_node_id(file.path()).unwrap(), 42);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_node_id(dir.path().join("absent")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NodeIdFileMissing);
    }

    #[test]
    fn empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = load_node_id(file.path()).unwrap_err();
        assert!(matches!(err, Error::NodeIdFileEmpty { .. }));
        assert_eq!(err.code(), ErrorCode::NodeIdFileRead);
    }

    #[test]
    fn file_without_digits_is_too_short() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"node\n").unwrap();
        let err = load_node_id(file.path()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NodeIdTooShort);
    }

    #[test]
    fn directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_node_id(dir.path()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NodeIdFileRead);
    }
}
