use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::StoreResult;

/// Write `bytes` to `path` without ever leaving a half-written file behind:
/// write to a sibling temp file, `fsync`, then `rename` into place. Rename is
/// atomic on the same filesystem, so a crash mid-write loses the write but
/// never corrupts the previous version: persisted records are never
/// observed partially written.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let suffix: u64 = {
        use std::collections::hash_map::RandomState;
        use std::hash::{BuildHasher, Hasher};
        RandomState::new().build_hasher().finish()
    };
    let tmp_path = parent.join(format!(
        ".{}.tmp{:x}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("element"),
        suffix
    ));

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("element.toml");
        atomic_write(&path, b"hello = 1\n").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "hello = 1\n");
    }

    #[test]
    fn no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("element.toml");
        atomic_write(&path, b"a = 1\n").unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
