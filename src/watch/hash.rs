// src/watch/hash.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute a deterministic hash over the contents of the given files.
///
/// Paths are sorted before hashing so the result does not depend on the order
/// they were supplied in. Each path is mixed in alongside its contents, which
/// makes a rename register as a change. Entries that are not regular files
/// are skipped.
pub fn compute_hash_for_paths<I, P>(fs: &dyn FileSystem, paths: I) -> Result<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut hasher = Hasher::new();

    let mut paths_vec: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .collect();
    paths_vec.sort();

    for path in paths_vec {
        if !fs.is_file(&path) {
            continue;
        }
        let bytes = fs
            .read(&path)
            .with_context(|| format!("reading file for hashing: {path:?}"))?;
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(&[0]);
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, "computed aggregate hash");
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn order_does_not_matter() {
        let fs = MockFileSystem::new();
        fs.add_file("src/a.scss", "a {}");
        fs.add_file("src/b.scss", "b {}");

        let one = compute_hash_for_paths(&fs, ["src/a.scss", "src/b.scss"]).unwrap();
        let two = compute_hash_for_paths(&fs, ["src/b.scss", "src/a.scss"]).unwrap();
        assert_eq!(one, two);
    }

    #[test]
    fn content_change_changes_hash() {
        let fs = MockFileSystem::new();
        fs.add_file("src/a.scss", "a {}");
        let before = compute_hash_for_paths(&fs, ["src/a.scss"]).unwrap();

        fs.add_file("src/a.scss", "a { color: red }");
        let after = compute_hash_for_paths(&fs, ["src/a.scss"]).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn missing_files_are_skipped() {
        let fs = MockFileSystem::new();
        let empty = compute_hash_for_paths(&fs, Vec::<PathBuf>::new()).unwrap();
        let missing = compute_hash_for_paths(&fs, ["nope.txt"]).unwrap();
        assert_eq!(empty, missing);
    }
}
