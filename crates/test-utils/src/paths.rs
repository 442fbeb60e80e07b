//! Locations of palettes and optional real radar data.

use std::path::PathBuf;

/// Directory holding the workspace `Cargo.toml`.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // crates/test-utils
    manifest_dir
        .ancestors()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

/// Bundled color tables.
pub fn palette_dir() -> PathBuf {
    workspace_root().join("palettes")
}

/// A real Archive II volume or Level III product, looked up in
/// `TEST_DATA_DIR` and then the workspace `testdata/` directory.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let from_env = std::env::var_os("TEST_DATA_DIR").map(|dir| PathBuf::from(dir).join(name));
    from_env
        .into_iter()
        .chain(std::iter::once(workspace_root().join("testdata").join(name)))
        .find(|path| path.is_file())
}

/// Scratch directory removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_holds_manifest() {
        let root = workspace_root();
        assert!(root.join("Cargo.toml").exists(), "{:?}", root);
        assert!(root.join("crates/test-utils").is_dir());
    }

    #[test]
    fn test_palette_dir_contains_reflectivity() {
        assert!(palette_dir().join("reflectivity.json").exists());
    }

    #[test]
    fn test_find_test_file_missing() {
        assert_eq!(find_test_file("no-such-volume_V06"), None);
        // Directories are not data files
        assert_eq!(find_test_file(""), None);
    }

    #[test]
    fn test_temp_test_dir_removed_on_drop() {
        let dir = temp_test_dir();
        let path = dir.path().to_path_buf();
        assert!(path.is_dir());
        drop(dir);
        assert!(!path.exists());
    }
}
