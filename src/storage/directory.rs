use std::path::{Path, PathBuf};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::instrument;
use walkdir::WalkDir;

use super::{LoadError, load};
use crate::domain::{Document, Syntax};

/// Directory holding tool state, never searched for documents.
const STATE_DIR: &str = ".reqs";

/// Finds every `.feature` and `.requirements` file below `root`.
///
/// The paths are sorted so that output is stable between runs. Entries that
/// can't be read are skipped.
#[must_use]
#[instrument(fields(root = %root.display()))]
pub fn discover(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != STATE_DIR)
        .filter_map(|entry| {
            entry
                .inspect_err(|e| tracing::debug!("Skipping unreadable entry: {e}"))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| Syntax::from_path(path).is_some())
        .collect();
    paths.sort();
    tracing::debug!(count = paths.len(), "discovered documents");
    paths
}

/// Loads every path in parallel.
///
/// Results are returned in the same order as `paths`; one failure doesn't
/// prevent the others from loading.
#[must_use]
pub fn load_all(paths: &[PathBuf]) -> Vec<Result<Document, LoadError>> {
    paths.par_iter().map(|path| load(path)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn discovers_documents_in_sorted_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let b = write(root, "b.requirements", "");
        let a = write(root, "nested/a.feature", "");
        write(root, "notes.md", "");
        write(root, ".reqs/ignored.requirements", "");

        assert_eq!(discover(root), vec![b, a]);
    }

    #[test]
    fn empty_directory_has_no_documents() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(discover(tmp.path()).is_empty());
    }

    #[test]
    fn loads_independently() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let good = write(root, "good.requirements", "Requirement: R\n  If: x\n  Expect: y\n");
        let bad = write(root, "bad.requirements", "If: x\n");

        let results = load_all(&[good.clone(), bad]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().source, good);
        assert!(matches!(results[1], Err(LoadError::Parse { .. })));
    }
}
