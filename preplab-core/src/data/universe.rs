//! Instrument-set resolution.
//!
//! Named sets live in `{root}/{region}/instruments/{set}.txt`, one
//! instrument identifier per line; blank lines and `#` comments are
//! skipped. A CLI instrument spec resolves as:
//!
//! 1. contains a comma → explicit identifier list
//! 2. a set file with that name exists → the set's members
//! 3. otherwise → a single explicit identifier

use super::provider::{ProviderError, Region};
use std::path::{Path, PathBuf};

/// A named instrument set loaded from the store.
#[derive(Debug, Clone)]
pub struct InstrumentSet {
    pub name: String,
    pub instruments: Vec<String>,
}

fn sets_dir(root: &Path, region: Region) -> PathBuf {
    root.join(region.dir_name()).join("instruments")
}

fn set_path(root: &Path, region: Region, name: &str) -> PathBuf {
    sets_dir(root, region).join(format!("{name}.txt"))
}

impl InstrumentSet {
    /// Load a named set from the store.
    pub fn load(root: &Path, region: Region, name: &str) -> Result<Self, ProviderError> {
        let path = set_path(root, region, name);
        let content = std::fs::read_to_string(&path).map_err(|_| {
            ProviderError::UnknownInstrumentSet {
                name: name.to_string(),
                path: path.display().to_string(),
            }
        })?;

        let instruments: Vec<String> = content
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            // Member lines may carry extra columns (listing dates etc).
            .map(|l| l.split_whitespace().next().unwrap_or(l).to_string())
            .collect();

        Ok(Self {
            name: name.to_string(),
            instruments,
        })
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

/// List the set names available for a region (empty if none).
pub fn list_sets(root: &Path, region: Region) -> Result<Vec<String>, ProviderError> {
    let dir = sets_dir(root, region);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    let entries =
        std::fs::read_dir(&dir).map_err(|e| ProviderError::Io(format!("read {}: {e}", dir.display())))?;
    for entry in entries {
        let entry = entry.map_err(|e| ProviderError::Io(format!("dir entry: {e}")))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("txt") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Resolve a CLI instrument spec into an identifier list.
pub fn resolve_instruments(
    root: &Path,
    region: Region,
    spec: &str,
) -> Result<Vec<String>, ProviderError> {
    if spec.contains(',') {
        return Ok(spec
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect());
    }

    let spec = spec.trim();
    if set_path(root, region, spec).is_file() {
        return Ok(InstrumentSet::load(root, region, spec)?.instruments);
    }

    Ok(vec![spec.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn store_with_set(name: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let sets = dir.path().join("cn").join("instruments");
        fs::create_dir_all(&sets).unwrap();
        fs::write(sets.join(format!("{name}.txt")), content).unwrap();
        dir
    }

    #[test]
    fn load_skips_comments_and_blanks() {
        let dir = store_with_set("csi300", "# index members\nSH600000\n\nSH600036\n");
        let set = InstrumentSet::load(dir.path(), Region::Cn, "csi300").unwrap();
        assert_eq!(set.instruments, vec!["SH600000", "SH600036"]);
    }

    #[test]
    fn load_takes_first_column_of_member_lines() {
        let dir = store_with_set("csi300", "SH600000\t2005-01-04\t2020-09-25\n");
        let set = InstrumentSet::load(dir.path(), Region::Cn, "csi300").unwrap();
        assert_eq!(set.instruments, vec!["SH600000"]);
    }

    #[test]
    fn unknown_set_is_an_error() {
        let dir = store_with_set("csi300", "SH600000\n");
        let err = InstrumentSet::load(dir.path(), Region::Cn, "nope").unwrap_err();
        assert!(matches!(err, ProviderError::UnknownInstrumentSet { .. }));
    }

    #[test]
    fn resolve_comma_list_is_explicit() {
        let dir = store_with_set("csi300", "SH600000\n");
        let ids = resolve_instruments(dir.path(), Region::Cn, "AAA, BBB").unwrap();
        assert_eq!(ids, vec!["AAA", "BBB"]);
    }

    #[test]
    fn resolve_set_name_expands_members() {
        let dir = store_with_set("csi300", "SH600000\nSH600036\n");
        let ids = resolve_instruments(dir.path(), Region::Cn, "csi300").unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn resolve_falls_back_to_single_id() {
        let dir = store_with_set("csi300", "SH600000\n");
        let ids = resolve_instruments(dir.path(), Region::Cn, "SH601318").unwrap();
        assert_eq!(ids, vec!["SH601318"]);
    }

    #[test]
    fn list_sets_sorted() {
        let dir = store_with_set("csi300", "SH600000\n");
        fs::write(
            dir.path().join("cn/instruments/all.txt"),
            "SH600000\n",
        )
        .unwrap();
        let names = list_sets(dir.path(), Region::Cn).unwrap();
        assert_eq!(names, vec!["all", "csi300"]);
    }

    #[test]
    fn list_sets_empty_when_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_sets(dir.path(), Region::Cn).unwrap().is_empty());
    }
}
