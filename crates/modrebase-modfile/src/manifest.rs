use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModfileError {
    #[error("manifest I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{file}:{line}: {msg}")]
    Parse {
        file: String,
        line: usize,
        msg: String,
    },
}

/// A module path at a specific version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ModuleVersion {
    pub path: String,
    pub version: String,
}

impl ModuleVersion {
    pub fn new(path: &str, version: &str) -> Self {
        Self {
            path: path.to_owned(),
            version: version.to_owned(),
        }
    }
}

/// A `require` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    pub path: String,
    pub version: String,
    #[serde(default)]
    pub indirect: bool,
}

impl Requirement {
    pub fn new(path: &str, version: &str, indirect: bool) -> Self {
        Self {
            path: path.to_owned(),
            version: version.to_owned(),
            indirect,
        }
    }
}

/// One side of a `replace` directive. The version is optional on the old
/// side (all versions) and absent on the new side for directory replacements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReplaceTarget {
    pub path: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl ReplaceTarget {
    pub fn new(path: &str, version: Option<&str>) -> Self {
        Self {
            path: path.to_owned(),
            version: version.map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Replacement {
    pub old: ReplaceTarget,
    pub new: ReplaceTarget,
}

/// A retracted version interval of the module itself. A single version is
/// stored with `low == high`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Retraction {
    pub low: String,
    pub high: String,
    #[serde(default)]
    pub rationale: String,
}

impl Retraction {
    pub fn new(low: &str, high: &str, rationale: &str) -> Self {
        Self {
            low: low.to_owned(),
            high: high.to_owned(),
            rationale: rationale.to_owned(),
        }
    }
}

/// A parsed `go.mod` document.
///
/// Manifests are plain values: operations such as cleanup return a new
/// manifest instead of editing in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub module_path: String,
    pub go_version: String,
    #[serde(default)]
    pub toolchain: Option<String>,
    #[serde(default)]
    pub godebug: Vec<(String, String)>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub excludes: Vec<ModuleVersion>,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
    #[serde(default)]
    pub retractions: Vec<Retraction>,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl Manifest {
    pub fn new(module_path: &str, go_version: &str) -> Self {
        Self {
            module_path: module_path.to_owned(),
            go_version: go_version.to_owned(),
            toolchain: None,
            godebug: Vec::new(),
            requirements: Vec::new(),
            excludes: Vec::new(),
            replacements: Vec::new(),
            retractions: Vec::new(),
            tools: Vec::new(),
        }
    }

    pub fn requirement(&self, path: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.path == path)
    }

    /// Split requirements into direct and indirect groups, keeping the
    /// relative order inside each group.
    pub fn requirement_groups(&self) -> (Vec<&Requirement>, Vec<&Requirement>) {
        self.requirements.iter().partition(|r| !r.indirect)
    }

    /// Format and write the manifest atomically: the content goes to a
    /// temporary file next to `path` and is renamed into place.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), ModfileError> {
        let path = path.as_ref();
        let content = self.format();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| ModfileError::Io(e.error))?;
        // Fsync parent directory to ensure rename durability on power loss.
        if let Ok(f) = fs::File::open(dir) {
            let _ = f.sync_all();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_manifest_file;

    fn sample() -> Manifest {
        let mut m = Manifest::new("example.com/app", "1.21");
        m.requirements = vec![
            Requirement::new("example.com/a", "v1.0.0", false),
            Requirement::new("example.com/b", "v1.1.0", true),
            Requirement::new("example.com/c", "v0.3.0", false),
        ];
        m
    }

    #[test]
    fn requirement_groups_are_stable() {
        let m = sample();
        let (direct, indirect) = m.requirement_groups();
        let direct: Vec<&str> = direct.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(direct, vec!["example.com/a", "example.com/c"]);
        assert_eq!(indirect.len(), 1);
        assert_eq!(indirect[0].path, "example.com/b");
    }

    #[test]
    fn requirement_lookup_by_path() {
        let m = sample();
        assert_eq!(m.requirement("example.com/b").unwrap().version, "v1.1.0");
        assert!(m.requirement("example.com/missing").is_none());
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("go.mod");
        let m = sample();
        m.write_to_file(&path).unwrap();
        let loaded = parse_manifest_file(&path).unwrap();
        assert_eq!(loaded.format(), m.format());
        assert_eq!(loaded.requirements.len(), m.requirements.len());
    }

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("go.mod");
        fs::write(&path, "stale content").unwrap();
        sample().write_to_file(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("module example.com/app\n"));
        // Only the target file remains; no temp files left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
