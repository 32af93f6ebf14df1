use crate::error::{CarrierError, Result};
use std::path::{Path, PathBuf};

/// One discrete update to be applied to the endpoint.
///
/// Identity is the file name, not the contents: a payload edited under an
/// unchanged name is invisible to the resume logic. Units are meant to be
/// immutable once named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUnit {
    pub name: String,
    pub path: PathBuf,
}

impl UpdateUnit {
    /// Read the unit's payload as UTF-8 text.
    pub fn payload(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Enumerate the `.sparql` files in `dir`, sorted lexically by file name.
///
/// The fixed order makes repeated runs over an unchanged directory process
/// units identically. An empty directory yields an empty list.
pub fn scan_units(dir: &Path) -> Result<Vec<UpdateUnit>> {
    if !dir.is_dir() {
        return Err(CarrierError::UnitsDirNotFound(dir.to_path_buf()));
    }

    let mut units = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("sparql") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        units.push(UpdateUnit {
            name: name.to_string(),
            path,
        });
    }

    units.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_unit(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn scan_sorts_lexically() {
        let dir = TempDir::new().unwrap();
        write_unit(dir.path(), "c.sparql", "");
        write_unit(dir.path(), "a.sparql", "");
        write_unit(dir.path(), "b.sparql", "");

        let units = scan_units(dir.path()).unwrap();
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["a.sparql", "b.sparql", "c.sparql"]);
    }

    #[test]
    fn scan_skips_non_sparql_files() {
        let dir = TempDir::new().unwrap();
        write_unit(dir.path(), "keep.sparql", "");
        write_unit(dir.path(), "notes.txt", "");
        std::fs::create_dir(dir.path().join("sub.sparql")).unwrap();

        let units = scan_units(dir.path()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "keep.sparql");
    }

    #[test]
    fn scan_empty_dir_yields_empty_list() {
        let dir = TempDir::new().unwrap();
        assert!(scan_units(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn scan_missing_dir_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan_units(&missing),
            Err(CarrierError::UnitsDirNotFound(_))
        ));
    }

    #[test]
    fn payload_reads_file_contents() {
        let dir = TempDir::new().unwrap();
        write_unit(dir.path(), "q.sparql", "INSERT DATA { <a> <b> <c> }");
        let units = scan_units(dir.path()).unwrap();
        assert_eq!(units[0].payload().unwrap(), "INSERT DATA { <a> <b> <c> }");
    }
}
