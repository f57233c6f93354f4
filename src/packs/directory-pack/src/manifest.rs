use crate::PackError;
use serde::Deserialize;
use sheetpack_core::RecordType;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

pub const MANIFEST_FILE: &str = "pack.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct PackManifest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    /// Record tag to record file, relative to the pack root.
    #[serde(default)]
    pub resources: BTreeMap<String, PathBuf>,
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

impl PackManifest {
    pub fn load(root: &Path) -> Result<Self, PackError> {
        let path = root.join(MANIFEST_FILE);
        let contents = std::fs::read_to_string(&path).map_err(|source| PackError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| PackError::Manifest { path, source })
    }

    /// Validates resource tags and paths, keyed by record type.
    pub fn record_files(&self) -> Result<BTreeMap<RecordType, PathBuf>, PackError> {
        if !is_relative_inside(&self.assets_dir) {
            return Err(PackError::InvalidPath {
                path: self.assets_dir.clone(),
            });
        }
        self.resources
            .iter()
            .map(|(tag, path)| {
                let record = RecordType::from_tag(tag)
                    .ok_or_else(|| PackError::UnknownResourceTag { tag: tag.clone() })?;
                if !is_relative_inside(path) {
                    return Err(PackError::InvalidPath { path: path.clone() });
                }
                Ok((record, path.clone()))
            })
            .collect()
    }
}

/// True for relative paths that never climb above their base.
pub(crate) fn is_relative_inside(path: &Path) -> bool {
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}
