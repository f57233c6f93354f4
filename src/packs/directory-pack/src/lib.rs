//! A content pack stored as a plain directory.
//!
//! ```text
//! homebrew/
//!   pack.toml            id, name, [resources] tag -> record file
//!   raw/classes.toml     [[class]] records
//!   assets/info/...      01.Intro.md, 02.Background.md
//!   assets/icons/...     image files
//! ```

mod manifest;

pub use manifest::{PackManifest, MANIFEST_FILE};

use manifest::is_relative_inside;
use path_clean::PathClean;
use sheetpack_core::{
    AssetSource, ByteStream, ContentPack, Located, RecordType, ResourceLocator,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to parse pack manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{tag} is not a record content type")]
    UnknownResourceTag { tag: String },
    #[error("pack path {path} must be relative and stay inside the pack")]
    InvalidPath { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct DirectoryPack {
    root: PathBuf,
    manifest: PackManifest,
    record_files: BTreeMap<RecordType, PathBuf>,
    assets_root: PathBuf,
}

impl DirectoryPack {
    /// Opens the pack rooted at `root`, reading and validating `pack.toml`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, PackError> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|source| PackError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let manifest = PackManifest::load(&root)?;
        let record_files = manifest.record_files()?;
        let assets_root = root.join(&manifest.assets_dir).clean();
        let assets_root = assets_root.canonicalize().unwrap_or(assets_root);

        tracing::info!(
            pack_id = %manifest.id,
            pack_name = %manifest.name,
            records = record_files.len(),
            root = %root.display(),
            "Opened content pack"
        );
        Ok(Self {
            root,
            manifest,
            record_files,
            assets_root,
        })
    }

    pub fn manifest(&self) -> &PackManifest {
        &self.manifest
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn supported_records(&self) -> impl Iterator<Item = RecordType> + '_ {
        self.record_files.keys().copied()
    }

    /// Maps an asset path onto disk, refusing anything outside the assets dir.
    fn asset_path(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path);
        if !is_relative_inside(relative) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("asset path {path} escapes the pack"),
            ));
        }
        let joined = self.assets_root.join(relative).clean();
        let canonical = joined
            .canonicalize()
            .map_err(|err| with_path(err, &joined))?;
        if !canonical.starts_with(&self.assets_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("asset path {path} escapes the pack"),
            ));
        }
        Ok(canonical)
    }
}

fn with_path(err: io::Error, path: &Path) -> io::Error {
    io::Error::new(err.kind(), format!("{}: {err}", path.display()))
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

impl ResourceLocator for DirectoryPack {
    fn locate(&self, record: RecordType) -> io::Result<Located> {
        let Some(relative) = self.record_files.get(&record) else {
            return Ok(Located::Unsupported);
        };
        let path = self.root.join(relative);
        let file = File::open(&path).map_err(|err| with_path(err, &path))?;
        Ok(Located::Stream(Box::new(BufReader::new(file))))
    }
}

impl AssetSource for DirectoryPack {
    /// Regular, non-hidden files directly under `path`, sorted by name.
    fn list(&self, path: &str) -> io::Result<Vec<String>> {
        let dir = self.asset_path(path)?;
        let mut names = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if is_hidden(&name) {
                continue;
            }
            names.push(name.into_owned());
        }
        Ok(names)
    }

    fn open(&self, path: &str) -> io::Result<ByteStream> {
        let full = self.asset_path(path)?;
        let file = File::open(&full).map_err(|err| with_path(err, &full))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

impl ContentPack for DirectoryPack {
    fn id(&self) -> &str {
        &self.manifest.id
    }

    fn name(&self) -> &str {
        &self.manifest.name
    }
}
