//! In-memory content pack for embedded content and tests.

use crate::content_type::RecordType;
use crate::pack::{AssetSource, ByteStream, ContentPack, Located, ResourceLocator};
use std::collections::BTreeMap;
use std::io::{self, Cursor};

#[derive(Debug, Clone, Default)]
pub struct MemoryPack {
    id: String,
    name: String,
    records: BTreeMap<RecordType, Vec<u8>>,
    /// Insertion order is the listing order.
    assets: Vec<(String, Vec<u8>)>,
}

impl MemoryPack {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_record(mut self, record: RecordType, bytes: impl Into<Vec<u8>>) -> Self {
        self.records.insert(record, bytes.into());
        self
    }

    pub fn with_asset(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        let bytes = bytes.into();
        match self.assets.iter_mut().find(|(existing, _)| *existing == path) {
            Some(entry) => entry.1 = bytes,
            None => self.assets.push((path, bytes)),
        }
        self
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("asset not found: {path}"))
}

impl ResourceLocator for MemoryPack {
    fn locate(&self, record: RecordType) -> io::Result<Located> {
        Ok(match self.records.get(&record) {
            Some(bytes) => Located::Stream(Box::new(Cursor::new(bytes.clone()))),
            None => Located::Unsupported,
        })
    }
}

impl AssetSource for MemoryPack {
    fn list(&self, path: &str) -> io::Result<Vec<String>> {
        let dir = path.trim_end_matches('/');
        let names: Vec<String> = self
            .assets
            .iter()
            .filter_map(|(asset, _)| {
                let (parent, name) = asset.rsplit_once('/').unwrap_or(("", asset.as_str()));
                (parent == dir).then(|| name.to_string())
            })
            .collect();
        if names.is_empty() {
            return Err(not_found(path));
        }
        Ok(names)
    }

    fn open(&self, path: &str) -> io::Result<ByteStream> {
        self.assets
            .iter()
            .find(|(asset, _)| asset == path)
            .map(|(_, bytes)| Box::new(Cursor::new(bytes.clone())) as ByteStream)
            .ok_or_else(|| not_found(path))
    }
}

impl ContentPack for MemoryPack {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
