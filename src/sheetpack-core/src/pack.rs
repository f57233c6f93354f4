use crate::content_type::RecordType;
use crate::envelope::ResponseEnvelope;
use std::io::{self, Read};

/// Owned byte stream handed out by a pack; dropping it closes the source.
pub type ByteStream = Box<dyn Read + Send>;

/// Outcome of asking a pack for a record type.
pub enum Located {
    Stream(ByteStream),
    /// The pack carries no content of this type.
    Unsupported,
}

impl std::fmt::Debug for Located {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Located::Stream(_) => f.write_str("Located::Stream(..)"),
            Located::Unsupported => f.write_str("Located::Unsupported"),
        }
    }
}

/// Maps record types to the packaged data holding them.
///
/// Only ever asked about record types; `info` and `image` go through
/// [`AssetSource`].
pub trait ResourceLocator: Send + Sync {
    fn locate(&self, record: RecordType) -> io::Result<Located>;
}

/// Path-addressed assets: info directories and image files.
pub trait AssetSource: Send + Sync {
    /// File names directly under `path`, in the source's own order.
    fn list(&self, path: &str) -> io::Result<Vec<String>>;

    fn open(&self, path: &str) -> io::Result<ByteStream>;
}

/// A content pack: everything the resolver needs from a plugin.
pub trait ContentPack: ResourceLocator + AssetSource {
    /// Stable pack identifier (e.g., "srd" or "homebrew").
    fn id(&self) -> &str;

    /// Human-friendly pack name.
    fn name(&self) -> &str;
}

/// Anything that answers content calls with an envelope, in process or not.
pub trait ContentSource: Send + Sync {
    fn call(&self, method: &str, arg: Option<&str>) -> ResponseEnvelope;
}
