//! Content resolution for character sheet content packs.
//!
//! A host asks a pack for a content type by tag (`classes`, `info`, `image`,
//! ...) and always gets back a [`ResponseEnvelope`]: the payload under the
//! requested tag, an error message under `exception`, or nothing at all when
//! the pack does not carry that type.

pub mod assembler;
pub mod config;
pub mod content_type;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod memory;
pub mod pack;
pub mod pack_contract;
pub mod paths;
pub mod records;
pub mod resolver;

pub use assembler::{assemble, PageFileName, PageOrder};
pub use config::{Config, ConfigError, InfoConfig, LogLevel, LoggingConfig, ValidationError};
pub use content_type::{
    ContentKind, ContentType, ContentTypeDescriptor, ContentTypeRegistry, RecordType, UnknownTag,
};
pub use envelope::{EnvelopeEntry, EnvelopeValue, ImageData, ImageFormat, ResponseEnvelope};
pub use error::{ErrorKind, ResolveError, ResolveResult};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use memory::MemoryPack;
pub use pack::{AssetSource, ByteStream, ContentPack, ContentSource, Located, ResourceLocator};
pub use paths::{AppDirs, DirsError};
pub use records::{InfoPage, MultiPageInfo, Record, RecordList};
pub use resolver::{Payload, Resolution, Resolver, ResolverOptions};

pub const APP_NAME: &str = "sheetpack";
pub const APP_AUTHOR: &str = "Sheetpack";
pub const APP_QUALIFIER: &str = "io";
