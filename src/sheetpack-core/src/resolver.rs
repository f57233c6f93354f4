//! Dispatches content calls to the right resolution strategy.

use crate::assembler::{assemble, PageOrder};
use crate::content_type::{ContentKind, ContentTypeRegistry, RecordDecoder, RecordType};
use crate::envelope::{EnvelopeValue, ImageData, ImageFormat, ResponseEnvelope};
use crate::error::{ResolveError, ResolveResult};
use crate::pack::{AssetSource, ContentPack, ContentSource, Located, ResourceLocator};
use crate::records::{MultiPageInfo, Record};
use std::any::Any;
use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Successfully resolved content, before envelope encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Record(Record),
    Info(MultiPageInfo),
    Image(ImageData),
}

impl Payload {
    pub fn into_value(self) -> ResolveResult<EnvelopeValue> {
        let encoded = match self {
            Payload::Record(record) => record.to_bytes(),
            Payload::Info(info) => info.to_bytes(),
            Payload::Image(image) => return Ok(EnvelopeValue::Image(image)),
        };
        encoded
            .map(EnvelopeValue::Bytes)
            .map_err(|err| ResolveError::unexpected(format!("failed to encode payload: {err}")))
    }
}

/// Typed outcome of a call; keeps "no content" apart from "failed".
#[derive(Debug)]
pub enum Resolution {
    Content(Payload),
    Unsupported,
    Failed(ResolveError),
}

impl Resolution {
    pub fn into_envelope(self, tag: &str) -> ResponseEnvelope {
        match self {
            Resolution::Content(payload) => match payload.into_value() {
                Ok(value) => ResponseEnvelope::success(tag, value),
                Err(err) => ResponseEnvelope::failure(err.to_string()),
            },
            Resolution::Unsupported => ResponseEnvelope::empty(),
            Resolution::Failed(err) => ResponseEnvelope::failure(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    pub page_order: PageOrder,
}

/// Resolves content calls against one pack. Holds no mutable state, so a
/// single resolver can serve concurrent callers.
#[derive(Clone)]
pub struct Resolver {
    pack: Arc<dyn ContentPack>,
    registry: &'static ContentTypeRegistry,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(pack: Arc<dyn ContentPack>) -> Self {
        Self::with_options(pack, ResolverOptions::default())
    }

    pub fn with_options(pack: Arc<dyn ContentPack>, options: ResolverOptions) -> Self {
        Self {
            pack,
            registry: ContentTypeRegistry::global(),
            options,
        }
    }

    pub fn pack(&self) -> &dyn ContentPack {
        self.pack.as_ref()
    }

    /// Resolves `tag` into an envelope. Never panics and never returns an
    /// error: failures are reported under the `exception` key.
    pub fn resolve(&self, tag: &str, arg: Option<&str>) -> ResponseEnvelope {
        tracing::info!(pack = %self.pack.id(), method = %tag, arg = ?arg, "Received call");
        let resolution = self.resolve_typed(tag, arg);
        match &resolution {
            Resolution::Content(_) => {}
            Resolution::Unsupported => tracing::info!(
                pack = %self.pack.id(),
                "{tag} is not supported by this pack. Returning an empty envelope."
            ),
            Resolution::Failed(err) => tracing::error!(
                pack = %self.pack.id(),
                kind = ?err.kind(),
                error = %err,
                "Failed to resolve {tag}"
            ),
        }
        resolution.into_envelope(tag)
    }

    pub fn resolve_typed(&self, tag: &str, arg: Option<&str>) -> Resolution {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(tag, arg)));
        match outcome {
            Ok(Ok(Some(payload))) => Resolution::Content(payload),
            Ok(Ok(None)) => Resolution::Unsupported,
            Ok(Err(err)) => Resolution::Failed(err),
            Err(panic) => Resolution::Failed(ResolveError::unexpected(panic_message(panic))),
        }
    }

    fn dispatch(&self, tag: &str, arg: Option<&str>) -> ResolveResult<Option<Payload>> {
        let descriptor = self.registry.lookup(tag)?;
        match descriptor.kind() {
            ContentKind::Record { record, decoder } => self.resolve_record(record, decoder),
            ContentKind::TextCollection => {
                let path = require_argument(tag, arg)?;
                let info = assemble(self.pack.as_ref(), path, self.options.page_order)?;
                Ok(Some(Payload::Info(info)))
            }
            ContentKind::Image => {
                let path = require_argument(tag, arg)?;
                self.resolve_image(path).map(|image| Some(Payload::Image(image)))
            }
            ContentKind::ErrorChannel => Err(ResolveError::unexpected(format!(
                "{tag} is reserved for error messages and cannot be requested"
            ))),
        }
    }

    fn resolve_record(
        &self,
        record: RecordType,
        decoder: RecordDecoder,
    ) -> ResolveResult<Option<Payload>> {
        let bytes = match self.pack.locate(record)? {
            Located::Stream(stream) => read_all(stream)?,
            Located::Unsupported => return Ok(None),
        };
        let parsed = decoder(&bytes)
            .map_err(|err| ResolveError::parse_failure(format!("failed to parse {record}: {err}")))?;
        tracing::debug!(method = %record, entries = parsed.len(), "Decoded records");
        Ok(Some(Payload::Record(parsed)))
    }

    fn resolve_image(&self, path: &str) -> ResolveResult<ImageData> {
        let bytes = read_all(self.pack.open(path)?)?;
        let format = ImageFormat::detect(&bytes).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{path} is not a recognised image"),
            )
        })?;
        tracing::debug!(path = %path, format = %format, size = bytes.len(), "Loaded image");
        Ok(ImageData { format, bytes })
    }
}

impl ContentSource for Resolver {
    fn call(&self, method: &str, arg: Option<&str>) -> ResponseEnvelope {
        self.resolve(method, arg)
    }
}

/// Reads a stream to the end; the stream is dropped before returning.
fn read_all(mut stream: impl Read) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn require_argument<'a>(tag: &str, arg: Option<&'a str>) -> ResolveResult<&'a str> {
    arg.ok_or_else(|| ResolveError::unexpected(format!("{tag} requires a content path argument")))
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic while resolving content".to_string()
    }
}
