use crate::content_type::RecordType;
use crate::envelope::ResponseEnvelope;
use crate::pack::ContentSource;
use crate::records::{MultiPageInfo, Record};
use thiserror::Error;

/// Expectations supplied by a content pack to run the shared contract suite.
#[derive(Debug, Clone, Default)]
pub struct PackContractExpectations {
    /// Record types the pack ships; each must decode.
    pub supported: Vec<RecordType>,
    /// Record types the pack does not ship; each must yield an empty envelope.
    pub unsupported: Vec<RecordType>,
    /// Optional info directory with the titles it should assemble to, in order.
    pub info: Option<InfoExpectation>,
    /// Optional image path that should resolve to image bytes.
    pub image_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InfoExpectation {
    pub path: String,
    pub titles: Vec<String>,
}

/// Errors surfaced by the pack contract test harness.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackContractError {
    #[error("unknown method was not reported under exception")]
    UnknownTagAccepted,
    #[error("unknown method error does not name the method: {message}")]
    UnknownTagMessage { message: String },
    #[error("{tag} is expected to be supported but the envelope was empty")]
    SupportedEmpty { tag: String },
    #[error("{tag} failed to resolve: {message}")]
    SupportedFailed { tag: String, message: String },
    #[error("{tag} resolved to bytes that do not decode: {message}")]
    SupportedUndecodable { tag: String, message: String },
    #[error("{tag} is expected to be unsupported but the envelope had key {key:?}")]
    UnsupportedReturned { tag: String, key: Option<String> },
    #[error("info at {path} failed to resolve: {message}")]
    InfoFailed { path: String, message: String },
    #[error("info at {path} assembled titles {actual:?}, expected {expected:?}")]
    InfoTitles {
        path: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("image at {path} failed to resolve: {message}")]
    ImageFailed { path: String, message: String },
}

/// Run the shared contract suite against anything that answers content calls.
///
/// Packs should call this from their crate-level tests with fixtures that
/// exist in their test setup.
pub fn run_pack_contract<S: ContentSource + ?Sized>(
    source: &S,
    expectations: &PackContractExpectations,
) -> Result<(), PackContractError> {
    verify_unknown_tag(source)?;
    verify_records(source, expectations)?;
    verify_info(source, expectations)?;
    verify_image(source, expectations)?;
    Ok(())
}

fn failure_message(envelope: &ResponseEnvelope) -> String {
    envelope
        .error_message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("unexpected envelope key {:?}", envelope.key()))
}

fn verify_unknown_tag<S: ContentSource + ?Sized>(source: &S) -> Result<(), PackContractError> {
    let method = "not_a_content_method";
    let envelope = source.call(method, None);
    let message = envelope
        .error_message()
        .ok_or(PackContractError::UnknownTagAccepted)?;
    if !message.contains(method) {
        return Err(PackContractError::UnknownTagMessage {
            message: message.to_string(),
        });
    }
    Ok(())
}

fn verify_records<S: ContentSource + ?Sized>(
    source: &S,
    expectations: &PackContractExpectations,
) -> Result<(), PackContractError> {
    for record in &expectations.supported {
        let tag = record.tag();
        let envelope = source.call(tag, None);
        if envelope.is_empty() {
            return Err(PackContractError::SupportedEmpty {
                tag: tag.to_string(),
            });
        }
        let bytes = envelope
            .bytes(tag)
            .ok_or_else(|| PackContractError::SupportedFailed {
                tag: tag.to_string(),
                message: failure_message(&envelope),
            })?;
        Record::from_bytes(*record, bytes).map_err(|err| {
            PackContractError::SupportedUndecodable {
                tag: tag.to_string(),
                message: err.to_string(),
            }
        })?;
    }

    for record in &expectations.unsupported {
        let envelope = source.call(record.tag(), None);
        if !envelope.is_empty() {
            return Err(PackContractError::UnsupportedReturned {
                tag: record.tag().to_string(),
                key: envelope.key().map(str::to_string),
            });
        }
    }
    Ok(())
}

fn verify_info<S: ContentSource + ?Sized>(
    source: &S,
    expectations: &PackContractExpectations,
) -> Result<(), PackContractError> {
    let Some(info) = &expectations.info else {
        return Ok(());
    };
    let envelope = source.call("info", Some(info.path.as_str()));
    let bytes = envelope
        .bytes("info")
        .ok_or_else(|| PackContractError::InfoFailed {
            path: info.path.clone(),
            message: failure_message(&envelope),
        })?;
    let pages = MultiPageInfo::from_bytes(bytes).map_err(|err| PackContractError::InfoFailed {
        path: info.path.clone(),
        message: err.to_string(),
    })?;
    let actual: Vec<String> = pages.titles().map(str::to_string).collect();
    if actual != info.titles {
        return Err(PackContractError::InfoTitles {
            path: info.path.clone(),
            expected: info.titles.clone(),
            actual,
        });
    }
    Ok(())
}

fn verify_image<S: ContentSource + ?Sized>(
    source: &S,
    expectations: &PackContractExpectations,
) -> Result<(), PackContractError> {
    let Some(path) = &expectations.image_path else {
        return Ok(());
    };
    let envelope = source.call("image", Some(path.as_str()));
    if envelope.image().is_none() {
        return Err(PackContractError::ImageFailed {
            path: path.clone(),
            message: failure_message(&envelope),
        });
    }
    Ok(())
}
