//! The closed set of content types a pack can be asked for.
//!
//! Every request names a content type by its tag. The [`ContentTypeRegistry`]
//! maps tags to descriptors once per process; descriptors say how a type is
//! resolved (record decode, multi-page text, raw image) and, for record types,
//! which decoder turns packaged bytes into a [`Record`].

use crate::records::{
    decode_record, BackgroundList, ClassList, ClassSpellsList, DecodeError, FeatList, ItemList,
    RaceList, Record, SpellList, TalentList,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Parses the packaged bytes of one record type.
pub type RecordDecoder = fn(&[u8]) -> Result<Record, DecodeError>;

/// Content types backed by a packaged record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Backgrounds,
    ClassSpells,
    Classes,
    Feats,
    Items,
    Races,
    Spells,
    Talents,
}

impl RecordType {
    pub const ALL: [RecordType; 8] = [
        RecordType::Backgrounds,
        RecordType::ClassSpells,
        RecordType::Classes,
        RecordType::Feats,
        RecordType::Items,
        RecordType::Races,
        RecordType::Spells,
        RecordType::Talents,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            RecordType::Backgrounds => "backgrounds",
            RecordType::ClassSpells => "class_spells",
            RecordType::Classes => "classes",
            RecordType::Feats => "feats",
            RecordType::Items => "items",
            RecordType::Races => "races",
            RecordType::Spells => "spells",
            RecordType::Talents => "talents",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|record| record.tag() == tag)
    }

    pub fn decoder(&self) -> RecordDecoder {
        match self {
            RecordType::Backgrounds => decode_record::<BackgroundList>,
            RecordType::ClassSpells => decode_record::<ClassSpellsList>,
            RecordType::Classes => decode_record::<ClassList>,
            RecordType::Feats => decode_record::<FeatList>,
            RecordType::Items => decode_record::<ItemList>,
            RecordType::Races => decode_record::<RaceList>,
            RecordType::Spells => decode_record::<SpellList>,
            RecordType::Talents => decode_record::<TalentList>,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Every tag a caller may see, including the error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Record(RecordType),
    /// Multi-page narrative text assembled from a directory of files.
    Info,
    /// Raw image bytes read from a single file.
    Image,
    /// Envelope key for error messages; never resolvable.
    Exception,
}

impl ContentType {
    pub const ALL: [ContentType; 11] = [
        ContentType::Record(RecordType::Backgrounds),
        ContentType::Record(RecordType::ClassSpells),
        ContentType::Record(RecordType::Classes),
        ContentType::Record(RecordType::Feats),
        ContentType::Record(RecordType::Items),
        ContentType::Record(RecordType::Races),
        ContentType::Record(RecordType::Spells),
        ContentType::Record(RecordType::Talents),
        ContentType::Info,
        ContentType::Image,
        ContentType::Exception,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ContentType::Record(record) => record.tag(),
            ContentType::Info => "info",
            ContentType::Image => "image",
            ContentType::Exception => "exception",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|content| content.tag() == tag)
    }

    pub fn descriptor(&self) -> ContentTypeDescriptor {
        let kind = match self {
            ContentType::Record(record) => ContentKind::Record {
                record: *record,
                decoder: record.decoder(),
            },
            ContentType::Info => ContentKind::TextCollection,
            ContentType::Image => ContentKind::Image,
            ContentType::Exception => ContentKind::ErrorChannel,
        };
        ContentTypeDescriptor {
            tag: self.tag(),
            kind,
        }
    }
}

/// How a content type is resolved.
#[derive(Debug, Clone, Copy)]
pub enum ContentKind {
    Record {
        record: RecordType,
        decoder: RecordDecoder,
    },
    TextCollection,
    Image,
    ErrorChannel,
}

#[derive(Debug, Clone, Copy)]
pub struct ContentTypeDescriptor {
    tag: &'static str,
    kind: ContentKind,
}

impl ContentTypeDescriptor {
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Decoder for record types; `None` for `info`, `image` and `exception`.
    pub fn decoder(&self) -> Option<RecordDecoder> {
        match self.kind {
            ContentKind::Record { decoder, .. } => Some(decoder),
            _ => None,
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self.kind {
            ContentKind::Record { record, .. } => ContentType::Record(record),
            ContentKind::TextCollection => ContentType::Info,
            ContentKind::Image => ContentType::Image,
            ContentKind::ErrorChannel => ContentType::Exception,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{tag} is not a valid content method. The valid methods are [{legal}].")]
pub struct UnknownTag {
    pub tag: String,
    pub legal: String,
}

/// Tag lookup table, built once and read without synchronisation afterwards.
#[derive(Debug)]
pub struct ContentTypeRegistry {
    descriptors: Vec<ContentTypeDescriptor>,
    by_tag: HashMap<&'static str, usize>,
    legal_tags: String,
}

impl ContentTypeRegistry {
    pub fn new() -> Self {
        let descriptors: Vec<_> = ContentType::ALL
            .iter()
            .map(ContentType::descriptor)
            .collect();
        let by_tag = descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| (descriptor.tag, index))
            .collect();
        let legal_tags = descriptors
            .iter()
            .map(|descriptor| descriptor.tag)
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            descriptors,
            by_tag,
            legal_tags,
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static ContentTypeRegistry {
        static REGISTRY: OnceLock<ContentTypeRegistry> = OnceLock::new();
        REGISTRY.get_or_init(ContentTypeRegistry::new)
    }

    pub fn lookup(&self, tag: &str) -> Result<&ContentTypeDescriptor, UnknownTag> {
        self.by_tag
            .get(tag)
            .map(|index| &self.descriptors[*index])
            .ok_or_else(|| UnknownTag {
                tag: tag.to_string(),
                legal: self.legal_tags.clone(),
            })
    }

    /// Tags in declaration order.
    pub fn all_tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.iter().map(|descriptor| descriptor.tag)
    }

    pub fn legal_tags(&self) -> &str {
        &self.legal_tags
    }
}

impl Default for ContentTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_round_trips_every_tag() {
        let registry = ContentTypeRegistry::new();
        for tag in registry.all_tags() {
            let descriptor = registry.lookup(tag).expect("known tag");
            assert_eq!(descriptor.tag(), tag);
            assert_eq!(descriptor.content_type().tag(), tag);
        }
        assert_eq!(registry.all_tags().count(), 11);
    }

    #[test]
    fn unknown_tag_lists_legal_methods() {
        let err = ContentTypeRegistry::global()
            .lookup("no_such_tag")
            .expect_err("tag should be unknown");
        let message = err.to_string();
        assert!(message.starts_with("no_such_tag is not a valid content method."));
        assert!(message.contains(
            "[backgrounds, class_spells, classes, feats, items, races, spells, talents, info, image, exception]"
        ));
    }

    #[test]
    fn only_record_types_carry_decoders() {
        let registry = ContentTypeRegistry::global();
        for record in RecordType::ALL {
            assert!(registry.lookup(record.tag()).unwrap().decoder().is_some());
        }
        for tag in ["info", "image", "exception"] {
            assert!(registry.lookup(tag).unwrap().decoder().is_none());
        }
    }

    #[test]
    fn record_type_tags_round_trip() {
        for record in RecordType::ALL {
            assert_eq!(RecordType::from_tag(record.tag()), Some(record));
        }
        assert_eq!(RecordType::from_tag("info"), None);
        assert_eq!(
            ContentType::from_tag("class_spells"),
            Some(ContentType::Record(RecordType::ClassSpells))
        );
    }
}
