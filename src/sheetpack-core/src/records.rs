//! Record schemas served by content packs.
//!
//! Packs author records as TOML (`[[class]]`, `[[item]]`, ...). The resolver
//! decodes them into these types and re-encodes them with bincode for the
//! envelope; hosts decode the envelope bytes with [`RecordList::from_bytes`].

use crate::content_type::RecordType;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("record content is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("{0}")]
    Toml(#[from] toml::de::Error),
}

/// A list of records of one [`RecordType`].
pub trait RecordList: Serialize + DeserializeOwned + Into<Record> {
    const RECORD_TYPE: RecordType;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Parses packaged TOML into a record list.
pub fn decode_record<T: RecordList>(bytes: &[u8]) -> Result<Record, DecodeError> {
    let text = std::str::from_utf8(bytes)?;
    let list: T = toml::from_str(text)?;
    Ok(list.into())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Feature {
    pub name: String,
    #[serde(default)]
    pub level: Option<u8>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skill_proficiencies: Vec<String>,
    #[serde(default)]
    pub tool_proficiencies: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub feature: Option<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpells {
    /// Name of the class these spells belong to.
    pub class: String,
    #[serde(default)]
    pub spells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub hit_die: u8,
    #[serde(default)]
    pub primary_abilities: Vec<String>,
    #[serde(default)]
    pub saving_throws: Vec<String>,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feat {
    pub name: String,
    #[serde(default)]
    pub prerequisite: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Cost in copper pieces.
    #[serde(default)]
    pub cost: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityBonus {
    pub ability: String,
    pub bonus: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub name: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub speed: u32,
    #[serde(default)]
    pub ability_bonuses: Vec<AbilityBonus>,
    #[serde(default)]
    pub traits: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    /// 0 for cantrips.
    pub level: u8,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub casting_time: String,
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Talent {
    pub name: String,
    #[serde(default)]
    pub prerequisite: Option<String>,
    #[serde(default)]
    pub description: String,
}

macro_rules! record_list {
    ($list:ident, $entry:ty, $toml_key:literal, $field:ident, $variant:ident) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
        pub struct $list {
            #[serde(default, rename = $toml_key)]
            pub $field: Vec<$entry>,
        }

        impl RecordList for $list {
            const RECORD_TYPE: RecordType = RecordType::$variant;

            fn len(&self) -> usize {
                self.$field.len()
            }
        }

        impl From<$list> for Record {
            fn from(list: $list) -> Self {
                Record::$variant(list)
            }
        }
    };
}

record_list!(BackgroundList, Background, "background", backgrounds, Backgrounds);
record_list!(ClassSpellsList, ClassSpells, "class_spells", class_spells, ClassSpells);
record_list!(ClassList, Class, "class", classes, Classes);
record_list!(FeatList, Feat, "feat", feats, Feats);
record_list!(ItemList, Item, "item", items, Items);
record_list!(RaceList, Race, "race", races, Races);
record_list!(SpellList, Spell, "spell", spells, Spells);
record_list!(TalentList, Talent, "talent", talents, Talents);

/// A decoded record list of any type.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Backgrounds(BackgroundList),
    ClassSpells(ClassSpellsList),
    Classes(ClassList),
    Feats(FeatList),
    Items(ItemList),
    Races(RaceList),
    Spells(SpellList),
    Talents(TalentList),
}

impl Record {
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::Backgrounds(_) => RecordType::Backgrounds,
            Record::ClassSpells(_) => RecordType::ClassSpells,
            Record::Classes(_) => RecordType::Classes,
            Record::Feats(_) => RecordType::Feats,
            Record::Items(_) => RecordType::Items,
            Record::Races(_) => RecordType::Races,
            Record::Spells(_) => RecordType::Spells,
            Record::Talents(_) => RecordType::Talents,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Record::Backgrounds(list) => list.len(),
            Record::ClassSpells(list) => list.len(),
            Record::Classes(list) => list.len(),
            Record::Feats(list) => list.len(),
            Record::Items(list) => list.len(),
            Record::Races(list) => list.len(),
            Record::Spells(list) => list.len(),
            Record::Talents(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        match self {
            Record::Backgrounds(list) => list.to_bytes(),
            Record::ClassSpells(list) => list.to_bytes(),
            Record::Classes(list) => list.to_bytes(),
            Record::Feats(list) => list.to_bytes(),
            Record::Items(list) => list.to_bytes(),
            Record::Races(list) => list.to_bytes(),
            Record::Spells(list) => list.to_bytes(),
            Record::Talents(list) => list.to_bytes(),
        }
    }

    /// Decodes envelope bytes produced for `record_type`.
    pub fn from_bytes(record_type: RecordType, bytes: &[u8]) -> Result<Self, bincode::Error> {
        Ok(match record_type {
            RecordType::Backgrounds => BackgroundList::from_bytes(bytes)?.into(),
            RecordType::ClassSpells => ClassSpellsList::from_bytes(bytes)?.into(),
            RecordType::Classes => ClassList::from_bytes(bytes)?.into(),
            RecordType::Feats => FeatList::from_bytes(bytes)?.into(),
            RecordType::Items => ItemList::from_bytes(bytes)?.into(),
            RecordType::Races => RaceList::from_bytes(bytes)?.into(),
            RecordType::Spells => SpellList::from_bytes(bytes)?.into(),
            RecordType::Talents => TalentList::from_bytes(bytes)?.into(),
        })
    }
}

/// One page of narrative text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoPage {
    pub title: String,
    pub content: String,
}

/// Ordered pages assembled from an info directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MultiPageInfo {
    pub pages: Vec<InfoPage>,
}

impl MultiPageInfo {
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|page| page.title.as_str())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
