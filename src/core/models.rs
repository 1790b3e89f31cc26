use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::gateway::Table;

/// A typed row of one of the gateway tables.
pub trait Record: Serialize + for<'de> Deserialize<'de> + Clone {
    const TABLE: Table;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>, // Assigned by the store
}

impl Record for Folder {
    const TABLE: Table = Table::Folders;
}

/// One aligned English/translation/phonetic triple. Stored inside the
/// `lines` column of its unit, so it uses the camelCase keys of that JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub id: usize, // Position within the unit
    pub english: String,
    #[serde(default)]
    pub japanese: String,
    #[serde(default)]
    pub phonetic: String,
    #[serde(default)]
    pub show_japanese: bool,
    #[serde(default)]
    pub show_phonetic: bool,
}

impl Line {
    pub fn new(id: usize, english: String, japanese: String, phonetic: String) -> Self {
        Line { id, english, japanese, phonetic, show_japanese: false, show_phonetic: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Unit {
    pub fn all_translations_shown(&self) -> bool {
        self.lines.iter().all(|l| l.show_japanese)
    }

    pub fn all_phonetics_shown(&self) -> bool {
        self.lines.iter().all(|l| l.show_phonetic)
    }

    pub fn line(&self, line_id: usize) -> Option<&Line> {
        self.lines.iter().find(|l| l.id == line_id)
    }
}

impl Record for Unit {
    const TABLE: Table = Table::Units;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub id: String,
    pub word: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub unit_title: String, // Snapshot taken at capture time, never resynced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl VocabularyItem {
    /// Case-insensitive match on the headword within one unit.
    pub fn same_entry(&self, word: &str, unit_id: Option<&str>) -> bool {
        self.unit_id.as_deref() == unit_id && self.word.to_lowercase() == word.to_lowercase()
    }
}

impl Record for VocabularyItem {
    const TABLE: Table = Table::Vocabulary;
}
