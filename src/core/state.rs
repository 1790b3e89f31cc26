use serde_json::Value;

use super::{
    commands::{
        Mutation,
        Outcome,
    },
    errors::{
        DokkaiError,
        Result,
    },
    models::{
        Folder,
        Record,
        Unit,
        VocabularyItem,
    },
};

/// In-memory mirror of the three tables plus the list filters that depend
/// on them. Only changed through [`LibraryState::apply`] once the matching
/// remote writes have succeeded.
#[derive(Debug, Clone, Default)]
pub struct LibraryState {
    pub folders: Vec<Folder>,
    pub units: Vec<Unit>,
    pub vocabulary: Vec<VocabularyItem>,
    pub folder_filter: Option<String>,
    pub vocabulary_dirty: bool, // Local meaning edits not yet upserted
}

fn persisted<R: Record>(planned: R, inserted: Option<Value>) -> Result<R> {
    match inserted {
        Some(row) => Ok(serde_json::from_value(row)?),
        None => Ok(planned),
    }
}

impl LibraryState {
    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn vocabulary_item(&self, id: &str) -> Option<&VocabularyItem> {
        self.vocabulary.iter().find(|v| v.id == id)
    }

    pub fn has_entry(&self, word: &str, unit_id: Option<&str>) -> bool {
        self.vocabulary.iter().any(|v| v.same_entry(word, unit_id))
    }

    pub fn vocabulary_for_unit<'a>(
        &'a self,
        unit_id: &'a str,
    ) -> impl Iterator<Item = &'a VocabularyItem> + 'a {
        self.vocabulary.iter().filter(move |v| v.unit_id.as_deref() == Some(unit_id))
    }

    /// Applies a mutation whose remote writes already succeeded. `inserted`
    /// is the row returned by the store for an insert, if there was one.
    pub fn apply(&mut self, mutation: Mutation, inserted: Option<Value>) -> Result<Outcome> {
        match mutation {
            Mutation::AddFolder(folder) => {
                let folder = persisted(folder, inserted)?;
                self.folders.push(folder.clone());
                Ok(Outcome::Folder(folder))
            }
            Mutation::RemoveFolder { id } => {
                self.folders.retain(|f| f.id != id);
                for unit in self.units.iter_mut() {
                    if unit.folder_id.as_deref() == Some(id.as_str()) {
                        unit.folder_id = None;
                    }
                }
                if self.folder_filter.as_deref() == Some(id.as_str()) {
                    self.folder_filter = None;
                }
                Ok(Outcome::Done)
            }
            Mutation::AddUnit(unit) => {
                let unit = persisted(unit, inserted)?;
                self.units.push(unit.clone());
                Ok(Outcome::Unit(unit))
            }
            Mutation::ReplaceUnit(unit) => {
                let slot = self
                    .units
                    .iter_mut()
                    .find(|u| u.id == unit.id)
                    .ok_or_else(|| DokkaiError::not_found("unit", unit.id.as_str()))?;
                *slot = unit.clone();
                Ok(Outcome::Unit(unit))
            }
            Mutation::RemoveUnit { id } => {
                self.units.retain(|u| u.id != id);
                self.vocabulary.retain(|v| v.unit_id.as_deref() != Some(id.as_str()));
                Ok(Outcome::Done)
            }
            Mutation::SetLines { unit_id, lines } => {
                let unit = self
                    .units
                    .iter_mut()
                    .find(|u| u.id == unit_id)
                    .ok_or_else(|| DokkaiError::not_found("unit", unit_id.as_str()))?;
                unit.lines = lines;
                Ok(Outcome::Unit(unit.clone()))
            }
            Mutation::AddVocabulary(item) => {
                let item = persisted(item, inserted)?;
                self.vocabulary.push(item.clone());
                Ok(Outcome::Vocabulary(item))
            }
            Mutation::MarkVocabularySaved => {
                self.vocabulary_dirty = false;
                Ok(Outcome::Done)
            }
            Mutation::RemoveVocabulary { id } => {
                self.vocabulary.retain(|v| v.id != id);
                Ok(Outcome::Done)
            }
        }
    }
}
