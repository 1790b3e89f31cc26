//! Mutating operations as values.
//!
//! A [`Command`] is turned into a [`Plan`] against the current state: the
//! remote writes to issue (each with the write that undoes it, if any) and
//! the local [`Mutation`] to apply once all of them succeeded. Validation
//! happens while planning, so a rejected command never reaches the store.

use serde_json::{
    json,
    Value,
};

use super::{
    errors::{
        DokkaiError,
        Result,
    },
    models::{
        Folder,
        Line,
        Record,
        Unit,
        VocabularyItem,
    },
    state::LibraryState,
    utils::new_id,
};
use crate::{
    flows::authoring::UnitDraft,
    gateway::{
        Filter,
        Gateway,
        Table,
    },
};

/// Acknowledges that the user confirmed a destructive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmed;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateFolder { name: String },
    DeleteFolder { id: String },
    CreateUnit(UnitDraft),
    UpdateUnit { id: String, draft: UnitDraft },
    DeleteUnit { id: String, confirmed: Confirmed },
    ToggleTranslations { unit_id: String },
    TogglePhonetics { unit_id: String },
    CaptureVocabulary { word: String, meaning: String, unit_id: Option<String>, unit_title: String },
    AddLineToVocabulary { unit_id: String, line_id: usize },
    SaveVocabulary,
    DeleteVocabulary { id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Insert { table: Table, row: Value },
    Update { table: Table, filter: Filter, patch: Value },
    Delete { table: Table, filter: Filter },
    Upsert { table: Table, rows: Vec<Value> },
}

impl Write {
    pub fn table(&self) -> Table {
        match self {
            Write::Insert { table, .. }
            | Write::Update { table, .. }
            | Write::Delete { table, .. }
            | Write::Upsert { table, .. } => *table,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Write::Insert { .. } => "insert",
            Write::Update { .. } => "update",
            Write::Delete { .. } => "delete",
            Write::Upsert { .. } => "upsert",
        }
    }

    /// Sends the write; returns the persisted row for inserts.
    pub async fn send<G: Gateway>(&self, gateway: &G) -> Result<Option<Value>> {
        match self {
            Write::Insert { table, row } => gateway.insert(*table, row.clone()).await.map(Some),
            Write::Update { table, filter, patch } => {
                gateway.update(*table, filter.clone(), patch.clone()).await.map(|_| None)
            }
            Write::Delete { table, filter } => {
                gateway.delete(*table, filter.clone()).await.map(|_| None)
            }
            Write::Upsert { table, rows } => {
                gateway.upsert(*table, rows.clone()).await.map(|_| None)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub write: Write,
    pub undo: Option<Write>, // None when there is nothing to compensate
}

impl Step {
    fn new(write: Write) -> Self {
        Step { write, undo: None }
    }

    fn undone_by(write: Write, undo: Write) -> Self {
        Step { write, undo: Some(undo) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddFolder(Folder),
    RemoveFolder { id: String },
    AddUnit(Unit),
    ReplaceUnit(Unit),
    RemoveUnit { id: String },
    SetLines { unit_id: String, lines: Vec<Line> },
    AddVocabulary(VocabularyItem),
    MarkVocabularySaved,
    RemoveVocabulary { id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub steps: Vec<Step>,
    pub mutation: Mutation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Folder(Folder),
    Unit(Unit),
    Vocabulary(VocabularyItem),
    Done,
}

fn rows<R: Record>(records: &[R]) -> Result<Vec<Value>> {
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        rows.push(serde_json::to_value(record)?);
    }
    Ok(rows)
}

fn unit_lines(draft: &UnitDraft) -> Result<Vec<Line>> {
    let lines = draft.lines();
    if lines.is_empty() {
        return Err(DokkaiError::Validation("Enter at least one line of English text".to_string()));
    }
    Ok(lines)
}

/// The draft's folder, or none when it no longer exists.
fn known_folder(state: &LibraryState, draft: &UnitDraft) -> Option<String> {
    draft.resolved_folder().filter(|id| state.folder(id).is_some())
}

fn toggled_lines(unit: &Unit, translations: bool) -> Vec<Line> {
    let all_shown =
        if translations { unit.all_translations_shown() } else { unit.all_phonetics_shown() };

    unit.lines
        .iter()
        .cloned()
        .map(|mut line| {
            if translations {
                line.show_japanese = !all_shown;
            } else {
                line.show_phonetic = !all_shown;
            }
            line
        })
        .collect()
}

fn find_unit<'a>(state: &'a LibraryState, id: &str) -> Result<&'a Unit> {
    state.unit(id).ok_or_else(|| DokkaiError::not_found("unit", id))
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateFolder { .. } => "create_folder",
            Command::DeleteFolder { .. } => "delete_folder",
            Command::CreateUnit(_) => "create_unit",
            Command::UpdateUnit { .. } => "update_unit",
            Command::DeleteUnit { .. } => "delete_unit",
            Command::ToggleTranslations { .. } => "toggle_translations",
            Command::TogglePhonetics { .. } => "toggle_phonetics",
            Command::CaptureVocabulary { .. } => "capture_vocabulary",
            Command::AddLineToVocabulary { .. } => "add_line_to_vocabulary",
            Command::SaveVocabulary => "save_vocabulary",
            Command::DeleteVocabulary { .. } => "delete_vocabulary",
        }
    }

    pub fn plan(&self, state: &LibraryState) -> Result<Plan> {
        match self {
            Command::CreateFolder { name } => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(DokkaiError::Validation("Folder name is empty".to_string()));
                }
                let folder = Folder { id: new_id(), name: name.to_string(), created_at: None };
                Ok(Plan {
                    steps: vec![Step::new(Write::Insert {
                        table: Table::Folders,
                        row: serde_json::to_value(&folder)?,
                    })],
                    mutation: Mutation::AddFolder(folder),
                })
            }

            Command::DeleteFolder { id } => {
                state.folder(id).ok_or_else(|| DokkaiError::not_found("folder", id.as_str()))?;

                let members: Vec<Unit> = state
                    .units
                    .iter()
                    .filter(|u| u.folder_id.as_deref() == Some(id.as_str()))
                    .cloned()
                    .collect();

                // Detach the units first so the store never holds a dangling folder_id
                let mut steps = Vec::new();
                if !members.is_empty() {
                    steps.push(Step::undone_by(
                        Write::Update {
                            table: Table::Units,
                            filter: Filter::eq("folder_id", id.as_str()),
                            patch: json!({ "folder_id": null }),
                        },
                        Write::Upsert { table: Table::Units, rows: rows(&members)? },
                    ));
                }
                steps.push(Step::new(Write::Delete {
                    table: Table::Folders,
                    filter: Filter::id(id.as_str()),
                }));

                Ok(Plan { steps, mutation: Mutation::RemoveFolder { id: id.clone() } })
            }

            Command::CreateUnit(draft) => {
                let unit = Unit {
                    id: new_id(),
                    title: draft.resolved_title(),
                    folder_id: known_folder(state, draft),
                    lines: unit_lines(draft)?,
                    created_at: None,
                };
                Ok(Plan {
                    steps: vec![Step::new(Write::Insert {
                        table: Table::Units,
                        row: serde_json::to_value(&unit)?,
                    })],
                    mutation: Mutation::AddUnit(unit),
                })
            }

            Command::UpdateUnit { id, draft } => {
                let existing = find_unit(state, id)?;
                let lines = unit_lines(draft)?;
                let unit = Unit {
                    title: draft.resolved_title(),
                    folder_id: known_folder(state, draft),
                    lines,
                    ..existing.clone()
                };
                let patch = json!({
                    "title": unit.title,
                    "folder_id": unit.folder_id,
                    "lines": unit.lines,
                });
                Ok(Plan {
                    steps: vec![Step::new(Write::Update {
                        table: Table::Units,
                        filter: Filter::id(id.as_str()),
                        patch,
                    })],
                    mutation: Mutation::ReplaceUnit(unit),
                })
            }

            Command::DeleteUnit { id, confirmed: Confirmed } => {
                find_unit(state, id)?;
                let captured: Vec<VocabularyItem> = state.vocabulary_for_unit(id).cloned().collect();

                // Vocabulary goes first; if the unit delete then fails the items are restored
                Ok(Plan {
                    steps: vec![
                        Step::undone_by(
                            Write::Delete {
                                table: Table::Vocabulary,
                                filter: Filter::eq("unit_id", id.as_str()),
                            },
                            Write::Upsert { table: Table::Vocabulary, rows: rows(&captured)? },
                        ),
                        Step::new(Write::Delete { table: Table::Units, filter: Filter::id(id.as_str()) }),
                    ],
                    mutation: Mutation::RemoveUnit { id: id.clone() },
                })
            }

            Command::ToggleTranslations { unit_id } | Command::TogglePhonetics { unit_id } => {
                let unit = find_unit(state, unit_id)?;
                let translations = matches!(self, Command::ToggleTranslations { .. });
                let lines = toggled_lines(unit, translations);
                Ok(Plan {
                    steps: vec![Step::new(Write::Update {
                        table: Table::Units,
                        filter: Filter::id(unit_id.as_str()),
                        patch: json!({ "lines": lines }),
                    })],
                    mutation: Mutation::SetLines { unit_id: unit_id.clone(), lines },
                })
            }

            Command::CaptureVocabulary { word, meaning, unit_id, unit_title } => {
                let word = word.trim();
                let meaning = meaning.trim();
                if word.is_empty() {
                    return Err(DokkaiError::Validation("No word selected".to_string()));
                }
                if meaning.is_empty() {
                    return Err(DokkaiError::Validation("No meaning selected".to_string()));
                }
                if state.has_entry(word, unit_id.as_deref()) {
                    return Err(DokkaiError::Duplicate {
                        word: word.to_string(),
                        unit_title: unit_title.clone(),
                    });
                }

                let item = VocabularyItem {
                    id: new_id(),
                    word: word.to_string(),
                    meaning: meaning.to_string(),
                    unit_id: unit_id.clone(),
                    unit_title: unit_title.clone(),
                    created_at: None,
                };
                Ok(Plan {
                    steps: vec![Step::new(Write::Insert {
                        table: Table::Vocabulary,
                        row: serde_json::to_value(&item)?,
                    })],
                    mutation: Mutation::AddVocabulary(item),
                })
            }

            Command::AddLineToVocabulary { unit_id, line_id } => {
                let unit = find_unit(state, unit_id)?;
                let line = unit
                    .line(*line_id)
                    .ok_or_else(|| DokkaiError::not_found("line", line_id.to_string()))?;

                let item = VocabularyItem {
                    id: new_id(),
                    word: line.english.clone(),
                    meaning: line.japanese.clone(),
                    unit_id: Some(unit.id.clone()),
                    unit_title: unit.title.clone(),
                    created_at: None,
                };
                Ok(Plan {
                    steps: vec![Step::new(Write::Insert {
                        table: Table::Vocabulary,
                        row: serde_json::to_value(&item)?,
                    })],
                    mutation: Mutation::AddVocabulary(item),
                })
            }

            Command::SaveVocabulary => Ok(Plan {
                steps: vec![Step::new(Write::Upsert {
                    table: Table::Vocabulary,
                    rows: rows(&state.vocabulary)?,
                })],
                mutation: Mutation::MarkVocabularySaved,
            }),

            Command::DeleteVocabulary { id } => {
                state
                    .vocabulary_item(id)
                    .ok_or_else(|| DokkaiError::not_found("vocabulary item", id.as_str()))?;
                Ok(Plan {
                    steps: vec![Step::new(Write::Delete {
                        table: Table::Vocabulary,
                        filter: Filter::id(id.as_str()),
                    })],
                    mutation: Mutation::RemoveVocabulary { id: id.clone() },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::authoring::pair_lines;

    fn state_with_unit() -> LibraryState {
        LibraryState {
            units: vec![Unit {
                id: "u1".to_string(),
                title: "Unit 1".to_string(),
                folder_id: Some("f1".to_string()),
                lines: pair_lines("One.\nTwo.", "一。\n二。", ""),
                created_at: None,
            }],
            folders: vec![Folder { id: "f1".to_string(), name: "Science".to_string(), created_at: None }],
            ..Default::default()
        }
    }

    #[test]
    fn test_blank_english_is_rejected_before_any_write() {
        let draft = UnitDraft { english: " \n \n".to_string(), ..Default::default() };
        let result = Command::CreateUnit(draft).plan(&LibraryState::default());
        assert!(matches!(result, Err(DokkaiError::Validation(_))));
    }

    #[test]
    fn test_delete_unit_plan_restores_vocabulary_on_failure() {
        let mut state = state_with_unit();
        state.vocabulary.push(VocabularyItem {
            id: "v1".to_string(),
            word: "one".to_string(),
            meaning: "一".to_string(),
            unit_id: Some("u1".to_string()),
            unit_title: "Unit 1".to_string(),
            created_at: None,
        });

        let plan =
            Command::DeleteUnit { id: "u1".to_string(), confirmed: Confirmed }.plan(&state).unwrap();

        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].write.table(), Table::Vocabulary);
        match &plan.steps[0].undo {
            Some(Write::Upsert { rows, .. }) => assert_eq!(rows[0]["id"], "v1"),
            other => panic!("Expected upsert undo, got {:?}", other),
        }
        assert_eq!(plan.steps[1].write.table(), Table::Units);
        assert!(plan.steps[1].undo.is_none());
    }

    #[test]
    fn test_delete_folder_detaches_member_units() {
        let plan = Command::DeleteFolder { id: "f1".to_string() }.plan(&state_with_unit()).unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].write.verb(), "update");
        assert_eq!(plan.steps[1].write.verb(), "delete");

        let empty = LibraryState {
            folders: vec![Folder { id: "f2".to_string(), name: "Empty".to_string(), created_at: None }],
            ..Default::default()
        };
        let plan = Command::DeleteFolder { id: "f2".to_string() }.plan(&empty).unwrap();
        assert_eq!(plan.steps.len(), 1);
    }

    #[test]
    fn test_toggle_is_all_or_nothing() {
        let mut state = state_with_unit();
        state.units[0].lines[0].show_japanese = true;

        let plan = Command::ToggleTranslations { unit_id: "u1".to_string() }.plan(&state).unwrap();
        match plan.mutation {
            Mutation::SetLines { lines, .. } => assert!(lines.iter().all(|l| l.show_japanese)),
            other => panic!("Expected SetLines, got {:?}", other),
        }

        state.units[0].lines.iter_mut().for_each(|l| l.show_phonetic = true);
        let plan = Command::TogglePhonetics { unit_id: "u1".to_string() }.plan(&state).unwrap();
        match plan.mutation {
            Mutation::SetLines { lines, .. } => assert!(lines.iter().all(|l| !l.show_phonetic)),
            other => panic!("Expected SetLines, got {:?}", other),
        }
    }

    #[test]
    fn test_capture_checks_duplicates_case_insensitively() {
        let mut state = state_with_unit();
        state.vocabulary.push(VocabularyItem {
            id: "v1".to_string(),
            word: "Run".to_string(),
            meaning: "走る".to_string(),
            unit_id: Some("u1".to_string()),
            unit_title: "Unit 1".to_string(),
            created_at: None,
        });

        let capture = |word: &str, unit_id: &str| Command::CaptureVocabulary {
            word: word.to_string(),
            meaning: "走る".to_string(),
            unit_id: Some(unit_id.to_string()),
            unit_title: "Unit 1".to_string(),
        };

        assert!(matches!(capture("RUN", "u1").plan(&state), Err(DokkaiError::Duplicate { .. })));
        assert!(capture("run", "u2").plan(&state).is_ok());
    }

    #[test]
    fn test_unit_drafts_drop_unknown_folders() {
        let state = state_with_unit();
        let draft = |folder: &str| UnitDraft {
            folder_id: Some(folder.to_string()),
            english: "One.".to_string(),
            ..Default::default()
        };

        let plan = Command::CreateUnit(draft("gone")).plan(&state).unwrap();
        match plan.mutation {
            Mutation::AddUnit(unit) => assert_eq!(unit.folder_id, None),
            other => panic!("Expected AddUnit, got {:?}", other),
        }

        let plan =
            Command::UpdateUnit { id: "u1".to_string(), draft: draft("f1") }.plan(&state).unwrap();
        match plan.mutation {
            Mutation::ReplaceUnit(unit) => assert_eq!(unit.folder_id.as_deref(), Some("f1")),
            other => panic!("Expected ReplaceUnit, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let state = LibraryState::default();
        for command in [
            Command::DeleteFolder { id: "nope".to_string() },
            Command::DeleteVocabulary { id: "nope".to_string() },
            Command::AddLineToVocabulary { unit_id: "nope".to_string(), line_id: 0 },
        ] {
            assert!(matches!(command.plan(&state), Err(DokkaiError::NotFound { .. })));
        }
    }
}
