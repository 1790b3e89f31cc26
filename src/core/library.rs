use serde_json::Value;
use tracing::{
    error,
    info,
    warn,
};

use super::{
    commands::{
        Command,
        Confirmed,
        Outcome,
        Step,
    },
    errors::{
        DokkaiError,
        Result,
    },
    models::{
        Folder,
        Unit,
        VocabularyItem,
    },
    state::LibraryState,
};
use crate::{
    flows::authoring::UnitDraft,
    gateway::Gateway,
};

/// Which part of the vocabulary a table, flashcard deck or export works on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VocabularyScope {
    #[default]
    All,
    Unit(String),
}

/// One row of the unit list.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSummary {
    pub id: String,
    pub title: String,
    pub line_count: usize,
    pub vocabulary_count: usize,
    pub folder_name: Option<String>,
}

impl Outcome {
    fn unexpected(self, kind: &str) -> DokkaiError {
        DokkaiError::Remote(format!("expected a {kind} from the store, got {self:?}"))
    }

    pub fn into_folder(self) -> Result<Folder> {
        match self {
            Outcome::Folder(folder) => Ok(folder),
            other => Err(other.unexpected("folder")),
        }
    }

    pub fn into_unit(self) -> Result<Unit> {
        match self {
            Outcome::Unit(unit) => Ok(unit),
            other => Err(other.unexpected("unit")),
        }
    }

    pub fn into_vocabulary(self) -> Result<VocabularyItem> {
        match self {
            Outcome::Vocabulary(item) => Ok(item),
            other => Err(other.unexpected("vocabulary item")),
        }
    }
}

/// Folders, units and vocabulary as loaded from the store, kept in step with
/// it by running every change through [`Library::execute`].
pub struct Library<G: Gateway> {
    gateway: G,
    state: LibraryState,
}

impl<G: Gateway> Library<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway, state: LibraryState::default() }
    }

    /// Connects and loads everything.
    pub async fn open(gateway: G) -> Result<Self> {
        let mut library = Self::new(gateway);
        library.load().await?;
        Ok(library)
    }

    /// Reloads all three collections. On failure the current state is kept.
    /// Refused while meaning edits are waiting for [`Library::save_vocabulary`].
    pub async fn load(&mut self) -> Result<()> {
        if self.state.vocabulary_dirty {
            warn!("reload refused, vocabulary has unsaved changes");
            return Err(DokkaiError::Validation(
                "Save vocabulary changes before reloading".to_string(),
            ));
        }

        let folders = self.gateway.select_records::<Folder>().await;
        let units = self.gateway.select_records::<Unit>().await;
        let vocabulary = self.gateway.select_records::<VocabularyItem>().await;

        let (folders, units, vocabulary) = match (folders, units, vocabulary) {
            (Ok(f), Ok(u), Ok(v)) => (f, u, v),
            (f, u, v) => {
                let e = [f.err(), u.err(), v.err()].into_iter().flatten().next();
                let e = e.unwrap_or_else(|| DokkaiError::Remote("load failed".to_string()));
                error!(error = %e, "failed to load library");
                return Err(e);
            }
        };

        info!(
            folders = folders.len(),
            units = units.len(),
            vocabulary = vocabulary.len(),
            "library loaded"
        );

        let folder_filter =
            self.state.folder_filter.take().filter(|id| folders.iter().any(|f| &f.id == id));
        self.state = LibraryState { folders, units, vocabulary, folder_filter, vocabulary_dirty: false };
        Ok(())
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn state(&self) -> &LibraryState {
        &self.state
    }

    pub fn folders(&self) -> &[Folder] {
        &self.state.folders
    }

    pub fn units(&self) -> &[Unit] {
        &self.state.units
    }

    pub fn vocabulary(&self) -> &[VocabularyItem] {
        &self.state.vocabulary
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.state.folder(id)
    }

    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.state.unit(id)
    }

    /// Plans the command, sends its writes and, only if all of them
    /// succeeded, applies it to the in-memory collections.
    pub async fn execute(&mut self, command: Command) -> Result<Outcome> {
        let name = command.name();
        let plan = command.plan(&self.state).inspect_err(|e| {
            warn!(command = name, error = %e, "command rejected");
        })?;

        let inserted = self.persist(name, plan.steps).await?;
        let outcome = self.state.apply(plan.mutation, inserted)?;
        info!(command = name, "command applied");
        Ok(outcome)
    }

    async fn persist(&self, name: &str, steps: Vec<Step>) -> Result<Option<Value>> {
        let mut inserted = None;
        let mut completed: Vec<Step> = Vec::new();

        for step in steps {
            match step.write.send(&self.gateway).await {
                Ok(row) => {
                    if row.is_some() {
                        inserted = row;
                    }
                    completed.push(step);
                }
                Err(e) => {
                    error!(
                        command = name,
                        table = %step.write.table(),
                        operation = step.write.verb(),
                        error = %e,
                        "remote write failed"
                    );
                    return Err(self.roll_back(name, completed, e).await);
                }
            }
        }
        Ok(inserted)
    }

    async fn roll_back(&self, name: &str, completed: Vec<Step>, cause: DokkaiError) -> DokkaiError {
        for step in completed.into_iter().rev() {
            let Some(undo) = step.undo else {
                continue;
            };
            match undo.send(&self.gateway).await {
                Ok(_) => warn!(command = name, table = %undo.table(), "rolled back earlier write"),
                Err(e) => {
                    error!(command = name, table = %undo.table(), error = %e, "rollback failed");
                    return DokkaiError::PartialWrite(format!("{cause}; rollback failed: {e}"));
                }
            }
        }
        cause
    }

    // Folders

    pub async fn create_folder(&mut self, name: &str) -> Result<Folder> {
        self.execute(Command::CreateFolder { name: name.to_string() }).await?.into_folder()
    }

    pub async fn delete_folder(&mut self, id: &str) -> Result<()> {
        self.execute(Command::DeleteFolder { id: id.to_string() }).await.map(|_| ())
    }

    pub fn folder_filter(&self) -> Option<&str> {
        self.state.folder_filter.as_deref()
    }

    pub fn select_folder(&mut self, id: Option<&str>) -> Result<()> {
        if let Some(id) = id {
            self.state.folder(id).ok_or_else(|| DokkaiError::not_found("folder", id))?;
        }
        self.state.folder_filter = id.map(str::to_string);
        Ok(())
    }

    // Units

    pub async fn create_unit(&mut self, draft: UnitDraft) -> Result<Unit> {
        self.execute(Command::CreateUnit(draft)).await?.into_unit()
    }

    pub async fn update_unit(&mut self, id: &str, draft: UnitDraft) -> Result<Unit> {
        self.execute(Command::UpdateUnit { id: id.to_string(), draft }).await?.into_unit()
    }

    /// Deletes the unit together with the vocabulary captured from it.
    pub async fn delete_unit(&mut self, id: &str, confirmed: Confirmed) -> Result<()> {
        self.execute(Command::DeleteUnit { id: id.to_string(), confirmed }).await.map(|_| ())
    }

    pub async fn toggle_all_translations(&mut self, unit_id: &str) -> Result<Unit> {
        self.execute(Command::ToggleTranslations { unit_id: unit_id.to_string() })
            .await?
            .into_unit()
    }

    pub async fn toggle_all_phonetics(&mut self, unit_id: &str) -> Result<Unit> {
        self.execute(Command::TogglePhonetics { unit_id: unit_id.to_string() }).await?.into_unit()
    }

    pub fn filtered_units(&self) -> Vec<&Unit> {
        match &self.state.folder_filter {
            Some(folder_id) => self
                .state
                .units
                .iter()
                .filter(|u| u.folder_id.as_deref() == Some(folder_id.as_str()))
                .collect(),
            None => self.state.units.iter().collect(),
        }
    }

    /// Name of the unit's folder; `None` when it has none or it no longer exists.
    pub fn folder_name_of(&self, unit: &Unit) -> Option<&str> {
        unit.folder_id.as_deref().and_then(|id| self.state.folder(id)).map(|f| f.name.as_str())
    }

    pub fn vocabulary_count(&self, unit_id: &str) -> usize {
        self.state.vocabulary_for_unit(unit_id).count()
    }

    pub fn unit_summaries(&self) -> Vec<UnitSummary> {
        self.filtered_units()
            .into_iter()
            .map(|unit| UnitSummary {
                id: unit.id.clone(),
                title: unit.title.clone(),
                line_count: unit.lines.len(),
                vocabulary_count: self.vocabulary_count(&unit.id),
                folder_name: self.folder_name_of(unit).map(str::to_string),
            })
            .collect()
    }

    // Vocabulary

    pub async fn capture_vocabulary(
        &mut self,
        word: &str,
        meaning: &str,
        unit_id: Option<&str>,
        unit_title: &str,
    ) -> Result<VocabularyItem> {
        let command = Command::CaptureVocabulary {
            word: word.to_string(),
            meaning: meaning.to_string(),
            unit_id: unit_id.map(str::to_string),
            unit_title: unit_title.to_string(),
        };
        self.execute(command).await?.into_vocabulary()
    }

    /// Stores a line's English as the word and its translation as the meaning.
    /// No duplicate check.
    pub async fn add_line_to_vocabulary(
        &mut self,
        unit_id: &str,
        line_id: usize,
    ) -> Result<VocabularyItem> {
        self.execute(Command::AddLineToVocabulary { unit_id: unit_id.to_string(), line_id })
            .await?
            .into_vocabulary()
    }

    /// Local edit only; flushed by [`Library::save_vocabulary`].
    pub fn update_vocabulary_meaning(&mut self, id: &str, meaning: &str) -> Result<()> {
        let item = self
            .state
            .vocabulary
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| DokkaiError::not_found("vocabulary item", id))?;

        if item.meaning != meaning {
            item.meaning = meaning.to_string();
            self.state.vocabulary_dirty = true;
        }
        Ok(())
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.state.vocabulary_dirty
    }

    /// Upserts the whole vocabulary collection.
    pub async fn save_vocabulary(&mut self) -> Result<()> {
        self.execute(Command::SaveVocabulary).await.map(|_| ())
    }

    pub async fn delete_vocabulary(&mut self, id: &str) -> Result<()> {
        self.execute(Command::DeleteVocabulary { id: id.to_string() }).await.map(|_| ())
    }

    pub fn scoped_vocabulary(&self, scope: &VocabularyScope) -> Vec<&VocabularyItem> {
        match scope {
            VocabularyScope::All => self.state.vocabulary.iter().collect(),
            VocabularyScope::Unit(unit_id) => self
                .state
                .vocabulary
                .iter()
                .filter(|v| v.unit_id.as_deref() == Some(unit_id.as_str()))
                .collect(),
        }
    }

    /// Label used in export file names.
    pub fn scope_name(&self, scope: &VocabularyScope) -> String {
        match scope {
            VocabularyScope::All => "all".to_string(),
            VocabularyScope::Unit(unit_id) => {
                self.state.unit(unit_id).map(|u| u.title.clone()).unwrap_or_else(|| "unit".to_string())
            }
        }
    }
}
