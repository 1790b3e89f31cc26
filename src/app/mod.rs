pub mod actions;
pub mod notice;
pub mod screen;

use std::path::PathBuf;

use tracing::{
    debug,
    info,
};

pub use actions::{
    ActionQueue,
    UiAction,
};
pub use notice::{
    Notice,
    NoticeLevel,
};
pub use screen::{
    Screen,
    VocabularyMode,
};

use crate::{
    config::Preferences,
    core::{
        errors::{
            DokkaiError,
            Result,
        },
        library::{
            Library,
            VocabularyScope,
        },
        utils::today,
    },
    flows::{
        authoring::UnitDraft,
        capture::{
            headword_hint,
            CaptureState,
            ReaderSession,
        },
        export::export_csv,
        review::Flashcards,
    },
    gateway::Gateway,
};

/// The whole application minus its rendering: the library, the current
/// screen, the last notice and the user's preferences.
pub struct App<G: Gateway> {
    library: Library<G>,
    screen: Screen,
    notice: Option<Notice>,
    preferences: Preferences,
    preferences_path: PathBuf,
    last_export: Option<PathBuf>,
}

impl<G: Gateway> App<G> {
    pub fn new(library: Library<G>, preferences: Preferences) -> Self {
        Self {
            library,
            screen: Screen::List,
            notice: None,
            preferences,
            preferences_path: Preferences::default_path(),
            last_export: None,
        }
    }

    /// Saves preference changes to `path` instead of the app data dir.
    pub fn with_preferences_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preferences_path = path.into();
        self
    }

    pub async fn open(gateway: G, preferences: Preferences) -> Result<Self> {
        Ok(Self::new(Library::open(gateway).await?, preferences))
    }

    pub fn library(&self) -> &Library<G> {
        &self.library
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn last_export(&self) -> Option<&PathBuf> {
        self.last_export.as_ref()
    }

    /// Hint for the headword currently selected in the reader.
    pub fn headword_hint(&self) -> Option<String> {
        match &self.screen {
            Screen::Reader(session) => session.capture.word().map(headword_hint),
            _ => None,
        }
    }

    pub async fn run_queue(&mut self, queue: &mut ActionQueue) {
        let actions: Vec<UiAction> = queue.drain().collect();
        for action in actions {
            self.dispatch(action).await;
        }
    }

    /// Applies one action. Failures become the current notice and leave the
    /// screen where it was.
    pub async fn dispatch(&mut self, action: UiAction) {
        debug!(?action, "dispatch");
        if let Err(e) = self.apply(action).await {
            self.notice = Some(Notice::from_error(&e));
        }
    }

    async fn apply(&mut self, action: UiAction) -> Result<()> {
        match action {
            UiAction::Reload => self.library.load().await?,
            UiAction::Back => self.screen = Screen::List,
            UiAction::DismissNotice => self.notice = None,

            UiAction::SelectFolder(id) => self.library.select_folder(id.as_deref())?,
            UiAction::CreateFolder(name) => {
                let folder = self.library.create_folder(&name).await?;
                self.notice = Some(Notice::info(format!("Folder \"{}\" created", folder.name)));
            }
            UiAction::DeleteFolder(id) => {
                self.library.delete_folder(&id).await?;
                if let Screen::Add(draft) | Screen::Edit { draft, .. } = &mut self.screen {
                    if draft.folder_id.as_deref() == Some(id.as_str()) {
                        draft.folder_id = None;
                    }
                }
            }

            UiAction::OpenAdd => {
                let folder_id = self.library.folder_filter().map(str::to_string);
                self.screen = Screen::Add(UnitDraft { folder_id, ..Default::default() });
            }
            UiAction::OpenEdit(unit_id) => {
                let unit = self
                    .library
                    .unit(&unit_id)
                    .ok_or_else(|| DokkaiError::not_found("unit", unit_id.as_str()))?;
                let draft = UnitDraft::from_unit(unit);
                self.screen = Screen::Edit { unit_id, draft };
            }
            UiAction::EditDraft(new_draft) => match &mut self.screen {
                Screen::Add(draft) | Screen::Edit { draft, .. } => *draft = new_draft,
                _ => debug!("no draft open"),
            },
            UiAction::SaveDraft => self.save_draft().await?,
            UiAction::DeleteUnit { unit_id, confirmed } => {
                self.library.delete_unit(&unit_id, confirmed).await?;
                if self.screen.unit_id() == Some(unit_id.as_str()) {
                    self.screen = Screen::List;
                }
            }

            UiAction::OpenReader(unit_id) => {
                self.library
                    .unit(&unit_id)
                    .ok_or_else(|| DokkaiError::not_found("unit", unit_id.as_str()))?;
                self.screen = Screen::Reader(ReaderSession::new(unit_id));
            }
            UiAction::ToggleTranslations(unit_id) => {
                self.library.toggle_all_translations(&unit_id).await?;
            }
            UiAction::TogglePhonetics(unit_id) => {
                self.library.toggle_all_phonetics(&unit_id).await?;
            }
            UiAction::SelectText(text) => {
                if let Some(capture) = self.capture_mut() {
                    capture.select(&text);
                }
            }
            UiAction::SelectMeaningNext => {
                if let Some(capture) = self.capture_mut() {
                    capture.advance();
                }
            }
            UiAction::CancelCapture => {
                if let Some(capture) = self.capture_mut() {
                    capture.cancel();
                }
            }
            UiAction::CommitCapture => {
                let Screen::Reader(session) = &mut self.screen else {
                    return Ok(());
                };
                let item = session.commit(&mut self.library).await?;
                self.notice = Some(Notice::info(format!("\"{}\" added to vocabulary", item.word)));
            }
            UiAction::AddLineToVocabulary { unit_id, line_id } => {
                self.library.add_line_to_vocabulary(&unit_id, line_id).await?;
                self.notice = Some(Notice::info("Line added to vocabulary"));
            }

            UiAction::OpenVocabulary(scope) => {
                if let VocabularyScope::Unit(unit_id) = &scope {
                    self.library
                        .unit(unit_id)
                        .ok_or_else(|| DokkaiError::not_found("unit", unit_id.as_str()))?;
                }
                self.screen = Screen::Vocabulary { scope, mode: VocabularyMode::Table };
            }
            UiAction::EditMeaning { id, meaning } => {
                self.library.update_vocabulary_meaning(&id, &meaning)?;
            }
            UiAction::SaveVocabulary => {
                self.library.save_vocabulary().await?;
                self.notice = Some(Notice::info("Vocabulary saved"));
            }
            UiAction::DeleteVocabulary(id) => self.library.delete_vocabulary(&id).await?,
            UiAction::Export => self.export()?,

            UiAction::StartFlashcards => self.start_flashcards()?,
            UiAction::ShowTable => {
                if let Screen::Vocabulary { mode, .. } = &mut self.screen {
                    *mode = VocabularyMode::Table;
                }
            }
            UiAction::FlipCard => {
                if let Some(deck) = self.screen.flashcards_mut() {
                    deck.toggle_reveal();
                }
            }
            UiAction::NextCard => {
                if let Some(deck) = self.screen.flashcards_mut() {
                    deck.next();
                }
            }
            UiAction::PrevCard => {
                if let Some(deck) = self.screen.flashcards_mut() {
                    deck.prev();
                }
            }
            UiAction::ShuffleCards => {
                if let Some(deck) = self.screen.flashcards_mut() {
                    deck.shuffle(&mut rand::rng());
                }
            }
            UiAction::SetOrientation(orientation) => {
                if let Some(deck) = self.screen.flashcards_mut() {
                    deck.set_orientation(orientation);
                }
                if self.preferences.flashcard_orientation != orientation {
                    self.preferences.flashcard_orientation = orientation;
                    self.preferences.save_at(&self.preferences_path)?;
                }
            }
        }
        Ok(())
    }

    fn capture_mut(&mut self) -> Option<&mut CaptureState> {
        match &mut self.screen {
            Screen::Reader(session) => Some(&mut session.capture),
            _ => None,
        }
    }

    fn scope(&self) -> VocabularyScope {
        match &self.screen {
            Screen::Vocabulary { scope, .. } => scope.clone(),
            _ => VocabularyScope::All,
        }
    }

    async fn save_draft(&mut self) -> Result<()> {
        match &self.screen {
            Screen::Add(draft) => {
                let unit = self.library.create_unit(draft.clone()).await?;
                info!(unit_id = %unit.id, "unit created");
            }
            Screen::Edit { unit_id, draft } => {
                let unit = self.library.update_unit(unit_id, draft.clone()).await?;
                info!(unit_id = %unit.id, "unit updated");
            }
            _ => {
                debug!("no draft open");
                return Ok(());
            }
        }
        self.screen = Screen::List;
        Ok(())
    }

    fn start_flashcards(&mut self) -> Result<()> {
        let scope = self.scope();
        let deck = Flashcards::new(
            self.library.scoped_vocabulary(&scope),
            self.preferences.flashcard_orientation,
        );
        let Some(deck) = deck else {
            self.notice = Some(Notice::info("No vocabulary to review"));
            return Ok(());
        };
        if let Screen::Vocabulary { mode, .. } = &mut self.screen {
            *mode = VocabularyMode::Flashcards(deck);
        }
        Ok(())
    }

    fn export(&mut self) -> Result<()> {
        let scope = self.scope();
        let export = export_csv(
            self.library.scoped_vocabulary(&scope),
            &self.library.scope_name(&scope),
            today(),
        )?;
        let path = export.write_to(&self.preferences.export_dir())?;
        self.notice = Some(Notice::info(format!("Exported to {}", path.display())));
        self.last_export = Some(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::commands::Confirmed,
        flows::review::Orientation,
        gateway::{
            memory::Operation,
            MemoryGateway,
            Table,
        },
    };

    async fn app() -> App<MemoryGateway> {
        App::open(MemoryGateway::new(), Preferences::default()).await.unwrap()
    }

    fn unit_draft(title: &str, english: &str, japanese: &str) -> UnitDraft {
        UnitDraft {
            title: title.to_string(),
            english: english.to_string(),
            japanese: japanese.to_string(),
            ..Default::default()
        }
    }

    async fn app_with_unit() -> (App<MemoryGateway>, String) {
        let mut app = app().await;
        app.dispatch(UiAction::OpenAdd).await;
        let draft = unit_draft("Unit 1", "I run.\nYou walk.", "私は走る。\nあなたは歩く。");
        app.dispatch(UiAction::EditDraft(draft)).await;
        app.dispatch(UiAction::SaveDraft).await;
        let unit_id = app.library().units()[0].id.clone();
        (app, unit_id)
    }

    #[tokio::test]
    async fn test_saving_a_draft_returns_to_list() {
        let (app, _) = app_with_unit().await;
        assert_eq!(app.screen(), &Screen::List);
        assert_eq!(app.library().units()[0].lines.len(), 2);
        assert!(app.notice().is_none());
    }

    #[tokio::test]
    async fn test_invalid_draft_stays_open_with_warning() {
        let mut app = app().await;
        app.dispatch(UiAction::OpenAdd).await;
        app.dispatch(UiAction::EditDraft(unit_draft("T", " \n ", ""))).await;
        app.dispatch(UiAction::SaveDraft).await;

        assert!(matches!(app.screen(), Screen::Add(_)));
        assert_eq!(app.notice().unwrap().level, NoticeLevel::Warning);

        app.dispatch(UiAction::DismissNotice).await;
        assert!(app.notice().is_none());
    }

    #[tokio::test]
    async fn test_add_prefills_filtered_folder() {
        let mut app = app().await;
        app.dispatch(UiAction::CreateFolder("Science".to_string())).await;
        let folder_id = app.library().folders()[0].id.clone();
        app.dispatch(UiAction::SelectFolder(Some(folder_id.clone()))).await;
        app.dispatch(UiAction::OpenAdd).await;

        assert_eq!(app.screen().draft().unwrap().folder_id.as_deref(), Some(folder_id.as_str()));
    }

    #[tokio::test]
    async fn test_edit_round_trip() {
        let (mut app, unit_id) = app_with_unit().await;
        app.dispatch(UiAction::OpenEdit(unit_id.clone())).await;

        let mut draft = app.screen().draft().unwrap().clone();
        assert_eq!(draft.english, "I run.\nYou walk.");
        draft.title = "Renamed".to_string();
        app.dispatch(UiAction::EditDraft(draft)).await;
        app.dispatch(UiAction::SaveDraft).await;

        assert_eq!(app.screen(), &Screen::List);
        assert_eq!(app.library().unit(&unit_id).unwrap().title, "Renamed");
    }

    #[tokio::test]
    async fn test_reader_capture_and_hint() {
        let (mut app, unit_id) = app_with_unit().await;
        let mut queue = ActionQueue::new();
        queue.push(UiAction::OpenReader(unit_id.clone()));
        queue.push(UiAction::SelectText("run".to_string()));
        app.run_queue(&mut queue).await;
        assert!(queue.is_empty());
        assert_eq!(app.headword_hint().as_deref(), Some("選択: run"));

        queue.push(UiAction::SelectMeaningNext);
        queue.push(UiAction::SelectText("走る".to_string()));
        queue.push(UiAction::CommitCapture);
        app.run_queue(&mut queue).await;

        assert_eq!(app.library().vocabulary_count(&unit_id), 1);
        assert_eq!(app.notice().unwrap().level, NoticeLevel::Info);
        assert_eq!(app.headword_hint(), None);

        // Duplicate capture is reported as info
        for action in [
            UiAction::SelectText("RUN".to_string()),
            UiAction::SelectMeaningNext,
            UiAction::SelectText("走る".to_string()),
            UiAction::CommitCapture,
        ] {
            queue.push(action);
        }
        app.run_queue(&mut queue).await;
        let notice = app.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(notice.message.contains("already"));
        assert_eq!(app.library().vocabulary_count(&unit_id), 1);
    }

    #[tokio::test]
    async fn test_leaving_reader_discards_capture() {
        let (mut app, unit_id) = app_with_unit().await;
        app.dispatch(UiAction::OpenReader(unit_id.clone())).await;
        app.dispatch(UiAction::SelectText("walk".to_string())).await;
        app.dispatch(UiAction::Back).await;
        app.dispatch(UiAction::OpenReader(unit_id)).await;

        match app.screen() {
            Screen::Reader(session) => assert!(session.capture.is_idle()),
            other => panic!("Expected reader, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_failure_shows_error_and_keeps_screen() {
        let (mut app, unit_id) = app_with_unit().await;
        app.dispatch(UiAction::OpenReader(unit_id.clone())).await;
        app.library().gateway().fail_next(Table::Units, Operation::Update).await;

        app.dispatch(UiAction::ToggleTranslations(unit_id.clone())).await;

        assert_eq!(app.notice().unwrap().level, NoticeLevel::Error);
        assert!(matches!(app.screen(), Screen::Reader(_)));
        assert!(!app.library().unit(&unit_id).unwrap().all_translations_shown());
    }

    #[tokio::test]
    async fn test_deleting_open_unit_returns_to_list() {
        let (mut app, unit_id) = app_with_unit().await;
        app.dispatch(UiAction::OpenVocabulary(VocabularyScope::Unit(unit_id.clone()))).await;
        app.dispatch(UiAction::DeleteUnit { unit_id, confirmed: Confirmed }).await;

        assert_eq!(app.screen(), &Screen::List);
        assert!(app.library().units().is_empty());
    }

    #[tokio::test]
    async fn test_flashcards_from_vocabulary_screen() {
        let dir = tempfile::tempdir().unwrap();
        let preferences_path = dir.path().join("preferences.json");
        let (app, unit_id) = app_with_unit().await;
        let mut app = app.with_preferences_path(&preferences_path);
        app.dispatch(UiAction::AddLineToVocabulary { unit_id: unit_id.clone(), line_id: 0 }).await;
        app.dispatch(UiAction::AddLineToVocabulary { unit_id: unit_id.clone(), line_id: 1 }).await;
        app.dispatch(UiAction::OpenVocabulary(VocabularyScope::Unit(unit_id))).await;
        app.dispatch(UiAction::SetOrientation(Orientation::MeaningToWord)).await;
        app.dispatch(UiAction::StartFlashcards).await;

        let deck = app.screen().flashcards().unwrap();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.front(), "私は走る。");
        assert_eq!(
            Preferences::load_at(&preferences_path).flashcard_orientation,
            Orientation::MeaningToWord
        );

        app.dispatch(UiAction::FlipCard).await;
        assert_eq!(app.screen().flashcards().unwrap().back(), Some("I run."));
        app.dispatch(UiAction::NextCard).await;
        app.dispatch(UiAction::NextCard).await;
        let deck = app.screen().flashcards().unwrap();
        assert_eq!(deck.position(), "2 / 2");
        assert!(!deck.revealed());

        app.dispatch(UiAction::ShuffleCards).await;
        assert_eq!(app.screen().flashcards().unwrap().index(), 0);

        app.dispatch(UiAction::ShowTable).await;
        assert!(app.screen().flashcards().is_none());
    }

    #[tokio::test]
    async fn test_empty_deck_and_export_are_notices() {
        let mut app = app().await;
        app.dispatch(UiAction::OpenVocabulary(VocabularyScope::All)).await;

        app.dispatch(UiAction::StartFlashcards).await;
        assert!(app.screen().flashcards().is_none());
        assert_eq!(app.notice().unwrap().level, NoticeLevel::Info);

        app.dispatch(UiAction::Export).await;
        assert_eq!(app.notice().unwrap().level, NoticeLevel::Info);
        assert!(app.last_export().is_none());
    }

    #[tokio::test]
    async fn test_export_writes_csv_to_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let preferences =
            Preferences { export_dir: Some(dir.path().to_path_buf()), ..Default::default() };
        let mut app = App::open(MemoryGateway::new(), preferences).await.unwrap();
        app.dispatch(UiAction::OpenAdd).await;
        app.dispatch(UiAction::EditDraft(unit_draft("Unit 1", "run", "走る"))).await;
        app.dispatch(UiAction::SaveDraft).await;
        let unit_id = app.library().units()[0].id.clone();
        app.dispatch(UiAction::AddLineToVocabulary { unit_id, line_id: 0 }).await;

        app.dispatch(UiAction::OpenVocabulary(VocabularyScope::All)).await;
        app.dispatch(UiAction::Export).await;

        let path = app.last_export().unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("vocabulary_all_"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.ends_with("\"run\",\"走る\",\"Unit 1\""));
    }

    #[tokio::test]
    async fn test_meaning_edits_then_save() {
        let (mut app, unit_id) = app_with_unit().await;
        app.dispatch(UiAction::AddLineToVocabulary { unit_id, line_id: 0 }).await;
        let id = app.library().vocabulary()[0].id.clone();

        app.dispatch(UiAction::EditMeaning { id: id.clone(), meaning: "走る".to_string() }).await;
        assert!(app.library().has_unsaved_changes());
        app.dispatch(UiAction::SaveVocabulary).await;
        assert!(!app.library().has_unsaved_changes());

        app.dispatch(UiAction::DeleteVocabulary(id)).await;
        assert!(app.library().vocabulary().is_empty());
    }

    #[tokio::test]
    async fn test_folder_delete_clears_open_draft() {
        let mut app = app().await;
        app.dispatch(UiAction::CreateFolder("Science".to_string())).await;
        let folder_id = app.library().folders()[0].id.clone();
        app.dispatch(UiAction::OpenAdd).await;
        let draft =
            UnitDraft { folder_id: Some(folder_id.clone()), ..unit_draft("Unit 1", "run", "") };
        app.dispatch(UiAction::EditDraft(draft)).await;
        app.dispatch(UiAction::SaveDraft).await;
        let unit_id = app.library().units()[0].id.clone();

        app.dispatch(UiAction::OpenEdit(unit_id.clone())).await;
        app.dispatch(UiAction::DeleteFolder(folder_id)).await;
        assert_eq!(app.screen().draft().unwrap().folder_id, None);
        app.dispatch(UiAction::SaveDraft).await;

        assert_eq!(app.screen(), &Screen::List);
        assert_eq!(app.library().unit(&unit_id).unwrap().folder_id, None);
    }

    #[tokio::test]
    async fn test_reload_with_unsaved_meanings_is_refused() {
        let (mut app, unit_id) = app_with_unit().await;
        app.dispatch(UiAction::AddLineToVocabulary { unit_id, line_id: 0 }).await;
        let id = app.library().vocabulary()[0].id.clone();
        app.dispatch(UiAction::EditMeaning { id, meaning: "走る".to_string() }).await;

        app.dispatch(UiAction::Reload).await;

        assert_eq!(app.notice().unwrap().level, NoticeLevel::Warning);
        assert!(app.library().has_unsaved_changes());
        assert_eq!(app.library().vocabulary()[0].meaning, "走る");

        app.dispatch(UiAction::SaveVocabulary).await;
        app.dispatch(UiAction::Reload).await;
        assert_eq!(app.library().vocabulary()[0].meaning, "走る");
        assert_eq!(app.notice().unwrap().message, "Vocabulary saved");
    }
}
