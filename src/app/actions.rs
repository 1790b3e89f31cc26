use crate::{
    core::{
        commands::Confirmed,
        library::VocabularyScope,
    },
    flows::{
        authoring::UnitDraft,
        review::Orientation,
    },
};

// User intents are queued while a screen is drawn and applied afterwards by `App::run_queue`
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    // Navigation
    Reload,
    Back,
    DismissNotice,

    // Folders
    SelectFolder(Option<String>),
    CreateFolder(String),
    DeleteFolder(String),

    // Authoring
    OpenAdd,
    OpenEdit(String),
    EditDraft(UnitDraft),
    SaveDraft,
    DeleteUnit { unit_id: String, confirmed: Confirmed },

    // Reader
    OpenReader(String),
    ToggleTranslations(String),
    TogglePhonetics(String),
    SelectText(String),
    SelectMeaningNext,
    CancelCapture,
    CommitCapture,
    AddLineToVocabulary { unit_id: String, line_id: usize },

    // Vocabulary
    OpenVocabulary(VocabularyScope),
    EditMeaning { id: String, meaning: String },
    SaveVocabulary,
    DeleteVocabulary(String),
    Export,

    // Flashcards
    StartFlashcards,
    ShowTable,
    FlipCard,
    NextCard,
    PrevCard,
    ShuffleCards,
    SetOrientation(Orientation),
}

#[derive(Debug, Default)]
pub struct ActionQueue {
    actions: Vec<UiAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self { actions: Vec::new() }
    }

    pub fn push(&mut self, action: UiAction) {
        self.actions.push(action);
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, UiAction> {
        self.actions.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}
