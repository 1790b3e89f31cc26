use crate::{
    core::library::VocabularyScope,
    flows::{
        authoring::UnitDraft,
        capture::ReaderSession,
        review::Flashcards,
    },
};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum VocabularyMode {
    #[default]
    Table,
    Flashcards(Flashcards),
}

/// What the user is looking at. Every screen except `List` carries its own
/// working state, which is dropped when the screen is left.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Screen {
    #[default]
    List,
    Add(UnitDraft),
    Edit { unit_id: String, draft: UnitDraft },
    Reader(ReaderSession),
    Vocabulary { scope: VocabularyScope, mode: VocabularyMode },
}

impl Screen {
    /// The unit this screen is bound to, if any.
    pub fn unit_id(&self) -> Option<&str> {
        match self {
            Screen::Edit { unit_id, .. } => Some(unit_id),
            Screen::Reader(session) => Some(&session.unit_id),
            Screen::Vocabulary { scope: VocabularyScope::Unit(unit_id), .. } => Some(unit_id),
            _ => None,
        }
    }

    pub fn draft(&self) -> Option<&UnitDraft> {
        match self {
            Screen::Add(draft) | Screen::Edit { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn flashcards(&self) -> Option<&Flashcards> {
        match self {
            Screen::Vocabulary { mode: VocabularyMode::Flashcards(deck), .. } => Some(deck),
            _ => None,
        }
    }

    pub(crate) fn flashcards_mut(&mut self) -> Option<&mut Flashcards> {
        match self {
            Screen::Vocabulary { mode: VocabularyMode::Flashcards(deck), .. } => Some(deck),
            _ => None,
        }
    }
}
