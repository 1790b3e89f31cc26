//! Reading-practice library: units of English text aligned line by line with
//! a Japanese translation and phonetic guide, vocabulary captured while
//! reading, flashcard review and CSV export, all backed by a remote table
//! store.

pub mod app;
pub mod config;
pub mod core;
pub mod flows;
pub mod gateway;
pub mod persistence;

pub use crate::app::{
    ActionQueue,
    App,
    Notice,
    NoticeLevel,
    Screen,
    UiAction,
};
pub use crate::config::{
    GatewayConfig,
    Preferences,
};
pub use crate::core::{
    Confirmed,
    DokkaiError,
    Folder,
    Library,
    Line,
    Result,
    Unit,
    VocabularyItem,
    VocabularyScope,
};
pub use crate::flows::{
    CsvExport,
    Flashcards,
    Orientation,
    ReaderSession,
    UnitDraft,
};
pub use crate::gateway::{
    Gateway,
    MemoryGateway,
    RestGateway,
};
