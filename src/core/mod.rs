pub mod commands;
pub mod errors;
pub mod library;
pub mod models;
pub mod state;
pub mod utils;

pub use commands::{
    Command,
    Confirmed,
    Outcome,
};
pub use errors::{
    DokkaiError,
    Result,
};
pub use library::{
    Library,
    UnitSummary,
    VocabularyScope,
};
pub use models::{
    Folder,
    Line,
    Unit,
    VocabularyItem,
};
pub use state::LibraryState;
