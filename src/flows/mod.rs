pub mod authoring;
pub mod capture;
pub mod export;
pub mod review;

pub use authoring::{
    pair_lines,
    UnitDraft,
};
pub use capture::{
    headword_hint,
    CaptureState,
    ReaderSession,
};
pub use export::{
    export_csv,
    CsvExport,
};
pub use review::{
    Flashcards,
    Orientation,
};
