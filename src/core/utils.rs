use chrono::{
    Local,
    NaiveDate,
};
use uuid::Uuid;

/// Client-generated primary key for new rows.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Cleans up a text selection from the reader: trims the ends and folds any
/// run of whitespace (including line breaks between passage lines) into one space.
pub fn normalize_selection(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
