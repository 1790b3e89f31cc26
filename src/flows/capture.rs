use std::mem;

use crate::{
    core::{
        errors::{
            DokkaiError,
            Result,
        },
        library::Library,
        models::VocabularyItem,
        utils::normalize_selection,
    },
    gateway::Gateway,
};

const COMMON_WORDS: &[(&str, &str)] = &[
    ("the", "定冠詞。特定のものを指す。"),
    ("a", "不定冠詞。不特定のものを指す。"),
    ("is", "be動詞の三人称単数現在形。"),
    ("and", "接続詞。「そして」の意味。"),
    ("to", "前置詞または不定詞のto。"),
];

/// Short note shown next to a freshly selected headword.
pub fn headword_hint(word: &str) -> String {
    let lower = word.to_lowercase();
    COMMON_WORDS
        .iter()
        .find(|(common, _)| *common == lower)
        .map(|(_, hint)| hint.to_string())
        .unwrap_or_else(|| format!("選択: {}", word))
}

/// Two-step vocabulary capture: pick the headword, then pick its meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CaptureState {
    #[default]
    Idle,
    HeadwordSelected { word: String },
    /// Waiting for the selection that becomes the meaning.
    SelectingMeaning { word: String },
    MeaningSelected { word: String, meaning: String },
}

impl CaptureState {
    /// Feeds a text selection from the passage. Empty selections are ignored.
    pub fn select(&mut self, text: &str) {
        let text = normalize_selection(text);
        if text.is_empty() {
            return;
        }

        *self = match mem::take(self) {
            CaptureState::Idle | CaptureState::HeadwordSelected { .. } => {
                CaptureState::HeadwordSelected { word: text }
            }
            CaptureState::SelectingMeaning { word } | CaptureState::MeaningSelected { word, .. } => {
                CaptureState::MeaningSelected { word, meaning: text }
            }
        };
    }

    /// "Select meaning next". Only moves on from `HeadwordSelected`.
    pub fn advance(&mut self) -> bool {
        match mem::take(self) {
            CaptureState::HeadwordSelected { word } => {
                *self = CaptureState::SelectingMeaning { word };
                true
            }
            other => {
                *self = other;
                false
            }
        }
    }

    pub fn cancel(&mut self) {
        *self = CaptureState::Idle;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CaptureState::Idle)
    }

    pub fn can_commit(&self) -> bool {
        matches!(self, CaptureState::MeaningSelected { .. })
    }

    pub fn word(&self) -> Option<&str> {
        match self {
            CaptureState::Idle => None,
            CaptureState::HeadwordSelected { word }
            | CaptureState::SelectingMeaning { word }
            | CaptureState::MeaningSelected { word, .. } => Some(word),
        }
    }

    pub fn meaning(&self) -> Option<&str> {
        match self {
            CaptureState::MeaningSelected { meaning, .. } => Some(meaning),
            _ => None,
        }
    }
}

/// Reading one unit, with the capture flow attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderSession {
    pub unit_id: String,
    pub capture: CaptureState,
}

impl ReaderSession {
    pub fn new(unit_id: impl Into<String>) -> Self {
        Self { unit_id: unit_id.into(), capture: CaptureState::Idle }
    }

    /// Saves the selected word and meaning. Success and duplicate rejection
    /// both reset the flow; any other failure keeps the selection for a retry.
    pub async fn commit<G: Gateway>(&mut self, library: &mut Library<G>) -> Result<VocabularyItem> {
        let CaptureState::MeaningSelected { word, meaning } = &self.capture else {
            return Err(DokkaiError::Validation("No meaning selected".to_string()));
        };
        let (word, meaning) = (word.clone(), meaning.clone());

        let unit_title = library
            .unit(&self.unit_id)
            .map(|u| u.title.clone())
            .ok_or_else(|| DokkaiError::not_found("unit", self.unit_id.as_str()))?;

        let result =
            library.capture_vocabulary(&word, &meaning, Some(self.unit_id.as_str()), &unit_title).await;

        if matches!(result, Ok(_) | Err(DokkaiError::Duplicate { .. })) {
            self.capture.cancel();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_capture_sequence() {
        let mut state = CaptureState::default();
        state.select("  sun ");
        assert_eq!(state, CaptureState::HeadwordSelected { word: "sun".to_string() });
        assert!(!state.can_commit());

        assert!(state.advance());
        assert_eq!(state, CaptureState::SelectingMeaning { word: "sun".to_string() });
        assert!(!state.can_commit());

        state.select("太陽");
        assert!(state.can_commit());
        assert_eq!(state.word(), Some("sun"));
        assert_eq!(state.meaning(), Some("太陽"));
    }

    #[test]
    fn test_empty_selection_leaves_meaning_unset() {
        let mut state = CaptureState::HeadwordSelected { word: "boils".to_string() };
        state.advance();
        state.select("   ");
        assert_eq!(state, CaptureState::SelectingMeaning { word: "boils".to_string() });
        assert!(!state.can_commit());

        let mut idle = CaptureState::Idle;
        idle.select("\n");
        assert!(idle.is_idle());
    }

    #[test]
    fn test_reselecting_replaces_candidates() {
        let mut state = CaptureState::default();
        state.select("sun");
        state.select("water");
        assert_eq!(state.word(), Some("water"));

        state.advance();
        state.select("水");
        state.select("お水");
        assert_eq!(state.meaning(), Some("お水"));
        assert_eq!(state.word(), Some("water"));
    }

    #[test]
    fn test_advance_only_from_headword() {
        let mut idle = CaptureState::Idle;
        assert!(!idle.advance());
        assert!(idle.is_idle());

        let mut done =
            CaptureState::MeaningSelected { word: "a".to_string(), meaning: "b".to_string() };
        assert!(!done.advance());
        assert!(done.can_commit());
    }

    #[test]
    fn test_cancel_from_any_state() {
        for mut state in [
            CaptureState::HeadwordSelected { word: "a".to_string() },
            CaptureState::SelectingMeaning { word: "a".to_string() },
            CaptureState::MeaningSelected { word: "a".to_string(), meaning: "b".to_string() },
        ] {
            state.cancel();
            assert!(state.is_idle());
        }
    }

    #[test]
    fn test_headword_hint() {
        assert_eq!(headword_hint("The"), "定冠詞。特定のものを指す。");
        assert_eq!(headword_hint("boils"), "選択: boils");
    }
}
