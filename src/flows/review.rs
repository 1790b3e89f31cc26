use rand::{
    seq::SliceRandom,
    Rng,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::models::VocabularyItem;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    WordToMeaning,
    MeaningToWord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub word: String,
    pub meaning: String,
}

/// Bounded, linear walk over a snapshot of vocabulary items.
#[derive(Debug, Clone, PartialEq)]
pub struct Flashcards {
    cards: Vec<Card>,
    index: usize,
    orientation: Orientation,
    revealed: bool,
}

impl Flashcards {
    /// `None` when there is nothing to review.
    pub fn new<'a>(
        items: impl IntoIterator<Item = &'a VocabularyItem>,
        orientation: Orientation,
    ) -> Option<Self> {
        let cards: Vec<Card> = items
            .into_iter()
            .map(|item| Card { word: item.word.clone(), meaning: item.meaning.clone() })
            .collect();

        if cards.is_empty() {
            return None;
        }
        Some(Self { cards, index: 0, orientation, revealed: false })
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based "current / total" label.
    pub fn position(&self) -> String {
        format!("{} / {}", self.index + 1, self.cards.len())
    }

    pub fn current(&self) -> &Card {
        &self.cards[self.index]
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn front(&self) -> &str {
        let card = self.current();
        match self.orientation {
            Orientation::WordToMeaning => &card.word,
            Orientation::MeaningToWord => &card.meaning,
        }
    }

    /// The answer side, only once revealed.
    pub fn back(&self) -> Option<&str> {
        if !self.revealed {
            return None;
        }
        let card = self.current();
        Some(match self.orientation {
            Orientation::WordToMeaning => &card.meaning,
            Orientation::MeaningToWord => &card.word,
        })
    }

    pub fn toggle_reveal(&mut self) {
        self.revealed = !self.revealed;
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        self.revealed = false;
    }

    pub fn can_prev(&self) -> bool {
        self.index > 0
    }

    pub fn can_next(&self) -> bool {
        self.index + 1 < self.cards.len()
    }

    pub fn prev(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.index -= 1;
        self.revealed = false;
        true
    }

    pub fn next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.index += 1;
        self.revealed = false;
        true
    }

    /// Reorders the deck and starts again from the first card.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.index = 0;
        self.revealed = false;
    }
}
