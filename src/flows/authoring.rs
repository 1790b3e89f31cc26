use crate::core::models::{
    Line,
    Unit,
};

pub const UNTITLED: &str = "Untitled";

fn split_lines(block: &str) -> Vec<&str> {
    block.split('\n').map(str::trim).collect()
}

/// Aligns the three text blocks line by line.
///
/// Blank English lines are dropped; translation and phonetic lines keep
/// their positions (blank ones included), so line `i` of the result takes
/// entry `i` of each of those blocks, or an empty string when the block is
/// shorter. Extra translation/phonetic lines are ignored.
pub fn pair_lines(english: &str, japanese: &str, phonetic: &str) -> Vec<Line> {
    let japanese = split_lines(japanese);
    let phonetic = split_lines(phonetic);

    split_lines(english)
        .into_iter()
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, english)| {
            Line::new(
                index,
                english.to_string(),
                japanese.get(index).copied().unwrap_or_default().to_string(),
                phonetic.get(index).copied().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn join_field<'a>(lines: &'a [Line], field: impl Fn(&'a Line) -> &'a str) -> String {
    lines.iter().map(field).collect::<Vec<_>>().join("\n")
}

/// Form contents for creating or editing a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitDraft {
    pub title: String,
    pub folder_id: Option<String>,
    pub english: String,
    pub japanese: String,
    pub phonetic: String,
}

impl UnitDraft {
    /// Prefills an edit form from a stored unit.
    pub fn from_unit(unit: &Unit) -> Self {
        Self {
            title: unit.title.clone(),
            folder_id: unit.folder_id.clone(),
            english: join_field(&unit.lines, |l| &l.english),
            japanese: join_field(&unit.lines, |l| &l.japanese),
            phonetic: join_field(&unit.lines, |l| &l.phonetic),
        }
    }

    pub fn resolved_title(&self) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            UNTITLED.to_string()
        } else {
            title.to_string()
        }
    }

    /// A blank folder selection means "no folder".
    pub fn resolved_folder(&self) -> Option<String> {
        self.folder_id.as_deref().map(str::trim).filter(|id| !id.is_empty()).map(str::to_string)
    }

    pub fn lines(&self) -> Vec<Line> {
        pair_lines(&self.english, &self.japanese, &self.phonetic)
    }
}
