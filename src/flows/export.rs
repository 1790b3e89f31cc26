use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use chrono::NaiveDate;
use csv::{
    QuoteStyle,
    Terminator,
    WriterBuilder,
};
use tracing::info;

use crate::core::{
    errors::{
        DokkaiError,
        Result,
    },
    models::VocabularyItem,
};

const BOM: &str = "\u{FEFF}";
pub const HEADERS: [&str; 3] = ["単語", "意味", "ユニット"];

/// A rendered CSV file, ready to be written or handed to a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CsvExport {
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), bytes = self.bytes.len(), "vocabulary exported");
        Ok(path)
    }
}

/// `vocabulary_{scope}_{YYYY-MM-DD}.csv`; path separators in unit titles become `_`.
pub fn export_file_name(scope_name: &str, date: NaiveDate) -> String {
    let scope_name = scope_name.replace(['/', '\\'], "_");
    format!("vocabulary_{}_{}.csv", scope_name, date.format("%Y-%m-%d"))
}

fn write_rows(
    out: &mut Vec<u8>,
    quote_style: QuoteStyle,
    rows: impl IntoIterator<Item = [String; 3]>,
) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .quote_style(quote_style)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);

    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Renders word, meaning and unit title for each item. The header is bare,
/// every value is quoted, records are joined by `\n` and the file starts
/// with a UTF-8 byte order mark.
pub fn export_csv<'a>(
    items: impl IntoIterator<Item = &'a VocabularyItem>,
    scope_name: &str,
    date: NaiveDate,
) -> Result<CsvExport> {
    let rows: Vec<[String; 3]> = items
        .into_iter()
        .map(|item| [item.word.clone(), item.meaning.clone(), item.unit_title.clone()])
        .collect();

    if rows.is_empty() {
        return Err(DokkaiError::NothingToExport);
    }

    let mut bytes = BOM.as_bytes().to_vec();
    write_rows(&mut bytes, QuoteStyle::Never, [HEADERS.map(str::to_string)])?;
    write_rows(&mut bytes, QuoteStyle::Always, rows)?;

    // No newline after the last record
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }

    Ok(CsvExport { file_name: export_file_name(scope_name, date), bytes })
}
