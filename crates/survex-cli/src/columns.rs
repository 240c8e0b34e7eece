//! Column-model CSV loader.
//!
//! The file has a header row and one row per column reference:
//!
//! ```csv
//! column,visible,header,fixed
//! submission_id,true,,false
//! Question_12,true,Patient age,true
//! ```
//!
//! Omitted references are invisible; an empty header keeps the default.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

use survex_model::{ColumnModel, ColumnRef};

/// Read the column model from a CSV file.
pub fn load_column_model(path: &Path) -> Result<ColumnModel> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("read column model: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("read headers: {}", path.display()))?
        .clone();

    let mut model = ColumnModel::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read record: {}", path.display()))?;
        let mut row = BTreeMap::new();
        for (idx, value) in record.iter().enumerate() {
            let key = headers
                .get(idx)
                .unwrap_or("")
                .trim_matches('\u{feff}')
                .to_string();
            row.insert(key, value.trim().to_string());
        }

        let reference = get_field(&row, "column");
        let column: ColumnRef = reference
            .parse()
            .with_context(|| format!("column model row: {reference}"))?;
        if parse_flag(&get_field(&row, "visible"), true) {
            model.set_visible(column);
        }
        if let Some(header) = get_optional(&row, "header") {
            model.set_header(column, header);
        }
        if parse_flag(&get_field(&row, "fixed"), false) {
            model.pin(column);
        }
    }
    Ok(model)
}

fn get_field(row: &BTreeMap<String, String>, key: &str) -> String {
    row.get(key).cloned().unwrap_or_default()
}

fn get_optional(row: &BTreeMap<String, String>, key: &str) -> Option<String> {
    row.get(key).filter(|value| !value.is_empty()).cloned()
}

fn parse_flag(value: &str, default: bool) -> bool {
    if value.is_empty() {
        return default;
    }
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use survex_model::{MetaSelector, QuestionId};

    use super::*;

    #[test]
    fn loads_visibility_headers_and_pins() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "column,visible,header,fixed").unwrap();
        writeln!(file, "submission_id,true,,false").unwrap();
        writeln!(file, "Question_12,true,Patient age,true").unwrap();
        writeln!(file, "Question_13,false,,false").unwrap();

        let model = load_column_model(file.path()).expect("load");
        assert!(model.is_visible(ColumnRef::Meta(MetaSelector::SubmissionId)));
        assert!(model.is_visible(ColumnRef::Question(QuestionId(12))));
        assert!(!model.is_visible(ColumnRef::Question(QuestionId(13))));
        assert_eq!(
            model.header_for(ColumnRef::Question(QuestionId(12)), "q12"),
            "Patient age"
        );
        assert_eq!(model.fixed(), &[ColumnRef::Question(QuestionId(12))]);
    }

    #[test]
    fn rejects_unknown_references() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "column,visible,header,fixed").unwrap();
        writeln!(file, "no_such_column,true,,false").unwrap();
        assert!(load_column_model(file.path()).is_err());
    }
}
