//! CSV corpus reading and writing.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::corpus::{LABEL_COLUMN, TEXT_COLUMN};
use crate::error::{Result, RiskProfilerError};
use crate::ml::types::{LabeledExample, RiskProfile};

/// Read a labeled corpus from a CSV file.
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<LabeledExample>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        RiskProfilerError::corpus(format!("cannot open {}: {e}", path.display()))
    })?;
    let examples = read_corpus_from_reader(file)?;
    log::info!("loaded {} examples from {}", examples.len(), path.display());
    Ok(examples)
}

/// Read a labeled corpus from any CSV source.
///
/// Columns may appear in any order and extra columns are ignored. An unknown
/// label, a short row or an empty corpus is a [`RiskProfilerError::Corpus`]
/// error naming the offending line.
pub fn read_corpus_from_reader<R: Read>(reader: R) -> Result<Vec<LabeledExample>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| RiskProfilerError::corpus(format!("missing '{name}' column in header")))
    };
    let text_idx = column(TEXT_COLUMN)?;
    let label_idx = column(LABEL_COLUMN)?;

    let mut examples = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let (Some(text), Some(label)) = (record.get(text_idx), record.get(label_idx)) else {
            return Err(RiskProfilerError::corpus(format!(
                "line {line}: expected '{TEXT_COLUMN}' and '{LABEL_COLUMN}' fields"
            )));
        };
        let label: RiskProfile = label.parse().map_err(|_| {
            RiskProfilerError::corpus(format!("line {line}: unknown risk profile '{label}'"))
        })?;

        examples.push(LabeledExample::new(text, label));
    }

    if examples.is_empty() {
        return Err(RiskProfilerError::corpus("corpus contains no examples"));
    }
    Ok(examples)
}

/// Write a labeled corpus to a CSV file, creating parent directories.
pub fn write_corpus<P: AsRef<Path>>(path: P, examples: &[LabeledExample]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_corpus_to_writer(File::create(path)?, examples)?;
    log::info!("wrote {} examples to {}", examples.len(), path.display());
    Ok(())
}

/// Write a labeled corpus as CSV to any sink.
pub fn write_corpus_to_writer<W: Write>(writer: W, examples: &[LabeledExample]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([TEXT_COLUMN, LABEL_COLUMN])?;
    for example in examples {
        csv_writer.write_record([example.text.as_str(), example.label.as_str()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_with_reordered_and_extra_columns() {
        let data = "id,risk_profile,text\n\
                    1,Conservative,\"Safety first, always.\"\n\
                    2,aggressive,Maximum growth please\n";
        let examples = read_corpus_from_reader(data.as_bytes()).unwrap();

        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].text, "Safety first, always.");
        assert_eq!(examples[0].label, RiskProfile::Conservative);
        assert_eq!(examples[1].label, RiskProfile::Aggressive);
    }

    #[test]
    fn test_unknown_label_reports_line() {
        let data = "text,risk_profile\nfine,Balanced\nbad,Reckless\n";
        let err = read_corpus_from_reader(data.as_bytes()).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("line 3"), "{message}");
        assert!(message.contains("Reckless"));
    }

    #[test]
    fn test_missing_column_and_empty_corpus() {
        let err = read_corpus_from_reader("text,label\nx,Balanced\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("risk_profile"));

        let err = read_corpus_from_reader("text,risk_profile\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RiskProfilerError::Corpus(_)));
    }

    #[test]
    fn test_short_row_is_an_error() {
        let data = "text,risk_profile\nonly text\n";
        assert!(read_corpus_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("corpus.csv");
        let examples = vec![
            LabeledExample::new("Low risk, \"guaranteed\" returns.", RiskProfile::Conservative),
            LabeledExample::new("Somewhere in between", RiskProfile::Balanced),
        ];

        write_corpus(&path, &examples).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("text,risk_profile\n"));

        assert_eq!(read_corpus(&path).unwrap(), examples);
    }

    #[test]
    fn test_missing_file_is_a_corpus_error() {
        let err = read_corpus("/nonexistent/corpus.csv").unwrap_err();
        assert!(matches!(err, RiskProfilerError::Corpus(_)));
    }
}
