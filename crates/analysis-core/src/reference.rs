//! Loader for the reference catalog of known exams.
//!
//! The catalog is a delimited text export with at least an `Examen`
//! column; the `Type` column is carried through when present. Encoding
//! is UTF-8 in recent exports, but older ones are Latin-1, so decoding
//! falls back accordingly.

use std::path::Path;

use crate::error::AnalysisError;

const EXAM_COLUMN: &str = "Examen";
const TYPE_COLUMN: &str = "Type";

/// One catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub exam_name: String,
    pub exam_type: Option<String>,
}

/// The authoritative catalog of known exam names/types.
///
/// Loaded once per run and threaded through classification as an
/// extension point; the current keyword rules do not consult it.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: Vec<ReferenceEntry>,
}

impl ReferenceTable {
    /// Load the catalog from a delimited text file.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let bytes = std::fs::read(path)?;
        let text = decode_text(&bytes);
        Self::from_csv_text(&text)
    }

    /// Parse catalog rows from already-decoded CSV text.
    pub fn from_csv_text(text: &str) -> Result<Self, AnalysisError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let exam_idx = headers
            .iter()
            .position(|h| h.trim() == EXAM_COLUMN)
            .ok_or(AnalysisError::MissingReferenceColumn(EXAM_COLUMN))?;
        let type_idx = headers.iter().position(|h| h.trim() == TYPE_COLUMN);

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let name = record.get(exam_idx).unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            let exam_type = type_idx
                .and_then(|idx| record.get(idx))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            entries.push(ReferenceEntry {
                exam_name: name.to_string(),
                exam_type,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode file bytes as UTF-8, falling back to Latin-1.
///
/// The fallback is total: every byte maps to the code point of the same
/// value, so a mixed or mislabeled export still loads.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_utf8_catalog() {
        let table = ReferenceTable::from_csv_text(
            "Examen,Type\nIRM cérébrale,IRM\nScanner thoracique,SCANNER\n",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].exam_name, "IRM cérébrale");
        assert_eq!(table.entries()[0].exam_type.as_deref(), Some("IRM"));
    }

    #[test]
    fn header_whitespace_is_trimmed() {
        let table =
            ReferenceTable::from_csv_text(" Examen , Type \nEcho abdominale,ECHOGRAPHIE\n")
                .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn skips_blank_exam_rows() {
        let table = ReferenceTable::from_csv_text("Examen,Type\n,IRM\nMammographie,\n").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].exam_name, "Mammographie");
        assert_eq!(table.entries()[0].exam_type, None);
    }

    #[test]
    fn missing_exam_column_is_an_error() {
        let err = ReferenceTable::from_csv_text("Nom,Type\nIRM,IRM\n").unwrap_err();
        assert!(err.is_input_shape());
        assert!(err.to_string().contains("Examen"));
    }

    #[test]
    fn latin1_file_falls_back() {
        // "IRM cérébrale" with é as the Latin-1 byte 0xE9 (invalid UTF-8).
        let mut bytes = b"Examen,Type\nIRM c".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"r");
        bytes.push(0xE9);
        bytes.extend_from_slice(b"brale,IRM\n");

        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), &bytes).unwrap();

        let table = ReferenceTable::load(tmp.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].exam_name, "IRM cérébrale");
    }
}
