#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("failed to write report: {0}")]
    Report(#[from] rust_xlsxwriter::XlsxError),

    #[error("reference file error: {0}")]
    Reference(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("column '{column}' not found in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("no data in {0}")]
    EmptySheet(String),

    #[error("reference file has no '{0}' column")]
    MissingReferenceColumn(&'static str),
}

impl AnalysisError {
    /// True for errors caused by the shape of the caller's input
    /// (unreadable workbook, missing column, empty file) as opposed to
    /// internal failures.
    pub fn is_input_shape(&self) -> bool {
        matches!(
            self,
            AnalysisError::Workbook(_)
                | AnalysisError::MissingColumn { .. }
                | AnalysisError::EmptySheet(_)
                | AnalysisError::MissingReferenceColumn(_)
        )
    }
}
