//! Document intake validation
//!
//! Bytes handed over by the file-acquisition chrome (drag-drop or picker)
//! are validated here before any collaborator sees them: the name must carry
//! a `.pdf` extension and the buffer must look like a PDF. Rejection is a
//! user-facing message with no state change anywhere - the session is not
//! involved until intake has accepted the input.

use tracing::debug;

/// How far into the buffer the `%PDF-` marker may legally appear
const HEADER_SCAN_LIMIT: usize = 1024;

/// A validated document ready to be opened
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl IncomingDocument {
    /// Output name for the exported copy: `<base>-edited.<ext>`
    pub fn derived_export_name(&self) -> String {
        match self.file_name.rsplit_once('.') {
            Some((base, ext)) if !base.is_empty() => format!("{base}-edited.{ext}"),
            _ => format!("{}-edited.pdf", self.file_name),
        }
    }
}

/// Rejection reasons, each carrying a user-facing message
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IntakeError {
    #[error("\"{0}\" is not a PDF file; please choose a .pdf document")]
    UnsupportedExtension(String),
    #[error("the selected file does not look like a valid PDF document")]
    NotADocument,
}

/// Validate acquired bytes as a plausible document
///
/// Checks the extension (case-insensitive) and scans the first kilobyte for
/// the `%PDF-` marker; PDFs with leading junk before the header are still
/// accepted, anything else is rejected.
pub fn accept(file_name: &str, bytes: Vec<u8>) -> Result<IncomingDocument, IntakeError> {
    if !has_pdf_extension(file_name) {
        return Err(IntakeError::UnsupportedExtension(file_name.to_owned()));
    }
    if !looks_like_pdf(&bytes) {
        return Err(IntakeError::NotADocument);
    }

    debug!(file = %file_name, size = bytes.len(), "document accepted");
    Ok(IncomingDocument {
        file_name: file_name.to_owned(),
        bytes,
    })
}

fn has_pdf_extension(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    let scan = &bytes[..bytes.len().min(HEADER_SCAN_LIMIT)];
    scan.windows(b"%PDF-".len()).any(|window| window == b"%PDF-")
}
