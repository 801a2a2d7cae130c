//! Export coordination
//!
//! Walks the annotation store and commits every annotation into the source
//! document through the [`DocumentEditor`] collaborator, converting
//! authoring-space geometry into the document's bottom-left-origin point
//! grid. The coordinator only reads the store, so a failed export leaves the
//! editing session exactly as it was and the user can retry or keep editing.
//! No partial output is ever returned.

use crate::intake::IncomingDocument;
use crate::store::AnnotationStore;
use crate::units;
use overtype_engine::{DocumentEditor, DrawTextCommand, EngineError};
use tracing::debug;

/// Finished export: output bytes plus the derived download name
///
/// The coordinator performs no file I/O; handing these to a download trigger
/// is the caller's business.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to export document: {0}")]
    Engine(#[from] EngineError),
}

/// Bake the store's annotations into the source document
///
/// Pages without annotations are left untouched. Every annotation becomes
/// one text draw command in the single embedded fallback face, regardless of
/// its display-only `font_family`. The vertical flip subtracts the font
/// size from the page height (baseline one em below the annotation's top
/// edge).
pub fn export_document<E: DocumentEditor>(
    editor: &mut E,
    store: &AnnotationStore,
    source: &IncomingDocument,
) -> Result<ExportOutput, ExportError> {
    let handle = editor.open_for_edit(&source.bytes)?;
    let font = editor.embed_fallback_font(handle)?;

    for page_index in store.pages_with_annotations() {
        let page_height = editor.page_height(handle, page_index)?;

        for annotation in store.page(page_index) {
            let command = DrawTextCommand {
                x: units::to_export_units(annotation.x),
                y: units::export_baseline(page_height, annotation.y, annotation.font_size),
                size: units::to_export_units(annotation.font_size),
                font,
                text: annotation.text.clone(),
            };
            editor.draw_text(handle, page_index, command)?;
        }
    }

    let bytes = editor.serialize(handle)?;
    debug!(
        annotations = store.annotation_count(),
        size = bytes.len(),
        "export complete"
    );

    Ok(ExportOutput {
        bytes,
        file_name: source.derived_export_name(),
    })
}
