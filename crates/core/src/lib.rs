//! Overtype Core Library
//!
//! Coordinate-space reconciliation and edit-history engine for floating text
//! annotations over rendered document pages. Annotations are authored in the
//! page's unscaled unit grid, displayed through a zoom factor, and committed
//! into the document's bottom-left-origin point grid on export; every
//! mutation in between is undoable without drift across zoom changes and
//! page boundaries.

pub mod annotation;
pub mod export;
pub mod history;
pub mod intake;
pub mod interaction;
pub mod session;
pub mod store;
pub mod units;

pub use annotation::{AnnotationId, Placement, TextAnnotation};
pub use export::{export_document, ExportError, ExportOutput};
pub use history::History;
pub use intake::{accept, IncomingDocument, IntakeError};
pub use interaction::{InteractionLayer, PagePoint, PointerOutcome};
pub use session::{DocumentPhase, EditorSession, LoadError, LoadTicket, Selection};
pub use store::AnnotationStore;
