//! Editor session state
//!
//! One session owns everything that must live and die together: the
//! annotation store, the undo/redo history, the current selection, the page
//! descriptors, and the zoom factor. All mutations flow through `&mut self`
//! methods, so the record-then-mutate pair behind every undoable operation
//! is atomic with respect to any other mutation.
//!
//! Loading is split into begin/finish so the parse can happen out of band:
//! `begin_load` advances the session's epoch and hands out a stamped ticket,
//! and a completion carrying a stale ticket (a superseded load) is ignored.
//! Store, history, and selection are reset together inside `finish_load`,
//! never independently.

use crate::annotation::{AnnotationId, Placement, TextAnnotation};
use crate::history::History;
use crate::intake::IncomingDocument;
use crate::store::AnnotationStore;
use crate::units;
use overtype_engine::{DocumentHandle, EngineError, PageDescriptor, PageRasterizer};
use overtype_scheduler::{Epoch, Stamp};
use tracing::debug;

/// The currently focused annotation, if any
///
/// Not part of history state: undo/redo always clears the selection instead
/// of restoring it, because the selected id may not exist in the restored
/// snapshot. The clear happens even when there is nothing to undo/redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub id: AnnotationId,
    pub page_index: u16,
}

/// Document lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentPhase {
    /// No document loaded
    NoDocument,

    /// A load is in flight; editing is rejected
    Loading,

    /// Page descriptors are available, editing enabled
    Ready,
}

/// Stamped proof that a load completion belongs to the latest load request
#[derive(Debug, Clone, Copy)]
pub struct LoadTicket {
    stamp: Stamp,
}

/// Errors surfaced when opening a document
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load document: {0}")]
    Parse(#[from] EngineError),
}

/// In-progress drag, kept so one gesture lands as one history entry
#[derive(Debug)]
struct MoveGesture {
    id: AnnotationId,
    page_index: u16,
    before: AnnotationStore,
    moved: bool,
}

/// Owner of all per-document editing state
pub struct EditorSession {
    phase: DocumentPhase,
    file_name: Option<String>,
    pages: Vec<PageDescriptor>,
    store: AnnotationStore,
    history: History,
    selection: Option<Selection>,
    zoom: f32,
    epoch: Epoch,
    drag: Option<MoveGesture>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            phase: DocumentPhase::NoDocument,
            file_name: None,
            pages: Vec::new(),
            store: AnnotationStore::new(),
            history: History::new(),
            selection: None,
            zoom: 1.0,
            epoch: Epoch::new(),
            drag: None,
        }
    }

    // ---- document lifecycle ------------------------------------------------

    /// Start a load, invalidating any load still in flight
    pub fn begin_load(&mut self) -> LoadTicket {
        self.epoch.advance();
        self.phase = DocumentPhase::Loading;
        LoadTicket {
            stamp: self.epoch.stamp(),
        }
    }

    /// Install a completed load
    ///
    /// Ignored (returns false) when the ticket was superseded by a newer
    /// `begin_load`. On success the store, history, and selection are reset
    /// together and the session becomes `Ready` at zoom 1.
    pub fn finish_load(
        &mut self,
        ticket: &LoadTicket,
        file_name: String,
        pages: Vec<PageDescriptor>,
    ) -> bool {
        if !ticket.stamp.is_current(&self.epoch) {
            debug!(file = %file_name, "discarding stale load completion");
            return false;
        }

        debug!(file = %file_name, pages = pages.len(), "document ready");
        self.store = AnnotationStore::new();
        self.history.clear();
        self.selection = None;
        self.drag = None;
        self.pages = pages;
        self.file_name = Some(file_name);
        self.zoom = 1.0;
        self.phase = DocumentPhase::Ready;
        true
    }

    /// Record a failed load, resetting to the no-document state
    pub fn fail_load(&mut self, ticket: &LoadTicket) -> bool {
        if !ticket.stamp.is_current(&self.epoch) {
            return false;
        }

        self.store = AnnotationStore::new();
        self.history.clear();
        self.selection = None;
        self.drag = None;
        self.pages.clear();
        self.file_name = None;
        self.zoom = 1.0;
        self.phase = DocumentPhase::NoDocument;
        true
    }

    /// Open a validated document through a rasterizer
    ///
    /// Drives the begin/finish ticket flow on the caller's thread: queries
    /// the page count and each page's scale-1 descriptor (the authoring
    /// grid), then installs them. On a parse failure the session is reset to
    /// the no-document state and the error surfaced.
    pub fn open_document<R: PageRasterizer>(
        &mut self,
        rasterizer: &mut R,
        incoming: &IncomingDocument,
    ) -> Result<DocumentHandle, LoadError> {
        let ticket = self.begin_load();

        match Self::describe(rasterizer, &incoming.bytes) {
            Ok((handle, descriptors)) => {
                self.finish_load(&ticket, incoming.file_name.clone(), descriptors);
                Ok(handle)
            }
            Err(err) => {
                self.fail_load(&ticket);
                Err(LoadError::Parse(err))
            }
        }
    }

    fn describe<R: PageRasterizer>(
        rasterizer: &mut R,
        bytes: &[u8],
    ) -> Result<(DocumentHandle, Vec<PageDescriptor>), EngineError> {
        let handle = rasterizer.open_document(bytes)?;
        let count = rasterizer.page_count(handle)?;

        let mut descriptors = Vec::with_capacity(count as usize);
        for page in 0..count {
            descriptors.push(rasterizer.page_descriptor(handle, page, 1.0)?);
        }

        Ok((handle, descriptors))
    }

    // ---- annotation mutations ----------------------------------------------

    /// Create an annotation on a page and select it
    ///
    /// Rejected while no document is ready or for pages without descriptors.
    pub fn place(&mut self, page_index: u16, placement: Placement) -> Option<TextAnnotation> {
        if !self.can_edit_page(page_index) {
            return None;
        }

        let before = self.store.snapshot();
        let (next, created) = self.store.create(page_index, placement);
        self.history.record(before);
        self.store = next;
        self.selection = Some(Selection {
            id: created.id,
            page_index,
        });

        Some(created)
    }

    /// Replace an annotation with a complete record
    ///
    /// Returns false (and records no history) when the id is unknown.
    pub fn replace(&mut self, id: AnnotationId, page_index: u16, record: TextAnnotation) -> bool {
        if !self.can_edit_page(page_index) {
            return false;
        }

        let before = self.store.snapshot();
        match self.store.update(id, page_index, record) {
            Some(next) => {
                self.history.record(before);
                self.store = next;
                true
            }
            None => false,
        }
    }

    /// Update an annotation's text, keeping every other field
    pub fn set_text(&mut self, id: AnnotationId, page_index: u16, text: &str) -> bool {
        let Some(existing) = self.store.get(id, page_index).cloned() else {
            return false;
        };

        let mut record = existing;
        record.text = text.to_owned();
        self.replace(id, page_index, record)
    }

    /// Remove an annotation and clear the selection
    pub fn delete(&mut self, id: AnnotationId, page_index: u16) -> bool {
        if !self.can_edit_page(page_index) {
            return false;
        }

        let before = self.store.snapshot();
        match self.store.remove(id, page_index) {
            Some(next) => {
                self.history.record(before);
                self.store = next;
                self.selection = None;
                true
            }
            None => false,
        }
    }

    // ---- drag gestures -----------------------------------------------------

    /// Start moving an annotation; selects it
    ///
    /// The pre-drag store state is captured now and recorded as a single
    /// history entry when the gesture ends, so one drag is one undo step
    /// even though every intermediate position is applied to the store.
    pub fn begin_move(&mut self, id: AnnotationId, page_index: u16) -> bool {
        if !self.can_edit_page(page_index) || self.store.get(id, page_index).is_none() {
            return false;
        }

        self.drag = Some(MoveGesture {
            id,
            page_index,
            before: self.store.snapshot(),
            moved: false,
        });
        self.selection = Some(Selection { id, page_index });
        true
    }

    /// Apply an intermediate drag position in authoring units
    ///
    /// Coordinates are clamped so the annotation never leaves the page's
    /// non-negative quadrant.
    pub fn move_to(&mut self, x: f32, y: f32) -> bool {
        let (id, page_index) = match &self.drag {
            Some(gesture) => (gesture.id, gesture.page_index),
            None => return false,
        };
        let Some(existing) = self.store.get(id, page_index).cloned() else {
            return false;
        };

        let mut record = existing;
        record.x = x.max(0.0);
        record.y = y.max(0.0);

        match self.store.update(id, page_index, record) {
            Some(next) => {
                self.store = next;
                if let Some(gesture) = self.drag.as_mut() {
                    gesture.moved = true;
                }
                true
            }
            None => false,
        }
    }

    /// Finish the gesture, recording it as one history entry if it moved
    pub fn end_move(&mut self) -> bool {
        match self.drag.take() {
            Some(gesture) if gesture.moved => {
                self.history.record(gesture.before);
                true
            }
            _ => false,
        }
    }

    // ---- selection ---------------------------------------------------------

    pub fn select(&mut self, id: AnnotationId, page_index: u16) -> bool {
        if !self.can_edit_page(page_index) || self.store.get(id, page_index).is_none() {
            return false;
        }
        self.selection = Some(Selection { id, page_index });
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // ---- history -----------------------------------------------------------

    /// Undo the most recent mutation
    ///
    /// The selection is cleared even when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.selection = None;
        match self.history.undo(&self.store) {
            Some(state) => {
                self.store = state;
                true
            }
            None => false,
        }
    }

    /// Redo the most recently undone mutation; clears selection regardless
    pub fn redo(&mut self) -> bool {
        self.selection = None;
        match self.history.redo(&self.store) {
            Some(state) => {
                self.store = state;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ---- zoom --------------------------------------------------------------

    /// Zoom in one step; annotation geometry is untouched
    pub fn zoom_in(&mut self) -> f32 {
        self.zoom = units::step_zoom(self.zoom, units::ZOOM_STEP);
        self.zoom
    }

    /// Zoom out one step
    pub fn zoom_out(&mut self) -> f32 {
        self.zoom = units::step_zoom(self.zoom, -units::ZOOM_STEP);
        self.zoom
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = units::clamp_zoom(zoom);
    }

    // ---- accessors ---------------------------------------------------------

    pub fn phase(&self) -> DocumentPhase {
        self.phase
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn pages(&self) -> &[PageDescriptor] {
        &self.pages
    }

    pub fn page_count(&self) -> u16 {
        self.pages.len() as u16
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    fn can_edit_page(&self, page_index: u16) -> bool {
        self.phase == DocumentPhase::Ready && (page_index as usize) < self.pages.len()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}
