//! Per-page annotation store
//!
//! Maps page indices to their annotation collections. Every mutating
//! operation is pure with respect to the prior state: it returns a new store
//! value and leaves the receiver untouched, which is what lets the history
//! manager treat whole store states as units of undo. Operations are total -
//! an unknown id/page pair is a no-op (`None`), never an error, so the
//! interaction layer stays simple under out-of-order event delivery.

use crate::annotation::{AnnotationId, Placement, TextAnnotation};
use std::collections::HashMap;

/// Full annotation state for one loaded document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationStore {
    pages: HashMap<u16, Vec<TextAnnotation>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new annotation to a page
    ///
    /// Assigns a fresh id and fills unspecified fields from the placement
    /// defaults. Always succeeds.
    pub fn create(&self, page_index: u16, placement: Placement) -> (Self, TextAnnotation) {
        let annotation = TextAnnotation::new(page_index, placement);

        let mut next = self.clone();
        next.pages
            .entry(page_index)
            .or_default()
            .push(annotation.clone());

        (next, annotation)
    }

    /// Replace an annotation with the supplied record
    ///
    /// Full-record replace, not a partial merge: callers supply the complete
    /// desired record. The stored `id` and `page_index` are kept regardless
    /// of what the record carries - both are immutable after creation.
    /// Returns `None` when the id is not present on that page.
    pub fn update(
        &self,
        id: AnnotationId,
        page_index: u16,
        record: TextAnnotation,
    ) -> Option<Self> {
        let position = self
            .pages
            .get(&page_index)?
            .iter()
            .position(|annotation| annotation.id == id)?;

        let mut next = self.clone();
        let slot = &mut next.pages.get_mut(&page_index).expect("page exists")[position];
        *slot = TextAnnotation {
            id,
            page_index,
            ..record
        };

        Some(next)
    }

    /// Remove an annotation; `None` when the id is not present on that page
    pub fn remove(&self, id: AnnotationId, page_index: u16) -> Option<Self> {
        let page = self.pages.get(&page_index)?;
        if !page.iter().any(|annotation| annotation.id == id) {
            return None;
        }

        let mut next = self.clone();
        let page = next.pages.get_mut(&page_index).expect("page exists");
        page.retain(|annotation| annotation.id != id);
        if page.is_empty() {
            next.pages.remove(&page_index);
        }

        Some(next)
    }

    /// Look up an annotation by id and page
    pub fn get(&self, id: AnnotationId, page_index: u16) -> Option<&TextAnnotation> {
        self.pages
            .get(&page_index)?
            .iter()
            .find(|annotation| annotation.id == id)
    }

    /// All annotations on a page, in placement order
    pub fn page(&self, page_index: u16) -> &[TextAnnotation] {
        self.pages
            .get(&page_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Page indices that carry at least one annotation, ascending
    pub fn pages_with_annotations(&self) -> Vec<u16> {
        let mut pages: Vec<u16> = self.pages.keys().copied().collect();
        pages.sort_unstable();
        pages
    }

    /// Total annotation count across all pages
    pub fn annotation_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Take a fully independent deep copy for the history stacks
    ///
    /// This is the named snapshot operation the history manager relies on:
    /// the returned store shares no mutable state with the receiver, so
    /// later edits to the live store can never retroactively alter a pushed
    /// snapshot.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}
