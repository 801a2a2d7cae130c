//! Pointer and keyboard event mapping
//!
//! Translates page-relative pointer events (display space) and text-editing
//! events into session operations. All conversion to authoring space happens
//! here, before the store is touched; the store itself never sees a
//! zoom-dependent coordinate.

use crate::annotation::{AnnotationId, Placement, TextAnnotation};
use crate::session::{EditorSession, Selection};
use crate::units;

/// Horizontal offset from the click point to the new box's left edge,
/// in authoring units
const PLACE_OFFSET_X: f32 = 40.0;

/// Vertical offset from the click point to the new box's top edge
const PLACE_OFFSET_Y: f32 = 10.0;

/// A page-relative pointer position in display space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePoint {
    pub page_index: u16,
    pub x: f32,
    pub y: f32,
}

/// What a pointer-down resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum PointerOutcome {
    /// Empty page area: a new annotation was placed and selected
    Placed(TextAnnotation),

    /// An existing annotation was selected (and a drag begun)
    Selected(Selection),

    /// Nothing happened (no document ready, page not described)
    Ignored,
}

/// Display-space grab offset for an active drag
#[derive(Debug, Clone, Copy)]
struct PointerDrag {
    grab_dx: f32,
    grab_dy: f32,
}

/// Stateful event translator for one editing surface
#[derive(Debug, Default)]
pub struct InteractionLayer {
    drag: Option<PointerDrag>,
}

impl InteractionLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary button press on a page
    ///
    /// A press on an existing annotation selects it and starts a drag; a
    /// press on empty page area clears the selection and places a new
    /// default annotation near the press point. Selecting never also places.
    pub fn pointer_down(&mut self, session: &mut EditorSession, point: PagePoint) -> PointerOutcome {
        let zoom = session.zoom();

        let hit = session
            .store()
            .page(point.page_index)
            .iter()
            .rev()
            .find(|annotation| annotation.hit_test(point.x, point.y, zoom))
            .map(|annotation| (annotation.id, annotation.x, annotation.y));

        if let Some((id, x, y)) = hit {
            if !session.begin_move(id, point.page_index) {
                return PointerOutcome::Ignored;
            }
            self.drag = Some(PointerDrag {
                grab_dx: point.x - units::to_display(x, zoom),
                grab_dy: point.y - units::to_display(y, zoom),
            });
            return PointerOutcome::Selected(Selection {
                id,
                page_index: point.page_index,
            });
        }

        session.clear_selection();

        let placement = Placement::at(
            units::to_authoring(point.x, zoom) - PLACE_OFFSET_X,
            units::to_authoring(point.y, zoom) - PLACE_OFFSET_Y,
        );
        match session.place(point.page_index, placement) {
            Some(annotation) => PointerOutcome::Placed(annotation),
            None => PointerOutcome::Ignored,
        }
    }

    /// Pointer movement while the button is held
    ///
    /// Converts the display-space position through the grab offset and the
    /// current zoom into an authoring-space target; the session clamps it
    /// non-negative. Every step updates the store; the whole gesture still
    /// lands as a single history entry on release.
    pub fn pointer_move(&mut self, session: &mut EditorSession, point: PagePoint) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };

        let zoom = session.zoom();
        session.move_to(
            units::to_authoring(point.x - drag.grab_dx, zoom),
            units::to_authoring(point.y - drag.grab_dy, zoom),
        )
    }

    /// Primary button release: ends any active drag
    pub fn pointer_up(&mut self, session: &mut EditorSession) {
        self.drag = None;
        session.end_move();
    }

    /// In-place text edit: replace the annotation's content
    pub fn text_changed(
        &self,
        session: &mut EditorSession,
        id: AnnotationId,
        page_index: u16,
        text: &str,
    ) -> bool {
        session.set_text(id, page_index, text)
    }

    /// Backspace pressed inside an annotation
    ///
    /// Only removes the annotation when its content is already empty; a
    /// backspace that still has characters to delete is the text widget's
    /// business and leaves the store alone.
    pub fn backspace_pressed(
        &self,
        session: &mut EditorSession,
        id: AnnotationId,
        page_index: u16,
    ) -> bool {
        let Some(annotation) = session.store().get(id, page_index) else {
            return false;
        };
        if !annotation.text.is_empty() {
            return false;
        }

        session.delete(id, page_index)
    }

    /// Explicit delete control on the selected annotation
    pub fn delete_requested(
        &self,
        session: &mut EditorSession,
        id: AnnotationId,
        page_index: u16,
    ) -> bool {
        session.delete(id, page_index)
    }

    /// Whether a drag gesture is currently active
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::IncomingDocument;
    use overtype_engine::{
        DocumentHandle, EngineResult, PageDescriptor, PageRasterizer, RgbaImage, SurfaceDescriptor,
    };

    struct StubRasterizer {
        page_count: u16,
    }

    impl PageRasterizer for StubRasterizer {
        fn open_document(&mut self, _bytes: &[u8]) -> EngineResult<DocumentHandle> {
            Ok(DocumentHandle::from_raw(1))
        }

        fn page_count(&self, _handle: DocumentHandle) -> EngineResult<u16> {
            Ok(self.page_count)
        }

        fn page_descriptor(
            &self,
            _handle: DocumentHandle,
            _page_index: u16,
            scale: f32,
        ) -> EngineResult<PageDescriptor> {
            Ok(PageDescriptor {
                width: 816.0 * scale,
                height: 1056.0 * scale,
            })
        }

        fn render_page(
            &self,
            _handle: DocumentHandle,
            _page_index: u16,
            _scale: f32,
            target: SurfaceDescriptor,
        ) -> EngineResult<RgbaImage> {
            Ok(RgbaImage::new(target.pixel_width, target.pixel_height))
        }

        fn close(&mut self, _handle: DocumentHandle) -> EngineResult<()> {
            Ok(())
        }
    }

    fn ready_session(pages: u16) -> EditorSession {
        let mut session = EditorSession::new();
        let mut rasterizer = StubRasterizer { page_count: pages };
        let incoming = IncomingDocument {
            file_name: "notes.pdf".to_owned(),
            bytes: b"%PDF-1.5 stub".to_vec(),
        };
        session.open_document(&mut rasterizer, &incoming).unwrap();
        session
    }

    #[test]
    fn test_click_on_empty_area_places_with_offsets() {
        let mut session = ready_session(1);
        let mut layer = InteractionLayer::new();

        let outcome = layer.pointer_down(
            &mut session,
            PagePoint {
                page_index: 0,
                x: 200.0,
                y: 100.0,
            },
        );

        let PointerOutcome::Placed(annotation) = outcome else {
            panic!("expected a placement, got {:?}", outcome);
        };
        assert_eq!(annotation.x, 160.0);
        assert_eq!(annotation.y, 90.0);
        assert_eq!(annotation.text, "Text");
        assert!(session.selection().is_some());
    }

    #[test]
    fn test_placement_offsets_clamp_at_page_edge() {
        let mut session = ready_session(1);
        let mut layer = InteractionLayer::new();

        let outcome = layer.pointer_down(
            &mut session,
            PagePoint {
                page_index: 0,
                x: 5.0,
                y: 2.0,
            },
        );

        let PointerOutcome::Placed(annotation) = outcome else {
            panic!("expected a placement");
        };
        assert_eq!(annotation.x, 0.0);
        assert_eq!(annotation.y, 0.0);
    }

    #[test]
    fn test_placement_converts_through_zoom() {
        let mut session = ready_session(1);
        session.set_zoom(2.0);
        let mut layer = InteractionLayer::new();

        let outcome = layer.pointer_down(
            &mut session,
            PagePoint {
                page_index: 0,
                x: 200.0,
                y: 100.0,
            },
        );

        let PointerOutcome::Placed(annotation) = outcome else {
            panic!("expected a placement");
        };
        // Display 200,100 at zoom 2 is authoring 100,50, minus the offsets
        assert_eq!(annotation.x, 60.0);
        assert_eq!(annotation.y, 40.0);
    }

    #[test]
    fn test_click_on_annotation_selects_without_placing() {
        let mut session = ready_session(1);
        let mut layer = InteractionLayer::new();

        let placed = session.place(0, Placement::at(100.0, 100.0)).unwrap();
        let count_before = session.store().annotation_count();

        let outcome = layer.pointer_down(
            &mut session,
            PagePoint {
                page_index: 0,
                x: 110.0,
                y: 105.0,
            },
        );

        assert_eq!(
            outcome,
            PointerOutcome::Selected(Selection {
                id: placed.id,
                page_index: 0
            })
        );
        assert_eq!(session.store().annotation_count(), count_before);
        assert!(layer.is_dragging());
        layer.pointer_up(&mut session);
    }

    #[test]
    fn test_click_before_document_ready_is_ignored() {
        let mut session = EditorSession::new();
        let mut layer = InteractionLayer::new();

        let outcome = layer.pointer_down(
            &mut session,
            PagePoint {
                page_index: 0,
                x: 50.0,
                y: 50.0,
            },
        );
        assert_eq!(outcome, PointerOutcome::Ignored);
    }

    #[test]
    fn test_click_on_undescribed_page_is_ignored() {
        let mut session = ready_session(1);
        let mut layer = InteractionLayer::new();

        let outcome = layer.pointer_down(
            &mut session,
            PagePoint {
                page_index: 3,
                x: 50.0,
                y: 50.0,
            },
        );
        assert_eq!(outcome, PointerOutcome::Ignored);
    }

    #[test]
    fn test_drag_applies_display_delta_divided_by_zoom() {
        let mut session = ready_session(1);
        session.set_zoom(2.0);
        let mut layer = InteractionLayer::new();

        let placed = session.place(0, Placement::at(100.0, 100.0)).unwrap();

        // Grab the annotation at display 210,210 (authoring 105,105)
        layer.pointer_down(
            &mut session,
            PagePoint {
                page_index: 0,
                x: 210.0,
                y: 210.0,
            },
        );
        // Move 40 display units right, 20 down: 20 and 10 authoring units
        assert!(layer.pointer_move(
            &mut session,
            PagePoint {
                page_index: 0,
                x: 250.0,
                y: 230.0,
            },
        ));
        layer.pointer_up(&mut session);

        let moved = session.store().get(placed.id, 0).unwrap();
        assert_eq!((moved.x, moved.y), (120.0, 110.0));
        assert!(!layer.is_dragging());
    }

    #[test]
    fn test_drag_clamps_at_origin() {
        let mut session = ready_session(1);
        let mut layer = InteractionLayer::new();

        let placed = session.place(0, Placement::at(10.0, 10.0)).unwrap();

        layer.pointer_down(
            &mut session,
            PagePoint {
                page_index: 0,
                x: 15.0,
                y: 15.0,
            },
        );
        layer.pointer_move(
            &mut session,
            PagePoint {
                page_index: 0,
                x: -100.0,
                y: -100.0,
            },
        );
        layer.pointer_up(&mut session);

        let moved = session.store().get(placed.id, 0).unwrap();
        assert_eq!((moved.x, moved.y), (0.0, 0.0));
    }

    #[test]
    fn test_move_without_drag_is_noop() {
        let mut session = ready_session(1);
        let mut layer = InteractionLayer::new();
        session.place(0, Placement::default()).unwrap();

        assert!(!layer.pointer_move(
            &mut session,
            PagePoint {
                page_index: 0,
                x: 50.0,
                y: 50.0,
            },
        ));
    }

    #[test]
    fn test_text_changed_updates_content_only() {
        let mut session = ready_session(1);
        let layer = InteractionLayer::new();
        let placed = session.place(0, Placement::at(25.0, 35.0)).unwrap();

        assert!(layer.text_changed(&mut session, placed.id, 0, "updated body"));

        let stored = session.store().get(placed.id, 0).unwrap();
        assert_eq!(stored.text, "updated body");
        assert_eq!((stored.x, stored.y), (25.0, 35.0));
    }

    #[test]
    fn test_backspace_on_empty_deletes() {
        let mut session = ready_session(1);
        let layer = InteractionLayer::new();
        let placed = session.place(0, Placement::default()).unwrap();

        layer.text_changed(&mut session, placed.id, 0, "");
        assert!(layer.backspace_pressed(&mut session, placed.id, 0));
        assert!(session.store().is_empty());
        assert!(session.selection().is_none());
    }

    #[test]
    fn test_backspace_with_content_keeps_annotation() {
        let mut session = ready_session(1);
        let layer = InteractionLayer::new();
        let placed = session.place(0, Placement::default()).unwrap();

        assert!(!layer.backspace_pressed(&mut session, placed.id, 0));
        assert_eq!(session.store().annotation_count(), 1);
    }

    #[test]
    fn test_delete_control_removes_annotation() {
        let mut session = ready_session(1);
        let layer = InteractionLayer::new();
        let placed = session.place(0, Placement::default()).unwrap();

        assert!(layer.delete_requested(&mut session, placed.id, 0));
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_topmost_annotation_wins_overlapping_hit() {
        let mut session = ready_session(1);
        let mut layer = InteractionLayer::new();

        let _lower = session.place(0, Placement::at(50.0, 50.0)).unwrap();
        let upper = session.place(0, Placement::at(60.0, 60.0)).unwrap();

        let outcome = layer.pointer_down(
            &mut session,
            PagePoint {
                page_index: 0,
                x: 70.0,
                y: 65.0,
            },
        );

        assert_eq!(
            outcome,
            PointerOutcome::Selected(Selection {
                id: upper.id,
                page_index: 0
            })
        );
        layer.pointer_up(&mut session);
    }
}
