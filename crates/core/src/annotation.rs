//! Text annotation data model
//!
//! An annotation is one floating text element placed over a rendered page.
//! Geometry lives in authoring space (the page's unit grid at zoom 1) so it
//! survives any number of zoom changes untouched; display and export
//! positions are derived on demand through the unit converter.

use crate::units;
use uuid::Uuid;

/// Unique identifier for an annotation
///
/// Assigned at creation and immutable. Generated with UUID v4, so ids are
/// globally unique by construction rather than by per-page scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationId(Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Default annotation box width in authoring units
pub const DEFAULT_BOX_WIDTH: f32 = 160.0;

/// Default annotation box height in authoring units
pub const DEFAULT_BOX_HEIGHT: f32 = 28.0;

/// Default font size in authoring units
pub const DEFAULT_FONT_SIZE: f32 = 14.0;

/// Placeholder content for a freshly placed annotation
pub const DEFAULT_TEXT: &str = "Text";

/// Display-only face name; export always substitutes the fallback face
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";

/// Caller-supplied geometry and content for a new annotation
///
/// Anything left at its default is filled from the constants above; the
/// store assigns the id and page.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub text: String,
    pub font_size: f32,
    pub font_family: String,
}

impl Placement {
    /// Default-sized annotation at an exact authoring position
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x: x.max(0.0),
            y: y.max(0.0),
            ..Self::default()
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: DEFAULT_BOX_WIDTH,
            h: DEFAULT_BOX_HEIGHT,
            text: DEFAULT_TEXT.to_owned(),
            font_size: DEFAULT_FONT_SIZE,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
        }
    }
}

/// One placed text element
///
/// `id` and `page_index` are immutable after creation (annotations never
/// move across pages). Empty `text` is valid transiently; the interaction
/// layer removes the annotation on a backspace-while-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TextAnnotation {
    pub id: AnnotationId,
    pub page_index: u16,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub text: String,
    pub font_size: f32,
    pub font_family: String,
}

impl TextAnnotation {
    /// Create an annotation from a placement, assigning a fresh id
    pub fn new(page_index: u16, placement: Placement) -> Self {
        Self {
            id: AnnotationId::new(),
            page_index,
            x: placement.x,
            y: placement.y,
            w: placement.w,
            h: placement.h,
            text: placement.text,
            font_size: placement.font_size,
            font_family: placement.font_family,
        }
    }

    /// Whether a display-space point falls inside this annotation's box
    pub fn hit_test(&self, display_x: f32, display_y: f32, zoom: f32) -> bool {
        let left = units::to_display(self.x, zoom);
        let top = units::to_display(self.y, zoom);
        let right = left + units::to_display(self.w, zoom);
        let bottom = top + units::to_display(self.h, zoom);

        display_x >= left && display_x <= right && display_y >= top && display_y <= bottom
    }
}
