//! Coordinate space conversions
//!
//! Three unit grids flow through the editor:
//!
//! - **Authoring space**: the page's natural unit grid at zoom 1, in which
//!   all annotation geometry is stored. Independent of the current view.
//! - **Display space**: authoring space scaled by the current zoom factor;
//!   the grid pointer events arrive in.
//! - **Export space**: the document's native point grid with a bottom-left
//!   origin, used only when committing annotations into the output file.
//!
//! All functions here are stateless and deterministic. Zoom must be positive;
//! callers clamp to [`MIN_ZOOM`]..=[`MAX_ZOOM`] before converting - the
//! converter itself never clamps.

/// Lower zoom bound enforced by callers
pub const MIN_ZOOM: f32 = 0.25;

/// Upper zoom bound enforced by callers
pub const MAX_ZOOM: f32 = 4.0;

/// Zoom increment for stepwise zoom controls
pub const ZOOM_STEP: f32 = 0.1;

/// Export units (points) per authoring pixel: 72/96
pub const EXPORT_UNITS_PER_PIXEL: f32 = 72.0 / 96.0;

/// Authoring value to display value at the given zoom
pub fn to_display(value: f32, zoom: f32) -> f32 {
    value * zoom
}

/// Display value back to authoring value at the given zoom
pub fn to_authoring(value: f32, zoom: f32) -> f32 {
    value / zoom
}

/// Authoring value to export units (one-directional; export is terminal)
pub fn to_export_units(value: f32) -> f32 {
    value * EXPORT_UNITS_PER_PIXEL
}

/// Baseline for exported text, flipped to the bottom-left origin
///
/// `page_height` is the page's total height in export units; `y` and
/// `font_size` are authoring values. The flip subtracts the font size, not
/// the box height: the baseline sits one em below the annotation's top edge,
/// matching how the overlay renders the first text line.
pub fn export_baseline(page_height: f32, y: f32, font_size: f32) -> f32 {
    page_height - to_export_units(y) - to_export_units(font_size)
}

/// Clamp a requested zoom factor to the supported range
pub fn clamp_zoom(zoom: f32) -> f32 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Step the zoom by a delta, rounding to two decimals to keep repeated
/// steps from accumulating float noise
pub fn step_zoom(zoom: f32, delta: f32) -> f32 {
    clamp_zoom(((zoom + delta) * 100.0).round() / 100.0)
}
