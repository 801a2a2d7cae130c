//! Overtype Render Library
//!
//! Page render coordination: per-page raster surfaces kept in sync with the
//! current zoom level and device pixel ratio, and generation-guarded
//! application of raster results so pixels from a superseded zoom or page
//! set never land on the live surfaces.

pub mod coordinator;
pub mod surface;

pub use coordinator::{RenderCoordinator, RenderRequest};
pub use surface::PageSurface;
