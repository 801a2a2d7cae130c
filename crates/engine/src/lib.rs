//! Overtype Engine Library
//!
//! Contracts for the two external document collaborators the editor core
//! consumes: a [`PageRasterizer`] that turns pages into pixels for display,
//! and a [`DocumentEditor`] that draws committed text into the document and
//! serializes the result.
//!
//! The default backend implements both contracts on `lopdf`. An optional
//! `pdfium` feature provides a PDFium-bound engine for full-fidelity
//! rasterization.

use image::{ImageBuffer, Rgba};

mod backend;

pub use backend::LopdfEngine;

#[cfg(feature = "pdfium")]
pub use backend::pdfium_backend::PdfiumEngine;

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Raster pixels per document point at scale 1.0
///
/// The authoring grid matches the display renderer's unit grid: CSS pixels,
/// where one point is 96/72 of a pixel. Page descriptors and raster sizes
/// are expressed in this grid; export converts back with the inverse ratio.
pub const RASTER_PIXELS_PER_POINT: f32 = 96.0 / 72.0;

/// Opaque handle to a document opened for rasterization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(pub(crate) u64);

impl DocumentHandle {
    /// Mint a handle from a raw value (for rasterizer implementations)
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque handle to a document opened for editing/export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditHandle(pub(crate) u64);

impl EditHandle {
    /// Mint a handle from a raw value (for editor implementations)
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque reference to a font embedded in an edit session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontRef(pub(crate) usize);

impl FontRef {
    /// Mint a font reference from a raw index (for editor implementations)
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> usize {
        self.0
    }
}

/// Intrinsic page size in document points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Page dimensions in the raster grid at a given scale
///
/// At scale 1.0 this is the authoring grid the editor stores annotation
/// geometry in; it never changes for the lifetime of a loaded document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDescriptor {
    pub width: f32,
    pub height: f32,
}

/// Pixel dimensions of the surface a page should be rasterized into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// One text draw command in export-unit space
///
/// `x` and `y` are the text position in document points with a bottom-left
/// origin; `y` is the baseline computed by the export coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawTextCommand {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub font: FontRef,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u16, page_count: u16 },
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("font reference does not belong to this edit session")]
    InvalidFont,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Collaborator contract: page rasterization for display
///
/// `open_document` fails on malformed input; everything after operates on the
/// returned handle. Scale 1.0 descriptors define the authoring grid.
pub trait PageRasterizer {
    fn open_document(&mut self, bytes: &[u8]) -> EngineResult<DocumentHandle>;
    fn page_count(&self, handle: DocumentHandle) -> EngineResult<u16>;
    fn page_descriptor(
        &self,
        handle: DocumentHandle,
        page_index: u16,
        scale: f32,
    ) -> EngineResult<PageDescriptor>;
    fn render_page(
        &self,
        handle: DocumentHandle,
        page_index: u16,
        scale: f32,
        target: SurfaceDescriptor,
    ) -> EngineResult<RgbaImage>;
    fn close(&mut self, handle: DocumentHandle) -> EngineResult<()>;
}

/// Collaborator contract: document mutation and export
///
/// Draw commands are positioned in the document's native bottom-left-origin
/// point grid. `serialize` produces the final output bytes; it does not
/// consume the handle, so a failed serialize can be retried.
pub trait DocumentEditor {
    fn open_for_edit(&mut self, bytes: &[u8]) -> EngineResult<EditHandle>;
    fn embed_fallback_font(&mut self, handle: EditHandle) -> EngineResult<FontRef>;
    fn page_height(&self, handle: EditHandle, page_index: u16) -> EngineResult<f32>;
    fn draw_text(
        &mut self,
        handle: EditHandle,
        page_index: u16,
        command: DrawTextCommand,
    ) -> EngineResult<()>;
    fn serialize(&mut self, handle: EditHandle) -> EngineResult<Vec<u8>>;
}
