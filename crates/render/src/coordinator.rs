//! Page render coordination
//!
//! Owns one [`PageSurface`] per page and keeps their CSS/pixel sizes in sync
//! with the current zoom level and device pixel ratio. Raster work is issued
//! as stamped [`RenderRequest`]s; results are only applied while the stamp
//! still matches the live generation, so output from a superseded zoom or
//! page set is discarded instead of overwriting newer pixels. There is no
//! hard cancellation of rasterization - superseded jobs are allowed to
//! finish and their results dropped, with the token letting cooperative
//! workers stop early.

use crate::surface::PageSurface;
use overtype_engine::{
    DocumentHandle, EngineResult, PageDescriptor, PageRasterizer, RgbaImage, SurfaceDescriptor,
};
use overtype_scheduler::{CancellationToken, Epoch, Stamp};
use tracing::{debug, warn};

/// One unit of raster work, stamped with the generation it was issued under
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub page_index: u16,
    pub scale: f32,
    pub target: SurfaceDescriptor,
    stamp: Stamp,
    token: CancellationToken,
}

impl RenderRequest {
    /// Token a cooperative worker can poll to stop early once superseded
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Keeps page surfaces consistent with zoom, page set, and display density
pub struct RenderCoordinator {
    pages: Vec<PageDescriptor>,
    surfaces: Vec<PageSurface>,
    zoom: f32,
    device_pixel_ratio: f32,
    epoch: Epoch,
    inflight: Vec<CancellationToken>,
}

impl RenderCoordinator {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            surfaces: Vec::new(),
            zoom: 1.0,
            device_pixel_ratio: 1.0,
            epoch: Epoch::new(),
            inflight: Vec::new(),
        }
    }

    /// Replace the page set, invalidating all outstanding raster work
    pub fn set_pages(&mut self, pages: Vec<PageDescriptor>) {
        self.pages = pages;
        self.supersede();
        self.rebuild_surfaces();
    }

    /// Change the zoom level; no-op when unchanged
    ///
    /// Never touches annotation geometry - only surface sizes.
    pub fn set_zoom(&mut self, zoom: f32) {
        debug_assert!(zoom > 0.0);
        if zoom == self.zoom {
            return;
        }
        self.zoom = zoom;
        self.supersede();
        self.rebuild_surfaces();
    }

    /// Change the device pixel ratio (display moved/density changed)
    pub fn set_device_pixel_ratio(&mut self, device_pixel_ratio: f32) {
        debug_assert!(device_pixel_ratio > 0.0);
        if device_pixel_ratio == self.device_pixel_ratio {
            return;
        }
        self.device_pixel_ratio = device_pixel_ratio;
        self.supersede();
        self.rebuild_surfaces();
    }

    /// Emit one stamped request per page for the current generation
    pub fn plan(&mut self) -> Vec<RenderRequest> {
        let stamp = self.epoch.stamp();
        let mut requests = Vec::with_capacity(self.surfaces.len());

        for (index, surface) in self.surfaces.iter().enumerate() {
            let token = CancellationToken::new();
            self.inflight.push(token.clone());
            requests.push(RenderRequest {
                page_index: index as u16,
                scale: self.zoom,
                target: SurfaceDescriptor {
                    pixel_width: surface.pixel_width(),
                    pixel_height: surface.pixel_height(),
                },
                stamp,
                token,
            });
        }

        requests
    }

    /// Apply a raster result, discarding it when stale
    ///
    /// Returns true only when the pixels were installed on the surface.
    pub fn apply(&mut self, request: &RenderRequest, image: RgbaImage) -> bool {
        if !request.stamp.is_current(&self.epoch) {
            debug!(
                page = request.page_index,
                generation = request.stamp.generation(),
                "discarding stale render result"
            );
            return false;
        }

        let Some(surface) = self.surfaces.get_mut(request.page_index as usize) else {
            return false;
        };

        surface.install(image.into_raw())
    }

    /// Drive a rasterizer through a full plan/apply pass on this thread
    ///
    /// A page that fails to rasterize is logged and left as a placeholder
    /// surface; remaining pages are unaffected. Returns the number of pages
    /// whose pixels were installed.
    pub fn render_blocking<R: PageRasterizer>(
        &mut self,
        rasterizer: &R,
        handle: DocumentHandle,
    ) -> usize {
        let requests = self.plan();
        let mut applied = 0;

        for request in requests {
            if request.token.is_cancelled() {
                continue;
            }
            match self.execute(rasterizer, handle, &request) {
                Ok(image) => {
                    if self.apply(&request, image) {
                        applied += 1;
                    }
                }
                Err(err) => {
                    warn!(
                        page = request.page_index,
                        error = %err,
                        "page rasterization failed; leaving placeholder surface"
                    );
                }
            }
        }

        applied
    }

    fn execute<R: PageRasterizer>(
        &self,
        rasterizer: &R,
        handle: DocumentHandle,
        request: &RenderRequest,
    ) -> EngineResult<RgbaImage> {
        rasterizer.render_page(handle, request.page_index, request.scale, request.target)
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    pub fn page_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn surface(&self, page_index: u16) -> Option<&PageSurface> {
        self.surfaces.get(page_index as usize)
    }

    /// Advance the generation and cancel everything in flight
    fn supersede(&mut self) {
        self.epoch.advance();
        for token in self.inflight.drain(..) {
            token.cancel();
        }
    }

    fn rebuild_surfaces(&mut self) {
        self.surfaces = self
            .pages
            .iter()
            .map(|descriptor| {
                PageSurface::new(
                    descriptor.width * self.zoom,
                    descriptor.height * self.zoom,
                    self.device_pixel_ratio,
                )
            })
            .collect();
    }
}

impl Default for RenderCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overtype_engine::{EngineError, PageRasterizer};

    struct MockRasterizer {
        pages: Vec<PageDescriptor>,
        fail_page: Option<u16>,
    }

    impl MockRasterizer {
        fn new(pages: Vec<PageDescriptor>) -> Self {
            Self {
                pages,
                fail_page: None,
            }
        }
    }

    impl PageRasterizer for MockRasterizer {
        fn open_document(&mut self, _bytes: &[u8]) -> EngineResult<DocumentHandle> {
            Ok(DocumentHandle::from_raw(1))
        }

        fn page_count(&self, _handle: DocumentHandle) -> EngineResult<u16> {
            Ok(self.pages.len() as u16)
        }

        fn page_descriptor(
            &self,
            _handle: DocumentHandle,
            page_index: u16,
            scale: f32,
        ) -> EngineResult<PageDescriptor> {
            let page = self.pages[page_index as usize];
            Ok(PageDescriptor {
                width: page.width * scale,
                height: page.height * scale,
            })
        }

        fn render_page(
            &self,
            _handle: DocumentHandle,
            page_index: u16,
            _scale: f32,
            target: SurfaceDescriptor,
        ) -> EngineResult<RgbaImage> {
            if self.fail_page == Some(page_index) {
                return Err(EngineError::Backend("simulated raster failure".into()));
            }
            Ok(RgbaImage::from_pixel(
                target.pixel_width,
                target.pixel_height,
                image::Rgba([7, 7, 7, 255]),
            ))
        }

        fn close(&mut self, _handle: DocumentHandle) -> EngineResult<()> {
            Ok(())
        }
    }

    fn two_pages() -> Vec<PageDescriptor> {
        vec![
            PageDescriptor {
                width: 100.0,
                height: 200.0,
            },
            PageDescriptor {
                width: 100.0,
                height: 150.0,
            },
        ]
    }

    #[test]
    fn test_plan_emits_one_request_per_page() {
        let mut coordinator = RenderCoordinator::new();
        coordinator.set_device_pixel_ratio(2.0);
        coordinator.set_pages(two_pages());

        let requests = coordinator.plan();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].page_index, 0);
        assert_eq!(requests[0].target.pixel_width, 200);
        assert_eq!(requests[0].target.pixel_height, 400);
        assert_eq!(requests[1].target.pixel_height, 300);
    }

    #[test]
    fn test_apply_installs_pixels() {
        let mut coordinator = RenderCoordinator::new();
        coordinator.set_pages(two_pages());

        let requests = coordinator.plan();
        let image = RgbaImage::from_pixel(
            requests[0].target.pixel_width,
            requests[0].target.pixel_height,
            image::Rgba([7, 7, 7, 255]),
        );

        assert!(coordinator.apply(&requests[0], image));
        assert!(coordinator.surface(0).unwrap().is_rendered());
        assert!(!coordinator.surface(1).unwrap().is_rendered());
    }

    #[test]
    fn test_zoom_change_discards_stale_results() {
        let mut coordinator = RenderCoordinator::new();
        coordinator.set_pages(two_pages());

        let requests = coordinator.plan();
        coordinator.set_zoom(2.0);

        let image = RgbaImage::from_pixel(
            requests[0].target.pixel_width,
            requests[0].target.pixel_height,
            image::Rgba([7, 7, 7, 255]),
        );
        assert!(!coordinator.apply(&requests[0], image));
        assert!(!coordinator.surface(0).unwrap().is_rendered());
    }

    #[test]
    fn test_page_set_change_discards_stale_results() {
        let mut coordinator = RenderCoordinator::new();
        coordinator.set_pages(two_pages());
        let requests = coordinator.plan();

        coordinator.set_pages(vec![PageDescriptor {
            width: 50.0,
            height: 50.0,
        }]);

        let image = RgbaImage::from_pixel(
            requests[0].target.pixel_width,
            requests[0].target.pixel_height,
            image::Rgba([7, 7, 7, 255]),
        );
        assert!(!coordinator.apply(&requests[0], image));
    }

    #[test]
    fn test_supersede_cancels_inflight_tokens() {
        let mut coordinator = RenderCoordinator::new();
        coordinator.set_pages(two_pages());

        let requests = coordinator.plan();
        assert!(!requests[0].token().is_cancelled());

        coordinator.set_zoom(0.5);
        assert!(requests[0].token().is_cancelled());
        assert!(requests[1].token().is_cancelled());
    }

    #[test]
    fn test_zoom_resizes_surfaces() {
        let mut coordinator = RenderCoordinator::new();
        coordinator.set_pages(two_pages());
        coordinator.set_zoom(2.0);

        let surface = coordinator.surface(0).unwrap();
        assert_eq!(surface.css_width(), 200.0);
        assert_eq!(surface.css_height(), 400.0);
        assert_eq!(surface.pixel_width(), 200);
    }

    #[test]
    fn test_render_blocking_renders_all_pages() {
        let mut rasterizer = MockRasterizer::new(two_pages());
        let handle = rasterizer.open_document(&[]).unwrap();

        let mut coordinator = RenderCoordinator::new();
        coordinator.set_pages(two_pages());

        let applied = coordinator.render_blocking(&rasterizer, handle);
        assert_eq!(applied, 2);
        assert!(coordinator.surface(0).unwrap().is_rendered());
        assert!(coordinator.surface(1).unwrap().is_rendered());
    }

    #[test]
    fn test_failed_page_leaves_placeholder_and_others_render() {
        let mut rasterizer = MockRasterizer::new(two_pages());
        rasterizer.fail_page = Some(1);
        let handle = rasterizer.open_document(&[]).unwrap();

        let mut coordinator = RenderCoordinator::new();
        coordinator.set_pages(two_pages());

        let applied = coordinator.render_blocking(&rasterizer, handle);
        assert_eq!(applied, 1);
        assert!(coordinator.surface(0).unwrap().is_rendered());
        assert!(!coordinator.surface(1).unwrap().is_rendered());
    }

    #[test]
    fn test_unchanged_zoom_keeps_generation() {
        let mut coordinator = RenderCoordinator::new();
        coordinator.set_pages(two_pages());

        let requests = coordinator.plan();
        coordinator.set_zoom(1.0);

        let image = RgbaImage::from_pixel(
            requests[0].target.pixel_width,
            requests[0].target.pixel_height,
            image::Rgba([7, 7, 7, 255]),
        );
        assert!(coordinator.apply(&requests[0], image));
    }
}
