//! Render-time view state: zoom, rotation, page navigation, load lifecycle
//!
//! Two renderer variants share one external contract: a load phase that goes
//! from `Loading` to `Ready` or a terminal `Failed`, and a view transform the
//! front end realizes as CSS. Stored document coordinates are never rescaled
//! by the transform.

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 5.0;
pub const ZOOM_STEP: f64 = 0.25;

/// Horizontal padding subtracted from the container when fitting to width.
pub const FIT_MARGIN: f64 = 40.0;

/// Intrinsic page width assumed when none is reported (A4, in points).
pub const DEFAULT_PAGE_WIDTH: f64 = 595.0;

/// Zoom and rotation applied at render time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    scale: f64,
    rotation_degrees: u16,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation_degrees: 0,
        }
    }
}

impl ViewTransform {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn rotation_degrees(&self) -> u16 {
        self.rotation_degrees
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - ZOOM_STEP);
    }

    pub fn reset_zoom(&mut self) {
        self.scale = 1.0;
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Scale the page to the container width, less a fixed margin, clamped to
    /// the regular zoom bounds.
    pub fn fit_to_width(&mut self, container_width: f64, page_width: f64) {
        let page = if page_width > 0.0 {
            page_width
        } else {
            DEFAULT_PAGE_WIDTH
        };
        self.set_scale((container_width - FIT_MARGIN) / page);
    }

    /// Rotate by a quarter turn, wrapping modulo 360.
    pub fn rotate_clockwise(&mut self) {
        self.rotation_degrees = (self.rotation_degrees + 90) % 360;
    }

    /// CSS transform realizing this view state on the rendered surface.
    pub fn css_transform(&self) -> String {
        format!("scale({}) rotate({}deg)", self.scale, self.rotation_degrees)
    }
}

/// Load lifecycle of one document instance. Failure is terminal; the only
/// recovery is a fresh load cycle with a new instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    Loading,
    Ready,
    Failed(String),
}

impl LoadPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadPhase::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadPhase::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// State for paginated (PDF-like) documents. The page count is known only
/// after a successful load; navigation before that is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedRenderer {
    load: LoadPhase,
    page: u32,
    total_pages: u32,
    pub view: ViewTransform,
}

impl Default for PaginatedRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginatedRenderer {
    pub fn new() -> Self {
        Self {
            load: LoadPhase::Loading,
            page: 1,
            total_pages: 0,
            view: ViewTransform::default(),
        }
    }

    pub fn load_phase(&self) -> &LoadPhase {
        &self.load
    }

    pub fn load_succeeded(&mut self, total_pages: u32) {
        self.load = LoadPhase::Ready;
        self.total_pages = total_pages;
        self.page = 1;
    }

    pub fn load_failed(&mut self, message: &str) {
        self.load = LoadPhase::Failed(message.to_string());
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Jump to a page, clamped to `[1, total_pages]`.
    pub fn go_to_page(&mut self, page: u32) -> u32 {
        if self.load == LoadPhase::Ready && self.total_pages > 0 {
            self.page = page.clamp(1, self.total_pages);
        }
        self.page
    }

    /// Advance one page; a no-op at the last page.
    pub fn next_page(&mut self) -> u32 {
        self.go_to_page(self.page.saturating_add(1))
    }

    /// Go back one page; a no-op at page 1.
    pub fn prev_page(&mut self) -> u32 {
        self.go_to_page(self.page.saturating_sub(1).max(1))
    }
}

/// State for single-image (raster) documents: the same transform and load
/// lifecycle, no page concept.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRenderer {
    load: LoadPhase,
    pub view: ViewTransform,
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterRenderer {
    pub fn new() -> Self {
        Self {
            load: LoadPhase::Loading,
            view: ViewTransform::default(),
        }
    }

    pub fn load_phase(&self) -> &LoadPhase {
        &self.load
    }

    pub fn load_succeeded(&mut self) {
        self.load = LoadPhase::Ready;
    }

    pub fn load_failed(&mut self, message: &str) {
        self.load = LoadPhase::Failed(message.to_string());
    }
}

/// Renderer variant selected by document classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Renderer {
    Paginated(PaginatedRenderer),
    Raster(RasterRenderer),
}

impl Renderer {
    pub fn view(&self) -> &ViewTransform {
        match self {
            Renderer::Paginated(r) => &r.view,
            Renderer::Raster(r) => &r.view,
        }
    }

    pub fn view_mut(&mut self) -> &mut ViewTransform {
        match self {
            Renderer::Paginated(r) => &mut r.view,
            Renderer::Raster(r) => &mut r.view,
        }
    }

    pub fn load_phase(&self) -> &LoadPhase {
        match self {
            Renderer::Paginated(r) => r.load_phase(),
            Renderer::Raster(r) => r.load_phase(),
        }
    }

    pub fn load_failed(&mut self, message: &str) {
        match self {
            Renderer::Paginated(r) => r.load_failed(message),
            Renderer::Raster(r) => r.load_failed(message),
        }
    }

    /// Pages available for navigation: the loaded count for paginated
    /// documents, one for raster images, zero before a paginated load.
    pub fn page_count(&self) -> u32 {
        match self {
            Renderer::Paginated(r) => r.total_pages(),
            Renderer::Raster(_) => 1,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum ZoomOp {
        In,
        Out,
        Reset,
        Fit(f64),
    }

    fn zoom_op() -> impl Strategy<Value = ZoomOp> {
        prop_oneof![
            Just(ZoomOp::In),
            Just(ZoomOp::Out),
            Just(ZoomOp::Reset),
            (10.0f64..5000.0).prop_map(ZoomOp::Fit),
        ]
    }

    proptest! {
        /// Property: any sequence of zoom operations keeps the scale within
        /// bounds
        #[test]
        fn zoom_stays_in_bounds(ops in proptest::collection::vec(zoom_op(), 0..100)) {
            let mut view = ViewTransform::default();
            for op in ops {
                match op {
                    ZoomOp::In => view.zoom_in(),
                    ZoomOp::Out => view.zoom_out(),
                    ZoomOp::Reset => view.reset_zoom(),
                    ZoomOp::Fit(width) => view.fit_to_width(width, DEFAULT_PAGE_WIDTH),
                }
                prop_assert!(view.scale() >= MIN_ZOOM && view.scale() <= MAX_ZOOM);
            }
        }

        /// Property: rotation is always a multiple of 90 below 360, and four
        /// quarter turns return to the start
        #[test]
        fn rotation_cycles(turns in 0usize..40) {
            let mut view = ViewTransform::default();
            for _ in 0..turns {
                view.rotate_clockwise();
            }
            prop_assert!([0, 90, 180, 270].contains(&view.rotation_degrees()));

            let before = view.rotation_degrees();
            for _ in 0..4 {
                view.rotate_clockwise();
            }
            prop_assert_eq!(view.rotation_degrees(), before);
        }

        /// Property: the current page never leaves `[1, total_pages]`
        #[test]
        fn page_stays_in_bounds(
            total in 1u32..500,
            jumps in proptest::collection::vec(0u32..600, 0..50),
        ) {
            let mut renderer = PaginatedRenderer::new();
            renderer.load_succeeded(total);
            for jump in jumps {
                match jump % 3 {
                    0 => { renderer.next_page(); }
                    1 => { renderer.prev_page(); }
                    _ => { renderer.go_to_page(jump); }
                }
                prop_assert!(renderer.page() >= 1 && renderer.page() <= total);
            }
        }
    }
}
