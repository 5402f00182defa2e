//! Secure document viewer front end
//!
//! Thin wasm-bindgen bindings over the core viewer shell. The hosting page
//! renders the actual document surface (iframe or img), forwards DOM events,
//! and reacts to callbacks; every state decision happens in docview-core.
//! This layer owns the two real timers (viewing heartbeat and session
//! expiry) and the browser platform wrappers.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use wasm_bindgen::prelude::*;

use docview_core::{
    ContainerRect, DocumentDescriptor, DocumentKind, Gate, PolicyOverrides, SignatureAnchor,
    ViewerShell,
};

mod host;
mod platform;
mod timers;

use host::JsHost;
use platform::BrowserPlatform;
use timers::{Interval, Timeout};

type Shell = ViewerShell<JsHost, BrowserPlatform>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"docview initialized".into());
}

/// One viewer instance per open document. Construct, attach the container
/// element, then forward load events and user interactions; call `destroy`
/// (or let the page replace the document) to finalize the viewing session.
#[wasm_bindgen]
pub struct SecureDocumentViewer {
    shell: Rc<RefCell<Shell>>,
    viewing_timer: Option<Interval>,
    session_timer: Option<Timeout>,
}

#[wasm_bindgen]
impl SecureDocumentViewer {
    /// Create a viewer. `policy_json` is the security policy override object
    /// (unset fields fall back to defaults), `anchors_json` an optional
    /// pre-seeded signature anchor list, and `callbacks` an object of
    /// optional `onLoadSuccess` / `onLoadError` / `onSecurityViolation` /
    /// `onViewingComplete` / `onSignaturesChanged` / `onSigningComplete`
    /// functions.
    #[wasm_bindgen(constructor)]
    pub fn new(
        document_id: &str,
        url: &str,
        file_name: Option<String>,
        policy_json: Option<String>,
        anchors_json: Option<String>,
        callbacks: &JsValue,
    ) -> Result<SecureDocumentViewer, JsValue> {
        let overrides = match policy_json {
            Some(json) => PolicyOverrides::from_json(&json)
                .map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => PolicyOverrides::default(),
        };
        let seed = parse_anchors(anchors_json)?;
        let descriptor = DocumentDescriptor {
            id: document_id.to_string(),
            url: url.to_string(),
            file_name,
        };

        let shell = ViewerShell::new(
            descriptor,
            &overrides,
            seed,
            JsHost::from_callbacks(callbacks),
            BrowserPlatform::new(),
            Utc::now(),
        );
        let mut viewer = SecureDocumentViewer {
            shell: Rc::new(RefCell::new(shell)),
            viewing_timer: None,
            session_timer: None,
        };
        viewer.arm_timers()?;
        Ok(viewer)
    }

    /// Attach the DOM element hosting the document surface; fullscreen
    /// requests target it.
    #[wasm_bindgen(js_name = attachContainer)]
    pub fn attach_container(&self, container: web_sys::Element) {
        self.shell.borrow().platform().attach(container);
    }

    /// Record host-supplied client metadata on the viewing session; the
    /// core never reads ambient navigator state itself.
    #[wasm_bindgen(js_name = setClientMetadata)]
    pub fn set_client_metadata(&self, user_agent: Option<String>, client_addr: Option<String>) {
        self.shell
            .borrow_mut()
            .set_client_metadata(user_agent, client_addr);
    }

    // --- load lifecycle -------------------------------------------------

    /// The document surface finished loading. `page_count` is ignored for
    /// raster documents.
    #[wasm_bindgen(js_name = notifyLoadSuccess)]
    pub fn notify_load_success(&self, document_id: &str, page_count: u32) {
        self.shell
            .borrow_mut()
            .notify_load_success(document_id, page_count);
    }

    #[wasm_bindgen(js_name = notifyLoadError)]
    pub fn notify_load_error(&self, document_id: &str, message: &str) {
        self.shell
            .borrow_mut()
            .notify_load_error(document_id, message);
    }

    /// Swap in a new document; finalizes and emits the previous viewing
    /// session and restarts both timers.
    #[wasm_bindgen(js_name = replaceDocument)]
    pub fn replace_document(
        &mut self,
        document_id: &str,
        url: &str,
        file_name: Option<String>,
        anchors_json: Option<String>,
    ) -> Result<(), JsValue> {
        let seed = parse_anchors(anchors_json)?;
        web_sys::console::log_1(&format!("docview: switching to document {document_id}").into());
        self.shell.borrow_mut().replace_document(
            DocumentDescriptor {
                id: document_id.to_string(),
                url: url.to_string(),
                file_name,
            },
            seed,
            Utc::now(),
        );
        self.arm_timers()
    }

    // --- gates ----------------------------------------------------------

    /// `"none"`, `"auth-required"`, or `"session-expired"`. Consult on every
    /// render; while not `"none"`, show the gate view instead of content.
    pub fn gate(&self) -> String {
        match self.shell.borrow().gate() {
            Gate::None => "none",
            Gate::AuthRequired => "auth-required",
            Gate::SessionExpired => "session-expired",
        }
        .to_string()
    }

    /// The host's authentication flow succeeded; clears both gates and
    /// restarts the session timeout.
    pub fn authenticate(&mut self) -> Result<(), JsValue> {
        self.shell.borrow_mut().authenticate();
        self.arm_timers()
    }

    /// Show or hide the surrounding chrome and controls.
    #[wasm_bindgen(js_name = setShowControls)]
    pub fn set_show_controls(&self, visible: bool) {
        self.shell.borrow_mut().set_show_controls(visible);
    }

    #[wasm_bindgen(js_name = showControls)]
    pub fn show_controls(&self) -> bool {
        self.shell.borrow().state().show_controls
    }

    // --- state getters --------------------------------------------------

    #[wasm_bindgen(js_name = documentKind)]
    pub fn document_kind(&self) -> String {
        match self.shell.borrow().kind() {
            DocumentKind::Paginated => "paginated",
            DocumentKind::Raster => "raster",
            DocumentKind::Unsupported => "unsupported",
        }
        .to_string()
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.shell.borrow().load_phase().is_loading()
    }

    #[wasm_bindgen(js_name = errorMessage)]
    pub fn error_message(&self) -> Option<String> {
        self.shell.borrow().load_phase().error().map(str::to_string)
    }

    #[wasm_bindgen(js_name = pageNumber)]
    pub fn page_number(&self) -> u32 {
        self.shell.borrow().current_page()
    }

    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.shell.borrow().page_count()
    }

    #[wasm_bindgen(js_name = zoomPercent)]
    pub fn zoom_percent(&self) -> u32 {
        (self.shell.borrow().view().scale() * 100.0).round() as u32
    }

    #[wasm_bindgen(js_name = rotationDegrees)]
    pub fn rotation_degrees(&self) -> u16 {
        self.shell.borrow().view().rotation_degrees()
    }

    /// CSS transform to apply to the rendered surface.
    #[wasm_bindgen(js_name = cssTransform)]
    pub fn css_transform(&self) -> String {
        self.shell.borrow().view().css_transform()
    }

    #[wasm_bindgen(js_name = accessLevel)]
    pub fn access_level(&self) -> String {
        self.shell.borrow().policy().access_level.as_str().to_string()
    }

    #[wasm_bindgen(js_name = watermarkText)]
    pub fn watermark_text(&self) -> Option<String> {
        let shell = self.shell.borrow();
        let text = &shell.policy().watermark.text;
        (!text.is_empty()).then(|| text.clone())
    }

    /// Inline CSS for the watermark overlay, or `undefined` when none is
    /// configured.
    #[wasm_bindgen(js_name = watermarkStyle)]
    pub fn watermark_style(&self) -> Option<String> {
        self.shell.borrow().policy().watermark.css_style()
    }

    /// Snapshot of the in-progress viewing session.
    #[wasm_bindgen(js_name = sessionSnapshot)]
    pub fn session_snapshot(&self) -> Result<JsValue, JsValue> {
        use serde::Serialize;
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        self.shell
            .borrow()
            .session()
            .serialize(&serializer)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Current anchor list, including committed signature data.
    pub fn anchors(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.shell.borrow().anchors())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // --- navigation and view transform ----------------------------------

    #[wasm_bindgen(js_name = nextPage)]
    pub fn next_page(&self) -> u32 {
        self.shell.borrow_mut().next_page()
    }

    #[wasm_bindgen(js_name = prevPage)]
    pub fn prev_page(&self) -> u32 {
        self.shell.borrow_mut().prev_page()
    }

    #[wasm_bindgen(js_name = goToPage)]
    pub fn go_to_page(&self, page: u32) -> u32 {
        self.shell.borrow_mut().go_to_page(page)
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) -> u32 {
        self.shell.borrow_mut().zoom_in();
        self.zoom_percent()
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) -> u32 {
        self.shell.borrow_mut().zoom_out();
        self.zoom_percent()
    }

    #[wasm_bindgen(js_name = resetZoom)]
    pub fn reset_zoom(&self) -> u32 {
        self.shell.borrow_mut().reset_zoom();
        self.zoom_percent()
    }

    #[wasm_bindgen(js_name = fitToWidth)]
    pub fn fit_to_width(&self, container_width: f64, page_width: f64) -> u32 {
        self.shell
            .borrow_mut()
            .fit_to_width(container_width, page_width);
        self.zoom_percent()
    }

    #[wasm_bindgen(js_name = rotateClockwise)]
    pub fn rotate_clockwise(&self) -> u16 {
        self.shell.borrow_mut().rotate_clockwise();
        self.rotation_degrees()
    }

    // --- gated actions --------------------------------------------------

    /// Download the document; blocked downloads emit a violation and do
    /// nothing else.
    #[wasm_bindgen(js_name = requestDownload)]
    pub fn request_download(&self) -> Result<(), JsValue> {
        self.shell
            .borrow()
            .request_download()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Share via the native share sheet, falling back to a clipboard copy.
    #[wasm_bindgen(js_name = requestShare)]
    pub fn request_share(&self) -> Result<(), JsValue> {
        self.shell
            .borrow()
            .request_share()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Ask before letting a copy event proceed; emits the violation when
    /// blocked.
    #[wasm_bindgen(js_name = copyAllowed)]
    pub fn copy_allowed(&self) -> bool {
        self.shell.borrow().copy_allowed()
    }

    /// Ask before letting a print proceed; emits the violation when blocked.
    #[wasm_bindgen(js_name = printAllowed)]
    pub fn print_allowed(&self) -> bool {
        self.shell.borrow().print_allowed()
    }

    #[wasm_bindgen(js_name = toggleFullscreen)]
    pub fn toggle_fullscreen(&self) -> Result<(), JsValue> {
        self.shell
            .borrow_mut()
            .toggle_fullscreen()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // --- signature flow -------------------------------------------------

    #[wasm_bindgen(js_name = beginSignaturePlacement)]
    pub fn begin_signature_placement(&self) {
        self.shell.borrow_mut().begin_signature_placement();
    }

    #[wasm_bindgen(js_name = cancelSignature)]
    pub fn cancel_signature(&self) {
        self.shell.borrow_mut().cancel_signature();
    }

    #[wasm_bindgen(js_name = isPlacing)]
    pub fn is_placing(&self) -> bool {
        self.shell.borrow().is_placing()
    }

    /// Click on the document surface, in client coordinates plus the
    /// container bounding box. Returns the new anchor index while placing.
    #[wasm_bindgen(js_name = documentClicked)]
    pub fn document_clicked(
        &self,
        client_x: f64,
        client_y: f64,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    ) -> Option<u32> {
        let container = ContainerRect::new(left, top, width, height);
        self.shell
            .borrow_mut()
            .document_clicked(client_x, client_y, &container)
            .map(|index| index as u32)
    }

    /// Select a pre-seeded anchor; returns false for signed anchors.
    #[wasm_bindgen(js_name = selectAnchor)]
    pub fn select_anchor(&self, index: u32) -> bool {
        self.shell.borrow_mut().select_anchor(index as usize)
    }

    /// Drag an uncommitted anchor to a container-space position.
    #[wasm_bindgen(js_name = dragAnchor)]
    pub fn drag_anchor(&self, index: u32, x: f64, y: f64, width: f64, height: f64) -> bool {
        let container = ContainerRect::new(0.0, 0.0, width, height);
        self.shell
            .borrow_mut()
            .drag_anchor(index as usize, x, y, &container)
    }

    #[wasm_bindgen(js_name = padPointerDown)]
    pub fn pad_pointer_down(&self, x: f64, y: f64) {
        self.shell.borrow_mut().pad_pointer_down(x, y);
    }

    #[wasm_bindgen(js_name = padPointerMove)]
    pub fn pad_pointer_move(&self, x: f64, y: f64) {
        self.shell.borrow_mut().pad_pointer_move(x, y);
    }

    #[wasm_bindgen(js_name = padPointerUp)]
    pub fn pad_pointer_up(&self) {
        self.shell.borrow_mut().pad_pointer_up();
    }

    #[wasm_bindgen(js_name = clearPad)]
    pub fn clear_pad(&self) {
        self.shell.borrow_mut().clear_pad();
    }

    /// Commit the drawn signature (as a data URL rasterized by the page's
    /// canvas) to the selected anchor. Returns true when this commit signed
    /// the last open anchor.
    #[wasm_bindgen(js_name = applySignature)]
    pub fn apply_signature(&self, image_data: &str) -> Result<bool, JsValue> {
        self.shell
            .borrow_mut()
            .apply_signature(image_data)
            .map(|outcome| outcome.completed_all)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Commit a typed signature to the selected anchor.
    #[wasm_bindgen(js_name = applyTypedSignature)]
    pub fn apply_typed_signature(&self, text: &str) -> Result<bool, JsValue> {
        self.shell
            .borrow_mut()
            .apply_typed_signature(text)
            .map(|outcome| outcome.completed_all)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // --- teardown -------------------------------------------------------

    /// Stop both timers and finalize the viewing session; the record is
    /// emitted through `onViewingComplete`. The viewer is inert afterwards.
    pub fn destroy(&mut self) {
        self.viewing_timer = None;
        self.session_timer = None;
        self.shell.borrow_mut().finalize(Utc::now());
    }

    fn arm_timers(&mut self) -> Result<(), JsValue> {
        // Dropping the old guards clears their browser handles first
        self.viewing_timer = None;
        self.session_timer = None;

        let window =
            web_sys::window().ok_or_else(|| JsValue::from_str("no window for timers"))?;
        let (tracking, timeout) = {
            let shell = self.shell.borrow();
            (
                shell.policy().track_viewing,
                shell.policy().session_timeout(),
            )
        };

        if tracking {
            let shell = Rc::clone(&self.shell);
            self.viewing_timer = Some(Interval::new(&window, 1_000, move || {
                shell.borrow_mut().tick_viewing();
            })?);
        }
        if let Some(duration) = timeout {
            let millis = duration.as_millis().min(i32::MAX as u128) as i32;
            let shell = Rc::clone(&self.shell);
            self.session_timer = Some(Timeout::new(&window, millis, move || {
                shell.borrow_mut().session_timed_out();
            })?);
        }
        Ok(())
    }
}

fn parse_anchors(anchors_json: Option<String>) -> Result<Vec<SignatureAnchor>, JsValue> {
    match anchors_json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| JsValue::from_str(&format!("Invalid anchors: {e}"))),
        None => Ok(Vec::new()),
    }
}
