//! Viewer shell: the composition root
//!
//! Wires the type resolver, renderer state, security policy, session tracker,
//! and signature engine together behind two injected capabilities: the host
//! callback surface and the platform side effects. Timers live in the front
//! end; the shell only reacts to their firings, so every path here runs
//! deterministically under test.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coords::{pointer_to_document, ContainerRect};
use crate::doctype::{classify, supported_formats, DocumentKind};
use crate::error::ViewerError;
use crate::policy::{
    GatedAction, PolicyOverrides, SecurityPolicy, SESSION_TIMEOUT_VIOLATION,
};
use crate::renderer::{
    LoadPhase, PaginatedRenderer, RasterRenderer, Renderer, ViewTransform,
};
use crate::session::{SessionTracker, ViewingSession};
use crate::signature::{
    CommitError, CommitOutcome, SignatureAnchor, SignatureEngine, SignaturePad,
};

/// Immutable description of the document being viewed, supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDescriptor {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl DocumentDescriptor {
    /// Display name: the file name when present, otherwise the last URL
    /// segment.
    pub fn display_name(&self) -> &str {
        match self.file_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.url.rsplit('/').next().unwrap_or(&self.url),
        }
    }
}

/// Callbacks into the hosting page. All failure and progress reporting flows
/// through here; nothing throws across this boundary.
pub trait ViewerHost {
    fn on_load_success(&self, page_count: u32);
    fn on_load_error(&self, message: &str);
    fn on_security_violation(&self, violation: &str);
    fn on_viewing_complete(&self, session: &ViewingSession);
    /// Mirror of the anchor list after every commit, so the host can persist
    /// it; the shell itself keeps nothing durable.
    fn on_signatures_changed(&self, anchors: &[SignatureAnchor]);
    /// Every known anchor is signed. Fired at most once per anchor
    /// population.
    fn on_signing_complete(&self);
}

/// Platform side effects the shell triggers but does not implement.
pub trait Platform {
    fn trigger_download(&self, url: &str, file_name: &str) -> Result<(), ViewerError>;
    fn share(&self, url: &str, title: &str) -> Result<(), ViewerError>;
    fn set_fullscreen(&self, active: bool) -> Result<(), ViewerError>;
}

/// Full-replacement view the front end must show instead of document
/// content. Re-evaluated on every render; while a gate is active no
/// interaction reaches the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    None,
    AuthRequired,
    SessionExpired,
}

/// Mutable UI state owned by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerState {
    pub authenticated: bool,
    pub session_expired: bool,
    pub fullscreen: bool,
    /// Host-controlled visibility of the surrounding chrome and controls.
    pub show_controls: bool,
}

pub struct ViewerShell<H, P> {
    descriptor: DocumentDescriptor,
    policy: SecurityPolicy,
    kind: DocumentKind,
    renderer: Renderer,
    engine: SignatureEngine,
    pad: SignaturePad,
    tracker: SessionTracker,
    state: ViewerState,
    host: H,
    platform: P,
}

impl<H: ViewerHost, P: Platform> ViewerShell<H, P> {
    pub fn new(
        descriptor: DocumentDescriptor,
        overrides: &PolicyOverrides,
        seed_anchors: Vec<SignatureAnchor>,
        host: H,
        platform: P,
        now: DateTime<Utc>,
    ) -> Self {
        let policy = SecurityPolicy::merged(overrides);
        let mut shell = Self {
            kind: DocumentKind::Unsupported,
            renderer: Renderer::Paginated(PaginatedRenderer::new()),
            engine: SignatureEngine::new(Vec::new()),
            pad: SignaturePad::new(),
            tracker: SessionTracker::start(&descriptor.id, policy.track_viewing, now),
            state: ViewerState {
                authenticated: !policy.require_auth,
                session_expired: false,
                fullscreen: false,
                show_controls: true,
            },
            descriptor,
            policy,
            host,
            platform,
        };
        shell.install_document(seed_anchors);
        shell
    }

    fn install_document(&mut self, seed_anchors: Vec<SignatureAnchor>) {
        self.kind = classify(&self.descriptor.url, self.descriptor.file_name.as_deref());
        self.renderer = match self.kind {
            DocumentKind::Raster => Renderer::Raster(RasterRenderer::new()),
            _ => Renderer::Paginated(PaginatedRenderer::new()),
        };
        self.engine = SignatureEngine::new(seed_anchors);
        self.pad = SignaturePad::new();
        if self.kind == DocumentKind::Unsupported {
            let message = ViewerError::UnsupportedFormat {
                supported: supported_formats().to_string(),
            }
            .to_string();
            self.renderer.load_failed(&message);
            self.host.on_load_error(&message);
        }
    }

    pub fn descriptor(&self) -> &DocumentDescriptor {
        &self.descriptor
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn load_phase(&self) -> &LoadPhase {
        self.renderer.load_phase()
    }

    pub fn page_count(&self) -> u32 {
        self.renderer.page_count()
    }

    pub fn view(&self) -> &ViewTransform {
        self.renderer.view()
    }

    pub fn anchors(&self) -> &[SignatureAnchor] {
        self.engine.anchors()
    }

    pub fn pad(&self) -> &SignaturePad {
        &self.pad
    }

    pub fn session(&self) -> &ViewingSession {
        self.tracker.snapshot()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Gate to evaluate on every render. No document content is reachable
    /// while a gate is active, regardless of any other state.
    pub fn gate(&self) -> Gate {
        if self.state.session_expired {
            Gate::SessionExpired
        } else if !self.state.authenticated {
            Gate::AuthRequired
        } else {
            Gate::None
        }
    }

    fn interactive(&self) -> bool {
        self.gate() == Gate::None
    }

    /// Host reports authentication success; clears both gates.
    pub fn authenticate(&mut self) {
        self.state.authenticated = true;
        self.state.session_expired = false;
    }

    /// Show or hide the surrounding chrome and controls.
    pub fn set_show_controls(&mut self, visible: bool) {
        self.state.show_controls = visible;
    }

    // --- load lifecycle -------------------------------------------------

    /// Load completion for `document_id`. Reports carrying the id of a
    /// replaced document are discarded, so a late-arriving callback cannot
    /// touch the current document's state.
    pub fn notify_load_success(&mut self, document_id: &str, page_count: u32) {
        if document_id != self.descriptor.id || !self.load_phase().is_loading() {
            return;
        }
        match &mut self.renderer {
            Renderer::Paginated(renderer) => {
                renderer.load_succeeded(page_count);
                self.tracker.record_page_view(1);
                self.host.on_load_success(page_count);
            }
            Renderer::Raster(renderer) => {
                renderer.load_succeeded();
                self.tracker.record_page_view(1);
                self.host.on_load_success(1);
            }
        }
    }

    pub fn notify_load_error(&mut self, document_id: &str, message: &str) {
        if document_id != self.descriptor.id || !self.load_phase().is_loading() {
            return;
        }
        self.renderer.load_failed(message);
        self.host.on_load_error(message);
    }

    /// Swap in a new document: finalize and emit the old viewing session,
    /// then reset all per-document state. Authentication and expiry gates
    /// carry over; a new descriptor does not bypass them.
    pub fn replace_document(
        &mut self,
        descriptor: DocumentDescriptor,
        seed_anchors: Vec<SignatureAnchor>,
        now: DateTime<Utc>,
    ) {
        self.finalize(now);
        self.descriptor = descriptor;
        self.tracker =
            SessionTracker::start(&self.descriptor.id, self.policy.track_viewing, now);
        self.state.fullscreen = false;
        self.install_document(seed_anchors);
    }

    /// Finalize the viewing session and emit it to the host. Safe to call
    /// repeatedly; only the first call emits.
    pub fn finalize(&mut self, now: DateTime<Utc>) {
        if let Some(session) = self.tracker.finalize(now) {
            self.host.on_viewing_complete(&session);
        }
    }

    // --- timer firings (timers live in the front end) -------------------

    /// One-second viewing heartbeat.
    pub fn tick_viewing(&mut self) {
        self.tracker.tick();
    }

    /// Record host-supplied client metadata on the viewing session.
    pub fn set_client_metadata(
        &mut self,
        user_agent: Option<String>,
        client_addr: Option<String>,
    ) {
        self.tracker.set_client_metadata(user_agent, client_addr);
    }

    /// The configured session timeout elapsed. Terminal until
    /// re-authentication.
    pub fn session_timed_out(&mut self) {
        if self.state.session_expired {
            return;
        }
        self.state.session_expired = true;
        self.host.on_security_violation(SESSION_TIMEOUT_VIOLATION);
    }

    // --- gated actions --------------------------------------------------

    fn authorize(&self, action: GatedAction) -> bool {
        if !self.interactive() {
            return false;
        }
        if self.policy.can_perform(action) {
            true
        } else {
            self.host.on_security_violation(action.violation());
            false
        }
    }

    /// Download the document through the platform. A blocked download emits
    /// its violation and never reaches the platform.
    pub fn request_download(&self) -> Result<(), ViewerError> {
        if !self.authorize(GatedAction::Download) {
            return Ok(());
        }
        self.platform
            .trigger_download(&self.descriptor.url, self.descriptor.display_name())
    }

    /// Share the document URL through the platform share surface.
    pub fn request_share(&self) -> Result<(), ViewerError> {
        if !self.authorize(GatedAction::Share) {
            return Ok(());
        }
        self.platform
            .share(&self.descriptor.url, self.descriptor.display_name())
    }

    /// Copy gate for the front end's copy-event handler.
    pub fn copy_allowed(&self) -> bool {
        self.authorize(GatedAction::Copy)
    }

    /// Print gate for the front end's print-event handler.
    pub fn print_allowed(&self) -> bool {
        self.authorize(GatedAction::Print)
    }

    pub fn toggle_fullscreen(&mut self) -> Result<(), ViewerError> {
        if !self.interactive() {
            return Ok(());
        }
        let next = !self.state.fullscreen;
        self.platform.set_fullscreen(next)?;
        self.state.fullscreen = next;
        Ok(())
    }

    // --- navigation and view transform ----------------------------------

    pub fn current_page(&self) -> u32 {
        match &self.renderer {
            Renderer::Paginated(renderer) => renderer.page(),
            Renderer::Raster(_) => 1,
        }
    }

    fn navigate(&mut self, go: impl FnOnce(&mut PaginatedRenderer) -> u32) -> u32 {
        let before = self.current_page();
        if !self.interactive() {
            return before;
        }
        match &mut self.renderer {
            Renderer::Paginated(renderer) => {
                let after = go(renderer);
                if after != before {
                    self.tracker.record_page_view(after);
                }
                after
            }
            Renderer::Raster(_) => 1,
        }
    }

    pub fn next_page(&mut self) -> u32 {
        self.navigate(PaginatedRenderer::next_page)
    }

    pub fn prev_page(&mut self) -> u32 {
        self.navigate(PaginatedRenderer::prev_page)
    }

    pub fn go_to_page(&mut self, page: u32) -> u32 {
        self.navigate(move |renderer| renderer.go_to_page(page))
    }

    pub fn zoom_in(&mut self) {
        if self.interactive() {
            self.renderer.view_mut().zoom_in();
        }
    }

    pub fn zoom_out(&mut self) {
        if self.interactive() {
            self.renderer.view_mut().zoom_out();
        }
    }

    pub fn reset_zoom(&mut self) {
        if self.interactive() {
            self.renderer.view_mut().reset_zoom();
        }
    }

    pub fn fit_to_width(&mut self, container_width: f64, page_width: f64) {
        if self.interactive() {
            self.renderer
                .view_mut()
                .fit_to_width(container_width, page_width);
        }
    }

    pub fn rotate_clockwise(&mut self) {
        if self.interactive() {
            self.renderer.view_mut().rotate_clockwise();
        }
    }

    // --- signature flow -------------------------------------------------

    pub fn is_placing(&self) -> bool {
        self.engine.is_placing()
    }

    pub fn editing_anchor(&self) -> Option<usize> {
        self.engine.editing()
    }

    pub fn begin_signature_placement(&mut self) {
        if self.interactive() {
            self.engine.begin_placement();
        }
    }

    pub fn cancel_signature(&mut self) {
        self.engine.cancel();
        self.pad.clear();
    }

    /// Pointer click on the document surface, in client coordinates. While
    /// placing, creates an anchor at the transformed point on the visible
    /// page.
    pub fn document_clicked(
        &mut self,
        client_x: f64,
        client_y: f64,
        container: &ContainerRect,
    ) -> Option<usize> {
        if !self.interactive() {
            return None;
        }
        let (x, y) = pointer_to_document(client_x, client_y, container);
        self.engine.place_at(self.current_page(), x, y)
    }

    /// Select a pre-seeded anchor by index; signed anchors are a no-op.
    pub fn select_anchor(&mut self, index: usize) -> bool {
        self.interactive() && self.engine.select(index)
    }

    /// Drag an uncommitted anchor. Drag positions are already container
    /// space, so no pointer transform applies; the move is bounded by the
    /// container.
    pub fn drag_anchor(
        &mut self,
        index: usize,
        x: f64,
        y: f64,
        container: &ContainerRect,
    ) -> bool {
        self.interactive() && self.engine.drag_to(index, x, y, container)
    }

    pub fn pad_pointer_down(&mut self, x: f64, y: f64) {
        if self.interactive() {
            self.pad.pointer_down(x, y);
        }
    }

    pub fn pad_pointer_move(&mut self, x: f64, y: f64) {
        if self.interactive() {
            self.pad.pointer_move(x, y);
        }
    }

    pub fn pad_pointer_up(&mut self) {
        self.pad.pointer_up();
    }

    /// Reset the drawing surface, keeping the selected anchor.
    pub fn clear_pad(&mut self) {
        self.pad.clear();
    }

    /// Bind the drawn signature (rasterized by the host canvas) to the
    /// selected anchor. Refused when nothing was drawn.
    pub fn apply_signature(&mut self, image_data: &str) -> Result<CommitOutcome, CommitError> {
        if !self.interactive() {
            return Err(CommitError::NoAnchorSelected);
        }
        if self.pad.is_empty() {
            return Err(CommitError::EmptySignature);
        }
        self.commit(image_data)
    }

    /// Bind a typed signature to the selected anchor. Refused for blank
    /// text.
    pub fn apply_typed_signature(&mut self, text: &str) -> Result<CommitOutcome, CommitError> {
        if !self.interactive() {
            return Err(CommitError::NoAnchorSelected);
        }
        if text.trim().is_empty() {
            return Err(CommitError::EmptySignature);
        }
        self.commit(text)
    }

    fn commit(&mut self, data: &str) -> Result<CommitOutcome, CommitError> {
        let outcome = self.engine.commit(data)?;
        self.pad.clear();
        self.host.on_signatures_changed(self.engine.anchors());
        if outcome.completed_all {
            self.host.on_signing_complete();
        }
        Ok(outcome)
    }
}
