//! Core state machines for the secure document viewer
//!
//! Backend-independent: rendering, timers, and platform side effects live in
//! the front end. Everything here is driven through explicit calls and
//! injected capabilities, so the whole viewer can be exercised with
//! in-memory fakes.

pub mod coords;
pub mod doctype;
pub mod error;
pub mod policy;
pub mod renderer;
pub mod session;
pub mod shell;
pub mod signature;

pub use coords::{clamp_to_container, pointer_to_document, ContainerRect};
pub use doctype::{classify, supported_formats, DocumentKind};
pub use error::ViewerError;
pub use policy::{
    AccessLevel, GatedAction, PolicyOverrides, SecurityPolicy, Watermark, WatermarkPosition,
    SESSION_TIMEOUT_VIOLATION,
};
pub use renderer::{
    LoadPhase, PaginatedRenderer, RasterRenderer, Renderer, ViewTransform, DEFAULT_PAGE_WIDTH,
    MAX_ZOOM, MIN_ZOOM, ZOOM_STEP,
};
pub use session::{SessionTracker, ViewingSession};
pub use shell::{DocumentDescriptor, Gate, Platform, ViewerHost, ViewerShell, ViewerState};
pub use signature::{
    CommitError, CommitOutcome, SignatureAnchor, SignatureEngine, SignaturePad,
};
