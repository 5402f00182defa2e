//! Coordinate transformation between pointer space and document space
//!
//! Anchor positions are stored in unscaled, unrotated document space. Zoom
//! and rotation are applied only at render time as a CSS transform, so a
//! stored position stays valid across any sequence of zoom or rotation
//! changes.

/// Bounding box of the document container, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Convert pointer client coordinates to document-relative coordinates by
/// subtracting the container origin. Clamping is the caller's responsibility.
pub fn pointer_to_document(
    pointer_x: f64,
    pointer_y: f64,
    container: &ContainerRect,
) -> (f64, f64) {
    (pointer_x - container.left, pointer_y - container.top)
}

/// Clamp a document-relative point so it stays inside the container.
pub fn clamp_to_container(x: f64, y: f64, container: &ContainerRect) -> (f64, f64) {
    (
        x.clamp(0.0, container.width.max(0.0)),
        y.clamp(0.0, container.height.max(0.0)),
    )
}
