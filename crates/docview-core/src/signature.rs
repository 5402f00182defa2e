//! Signature anchors, placement state machine, and freehand stroke capture
//!
//! The engine owns the set of signable anchor positions for one document
//! session. Anchors live in unscaled document space; drag updates arrive in
//! container space and are clamped to stay inside the container.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::{clamp_to_container, ContainerRect};

/// A signable position bound to a page and a pixel offset in unscaled
/// document space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureAnchor {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub signed: bool,
    /// A PNG data URL for drawn signatures, or the literal text for typed
    /// ones. Present exactly when `signed` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

impl SignatureAnchor {
    pub fn new(page: u32, x: f64, y: f64) -> Self {
        Self {
            page,
            x,
            y,
            signed: false,
            image_data: None,
        }
    }
}

/// Why a commit was refused. Local validation only; nothing propagates
/// beyond the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("no anchor is selected for signing")]
    NoAnchorSelected,
    #[error("signature is empty")]
    EmptySignature,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// True exactly when this commit signed the last unsigned anchor. The
    /// signal re-arms only if new anchors appear afterwards.
    pub completed_all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Placing,
    Editing { anchor: usize },
}

/// Placement lifecycle per document session: Idle until the user requests
/// placement, Placing until a click creates an anchor, Editing while a
/// signature is drawn for it, back to Idle on commit.
#[derive(Debug)]
pub struct SignatureEngine {
    anchors: Vec<SignatureAnchor>,
    phase: Phase,
    /// Engine-created anchor not yet committed; discarded on cancel.
    /// Always the most recently pushed anchor.
    provisional: Option<usize>,
    completion_fired: bool,
}

impl SignatureEngine {
    /// Start with the host's pre-seeded anchors (possibly none).
    pub fn new(seed: Vec<SignatureAnchor>) -> Self {
        Self {
            anchors: seed,
            phase: Phase::Idle,
            provisional: None,
            completion_fired: false,
        }
    }

    pub fn anchors(&self) -> &[SignatureAnchor] {
        &self.anchors
    }

    pub fn is_placing(&self) -> bool {
        self.phase == Phase::Placing
    }

    /// Index of the anchor currently being edited, if any.
    pub fn editing(&self) -> Option<usize> {
        match self.phase {
            Phase::Editing { anchor } => Some(anchor),
            _ => None,
        }
    }

    pub fn all_signed(&self) -> bool {
        !self.anchors.is_empty() && self.anchors.iter().all(|a| a.signed)
    }

    /// Enter placement mode; the next document click creates an anchor.
    pub fn begin_placement(&mut self) {
        self.cancel();
        self.phase = Phase::Placing;
    }

    /// Leave placement or editing, discarding an uncommitted engine-created
    /// anchor. Committed anchors are never removed.
    pub fn cancel(&mut self) {
        if let Some(index) = self.provisional.take() {
            self.anchors.remove(index);
        }
        self.phase = Phase::Idle;
    }

    /// A click on the document surface while placing: create an anchor at
    /// the given document-space point on the visible page and start editing
    /// it. Clicks outside placement mode do nothing.
    pub fn place_at(&mut self, page: u32, x: f64, y: f64) -> Option<usize> {
        if self.phase != Phase::Placing {
            return None;
        }
        self.anchors.push(SignatureAnchor::new(page, x, y));
        let index = self.anchors.len() - 1;
        self.provisional = Some(index);
        self.phase = Phase::Editing { anchor: index };
        // A fresh anchor re-arms the completion signal
        self.completion_fired = false;
        Some(index)
    }

    /// Select an existing unsigned anchor for signing. Clicking a signed
    /// anchor is a no-op; there is no re-signing through this path.
    pub fn select(&mut self, index: usize) -> bool {
        match self.anchors.get(index) {
            Some(anchor) if !anchor.signed => {
                if self.provisional != Some(index) {
                    // Abandon any provisional anchor; it is always the last
                    // element, so `index` stays valid after removal.
                    self.cancel();
                }
                self.phase = Phase::Editing { anchor: index };
                true
            }
            _ => false,
        }
    }

    /// Move an uncommitted anchor to a container-space position, clamped to
    /// stay inside the container.
    pub fn drag_to(&mut self, index: usize, x: f64, y: f64, container: &ContainerRect) -> bool {
        match self.anchors.get_mut(index) {
            Some(anchor) if !anchor.signed => {
                let (cx, cy) = clamp_to_container(x, y, container);
                anchor.x = cx;
                anchor.y = cy;
                true
            }
            _ => false,
        }
    }

    /// Attach signature data to the anchor being edited and mark it signed.
    pub fn commit(&mut self, image_data: &str) -> Result<CommitOutcome, CommitError> {
        let Phase::Editing { anchor } = self.phase else {
            return Err(CommitError::NoAnchorSelected);
        };
        if image_data.is_empty() {
            return Err(CommitError::EmptySignature);
        }
        let entry = &mut self.anchors[anchor];
        entry.signed = true;
        entry.image_data = Some(image_data.to_string());
        self.provisional = None;
        self.phase = Phase::Idle;

        let completed_all = self.all_signed() && !self.completion_fired;
        if completed_all {
            self.completion_fired = true;
        }
        Ok(CommitOutcome { completed_all })
    }
}

/// Freehand stroke capture for the signature drawing surface.
///
/// Strokes are polylines in pad-local coordinates. Rasterizing them to image
/// data is the host canvas's job; the pad only decides whether anything
/// signable was drawn.
#[derive(Debug, Default)]
pub struct SignaturePad {
    strokes: Vec<Vec<(f64, f64)>>,
    drawing: bool,
}

impl SignaturePad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.drawing = true;
        self.strokes.push(vec![(x, y)]);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if self.drawing {
            if let Some(stroke) = self.strokes.last_mut() {
                stroke.push((x, y));
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.drawing = false;
    }

    /// Reset the drawing surface. The anchor being edited stays selected.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
    }

    /// True when nothing signable was drawn; single-point taps do not count.
    pub fn is_empty(&self) -> bool {
        self.strokes.iter().all(|s| s.len() < 2)
    }

    pub fn strokes(&self) -> &[Vec<(f64, f64)>] {
        &self.strokes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded(count: usize) -> SignatureEngine {
        SignatureEngine::new(
            (0..count)
                .map(|i| SignatureAnchor::new(1, 100.0 + i as f64 * 50.0, 200.0))
                .collect(),
        )
    }

    const DATA_URL: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_place_and_commit_flow() {
        let mut engine = SignatureEngine::new(Vec::new());
        assert!(!engine.is_placing());

        engine.begin_placement();
        assert!(engine.is_placing());

        let index = engine.place_at(2, 120.0, 340.0).unwrap();
        assert_eq!(engine.editing(), Some(index));
        assert!(!engine.is_placing());

        let outcome = engine.commit(DATA_URL).unwrap();
        assert!(outcome.completed_all);
        let anchor = &engine.anchors()[index];
        assert_eq!(anchor.page, 2);
        assert_eq!((anchor.x, anchor.y), (120.0, 340.0));
        assert!(anchor.signed);
        assert_eq!(anchor.image_data.as_deref(), Some(DATA_URL));
        assert_eq!(engine.editing(), None);
    }

    #[test]
    fn test_click_outside_placement_mode_does_nothing() {
        let mut engine = seeded(1);
        assert_eq!(engine.place_at(1, 10.0, 10.0), None);
        assert_eq!(engine.anchors().len(), 1);
    }

    #[test]
    fn test_cancel_discards_provisional_anchor() {
        let mut engine = seeded(1);
        engine.begin_placement();
        engine.place_at(1, 50.0, 60.0);
        assert_eq!(engine.anchors().len(), 2);

        engine.cancel();
        assert_eq!(engine.anchors().len(), 1);
        assert_eq!(engine.editing(), None);
    }

    #[test]
    fn test_cancel_keeps_committed_anchors() {
        let mut engine = SignatureEngine::new(Vec::new());
        engine.begin_placement();
        engine.place_at(1, 50.0, 60.0);
        engine.commit(DATA_URL).unwrap();

        engine.cancel();
        assert_eq!(engine.anchors().len(), 1);
        assert!(engine.anchors()[0].signed);
    }

    #[test]
    fn test_signed_anchor_cannot_be_selected() {
        let mut engine = seeded(2);
        assert!(engine.select(0));
        engine.commit(DATA_URL).unwrap();

        assert!(!engine.select(0)); // no re-signing through the default path
        assert!(engine.select(1));
    }

    #[test]
    fn test_select_out_of_bounds_is_noop() {
        let mut engine = seeded(1);
        assert!(!engine.select(5));
        assert_eq!(engine.editing(), None);
    }

    #[test]
    fn test_selecting_another_anchor_abandons_provisional() {
        let mut engine = seeded(1);
        engine.begin_placement();
        engine.place_at(1, 300.0, 300.0);
        assert_eq!(engine.anchors().len(), 2);

        // Switching to the seeded anchor drops the provisional one
        assert!(engine.select(0));
        assert_eq!(engine.anchors().len(), 1);
        assert_eq!(engine.editing(), Some(0));
    }

    #[test]
    fn test_commit_without_selection_is_refused() {
        let mut engine = seeded(1);
        assert_eq!(
            engine.commit(DATA_URL).unwrap_err(),
            CommitError::NoAnchorSelected
        );
    }

    #[test]
    fn test_commit_with_empty_data_is_refused() {
        let mut engine = seeded(1);
        engine.select(0);
        assert_eq!(engine.commit("").unwrap_err(), CommitError::EmptySignature);
        // Anchor stays uncommitted and selected
        assert!(!engine.anchors()[0].signed);
        assert_eq!(engine.editing(), Some(0));
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let mut engine = seeded(2);
        engine.select(0);
        assert!(!engine.commit(DATA_URL).unwrap().completed_all);
        engine.select(1);
        assert!(engine.commit(DATA_URL).unwrap().completed_all);
        assert!(engine.all_signed());
    }

    #[test]
    fn test_new_anchor_rearms_completion() {
        let mut engine = seeded(1);
        engine.select(0);
        assert!(engine.commit(DATA_URL).unwrap().completed_all);

        engine.begin_placement();
        engine.place_at(1, 400.0, 120.0);
        assert!(!engine.all_signed());
        assert!(engine.commit(DATA_URL).unwrap().completed_all);
    }

    #[test]
    fn test_drag_clamps_to_container() {
        let container = ContainerRect::new(0.0, 0.0, 800.0, 600.0);
        let mut engine = seeded(1);
        assert!(engine.drag_to(0, 900.0, -50.0, &container));
        let anchor = &engine.anchors()[0];
        assert_eq!((anchor.x, anchor.y), (800.0, 0.0));
    }

    #[test]
    fn test_drag_signed_anchor_is_refused() {
        let container = ContainerRect::new(0.0, 0.0, 800.0, 600.0);
        let mut engine = seeded(1);
        engine.select(0);
        engine.commit(DATA_URL).unwrap();
        assert!(!engine.drag_to(0, 10.0, 10.0, &container));
        assert_eq!(engine.anchors()[0].x, 100.0);
    }

    #[test]
    fn test_pad_captures_strokes() {
        let mut pad = SignaturePad::new();
        assert!(pad.is_empty());

        pad.pointer_down(10.0, 10.0);
        pad.pointer_move(20.0, 15.0);
        pad.pointer_move(30.0, 12.0);
        pad.pointer_up();
        assert!(!pad.is_empty());
        assert_eq!(pad.strokes().len(), 1);
        assert_eq!(pad.strokes()[0].len(), 3);

        pad.pointer_down(50.0, 50.0);
        pad.pointer_move(60.0, 55.0);
        pad.pointer_up();
        assert_eq!(pad.strokes().len(), 2);
    }

    #[test]
    fn test_pad_ignores_moves_without_down() {
        let mut pad = SignaturePad::new();
        pad.pointer_move(10.0, 10.0);
        assert!(pad.is_empty());
        assert!(pad.strokes().is_empty());
    }

    #[test]
    fn test_single_tap_counts_as_empty() {
        let mut pad = SignaturePad::new();
        pad.pointer_down(10.0, 10.0);
        pad.pointer_up();
        assert!(pad.is_empty());
    }

    #[test]
    fn test_clear_resets_pad() {
        let mut pad = SignaturePad::new();
        pad.pointer_down(10.0, 10.0);
        pad.pointer_move(20.0, 20.0);
        pad.clear();
        assert!(pad.is_empty());
        assert!(pad.strokes().is_empty());
    }

    #[test]
    fn test_anchor_serializes_camel_case() {
        let mut anchor = SignatureAnchor::new(3, 12.5, 40.0);
        let json = serde_json::to_string(&anchor).unwrap();
        assert_eq!(json, r#"{"page":3,"x":12.5,"y":40.0,"signed":false}"#);

        anchor.signed = true;
        anchor.image_data = Some("sig".to_string());
        let json = serde_json::to_string(&anchor).unwrap();
        assert!(json.contains("\"imageData\":\"sig\""));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: signing all anchors in any order produces exactly one
        /// completion signal
        #[test]
        fn completion_fires_once_for_any_order(
            count in 1usize..12,
            seed in any::<u64>(),
        ) {
            let mut engine = SignatureEngine::new(
                (0..count).map(|i| SignatureAnchor::new(1, i as f64, 0.0)).collect(),
            );

            // Deterministic shuffle of the signing order
            let mut order: Vec<usize> = (0..count).collect();
            let mut state = seed | 1;
            for i in (1..order.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                order.swap(i, (state as usize) % (i + 1));
            }

            let mut completions = 0;
            for index in order {
                prop_assert!(engine.select(index));
                let outcome = engine.commit("data:image/png;base64,AA==").unwrap();
                if outcome.completed_all {
                    completions += 1;
                }
            }
            prop_assert_eq!(completions, 1);
            prop_assert!(engine.all_signed());
        }

        /// Property: dragging never places an anchor outside the container
        #[test]
        fn drag_stays_inside_container(
            width in 1.0f64..2000.0,
            height in 1.0f64..2000.0,
            moves in proptest::collection::vec((-3000.0f64..3000.0, -3000.0f64..3000.0), 1..30),
        ) {
            let container = ContainerRect::new(0.0, 0.0, width, height);
            let mut engine = SignatureEngine::new(vec![SignatureAnchor::new(1, 0.0, 0.0)]);
            for (x, y) in moves {
                engine.drag_to(0, x, y, &container);
                let anchor = &engine.anchors()[0];
                prop_assert!(anchor.x >= 0.0 && anchor.x <= width);
                prop_assert!(anchor.y >= 0.0 && anchor.y <= height);
            }
        }
    }
}
