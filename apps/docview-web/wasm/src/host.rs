//! JavaScript callback slots implementing the core host interface
//!
//! The hosting page passes a callbacks object at construction; missing
//! entries are simply skipped. Callback exceptions are swallowed so nothing
//! throws back across the viewer boundary.

use std::cell::RefCell;

use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};

use docview_core::{SignatureAnchor, ViewerHost, ViewingSession};

#[derive(Default)]
pub struct JsHost {
    load_success: RefCell<Option<Function>>,
    load_error: RefCell<Option<Function>>,
    security_violation: RefCell<Option<Function>>,
    viewing_complete: RefCell<Option<Function>>,
    signatures_changed: RefCell<Option<Function>>,
    signing_complete: RefCell<Option<Function>>,
}

impl JsHost {
    /// Read `{ onLoadSuccess, onLoadError, onSecurityViolation,
    /// onViewingComplete, onSignaturesChanged, onSigningComplete }` from the
    /// callbacks object, all optional.
    pub fn from_callbacks(callbacks: &JsValue) -> Self {
        let host = Self::default();
        if callbacks.is_undefined() || callbacks.is_null() {
            return host;
        }
        *host.load_success.borrow_mut() = lookup(callbacks, "onLoadSuccess");
        *host.load_error.borrow_mut() = lookup(callbacks, "onLoadError");
        *host.security_violation.borrow_mut() = lookup(callbacks, "onSecurityViolation");
        *host.viewing_complete.borrow_mut() = lookup(callbacks, "onViewingComplete");
        *host.signatures_changed.borrow_mut() = lookup(callbacks, "onSignaturesChanged");
        *host.signing_complete.borrow_mut() = lookup(callbacks, "onSigningComplete");
        host
    }

    fn invoke(slot: &RefCell<Option<Function>>, value: &JsValue) {
        if let Some(function) = slot.borrow().as_ref() {
            let _ = function.call1(&JsValue::NULL, value);
        }
    }
}

fn lookup(callbacks: &JsValue, key: &str) -> Option<Function> {
    js_sys::Reflect::get(callbacks, &JsValue::from_str(key))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
}

impl ViewerHost for JsHost {
    fn on_load_success(&self, page_count: u32) {
        Self::invoke(&self.load_success, &JsValue::from(page_count));
    }

    fn on_load_error(&self, message: &str) {
        web_sys::console::error_1(&format!("Document load failed: {message}").into());
        Self::invoke(&self.load_error, &JsValue::from_str(message));
    }

    fn on_security_violation(&self, violation: &str) {
        web_sys::console::warn_1(&format!("Security violation: {violation}").into());
        Self::invoke(&self.security_violation, &JsValue::from_str(violation));
    }

    fn on_viewing_complete(&self, session: &ViewingSession) {
        // json_compatible keeps the per-page view map a plain object
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        match session.serialize(&serializer) {
            Ok(value) => Self::invoke(&self.viewing_complete, &value),
            Err(e) => web_sys::console::error_1(
                &format!("Failed to serialize viewing session: {e}").into(),
            ),
        }
    }

    fn on_signatures_changed(&self, anchors: &[SignatureAnchor]) {
        match serde_wasm_bindgen::to_value(anchors) {
            Ok(value) => Self::invoke(&self.signatures_changed, &value),
            Err(e) => web_sys::console::error_1(
                &format!("Failed to serialize anchors: {e}").into(),
            ),
        }
    }

    fn on_signing_complete(&self) {
        if let Some(function) = self.signing_complete.borrow().as_ref() {
            let _ = function.call0(&JsValue::NULL);
        }
    }
}
