//! Browser implementations of the platform capability interface
//!
//! Thin wrappers over the DOM: anchor-element download, native share sheet
//! with clipboard fallback, and fullscreen on the attached container. Async
//! promises are fire-and-forget; their failures are logged, never thrown.

use std::cell::RefCell;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlAnchorElement, ShareData};

use docview_core::{Platform, ViewerError};

#[derive(Default)]
pub struct BrowserPlatform {
    container: RefCell<Option<web_sys::Element>>,
}

impl BrowserPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the DOM element hosting the document surface; fullscreen
    /// requests target it.
    pub fn attach(&self, container: web_sys::Element) {
        *self.container.borrow_mut() = Some(container);
    }
}

fn window() -> Result<web_sys::Window, ViewerError> {
    web_sys::window().ok_or_else(|| ViewerError::Platform("no window".to_string()))
}

fn platform_err(context: &str, value: JsValue) -> ViewerError {
    ViewerError::Platform(format!("{context}: {value:?}"))
}

impl Platform for BrowserPlatform {
    fn trigger_download(&self, url: &str, file_name: &str) -> Result<(), ViewerError> {
        let document = window()?
            .document()
            .ok_or_else(|| ViewerError::Platform("no document".to_string()))?;
        let body = document
            .body()
            .ok_or_else(|| ViewerError::Platform("no body".to_string()))?;

        let link: HtmlAnchorElement = document
            .create_element("a")
            .map_err(|e| platform_err("create link", e))?
            .dyn_into()
            .map_err(|_| ViewerError::Platform("not an anchor element".to_string()))?;
        link.set_href(url);
        link.set_download(file_name);

        body.append_child(&link)
            .map_err(|e| platform_err("append link", e))?;
        link.click();
        body.remove_child(&link)
            .map_err(|e| platform_err("remove link", e))?;
        Ok(())
    }

    fn share(&self, url: &str, title: &str) -> Result<(), ViewerError> {
        let navigator = window()?.navigator();
        let has_share = js_sys::Reflect::has(navigator.as_ref(), &JsValue::from_str("share"))
            .unwrap_or(false);
        if has_share {
            let data = ShareData::new();
            data.set_title(title);
            data.set_url(url);
            let promise = navigator.share_with_data(&data);
            let fallback_url = url.to_string();
            wasm_bindgen_futures::spawn_local(async move {
                if JsFuture::from(promise).await.is_err() {
                    copy_to_clipboard(&fallback_url);
                }
            });
        } else {
            copy_to_clipboard(url);
        }
        Ok(())
    }

    fn set_fullscreen(&self, active: bool) -> Result<(), ViewerError> {
        let document = window()?
            .document()
            .ok_or_else(|| ViewerError::Platform("no document".to_string()))?;
        if active {
            let container = self.container.borrow();
            let element = container
                .as_ref()
                .ok_or_else(|| ViewerError::Platform("no container attached".to_string()))?;
            element
                .request_fullscreen()
                .map_err(|e| platform_err("fullscreen request", e))
        } else {
            if document.fullscreen_element().is_some() {
                document.exit_fullscreen();
            }
            Ok(())
        }
    }
}

/// Copy a URL to the clipboard; used as the share fallback.
fn copy_to_clipboard(text: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let promise = window.navigator().clipboard().write_text(text);
    wasm_bindgen_futures::spawn_local(async move {
        if JsFuture::from(promise).await.is_err() {
            web_sys::console::warn_1(&"Clipboard copy failed".into());
        }
    });
}
