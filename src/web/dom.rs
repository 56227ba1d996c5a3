//! DOM implementations of the overlay and grid surfaces, plus the wrapper markup.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use crate::cell::CellId;
use crate::consts::{
    CELL_CONTAINER_CLASS, CELL_CONTAINER_Z_INDEX, CELL_WRAPPER_ID_ATTR, GRID_CONTAINER_CLASS, GRID_LAYOUT_CLASS,
    OVERLAY_Z_INDEX,
};
use crate::grid_host::GridSurface;
use crate::overlay::{OverlayElement, OverlaySurface};
use crate::wrapper::CellWrapper;

/// Class of the wrapper's title bar.
pub const TITLE_BAR_CLASS: &str = "cell-3d-titlebar";

/// Class of the wrapper's content region.
pub const CONTENT_CLASS: &str = "cell-3d-content";

const STYLES: &str = "
.cells-3d-container > * { pointer-events: auto; }
.cells-3d-container > .cell-3d-wrapper { position: absolute; top: 0; left: 0; }
.grid-3d-container > * { pointer-events: all; }
.cell-3d-wrapper .cell-3d-titlebar { cursor: grab; user-select: none; }
.cell-3d-wrapper.dragging .cell-3d-titlebar { cursor: grabbing; }
";

pub fn create_div(document: &Document, class: &str) -> Result<HtmlElement, JsValue> {
    let element: HtmlElement = document.create_element("div")?.dyn_into()?;
    element.set_class_name(class);
    Ok(element)
}

fn set_styles(element: &HtmlElement, styles: &[(&str, &str)]) -> Result<(), JsValue> {
    let style = element.style();
    for (name, value) in styles {
        style.set_property(name, value)?;
    }
    Ok(())
}

fn set_style(element: &HtmlElement, name: &str, value: &str) {
    if let Err(err) = element.style().set_property(name, value) {
        tracing::warn!(?err, name, "style not applied");
    }
}

fn remove_style(element: &HtmlElement, name: &str) {
    if let Err(err) = element.style().remove_property(name) {
        tracing::warn!(?err, name, "style not removed");
    }
}

// =============================================================
// Overlay
// =============================================================

/// An overlay-positioned element. Equality is DOM node identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomElement(pub HtmlElement);

impl OverlayElement for DomElement {
    fn set_transform(&self, transform: &str) {
        set_style(&self.0, "transform", transform);
    }

    fn set_visible(&self, visible: bool) {
        if visible {
            remove_style(&self.0, "display");
        } else {
            set_style(&self.0, "display", "none");
        }
    }

    fn set_z_index(&self, z_index: i32) {
        set_style(&self.0, "z-index", &z_index.to_string());
    }
}

/// The overlay layer over the WebGL canvas and the shared cell container in it.
pub struct DomOverlay {
    root: HtmlElement,
    container: HtmlElement,
    style: Element,
}

impl DomOverlay {
    pub fn create(document: &Document, host: &HtmlElement) -> Result<Self, JsValue> {
        let root = create_div(document, "cells-3d-overlay")?;
        set_styles(
            &root,
            &[
                ("position", "absolute"),
                ("top", "0"),
                ("left", "0"),
                ("overflow", "hidden"),
                ("pointer-events", "none"),
                ("z-index", &OVERLAY_Z_INDEX.to_string()),
            ],
        )?;
        let container = create_div(document, CELL_CONTAINER_CLASS)?;
        set_styles(
            &container,
            &[
                ("position", "absolute"),
                ("top", "0"),
                ("left", "0"),
                ("width", "100%"),
                ("height", "100%"),
                ("pointer-events", "none"),
                ("z-index", &CELL_CONTAINER_Z_INDEX.to_string()),
            ],
        )?;
        root.append_child(&container)?;
        host.append_child(&root)?;

        let style = document.create_element("style")?;
        style.set_text_content(Some(STYLES));
        document.head().ok_or_else(|| JsValue::from_str("document has no head"))?.append_child(&style)?;
        Ok(Self { root, container, style })
    }

    pub fn container_element(&self) -> &HtmlElement {
        &self.container
    }

    pub fn root_element(&self) -> &HtmlElement {
        &self.root
    }
}

impl OverlaySurface for DomOverlay {
    type Element = DomElement;

    fn set_size(&mut self, width: f64, height: f64) {
        set_style(&self.root, "width", &format!("{width}px"));
        set_style(&self.root, "height", &format!("{height}px"));
    }

    fn set_container_visible(&mut self, visible: bool) {
        set_style(&self.container, "display", if visible { "block" } else { "none" });
    }

    fn container(&self) -> Option<DomElement> {
        Some(DomElement(self.container.clone()))
    }

    fn clear_container(&mut self) {
        self.container.set_inner_html("");
    }

    fn remove(&mut self) {
        self.container.remove();
        self.root.remove();
        self.style.remove();
    }
}

/// Wrapper element of `cell` inside the shared container, if mounted.
pub fn find_wrapper(container: &HtmlElement, cell: &CellId) -> Option<HtmlElement> {
    match container.query_selector(&cell.wrapper_selector()) {
        Ok(found) => found.and_then(|element| element.dyn_ref::<HtmlElement>().cloned()),
        Err(err) => {
            tracing::warn!(?err, %cell, "wrapper lookup failed");
            None
        }
    }
}

// =============================================================
// Wrapper markup
// =============================================================

/// The DOM of one cell wrapper.
pub struct WrapperDom {
    pub root: HtmlElement,
    pub title_bar: HtmlElement,
    pub title: HtmlElement,
    pub content: HtmlElement,
}

impl WrapperDom {
    pub fn build(document: &Document, wrapper: &CellWrapper) -> Result<Self, JsValue> {
        let root = create_div(document, &wrapper.class_name())?;
        root.set_attribute(CELL_WRAPPER_ID_ATTR, wrapper.id().as_str())?;
        let title_bar = create_div(document, TITLE_BAR_CLASS)?;
        let title: HtmlElement = document.create_element("span")?.dyn_into()?;
        title.set_text_content(Some(wrapper.title()));
        title_bar.append_child(&title)?;
        let content = create_div(document, CONTENT_CLASS)?;
        root.append_child(&title_bar)?;
        root.append_child(&content)?;
        Ok(Self { root, title_bar, title, content })
    }

    /// Re-apply title and class from `wrapper`.
    pub fn sync(&self, wrapper: &CellWrapper) {
        self.root.set_class_name(&wrapper.class_name());
        self.title.set_text_content(Some(wrapper.title()));
    }
}

// =============================================================
// Grid container
// =============================================================

/// The single grid container and the external layout root inside it.
pub struct DomGrid {
    container: HtmlElement,
}

impl DomGrid {
    pub fn create(document: &Document) -> Result<Self, JsValue> {
        let container = create_div(document, GRID_CONTAINER_CLASS)?;
        set_styles(
            &container,
            &[
                ("position", "absolute"),
                ("top", "0"),
                ("left", "0"),
                ("width", "100%"),
                ("height", "100%"),
                ("pointer-events", "none"),
            ],
        )?;
        Ok(Self { container })
    }

    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    fn layout_root(&self) -> Option<HtmlElement> {
        let selector = format!(".{GRID_LAYOUT_CLASS}");
        match self.container.query_selector(&selector) {
            Ok(found) => found.and_then(|element| element.dyn_ref::<HtmlElement>().cloned()),
            Err(err) => {
                tracing::warn!(?err, "grid layout lookup failed");
                None
            }
        }
    }
}

impl GridSurface for DomGrid {
    fn container_transform(&self) -> Option<String> {
        match self.container.style().get_property_value("transform") {
            Ok(value) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(?err, "grid transform unreadable");
                None
            }
        }
    }

    fn set_container_transform(&mut self, transform: &str) {
        set_style(&self.container, "transform", transform);
    }

    fn layout_rect(&self) -> Option<(f64, f64)> {
        let rect = self.layout_root()?.get_bounding_client_rect();
        Some((rect.width(), rect.height()))
    }

    fn set_layout_size(&mut self, width: &str, height: &str) -> bool {
        let Some(root) = self.layout_root() else {
            return false;
        };
        set_style(&root, "width", width);
        set_style(&root, "height", height);
        true
    }

    fn clear_layout_size(&mut self) -> bool {
        let Some(root) = self.layout_root() else {
            return false;
        };
        remove_style(&root, "width");
        remove_style(&root, "height");
        true
    }
}
