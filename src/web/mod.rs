//! Browser shell.
//!
//! ARCHITECTURE
//! ============
//! [`SpatialNotebook`] is the `#[wasm_bindgen]` facade the host page talks to. It
//! owns one [`Shell`] holding every core component in its own `RefCell`, so a
//! callback fired from inside one component (the scene manager's overlay pass, the
//! drag manager's position updates) can still reach the others. All closures
//! registered with the browser hold a `Weak<Shell>` and do nothing once the
//! notebook is gone.

mod dom;
mod grid;
mod scheduler;
mod webgl;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use glam::{DVec2, DVec3};
use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, MouseEvent, MutationObserver, MutationObserverInit, WheelEvent};

use crate::camera::PerspectiveCamera;
use crate::cell::{CellId, CellMeta};
use crate::cells::CellsLayout;
use crate::config::{LayoutMode, ViewConfig};
use crate::controls::{NavigationControls, PointerButton};
use crate::drag::DragManager;
use crate::error::SpatialError;
use crate::host::{FrameId, PointerEvent};
use crate::overlay::{OverlayService, ScaleSource};
use crate::scene::Scene;
use crate::scene_manager::SceneManager;
use crate::wrapper::PointerTarget;

use dom::{DomElement, DomOverlay, WrapperDom, find_wrapper};
use grid::MountedGrid;
use scheduler::{Listener, RafScheduler, WebDragHost, WebPointer, WebSceneHost};
use webgl::WebGlBackend;

impl From<SpatialError> for JsValue {
    fn from(err: SpatialError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// A cell wrapper's DOM and the listeners bound to it.
struct MountedWrapper {
    dom: WrapperDom,
    _listeners: Vec<Listener>,
}

/// Watches the cell container for structural changes made by the host page.
struct ContainerObserver {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl Drop for ContainerObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

pub(crate) struct Shell {
    document: Document,
    config: ViewConfig,
    overlay_root: HtmlElement,
    cell_container: HtmlElement,
    scene: RefCell<SceneManager<WebGlBackend, WebSceneHost>>,
    overlay: RefCell<OverlayService<DomOverlay>>,
    cells: RefCell<CellsLayout>,
    drag: RefCell<DragManager<WebDragHost>>,
    wrappers: RefCell<HashMap<CellId, MountedWrapper>>,
    grid: RefCell<Option<MountedGrid>>,
    input: RefCell<Vec<Listener>>,
    observer: RefCell<Option<ContainerObserver>>,
    reconcile: RefCell<Option<Timeout>>,
}

impl Shell {
    fn mark_needs_render(&self) {
        if let Ok(mut scene) = self.scene.try_borrow_mut() {
            scene.mark_needs_render();
        }
        if let Ok(mut overlay) = self.overlay.try_borrow_mut() {
            overlay.mark_needs_render();
        }
    }

    // --- Frames ---

    fn scene_frame(shell: &Weak<Self>, frame: FrameId, now: f64) {
        let Some(shell) = shell.upgrade() else {
            return;
        };
        match shell.scene.try_borrow_mut() {
            Ok(mut scene) => {
                scene.tick(frame, now);
            }
            Err(_) => tracing::warn!("scene busy; frame dropped"),
        }
    }

    fn drag_frame(shell: &Weak<Self>, frame: FrameId) {
        let Some(shell) = shell.upgrade() else {
            return;
        };
        match shell.drag.try_borrow_mut() {
            Ok(mut drag) => drag.run_frame(frame),
            Err(_) => tracing::warn!("drag busy; frame dropped"),
        }
    }

    fn resized(shell: &Weak<Self>) {
        let Some(shell) = shell.upgrade() else {
            return;
        };
        let size = match shell.scene.try_borrow_mut() {
            Ok(mut scene) => scene.handle_resize(),
            Err(_) => None,
        };
        if let (Some((width, height)), Ok(mut overlay)) = (size, shell.overlay.try_borrow_mut()) {
            overlay.set_size(width, height);
        }
    }

    // --- Drag ---

    fn begin_drag(&self, cell: &CellId, event: &MouseEvent, target: PointerTarget) {
        let started = {
            let (Ok(overlay), Ok(mut drag), Ok(mut cells)) =
                (self.overlay.try_borrow(), self.drag.try_borrow_mut(), self.cells.try_borrow_mut())
            else {
                tracing::warn!(%cell, "drag not started: components busy");
                return;
            };
            cells.title_pointer_down(cell, &WebPointer(event), target, &overlay, &mut drag)
        };
        if started {
            if let Ok(mut overlay) = self.overlay.try_borrow_mut() {
                overlay.set_interacting(true);
            }
            self.sync_wrapper(cell);
        }
    }

    fn drag_moved(shell: &Weak<Self>, client: DVec2) {
        let Some(shell) = shell.upgrade() else {
            return;
        };
        if let Ok(mut drag) = shell.drag.try_borrow_mut() {
            drag.pointer_move(client);
        }
    }

    fn drag_released(shell: &Weak<Self>) {
        let Some(shell) = shell.upgrade() else {
            return;
        };
        let ended = match shell.drag.try_borrow_mut() {
            Ok(mut drag) => drag.pointer_up(),
            Err(_) => None,
        };
        let Some(cell) = ended else {
            return;
        };
        if let Ok(mut cells) = shell.cells.try_borrow_mut() {
            cells.drag_ended(&cell);
        }
        if let Ok(mut overlay) = shell.overlay.try_borrow_mut() {
            overlay.set_interacting(false);
        }
        shell.sync_wrapper(&cell);
    }

    fn drag_position(shell: &Weak<Self>, cell: &CellId, position: DVec3) {
        let Some(shell) = shell.upgrade() else {
            return;
        };
        {
            let (Ok(mut cells), Ok(mut overlay)) = (shell.cells.try_borrow_mut(), shell.overlay.try_borrow_mut())
            else {
                tracing::warn!(%cell, "drag position dropped: components busy");
                return;
            };
            cells.on_drag_position(&mut overlay, cell, position);
        }
        if let Ok(mut scene) = shell.scene.try_borrow_mut() {
            scene.mark_needs_render();
        }
    }

    /// Re-apply class and title of `cell`'s wrapper DOM.
    fn sync_wrapper(&self, cell: &CellId) {
        let (Ok(cells), Ok(wrappers)) = (self.cells.try_borrow(), self.wrappers.try_borrow()) else {
            return;
        };
        if let (Some(wrapper), Some(mounted)) = (cells.wrapper(cell), wrappers.get(cell)) {
            mounted.dom.sync(wrapper);
        }
    }

    // --- Reconciliation ---

    /// Schedule one placement pass after the current DOM updates settle.
    fn schedule_reconcile(shell: &Rc<Self>) {
        let first = match shell.cells.try_borrow_mut() {
            Ok(mut cells) => cells.request_reconcile(),
            Err(_) => true,
        };
        if !first {
            return;
        }
        let weak = Rc::downgrade(shell);
        let timeout = Timeout::new(0, move || {
            if let Some(shell) = weak.upgrade() {
                shell.reconcile();
            }
        });
        shell.reconcile.replace(Some(timeout));
    }

    fn reconcile(&self) {
        let changed = {
            let (Ok(mut cells), Ok(mut overlay)) = (self.cells.try_borrow_mut(), self.overlay.try_borrow_mut()) else {
                tracing::warn!("reconcile skipped: components busy");
                return;
            };
            if !cells.take_reconcile_request() {
                return;
            }
            let container = &self.cell_container;
            cells.reconcile(&mut overlay, |id| find_wrapper(container, id).map(DomElement)).changed()
        };
        if changed {
            self.mark_needs_render();
        }
    }

    // --- Wrappers ---

    fn mount_wrapper(shell: &Rc<Self>, cell: &CellId) -> Result<(), JsValue> {
        let dom = {
            let cells = shell.cells.try_borrow().map_err(|_| SpatialError::Dom("cells busy".into()))?;
            let wrapper = cells.wrapper(cell).ok_or_else(|| SpatialError::UnknownCell(cell.clone()))?;
            WrapperDom::build(&shell.document, wrapper)?
        };

        let weak = Rc::downgrade(shell);
        let title_cell = cell.clone();
        let title = Listener::new(&dom.title_bar, "pointerdown", move |event| {
            let (Some(shell), Some(mouse)) = (weak.upgrade(), event.dyn_ref::<MouseEvent>()) else {
                return;
            };
            shell.begin_drag(&title_cell, mouse, classify_target(&event));
        })?;

        let weak = Rc::downgrade(shell);
        let content_cell = cell.clone();
        let content = Listener::new(&dom.content, "pointerdown", move |event| {
            let (Some(shell), Some(mouse)) = (weak.upgrade(), event.dyn_ref::<MouseEvent>()) else {
                return;
            };
            if let Ok(cells) = shell.cells.try_borrow() {
                if let Some(wrapper) = cells.wrapper(&content_cell) {
                    wrapper.content_pointer_down(&WebPointer(mouse));
                }
            }
        })?;

        shell.cell_container.append_child(&dom.root)?;
        let element = DomElement(dom.root.clone());
        let mounted = MountedWrapper { dom, _listeners: vec![title, content] };
        shell
            .wrappers
            .try_borrow_mut()
            .map_err(|_| SpatialError::Dom("wrappers busy".into()))?
            .insert(cell.clone(), mounted);

        let placed = {
            let (Ok(mut cells), Ok(mut overlay)) = (shell.cells.try_borrow_mut(), shell.overlay.try_borrow_mut())
            else {
                tracing::warn!(%cell, "wrapper mounted but not placed: components busy");
                return Ok(());
            };
            cells.cell_mounted(&mut overlay, cell, element).is_some()
        };
        if placed {
            shell.mark_needs_render();
        }
        Ok(())
    }

    /// Drop the wrappers of cells no longer in the list and detach their overlay
    /// objects right away instead of waiting for the deferred pass.
    fn unmount_stale_wrappers(&self) {
        let stale: Vec<CellId> = {
            let (Ok(cells), Ok(mut wrappers)) = (self.cells.try_borrow(), self.wrappers.try_borrow_mut()) else {
                tracing::warn!("stale wrappers kept: components busy");
                return;
            };
            let stale: Vec<CellId> = wrappers.keys().filter(|id| cells.wrapper(id).is_none()).cloned().collect();
            for id in &stale {
                if let Some(mounted) = wrappers.remove(id) {
                    mounted.dom.root.remove();
                }
            }
            stale
        };
        if stale.is_empty() {
            return;
        }
        let removed = {
            let (Ok(mut cells), Ok(mut overlay)) = (self.cells.try_borrow_mut(), self.overlay.try_borrow_mut()) else {
                tracing::warn!("stale overlay objects left for the next pass: components busy");
                return;
            };
            stale.iter().filter(|id| cells.cell_unmounted(&mut overlay, id)).count()
        };
        if removed > 0 {
            self.mark_needs_render();
        }
    }

    // --- Input ---

    fn bind_navigation(shell: &Rc<Self>, element: &HtmlElement) -> Result<(), JsValue> {
        let mut listeners = Vec::new();

        let weak = Rc::downgrade(shell);
        listeners.push(Listener::new(element, "pointerdown", move |event| {
            let (Some(shell), Some(mouse)) = (weak.upgrade(), event.dyn_ref::<MouseEvent>()) else {
                return;
            };
            let button = match mouse.button() {
                0 => PointerButton::Primary,
                1 => PointerButton::Middle,
                2 => PointerButton::Secondary,
                _ => return,
            };
            shell.with_controls(|controls| controls.pointer_down(button, WebPointer(mouse).client_pos()));
        })?);

        let weak = Rc::downgrade(shell);
        listeners.push(Listener::new(element, "pointermove", move |event| {
            let (Some(shell), Some(mouse)) = (weak.upgrade(), event.dyn_ref::<MouseEvent>()) else {
                return;
            };
            shell.with_controls(|controls| controls.pointer_move(WebPointer(mouse).client_pos()));
        })?);

        for kind in ["pointerup", "pointerleave"] {
            let weak = Rc::downgrade(shell);
            listeners.push(Listener::new(element, kind, move |_| {
                if let Some(shell) = weak.upgrade() {
                    shell.with_controls(NavigationControls::pointer_up);
                }
            })?);
        }

        let weak = Rc::downgrade(shell);
        listeners.push(Listener::new(element, "wheel", move |event| {
            let (Some(shell), Some(wheel)) = (weak.upgrade(), event.dyn_ref::<WheelEvent>()) else {
                return;
            };
            wheel.prevent_default();
            shell.with_controls(|controls| controls.wheel(wheel.delta_y()));
        })?);

        listeners.push(Listener::new(element, "contextmenu", |event| event.prevent_default())?);

        shell.input.replace(listeners);
        Ok(())
    }

    fn with_controls(&self, f: impl FnOnce(&mut NavigationControls)) {
        match self.scene.try_borrow_mut() {
            Ok(mut scene) => {
                if let Some(controls) = scene.controls_mut() {
                    f(controls);
                }
            }
            Err(_) => tracing::trace!("scene busy; input dropped"),
        }
    }

    fn observe_container(shell: &Rc<Self>) -> Result<(), JsValue> {
        let weak = Rc::downgrade(shell);
        let callback = Closure::wrap(Box::new(move |_records: js_sys::Array, _observer: MutationObserver| {
            if let Some(shell) = weak.upgrade() {
                Self::schedule_reconcile(&shell);
            }
        }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(&shell.cell_container, &options)?;
        shell.observer.replace(Some(ContainerObserver { observer, _callback: callback }));
        Ok(())
    }

    fn dispose(&self) {
        if let Ok(mut drag) = self.drag.try_borrow_mut() {
            drag.dispose();
        }
        match self.input.try_borrow_mut() {
            Ok(mut input) => input.clear(),
            Err(_) => tracing::warn!("input listeners busy; left registered"),
        }
        self.observer.replace(None);
        self.reconcile.replace(None);

        let grid = match self.grid.try_borrow_mut() {
            Ok(mut grid) => grid.take(),
            Err(_) => None,
        };
        if let (Some(mut mounted), Ok(mut overlay)) = (grid, self.overlay.try_borrow_mut()) {
            mounted.host.dispose(&mut overlay);
            mounted.host.surface().container().remove();
        }
        if let (Ok(mut cells), Ok(mut overlay)) = (self.cells.try_borrow_mut(), self.overlay.try_borrow_mut()) {
            cells.dispose(&mut overlay);
            overlay.dispose();
        }
        if let Ok(mut wrappers) = self.wrappers.try_borrow_mut() {
            wrappers.clear();
        }
        if let Ok(mut scene) = self.scene.try_borrow_mut() {
            scene.dispose();
        }
    }
}

/// Whether a title-bar pointer-down may start a drag.
fn classify_target(event: &web_sys::Event) -> PointerTarget {
    let Some(element) = event.target().and_then(|target| target.dyn_ref::<Element>().cloned()) else {
        return PointerTarget::TitleBar;
    };
    let inside_no_drag = match element.closest(&PointerTarget::no_drag_selector()) {
        Ok(found) => found.is_some(),
        Err(err) => {
            tracing::warn!(?err, "no-drag lookup failed");
            false
        }
    };
    PointerTarget::classify(&element.tag_name(), inside_no_drag)
}

/// Drag scale read from the overlay at every drag update.
struct OverlayScale(Weak<Shell>);

impl ScaleSource for OverlayScale {
    fn current_scale(&self) -> f64 {
        self.0.upgrade().map_or(1.0, |shell| shell.overlay.current_scale())
    }
}

fn install_logging() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        tracing::debug!(%err, "console logger already installed");
    }
}

/// The spatial notebook view bound to one host element.
#[wasm_bindgen]
pub struct SpatialNotebook {
    shell: Rc<Shell>,
}

#[wasm_bindgen]
impl SpatialNotebook {
    /// Build the 3D view inside `host`. `config_json` is a camelCase view
    /// configuration; empty means defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(host: HtmlElement, config_json: &str) -> Result<SpatialNotebook, JsValue> {
        install_logging();
        let config = ViewConfig::from_json(config_json)?;
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| SpatialError::Dom("no document".into()))?;

        let backend = WebGlBackend::create(&document, &host)?;
        let surface = DomOverlay::create(&document, &host)?;
        let cell_container = surface.container_element().clone();
        let overlay_root = surface.root_element().clone();

        let shell = Rc::new_cyclic(|weak: &Weak<Shell>| {
            let frame_shell = Weak::clone(weak);
            let move_shell = Weak::clone(weak);
            let up_shell = Weak::clone(weak);
            let drag_host = WebDragHost::new(
                RafScheduler::new(Rc::new(move |frame: FrameId, _now: f64| Shell::drag_frame(&frame_shell, frame))),
                Rc::new(move |client: DVec2| Shell::drag_moved(&move_shell, client)),
                Rc::new(move || Shell::drag_released(&up_shell)),
            );
            let mut drag = DragManager::new(drag_host);
            let position_shell = Weak::clone(weak);
            drag.set_position_callback(Box::new(move |cell: &CellId, position: DVec3| {
                Shell::drag_position(&position_shell, cell, position);
            }));

            drag.set_scale_source(Rc::new(OverlayScale(Weak::clone(weak))));
            let cells = CellsLayout::new(&config);
            drag.set_constraints(cells.drag_constraints());

            Shell {
                document: document.clone(),
                config: config.clone(),
                overlay_root,
                cell_container,
                scene: RefCell::new(SceneManager::new(&config)),
                overlay: RefCell::new(OverlayService::new(&config.scene)),
                cells: RefCell::new(cells),
                drag: RefCell::new(drag),
                wrappers: RefCell::default(),
                grid: RefCell::default(),
                input: RefCell::default(),
                observer: RefCell::default(),
                reconcile: RefCell::default(),
            }
        });

        let weak = Rc::downgrade(&shell);
        let frame_shell = Weak::clone(&weak);
        let resize_shell = Weak::clone(&weak);
        let scene_host = WebSceneHost::new(
            host.clone(),
            RafScheduler::new(Rc::new(move |frame: FrameId, now: f64| Shell::scene_frame(&frame_shell, frame, now))),
            Rc::new(move || Shell::resized(&resize_shell)),
        );
        {
            let (Ok(mut scene), Ok(mut overlay)) = (shell.scene.try_borrow_mut(), shell.overlay.try_borrow_mut())
            else {
                return Err(SpatialError::SceneBusy.into());
            };
            scene.initialize(backend, scene_host);
            let (width, height) = scene.viewport().unwrap_or_default();
            overlay.initialize_renderer(surface, width, height);
            if let Some(handle) = scene.scene() {
                overlay.set_scene(handle);
            }
            if shell.config.layout == LayoutMode::Grid {
                overlay.hide_cell_container();
            }
            let overlay_shell = Weak::clone(&weak);
            scene.set_overlay_callback(Box::new(move |scene: &Scene, camera: &PerspectiveCamera| {
                let Some(shell) = overlay_shell.upgrade() else {
                    return;
                };
                match shell.overlay.try_borrow_mut() {
                    Ok(mut overlay) => {
                        overlay.render(scene, camera);
                    }
                    Err(_) => tracing::warn!("overlay busy; projection skipped"),
                }
            }));
        }

        Shell::bind_navigation(&shell, &host)?;
        Shell::observe_container(&shell)?;
        tracing::info!(layout = ?shell.config.layout, "spatial notebook ready");
        Ok(Self { shell })
    }

    /// Replace the cell list with a JSON array of `{ "id": ..., "name": ... }`.
    /// New cells get a wrapper in the shared container; removed cells lose theirs.
    #[wasm_bindgen(js_name = setCells)]
    pub fn set_cells(&self, cells_json: &str) -> Result<(), JsValue> {
        let metas: Vec<CellMeta> =
            serde_json::from_str(cells_json).map_err(|err| SpatialError::Config(err.to_string()))?;
        let added = match self.shell.cells.try_borrow_mut() {
            Ok(mut cells) => cells.set_cells(&metas),
            Err(_) => {
                tracing::warn!("cell list busy; update dropped");
                return Err(SpatialError::Dom("cell list busy".into()).into());
            }
        };
        self.shell.unmount_stale_wrappers();
        let ids: Vec<CellId> = match self.shell.wrappers.try_borrow() {
            Ok(wrappers) => wrappers.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        for id in &ids {
            self.shell.sync_wrapper(id);
        }
        for id in &added {
            if let Err(err) = Shell::mount_wrapper(&self.shell, id) {
                tracing::warn!(cell = %id, ?err, "wrapper not mounted");
            }
        }
        Shell::schedule_reconcile(&self.shell);
        Ok(())
    }

    /// The content region of `cell_id`'s wrapper, where the cell UI is rendered.
    #[wasm_bindgen(js_name = contentElement)]
    pub fn content_element(&self, cell_id: &str) -> Option<HtmlElement> {
        let Ok(wrappers) = self.shell.wrappers.try_borrow() else {
            tracing::warn!(cell_id, "wrappers busy; content element unavailable");
            return None;
        };
        wrappers.get(&CellId::from(cell_id)).map(|mounted| mounted.dom.content.clone())
    }

    /// The shared container all cell wrappers live in.
    #[wasm_bindgen(js_name = cellContainer)]
    pub fn cell_container(&self) -> Option<HtmlElement> {
        let Ok(overlay) = self.shell.overlay.try_borrow() else {
            tracing::warn!("overlay busy; container unavailable");
            return None;
        };
        overlay.cell_container().map(|element| element.0)
    }

    /// Current world position of a cell as `[x, y, z]`.
    #[wasm_bindgen(js_name = cellPosition)]
    pub fn cell_position(&self, cell_id: &str) -> Option<Vec<f64>> {
        let Ok(cells) = self.shell.cells.try_borrow() else {
            tracing::warn!(cell_id, "cells busy; position unavailable");
            return None;
        };
        let position = cells.position(&CellId::from(cell_id))?;
        Some(position.to_array().to_vec())
    }

    /// Ask for a render and a projection pass on the next eligible frame.
    #[wasm_bindgen(js_name = markNeedsRender)]
    pub fn mark_needs_render(&self) {
        self.shell.mark_needs_render();
    }

    #[wasm_bindgen(js_name = hideCells)]
    pub fn hide_cells(&self) {
        match self.shell.overlay.try_borrow_mut() {
            Ok(mut overlay) => overlay.hide_cell_container(),
            Err(_) => tracing::warn!("overlay busy; cells not hidden"),
        }
    }

    #[wasm_bindgen(js_name = showCells)]
    pub fn show_cells(&self) {
        match self.shell.overlay.try_borrow_mut() {
            Ok(mut overlay) => overlay.show_cell_container(),
            Err(_) => tracing::warn!("overlay busy; cells not shown"),
        }
        self.shell.mark_needs_render();
    }

    /// Create the grid container at the world origin and return it so the host
    /// page can render its grid layout inside. Replaces any previous grid.
    #[wasm_bindgen(js_name = mountGrid)]
    pub fn mount_grid(&self) -> Result<HtmlElement, JsValue> {
        self.unmount_grid();
        let (mut mounted, container) = MountedGrid::mount(
            &Rc::downgrade(&self.shell),
            &self.shell.document,
            &self.shell.overlay_root,
            self.shell.config.scene.scale_poll_interval_ms,
        )?;
        let element = mounted.container_element();
        {
            let (Ok(mut overlay), Ok(mut grid)) =
                (self.shell.overlay.try_borrow_mut(), self.shell.grid.try_borrow_mut())
            else {
                container.remove();
                return Err(SpatialError::Dom("grid not mounted: components busy".into()).into());
            };
            mounted.host.attach(&mut overlay, element);
            *grid = Some(mounted);
        }
        self.shell.mark_needs_render();
        Ok(container)
    }

    /// Scale the grid container. The layout root is compensated on the next pass.
    #[wasm_bindgen(js_name = setGridScale)]
    pub fn set_grid_scale(&self, scale: f64) {
        let Ok(mut grid) = self.shell.grid.try_borrow_mut() else {
            tracing::warn!(scale, "grid busy; scale not applied");
            return;
        };
        if let Some(mounted) = grid.as_mut() {
            mounted.host.apply_scale(scale);
        }
    }

    #[wasm_bindgen(js_name = unmountGrid)]
    pub fn unmount_grid(&self) {
        let taken = match self.shell.grid.try_borrow_mut() {
            Ok(mut grid) => grid.take(),
            Err(_) => {
                tracing::warn!("grid busy; not unmounted");
                return;
            }
        };
        let Some(mut mounted) = taken else {
            return;
        };
        match self.shell.overlay.try_borrow_mut() {
            Ok(mut overlay) => mounted.host.dispose(&mut overlay),
            Err(_) => tracing::warn!("overlay busy; grid object left for dispose"),
        }
        mounted.host.surface().container().remove();
        self.shell.mark_needs_render();
    }

    /// Tear everything down. Safe to call more than once.
    pub fn dispose(&self) {
        self.shell.dispose();
    }
}
