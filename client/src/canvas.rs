use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use gridmark_shared::{CellKey, PageSpace, SelectionRect, tile_at};

use crate::app::{
    ActivePage, AnnotationStore, BlinkVisible, EditorCell, HoveredTile, LoadedConfig, RenderBusy,
    SelectedRegion, Zoom, ZoomRequest,
};
use crate::document::{self, LAYOUT_PAGE, LayoutDocument};
use crate::editor::EditorTarget;
use crate::overlay::{OverlayFrame, draw_overlay};
use crate::view::{CLICK_DRAG_THRESHOLD_PX, RenderGate, wheel_zoom};

/// Two-canvas document view: the base canvas holds the rendered page, the
/// overlay canvas on top holds grid, selection, markers and hover.
#[component]
pub fn DocumentCanvas() -> impl IntoView {
    let LoadedConfig(config) = expect_context();
    let Zoom(zoom) = expect_context();
    let ZoomRequest(zoom_request) = expect_context();
    let RenderBusy(render_busy) = expect_context();
    let HoveredTile(hovered) = expect_context();
    let SelectedRegion(selection) = expect_context();
    let AnnotationStore(annotations) = expect_context();
    let BlinkVisible(blink_visible) = expect_context();
    let EditorCell(editor) = expect_context();
    let ActivePage(page) = expect_context();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();

    let base_canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let overlay_canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    // Pointer drag state
    let is_panning = Rc::new(Cell::new(false));
    let drag_start_x = Rc::new(Cell::new(0.0f64));
    let drag_start_y = Rc::new(Cell::new(0.0f64));
    let last_x = Rc::new(Cell::new(0.0f64));
    let last_y = Rc::new(Cell::new(0.0f64));

    // Pan offset in CSS pixels. Survives re-renders at other zoom levels.
    let pan_offset: RwSignal<(f64, f64)> = RwSignal::new((0.0, 0.0));

    // Document handle lives outside the reactive graph; JS values are not
    // Send and only the render path touches it.
    let layout_doc: Rc<RefCell<Option<LayoutDocument>>> = Rc::new(RefCell::new(None));
    let render_gate = Rc::new(RenderGate::new());

    // Open the layout document once the config arrives, then request the
    // first render. The request goes out only after the handle is stored.
    Effect::new({
        let layout_doc = layout_doc.clone();
        move || {
            let Some(cfg) = config.get() else {
                return;
            };
            if layout_doc.borrow().is_some() {
                return;
            }
            let layout_doc = layout_doc.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match document::open(&cfg.layout_path).await {
                    Ok(doc) => {
                        *layout_doc.borrow_mut() = Some(doc);
                        zoom_request.set(Some(cfg.default_zoom));
                    }
                    Err(e) => {
                        web_sys::console::error_1(
                            &format!("failed to open layout document: {e}").into(),
                        );
                    }
                }
            });
        }
    });

    // Render effect: one base render in flight at a time. Requests that
    // arrive while the gate is held are dropped, not queued.
    Effect::new({
        let layout_doc = layout_doc.clone();
        let render_gate = render_gate.clone();
        move || {
            let Some(target) = zoom_request.get() else {
                return;
            };
            let (Some(base), Some(overlay)) = (base_canvas_ref.get(), overlay_canvas_ref.get())
            else {
                return;
            };
            let Some(doc) = layout_doc.borrow().clone() else {
                return;
            };
            if !render_gate.try_acquire() {
                web_sys::console::info_1(
                    &format!("Render request at zoom {target} dropped while busy").into(),
                );
                return;
            }
            render_busy.set(true);
            hovered.set(None);
            let render_gate = render_gate.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match render_document(&doc, target, &base, &overlay).await {
                    Ok(space) => {
                        zoom.set(target);
                        page.set(Some(space));
                    }
                    Err(e) => {
                        web_sys::console::error_1(&format!("render failed: {e}").into());
                    }
                }
                render_busy.set(false);
                render_gate.release();
            });
        }
    });

    // Overlay redraw: synchronous, never gated by the render flag. A render
    // finishing updates the page signal and lands here for its overlay pass.
    Effect::new(move || {
        let zoom_now = zoom.get();
        let hovered_now = hovered.get();
        let selection_now = selection.get();
        let blink_now = blink_visible.get();
        let Some(space) = page.get() else {
            return;
        };
        let Some(canvas) = overlay_canvas_ref.get() else {
            return;
        };
        let Ok(ctx) = canvas_context_2d(&canvas) else {
            return;
        };
        annotations.with(|map| {
            draw_overlay(
                &ctx,
                &OverlayFrame {
                    zoom: zoom_now,
                    space,
                    annotations: map,
                    selection: selection_now,
                    hovered: hovered_now,
                    blink_visible: blink_now,
                },
            );
        });
    });

    // Pan effect: both canvases translate together.
    Effect::new(move || {
        let (x, y) = pan_offset.get();
        let transform = format!("translate({x}px, {y}px)");
        for canvas in [base_canvas_ref.get(), overlay_canvas_ref.get()]
            .into_iter()
            .flatten()
        {
            web_sys::HtmlElement::style(&canvas)
                .set_property("transform", &transform)
                .ok();
        }
    });

    // --- Input handlers ---

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        zoom_request.set(Some(wheel_zoom(zoom.get_untracked(), e.delta_y())));
    };

    let on_pointer_down = {
        let is_panning = is_panning.clone();
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            is_panning.set(true);
            hovered.set(None);
            drag_start_x.set(e.client_x() as f64);
            drag_start_y.set(e.client_y() as f64);
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_panning = is_panning.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            if is_panning.get() {
                let dx = e.client_x() as f64 - last_x.get();
                let dy = e.client_y() as f64 - last_y.get();
                last_x.set(e.client_x() as f64);
                last_y.set(e.client_y() as f64);
                pan_offset.update(|(x, y)| {
                    *x += dx;
                    *y += dy;
                });
            } else {
                if render_busy.get_untracked() {
                    return;
                }
                let Some(space) = page.get_untracked() else {
                    return;
                };
                let Some(canvas) = overlay_canvas_ref.get_untracked() else {
                    return;
                };
                let rect = canvas.get_bounding_client_rect();
                let x = e.client_x() as f64 - rect.left();
                let y = e.client_y() as f64 - rect.top();
                let hit = (x >= 0.0 && y >= 0.0 && x < space.canvas_w && y < space.canvas_h)
                    .then(|| tile_at(x, y, zoom.get_untracked()));
                if hit != hovered.get_untracked() {
                    hovered.set(hit);
                }
                if hit.is_some() {
                    mouse_pos.set((e.client_x() as f64, e.client_y() as f64));
                }
            }
        }
    };

    let on_pointer_up = {
        let is_panning = is_panning.clone();
        move |e: PointerEvent| {
            is_panning.set(false);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    // Leaving the container ends a pan as well, so a drag released outside
    // the window cannot leave the view stuck to the pointer.
    let on_pointer_leave = {
        let is_panning = is_panning.clone();
        move |_: PointerEvent| {
            is_panning.set(false);
            if hovered.get_untracked().is_some() {
                hovered.set(None);
            }
        }
    };

    let on_click = {
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        move |e: MouseEvent| {
            let dx = (e.client_x() as f64 - drag_start_x.get()).abs();
            let dy = (e.client_y() as f64 - drag_start_y.get()).abs();
            if dx < CLICK_DRAG_THRESHOLD_PX && dy < CLICK_DRAG_THRESHOLD_PX {
                let Some(space) = page.get_untracked() else {
                    return;
                };
                let Some(canvas) = overlay_canvas_ref.get_untracked() else {
                    return;
                };
                let rect = canvas.get_bounding_client_rect();
                let x = e.client_x() as f64 - rect.left();
                let y = e.client_y() as f64 - rect.top();
                if x < 0.0 || y < 0.0 || x >= space.canvas_w || y >= space.canvas_h {
                    return;
                }
                let zoom_now = zoom.get_untracked();
                let tile = tile_at(x, y, zoom_now);
                let key = CellKey::of(space.intrinsic_of(tile, zoom_now));
                selection.set(Some(SelectionRect::around_tile(tile)));
                editor.set(Some(EditorTarget { tile, key }));
            }
        }
    };

    // Canvas stack + busy veil
    view! {
        <div
            style="position: relative; width: 100%; height: 100%; overflow: hidden; background: #0d0f17;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:click=on_click
        >
            <canvas
                node_ref=base_canvas_ref
                style="position: absolute; left: 0; top: 0; touch-action: none; cursor: grab;"
            />
            <canvas
                node_ref=overlay_canvas_ref
                style="position: absolute; left: 0; top: 0; touch-action: none; cursor: grab;"
            />
            <div
                style="position: absolute; inset: 0; background: rgba(6, 8, 14, 0.45); align-items: center; justify-content: center; font-family: 'Silkscreen', monospace; font-size: 0.8rem; letter-spacing: 0.14em; text-transform: uppercase; color: #f5c542; pointer-events: none; z-index: 10;"
                style:display=move || if render_busy.get() { "flex" } else { "none" }
            >
                "Rendering..."
            </div>
        </div>
    }
}

/// Render the document page at `zoom` into the base canvas and size both
/// canvases to the new viewport. Returns the addressing space of the
/// finished render.
async fn render_document(
    doc: &LayoutDocument,
    zoom: f64,
    base: &HtmlCanvasElement,
    overlay: &HtmlCanvasElement,
) -> Result<PageSpace, String> {
    let layout_page = doc.page(LAYOUT_PAGE).await?;
    let viewport = layout_page.viewport(zoom)?;

    let width = viewport.info.width.round() as u32;
    let height = viewport.info.height.round() as u32;
    base.set_width(width);
    base.set_height(height);
    overlay.set_width(width);
    overlay.set_height(height);

    let ctx = canvas_context_2d(base)?;
    layout_page.render_into(&ctx, &viewport).await?;
    Ok(viewport.info.page_space(width as f64, height as f64))
}

fn canvas_context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, String> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
        .ok_or_else(|| "no 2d canvas context".to_string())
}
