use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;

use gridmark_shared::{AnnotationMap, PageSpace, SelectionRect, TileAddress};

use crate::annotations;
use crate::blink;
use crate::canvas::DocumentCanvas;
use crate::config::{self, AppConfig};
use crate::editor::{CellEditor, EditorTarget};
use crate::view::{STEP_ZOOM_IN, STEP_ZOOM_OUT, format_zoom_percent, parse_manual_zoom, step_zoom};

struct KeydownBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
}

/// Newtype wrappers giving each signal a distinct type for Leptos context.
/// (Several share an inner type — without wrappers, `provide_context`
/// overwrites one with the other.)
#[derive(Clone, Copy)]
pub(crate) struct LoadedConfig(pub RwSignal<Option<AppConfig>>);
#[derive(Clone, Copy)]
pub(crate) struct Zoom(pub RwSignal<f64>);
#[derive(Clone, Copy)]
pub(crate) struct ZoomRequest(pub RwSignal<Option<f64>>);
#[derive(Clone, Copy)]
pub(crate) struct RenderBusy(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct HoveredTile(pub RwSignal<Option<TileAddress>>);
#[derive(Clone, Copy)]
pub(crate) struct SelectedRegion(pub RwSignal<Option<SelectionRect>>);
#[derive(Clone, Copy)]
pub(crate) struct AnnotationStore(pub RwSignal<AnnotationMap>);
#[derive(Clone, Copy)]
pub(crate) struct BlinkVisible(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct EditorCell(pub RwSignal<Option<EditorTarget>>);
#[derive(Clone, Copy)]
pub(crate) struct ActivePage(pub RwSignal<Option<PageSpace>>);

/// Root component: owns every piece of shared view state and mounts the
/// document view, toolbar, tooltip and editor.
#[component]
pub fn App() -> impl IntoView {
    // Global signals
    let config: RwSignal<Option<AppConfig>> = RwSignal::new(None);
    let zoom: RwSignal<f64> = RwSignal::new(config::DEFAULT_ZOOM);
    let zoom_request: RwSignal<Option<f64>> = RwSignal::new(None);
    let render_busy: RwSignal<bool> = RwSignal::new(false);
    let hovered: RwSignal<Option<TileAddress>> = RwSignal::new(None);
    let selection: RwSignal<Option<SelectionRect>> = RwSignal::new(None);
    let annotations: RwSignal<AnnotationMap> = RwSignal::new(AnnotationMap::new());
    let blink_visible: RwSignal<bool> = RwSignal::new(true);
    let editor: RwSignal<Option<EditorTarget>> = RwSignal::new(None);
    let page: RwSignal<Option<PageSpace>> = RwSignal::new(None);
    let mouse_pos: RwSignal<(f64, f64)> = RwSignal::new((0.0, 0.0));

    // Provide via context so children can access
    provide_context(LoadedConfig(config));
    provide_context(Zoom(zoom));
    provide_context(ZoomRequest(zoom_request));
    provide_context(RenderBusy(render_busy));
    provide_context(HoveredTile(hovered));
    provide_context(SelectedRegion(selection));
    provide_context(AnnotationStore(annotations));
    provide_context(BlinkVisible(blink_visible));
    provide_context(EditorCell(editor));
    provide_context(ActivePage(page));
    provide_context(mouse_pos);

    // Load the config and the stored annotations on mount. Annotations that
    // are already present start the blink loop before the store lands, so
    // the first overlay pass draws their markers.
    Effect::new(move || {
        wasm_bindgen_futures::spawn_local(async move {
            let cfg = config::fetch_config().await;
            config.set(Some(cfg));
        });
        wasm_bindgen_futures::spawn_local(async move {
            let map = annotations::fetch_annotations().await;
            if !map.is_empty() {
                blink::ensure_running(blink_visible);
            }
            annotations.set(map);
        });
        on_cleanup(move || {
            blink::stop(blink_visible);
        });
    });

    // Global keyboard shortcuts
    Effect::new(move || {
        use wasm_bindgen::prelude::*;

        let Some(window) = web_sys::window() else {
            return;
        };

        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "keydown",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler =
            Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
                let key = e.key();
                let target_tag = e
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    .map(|el| el.tag_name())
                    .unwrap_or_default();

                // Don't intercept when typing in an input
                if target_tag == "INPUT" || target_tag == "TEXTAREA" {
                    if key == "Escape"
                        && let Some(el) = e
                            .target()
                            .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    {
                        el.blur().ok();
                    }
                    return;
                }

                // While the editor is up only Escape works; zoom underneath
                // a modal session would detach it from its cell.
                if editor.get_untracked().is_some() {
                    if key == "Escape" {
                        editor.set(None);
                        selection.set(None);
                    }
                    return;
                }

                match key.as_str() {
                    "Escape" => {
                        selection.set(None);
                        hovered.set(None);
                    }
                    "+" | "=" => {
                        e.prevent_default();
                        zoom_request.set(Some(step_zoom(zoom.get_untracked(), STEP_ZOOM_IN)));
                    }
                    "-" => {
                        e.prevent_default();
                        zoom_request.set(Some(step_zoom(zoom.get_untracked(), STEP_ZOOM_OUT)));
                    }
                    _ => {}
                }
            });

        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            KEYDOWN_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(KeydownBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative;">
            <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #0c0e17;">
                <DocumentCanvas />
            </div>
            <Toolbar />
            <CellEditor />
        </div>
        <Tooltip />
    }
}

/// Floating zoom toolbar: step buttons around a direct percentage field.
#[component]
fn Toolbar() -> impl IntoView {
    let Zoom(zoom) = expect_context();
    let ZoomRequest(zoom_request) = expect_context();
    let RenderBusy(render_busy) = expect_context();

    let step = move |factor: f64| {
        if render_busy.get_untracked() {
            return;
        }
        zoom_request.set(Some(step_zoom(zoom.get_untracked(), factor)));
    };

    let button_style = "width: 26px; height: 26px; display: flex; align-items: center; justify-content: center; background: #1a1d2a; border: 1px solid #282c3e; border-radius: 4px; color: #e2e0d8; font-family: 'JetBrains Mono', monospace; font-size: 0.9rem; line-height: 1; cursor: pointer;";

    view! {
        <div style="position: absolute; top: 16px; left: 16px; z-index: 20; display: flex; align-items: center; gap: 6px; background: #13161f; border: 1px solid #282c3e; border-radius: 6px; padding: 6px 8px; box-shadow: 0 4px 16px rgba(0,0,0,0.4);">
            <button
                title="Zoom out"
                style=button_style
                prop:disabled=move || render_busy.get()
                on:click=move |_| step(STEP_ZOOM_OUT)
            >
                {"\u{2212}"}
            </button>
            <ZoomEntry />
            <button
                title="Zoom in"
                style=button_style
                prop:disabled=move || render_busy.get()
                on:click=move |_| step(STEP_ZOOM_IN)
            >
                "+"
            </button>
        </div>
    }
}

/// Text field showing the applied zoom as a percentage and accepting direct
/// entry. Invalid entries revert to the applied zoom.
#[component]
fn ZoomEntry() -> impl IntoView {
    let Zoom(zoom) = expect_context();
    let ZoomRequest(zoom_request) = expect_context();

    let entry_ref = NodeRef::<leptos::html::Input>::new();

    // The applied zoom writes back into the field. This covers render
    // completion and also renders whose request was dropped by the gate.
    Effect::new(move || {
        let text = format_zoom_percent(zoom.get());
        if let Some(input) = entry_ref.get() {
            input.set_value(&text);
        }
    });

    // `change` fires on Enter and on blur-after-edit.
    let on_change = move |_| {
        let Some(input) = entry_ref.get_untracked() else {
            return;
        };
        match parse_manual_zoom(&input.value()) {
            Some(z) => zoom_request.set(Some(z)),
            None => input.set_value(&format_zoom_percent(zoom.get_untracked())),
        }
    };

    view! {
        <input
            node_ref=entry_ref
            type="text"
            title="Zoom percentage"
            style="width: 64px; text-align: center; background: #1a1d2a; border: 1px solid #282c3e; border-radius: 4px; color: #e2e0d8; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; padding: 5px 6px; outline: none;"
            on:change=on_change
        />
    }
}

/// Tooltip that follows the pointer while a grid cell is hovered.
#[component]
fn Tooltip() -> impl IntoView {
    let HoveredTile(hovered) = expect_context();
    let Zoom(zoom) = expect_context();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();

    let tooltip_info = Memo::new(move |_| {
        let tile = hovered.get()?;
        Some(format!(
            "Cell: row={}, col={} | Zoom: {}",
            tile.row,
            tile.col,
            format_zoom_percent(zoom.get())
        ))
    });

    view! {
        {move || {
            let Some(text) = tooltip_info.get() else {
                return view! { <div style="display:none;" /> }.into_any();
            };
            let (x, y) = mouse_pos.get();
            view! {
                <div
                    style:left=format!("{}px", x + 10.0)
                    style:top=format!("{}px", y + 10.0)
                    style="position: fixed; pointer-events: none; z-index: 100; background: #161921; border: 1px solid #282c3e; border-radius: 6px; box-shadow: 0 4px 16px rgba(0,0,0,0.5); padding: 6px 9px; font-family: 'JetBrains Mono', monospace; font-size: 0.7rem; color: #e2e0d8; white-space: nowrap;"
                >
                    {text}
                </div>
            }
            .into_any()
        }}
    }
}
