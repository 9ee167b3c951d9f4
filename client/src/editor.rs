use leptos::prelude::*;

use gridmark_shared::{CellKey, TileAddress};

use crate::annotations::{apply_save, editor_prefill, push_annotations};
use crate::app::{AnnotationStore, BlinkVisible, EditorCell, SelectedRegion, Zoom};
use crate::blink;
use crate::view::format_zoom_percent;

/// The cell a modal session edits. The key is fixed at click time so a
/// zoom applied underneath an open modal cannot retarget the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorTarget {
    pub tile: TileAddress,
    pub key: CellKey,
}

/// Modal editor for one cell's annotation. Stays mounted and toggles
/// visibility so the input refs survive across sessions.
#[component]
pub fn CellEditor() -> impl IntoView {
    let EditorCell(editor) = expect_context();
    let AnnotationStore(annotations) = expect_context();
    let SelectedRegion(selection) = expect_context();
    let BlinkVisible(blink_visible) = expect_context();
    let Zoom(zoom) = expect_context();

    let setting_ref = NodeRef::<leptos::html::Input>::new();
    let persist_ref = NodeRef::<leptos::html::Input>::new();

    // Prefill on open: a previously saved cell restores its setting and
    // arms the persist toggle, an unsaved cell starts blank and unarmed.
    Effect::new(move || {
        let Some(target) = editor.get() else {
            return;
        };
        let (Some(setting), Some(persist)) = (setting_ref.get(), persist_ref.get()) else {
            return;
        };
        match annotations.with_untracked(|map| editor_prefill(map, target.key)) {
            Some(saved) => {
                setting.set_value(&saved);
                persist.set_checked(true);
            }
            None => {
                setting.set_value("");
                persist.set_checked(false);
            }
        }
    });

    let close = move || {
        editor.set(None);
        selection.set(None);
    };

    let on_save = move |_| {
        let Some(target) = editor.get_untracked() else {
            return;
        };
        if let (Some(setting), Some(persist)) = (setting_ref.get(), persist_ref.get()) {
            if persist.checked() {
                let value = setting.value();
                annotations.update(|map| {
                    apply_save(map, target.key, zoom.get_untracked(), value);
                });
                blink::ensure_running(blink_visible);
                push_annotations(annotations.get_untracked());
            }
        }
        close();
    };

    let cell_line = move || {
        editor
            .get()
            .map(|t| format!("Settings for cell: row={}, col={}", t.tile.row, t.tile.col))
            .unwrap_or_default()
    };
    let zoom_line = move || format_zoom_percent(zoom.get());

    view! {
        <div
            style="position: fixed; inset: 0; background: rgba(6, 8, 14, 0.6); z-index: 60; align-items: center; justify-content: center;"
            style:display=move || if editor.get().is_some() { "flex" } else { "none" }
        >
            <div style="width: 340px; background: #13161f; border: 1px solid #282c3e; border-radius: 8px; box-shadow: 0 18px 48px rgba(0,0,0,0.5); color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif;">
                <div style="display: flex; align-items: center; justify-content: space-between; padding: 12px 16px; border-bottom: 1px solid #282c3e;">
                    <span style="font-family: 'Silkscreen', monospace; font-size: 0.78rem; text-transform: uppercase; letter-spacing: 0.14em; color: #f5c542;">
                        "Cell Settings"
                    </span>
                    <button
                        on:click=move |_| close()
                        style="background: none; border: none; color: #9a9590; font-size: 1.1rem; cursor: pointer; padding: 0 2px; line-height: 1;"
                    >
                        {"\u{00d7}"}
                    </button>
                </div>
                <div style="padding: 14px 16px; display: flex; flex-direction: column; gap: 12px;">
                    <div>
                        <div style="font-size: 0.88rem;">{cell_line}</div>
                        <div style="margin-top: 4px; font-size: 0.78rem; color: #9a9590;">
                            <strong>"Current Zoom: "</strong>
                            <span style="font-family: 'JetBrains Mono', monospace; color: #e2e0d8;">{zoom_line}</span>
                        </div>
                    </div>
                    <label style="display: flex; flex-direction: column; gap: 5px; font-size: 0.78rem; color: #9a9590;">
                        "Setting"
                        <input
                            node_ref=setting_ref
                            type="text"
                            placeholder="Enter setting value..."
                            style="width: 100%; box-sizing: border-box; padding: 8px 10px; background: #1a1d2a; border: 1px solid #282c3e; border-radius: 6px; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif; font-size: 0.88rem; outline: none;"
                        />
                    </label>
                    <label style="display: flex; align-items: center; gap: 8px; font-size: 0.82rem; color: #e2e0d8; cursor: pointer;">
                        <input
                            node_ref=persist_ref
                            type="checkbox"
                            style="accent-color: #f5c542; width: 14px; height: 14px;"
                        />
                        "Persist annotation"
                    </label>
                </div>
                <div style="display: flex; justify-content: flex-end; gap: 8px; padding: 12px 16px; border-top: 1px solid #282c3e;">
                    <button
                        on:click=move |_| close()
                        style="background: #1a1d2a; border: 1px solid #282c3e; border-radius: 4px; color: #9a9590; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; padding: 6px 12px; cursor: pointer;"
                    >
                        "Close"
                    </button>
                    <button
                        on:click=on_save
                        style="background: #f5c542; border: 1px solid #f5c542; border-radius: 4px; color: #13161f; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; padding: 6px 14px; cursor: pointer;"
                    >
                        "Save"
                    </button>
                </div>
            </div>
        </div>
    }
}
