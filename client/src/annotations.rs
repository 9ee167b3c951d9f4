use wasm_bindgen_futures::spawn_local;

use gridmark_shared::{AnnotationMap, CellAnnotation, CellKey};

pub const STORE_URL: &str = "/storage/map_data.json";
pub const SAVE_URL: &str = "/api/saveMapData";

/// Load the full annotation store. Any failure yields an empty map; a fresh
/// deployment has no store file yet and annotating must still work.
pub async fn fetch_annotations() -> AnnotationMap {
    match fetch_annotations_strict().await {
        Ok(map) => map,
        Err(e) => {
            web_sys::console::warn_1(
                &format!("Annotation store load failed, starting empty: {e}").into(),
            );
            AnnotationMap::default()
        }
    }
}

async fn fetch_annotations_strict() -> Result<AnnotationMap, String> {
    let resp = gloo_net::http::Request::get(STORE_URL)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<AnnotationMap>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// Fire-and-forget write of the full store. The in-memory map was already
/// updated by the caller and stays authoritative for the session; the outcome
/// here is logged and nothing is rolled back on failure.
pub fn push_annotations(map: AnnotationMap) {
    spawn_local(async move {
        match push_annotations_strict(&map).await {
            Ok(()) => {
                web_sys::console::info_1(
                    &format!("Annotation store saved ({} cells)", map.len()).into(),
                );
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Annotation save failed: {e}").into());
            }
        }
    });
}

async fn push_annotations_strict(map: &AnnotationMap) -> Result<(), String> {
    let resp = gloo_net::http::Request::post(SAVE_URL)
        .json(map)
        .map_err(|e| format!("encode error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    Ok(())
}

/// Text to pre-fill the editor with for a cell, empty when unsaved.
pub fn editor_prefill(map: &AnnotationMap, key: CellKey) -> Option<String> {
    map.get(&key).map(|record| record.data.setting.clone())
}

/// The optimistic half of a save: write the record into the in-memory store.
/// Callers push the whole store to the backend afterwards.
pub fn apply_save(map: &mut AnnotationMap, key: CellKey, zoom: f64, setting: String) {
    map.insert(key, CellAnnotation::new(key, zoom, setting));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefill_distinguishes_saved_from_unsaved_cells() {
        let key = CellKey { x: 100, y: 20 };
        let mut map = AnnotationMap::new();
        assert_eq!(editor_prefill(&map, key), None);

        apply_save(&mut map, key, 4.0, "pump station".into());
        assert_eq!(editor_prefill(&map, key), Some("pump station".into()));
        assert_eq!(editor_prefill(&map, CellKey { x: 0, y: 0 }), None);
    }

    #[test]
    fn saving_again_overwrites_the_record() {
        let key = CellKey { x: 100, y: 20 };
        let mut map = AnnotationMap::new();
        apply_save(&mut map, key, 4.0, "pump station".into());
        apply_save(&mut map, key, 2.5, "pump station (decommissioned)".into());

        assert_eq!(map.len(), 1);
        let record = &map[&key];
        assert_eq!(record.data.setting, "pump station (decommissioned)");
        assert!((record.scale - 2.5).abs() < 1e-9);
        assert_eq!(record.key(), key);
    }

    #[test]
    fn saved_record_carries_its_key_coordinates() {
        // A record must stay self-describing on the wire: the embedded
        // intrinsic pair always equals the key it is stored under.
        let key = CellKey { x: -3, y: 40 };
        let mut map = AnnotationMap::new();
        apply_save(&mut map, key, 1.25, "valve".into());
        assert_eq!(map[&key].intrinsic_x, -3);
        assert_eq!(map[&key].intrinsic_y, 40);
    }
}
