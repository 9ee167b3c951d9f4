use js_sys::{Function, Object, Promise, Reflect};
use serde::{Deserialize, Serialize};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::CanvasRenderingContext2d;

use gridmark_shared::PageSpace;

/// The layout document is always a single page; nothing here navigates.
pub const LAYOUT_PAGE: u32 = 1;

/// Handle to an open document owned by the host page's rendering library
/// (the `pdfjsLib` global). All access goes through `Reflect` because the
/// library is plain script, not a bindgen module.
#[derive(Clone)]
pub struct LayoutDocument {
    inner: JsValue,
}

#[derive(Clone)]
pub struct LayoutPage {
    inner: JsValue,
}

/// A page viewport at one zoom factor: the raw library object (the render
/// call needs the genuine instance back) plus the typed fields we read.
pub struct PageViewport {
    raw: JsValue,
    pub info: ViewportInfo,
}

/// The viewport fields the addressing model cares about: pixel dimensions
/// (already scaled by zoom) and the page's intrinsic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportInfo {
    pub width: f64,
    pub height: f64,
    pub view_box: [f64; 4],
}

#[derive(Serialize)]
struct ViewportParams {
    scale: f64,
}

impl ViewportInfo {
    /// Addressing space for a finished render. Canvas dimensions come from
    /// the caller because canvas attributes hold whole pixels while the
    /// viewport reports fractional ones.
    pub fn page_space(&self, canvas_w: f64, canvas_h: f64) -> PageSpace {
        PageSpace {
            canvas_w,
            canvas_h,
            intrinsic_w: self.view_box[2] - self.view_box[0],
            intrinsic_h: self.view_box[3] - self.view_box[1],
        }
    }
}

/// Open the layout document at `url` through the host rendering library.
pub async fn open(url: &str) -> Result<LayoutDocument, String> {
    let window = web_sys::window().ok_or("no window")?;
    let lib = Reflect::get(window.as_ref(), &JsValue::from_str("pdfjsLib")).map_err(js_err)?;
    if lib.is_undefined() || lib.is_null() {
        return Err("document library is not loaded".into());
    }

    let task = method(&lib, "getDocument")?
        .call1(&lib, &JsValue::from_str(url))
        .map_err(js_err)?;
    let inner = JsFuture::from(task_promise(&task)?).await.map_err(js_err)?;
    Ok(LayoutDocument { inner })
}

impl LayoutDocument {
    pub async fn page(&self, number: u32) -> Result<LayoutPage, String> {
        let promise = method(&self.inner, "getPage")?
            .call1(&self.inner, &JsValue::from_f64(number as f64))
            .map_err(js_err)?
            .dyn_into::<Promise>()
            .map_err(|_| "getPage did not return a promise".to_string())?;
        let inner = JsFuture::from(promise).await.map_err(js_err)?;
        Ok(LayoutPage { inner })
    }
}

impl LayoutPage {
    /// Viewport descriptor for this page at the given zoom factor.
    pub fn viewport(&self, zoom: f64) -> Result<PageViewport, String> {
        let params = serde_wasm_bindgen::to_value(&ViewportParams { scale: zoom })
            .map_err(|e| format!("encode error: {e}"))?;
        let raw = method(&self.inner, "getViewport")?
            .call1(&self.inner, &params)
            .map_err(js_err)?;
        let info: ViewportInfo = serde_wasm_bindgen::from_value(raw.clone())
            .map_err(|e| format!("viewport parse error: {e}"))?;
        Ok(PageViewport { raw, info })
    }

    /// Paint this page into a canvas 2d context sized for `viewport`.
    pub async fn render_into(
        &self,
        ctx: &CanvasRenderingContext2d,
        viewport: &PageViewport,
    ) -> Result<(), String> {
        let params = Object::new();
        Reflect::set(&params, &JsValue::from_str("canvasContext"), ctx.as_ref())
            .map_err(js_err)?;
        Reflect::set(&params, &JsValue::from_str("viewport"), &viewport.raw).map_err(js_err)?;

        let task = method(&self.inner, "render")?
            .call1(&self.inner, &params)
            .map_err(js_err)?;
        JsFuture::from(task_promise(&task)?).await.map_err(js_err)?;
        Ok(())
    }
}

fn method(target: &JsValue, name: &str) -> Result<Function, String> {
    Reflect::get(target, &JsValue::from_str(name))
        .map_err(js_err)?
        .dyn_into::<Function>()
        .map_err(|_| format!("{name} is not a function"))
}

/// Library tasks expose completion as a `promise` property, not as the task
/// object itself.
fn task_promise(task: &JsValue) -> Result<Promise, String> {
    Reflect::get(task, &JsValue::from_str("promise"))
        .map_err(js_err)?
        .dyn_into::<Promise>()
        .map_err(|_| "task has no promise".to_string())
}

pub(crate) fn js_err(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::ViewportInfo;

    #[test]
    fn page_space_spans_the_view_box() {
        let info = ViewportInfo {
            width: 1000.4,
            height: 750.4,
            view_box: [0.0, 0.0, 800.0, 600.0],
        };
        let space = info.page_space(1000.0, 750.0);
        assert_eq!(space.canvas_w, 1000.0);
        assert_eq!(space.canvas_h, 750.0);
        assert_eq!(space.intrinsic_w, 800.0);
        assert_eq!(space.intrinsic_h, 600.0);
    }

    #[test]
    fn page_space_handles_an_offset_view_box() {
        let info = ViewportInfo {
            width: 500.0,
            height: 500.0,
            view_box: [10.0, 20.0, 810.0, 620.0],
        };
        let space = info.page_space(500.0, 500.0);
        assert_eq!(space.intrinsic_w, 800.0);
        assert_eq!(space.intrinsic_h, 600.0);
    }
}
