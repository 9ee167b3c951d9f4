use serde_json::Value;

pub const CONFIG_URL: &str = "/config/config.json";

pub const DEFAULT_ZOOM: f64 = 4.0;
pub const DEFAULT_LAYOUT_PATH: &str = "/resources/factory_layout.pdf";

/// Viewer configuration fetched from the host at startup.
///
/// Both keys are optional; a missing file, a non-JSON body, or a malformed
/// field falls back per field to the built-in defaults so the viewer always
/// comes up.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Zoom factor for the first render. Configured as a percentage.
    pub default_zoom: f64,
    pub layout_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_zoom: DEFAULT_ZOOM,
            layout_path: DEFAULT_LAYOUT_PATH.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &Value) -> Self {
        let default_zoom = json
            .get("default-zoom")
            .and_then(|v| v.as_f64())
            .filter(|percent| percent.is_finite() && *percent > 0.0)
            .map(|percent| percent / 100.0)
            .unwrap_or(DEFAULT_ZOOM);

        let layout_path = json
            .get("factory-layout-path")
            .and_then(|v| v.as_str())
            .filter(|path| !path.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| DEFAULT_LAYOUT_PATH.to_string());

        Self {
            default_zoom,
            layout_path,
        }
    }
}

pub async fn fetch_config() -> AppConfig {
    match fetch_config_json().await {
        Ok(json) => AppConfig::from_json(&json),
        Err(e) => {
            web_sys::console::warn_1(&format!("Config fetch failed, using defaults: {e}").into());
            AppConfig::default()
        }
    }
}

async fn fetch_config_json() -> Result<Value, String> {
    let resp = gloo_net::http::Request::get(CONFIG_URL)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<Value>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_reads_both_fields() {
        let json = serde_json::json!({
            "default-zoom": 250,
            "factory-layout-path": "/resources/plant_b.pdf"
        });
        let config = AppConfig::from_json(&json);
        assert!((config.default_zoom - 2.5).abs() < 1e-9);
        assert_eq!(config.layout_path, "/resources/plant_b.pdf");
    }

    #[test]
    fn config_falls_back_per_field() {
        let json = serde_json::json!({ "default-zoom": 120 });
        let config = AppConfig::from_json(&json);
        assert!((config.default_zoom - 1.2).abs() < 1e-9);
        assert_eq!(config.layout_path, DEFAULT_LAYOUT_PATH);

        let json = serde_json::json!({ "factory-layout-path": "/x.pdf" });
        let config = AppConfig::from_json(&json);
        assert!((config.default_zoom - DEFAULT_ZOOM).abs() < 1e-9);
        assert_eq!(config.layout_path, "/x.pdf");
    }

    #[test]
    fn config_rejects_malformed_values() {
        let json = serde_json::json!({
            "default-zoom": "fast",
            "factory-layout-path": ""
        });
        assert_eq!(AppConfig::from_json(&json), AppConfig::default());

        let json = serde_json::json!({ "default-zoom": -200 });
        assert!((AppConfig::from_json(&json).default_zoom - DEFAULT_ZOOM).abs() < 1e-9);

        assert_eq!(AppConfig::from_json(&Value::Null), AppConfig::default());
    }
}
