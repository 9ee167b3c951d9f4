use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::grid::IntrinsicPoint;

pub type AnnotationMap = HashMap<CellKey, CellAnnotation>;

/// Identity of an annotated cell: its intrinsic top-left corner, quantized to
/// integers. On the wire a key is the string `"x-y"`, which is also how the
/// store object is keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
}

impl CellKey {
    /// Quantize an intrinsic point, rounding halves toward positive infinity.
    pub fn of(p: IntrinsicPoint) -> Self {
        Self {
            x: round_half_up(p.x),
            y: round_half_up(p.y),
        }
    }
}

fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.x, self.y)
    }
}

impl FromStr for CellKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The separator is a '-' that is not a leading sign. Negative
        // components make the split ambiguous by position alone, so try each
        // candidate until both halves parse.
        for (i, _) in s.match_indices('-') {
            if i == 0 {
                continue;
            }
            if let (Ok(x), Ok(y)) = (s[..i].parse::<i64>(), s[i + 1..].parse::<i64>()) {
                return Ok(Self { x, y });
            }
        }
        Err(format!("invalid cell key: {s:?}"))
    }
}

impl Serialize for CellKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl de::Visitor<'_> for KeyVisitor {
            type Value = CellKey;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a cell key of the form \"x-y\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<CellKey, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}

/// One saved annotation, as stored on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellAnnotation {
    pub intrinsic_x: i64,
    pub intrinsic_y: i64,
    /// Zoom factor in effect when the record was last saved. Informational;
    /// marker placement derives from the intrinsic coordinates alone.
    pub scale: f64,
    #[serde(default)]
    pub data: AnnotationData,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationData {
    #[serde(default)]
    pub setting: String,
}

impl CellAnnotation {
    /// Build a record whose embedded coordinates match its key, so a store
    /// entry stays self-describing when read without its key.
    pub fn new(key: CellKey, scale: f64, setting: String) -> Self {
        Self {
            intrinsic_x: key.x,
            intrinsic_y: key.y,
            scale,
            data: AnnotationData { setting },
        }
    }

    pub fn key(&self) -> CellKey {
        CellKey {
            x: self.intrinsic_x,
            y: self.intrinsic_y,
        }
    }

    pub fn position(&self) -> IntrinsicPoint {
        IntrinsicPoint {
            x: self.intrinsic_x as f64,
            y: self.intrinsic_y as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_formats_as_dash_joined_pair() {
        assert_eq!(CellKey { x: 100, y: 20 }.to_string(), "100-20");
        assert_eq!(CellKey { x: -3, y: -7 }.to_string(), "-3--7");
    }

    #[test]
    fn key_parses_its_own_display_form() {
        for key in [
            CellKey { x: 100, y: 20 },
            CellKey { x: -3, y: -7 },
            CellKey { x: 0, y: -1 },
            CellKey { x: -40, y: 0 },
        ] {
            assert_eq!(key.to_string().parse::<CellKey>(), Ok(key));
        }
    }

    #[test]
    fn key_rejects_malformed_strings() {
        assert!("".parse::<CellKey>().is_err());
        assert!("100".parse::<CellKey>().is_err());
        assert!("a-b".parse::<CellKey>().is_err());
        assert!("1-2-3".parse::<CellKey>().is_err());
    }

    #[test]
    fn quantization_rounds_halves_up() {
        let key = CellKey::of(IntrinsicPoint { x: 2.5, y: -2.5 });
        assert_eq!(key, CellKey { x: 3, y: -2 });

        let key = CellKey::of(IntrinsicPoint { x: 2.4, y: 2.6 });
        assert_eq!(key, CellKey { x: 2, y: 3 });

        // Points that round alike collapse onto one key.
        assert_eq!(
            CellKey::of(IntrinsicPoint { x: 1.6, y: 2.0 }),
            CellKey::of(IntrinsicPoint { x: 2.4, y: 2.4 })
        );
    }

    #[test]
    fn key_is_stable_across_zoom_levels() {
        use crate::grid::{PageSpace, TileAddress};

        // The same document location resolves through different tile
        // addresses at different zooms, but lands on one key.
        let space_z4 = PageSpace {
            canvas_w: 1000.0,
            canvas_h: 750.0,
            intrinsic_w: 800.0,
            intrinsic_h: 600.0,
        };
        let space_z8 = PageSpace {
            canvas_w: 2000.0,
            canvas_h: 1500.0,
            intrinsic_w: 800.0,
            intrinsic_h: 600.0,
        };
        let k1 = CellKey::of(space_z4.intrinsic_of(TileAddress { row: 1, col: 5 }, 4.0));
        let k2 = CellKey::of(space_z8.intrinsic_of(TileAddress { row: 4, col: 20 }, 8.0));
        assert_eq!(k1, k2);
        assert_eq!(k1, CellKey { x: 100, y: 20 });
        assert_eq!(k1.to_string(), "100-20");
    }

    #[test]
    fn store_serializes_to_a_keyed_object() {
        let key = CellKey { x: 100, y: 20 };
        let mut map = AnnotationMap::new();
        map.insert(key, CellAnnotation::new(key, 4.0, "pump station".into()));

        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "100-20": {
                    "intrinsicX": 100,
                    "intrinsicY": 20,
                    "scale": 4.0,
                    "data": { "setting": "pump station" }
                }
            })
        );
    }

    #[test]
    fn store_round_trips_through_json() {
        let key = CellKey { x: -3, y: 40 };
        let mut map = AnnotationMap::new();
        map.insert(key, CellAnnotation::new(key, 1.25, "valve".into()));

        let text = serde_json::to_string(&map).unwrap();
        let back: AnnotationMap = serde_json::from_str(&text).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn record_without_data_defaults_to_empty_setting() {
        let record: CellAnnotation =
            serde_json::from_str(r#"{"intrinsicX": 5, "intrinsicY": 6, "scale": 2.0}"#).unwrap();
        assert_eq!(record.key(), CellKey { x: 5, y: 6 });
        assert_eq!(record.data.setting, "");
    }
}
