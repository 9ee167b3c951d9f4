use std::ops::RangeInclusive;

/// Grid pitch in canvas pixels at 100% zoom.
pub const BASE_TILE_SIZE: f64 = 100.0;
/// Floor keeping tiles hittable when zoomed far out.
pub const MIN_TILE_SIZE: f64 = 5.0;

/// Edge length in canvas pixels of one grid tile at the given zoom factor.
///
/// The canvas grows with zoom while the tile count over the document stays
/// fixed, so a tile keeps addressing the same document region at every zoom
/// level. Below 5 px the clamp kicks in and coarsens the grid instead.
pub fn tile_size(zoom: f64) -> f64 {
    (BASE_TILE_SIZE / zoom).max(MIN_TILE_SIZE)
}

/// Address of one grid tile. `row` grows downward, `col` rightward. Both go
/// negative for pointer positions left of or above the canvas origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileAddress {
    pub row: i64,
    pub col: i64,
}

impl TileAddress {
    /// Canvas-pixel position of this tile's top-left corner.
    pub fn origin_px(&self, tile: f64) -> (f64, f64) {
        (self.col as f64 * tile, self.row as f64 * tile)
    }
}

/// Tile under a canvas-pixel position at the given zoom.
///
/// A position exactly on a tile boundary belongs to the tile that starts
/// there.
pub fn tile_at(x: f64, y: f64, zoom: f64) -> TileAddress {
    let tile = tile_size(zoom);
    TileAddress {
        row: (y / tile).floor() as i64,
        col: (x / tile).floor() as i64,
    }
}

/// A point in the document's intrinsic coordinate space (view-box units).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntrinsicPoint {
    pub x: f64,
    pub y: f64,
}

/// Mapping between the rendered canvas and the document's intrinsic
/// coordinate space.
///
/// Canvas dimensions scale with zoom; intrinsic dimensions do not. Anchoring
/// addresses in intrinsic space is what lets a stored cell land on the same
/// document region after any number of re-renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSpace {
    pub canvas_w: f64,
    pub canvas_h: f64,
    pub intrinsic_w: f64,
    pub intrinsic_h: f64,
}

impl PageSpace {
    /// Intrinsic coordinates of a tile's top-left corner at the given zoom.
    pub fn intrinsic_of(&self, addr: TileAddress, zoom: f64) -> IntrinsicPoint {
        let (px, py) = addr.origin_px(tile_size(zoom));
        IntrinsicPoint {
            x: px / self.canvas_w * self.intrinsic_w,
            y: py / self.canvas_h * self.intrinsic_h,
        }
    }

    /// Canvas-pixel position of an intrinsic point at the current canvas size.
    pub fn canvas_pos(&self, p: IntrinsicPoint) -> (f64, f64) {
        (
            p.x / self.intrinsic_w * self.canvas_w,
            p.y / self.intrinsic_h * self.canvas_h,
        )
    }
}

/// Selection between two corner tiles. Tile-addressed rather than
/// pixel-addressed, so a re-render at another zoom leaves it on the same
/// cells. The corners may arrive in any order; the span methods normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRect {
    pub start: TileAddress,
    pub end: TileAddress,
}

impl SelectionRect {
    /// Selection covering exactly one tile.
    pub fn around_tile(addr: TileAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Inclusive range of grid columns the selection touches.
    pub fn col_span(&self) -> RangeInclusive<i64> {
        self.start.col.min(self.end.col)..=self.start.col.max(self.end.col)
    }

    /// Inclusive range of grid rows the selection touches.
    pub fn row_span(&self) -> RangeInclusive<i64> {
        self.start.row.min(self.end.row)..=self.start.row.max(self.end.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_size_shrinks_as_zoom_grows() {
        assert_eq!(tile_size(1.0), 100.0);
        assert_eq!(tile_size(4.0), 25.0);
        assert_eq!(tile_size(0.2), 500.0);
    }

    #[test]
    fn tile_size_clamps_at_five_pixels() {
        assert_eq!(tile_size(20.0), 5.0);
        assert_eq!(tile_size(25.0), 5.0);
        assert_eq!(tile_size(1000.0), 5.0);
    }

    #[test]
    fn tile_at_floors_into_the_grid() {
        let addr = tile_at(130.0, 40.0, 4.0);
        assert_eq!(addr, TileAddress { row: 1, col: 5 });
    }

    #[test]
    fn tile_at_boundary_belongs_to_the_starting_tile() {
        assert_eq!(tile_at(100.0, 0.0, 1.0), TileAddress { row: 0, col: 1 });
        assert_eq!(tile_at(99.0, 0.0, 1.0), TileAddress { row: 0, col: 0 });
    }

    #[test]
    fn tile_at_goes_negative_off_the_origin() {
        assert_eq!(tile_at(-0.5, -0.5, 1.0), TileAddress { row: -1, col: -1 });
    }

    #[test]
    fn tile_round_trips_through_its_origin_pixel() {
        for addr in [
            TileAddress { row: 0, col: 0 },
            TileAddress { row: 1, col: 5 },
            TileAddress { row: -3, col: 7 },
        ] {
            let (x, y) = addr.origin_px(tile_size(4.0));
            assert_eq!(tile_at(x, y, 4.0), addr);
        }
    }

    #[test]
    fn intrinsic_of_projects_through_the_canvas_ratio() {
        let space = PageSpace {
            canvas_w: 1000.0,
            canvas_h: 750.0,
            intrinsic_w: 800.0,
            intrinsic_h: 600.0,
        };
        let p = space.intrinsic_of(TileAddress { row: 1, col: 5 }, 4.0);
        assert_eq!(p, IntrinsicPoint { x: 100.0, y: 20.0 });
    }

    #[test]
    fn canvas_pos_inverts_intrinsic_of() {
        let space = PageSpace {
            canvas_w: 1000.0,
            canvas_h: 750.0,
            intrinsic_w: 800.0,
            intrinsic_h: 600.0,
        };
        let p = IntrinsicPoint { x: 100.0, y: 20.0 };
        assert_eq!(space.canvas_pos(p), (125.0, 25.0));
    }

    #[test]
    fn canvas_pos_tracks_a_resized_canvas() {
        // Same intrinsic point, canvas doubled by zooming in.
        let space = PageSpace {
            canvas_w: 2000.0,
            canvas_h: 1500.0,
            intrinsic_w: 800.0,
            intrinsic_h: 600.0,
        };
        let p = IntrinsicPoint { x: 100.0, y: 20.0 };
        assert_eq!(space.canvas_pos(p), (250.0, 50.0));
    }

    #[test]
    fn selection_spans_normalize_reversed_corners() {
        let rect = SelectionRect {
            start: TileAddress { row: 2, col: 5 },
            end: TileAddress { row: 0, col: 0 },
        };
        assert_eq!(rect.col_span(), 0..=5);
        assert_eq!(rect.row_span(), 0..=2);
    }

    #[test]
    fn around_tile_spans_exactly_one_tile() {
        let rect = SelectionRect::around_tile(TileAddress { row: 3, col: -2 });
        assert_eq!(rect.col_span(), -2..=-2);
        assert_eq!(rect.row_span(), 3..=3);
    }
}
