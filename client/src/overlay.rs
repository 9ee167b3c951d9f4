use web_sys::CanvasRenderingContext2d;

use gridmark_shared::{AnnotationMap, PageSpace, SelectionRect, TileAddress, tile_size};

pub const GRID_LINE_COLOR: &str = "rgba(0, 0, 255, 0.5)";
pub const SELECTION_FILL_COLOR: &str = "rgba(0, 255, 0, 0.3)";
pub const MARKER_FILL_COLOR: &str = "rgba(255, 255, 0, 1)";
pub const HOVER_FILL_COLOR: &str = "rgba(255, 255, 0, 0.3)";

/// Everything one overlay pass reads. Pure state in, canvas calls out.
pub struct OverlayFrame<'a> {
    pub zoom: f64,
    pub space: PageSpace,
    pub annotations: &'a AnnotationMap,
    pub selection: Option<SelectionRect>,
    pub hovered: Option<TileAddress>,
    pub blink_visible: bool,
}

/// Redraw the whole overlay canvas.
///
/// Layer order matters: grid, then selection, then annotation markers, then
/// hover. Hover is skipped entirely while a selection is active so it can
/// never occlude it.
pub fn draw_overlay(ctx: &CanvasRenderingContext2d, frame: &OverlayFrame<'_>) {
    let w = frame.space.canvas_w;
    let h = frame.space.canvas_h;
    let tile = tile_size(frame.zoom);

    ctx.clear_rect(0.0, 0.0, w, h);

    ctx.set_stroke_style_str(GRID_LINE_COLOR);
    ctx.set_line_width(1.0);
    ctx.begin_path();
    for x in line_positions(w, tile) {
        ctx.move_to(x, 0.0);
        ctx.line_to(x, h);
    }
    for y in line_positions(h, tile) {
        ctx.move_to(0.0, y);
        ctx.line_to(w, y);
    }
    ctx.stroke();

    if let Some(rect) = frame.selection {
        ctx.set_fill_style_str(SELECTION_FILL_COLOR);
        for row in rect.row_span() {
            for col in rect.col_span() {
                let (x, y) = TileAddress { row, col }.origin_px(tile);
                ctx.fill_rect(x, y, tile, tile);
            }
        }
    }

    if frame.blink_visible {
        ctx.set_fill_style_str(MARKER_FILL_COLOR);
        for record in frame.annotations.values() {
            let (x, y) = frame.space.canvas_pos(record.position());
            ctx.fill_rect(x, y, tile, tile);
        }
    }

    if frame.selection.is_none()
        && let Some(addr) = frame.hovered
    {
        ctx.set_fill_style_str(HOVER_FILL_COLOR);
        let (x, y) = addr.origin_px(tile);
        ctx.fill_rect(x, y, tile, tile);
    }
}

/// Grid line offsets along one axis, both edges included when the extent is a
/// whole number of tiles.
fn line_positions(extent: f64, tile: f64) -> Vec<f64> {
    let mut positions = Vec::new();
    if tile <= 0.0 {
        return positions;
    }
    let mut pos = 0.0;
    while pos <= extent {
        positions.push(pos);
        pos += tile;
    }
    positions
}
