// THEORY:
// The `grid` module is the pure geometry layer of the engine. Given a
// bounding box, column/row counts and a spacing ratio, it computes the exact
// position and size of every cell. It holds no state and performs no I/O;
// for identical input it returns identical output, which the interaction
// layer and its tests rely on.
//
// Key architectural principles:
// 1.  **Unit-Size Solving**: The grid is measured in abstract units. Cell
//     width is one unit, gaps (including outer margins) are `border_ratio`
//     units, and the vertical axis is corrected by the fixed 16:9 cell
//     aspect. Each axis independently yields the largest unit size that
//     fits, and the smaller of the two wins, so the grid never overflows
//     the bounding box in either direction.
// 2.  **Symmetric Centering**: Whatever slack the winning unit size leaves
//     on the loser axis becomes two equal margins, centering the grid.
// 3.  **Stable Identity**: A cell's id is derived from its column/row
//     indices (`box-<col>-<row>`), so the same grid shape always produces
//     the same ids and selection state can reference cells across frames.

use serde::{Deserialize, Serialize};

/// Cells keep a fixed 16:9 aspect regardless of the bounding box.
const CELL_ASPECT_RATIO: f64 = 16.0 / 9.0;

/// Corner rounding applied uniformly to every cell.
const CELL_CORNER_RADIUS: f64 = 8.0;

/// The computed position and size of one cell, in the same pixel space as
/// the bounding box handed to [`compute_layout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
}

/// Intermediate sizing solution shared by every cell of one layout.
struct SizingInfo {
    box_width: f64,
    box_height: f64,
    horz_margin: f64,
    vert_margin: f64,
    spacing: f64,
}

fn calculate_sizing(
    columns: u32,
    rows: u32,
    width: f64,
    height: f64,
    border_ratio: f64,
) -> SizingInfo {
    let columns_f = columns as f64;
    let rows_f = rows as f64;

    let horz_units = columns_f + (columns_f + 1.0) * border_ratio;
    let vert_units =
        rows_f / CELL_ASPECT_RATIO + ((rows_f + 1.0) / CELL_ASPECT_RATIO) * border_ratio;
    let horz_unit_size = width / horz_units;
    let vert_unit_size = height / vert_units;
    let unit_size = vert_unit_size.min(horz_unit_size);

    let box_width = unit_size;
    let box_height = unit_size / CELL_ASPECT_RATIO;
    let spacing = border_ratio * unit_size;
    let grid_width = columns_f * unit_size + (columns_f - 1.0) * unit_size * border_ratio;
    let grid_height =
        rows_f * unit_size / CELL_ASPECT_RATIO + unit_size * (rows_f - 1.0) * border_ratio;

    SizingInfo {
        box_width,
        box_height,
        horz_margin: (width - grid_width) / 2.0,
        vert_margin: (height - grid_height) / 2.0,
        spacing,
    }
}

/// Computes the geometry of every cell of a `columns` x `rows` grid centered
/// in a `width` x `height` bounding box, with gaps of `border_ratio` times
/// the cell unit size on all sides including the outer margins.
///
/// Deterministic: identical input produces bit-identical output. Cells are
/// emitted column-major, matching their id scheme.
///
/// # Panics
///
/// Panics on a zero `columns` or `rows` or a non-positive bounding box;
/// these are programmer errors, not recoverable conditions.
pub fn compute_layout(
    columns: u32,
    rows: u32,
    width: f64,
    height: f64,
    border_ratio: f64,
) -> Vec<CellGeometry> {
    assert!(columns >= 1, "grid needs at least one column");
    assert!(rows >= 1, "grid needs at least one row");
    assert!(
        width > 0.0 && height > 0.0,
        "grid bounding box must have positive dimensions"
    );

    let sizing = calculate_sizing(columns, rows, width, height, border_ratio);
    let mut cells = Vec::with_capacity((columns * rows) as usize);
    for col in 0..columns {
        for row in 0..rows {
            cells.push(CellGeometry {
                id: format!("box-{col}-{row}"),
                x: sizing.horz_margin + col as f64 * (sizing.box_width + sizing.spacing),
                y: sizing.vert_margin + row as f64 * (sizing.box_height + sizing.spacing),
                width: sizing.box_width,
                height: sizing.box_height,
                corner_radius: CELL_CORNER_RADIUS,
            });
        }
    }
    cells
}
