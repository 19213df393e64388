//! Tiling layout engine: deterministic subdivision of the tiling zone.
//!
//! [`compute_layout`] is a pure function of its inputs only — the same
//! ordered window list and the same rectangle always produce bit-identical
//! assignments, with no dependency on current window positions.  All cell
//! arithmetic is integer division with the last column of each row and the
//! last row absorbing the rounding remainder, so the cells always cover
//! the input rect exactly: no gaps, no overlaps.

use super::geometry::Rect;

/// Opaque handle identifying a top-level window.
///
/// Wraps the raw OS handle value; no arithmetic is exposed. The engine
/// never owns the window's lifetime, only membership in the managed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

/// One computed tiling: each managed window paired with its assigned cell,
/// in tiling priority order. Applied atomically (all windows or none) via
/// the platform's batched positioning call.
pub type TilingAssignment = Vec<(WindowId, Rect)>;

/// Computes the gap-free tiling of `rect` among `windows`.
///
/// Layout by window count N (the first window is the "master"):
/// - N = 0: empty; N = 1: the full rect.
/// - N = 2: orientation split — wide rects split into two side-by-side
///   columns, tall (or square) rects into two stacked rows.
/// - N = 3: master + stack — the master takes the near half, the other two
///   split the far half along the perpendicular axis.
/// - N ≥ 4: grid with `cols = ceil(sqrt(N))`, `rows = ceil(N / cols)`,
///   assigned row-major; the last row may hold fewer windows, in which
///   case its cell width is recomputed from that row's own count.
///
/// A degenerate `rect` (zero width or height) yields zero-area cells
/// rather than an error; callers are responsible for not applying those.
pub fn compute_layout(windows: &[WindowId], rect: Rect) -> TilingAssignment {
    match windows.len() {
        0 => Vec::new(),
        1 => vec![(windows[0], rect)],
        2 => layout_pair(windows, rect),
        3 => layout_master_stack(windows, rect),
        _ => layout_grid(windows, rect),
    }
}

/// Splits the rect in two along its longer axis.
fn layout_pair(windows: &[WindowId], rect: Rect) -> TilingAssignment {
    if rect.width() > rect.height() {
        // Side-by-side columns; the second column absorbs the remainder.
        let split = rect.left + rect.width() / 2;
        vec![
            (windows[0], Rect::new(rect.left, rect.top, split, rect.bottom)),
            (windows[1], Rect::new(split, rect.top, rect.right, rect.bottom)),
        ]
    } else {
        // Stacked rows; the second row absorbs the remainder.
        let split = rect.top + rect.height() / 2;
        vec![
            (windows[0], Rect::new(rect.left, rect.top, rect.right, split)),
            (windows[1], Rect::new(rect.left, split, rect.right, rect.bottom)),
        ]
    }
}

/// Master + stack: window 0 takes the near half, windows 1 and 2 split the
/// far half along the perpendicular axis.
fn layout_master_stack(windows: &[WindowId], rect: Rect) -> TilingAssignment {
    if rect.width() > rect.height() {
        let split_x = rect.left + rect.width() / 2;
        let split_y = rect.top + rect.height() / 2;
        vec![
            (windows[0], Rect::new(rect.left, rect.top, split_x, rect.bottom)),
            (windows[1], Rect::new(split_x, rect.top, rect.right, split_y)),
            (windows[2], Rect::new(split_x, split_y, rect.right, rect.bottom)),
        ]
    } else {
        let split_y = rect.top + rect.height() / 2;
        let split_x = rect.left + rect.width() / 2;
        vec![
            (windows[0], Rect::new(rect.left, rect.top, rect.right, split_y)),
            (windows[1], Rect::new(rect.left, split_y, split_x, rect.bottom)),
            (windows[2], Rect::new(split_x, split_y, rect.right, rect.bottom)),
        ]
    }
}

/// Row-major grid. Column widths are recomputed per row from that row's
/// window count so a short last row still spans the full rect width.
fn layout_grid(windows: &[WindowId], rect: Rect) -> TilingAssignment {
    let n = windows.len();
    let cols = (n as f64).sqrt().ceil() as usize;
    let rows = n.div_ceil(cols);

    let row_height = rect.height() / rows as i32;
    let mut cells = Vec::with_capacity(n);
    let mut placed = 0;

    for row in 0..rows {
        let top = rect.top + row as i32 * row_height;
        // Last row absorbs the vertical remainder.
        let bottom = if row == rows - 1 { rect.bottom } else { top + row_height };

        let in_row = cols.min(n - placed);
        let cell_width = rect.width() / in_row as i32;

        for col in 0..in_row {
            let left = rect.left + col as i32 * cell_width;
            // Last column in the row absorbs the horizontal remainder.
            let right = if col == in_row - 1 { rect.right } else { left + cell_width };

            cells.push((windows[placed], Rect::new(left, top, right, bottom)));
            placed += 1;
        }
    }

    cells
}

// ── Tests ─────────────────────────────────────────────────────────────────────
