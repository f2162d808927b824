use std::collections::HashMap;

use crate::labels::ScreenBox;

/// Spatial hash grid over screen pixels for fast overlap queries.
/// Each box is indexed into every cell it overlaps (conservative
/// approximation), so queries have no false negatives but may return
/// false positives that the caller eliminates with an exact test.
pub struct ScreenGrid {
    /// Grid cells indexed by (cell_x, cell_y), holding box indices
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Cell size in pixels
    cell_size: f64,
}

impl ScreenGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size: cell_size.max(1.0),
        }
    }

    #[inline(always)]
    fn to_cell(&self, x: f64, y: f64) -> (i32, i32) {
        let cx = (x / self.cell_size).floor() as i32;
        let cy = (y / self.cell_size).floor() as i32;
        (cx, cy)
    }

    /// Index `idx` under every cell the box overlaps
    pub fn insert(&mut self, bbox: &ScreenBox, idx: usize) {
        let min_cell = self.to_cell(bbox.min.x, bbox.min.y);
        let max_cell = self.to_cell(bbox.max.x, bbox.max.y);
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                self.cells.entry((x, y)).or_default().push(idx);
            }
        }
    }

    /// Append indices of boxes sharing a cell with `bbox` into results.
    /// May contain duplicates when a box spans several cells.
    pub fn query_into(&self, bbox: &ScreenBox, results: &mut Vec<usize>) {
        let min_cell = self.to_cell(bbox.min.x, bbox.min.y);
        let max_cell = self.to_cell(bbox.max.x, bbox.max.y);
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    results.extend_from_slice(indices);
                }
            }
        }
    }

    /// Drop all entries but keep the allocated buckets for the next frame
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
    }
}
