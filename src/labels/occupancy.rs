use crate::labels::geometry::ScreenBox;
use crate::map::spatial::ScreenGrid;

/// Default bucket size for the occupancy grid, in pixels
const CELL_SIZE: f64 = 32.0;

/// Screen rectangles claimed during the current placement pass.
///
/// Cleared at the start of every pass. When disabled, queries always
/// answer "free" and allocations are not recorded, which suspends
/// occlusion for that frame.
pub struct ScreenOccupancy {
    bounds: ScreenBox,
    boxes: Vec<ScreenBox>,
    grid: ScreenGrid,
    enabled: bool,
    /// Scratch buffer for grid queries
    hits: Vec<usize>,
}

impl ScreenOccupancy {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            bounds: ScreenBox::new(0.0, 0.0, width.max(0.0), height.max(0.0)),
            boxes: Vec::new(),
            grid: ScreenGrid::new(CELL_SIZE),
            enabled: true,
            hits: Vec::new(),
        }
    }

    /// Reset viewport bounds and forget every allocation
    pub fn update(&mut self, width: f64, height: f64) {
        self.bounds = ScreenBox::new(0.0, 0.0, width.max(0.0), height.max(0.0));
        self.reset();
    }

    /// Forget every allocation; bounds and the enabled flag are kept
    pub fn reset(&mut self) {
        self.boxes.clear();
        self.grid.clear();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn bounds(&self) -> ScreenBox {
        self.bounds
    }

    /// Number of boxes allocated this pass
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Whether the box overlaps the viewport at all
    pub fn is_visible(&self, bbox: &ScreenBox) -> bool {
        bbox.intersects(&self.bounds)
    }

    /// Whether the box overlaps anything allocated this pass
    pub fn is_allocated(&self, bbox: &ScreenBox) -> bool {
        if !self.enabled {
            return false;
        }
        let mut hits = Vec::new();
        self.grid.query_into(bbox, &mut hits);
        hits.iter().any(|&idx| self.boxes[idx].intersects(bbox))
    }

    /// Same as [`is_allocated`](Self::is_allocated) but reuses an internal
    /// scratch buffer; the placement hot path calls this one
    pub fn is_allocated_mut(&mut self, bbox: &ScreenBox) -> bool {
        if !self.enabled {
            return false;
        }
        self.hits.clear();
        self.grid.query_into(bbox, &mut self.hits);
        let boxes = &self.boxes;
        self.hits.iter().any(|&idx| boxes[idx].intersects(bbox))
    }

    /// Mark the box as occupied
    pub fn allocate(&mut self, bbox: &ScreenBox) {
        if !self.enabled {
            return;
        }
        let idx = self.boxes.len();
        self.boxes.push(*bbox);
        self.grid.insert(bbox, idx);
    }

    /// Allocate the box if it is free. Returns whether it was allocated.
    pub fn try_allocate(&mut self, bbox: &ScreenBox) -> bool {
        if self.is_allocated_mut(bbox) {
            return false;
        }
        self.allocate(bbox);
        true
    }
}
