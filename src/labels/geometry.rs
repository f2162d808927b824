use std::cmp::Ordering;

use glam::DVec2;

use crate::labels::LabelId;

/// Axis-aligned rectangle in screen pixels. `min` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl ScreenBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: DVec2::new(min_x.min(max_x), min_y.min(max_y)),
            max: DVec2::new(min_x.max(max_x), min_y.max(max_y)),
        }
    }

    /// Box of the given size centered on a point
    pub fn centered(center: DVec2, size: DVec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Move the box by an offset
    pub fn translate(&self, offset: DVec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Grow on every side; negative amounts shrink but never invert the box
    pub fn inflate(&self, amount: f64) -> Self {
        let min = self.min - DVec2::splat(amount);
        let max = self.max + DVec2::splat(amount);
        let center = self.center();
        Self {
            min: min.min(center),
            max: max.max(center),
        }
    }

    pub fn union(&self, other: &ScreenBox) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Strict overlap: boxes that only share an edge do not intersect
    #[inline]
    pub fn intersects(&self, other: &ScreenBox) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Sort key deciding which label wins occlusion and deduplication.
/// Higher priority first, then closer to the camera, then a stable
/// fingerprint and source position so the order is total.
#[derive(Clone, Copy, Debug)]
pub struct Rank {
    pub priority: i32,
    pub distance: f64,
    pub id: LabelId,
    pub tile: usize,
    pub element: usize,
}

impl Rank {
    pub fn cmp_placement(&self, other: &Rank) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.distance.total_cmp(&other.distance))
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.tile.cmp(&other.tile))
            .then_with(|| self.element.cmp(&other.element))
    }
}
