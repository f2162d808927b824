mod element;
mod fade;
mod geometry;
mod occupancy;
mod placer;
mod readiness;
mod render;

pub use element::{IconDescriptor, LabelId, LabelKind, TextElement, Tile};
pub use fade::{smootherstep, FadeState, FadingState};
pub use geometry::{Rank, ScreenBox};
pub use occupancy::ScreenOccupancy;
pub use placer::{Decision, LabelPlacer, PlacementStats};
pub use readiness::{LoadState, Readiness};
pub use render::{GlyphRun, IconRenderer, IconRequest, TextCanvas};
