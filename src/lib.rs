//! Map label visibility and fade transitions.
//!
//! Every frame, [`LabelPlacer::place_text`] decides which labels of the
//! active tiles fit on screen, drives each label's fade state and hands the
//! survivors to the glyph and icon renderers with their opacity.

pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod hash;
pub mod labels;
pub mod map;

pub use config::PlacementConfig;
pub use error::{LabelError, Result};
pub use labels::{
    Decision, FadeState, FadingState, IconDescriptor, IconRenderer, LabelId, LabelKind,
    LabelPlacer, PlacementStats, Readiness, ScreenBox, ScreenOccupancy, TextCanvas, TextElement,
    Tile,
};
pub use map::{GlobeViewport, Projection, ViewState, Viewport};
