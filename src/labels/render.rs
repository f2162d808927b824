//! Narrow interfaces to the glyph and icon renderers.
//!
//! The placement pass only measures text, reserves icon space and submits
//! draw requests with the opacity it computed. Everything about glyph
//! shaping, atlases and GPU buffers stays behind these traits.

use glam::DVec2;

use crate::labels::element::{IconDescriptor, LabelId};
use crate::labels::geometry::ScreenBox;
use crate::labels::occupancy::ScreenOccupancy;

/// One text draw request
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRun<'a> {
    pub id: LabelId,
    pub text: &'a str,
    /// Screen position of the text box's center
    pub position: DVec2,
    /// Rotation in radians, non-zero for path-following text
    pub rotation: f64,
    pub scale: f64,
    pub opacity: f64,
}

/// One icon draw request
#[derive(Clone, Debug, PartialEq)]
pub struct IconRequest<'a> {
    pub id: LabelId,
    pub icon: &'a IconDescriptor,
    /// Screen position of the icon's center
    pub position: DVec2,
    pub opacity: f64,
    pub scale: f64,
}

/// Glyph/text canvas collaborator
pub trait TextCanvas {
    /// Bounding box of `text` laid out at `scale`, centered on the origin.
    /// `None` when the text cannot be measured (e.g. missing glyphs).
    fn measure(&self, text: &str, scale: f64) -> Option<ScreenBox>;

    /// Queue a glyph run. Returns false when the canvas is out of capacity.
    fn add_text(&mut self, run: &GlyphRun<'_>) -> bool;
}

/// Icon collaborator
pub trait IconRenderer {
    /// Screen box of `icon` drawn centered on `position`
    fn icon_box(&self, icon: &IconDescriptor, position: DVec2) -> ScreenBox {
        ScreenBox::centered(position, icon.size * icon.scale)
    }

    /// Claim the icon's space in the occupancy tracker when the icon asks
    /// for it
    fn reserve(&mut self, icon: &IconDescriptor, position: DVec2, occupancy: &mut ScreenOccupancy) {
        if icon.reserve_space {
            occupancy.allocate(&self.icon_box(icon, position));
        }
    }

    /// Queue an icon draw. Returns false when the renderer is out of
    /// capacity.
    fn add_icon(&mut self, request: &IconRequest<'_>) -> bool;
}
