use glam::DVec2;

use crate::geo::TileKey;
use crate::hash::{hash2, hash_str, quantize};
use crate::labels::fade::FadeState;

/// Anchor positions are snapped to this many degrees before hashing
const ANCHOR_QUANTUM: f64 = 1e-4;

/// Stable fingerprint of a real-world label: text content plus geometric
/// class. Survives tile replacement because it never depends on which tile
/// owns the element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId {
    text_key: u64,
    anchor_key: u64,
}

impl LabelId {
    pub fn new(text: &str, kind: &LabelKind) -> Self {
        let anchor = kind.primary_anchor().unwrap_or(DVec2::ZERO);
        let anchor_key = hash2(
            hash2(quantize(anchor.x, ANCHOR_QUANTUM), quantize(anchor.y, ANCHOR_QUANTUM)),
            kind.class_tag(),
        );
        Self {
            text_key: hash_str(text),
            anchor_key,
        }
    }

    pub fn from_parts(text_key: u64, anchor_key: u64) -> Self {
        Self { text_key, anchor_key }
    }

    /// Hash of the text alone; equal for every label showing the same text
    pub fn text_key(&self) -> u64 {
        self.text_key
    }

    pub fn anchor_key(&self) -> u64 {
        self.anchor_key
    }
}

/// Icon drawn with a POI or repeated along a line marker
#[derive(Clone, Debug, PartialEq)]
pub struct IconDescriptor {
    pub name: String,
    /// Unscaled icon size in screen pixels
    pub size: DVec2,
    pub scale: f64,
    /// Claim the icon's screen box so other labels avoid it
    pub reserve_space: bool,
    /// Show the icon alone when its text does not fit
    pub text_optional: bool,
}

impl IconDescriptor {
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            size: DVec2::new(width, height),
            scale: 1.0,
            reserve_space: true,
            text_optional: false,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_text_optional(mut self, text_optional: bool) -> Self {
        self.text_optional = text_optional;
        self
    }

    pub fn with_reserve_space(mut self, reserve_space: bool) -> Self {
        self.reserve_space = reserve_space;
        self
    }
}

/// What kind of label an element is, with the geometry it is anchored to.
/// World positions are lon/lat (x = lon, y = lat).
#[derive(Clone, Debug, PartialEq)]
pub enum LabelKind {
    /// Text centered on a single point
    Point { anchor: DVec2 },
    /// Icon at a point with text beside it
    Poi { anchor: DVec2, icon: IconDescriptor },
    /// Text following an ordered path
    Path { path: Vec<DVec2> },
    /// Icon (and optional short text) repeated at every path vertex
    LineMarker { path: Vec<DVec2>, icon: IconDescriptor },
}

impl LabelKind {
    /// First anchor position, if any
    pub fn primary_anchor(&self) -> Option<DVec2> {
        self.anchors().first().copied()
    }

    pub fn anchors(&self) -> &[DVec2] {
        match self {
            LabelKind::Point { anchor } | LabelKind::Poi { anchor, .. } => std::slice::from_ref(anchor),
            LabelKind::Path { path } | LabelKind::LineMarker { path, .. } => path,
        }
    }

    pub fn icon(&self) -> Option<&IconDescriptor> {
        match self {
            LabelKind::Poi { icon, .. } | LabelKind::LineMarker { icon, .. } => Some(icon),
            LabelKind::Point { .. } | LabelKind::Path { .. } => None,
        }
    }

    /// Path-following kinds lack a fade-out transition for their text
    pub fn is_path_like(&self) -> bool {
        matches!(self, LabelKind::Path { .. } | LabelKind::LineMarker { .. })
    }

    fn class_tag(&self) -> u64 {
        match self {
            LabelKind::Point { .. } => 1,
            LabelKind::Poi { .. } => 2,
            LabelKind::Path { .. } => 3,
            LabelKind::LineMarker { .. } => 4,
        }
    }
}

/// A placeable label owned by exactly one tile
#[derive(Clone, Debug)]
pub struct TextElement {
    pub id: LabelId,
    pub text: String,
    pub kind: LabelKind,
    /// Higher is more important
    pub priority: i32,
    /// Glyph scale handed to the text canvas
    pub text_scale: f64,
    pub text_fade: FadeState,
    /// Present only for kinds that carry an icon
    pub icon_fade: Option<FadeState>,
    /// Line marker path vertices claimed the last frame it was placed
    pub marker_vertices: Vec<usize>,
}

impl TextElement {
    pub fn new(text: impl Into<String>, kind: LabelKind, priority: i32) -> Self {
        let text = text.into();
        let id = LabelId::new(&text, &kind);
        let icon_fade = kind.icon().map(|_| FadeState::new());
        Self {
            id,
            text,
            kind,
            priority,
            text_scale: 1.0,
            text_fade: FadeState::new(),
            icon_fade,
            marker_vertices: Vec::new(),
        }
    }

    pub fn point(text: impl Into<String>, anchor: DVec2, priority: i32) -> Self {
        Self::new(text, LabelKind::Point { anchor }, priority)
    }

    pub fn poi(text: impl Into<String>, anchor: DVec2, icon: IconDescriptor, priority: i32) -> Self {
        Self::new(text, LabelKind::Poi { anchor, icon }, priority)
    }

    pub fn path(text: impl Into<String>, path: Vec<DVec2>, priority: i32) -> Self {
        Self::new(text, LabelKind::Path { path }, priority)
    }

    pub fn line_marker(
        text: impl Into<String>,
        path: Vec<DVec2>,
        icon: IconDescriptor,
        priority: i32,
    ) -> Self {
        Self::new(text, LabelKind::LineMarker { path, icon }, priority)
    }

    pub fn with_text_scale(mut self, scale: f64) -> Self {
        self.text_scale = scale;
        self
    }

    /// Highest opacity across the element's parts
    pub fn opacity(&self) -> f64 {
        let icon = self.icon_fade.as_ref().map_or(0.0, FadeState::opacity);
        self.text_fade.opacity().max(icon)
    }

    pub fn is_visible(&self) -> bool {
        self.text_fade.is_visible() || self.icon_fade.as_ref().is_some_and(FadeState::is_visible)
    }

    /// Frame the element was last driven by a placement pass
    pub fn last_frame_number(&self) -> Option<u64> {
        let icon = self.icon_fade.as_ref().and_then(FadeState::last_frame_number);
        self.text_fade.last_frame_number().max(icon)
    }
}

/// A geographic partition owning the labels inside it
#[derive(Clone, Debug)]
pub struct Tile {
    pub key: TileKey,
    pub elements: Vec<TextElement>,
    /// In view this frame
    pub visible: bool,
    /// Drawn this frame even though outside the strict view (e.g. a parent
    /// tile kept while its children load)
    pub rendered: bool,
}

impl Tile {
    pub fn new(key: TileKey) -> Self {
        Self {
            key,
            elements: Vec::new(),
            visible: false,
            rendered: false,
        }
    }

    pub fn with_elements(key: TileKey, elements: Vec<TextElement>) -> Self {
        Self {
            key,
            elements,
            visible: false,
            rendered: false,
        }
    }

    /// Whether the placement pass visits this tile
    pub fn is_active(&self) -> bool {
        self.visible || self.rendered
    }

    pub fn push(&mut self, element: TextElement) {
        self.elements.push(element);
    }
}
