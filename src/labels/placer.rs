//! Per-frame placement orchestration.
//!
//! One [`LabelPlacer::place_text`] call per rendered frame:
//!
//! 1. gather every element of the active (visible or rendered) tiles and
//!    lay it out in screen space,
//! 2. sort by rank (priority, camera distance, fingerprint),
//! 3. suppress lower-ranked duplicates of the same text nearby,
//! 4. claim screen space in rank order through the occupancy tracker,
//! 5. drive every visited fade state from the decision,
//! 6. submit draws for everything still visible, with its opacity.
//!
//! Elements of inactive tiles are not touched and keep their fade state
//! frozen until their tile is visited again.

use std::collections::{HashMap, HashSet};
use std::f64::consts::{FRAC_PI_2, PI};
use std::time::Duration;

use glam::DVec2;

use crate::config::PlacementConfig;
use crate::labels::element::{IconDescriptor, LabelId, LabelKind, TextElement, Tile};
use crate::labels::fade::{FadeState, FadingState};
use crate::labels::geometry::{Rank, ScreenBox};
use crate::labels::occupancy::ScreenOccupancy;
use crate::labels::readiness::Readiness;
use crate::labels::render::{GlyphRun, IconRenderer, IconRequest, TextCanvas};
use crate::map::{Projection, ViewState};

/// Outcome of one candidate's placement this frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Not decided yet (only seen mid-pass)
    Pending,
    Placed,
    /// POI whose icon fit but whose optional text did not
    IconOnly,
    /// Overlaps space claimed by a higher-ranked label
    Collided,
    /// A higher-ranked label with the same text is nearby
    Duplicate,
    OffScreen,
    /// Geometry that cannot be laid out (empty path, unmeasurable text)
    Unplaceable,
}

impl Decision {
    pub fn is_placed(self) -> bool {
        matches!(self, Decision::Placed | Decision::IconOnly)
    }
}

/// Counters from one placement pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlacementStats {
    pub frame: u64,
    /// The pass was skipped because resources are still loading
    pub deferred: bool,
    pub candidates: usize,
    pub placed: usize,
    pub icon_only: usize,
    pub collided: usize,
    pub duplicates: usize,
    pub off_screen: usize,
    pub unplaceable: usize,
    /// Elements that adopted the fade state of a replaced tile's element
    pub adopted: usize,
    pub rendered_text: usize,
    pub rendered_icons: usize,
    pub text_overflow: usize,
    pub icon_overflow: usize,
}

/// Screen-space layout of one candidate
#[derive(Clone, Debug)]
enum Layout {
    Hidden,
    Point {
        text_box: ScreenBox,
    },
    Poi {
        position: DVec2,
        icon_box: ScreenBox,
        text_box: Option<ScreenBox>,
    },
    Path {
        anchor: DVec2,
        rotation: f64,
        boxes: Vec<ScreenBox>,
    },
    Markers {
        positions: Vec<DVec2>,
        /// Path vertex index of each position
        vertices: Vec<usize>,
        boxes: Vec<ScreenBox>,
        placed: Vec<bool>,
    },
}

impl Layout {
    /// Union of every box, used for duplicate detection
    fn bounds(&self) -> Option<ScreenBox> {
        let boxes: &[ScreenBox] = match self {
            Layout::Hidden => return None,
            Layout::Point { text_box } => return Some(*text_box),
            Layout::Poi {
                icon_box, text_box, ..
            } => return Some(text_box.map_or(*icon_box, |t| t.union(icon_box))),
            Layout::Path { boxes, .. } | Layout::Markers { boxes, .. } => boxes,
        };
        let (first, rest) = boxes.split_first()?;
        Some(rest.iter().fold(*first, |acc, b| acc.union(b)))
    }
}

struct Candidate {
    rank: Rank,
    layout: Layout,
    decision: Decision,
}

/// Fade states remembered from the previous frame, keyed by identity
#[derive(Clone)]
struct CarriedFade {
    frame: u64,
    text: FadeState,
    icon: Option<FadeState>,
    marker_vertices: Vec<usize>,
}

/// Everything constant for the duration of one pass
#[derive(Clone, Copy, Debug)]
struct FrameContext {
    frame: u64,
    time: f64,
    /// Force fade decisions; false keeps recent states while the camera moves
    force: bool,
    disable_fading: bool,
    fade_duration: f64,
}

/// The per-frame placement orchestrator
pub struct LabelPlacer {
    config: PlacementConfig,
    occupancy: ScreenOccupancy,
    readiness: Readiness,
    identities: HashMap<LabelId, CarriedFade>,
    candidates: Vec<Candidate>,
    /// Dedup regions of the winners, keyed by text hash
    dedup_regions: HashMap<u64, Vec<ScreenBox>>,
    deferring: bool,
    last_stats: PlacementStats,
}

impl LabelPlacer {
    /// A placer whose resources are already available
    pub fn new(config: PlacementConfig) -> Self {
        Self::with_readiness(config, Readiness::ready())
    }

    /// A placer that defers every pass until `readiness` reports loaded
    pub fn with_readiness(config: PlacementConfig, readiness: Readiness) -> Self {
        Self {
            config,
            occupancy: ScreenOccupancy::new(0.0, 0.0),
            readiness,
            identities: HashMap::new(),
            candidates: Vec::new(),
            dedup_regions: HashMap::new(),
            deferring: false,
            last_stats: PlacementStats::default(),
        }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PlacementConfig {
        &mut self.config
    }

    /// Turn occlusion on or off for subsequent passes
    pub fn set_collision_enabled(&mut self, enabled: bool) {
        self.config.collision_enabled = enabled;
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// True until the resources placement depends on have loaded. Stays
    /// true forever if loading failed.
    pub fn loading(&self) -> bool {
        !self.readiness.is_loaded()
    }

    /// Block until initialized or `timeout` elapses. Returns whether ready.
    pub fn wait_initialized(&self, timeout: Duration) -> bool {
        self.readiness.wait(timeout)
    }

    /// Occupancy as left by the last pass
    pub fn occupancy(&self) -> &ScreenOccupancy {
        &self.occupancy
    }

    pub fn last_stats(&self) -> PlacementStats {
        self.last_stats
    }

    /// Decisions of the last pass as (tile index, element index, decision),
    /// in rank order
    pub fn decisions(&self) -> impl Iterator<Item = (usize, usize, Decision)> + '_ {
        self.candidates
            .iter()
            .map(|c| (c.rank.tile, c.rank.element, c.decision))
    }

    /// Decision for one element in the last pass, if it was visited
    pub fn decision_for(&self, tile: usize, element: usize) -> Option<Decision> {
        self.decisions()
            .find(|&(t, e, _)| t == tile && e == element)
            .map(|(_, _, d)| d)
    }

    /// Run one placement pass and submit draws for every visible label
    pub fn place_text<P, C, I>(
        &mut self,
        tiles: &mut [Tile],
        view: &ViewState,
        projection: &P,
        time: f64,
        text: &mut C,
        icons: &mut I,
    ) -> PlacementStats
    where
        P: Projection + ?Sized,
        C: TextCanvas + ?Sized,
        I: IconRenderer + ?Sized,
    {
        if !self.readiness.is_loaded() {
            if !self.deferring {
                tracing::debug!(frame = view.frame, "label resources loading, deferring placement");
                self.deferring = true;
            }
            self.last_stats = PlacementStats {
                frame: view.frame,
                deferred: true,
                ..PlacementStats::default()
            };
            return self.last_stats;
        }
        if self.deferring {
            tracing::info!(frame = view.frame, "label resources ready, placement resumed");
            self.deferring = false;
        }

        let skip_occlusion = self.config.skip_occlusion_while_moving && view.camera_moving;
        let ctx = FrameContext {
            frame: view.frame,
            time,
            force: !skip_occlusion,
            disable_fading: self.config.disable_fading,
            fade_duration: self.config.fade_duration,
        };
        self.occupancy.update(view.width, view.height);
        self.occupancy
            .set_enabled(self.config.collision_enabled && !skip_occlusion);

        let mut stats = PlacementStats {
            frame: ctx.frame,
            ..PlacementStats::default()
        };

        self.gather(tiles, view, projection, text, icons);
        self.candidates.sort_by(|a, b| a.rank.cmp_placement(&b.rank));
        stats.candidates = self.candidates.len();
        stats.adopted = self.adopt_identities(tiles, ctx.frame);

        if self.config.dedup_enabled {
            self.deduplicate(tiles);
        }
        self.allocate(tiles, icons);
        self.update_and_emit(tiles, &ctx, text, icons, &mut stats);
        self.remember_identities(tiles, ctx.frame);

        if view.tiles_changed {
            tracing::debug!(frame = ctx.frame, adopted = stats.adopted, "tile set changed");
        }
        tracing::debug!(
            frame = stats.frame,
            candidates = stats.candidates,
            placed = stats.placed,
            collided = stats.collided,
            duplicates = stats.duplicates,
            off_screen = stats.off_screen,
            rendered = stats.rendered_text + stats.rendered_icons,
            "placement pass"
        );
        self.last_stats = stats;
        stats
    }

    /// Lay out every element of the active tiles
    fn gather<P, C, I>(
        &mut self,
        tiles: &[Tile],
        view: &ViewState,
        projection: &P,
        text: &C,
        icons: &I,
    ) where
        P: Projection + ?Sized,
        C: TextCanvas + ?Sized,
        I: IconRenderer + ?Sized,
    {
        self.candidates.clear();
        for (tile_idx, tile) in tiles.iter().enumerate() {
            if !tile.is_active() {
                continue;
            }
            for (element_idx, element) in tile.elements.iter().enumerate() {
                let distance = element
                    .kind
                    .primary_anchor()
                    .map_or(f64::INFINITY, |a| a.distance(view.world_center));
                let (layout, decision) =
                    layout_element(element, &self.config, &self.occupancy, projection, text, icons);
                self.candidates.push(Candidate {
                    rank: Rank {
                        priority: element.priority,
                        distance,
                        id: element.id,
                        tile: tile_idx,
                        element: element_idx,
                    },
                    layout,
                    decision,
                });
            }
        }
    }

    /// Elements never driven before (fresh from a replaced tile) take over
    /// the fade state their identity had last frame. Nothing moves while
    /// the previous owner is still visited this frame.
    fn adopt_identities(&self, tiles: &mut [Tile], frame: u64) -> usize {
        if self.identities.is_empty() {
            return 0;
        }
        let owned: HashSet<LabelId> = self
            .candidates
            .iter()
            .map(|c| &tiles[c.rank.tile].elements[c.rank.element])
            .filter(|e| e.last_frame_number().is_some())
            .map(|e| e.id)
            .collect();

        let mut adopted = 0;
        for cand in &self.candidates {
            let element = &mut tiles[cand.rank.tile].elements[cand.rank.element];
            if element.last_frame_number().is_some() || owned.contains(&element.id) {
                continue;
            }
            let Some(carried) = self.identities.get(&element.id) else {
                continue;
            };
            if carried.frame + 1 < frame {
                continue;
            }
            element.text_fade = carried.text;
            if element.icon_fade.is_some() {
                if let Some(icon) = carried.icon {
                    element.icon_fade = Some(icon);
                }
            }
            element.marker_vertices.clone_from(&carried.marker_vertices);
            adopted += 1;
        }
        adopted
    }

    /// Keep only the best-ranked candidate among equal texts lying within
    /// `dedup_margin` of each other
    fn deduplicate(&mut self, tiles: &[Tile]) {
        for regions in self.dedup_regions.values_mut() {
            regions.clear();
        }
        let margin = self.config.dedup_margin;
        for cand in &mut self.candidates {
            if cand.decision != Decision::Pending {
                continue;
            }
            let element = &tiles[cand.rank.tile].elements[cand.rank.element];
            if element.text.is_empty() {
                continue;
            }
            let Some(bounds) = cand.layout.bounds() else {
                continue;
            };
            let reach = bounds.inflate(margin);
            let regions = self.dedup_regions.entry(cand.rank.id.text_key()).or_default();
            if regions.iter().any(|r| r.intersects(&reach)) {
                cand.decision = Decision::Duplicate;
            } else {
                regions.push(bounds);
            }
        }
    }

    /// Claim screen space in rank order
    fn allocate<I>(&mut self, tiles: &[Tile], icons: &mut I)
    where
        I: IconRenderer + ?Sized,
    {
        let padding = self.config.label_padding;
        for cand in &mut self.candidates {
            if cand.decision != Decision::Pending {
                continue;
            }
            let element = &tiles[cand.rank.tile].elements[cand.rank.element];
            cand.decision = match &mut cand.layout {
                Layout::Hidden => Decision::Unplaceable,
                Layout::Point { text_box } => {
                    if self.occupancy.try_allocate(&text_box.inflate(padding)) {
                        Decision::Placed
                    } else {
                        Decision::Collided
                    }
                }
                Layout::Poi {
                    position,
                    icon_box,
                    text_box,
                } => {
                    let icon_free = !self.occupancy.is_allocated_mut(&icon_box.inflate(padding));
                    let text_free = text_box
                        .is_some_and(|t| !self.occupancy.is_allocated_mut(&t.inflate(padding)));
                    let text_optional = element.kind.icon().is_some_and(|i| i.text_optional);
                    if icon_free && (text_free || text_optional) {
                        if let Some(icon) = element.kind.icon() {
                            icons.reserve(icon, *position, &mut self.occupancy);
                        }
                        match text_box {
                            Some(t) if text_free => {
                                self.occupancy.allocate(&t.inflate(padding));
                                Decision::Placed
                            }
                            _ => Decision::IconOnly,
                        }
                    } else {
                        Decision::Collided
                    }
                }
                Layout::Path { boxes, .. } => {
                    let padded: Vec<ScreenBox> = boxes.iter().map(|b| b.inflate(padding)).collect();
                    if padded.iter().any(|b| self.occupancy.is_allocated_mut(b)) {
                        Decision::Collided
                    } else {
                        for b in &padded {
                            self.occupancy.allocate(b);
                        }
                        Decision::Placed
                    }
                }
                Layout::Markers { boxes, placed, .. } => {
                    for (b, slot) in boxes.iter().zip(placed.iter_mut()) {
                        *slot = self.occupancy.try_allocate(&b.inflate(padding));
                    }
                    if placed.iter().any(|&p| p) {
                        Decision::Placed
                    } else {
                        Decision::Collided
                    }
                }
            };
        }
    }

    /// Drive fade states from this frame's decisions, then draw whatever is
    /// still visible
    fn update_and_emit<C, I>(
        &self,
        tiles: &mut [Tile],
        ctx: &FrameContext,
        text: &mut C,
        icons: &mut I,
        stats: &mut PlacementStats,
    ) where
        C: TextCanvas + ?Sized,
        I: IconRenderer + ?Sized,
    {
        for cand in &self.candidates {
            let element = &mut tiles[cand.rank.tile].elements[cand.rank.element];
            match cand.decision {
                Decision::Placed => stats.placed += 1,
                Decision::IconOnly => stats.icon_only += 1,
                Decision::Collided => stats.collided += 1,
                Decision::Duplicate => stats.duplicates += 1,
                Decision::OffScreen => stats.off_screen += 1,
                Decision::Unplaceable | Decision::Pending => stats.unplaceable += 1,
            }

            drive_fades(element, cand.decision, ctx);
            if let (Decision::Placed, Layout::Markers { vertices, placed, .. }) =
                (cand.decision, &cand.layout)
            {
                element.marker_vertices.clear();
                element.marker_vertices.extend(
                    vertices
                        .iter()
                        .zip(placed)
                        .filter(|(_, p)| **p)
                        .map(|(&v, _)| v),
                );
            }
            let text_visible = element.text_fade.update_fading(ctx.time, ctx.disable_fading);
            let icon_visible = match element.icon_fade.as_mut() {
                Some(fade) => fade.update_fading(ctx.time, ctx.disable_fading),
                None => false,
            };

            tracing::trace!(
                label = %element.text,
                decision = ?cand.decision,
                text_opacity = element.text_fade.opacity(),
                "label decision"
            );

            let text_opacity = element.text_fade.opacity();
            let icon_opacity = element.icon_fade.map_or(0.0, |f| f.opacity());
            let show_text = text_visible && text_opacity > 0.0;
            let show_icon = icon_visible && icon_opacity > 0.0;
            if !show_text && !show_icon {
                continue;
            }
            emit(
                element,
                &cand.layout,
                show_text.then_some(text_opacity),
                show_icon.then_some(icon_opacity),
                text,
                icons,
                stats,
            );
        }
    }

    /// Rebuild the identity map from this frame's candidates, best rank wins
    fn remember_identities(&mut self, tiles: &[Tile], frame: u64) {
        self.identities.clear();
        for cand in &self.candidates {
            let element = &tiles[cand.rank.tile].elements[cand.rank.element];
            self.identities
                .entry(element.id)
                .or_insert_with(|| CarriedFade {
                    frame,
                    text: element.text_fade,
                    icon: element.icon_fade,
                    marker_vertices: element.marker_vertices.clone(),
                });
        }
    }
}

/// Compute an element's screen layout. Elements that cannot be shown get
/// `Layout::Hidden` and their final decision right away.
fn layout_element<P, C, I>(
    element: &TextElement,
    config: &PlacementConfig,
    occupancy: &ScreenOccupancy,
    projection: &P,
    text: &C,
    icons: &I,
) -> (Layout, Decision)
where
    P: Projection + ?Sized,
    C: TextCanvas + ?Sized,
    I: IconRenderer + ?Sized,
{
    let hidden = |decision| (Layout::Hidden, decision);
    match &element.kind {
        LabelKind::Point { anchor } => {
            let Some(position) = projection.project(*anchor) else {
                return hidden(Decision::OffScreen);
            };
            let Some(measured) = text.measure(&element.text, element.text_scale) else {
                return hidden(Decision::Unplaceable);
            };
            let text_box = measured.translate(position);
            if !occupancy.is_visible(&text_box) {
                return hidden(Decision::OffScreen);
            }
            (Layout::Point { text_box }, Decision::Pending)
        }
        LabelKind::Poi { anchor, icon } => {
            let Some(position) = projection.project(*anchor) else {
                return hidden(Decision::OffScreen);
            };
            let icon_box = icons.icon_box(icon, position);
            let text_box = text.measure(&element.text, element.text_scale).map(|m| {
                let center = DVec2::new(
                    icon_box.max.x + config.icon_text_gap + m.width() / 2.0,
                    position.y,
                );
                m.translate(center)
            });
            if text_box.is_none() && !icon.text_optional {
                return hidden(Decision::Unplaceable);
            }
            let bounds = text_box.map_or(icon_box, |t| t.union(&icon_box));
            if !occupancy.is_visible(&bounds) {
                return hidden(Decision::OffScreen);
            }
            (
                Layout::Poi {
                    position,
                    icon_box,
                    text_box,
                },
                Decision::Pending,
            )
        }
        LabelKind::Path { path } => {
            if path.len() < 2 {
                return hidden(Decision::Unplaceable);
            }
            let Some(measured) = text.measure(&element.text, element.text_scale) else {
                return hidden(Decision::Unplaceable);
            };
            let Some(points) = path
                .iter()
                .map(|p| projection.project(*p))
                .collect::<Option<Vec<DVec2>>>()
            else {
                return hidden(Decision::OffScreen);
            };
            let glyph = DVec2::splat(measured.height());
            let boxes: Vec<ScreenBox> = points.iter().map(|p| ScreenBox::centered(*p, glyph)).collect();
            if !boxes.iter().all(|b| occupancy.is_visible(b)) {
                return hidden(Decision::OffScreen);
            }
            let mid = points.len() / 2;
            let (a, b) = (points[mid - 1], points[mid]);
            (
                Layout::Path {
                    anchor: (a + b) * 0.5,
                    rotation: upright((b.y - a.y).atan2(b.x - a.x)),
                    boxes,
                },
                Decision::Pending,
            )
        }
        LabelKind::LineMarker { path, icon } => {
            if path.is_empty() {
                return hidden(Decision::Unplaceable);
            }
            let text_size = if element.text.is_empty() {
                None
            } else {
                text.measure(&element.text, element.text_scale).map(|m| m.size())
            };
            let mut positions = Vec::with_capacity(path.len());
            let mut vertices = Vec::with_capacity(path.len());
            let mut boxes = Vec::with_capacity(path.len());
            for (vertex, p) in path.iter().enumerate() {
                let Some(position) = projection.project(*p) else {
                    continue;
                };
                let mut bbox = icons.icon_box(icon, position);
                if let Some(size) = text_size {
                    bbox = bbox.union(&ScreenBox::centered(position, size));
                }
                if occupancy.is_visible(&bbox) {
                    positions.push(position);
                    vertices.push(vertex);
                    boxes.push(bbox);
                }
            }
            if positions.is_empty() {
                return hidden(Decision::OffScreen);
            }
            let placed = vec![false; positions.len()];
            (
                Layout::Markers {
                    positions,
                    vertices,
                    boxes,
                    placed,
                },
                Decision::Pending,
            )
        }
    }
}

/// Keep path text readable: never upside down
fn upright(angle: f64) -> f64 {
    if angle > FRAC_PI_2 {
        angle - PI
    } else if angle < -FRAC_PI_2 {
        angle + PI
    } else {
        angle
    }
}

/// Apply one frame's decision to an element's fade states
fn drive_fades(element: &mut TextElement, decision: Decision, ctx: &FrameContext) {
    let (frame, time, force) = (ctx.frame, ctx.time, ctx.force);
    element.text_fade.set_duration(ctx.fade_duration, time);
    if let Some(icon) = element.icon_fade.as_mut() {
        icon.set_duration(ctx.fade_duration, time);
    }

    let text_placed = decision == Decision::Placed;
    let icon_placed = decision.is_placed();

    if text_placed {
        element.text_fade.check_start_fade_in(frame, time, force);
    } else if element.kind.is_path_like() {
        // Path-following text has no fade-out transition: it drops out
        let fade = &mut element.text_fade;
        if force || fade.state() == FadingState::Undefined || fade.is_stale(frame) {
            fade.hide(frame);
        } else {
            fade.check_start_fade_out(frame, time, false);
        }
    } else {
        element.text_fade.check_start_fade_out(frame, time, force);
    }

    if let Some(icon) = element.icon_fade.as_mut() {
        if icon_placed {
            icon.check_start_fade_in(frame, time, force);
        } else {
            icon.check_start_fade_out(frame, time, force);
        }
    }
}

/// Submit draw requests for one visible element
fn emit<C, I>(
    element: &TextElement,
    layout: &Layout,
    text_opacity: Option<f64>,
    icon_opacity: Option<f64>,
    text: &mut C,
    icons: &mut I,
    stats: &mut PlacementStats,
) where
    C: TextCanvas + ?Sized,
    I: IconRenderer + ?Sized,
{
    match (layout, &element.kind) {
        (Layout::Hidden, _) => {}
        (Layout::Point { text_box }, _) => {
            if let Some(opacity) = text_opacity {
                draw_text(text, element, text_box.center(), 0.0, opacity, stats);
            }
        }
        (
            Layout::Poi {
                position, text_box, ..
            },
            LabelKind::Poi { icon, .. },
        ) => {
            if let (Some(opacity), Some(t)) = (text_opacity, text_box) {
                draw_text(text, element, t.center(), 0.0, opacity, stats);
            }
            if let Some(opacity) = icon_opacity {
                draw_icon(icons, element, icon, *position, opacity, stats);
            }
        }
        (Layout::Path { anchor, rotation, .. }, _) => {
            if let Some(opacity) = text_opacity {
                draw_text(text, element, *anchor, *rotation, opacity, stats);
            }
        }
        (
            Layout::Markers {
                positions,
                vertices,
                placed,
                ..
            },
            LabelKind::LineMarker { icon, .. },
        ) => {
            // Placed vertices only; a marker fading out keeps the vertices
            // it showed the last time it was placed
            let any_placed = placed.iter().any(|&p| p);
            let text_opacity = text_opacity.filter(|_| !element.text.is_empty());
            for ((position, vertex), &p) in positions.iter().zip(vertices).zip(placed) {
                let shown = if any_placed {
                    p
                } else {
                    element.marker_vertices.contains(vertex)
                };
                if !shown {
                    continue;
                }
                if let Some(opacity) = icon_opacity {
                    draw_icon(icons, element, icon, *position, opacity, stats);
                }
                if let Some(opacity) = text_opacity {
                    draw_text(text, element, *position, 0.0, opacity, stats);
                }
            }
        }
        // Layouts are built from the element's own kind
        (Layout::Poi { .. }, _) | (Layout::Markers { .. }, _) => {}
    }
}

fn draw_text<C: TextCanvas + ?Sized>(
    canvas: &mut C,
    element: &TextElement,
    position: DVec2,
    rotation: f64,
    opacity: f64,
    stats: &mut PlacementStats,
) {
    let run = GlyphRun {
        id: element.id,
        text: &element.text,
        position,
        rotation,
        scale: element.text_scale,
        opacity,
    };
    if canvas.add_text(&run) {
        stats.rendered_text += 1;
    } else {
        stats.text_overflow += 1;
    }
}

fn draw_icon<I: IconRenderer + ?Sized>(
    icons: &mut I,
    element: &TextElement,
    icon: &IconDescriptor,
    position: DVec2,
    opacity: f64,
    stats: &mut PlacementStats,
) {
    let request = IconRequest {
        id: element.id,
        icon,
        position,
        opacity,
        scale: icon.scale,
    };
    if icons.add_icon(&request) {
        stats.rendered_icons += 1;
    } else {
        stats.icon_overflow += 1;
    }
}
