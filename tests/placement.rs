use std::time::Duration;

use glam::DVec2;
use map_labels::geo::TileKey;
use map_labels::labels::{
    Decision, FadingState, GlyphRun, IconDescriptor, IconRenderer, IconRequest, LabelPlacer,
    Readiness, ScreenBox, TextCanvas, TextElement, Tile,
};
use map_labels::map::{GlobeViewport, ViewState};
use map_labels::{PlacementConfig, PlacementStats};
use proptest::prelude::*;

const WIDTH: f64 = 400.0;
const HEIGHT: f64 = 300.0;

/// Text canvas where every character is 8x10 pixels; records every run
#[derive(Default)]
struct RecordingCanvas {
    runs: Vec<(String, f64)>,
    capacity: Option<usize>,
}

impl TextCanvas for RecordingCanvas {
    fn measure(&self, text: &str, scale: f64) -> Option<ScreenBox> {
        let size = DVec2::new(text.chars().count() as f64 * 8.0, 10.0) * scale;
        Some(ScreenBox::centered(DVec2::ZERO, size))
    }

    fn add_text(&mut self, run: &GlyphRun<'_>) -> bool {
        if self.capacity.is_some_and(|c| self.runs.len() >= c) {
            return false;
        }
        self.runs.push((run.text.to_string(), run.opacity));
        true
    }
}

#[derive(Default)]
struct RecordingIcons {
    requests: Vec<(String, DVec2, f64)>,
}

impl IconRenderer for RecordingIcons {
    fn add_icon(&mut self, request: &IconRequest<'_>) -> bool {
        self.requests
            .push((request.icon.name.clone(), request.position, request.opacity));
        true
    }
}

/// World space is screen space
fn identity(p: DVec2) -> Option<DVec2> {
    Some(p)
}

fn visible_tile(x: u32, elements: Vec<TextElement>) -> Tile {
    let mut tile = Tile::with_elements(TileKey { zoom: 0, x, y: 0 }, elements);
    tile.visible = true;
    tile
}

struct Harness {
    placer: LabelPlacer,
    canvas: RecordingCanvas,
    icons: RecordingIcons,
    frame: u64,
}

impl Harness {
    fn new(config: PlacementConfig) -> Self {
        Self {
            placer: LabelPlacer::new(config),
            canvas: RecordingCanvas::default(),
            icons: RecordingIcons::default(),
            frame: 0,
        }
    }

    fn view(&self) -> ViewState {
        ViewState::new(DVec2::new(WIDTH / 2.0, HEIGHT / 2.0), 1.0, self.frame, WIDTH, HEIGHT)
    }

    fn frame(&mut self, tiles: &mut [Tile], time: f64) -> PlacementStats {
        self.frame += 1;
        let view = self.view();
        self.frame_with(tiles, view, time)
    }

    fn frame_with(&mut self, tiles: &mut [Tile], view: ViewState, time: f64) -> PlacementStats {
        self.canvas.runs.clear();
        self.icons.requests.clear();
        self.placer
            .place_text(tiles, &view, &identity, time, &mut self.canvas, &mut self.icons)
    }

    fn rendered(&self, text: &str) -> bool {
        self.canvas.runs.iter().any(|(t, _)| t == text)
    }

    fn runs_of(&self, text: &str) -> usize {
        self.canvas.runs.iter().filter(|(t, _)| t == text).count()
    }
}

#[test]
fn single_label_fades_in_over_duration() {
    let mut harness = Harness::new(PlacementConfig::default());
    let mut tiles = vec![visible_tile(0, vec![TextElement::point("Paris", DVec2::new(100.0, 100.0), 0)])];

    let mut observed = Vec::new();
    for time in [1.0, 267.0, 400.0, 801.0] {
        harness.frame(&mut tiles, time);
        let fade = tiles[0].elements[0].text_fade;
        observed.push((fade.state(), fade.opacity()));
    }

    let states: Vec<FadingState> = observed.iter().map(|(s, _)| *s).collect();
    assert_eq!(
        states,
        vec![
            FadingState::FadingIn,
            FadingState::FadingIn,
            FadingState::FadingIn,
            FadingState::FadedIn
        ]
    );
    for pair in observed.windows(2) {
        assert!(pair[1].1 > pair[0].1, "opacity must increase: {observed:?}");
    }
    assert_eq!(observed[3].1, 1.0);
    assert!(harness.rendered("Paris"));
}

#[test]
fn colliding_pois_keep_higher_priority() {
    let mut harness = Harness::new(PlacementConfig::default());
    let icon = IconDescriptor::new("pin", 12.0, 12.0);
    let mut tiles = vec![visible_tile(
        0,
        vec![
            TextElement::poi("Low", DVec2::new(100.0, 100.0), icon.clone(), 0),
            TextElement::poi("High", DVec2::new(104.0, 102.0), icon, 1),
        ],
    )];

    // Two full fade cycles
    for (i, time) in (0..9).map(|i| (i, i as f64 * 200.0)) {
        harness.frame(&mut tiles, time);
        let low = &tiles[0].elements[0];
        let high = &tiles[0].elements[1];

        assert_eq!(low.text_fade.state(), FadingState::FadedOut);
        assert_eq!(low.icon_fade.map(|f| f.state()), Some(FadingState::FadedOut));
        assert!(!harness.rendered("Low"));
        assert!(harness.icons.requests.iter().all(|(_, _, o)| *o > 0.0));

        let expected = if i < 4 { FadingState::FadingIn } else { FadingState::FadedIn };
        assert_eq!(high.text_fade.state(), expected, "frame {i}");
        assert_eq!(harness.placer.decision_for(0, 1), Some(Decision::Placed));
        assert_eq!(harness.placer.decision_for(0, 0), Some(Decision::Collided));
    }
}

#[test]
fn displaced_label_fades_out() {
    let mut harness = Harness::new(PlacementConfig::default());
    let mut tiles = vec![visible_tile(0, vec![TextElement::point("Low", DVec2::new(100.0, 100.0), 0)])];

    harness.frame(&mut tiles, 0.0);
    harness.frame(&mut tiles, 800.0);
    assert_eq!(tiles[0].elements[0].text_fade.state(), FadingState::FadedIn);

    tiles[0].push(TextElement::point("High", DVec2::new(104.0, 100.0), 5));

    let mut low_opacity = Vec::new();
    for time in [900.0, 1300.0, 1700.0] {
        harness.frame(&mut tiles, time);
        assert_ne!(harness.placer.decision_for(0, 0), Some(Decision::Placed));
        assert_eq!(harness.placer.decision_for(0, 1), Some(Decision::Placed));
        let fade = tiles[0].elements[0].text_fade;
        low_opacity.push((fade.state(), fade.opacity()));
    }

    assert_eq!(low_opacity[0].0, FadingState::FadingOut);
    assert_eq!(low_opacity[1].0, FadingState::FadingOut);
    assert_eq!(low_opacity[2].0, FadingState::FadedOut);
    assert!(low_opacity[1].1 < low_opacity[0].1);
    assert_eq!(low_opacity[2].1, 0.0);
    assert!(!harness.rendered("Low"));
    assert_eq!(tiles[0].elements[1].text_fade.state(), FadingState::FadedIn);
}

#[test]
fn duplicate_text_nearby_never_shows() {
    let mut harness = Harness::new(PlacementConfig::default());
    // 88px wide boxes, 32px apart: no collision, but within the dedup margin
    let mut tiles = vec![visible_tile(
        0,
        vec![
            TextElement::point("Springfield", DVec2::new(100.0, 100.0), 2),
            TextElement::point("Springfield", DVec2::new(220.0, 100.0), 1),
        ],
    )];

    for i in 0..8 {
        let stats = harness.frame(&mut tiles, i as f64 * 400.0);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.collided, 0);
        assert_eq!(tiles[0].elements[1].text_fade.state(), FadingState::FadedOut);
    }
    assert_eq!(tiles[0].elements[0].text_fade.state(), FadingState::FadedIn);
    assert_eq!(harness.canvas.runs.len(), 1);
}

#[test]
fn dedup_reach_is_the_margin() {
    // Boxes are 88px wide, default margin is 48px
    for (gap, expected) in [(40.0, 1), (56.0, 0)] {
        let mut harness = Harness::new(PlacementConfig::default());
        let mut tiles = vec![visible_tile(
            0,
            vec![
                TextElement::point("Springfield", DVec2::new(100.0, 100.0), 2),
                TextElement::point("Springfield", DVec2::new(188.0 + gap, 100.0), 1),
            ],
        )];
        let stats = harness.frame(&mut tiles, 0.0);
        assert_eq!(stats.duplicates, expected, "gap {gap}");
        assert_eq!(stats.collided, 0);
    }
}

#[test]
fn duplicate_takes_over_when_winner_disappears() {
    let mut harness = Harness::new(PlacementConfig::default());
    let mut tiles = vec![
        visible_tile(0, vec![TextElement::point("Springfield", DVec2::new(100.0, 100.0), 2)]),
        visible_tile(1, vec![TextElement::point("Springfield", DVec2::new(220.0, 100.0), 1)]),
    ];
    harness.frame(&mut tiles, 0.0);
    harness.frame(&mut tiles, 800.0);
    assert_eq!(tiles[1].elements[0].text_fade.state(), FadingState::FadedOut);

    tiles[0].visible = false;
    harness.frame(&mut tiles, 900.0);
    assert_eq!(tiles[1].elements[0].text_fade.state(), FadingState::FadingIn);
    harness.frame(&mut tiles, 1700.0);
    assert_eq!(tiles[1].elements[0].text_fade.state(), FadingState::FadedIn);
}

#[test]
fn path_text_drops_out_without_fading() {
    let mut harness = Harness::new(PlacementConfig::default());
    let road = vec![
        DVec2::new(50.0, 200.0),
        DVec2::new(150.0, 200.0),
        DVec2::new(250.0, 200.0),
    ];
    let mut tiles = vec![visible_tile(0, vec![TextElement::path("Main St", road, 0)])];

    harness.frame(&mut tiles, 0.0);
    harness.frame(&mut tiles, 800.0);
    assert_eq!(tiles[0].elements[0].text_fade.state(), FadingState::FadedIn);
    assert!(harness.rendered("Main St"));

    tiles[0].push(TextElement::point("Blocker", DVec2::new(150.0, 200.0), 9));
    harness.frame(&mut tiles, 900.0);

    let fade = tiles[0].elements[0].text_fade;
    assert_eq!(fade.state(), FadingState::FadedOut);
    assert_eq!(fade.opacity(), 0.0);
    assert!(!harness.rendered("Main St"));
    assert_eq!(harness.placer.decision_for(0, 1), Some(Decision::Placed));
    // Placed this instant, so its fade-in has not produced any opacity yet
    assert!(!harness.rendered("Blocker"));

    harness.frame(&mut tiles, 1000.0);
    assert!(harness.rendered("Blocker"));
    assert!(!harness.rendered("Main St"));
}

#[test]
fn fading_marker_keeps_last_placed_vertices() {
    let mut harness = Harness::new(PlacementConfig::default());
    let route = vec![
        DVec2::new(100.0, 100.0),
        DVec2::new(200.0, 100.0),
        DVec2::new(300.0, 100.0),
    ];
    let icon = IconDescriptor::new("diamond", 8.0, 8.0);
    let mut tiles = vec![visible_tile(0, vec![TextElement::line_marker("", route, icon, 0)])];

    harness.frame(&mut tiles, 0.0);

    // The first vertex loses its spot
    tiles[0].push(TextElement::point("X", DVec2::new(100.0, 100.0), 9));
    harness.frame(&mut tiles, 800.0);
    let xs: Vec<f64> = harness.icons.requests.iter().map(|(_, p, _)| p.x).collect();
    assert_eq!(xs, vec![200.0, 300.0]);

    // Now every vertex is covered and the marker fades out
    tiles[0].push(TextElement::point("YYYYYYYYYYYYYYY", DVec2::new(250.0, 100.0), 9));
    harness.frame(&mut tiles, 900.0);
    assert_eq!(harness.placer.decision_for(0, 0), Some(Decision::Collided));
    let icon_fade = tiles[0].elements[0].icon_fade.expect("marker icon fade");
    assert_eq!(icon_fade.state(), FadingState::FadingOut);
    let xs: Vec<f64> = harness.icons.requests.iter().map(|(_, p, _)| p.x).collect();
    assert_eq!(xs, vec![200.0, 300.0]);
}

#[test]
fn placement_waits_for_readiness() {
    let readiness = Readiness::pending();
    let mut placer = LabelPlacer::with_readiness(PlacementConfig::default(), readiness.clone());
    let mut tiles = vec![visible_tile(0, vec![TextElement::point("Oslo", DVec2::new(100.0, 100.0), 0)])];
    let mut canvas = RecordingCanvas::default();
    let mut icons = RecordingIcons::default();

    assert!(placer.loading());
    let view = ViewState::new(DVec2::ZERO, 1.0, 1, WIDTH, HEIGHT);
    let stats = placer.place_text(&mut tiles, &view, &identity, 0.0, &mut canvas, &mut icons);
    assert!(stats.deferred);
    assert_eq!(stats.candidates, 0);
    assert_eq!(tiles[0].elements[0].last_frame_number(), None);

    let loader = readiness.clone();
    let handle = std::thread::spawn(move || loader.mark_loaded());
    assert!(placer.wait_initialized(Duration::from_secs(5)));
    handle.join().expect("loader thread");

    let view = ViewState::new(DVec2::ZERO, 1.0, 2, WIDTH, HEIGHT);
    let stats = placer.place_text(&mut tiles, &view, &identity, 100.0, &mut canvas, &mut icons);
    assert!(!stats.deferred);
    assert_eq!(stats.placed, 1);
}

#[test]
fn failed_loading_defers_forever() {
    let readiness = Readiness::pending();
    let mut placer = LabelPlacer::with_readiness(PlacementConfig::default(), readiness.clone());
    readiness.mark_failed("glyph atlas unavailable");
    assert!(placer.loading());
    assert!(!placer.wait_initialized(Duration::from_millis(5)));

    let mut tiles = vec![visible_tile(0, vec![TextElement::point("Oslo", DVec2::new(100.0, 100.0), 0)])];
    let mut canvas = RecordingCanvas::default();
    let mut icons = RecordingIcons::default();
    for frame in 1..5 {
        let view = ViewState::new(DVec2::ZERO, 1.0, frame, WIDTH, HEIGHT);
        let stats = placer.place_text(&mut tiles, &view, &identity, frame as f64, &mut canvas, &mut icons);
        assert!(stats.deferred);
    }
    assert!(canvas.runs.is_empty());
}

#[test]
fn replaced_tile_continues_fade() {
    let mut harness = Harness::new(PlacementConfig::default());
    let anchor = DVec2::new(120.0, 80.0);
    let mut tiles = vec![visible_tile(0, vec![TextElement::point("Lyon", anchor, 3)])];

    harness.frame(&mut tiles, 0.0);
    harness.frame(&mut tiles, 400.0);
    let before = tiles[0].elements[0].text_fade.opacity();
    assert!(before > 0.0 && before < 1.0);

    // Same label, fresh element in a different tile
    let mut replacement = vec![visible_tile(7, vec![TextElement::point("Lyon", anchor, 3)])];
    let stats = harness.frame(&mut replacement, 500.0);
    assert_eq!(stats.adopted, 1);
    let after = replacement[0].elements[0].text_fade;
    assert_eq!(after.state(), FadingState::FadingIn);
    assert!(after.opacity() > before);
}

#[test]
fn child_tile_does_not_copy_a_label_still_shown_by_its_parent() {
    let mut harness = Harness::new(PlacementConfig::default());
    let anchor = DVec2::new(120.0, 80.0);
    let mut tiles = vec![visible_tile(0, vec![TextElement::point("Lyon", anchor, 3)])];
    harness.frame(&mut tiles, 0.0);
    harness.frame(&mut tiles, 800.0);
    assert_eq!(tiles[0].elements[0].text_fade.state(), FadingState::FadedIn);

    // Parent kept on screen while the child carrying the same label loads
    tiles[0].visible = false;
    tiles[0].rendered = true;
    tiles.push(visible_tile(1, vec![TextElement::point("Lyon", anchor, 3)]));
    for time in [900.0, 1000.0] {
        let stats = harness.frame(&mut tiles, time);
        assert_eq!(stats.adopted, 0);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(harness.runs_of("Lyon"), 1);
        assert_eq!(tiles[1].elements[0].text_fade.state(), FadingState::FadedOut);
        assert_eq!(tiles[0].elements[0].text_fade.state(), FadingState::FadedIn);
    }
}

#[test]
fn replacement_after_gap_starts_over() {
    let mut harness = Harness::new(PlacementConfig::default());
    let anchor = DVec2::new(120.0, 80.0);
    let mut tiles = vec![visible_tile(0, vec![TextElement::point("Lyon", anchor, 3)])];
    harness.frame(&mut tiles, 0.0);
    harness.frame(&mut tiles, 400.0);

    // A frame with nothing in view breaks the identity chain
    harness.frame(&mut [], 450.0);

    let mut replacement = vec![visible_tile(7, vec![TextElement::point("Lyon", anchor, 3)])];
    let stats = harness.frame(&mut replacement, 500.0);
    assert_eq!(stats.adopted, 0);
    assert_eq!(replacement[0].elements[0].text_fade.opacity(), 0.0);
}

#[test]
fn unvisited_tiles_are_frozen() {
    let mut harness = Harness::new(PlacementConfig::default());
    let mut tiles = vec![
        visible_tile(0, vec![TextElement::point("Bern", DVec2::new(60.0, 60.0), 0)]),
        visible_tile(1, vec![TextElement::point("Graz", DVec2::new(300.0, 200.0), 0)]),
    ];
    harness.frame(&mut tiles, 0.0);
    harness.frame(&mut tiles, 300.0);
    let frozen = tiles[1].elements[0].text_fade;

    tiles[1].visible = false;
    for i in 0..5 {
        let stats = harness.frame(&mut tiles, 400.0 + i as f64 * 100.0);
        assert_eq!(stats.candidates, 1);
        assert_eq!(tiles[1].elements[0].text_fade, frozen);
    }
    assert!(!harness.rendered("Graz"));

    // Revisited after a gap: the stale state is reseeded
    tiles[1].rendered = true;
    harness.frame(&mut tiles, 1000.0);
    let fade = tiles[1].elements[0].text_fade;
    assert_eq!(fade.state(), FadingState::FadingIn);
    assert_eq!(fade.opacity(), 0.0);
    assert_eq!(fade.last_frame_number(), Some(harness.frame));
}

#[test]
fn disabled_collisions_place_everything() {
    let mut config = PlacementConfig::default();
    config.collision_enabled = false;
    let mut harness = Harness::new(config);
    let mut tiles = vec![visible_tile(
        0,
        vec![
            TextElement::point("One", DVec2::new(100.0, 100.0), 0),
            TextElement::point("Two", DVec2::new(102.0, 101.0), 1),
        ],
    )];
    let stats = harness.frame(&mut tiles, 0.0);
    assert_eq!(stats.placed, 2);
    assert_eq!(stats.collided, 0);
    assert!(harness.placer.occupancy().is_empty());
}

#[test]
fn moving_camera_skips_occlusion() {
    let mut config = PlacementConfig::default();
    config.skip_occlusion_while_moving = true;
    let mut harness = Harness::new(config);
    let mut tiles = vec![visible_tile(
        0,
        vec![
            TextElement::point("One", DVec2::new(100.0, 100.0), 0),
            TextElement::point("Two", DVec2::new(102.0, 101.0), 1),
        ],
    )];

    harness.frame(&mut tiles, 0.0);
    assert_eq!(tiles[0].elements[0].text_fade.state(), FadingState::FadedOut);

    // While moving, recent decisions are kept rather than forced
    harness.frame += 1;
    let view = harness.view().with_camera_moving(true);
    let stats = harness.frame_with(&mut tiles, view, 100.0);
    assert_eq!(stats.collided, 0);
    assert_eq!(tiles[0].elements[0].text_fade.state(), FadingState::FadedOut);
    assert_eq!(tiles[0].elements[1].text_fade.state(), FadingState::FadingIn);
}

#[test]
fn text_overflow_is_counted() {
    let mut harness = Harness::new(PlacementConfig::default());
    harness.canvas.capacity = Some(1);
    let mut tiles = vec![visible_tile(
        0,
        vec![
            TextElement::point("North", DVec2::new(100.0, 50.0), 0),
            TextElement::point("South", DVec2::new(100.0, 250.0), 0),
        ],
    )];
    harness.frame(&mut tiles, 0.0);
    let stats = harness.frame(&mut tiles, 400.0);
    assert_eq!(stats.placed, 2);
    assert_eq!(stats.rendered_text, 1);
    assert_eq!(stats.text_overflow, 1);
}

#[test]
fn globe_back_side_is_offscreen() {
    let globe = GlobeViewport::new(0.0, 0.0, 120.0, 400, 300);
    let mut placer = LabelPlacer::new(PlacementConfig::default());
    let mut tiles = vec![visible_tile(
        0,
        vec![
            TextElement::point("Accra", DVec2::new(0.0, 5.0), 0),
            TextElement::point("Fiji", DVec2::new(178.0, -18.0), 0),
        ],
    )];
    let mut canvas = RecordingCanvas::default();
    let mut icons = RecordingIcons::default();
    let stats = placer.place_text(&mut tiles, &globe.view_state(1), &globe, 0.0, &mut canvas, &mut icons);
    assert_eq!(stats.placed, 1);
    assert_eq!(stats.off_screen, 1);
    assert_eq!(tiles[0].elements[1].text_fade.state(), FadingState::FadedOut);
}

proptest! {
    #[test]
    fn opacity_stays_in_unit_range(
        labels in prop::collection::vec((0.0f64..400.0, 0.0f64..300.0, 0i32..5), 1..24),
        steps in prop::collection::vec(1.0f64..500.0, 1..12),
    ) {
        let elements = labels
            .iter()
            .enumerate()
            .map(|(i, &(x, y, p))| TextElement::point(format!("L{}", i % 7), DVec2::new(x, y), p))
            .collect();
        let mut tiles = vec![visible_tile(0, elements)];
        let mut harness = Harness::new(PlacementConfig::default());
        let mut time = 0.0;
        for (i, step) in steps.iter().enumerate() {
            time += step;
            // Toggle visibility now and then to exercise frozen and stale states
            tiles[0].visible = i % 5 != 3;
            harness.frame(&mut tiles, time);
            for element in &tiles[0].elements {
                let opacity = element.text_fade.opacity();
                prop_assert!((0.0..=1.0).contains(&opacity));
            }
            for (_, opacity) in &harness.canvas.runs {
                prop_assert!(*opacity > 0.0 && *opacity <= 1.0);
            }
        }
    }
}
