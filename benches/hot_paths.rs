use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::DVec2;
use map_labels::geo::TileKey;
use map_labels::hash::rand_simple;
use map_labels::labels::{
    FadeState, GlyphRun, IconDescriptor, IconRenderer, IconRequest, LabelPlacer, ScreenBox,
    ScreenOccupancy, TextCanvas, TextElement, Tile,
};
use map_labels::map::ViewState;
use map_labels::PlacementConfig;
use std::hint::black_box;

const WIDTH: f64 = 1920.0;
const HEIGHT: f64 = 1080.0;

struct CountingCanvas(usize);

impl TextCanvas for CountingCanvas {
    fn measure(&self, text: &str, scale: f64) -> Option<ScreenBox> {
        let size = DVec2::new(text.len() as f64 * 7.0, 12.0) * scale;
        Some(ScreenBox::centered(DVec2::ZERO, size))
    }

    fn add_text(&mut self, _run: &GlyphRun<'_>) -> bool {
        self.0 += 1;
        true
    }
}

struct CountingIcons(usize);

impl IconRenderer for CountingIcons {
    fn add_icon(&mut self, _request: &IconRequest<'_>) -> bool {
        self.0 += 1;
        true
    }
}

/// Random labels scattered over the screen, a quarter of them POIs, split
/// into 16 tiles
fn random_tiles(count: usize) -> Vec<Tile> {
    let icon = IconDescriptor::new("pin", 10.0, 10.0).with_text_optional(true);
    let mut tiles: Vec<Tile> = (0..16)
        .map(|i| {
            let mut tile = Tile::new(TileKey { zoom: 2, x: i % 4, y: i / 4 });
            tile.visible = true;
            tile
        })
        .collect();
    for i in 0..count as u64 {
        let anchor = DVec2::new(rand_simple(i * 3) * WIDTH, rand_simple(i * 3 + 1) * HEIGHT);
        let priority = (rand_simple(i * 3 + 2) * 10.0) as i32;
        let name = format!("Label {}", i % 500);
        let element = if i % 4 == 0 {
            TextElement::poi(name, anchor, icon.clone(), priority)
        } else {
            TextElement::point(name, anchor, priority)
        };
        tiles[(i % 16) as usize].push(element);
    }
    tiles
}

fn identity(p: DVec2) -> Option<DVec2> {
    Some(p)
}

fn bench_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("place_text");
    for count in [500usize, 2_000, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut tiles = random_tiles(count);
            let mut placer = LabelPlacer::new(PlacementConfig::default());
            let mut frame = 0u64;
            b.iter(|| {
                frame += 1;
                let view = ViewState::new(DVec2::new(WIDTH / 2.0, HEIGHT / 2.0), 1.0, frame, WIDTH, HEIGHT);
                let mut text = CountingCanvas(0);
                let mut icons = CountingIcons(0);
                let stats = placer.place_text(
                    &mut tiles,
                    &view,
                    &identity,
                    frame as f64 * 16.0,
                    &mut text,
                    &mut icons,
                );
                black_box(stats)
            });
        });
    }
    group.finish();
}

fn bench_occupancy(c: &mut Criterion) {
    let boxes: Vec<ScreenBox> = (0..5_000u64)
        .map(|i| {
            let center = DVec2::new(rand_simple(i * 2) * WIDTH, rand_simple(i * 2 + 1) * HEIGHT);
            ScreenBox::centered(center, DVec2::new(60.0, 12.0))
        })
        .collect();
    c.bench_function("occupancy_try_allocate_5000", |b| {
        let mut occupancy = ScreenOccupancy::new(WIDTH, HEIGHT);
        b.iter(|| {
            occupancy.reset();
            let placed = boxes.iter().filter(|bbox| occupancy.try_allocate(bbox)).count();
            black_box(placed)
        });
    });
}

fn bench_fade_update(c: &mut Criterion) {
    c.bench_function("fade_update_10000", |b| {
        let mut fades = vec![FadeState::new(); 10_000];
        let mut frame = 0u64;
        b.iter(|| {
            frame += 1;
            let time = frame as f64 * 16.0;
            for (i, fade) in fades.iter_mut().enumerate() {
                if (i as u64 + frame / 50) % 2 == 0 {
                    fade.check_start_fade_in(frame, time, true);
                } else {
                    fade.check_start_fade_out(frame, time, true);
                }
                black_box(fade.update_fading(time, false));
            }
        });
    });
}

criterion_group!(benches, bench_placement, bench_occupancy, bench_fade_update);
criterion_main!(benches);
