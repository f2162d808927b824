use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

use map_labels::data::{self, Catalog, Lod, TileSet};
use map_labels::labels::{LabelPlacer, PlacementStats, Readiness};
use map_labels::map::{GlobeViewport, Viewport};
use map_labels::PlacementConfig;

use crate::ui::{IconLayer, TextLayer, CELL_HEIGHT, CELL_WIDTH};

/// Application state
pub struct App {
    pub viewport: Viewport,
    /// Orthographic globe view; `None` while in Mercator mode
    pub globe: Option<GlobeViewport>,
    pub tiles: TileSet,
    pub placer: LabelPlacer,
    pub text_layer: TextLayer,
    pub icon_layer: IconLayer,
    /// Counters from the last placement pass
    pub stats: PlacementStats,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Frame counter driving the placement pass
    pub frame: u64,
    catalog_rx: Option<Receiver<Catalog>>,
    camera_moved: bool,
    started: Instant,
}

impl App {
    /// Start the app and begin loading the label catalog from `data_dir` in
    /// the background
    pub fn new(width: usize, height: usize, config: PlacementConfig, data_dir: PathBuf) -> Self {
        let readiness = Readiness::pending();
        let catalog_rx = data::spawn_load(data_dir, readiness.clone());
        let (pixel_width, pixel_height) = pixel_size(width, height);

        Self {
            viewport: Viewport::world(pixel_width, pixel_height),
            globe: None,
            tiles: TileSet::new(Catalog::default()),
            placer: LabelPlacer::with_readiness(config, readiness),
            text_layer: TextLayer::default(),
            icon_layer: IconLayer::default(),
            stats: PlacementStats::default(),
            should_quit: false,
            last_mouse: None,
            frame: 0,
            catalog_rx: Some(catalog_rx),
            camera_moved: false,
            started: Instant::now(),
        }
    }

    pub fn loading(&self) -> bool {
        self.placer.loading()
    }

    /// Run one placement pass and refresh the draw layers
    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
        self.poll_catalog();

        let lod = Lod::from_zoom(self.effective_zoom());
        let rebuilt = self.tiles.set_lod(lod);
        let bounds = match &self.globe {
            Some(globe) => globe.visible_bounds(),
            None => self.viewport.visible_bounds(),
        };
        let visibility_changed = self.tiles.update_visibility(bounds);

        let view = match &self.globe {
            Some(globe) => globe.view_state(self.frame),
            None => self.viewport.view_state(self.frame),
        }
        .with_camera_moving(self.camera_moved)
        .with_tiles_changed(rebuilt || visibility_changed);
        self.camera_moved = false;

        // Fade durations are in milliseconds
        let time = self.started.elapsed().as_secs_f64() * 1000.0;
        self.text_layer.clear();
        self.icon_layer.clear();
        let tiles = self.tiles.tiles_mut();
        self.stats = match &self.globe {
            Some(globe) => self.placer.place_text(
                tiles,
                &view,
                globe,
                time,
                &mut self.text_layer,
                &mut self.icon_layer,
            ),
            None => self.placer.place_text(
                tiles,
                &view,
                &self.viewport,
                time,
                &mut self.text_layer,
                &mut self.icon_layer,
            ),
        };
    }

    fn poll_catalog(&mut self) {
        let Some(rx) = &self.catalog_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(catalog) => {
                self.tiles.replace_catalog(catalog);
                self.catalog_rx = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("catalog loader exited without a catalog");
                self.catalog_rx = None;
            }
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = pixel_size(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
        if let Some(globe) = &mut self.globe {
            globe.set_size(pixel_width, pixel_height);
        }
        self.camera_moved = true;
    }

    /// Pan the map, or rotate the globe
    pub fn pan(&mut self, dx: i32, dy: i32) {
        match &mut self.globe {
            Some(globe) => globe.rotate_drag(dx, dy),
            None => self.viewport.pan(dx, dy),
        }
        self.camera_moved = true;
    }

    pub fn zoom_in(&mut self) {
        match &mut self.globe {
            Some(globe) => globe.zoom_in(),
            None => self.viewport.zoom_in(),
        }
        self.camera_moved = true;
    }

    pub fn zoom_out(&mut self) {
        match &mut self.globe {
            Some(globe) => globe.zoom_out(),
            None => self.viewport.zoom_out(),
        }
        self.camera_moved = true;
    }

    /// Switch between the Mercator map and the globe, keeping the center
    pub fn toggle_globe(&mut self) {
        match self.globe.take() {
            Some(globe) => self.viewport = globe.to_mercator(),
            None => self.globe = Some(GlobeViewport::from_mercator(&self.viewport)),
        }
        self.camera_moved = true;
    }

    pub fn toggle_fading(&mut self) {
        let config = self.placer.config_mut();
        config.disable_fading = !config.disable_fading;
    }

    pub fn toggle_collisions(&mut self) {
        let enabled = self.placer.config().collision_enabled;
        self.placer.set_collision_enabled(!enabled);
    }

    pub fn toggle_dedup(&mut self) {
        let config = self.placer.config_mut();
        config.dedup_enabled = !config.dedup_enabled;
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    fn effective_zoom(&self) -> f64 {
        self.globe
            .as_ref()
            .map_or(self.viewport.zoom, GlobeViewport::effective_zoom)
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.effective_zoom())
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let (lon, lat) = match &self.globe {
            Some(globe) => {
                let c = globe.center_lonlat();
                (c.x, c.y)
            }
            None => (self.viewport.center_lon, self.viewport.center_lat),
        };
        format!(
            "{:.1}°{}, {:.1}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lon.abs(),
            if lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Get current LOD level as a string
    pub fn lod_level(&self) -> &'static str {
        self.tiles.lod().map_or("-", Lod::name)
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Scale based on zoom: less sensitive when zoomed out
            let zoom = self.effective_zoom();
            let scale = if zoom < 2.0 {
                2
            } else if zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }
}

/// Map area in layout pixels: border takes 2 columns, border plus status
/// bar take 3 rows
fn pixel_size(width: usize, height: usize) -> (usize, usize) {
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(3);
    (
        inner_width * CELL_WIDTH as usize,
        inner_height * CELL_HEIGHT as usize,
    )
}
