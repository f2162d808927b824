use std::f64::consts::PI;

use glam::DVec2;

/// Points projecting further than this outside the canvas are off-screen
const OFFSCREEN_MARGIN: f64 = 64.0;

/// Maps a world-space point (lon, lat) to screen pixels, or `None` when the
/// point cannot be seen at all (behind the globe, far outside the canvas).
pub trait Projection {
    fn project(&self, world: DVec2) -> Option<DVec2>;
}

impl<F> Projection for F
where
    F: Fn(DVec2) -> Option<DVec2>,
{
    fn project(&self, world: DVec2) -> Option<DVec2> {
        self(world)
    }
}

/// Per-frame camera snapshot handed to the placement pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    /// Camera center in world space (lon, lat)
    pub world_center: DVec2,
    pub zoom: f64,
    pub frame: u64,
    /// Screen size in pixels
    pub width: f64,
    pub height: f64,
    pub camera_moving: bool,
    /// The data collaborator added, removed or replaced tiles since last frame
    pub tiles_changed: bool,
}

impl ViewState {
    pub fn new(world_center: DVec2, zoom: f64, frame: u64, width: f64, height: f64) -> Self {
        Self {
            world_center,
            zoom,
            frame,
            width,
            height,
            camera_moving: false,
            tiles_changed: false,
        }
    }

    pub fn with_camera_moving(mut self, moving: bool) -> Self {
        self.camera_moving = moving;
        self
    }

    pub fn with_tiles_changed(mut self, changed: bool) -> Self {
        self.tiles_changed = changed;
        self
    }
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-90 to 90)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Create a world view (shows entire world)
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5; // Mercator distortion

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(100.0);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(0.5);
    }

    /// Web Mercator y in [0, 1] for a latitude in degrees
    fn mercator_y(lat: f64) -> f64 {
        let lat_rad = lat.clamp(-85.0511, 85.0511) * PI / 180.0;
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates,
    /// without any visibility cut
    pub fn project_raw(&self, lon: f64, lat: f64) -> DVec2 {
        let x = (lon + 180.0) / 360.0;
        let y = Self::mercator_y(lat);

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = Self::mercator_y(self.center_lat);

        let scale = self.zoom * self.width as f64;

        DVec2::new(
            (x - center_x) * scale + self.width as f64 / 2.0,
            (y - center_y) * scale + self.height as f64 / 2.0,
        )
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: f64, py: f64) -> (f64, f64) {
        let scale = self.zoom * self.width.max(1) as f64;

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = Self::mercator_y(self.center_lat);

        let x = (px - self.width as f64 / 2.0) / scale + center_x;
        let y = (py - self.height as f64 / 2.0) / scale + center_y;

        let lon = x * 360.0 - 180.0;
        let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
        (lon, lat_rad * 180.0 / PI)
    }

    /// Check if a projected point is within the canvas plus a margin
    pub fn is_visible(&self, p: DVec2) -> bool {
        p.x >= -OFFSCREEN_MARGIN
            && p.x < self.width as f64 + OFFSCREEN_MARGIN
            && p.y >= -OFFSCREEN_MARGIN
            && p.y < self.height as f64 + OFFSCREEN_MARGIN
    }

    /// Conservative lon/lat bounds of the canvas as
    /// (min_lon, min_lat, max_lon, max_lat)
    pub fn visible_bounds(&self) -> (f64, f64, f64, f64) {
        let (min_lon, max_lat) = self.unproject(0.0, 0.0);
        let (max_lon, min_lat) = self.unproject(self.width as f64, self.height as f64);
        (
            min_lon.max(-180.0),
            min_lat.max(-90.0),
            max_lon.min(180.0),
            max_lat.min(90.0),
        )
    }

    pub fn view_state(&self, frame: u64) -> ViewState {
        ViewState::new(
            DVec2::new(self.center_lon, self.center_lat),
            self.zoom,
            frame,
            self.width as f64,
            self.height as f64,
        )
    }
}

impl Projection for Viewport {
    fn project(&self, world: DVec2) -> Option<DVec2> {
        let p = self.project_raw(world.x, world.y);
        self.is_visible(p).then_some(p)
    }
}
