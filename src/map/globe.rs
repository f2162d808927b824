use glam::{DVec2, DVec3};
use std::f64::consts::PI;

use crate::map::projection::{Projection, ViewState, Viewport};

/// Globe viewport using orthographic projection of a rotating sphere.
/// Orientation is stored as three orthonormal basis vectors.
#[derive(Clone, Debug)]
pub struct GlobeViewport {
    /// Direction from the sphere center towards the camera
    forward: DVec3,
    /// East on screen
    right: DVec3,
    /// North on screen
    up: DVec3,
    /// Sphere radius in pixels (controls zoom)
    pub radius: f64,
    pub width: usize,
    pub height: usize,
}

impl GlobeViewport {
    /// Build a globe viewport centered on (lon, lat) with given radius.
    pub fn new(center_lon: f64, center_lat: f64, radius: f64, width: usize, height: usize) -> Self {
        let lon_rad = center_lon.to_radians();
        let lat_rad = center_lat.to_radians();

        let forward = lonlat_to_vec3(center_lon, center_lat);
        // Derivative of forward w.r.t. latitude points north
        let raw_up = DVec3::new(
            -lat_rad.sin() * lon_rad.cos(),
            -lat_rad.sin() * lon_rad.sin(),
            lat_rad.cos(),
        );
        let right = forward.cross(raw_up).normalize();
        let up = right.cross(forward).normalize();

        Self { forward, right, up, radius, width, height }
    }

    /// Globe with the same center and proportional zoom as a Mercator view
    pub fn from_mercator(vp: &Viewport) -> Self {
        let radius = vp.width as f64 * 0.35 * vp.zoom;
        Self::new(vp.center_lon, vp.center_lat, radius, vp.width, vp.height)
    }

    pub fn to_mercator(&self) -> Viewport {
        let center = self.center_lonlat();
        Viewport::new(center.x, center.y, self.effective_zoom(), self.width, self.height)
    }

    /// Lon/lat the globe is looking at
    pub fn center_lonlat(&self) -> DVec2 {
        let lat = self.forward.z.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = self.forward.y.atan2(self.forward.x).to_degrees();
        DVec2::new(lon, lat)
    }

    /// Unproject screen pixels back to lon/lat.
    /// Returns `None` if the point is outside the sphere disk.
    pub fn unproject(&self, px: f64, py: f64) -> Option<DVec2> {
        let sx = (px - self.width as f64 / 2.0) / self.radius;
        let sy = -(py - self.height as f64 / 2.0) / self.radius;

        let r2 = sx * sx + sy * sy;
        if r2 > 1.0 {
            return None;
        }

        let sz = (1.0 - r2).sqrt();
        let p = self.right * sx + self.up * sy + self.forward * sz;
        Some(vec3_to_lonlat(p))
    }

    /// Rotate the globe by a pixel drag delta so the surface follows the
    /// cursor
    pub fn rotate_drag(&mut self, dx: i32, dy: i32) {
        self.rotate(dx as f64 / self.radius, -(dy as f64) / self.radius);
    }

    fn rotate(&mut self, angle_x: f64, angle_y: f64) {
        // Around up: longitude
        if angle_x.abs() > 1e-10 {
            let (sin_a, cos_a) = angle_x.sin_cos();
            let new_forward = self.forward * cos_a + self.right * sin_a;
            let new_right = self.right * cos_a - self.forward * sin_a;
            self.forward = new_forward.normalize();
            self.right = new_right.normalize();
        }
        // Around right: latitude
        if angle_y.abs() > 1e-10 {
            let (sin_a, cos_a) = angle_y.sin_cos();
            let new_forward = self.forward * cos_a + self.up * sin_a;
            let new_up = self.up * cos_a - self.forward * sin_a;
            self.forward = new_forward.normalize();
            self.up = new_up.normalize();
        }
    }

    pub fn zoom_in(&mut self) {
        self.radius = (self.radius * 1.5).min(self.width as f64 * 35.0);
    }

    pub fn zoom_out(&mut self) {
        self.radius = (self.radius / 1.5).max(self.width as f64 * 0.35);
    }

    /// Conservative lat/lon bounding box of the visible hemisphere as
    /// (min_lon, min_lat, max_lon, max_lat). Samples the disk edge.
    pub fn visible_bounds(&self) -> (f64, f64, f64, f64) {
        let center = self.center_lonlat();
        let (mut min_lon, mut max_lon) = (center.x, center.x);
        let (mut min_lat, mut max_lat) = (center.y, center.y);

        for i in 0..32 {
            let angle = (i as f64 / 32.0) * 2.0 * PI;
            let edge = vec3_to_lonlat(self.right * angle.cos() + self.up * angle.sin());
            min_lon = min_lon.min(edge.x);
            max_lon = max_lon.max(edge.x);
            min_lat = min_lat.min(edge.y);
            max_lat = max_lat.max(edge.y);
        }

        // Wrapped hemisphere: take the whole longitude range
        if max_lon - min_lon > 180.0 {
            min_lon = -180.0;
            max_lon = 180.0;
        }
        // A visible pole pulls the bound to it
        if center.y + 90.0 > 89.0 {
            max_lat = max_lat.max(center.y + 90.0).min(90.0);
        }
        if center.y - 90.0 < -89.0 {
            min_lat = min_lat.min(center.y - 90.0).max(-90.0);
        }

        (min_lon.max(-180.0), min_lat.max(-90.0), max_lon.min(180.0), max_lat.min(90.0))
    }

    /// Zoom normalized so the whole-world view matches Mercator zoom 1
    pub fn effective_zoom(&self) -> f64 {
        self.radius / (self.width.max(1) as f64 * 0.35)
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    pub fn view_state(&self, frame: u64) -> ViewState {
        ViewState::new(
            self.center_lonlat(),
            self.effective_zoom(),
            frame,
            self.width as f64,
            self.height as f64,
        )
    }
}

impl Projection for GlobeViewport {
    /// Back-facing points (the far hemisphere) are off-screen
    fn project(&self, world: DVec2) -> Option<DVec2> {
        let p = lonlat_to_vec3(world.x, world.y);
        if p.dot(self.forward) < 0.0 {
            return None;
        }
        Some(DVec2::new(
            self.width as f64 / 2.0 + p.dot(self.right) * self.radius,
            self.height as f64 / 2.0 - p.dot(self.up) * self.radius,
        ))
    }
}

/// Convert lon/lat (degrees) to a unit sphere vector.
#[inline(always)]
fn lonlat_to_vec3(lon: f64, lat: f64) -> DVec3 {
    let lon_rad = lon.to_radians();
    let lat_rad = lat.to_radians();
    DVec3::new(
        lat_rad.cos() * lon_rad.cos(),
        lat_rad.cos() * lon_rad.sin(),
        lat_rad.sin(),
    )
}

#[inline(always)]
fn vec3_to_lonlat(p: DVec3) -> DVec2 {
    let lat = p.z.clamp(-1.0, 1.0).asin().to_degrees();
    let lon = p.y.atan2(p.x).to_degrees();
    DVec2::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_projects_to_canvas_center() {
        let globe = GlobeViewport::new(10.0, 20.0, 50.0, 200, 100);
        let p = globe.project(DVec2::new(10.0, 20.0)).expect("front-facing");
        assert!((p.x - 100.0).abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_far_side_is_offscreen() {
        let globe = GlobeViewport::new(0.0, 0.0, 50.0, 200, 100);
        assert!(globe.project(DVec2::new(180.0, 0.0)).is_none());
        assert!(globe.project(DVec2::new(30.0, 10.0)).is_some());
    }

    #[test]
    fn test_north_is_up() {
        let globe = GlobeViewport::new(0.0, 0.0, 50.0, 200, 100);
        let north = globe.project(DVec2::new(0.0, 30.0)).expect("visible");
        assert!(north.y < 50.0);
    }

    #[test]
    fn test_unproject_center() {
        let globe = GlobeViewport::new(-40.0, 15.0, 80.0, 200, 200);
        let center = globe.unproject(100.0, 100.0).expect("inside disk");
        assert!((center.x + 40.0).abs() < 1e-6);
        assert!((center.y - 15.0).abs() < 1e-6);
        assert!(globe.unproject(0.0, 0.0).is_none());
    }

    #[test]
    fn test_mercator_roundtrip_keeps_center() {
        let vp = Viewport::new(25.0, -10.0, 2.0, 160, 80);
        let back = GlobeViewport::from_mercator(&vp).to_mercator();
        assert!((back.center_lon - 25.0).abs() < 1e-6);
        assert!((back.center_lat + 10.0).abs() < 1e-6);
        assert!((back.zoom - 2.0).abs() < 1e-9);
    }
}
