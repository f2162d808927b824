use glam::DVec2;

/// Normalize longitude from [-180, 180] to [0, 360) for grid indexing
#[inline(always)]
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0)
}

/// Normalize latitude from [-90, 90] to [0, 180) for grid indexing
#[inline(always)]
pub fn normalize_lat(lat: f64) -> f64 {
    (lat + 90.0).clamp(0.0, 179.999)
}

/// Address of a geographic tile on an equirectangular grid of
/// `2^zoom x 2^zoom` cells covering the whole world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    /// Tile containing a lon/lat position at the given tile zoom
    pub fn containing(lon: f64, lat: f64, zoom: u8) -> Self {
        let n = 1u32 << zoom;
        let x = (normalize_lon(lon) / 360.0 * n as f64) as u32;
        let y = (normalize_lat(lat) / 180.0 * n as f64) as u32;
        Self {
            zoom,
            x: x.min(n - 1),
            y: y.min(n - 1),
        }
    }

    /// Geographic bounds as (min_lon, min_lat, max_lon, max_lat)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let n = (1u32 << self.zoom) as f64;
        let lon_span = 360.0 / n;
        let lat_span = 180.0 / n;
        let min_lon = self.x as f64 * lon_span - 180.0;
        let min_lat = self.y as f64 * lat_span - 90.0;
        (min_lon, min_lat, min_lon + lon_span, min_lat + lat_span)
    }

    /// Whether the tile overlaps a lon/lat bounding box
    pub fn intersects(&self, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> bool {
        let (t_min_lon, t_min_lat, t_max_lon, t_max_lat) = self.bounds();
        t_min_lon <= max_lon && t_max_lon >= min_lon && t_min_lat <= max_lat && t_max_lat >= min_lat
    }
}

/// Lon/lat pair as a world-space point (x = lon, y = lat)
#[inline(always)]
pub fn lonlat(lon: f64, lat: f64) -> DVec2 {
    DVec2::new(lon, lat)
}
