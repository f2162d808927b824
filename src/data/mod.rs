use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use geojson::{Feature, GeoJson, Geometry, Value};
use glam::DVec2;
use rayon::prelude::*;

use crate::error::{LabelError, Result};
use crate::geo::{lonlat, TileKey};
use crate::labels::{IconDescriptor, Readiness, TextElement, Tile};

/// Level of detail, selects tile size and which cities are labelled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lod {
    Low,    // world view
    Medium, // continental
    High,   // regional
}

impl Lod {
    /// Select LOD based on zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    /// Zoom of the tile grid labels are partitioned into
    pub fn tile_zoom(self) -> u8 {
        match self {
            Lod::Low => 2,
            Lod::Medium => 4,
            Lod::High => 6,
        }
    }

    /// Smallest city population labelled at this level
    pub fn min_population(self) -> u64 {
        match self {
            Lod::Low => 5_000_000,
            Lod::Medium => 500_000,
            Lod::High => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Lod::Low => "low",
            Lod::Medium => "medium",
            Lod::High => "high",
        }
    }
}

/// A city to label
#[derive(Clone, Debug, PartialEq)]
pub struct CitySeed {
    pub lon: f64,
    pub lat: f64,
    pub name: String,
    pub population: u64,
    pub is_capital: bool,
    pub is_megacity: bool,
}

impl CitySeed {
    pub fn new(lon: f64, lat: f64, name: &str, population: u64, is_capital: bool, is_megacity: bool) -> Self {
        Self {
            lon,
            lat,
            name: name.to_string(),
            population,
            is_capital,
            is_megacity,
        }
    }

    /// Larger cities win collisions; capitals and megacities get a bonus
    pub fn priority(&self) -> i32 {
        let base = (self.population.max(1) as f64).log10() * 10.0;
        let mut bonus = 0.0;
        if self.is_capital {
            bonus += 40.0;
        }
        if self.is_megacity {
            bonus += 20.0;
        }
        (base + bonus) as i32
    }

    /// Capitals and megacities get a marker icon, everything else is plain
    /// text
    pub fn to_element(&self) -> TextElement {
        let anchor = lonlat(self.lon, self.lat);
        if self.is_capital {
            TextElement::poi(&self.name, anchor, marker_icon("★"), self.priority())
        } else if self.is_megacity {
            let icon = marker_icon("●").with_text_optional(true);
            TextElement::poi(&self.name, anchor, icon, self.priority())
        } else {
            TextElement::point(&self.name, anchor, self.priority())
        }
    }
}

/// A named line: text following it, or a marker repeated along it
#[derive(Clone, Debug, PartialEq)]
pub struct PathSeed {
    pub name: String,
    pub path: Vec<DVec2>,
    /// Marker glyph repeated at each vertex instead of path text
    pub marker: Option<String>,
    pub priority: i32,
}

impl PathSeed {
    pub fn to_element(&self) -> TextElement {
        match &self.marker {
            Some(glyph) => TextElement::line_marker("", self.path.clone(), marker_icon(glyph), self.priority),
            None => TextElement::path(&self.name, self.path.clone(), self.priority),
        }
    }
}

/// Marker glyph icons occupy one terminal cell: 2x4 layout pixels
fn marker_icon(glyph: &str) -> IconDescriptor {
    IconDescriptor::new(glyph, 2.0, 4.0)
}

/// Everything the demo can label
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub cities: Vec<CitySeed>,
    pub paths: Vec<PathSeed>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty() && self.paths.is_empty()
    }
}

/// Load all available Natural Earth GeoJSON label sources. Files that are
/// missing are skipped; files that fail to parse are logged and skipped.
pub fn load_all_geojson(data_dir: &Path) -> anyhow::Result<Catalog> {
    if !data_dir.is_dir() {
        anyhow::bail!("data directory {} not found", data_dir.display());
    }
    let mut catalog = Catalog::default();

    let cities_path = data_dir.join("ne_10m_cities.json");
    if cities_path.exists() {
        match load_cities(&cities_path) {
            Ok(cities) => catalog.cities = cities,
            Err(e) => tracing::warn!(path = %cities_path.display(), error = %e, "failed to load cities"),
        }
    }

    let river_files = ["ne_50m_rivers_lake_centerlines.json", "ne_10m_rivers_lake_centerlines.json"];
    for filename in river_files {
        let path = data_dir.join(filename);
        if !path.exists() {
            continue;
        }
        match load_paths(&path, 5) {
            Ok(paths) => {
                catalog.paths.extend(paths);
                break;
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to load rivers"),
        }
    }

    tracing::info!(
        cities = catalog.cities.len(),
        paths = catalog.paths.len(),
        "loaded label catalog"
    );
    Ok(catalog)
}

fn read_geojson(path: &Path) -> Result<GeoJson> {
    let content = fs::read_to_string(path).map_err(|source| LabelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.parse::<GeoJson>()?)
}

/// Load cities from a point FeatureCollection
pub fn load_cities(path: &Path) -> Result<Vec<CitySeed>> {
    let GeoJson::FeatureCollection(fc) = read_geojson(path)? else {
        return Ok(Vec::new());
    };
    Ok(fc.features.par_iter().filter_map(city_from_feature).collect())
}

fn city_from_feature(feature: &Feature) -> Option<CitySeed> {
    let props = feature.properties.as_ref();

    let name = props
        .and_then(|p| p.get("name"))
        .and_then(|v| v.as_str())?;

    // Try multiple population fields
    let population = props
        .and_then(|p| {
            p.get("pop_max")
                .or_else(|| p.get("pop_min"))
                .or_else(|| p.get("population"))
        })
        .and_then(|v| v.as_f64())
        .map(|v| v as u64)
        .unwrap_or(0);

    // National capital: adm0cap = 1
    let flag = |key: &str| {
        props
            .and_then(|p| p.get(key))
            .and_then(|v| v.as_f64())
            .is_some_and(|v| v >= 1.0)
    };

    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(coords)) if coords.len() >= 2 => Some(CitySeed::new(
            coords[0],
            coords[1],
            name,
            population,
            flag("adm0cap"),
            flag("megacity"),
        )),
        _ => None,
    }
}

/// Load named lines as path labels. Unnamed features are dropped.
pub fn load_paths(path: &Path, priority: i32) -> Result<Vec<PathSeed>> {
    let GeoJson::FeatureCollection(fc) = read_geojson(path)? else {
        return Ok(Vec::new());
    };
    let seeds = fc
        .features
        .par_iter()
        .flat_map_iter(|feature| {
            let name = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("name"))
                .and_then(|v| v.as_str())
                .filter(|n| !n.is_empty())
                .map(str::to_string);
            let mut lines = Vec::new();
            if let (Some(name), Some(geometry)) = (name, feature.geometry.as_ref()) {
                collect_lines(geometry, &mut |line| {
                    lines.push(PathSeed {
                        name: name.clone(),
                        path: line,
                        marker: None,
                        priority,
                    })
                });
            }
            lines
        })
        .collect();
    Ok(seeds)
}

fn collect_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<DVec2>),
{
    // Positions short of a lon/lat pair are skipped
    let to_line = |coords: &Vec<Vec<f64>>| -> Vec<DVec2> {
        coords
            .iter()
            .filter_map(|c| match c.as_slice() {
                [lon, lat, ..] => Some(lonlat(*lon, *lat)),
                _ => None,
            })
            .collect()
    };
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_line(coords));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Load the catalog on the rayon pool. The catalog arrives on the returned
/// channel and `readiness` flips to loaded once it has been sent.
pub fn spawn_load(data_dir: PathBuf, readiness: Readiness) -> Receiver<Catalog> {
    let (tx, rx) = mpsc::channel();
    rayon::spawn(move || {
        let catalog = match load_all_geojson(&data_dir) {
            Ok(catalog) if !catalog.is_empty() => catalog,
            Ok(_) => generate_simple_world(),
            Err(e) => {
                tracing::info!(error = %e, "using built-in world");
                generate_simple_world()
            }
        };
        if tx.send(catalog).is_ok() {
            readiness.mark_loaded();
        } else {
            readiness.mark_failed("catalog receiver dropped");
        }
    });
    rx
}

/// Built-in labels for when no data file is available
pub fn generate_simple_world() -> Catalog {
    // Major cities with populations (is_capital, is_megacity)
    let cities = vec![
        CitySeed::new(-74.0, 40.7, "New York", 18_800_000, false, true),
        CitySeed::new(-0.1, 51.5, "London", 9_000_000, true, true),
        CitySeed::new(2.3, 48.9, "Paris", 11_000_000, true, true),
        CitySeed::new(139.7, 35.7, "Tokyo", 37_400_000, true, true),
        CitySeed::new(151.2, -33.9, "Sydney", 5_300_000, false, false),
        CitySeed::new(-43.2, -22.9, "Rio", 13_500_000, false, true),
        CitySeed::new(37.6, 55.8, "Moscow", 12_500_000, true, true),
        CitySeed::new(116.4, 39.9, "Beijing", 21_500_000, true, true),
        CitySeed::new(77.2, 28.6, "Delhi", 32_900_000, true, true),
        CitySeed::new(-118.2, 34.0, "Los Angeles", 12_400_000, false, true),
        CitySeed::new(-77.0, 38.9, "Washington", 5_300_000, true, false),
        CitySeed::new(-99.1, 19.4, "Mexico City", 21_800_000, true, true),
        CitySeed::new(-58.4, -34.6, "Buenos Aires", 15_000_000, true, true),
        CitySeed::new(4.9, 52.4, "Amsterdam", 1_200_000, true, false),
        CitySeed::new(13.4, 52.5, "Berlin", 3_700_000, true, false),
        CitySeed::new(12.5, 41.9, "Rome", 4_300_000, true, false),
        CitySeed::new(-3.7, 40.4, "Madrid", 6_700_000, true, false),
        CitySeed::new(31.2, 30.0, "Cairo", 21_300_000, true, true),
        CitySeed::new(3.4, 6.5, "Lagos", 15_400_000, false, true),
        CitySeed::new(103.8, 1.35, "Singapore", 5_900_000, true, false),
    ];

    let parallel = |lat: f64| -> Vec<DVec2> {
        (-180..=180).step_by(30).map(|lon| lonlat(f64::from(lon), lat)).collect()
    };
    let paths = vec![
        PathSeed {
            name: "Equator".to_string(),
            path: parallel(0.0),
            marker: None,
            priority: 10,
        },
        PathSeed {
            name: "Tropic of Cancer".to_string(),
            path: parallel(23.44),
            marker: None,
            priority: 5,
        },
        // Transatlantic route, London to New York
        PathSeed {
            name: "Transatlantic".to_string(),
            path: vec![
                lonlat(-0.1, 51.5),
                lonlat(-20.0, 52.0),
                lonlat(-40.0, 50.0),
                lonlat(-60.0, 45.0),
                lonlat(-74.0, 40.7),
            ],
            marker: Some("◆".to_string()),
            priority: 8,
        },
    ];

    Catalog { cities, paths }
}

/// Label tiles for the current level of detail. Changing the level rebuilds
/// every tile; labels keep their fade state across the rebuild through
/// their identity.
pub struct TileSet {
    catalog: Catalog,
    lod: Option<Lod>,
    tiles: Vec<Tile>,
}

impl TileSet {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            lod: None,
            tiles: Vec::new(),
        }
    }

    pub fn lod(&self) -> Option<Lod> {
        self.lod
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Swap in a new catalog; tiles are rebuilt on the next `set_lod`
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.lod = None;
        self.tiles.clear();
    }

    /// Switch level of detail. Returns whether the tiles were rebuilt.
    pub fn set_lod(&mut self, lod: Lod) -> bool {
        if self.lod == Some(lod) {
            return false;
        }
        self.lod = Some(lod);
        self.tiles = build_tiles(&self.catalog, lod);
        tracing::info!(lod = lod.name(), tiles = self.tiles.len(), "rebuilt label tiles");
        true
    }

    /// Mark tiles overlapping the lon/lat bounds visible. Returns whether any
    /// tile changed visibility.
    pub fn update_visibility(&mut self, bounds: (f64, f64, f64, f64)) -> bool {
        let (min_lon, min_lat, max_lon, max_lat) = bounds;
        let mut changed = false;
        for tile in &mut self.tiles {
            let visible = tile.key.intersects(min_lon, min_lat, max_lon, max_lat);
            changed |= tile.visible != visible;
            tile.visible = visible;
        }
        changed
    }

    /// Element count over all tiles
    pub fn label_count(&self) -> usize {
        self.tiles.iter().map(|t| t.elements.len()).sum()
    }
}

fn build_tiles(catalog: &Catalog, lod: Lod) -> Vec<Tile> {
    let zoom = lod.tile_zoom();
    let min_pop = lod.min_population();

    let cities = catalog
        .cities
        .par_iter()
        .filter(|c| c.population >= min_pop)
        .map(CitySeed::to_element);
    let paths = catalog.paths.par_iter().map(PathSeed::to_element);
    let elements: Vec<TextElement> = cities.chain(paths).collect();

    // Elements without an anchor (empty paths) land in tile 0/0
    let mut by_key: BTreeMap<TileKey, Vec<TextElement>> = BTreeMap::new();
    for element in elements {
        let anchor = element.kind.primary_anchor().unwrap_or(DVec2::ZERO);
        let key = TileKey::containing(anchor.x, anchor.y, zoom);
        by_key.entry(key).or_default().push(element);
    }
    by_key
        .into_iter()
        .map(|(key, elements)| Tile::with_elements(key, elements))
        .collect()
}
