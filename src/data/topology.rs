use geojson::{Feature, GeoJson, Geometry, Value};
use glam::DVec2;
use tracing::{debug, warn};

/// Closed ring of lon/lat points
pub type Ring = Vec<DVec2>;

/// Exterior ring first, holes after
pub type Polygon = Vec<Ring>;

/// Property keys that may carry a country's display name, in lookup order
const NAME_KEYS: [&str; 4] = ["name", "NAME", "ADMIN", "admin"];

/// Lon/lat bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl BBox {
    fn empty() -> Self {
        Self {
            min: DVec2::splat(f64::INFINITY),
            max: DVec2::splat(f64::NEG_INFINITY),
        }
    }

    fn extend(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// A named country outline. The name is the join key against the dataset's
/// `Country` column (exact string match).
#[derive(Debug, Clone)]
pub struct GeoRegion {
    pub name: String,
    pub polygons: Vec<Polygon>,
    pub bbox: BBox,
}

impl GeoRegion {
    pub fn new(name: impl Into<String>, polygons: Vec<Polygon>) -> Self {
        let mut bbox = BBox::empty();
        for ring in polygons.iter().flatten() {
            for &p in ring {
                bbox.extend(p);
            }
        }
        Self {
            name: name.into(),
            polygons,
            bbox,
        }
    }

    /// Even-odd point-in-polygon test over every ring of every polygon
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let p = DVec2::new(lon, lat);
        if !self.bbox.contains(p) {
            return false;
        }
        self.polygons
            .iter()
            .any(|poly| poly.iter().filter(|ring| ring_crosses(ring, p)).count() % 2 == 1)
    }
}

/// Ray cast to +x: true when the ray crosses the ring an odd number of times
fn ring_crosses(ring: &[DVec2], p: DVec2) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Extract named country regions from a parsed GeoJSON document
pub fn regions_from_geojson(geojson: &GeoJson) -> Vec<GeoRegion> {
    let mut regions = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(region) = region_from_feature(feature) {
                    regions.push(region);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(region) = region_from_feature(f) {
                regions.push(region);
            }
        }
        GeoJson::Geometry(_) => {
            warn!("bare geometry has no name property, no regions extracted");
        }
    }
    regions
}

/// Parse GeoJSON bytes (the buffer is used as scratch space by simd-json)
pub fn parse_geojson(bytes: &mut [u8]) -> Result<GeoJson, simd_json::Error> {
    simd_json::serde::from_slice::<GeoJson>(bytes)
}

fn region_from_feature(feature: &Feature) -> Option<GeoRegion> {
    let props = feature.properties.as_ref();
    let name = NAME_KEYS
        .iter()
        .find_map(|key| props.and_then(|p| p.get(*key)).and_then(|v| v.as_str()));

    let Some(name) = name else {
        warn!(id = ?feature.id, "skipping feature without a name property");
        return None;
    };

    let mut polygons = Vec::new();
    if let Some(ref geometry) = feature.geometry {
        collect_polygons(geometry, &mut polygons);
    }

    if polygons.is_empty() {
        debug!(region = name, "skipping feature without polygonal geometry");
        return None;
    }

    Some(GeoRegion::new(name, polygons))
}

fn collect_polygons(geometry: &Geometry, out: &mut Vec<Polygon>) {
    match &geometry.value {
        Value::Polygon(rings) => out.push(to_polygon(rings)),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.push(to_polygon(rings));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Polygon {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .filter(|c| c.len() >= 2)
                .map(|c| DVec2::new(c[0], c[1]))
                .collect()
        })
        .collect()
}
