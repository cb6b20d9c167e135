use glam::DVec2;
use std::f64::consts::PI;

/// Web Mercator is undefined at the poles; clamp to the usual tile limit
const MAX_LAT: f64 = 85.05;

/// Zoom range
const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 50.0;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Normalized Mercator y in [0, 1] for a latitude
#[inline]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

/// Wrap a longitude into [-180, 180)
#[inline]
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
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
        self.center_lon = wrap_lon(self.center_lon + dx as f64 * scale);
        self.center_lat = (self.center_lat - dy as f64 * scale * 0.5).clamp(-MAX_LAT, MAX_LAT);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor, keeping the geographic point under (px, py) in place
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    #[inline]
    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    #[inline]
    fn center_xy(&self) -> DVec2 {
        DVec2::new((self.center_lon + 180.0) / 360.0, mercator_y(self.center_lat))
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat).
    /// Longitude is wrapped into [-180, 180).
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let center = self.center_xy();

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center.x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center.y;

        let lon = wrap_lon(x * 360.0 - 180.0);
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;

        (lon, lat)
    }

    /// Project to sub-pixel coordinates (used by the polygon rasterizer)
    #[inline]
    pub fn project_f(&self, lon: f64, lat: f64) -> DVec2 {
        let p = DVec2::new((lon + 180.0) / 360.0, mercator_y(lat));
        let half = DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0);
        (p - self.center_xy()) * self.scale() + half
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    #[inline]
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let p = self.project_f(lon, lat);
        (p.x as i32, p.y as i32)
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }

    /// Whether a projected lon/lat box overlaps the canvas
    pub fn bbox_visible(&self, min: DVec2, max: DVec2) -> bool {
        // Mercator is monotonic, so corners bound the projection
        let a = self.project_f(min.x, max.y);
        let b = self.project_f(max.x, min.y);
        b.x >= 0.0 && a.x < self.width as f64 && b.y >= 0.0 && a.y < self.height as f64
    }
}
