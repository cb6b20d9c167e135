use crate::braille::BrailleCanvas;
use crate::data::{GeoRegion, Polygon};
use crate::map::geometry::{draw_line, fill_polygon};
use crate::map::projection::Viewport;
use crate::views::Fill;
use glam::DVec2;

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_fills: bool,
    pub show_outlines: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_fills: true,
            show_outlines: true,
        }
    }
}

/// One canvas per fill class plus outline layers, drawn back to front
pub struct MapLayers {
    pub neutral: BrailleCanvas,
    pub below: BrailleCanvas,
    pub above: BrailleCanvas,
    pub outlines: BrailleCanvas,
    /// Outline of the hovered region
    pub highlight: BrailleCanvas,
}

impl MapLayers {
    fn new(width: usize, height: usize) -> Self {
        Self {
            neutral: BrailleCanvas::new(width, height),
            below: BrailleCanvas::new(width, height),
            above: BrailleCanvas::new(width, height),
            outlines: BrailleCanvas::new(width, height),
            highlight: BrailleCanvas::new(width, height),
        }
    }

    pub fn fill_layer(&self, fill: Fill) -> &BrailleCanvas {
        match fill {
            Fill::Neutral => &self.neutral,
            Fill::Below => &self.below,
            Fill::Above => &self.above,
        }
    }

    fn fill_layer_mut(&mut self, fill: Fill) -> &mut BrailleCanvas {
        match fill {
            Fill::Neutral => &mut self.neutral,
            Fill::Below => &mut self.below,
            Fill::Above => &mut self.above,
        }
    }
}

/// Choropleth renderer: rasterizes regions into per-fill Braille layers
#[derive(Default)]
pub struct MapRenderer {
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render every visible region with its fill.
    ///
    /// `fills` is aligned with `regions`; a missing entry renders neutral.
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        regions: &[GeoRegion],
        fills: &[Fill],
        hovered: Option<usize>,
    ) -> MapLayers {
        let mut layers = MapLayers::new(width, height);

        for (idx, region) in regions.iter().enumerate() {
            if !viewport.bbox_visible(region.bbox.min, region.bbox.max) {
                continue;
            }
            let fill = fills.get(idx).copied().unwrap_or(Fill::Neutral);

            for polygon in &region.polygons {
                if self.settings.show_fills {
                    let projected = project_polygon(polygon, viewport);
                    fill_polygon(layers.fill_layer_mut(fill), &projected);
                }
                if self.settings.show_outlines {
                    for ring in polygon {
                        draw_ring(&mut layers.outlines, ring, viewport);
                    }
                }
            }
        }

        if let Some(region) = hovered.and_then(|idx| regions.get(idx)) {
            for ring in region.polygons.iter().flatten() {
                draw_ring(&mut layers.highlight, ring, viewport);
            }
        }

        layers
    }

    pub fn toggle_outlines(&mut self) {
        self.settings.show_outlines = !self.settings.show_outlines;
    }

    pub fn toggle_fills(&mut self) {
        self.settings.show_fills = !self.settings.show_fills;
    }
}

fn project_polygon(polygon: &Polygon, viewport: &Viewport) -> Vec<Vec<DVec2>> {
    polygon
        .iter()
        .map(|ring| ring.iter().map(|p| viewport.project_f(p.x, p.y)).collect())
        .collect()
}

/// Draw a ring outline with viewport culling
fn draw_ring(canvas: &mut BrailleCanvas, ring: &[DVec2], viewport: &Viewport) {
    if ring.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for p in ring {
        let (px, py) = viewport.project(p.x, p.y);

        if let Some((prev_x, prev_y)) = prev {
            // Long jumps are wraparound artifacts, not real edges
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(name: &str, x0: f64, y0: f64, size: f64) -> GeoRegion {
        let ring = vec![
            DVec2::new(x0, y0),
            DVec2::new(x0 + size, y0),
            DVec2::new(x0 + size, y0 + size),
            DVec2::new(x0, y0 + size),
            DVec2::new(x0, y0),
        ];
        GeoRegion::new(name, vec![vec![ring]])
    }

    #[test]
    fn test_fills_land_on_their_layers() {
        // 40x20 chars = 80x80 px, zoom 1 puts the world 80px wide
        let vp = Viewport::new(0.0, 0.0, 1.0, 80, 80);
        let regions = vec![square("West", -90.0, -20.0, 40.0), square("East", 50.0, -20.0, 40.0)];
        let renderer = MapRenderer::new();

        let layers = renderer.render(40, 20, &vp, &regions, &[Fill::Above, Fill::Below], None);
        assert!(!layers.above.is_blank());
        assert!(!layers.below.is_blank());
        assert!(layers.neutral.is_blank());
        assert!(!layers.outlines.is_blank());
        assert!(layers.highlight.is_blank());
    }

    #[test]
    fn test_missing_fill_is_neutral_and_hover_highlights() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 80, 80);
        let regions = vec![square("Lone", -20.0, -20.0, 40.0)];
        let renderer = MapRenderer::new();

        let layers = renderer.render(40, 20, &vp, &regions, &[], Some(0));
        assert!(!layers.neutral.is_blank());
        assert!(!layers.highlight.is_blank());
    }

    #[test]
    fn test_toggles() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 80, 80);
        let regions = vec![square("Lone", -20.0, -20.0, 40.0)];
        let mut renderer = MapRenderer::new();
        renderer.toggle_outlines();
        renderer.toggle_fills();

        let layers = renderer.render(40, 20, &vp, &regions, &[Fill::Above], None);
        assert!(layers.above.is_blank());
        assert!(layers.outlines.is_blank());
    }
}
