use crate::data::GeoRegion;
use std::collections::HashMap;

/// Spatial index over region bounding boxes.
///
/// Each region is inserted into every cell its bbox overlaps, so a point query
/// never misses a region (false positives are removed by the caller's exact
/// point-in-polygon test).
pub struct RegionGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl RegionGrid {
    /// Cell size in degrees used for country-scale regions
    pub const DEFAULT_CELL_SIZE: f64 = 10.0;

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Index regions by position in the slice
    pub fn build(regions: &[GeoRegion], cell_size: f64) -> Self {
        let mut grid = Self {
            cells: HashMap::new(),
            cell_size,
        };
        for (idx, region) in regions.iter().enumerate() {
            let (min, max) = (region.bbox.min, region.bbox.max);
            if !(min.is_finite() && max.is_finite()) {
                continue;
            }
            let min_cell = grid.to_cell(min.x, min.y);
            let max_cell = grid.to_cell(max.x, max.y);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Candidate region indices whose bbox cell covers the point
    pub fn candidates(&self, lon: f64, lat: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First region (in topology order) that contains the point
    pub fn region_at(&self, regions: &[GeoRegion], lon: f64, lat: f64) -> Option<usize> {
        self.candidates(lon, lat)
            .iter()
            .copied()
            .find(|&idx| regions.get(idx).is_some_and(|r| r.contains(lon, lat)))
    }
}
