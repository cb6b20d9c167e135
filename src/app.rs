use crate::catalog::MetricYearCatalog;
use crate::data::Dataset;
use crate::map::{MapRenderer, RegionGrid, Viewport};
use crate::selection::{SelectionError, SelectionState};
use crate::ui::Areas;
use crate::views::{self, DerivedViews, HoverInfo};
use ratatui::layout::Rect;
use tracing::{debug, info};

/// The three selector controls, in focus order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Metric,
    Baseline,
    Year,
}

impl Control {
    pub const ALL: [Control; 3] = [Control::Metric, Control::Baseline, Control::Year];

    pub fn title(self) -> &'static str {
        match self {
            Control::Metric => "Metric",
            Control::Baseline => "Baseline country",
            Control::Year => "Year",
        }
    }

    fn next(self) -> Self {
        match self {
            Control::Metric => Control::Baseline,
            Control::Baseline => Control::Year,
            Control::Year => Control::Metric,
        }
    }

    fn prev(self) -> Self {
        match self {
            Control::Metric => Control::Year,
            Control::Baseline => Control::Metric,
            Control::Year => Control::Baseline,
        }
    }
}

/// An open dropdown list and its highlighted option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dropdown {
    pub control: Control,
    pub highlighted: usize,
}

/// Region under the pointer and the overlay to show for it
#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub region: usize,
    /// `None` when neither the region nor the baseline has a record
    pub info: Option<HoverInfo>,
    /// Terminal cell of the pointer
    pub col: u16,
    pub row: u16,
}

/// Application state
pub struct App {
    pub dataset: Dataset,
    pub catalog: MetricYearCatalog,
    selection: SelectionState,
    views: DerivedViews,
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    region_grid: RegionGrid,
    pub focus: Control,
    pub dropdown: Option<Dropdown>,
    pub hover: Option<Hover>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    areas: Areas,
}

impl App {
    pub fn new(
        dataset: Dataset,
        catalog: MetricYearCatalog,
        selection: SelectionState,
        width: u16,
        height: u16,
    ) -> Self {
        let region_grid = RegionGrid::build(&dataset.regions, RegionGrid::DEFAULT_CELL_SIZE);
        let views = DerivedViews::compute(&dataset, &catalog, &selection);
        let areas = Areas::compute(Rect::new(0, 0, width, height));

        // Braille gives 2x4 resolution per character
        let viewport = Viewport::world(
            areas.map_inner.width as usize * 2,
            areas.map_inner.height as usize * 4,
        );

        Self {
            viewport,
            dataset,
            catalog,
            selection,
            views,
            map_renderer: MapRenderer::new(),
            region_grid,
            focus: Control::Metric,
            dropdown: None,
            hover: None,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            areas,
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn views(&self) -> &DerivedViews {
        &self.views
    }

    pub fn areas(&self) -> &Areas {
        &self.areas
    }

    // Every selection mutation goes through these setters, each followed by
    // `refresh_views`. Skipping the refresh leaves stale views on screen.

    pub fn set_metric(&mut self, metric: &str) -> Result<(), SelectionError> {
        self.selection.set_metric(&self.catalog, metric)?;
        info!(metric, year = self.selection.year(), "metric changed");
        self.refresh_views();
        Ok(())
    }

    pub fn set_baseline_country(&mut self, country: &str) {
        self.selection.set_baseline_country(country);
        info!(country, "baseline changed");
        self.refresh_views();
    }

    pub fn set_year(&mut self, year: &str) -> Result<(), SelectionError> {
        self.selection.set_year(&self.catalog, year)?;
        info!(year, "year changed");
        self.refresh_views();
        Ok(())
    }

    /// Recompute both views (and the hover overlay) from the current selection
    fn refresh_views(&mut self) {
        self.views = DerivedViews::compute(&self.dataset, &self.catalog, &self.selection);
        if let Some(hover) = self.hover.as_mut() {
            if let Some(region) = self.dataset.regions.get(hover.region) {
                hover.info = views::hover(&self.dataset, &self.selection, &region.name);
            }
        }
        debug!(
            points = self.views.trend.points.len(),
            baseline = ?self.views.baseline_value,
            "views refreshed"
        );
    }

    /// Options offered by a control, in display order
    pub fn options(&self, control: Control) -> Vec<&str> {
        match control {
            Control::Metric => self.catalog.metrics().collect(),
            Control::Baseline => self.dataset.countries.iter().map(String::as_str).collect(),
            Control::Year => self
                .catalog
                .years(self.selection.metric())
                .map(|years| years.iter().map(String::as_str).collect())
                .unwrap_or_default(),
        }
    }

    /// Current value of a control
    pub fn value(&self, control: Control) -> &str {
        match control {
            Control::Metric => self.selection.metric(),
            Control::Baseline => self.selection.baseline_country(),
            Control::Year => self.selection.year(),
        }
    }

    /// Position of the current value among the control's options
    pub fn selected_index(&self, control: Control) -> Option<usize> {
        let value = self.value(control);
        self.options(control).iter().position(|o| *o == value)
    }

    /// Apply the option at `idx` to a control
    pub fn choose(&mut self, control: Control, idx: usize) -> Result<(), SelectionError> {
        let Some(option) = self.options(control).get(idx).map(|o| o.to_string()) else {
            return Ok(());
        };
        match control {
            Control::Metric => self.set_metric(&option),
            Control::Baseline => {
                self.set_baseline_country(&option);
                Ok(())
            }
            Control::Year => self.set_year(&option),
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Step the focused control to the previous/next option (wrapping)
    pub fn step_focused(&mut self, delta: i32) -> Result<(), SelectionError> {
        let len = self.options(self.focus).len();
        if len == 0 {
            return Ok(());
        }
        let next = match self.selected_index(self.focus) {
            Some(idx) => (idx as i64 + delta as i64).rem_euclid(len as i64) as usize,
            None => 0,
        };
        self.choose(self.focus, next)
    }

    pub fn open_dropdown(&mut self) {
        if self.options(self.focus).is_empty() {
            return;
        }
        self.dropdown = Some(Dropdown {
            control: self.focus,
            highlighted: self.selected_index(self.focus).unwrap_or(0),
        });
    }

    pub fn close_dropdown(&mut self) {
        self.dropdown = None;
    }

    /// Move the dropdown highlight, clamped to the option list
    pub fn dropdown_move(&mut self, delta: i32) {
        let Some(dropdown) = self.dropdown else {
            return;
        };
        let len = self.options(dropdown.control).len();
        if len == 0 {
            return;
        }
        let highlighted =
            (dropdown.highlighted as i64 + delta as i64).clamp(0, len as i64 - 1) as usize;
        self.dropdown = Some(Dropdown {
            highlighted,
            ..dropdown
        });
    }

    /// Commit the highlighted option and close the dropdown
    pub fn dropdown_commit(&mut self) -> Result<(), SelectionError> {
        let Some(dropdown) = self.dropdown.take() else {
            return Ok(());
        };
        self.choose(dropdown.control, dropdown.highlighted)
    }

    /// Update layout and viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.areas = Areas::compute(Rect::new(0, 0, width, height));
        self.viewport.width = self.areas.map_inner.width as usize * 2;
        self.viewport.height = self.areas.map_inner.height as usize * 4;
    }

    /// Back to the world view
    pub fn reset_view(&mut self) {
        self.viewport = Viewport::world(self.viewport.width, self.viewport.height);
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
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

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Map canvas pixel under a terminal cell, if the cell is on the map
    pub fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let inner = self.areas.map_inner;
        let inside = col >= inner.x
            && col < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height;
        inside.then(|| (((col - inner.x) as i32) * 2, ((row - inner.y) as i32) * 4))
    }

    /// Control whose selector box covers a terminal cell
    pub fn control_at(&self, col: u16, row: u16) -> Option<Control> {
        Control::ALL.into_iter().zip(self.areas.controls).find_map(|(control, rect)| {
            let hit = col >= rect.x
                && col < rect.x + rect.width
                && row >= rect.y
                && row < rect.y + rect.height;
            hit.then_some(control)
        })
    }

    /// Pointer moved: resolve the region under it, or leave every region
    pub fn hover_at(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));

        let region = self.map_pixel(col, row).and_then(|(px, py)| {
            let (lon, lat) = self.viewport.unproject(px, py);
            self.region_grid.region_at(&self.dataset.regions, lon, lat)
        });

        self.hover = region.map(|idx| Hover {
            region: idx,
            info: views::hover(&self.dataset, &self.selection, &self.dataset.regions[idx].name),
            col,
            row,
        });
    }

    /// Pointer left the map
    pub fn clear_hover(&mut self) {
        self.hover = None;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}
