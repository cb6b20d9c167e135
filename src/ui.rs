use crate::app::{App, Control};
use crate::braille::BrailleCanvas;
use crate::map::MapLayers;
use crate::views::{display_value, format_compact, Fill};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Clear, Dataset, GraphType, List, ListItem, ListState,
        Paragraph, Widget,
    },
    Frame,
};

const NEUTRAL: Color = Color::Rgb(204, 204, 204);
const OUTLINE: Color = Color::Rgb(51, 51, 51);
const TREND: Color = Color::Blue;

/// Longest dropdown list before it scrolls
const DROPDOWN_ROWS: u16 = 12;

pub fn fill_color(fill: Fill) -> Color {
    match fill {
        Fill::Above => Color::Green,
        Fill::Below => Color::Red,
        Fill::Neutral => NEUTRAL,
    }
}

/// Screen layout shared by rendering and mouse hit-testing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Areas {
    /// Metric, baseline and year selectors
    pub controls: [Rect; 3],
    pub map: Rect,
    /// Map area inside its border; the Braille canvas covers exactly this
    pub map_inner: Rect,
    pub chart: Rect,
    pub status: Rect,
}

impl Areas {
    pub fn compute(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Selectors
                Constraint::Min(6),    // Map + chart
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        let controls = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(rows[0]);

        let body = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(rows[1]);

        Self {
            controls: [controls[0], controls[1], controls[2]],
            map: body[0],
            map_inner: map_block().inner(body[0]),
            chart: body[1],
            status: rows[2],
        }
    }
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let areas = Areas::compute(frame.area());

    render_controls(frame, app, &areas);
    render_map(frame, app, &areas);
    render_trend(frame, app, areas.chart);
    render_status_bar(frame, app, areas.status);
    render_tooltip(frame, app);
    render_dropdown(frame, app, &areas);
}

fn render_controls(frame: &mut Frame, app: &App, areas: &Areas) {
    for (control, area) in Control::ALL.into_iter().zip(areas.controls) {
        let focused = app.focus == control;
        let border = if focused { Color::Yellow } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Span::styled(
                format!(" {} ", control.title()),
                Style::default().fg(Color::Cyan),
            ));

        let value_style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let line = Line::from(vec![
            Span::styled(app.value(control).to_string(), value_style),
            Span::styled(" ▾", Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}

fn render_map(frame: &mut Frame, app: &App, areas: &Areas) {
    let selection = app.selection();
    let block = map_block().title(Span::styled(
        format!(
            " {} {} vs {} ",
            selection.metric(),
            selection.year(),
            selection.baseline_country()
        ),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(block, areas.map);

    let inner = areas.map_inner;

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &viewport,
        &app.dataset.regions,
        &app.views().fills,
        app.hover.as_ref().map(|h| h.region),
    );

    let cursor_pos = app.mouse_pos.and_then(|(col, row)| {
        let on_map = col >= inner.x
            && col < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height;
        on_map.then(|| (col - inner.x, row - inner.y))
    });

    frame.render_widget(MapWidget { layers, cursor_pos }, inner);
}

/// Braille choropleth layers with the pointer marked
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                // Empty cells let lower layers show through
                if let Some(ch) = canvas.cell(col as usize, row as usize) {
                    buf[(area.x + col, area.y + row)].set_char(ch).set_fg(color);
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for fill in Fill::ALL {
            Self::render_layer(self.layers.fill_layer(fill), fill_color(fill), area, buf);
        }
        Self::render_layer(&self.layers.outlines, OUTLINE, area, buf);
        Self::render_layer(&self.layers.highlight, Color::White, area, buf);

        if let Some((cx, cy)) = self.cursor_pos {
            if cx < area.width && cy < area.height {
                buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Yellow);
            }
        }
    }
}

fn render_trend(frame: &mut Frame, app: &App, area: Rect) {
    let trend = &app.views().trend;
    let title = if trend.is_empty() {
        format!(" {} trend: {} (no data) ", trend.metric, trend.country)
    } else {
        format!(" {} trend: {} ", trend.metric, trend.country)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(title, Style::default().fg(Color::Cyan)));

    let coords = trend.coordinates();
    let datasets = vec![
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(TREND))
            .data(&coords),
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(TREND).add_modifier(Modifier::BOLD))
            .data(&coords),
    ];

    let [y_min, y_max] = trend.y_bounds();
    let y_labels = vec![
        format_compact(y_min),
        format_compact((y_min + y_max) / 2.0),
        format_compact(y_max),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds(trend.x_bounds())
                .labels(trend.x_labels()),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );

    frame.render_widget(chart, area);
}

fn render_tooltip(frame: &mut Frame, app: &App) {
    let Some(hover) = app.hover.as_ref() else {
        return;
    };
    let Some(info) = hover.info.as_ref() else {
        return;
    };

    let lines = info.lines();
    let screen = frame.area();
    let content_width = lines
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(info.country.chars().count() + 2))
        .max()
        .unwrap_or(0) as u16;
    let width = content_width.saturating_add(2).min(screen.width);
    let height = (lines.len() as u16 + 2).min(screen.height);

    let area = tooltip_area(screen, hover.col, hover.row, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(Span::styled(
            format!(" {} ", info.country),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    let text: Vec<Line> = lines.into_iter().map(Line::from).collect();

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(text).block(block), area);
}

/// Below-right of the pointer, flipped when it would run off screen
fn tooltip_area(screen: Rect, col: u16, row: u16, width: u16, height: u16) -> Rect {
    // Widened so a pointer at the far edge cannot overflow
    let x = if u32::from(col) + 2 + u32::from(width) <= u32::from(screen.right()) {
        col + 2
    } else {
        col.saturating_sub(width.saturating_add(1))
    };
    let y = if u32::from(row) + 1 + u32::from(height) <= u32::from(screen.bottom()) {
        row + 1
    } else {
        row.saturating_sub(height)
    };
    Rect::new(x, y, width, height).intersection(screen)
}

fn render_dropdown(frame: &mut Frame, app: &App, areas: &Areas) {
    let Some(dropdown) = app.dropdown else {
        return;
    };
    let anchor = match dropdown.control {
        Control::Metric => areas.controls[0],
        Control::Baseline => areas.controls[1],
        Control::Year => areas.controls[2],
    };
    let options = app.options(dropdown.control);
    let current = app.value(dropdown.control);

    let screen = frame.area();
    let height = (options.len() as u16).min(DROPDOWN_ROWS) + 2;
    let area = Rect::new(anchor.x, anchor.bottom(), anchor.width, height).intersection(screen);
    if area.is_empty() {
        return;
    }

    let items: Vec<ListItem> = options
        .iter()
        .map(|&option| {
            let marker = if option == current { "• " } else { "  " };
            ListItem::new(format!("{marker}{option}"))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(dropdown.highlighted));

    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let views = app.views();
    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | Baseline: ", Style::default().fg(Color::DarkGray)),
        Span::styled(display_value(views.baseline_value), Style::default().fg(Color::White)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
    ];

    // Legend with region counts
    for (fill, count) in views.counts().into_iter().rev() {
        spans.push(Span::styled("■ ", Style::default().fg(fill_color(fill))));
        spans.push(Span::styled(
            format!("{} ({count}) ", fill.label()),
            Style::default().fg(Color::Gray),
        ));
    }

    spans.push(Span::styled(
        "| tab:focus enter:open [ ]:step hjkl:pan +/-:zoom b:outlines f:fills r:reset q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_areas_partition_screen() {
        let areas = Areas::compute(Rect::new(0, 0, 120, 40));
        assert_eq!(areas.controls[0].y, 0);
        assert_eq!(areas.controls[0].height, 3);
        assert_eq!(areas.status.y, 39);
        assert!(areas.map.bottom() <= areas.chart.y);
        assert_eq!(areas.map_inner.x, areas.map.x + 1);
        assert_eq!(areas.map_inner.width, areas.map.width - 2);
    }

    #[test]
    fn test_tooltip_flips_at_screen_edges() {
        let screen = Rect::new(0, 0, 80, 24);
        assert_eq!(tooltip_area(screen, 10, 5, 20, 5), Rect::new(12, 6, 20, 5));
        assert_eq!(tooltip_area(screen, 70, 22, 20, 5), Rect::new(49, 17, 20, 5));
    }

    #[test]
    fn test_tooltip_near_u16_max_does_not_overflow() {
        let screen = Rect {
            x: 0,
            y: 0,
            width: u16::MAX,
            height: u16::MAX,
        };
        let area = tooltip_area(screen, u16::MAX - 1, u16::MAX - 1, 30, 5);
        assert!(area.x < u16::MAX - 1);
        assert!(area.y < u16::MAX - 1);
        assert_eq!(area.width, 30);
    }

    #[test]
    fn test_map_widget_draws_fill_colors() {
        let mut above = BrailleCanvas::new(2, 1);
        above.fill_span(0, 0, 4);
        let layers = MapLayers {
            neutral: BrailleCanvas::new(2, 1),
            below: BrailleCanvas::new(2, 1),
            above,
            outlines: BrailleCanvas::new(2, 1),
            highlight: BrailleCanvas::new(2, 1),
        };
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        MapWidget {
            layers,
            cursor_pos: Some((1, 0)),
        }
        .render(area, &mut buf);

        assert_eq!(buf[(0, 0)].fg, Color::Green);
        assert_eq!(buf[(1, 0)].symbol(), "╋");
    }
}
