mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use geometry::{draw_line, fill_polygon};
pub use projection::{wrap_lon, Viewport};
pub use renderer::{DisplaySettings, MapLayers, MapRenderer};
pub use spatial::RegionGrid;
