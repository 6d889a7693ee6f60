//! Pure preview math: size selection, container layout, orientation and zoom.

pub mod layout;
pub mod rotation;
pub mod sizes;
pub mod zoom;

pub use layout::{ContainerLayout, Gravity};
pub use rotation::display_orientation;
pub use sizes::{select_size_pair, SizeSelector};
pub use zoom::{normalize_zoom, reported_zoom, zoom_index, ReportedZoom};
