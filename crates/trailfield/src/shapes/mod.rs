pub mod digits;
#[cfg(feature = "vectors")]
pub mod outline;
pub mod source;

pub use digits::{DigitLayout, DigitMagnet};
#[cfg(feature = "vectors")]
pub use outline::{flatten_path, PathShapes};
pub use source::{load_partitions, Polyline, ShapeLoader, ShapePlacement, ShapeSource, StaticShapes};
