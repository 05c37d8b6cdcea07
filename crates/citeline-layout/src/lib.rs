//! Citeline Layout: timeline projection of the citation graph.
//!
//! Pure functions from a consistent graph snapshot to positioned nodes and
//! year ticks. Nothing here suspends or mutates the graph.

pub mod mapper;
pub mod ticks;
pub mod timeline;
pub mod vertical;

pub use mapper::{MappingKind, TimeDomain, TimeMapper};
pub use ticks::{generate_ticks, Tick, MAJOR_TICK_INTERVAL};
pub use timeline::{build_timeline, Timeline, TimelineNode};
pub use vertical::{place_vertically, Placed};
