pub mod history;
pub mod types;

pub use types::{Catalog, Entity, Frame, Region, Snapshot, WireFrame, WireGroup};
