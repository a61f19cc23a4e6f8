pub mod geo_transform;

pub use geo_transform::*;
