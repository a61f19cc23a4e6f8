pub mod event_bus;
pub mod metrics;
pub mod sequencer;

pub use event_bus::*;
pub use metrics::*;
pub use sequencer::*;
