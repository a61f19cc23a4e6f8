pub mod cache;
pub mod pipeline;
pub mod protocol;
pub mod request;

pub use cache::*;
pub use pipeline::*;
pub use protocol::*;
pub use request::*;
