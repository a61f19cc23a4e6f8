pub mod config;
pub mod notice;
pub mod session;
pub mod suggest;

pub use config::*;
pub use notice::*;
pub use session::*;
pub use suggest::*;
