pub mod endpoints;
pub mod overlay;
pub mod style;
pub mod surface;

pub use endpoints::*;
pub use overlay::*;
pub use style::*;
pub use surface::*;
