mod globe;
mod projection;
pub mod spatial;

pub use globe::GlobeViewport;
pub use projection::{Projection, ViewState, Viewport};
