mod base;
mod layer;
mod parameters;
mod properties;

pub use base::*;
pub use layer::*;
pub use parameters::*;
pub use properties::*;
