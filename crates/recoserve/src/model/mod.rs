mod artifact;
mod factor;
mod interface;

pub use artifact::*;
pub use factor::*;
pub use interface::*;
