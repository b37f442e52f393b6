//! Safe SQL builder: identifiers are fixed in code, values travel as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
