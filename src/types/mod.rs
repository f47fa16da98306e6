//! Data types for the splitter.

mod cell;
mod policy;
mod table;

pub use cell::*;
pub use policy::*;
pub use table::*;
