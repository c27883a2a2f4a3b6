//! Chart aggregate: layout value objects, the range filter and the backend seam.

pub mod backend;
pub mod range_filter;
pub mod value_objects;

pub use backend::*;
pub use range_filter::*;
pub use value_objects::*;
