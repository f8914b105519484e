//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{MINOR_UNIT_SCALE, from_minor_units, has_sub_minor_precision, to_minor_units};
pub use pagination::{PageRequest, PageResponse};
