//! Domain model and time conversions.

pub mod booking;
pub mod macros;
pub mod time;

pub use booking::*;
pub use time::*;
