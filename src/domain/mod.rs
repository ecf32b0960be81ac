pub mod meter;
pub mod region;

pub use meter::*;
pub use region::*;
