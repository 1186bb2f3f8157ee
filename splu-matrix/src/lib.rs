mod base;
pub use base::*;

pub mod config;
pub mod sparse;
