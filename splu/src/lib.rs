mod modulus;

pub use modulus::*;

pub mod util;
