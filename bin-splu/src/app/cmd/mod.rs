pub mod lu;
pub mod rank;
pub mod solve;
