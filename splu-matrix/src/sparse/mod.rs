pub use crate::MatTrait;

mod sp_vec;
mod sp_mat;
mod util;
pub use sp_vec::{SpEntry, SpVec};
pub use sp_mat::SpMat;
pub use util::*;

pub mod heap;
pub mod lu;
pub mod solve;
