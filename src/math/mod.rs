//! Mathematical utilities: least squares and Yule-Walker estimation.

pub mod ols;
pub mod yule_walker;

pub use ols::*;
pub use yule_walker::*;
