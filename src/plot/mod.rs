//! Terminal plotting for the non-interactive report.

pub mod ascii;

pub use ascii::*;
