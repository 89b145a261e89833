//! Commands exposed to the operations console

mod health;
mod instances;

pub use health::*;
pub use instances::*;
