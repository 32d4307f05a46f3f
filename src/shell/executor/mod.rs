#[allow(clippy::module_inception)]
mod executor;
pub mod wait;

pub use executor::{run, spawn_line};
