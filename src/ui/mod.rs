// ui/mod.rs

mod constants;
mod radio;
pub mod spinner;

pub use radio::draw;

pub const MIN_WIDTH: u16 = 80;
pub const MIN_HEIGHT: u16 = 24;
