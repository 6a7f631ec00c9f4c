pub mod color;
pub mod map;
pub mod preset;
pub mod stops;
