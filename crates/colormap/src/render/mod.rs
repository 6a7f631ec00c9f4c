pub mod field;
pub mod heatmap;
pub mod legend;
