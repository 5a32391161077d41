pub mod chart;
pub mod excel_read;
pub mod excel_write;
mod glyphs;
