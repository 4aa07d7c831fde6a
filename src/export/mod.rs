//! Report output: console tables and CSV files.

pub mod csv;
pub mod table;
