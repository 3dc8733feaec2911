//! Export formats for walked row tables.

pub mod csv;

pub use csv::write_rows;
