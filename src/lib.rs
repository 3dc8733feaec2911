pub mod core;
pub mod edinet;
pub mod export;
pub mod xbrl;

// Re-exports
pub use crate::core::EdinetConfig;
pub use xbrl::{extract_rows, OutputRow, RowTable, TargetStatements, XbrlDocument, ROW_HEADERS};
