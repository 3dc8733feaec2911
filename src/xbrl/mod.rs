//! XBRL filing model, statement selection, and the presentation-order
//! extraction walker.

pub mod consolidation;
pub mod document;
pub mod linkrole;
pub mod model;
pub mod rows;
pub mod walker;

pub use consolidation::ConsolidationStatus;
pub use document::{FilingMeta, XbrlDocument};
pub use linkrole::TargetStatements;
pub use model::Linkrole;
pub use rows::{OutputRow, RowTable, ROW_HEADERS};
pub use walker::extract_rows;
