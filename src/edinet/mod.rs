//! EDINET API access and local archive handling.

pub mod archive;
pub mod client;

pub use archive::{extract_archives, ExtractedFiling};
pub use client::{DocumentMeta, DOC_TYPE_SECURITIES_REPORT};
