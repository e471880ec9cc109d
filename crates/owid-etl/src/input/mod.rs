//! Input parsing and data source handling.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig, is_gzip};
pub use source::{DataTable, SourceMetadata};
