//! Bulk import of line items from spreadsheet files
//!
//! A table with free-text headers is normalized into the canonical schema
//! (description, quantity, unit_price, total, category, lifespan), each row is
//! turned into an [`ImportRow`], and the rows can then be handed one by one to
//! an equipment repository.

pub mod columns;
pub mod lifespan;
pub mod mapper;
pub mod persist;
pub mod table;
pub mod template;

pub use columns::{CanonicalColumn, ColumnMap, ColumnRule, default_column_rules, map_headers};
pub use lifespan::{LifespanRule, default_lifespan_rules, infer_lifespan};
pub use mapper::{ColumnMapper, ImportReport, ImportRow};
pub use persist::{ImportRowError, ImportSummary, persist_import, sheet_display_name};
pub use table::{Table, TableCell, read_table};
pub use template::{
    TEMPLATE_FILE_NAME, TEMPLATE_SHEET_NAME, save_import_template, template_bytes, template_table,
};

use crate::records::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file format: {0} (use .xlsx, .xlsm, .xlsb, .xls or .ods)")]
    UnsupportedFormat(String),
    #[error("failed to read workbook: {0}")]
    Read(#[from] calamine::Error),
    #[error("import source is empty")]
    Empty,
    #[error("import source has no columns")]
    NoColumns,
    #[error("project {0} not found")]
    ProjectNotFound(u64),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
