//! CSV import and export for meter readings and run records.

pub mod export;
pub mod import;
