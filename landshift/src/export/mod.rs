//! Inference-table materialization and export.
//!
//! Converts the backend-side joined row-set into the fixed-schema table the
//! regression model consumes, paging in bounded chunks, plus a CSV
//! convenience writer.

mod csv;
mod materialize;
mod schema;

pub use csv::{export_csv, write_csv};
pub use materialize::{materialize, PAGE_SIZE};
pub use schema::{
    convert_row, Column, ColumnKind, Datum, InferenceRow, InferenceTable, INFERENCE_SCHEMA,
};
