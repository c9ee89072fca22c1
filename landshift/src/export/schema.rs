//! The fixed inference-table schema.
//!
//! The regression model downstream was trained against an exact, ordered
//! set of named columns; this module pins that order and the per-column
//! typing, and converts raw backend sample rows into typed rows. Attributes
//! missing from a raw row become nulls so row alignment is never lost.

use chrono::NaiveDate;
use serde_json::Value;

use crate::backend::SampleRow;

/// How a column's values are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Calendar date (ISO `YYYY-MM-DD` on the wire).
    Date,
    /// Continuous numeric value.
    Float,
    /// Discrete label carried as an integer code.
    Categorical,
}

/// One column of the inference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn column(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

/// The fixed, ordered inference schema.
///
/// Order and names are part of the model-consumer contract and must not
/// change without retraining.
pub static INFERENCE_SCHEMA: &[Column] = &[
    column("date", ColumnKind::Date),
    column("latitude", ColumnKind::Float),
    column("longitude", ColumnKind::Float),
    column("tmmn", ColumnKind::Float),
    column("tmmx", ColumnKind::Float),
    column("vpd", ColumnKind::Float),
    column("srad", ColumnKind::Float),
    column("lai", ColumnKind::Float),
    column("fpar", ColumnKind::Float),
    column("elevation", ColumnKind::Float),
    column("water_mean", ColumnKind::Float),
    column("trees_mean", ColumnKind::Float),
    column("grass_mean", ColumnKind::Float),
    column("flooded_vegetation_mean", ColumnKind::Float),
    column("crops_mean", ColumnKind::Float),
    column("shrub_and_scrub_mean", ColumnKind::Float),
    column("built_mean", ColumnKind::Float),
    column("bare_mean", ColumnKind::Float),
    column("snow_and_ice_mean", ColumnKind::Float),
    column("label_mode", ColumnKind::Categorical),
    column("quarter", ColumnKind::Categorical),
    column("change", ColumnKind::Categorical),
];

/// One typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Date(NaiveDate),
    Float(f64),
    Category(i64),
    Null,
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }
}

/// One typed row, aligned to [`INFERENCE_SCHEMA`].
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRow {
    values: Vec<Datum>,
}

impl InferenceRow {
    /// A row with every column null.
    pub fn null_row() -> InferenceRow {
        InferenceRow {
            values: vec![Datum::Null; INFERENCE_SCHEMA.len()],
        }
    }

    /// Cell values in schema order.
    pub fn values(&self) -> &[Datum] {
        &self.values
    }

    /// Value of a named column, if the column exists.
    pub fn get(&self, name: &str) -> Option<&Datum> {
        INFERENCE_SCHEMA
            .iter()
            .position(|c| c.name == name)
            .map(|index| &self.values[index])
    }
}

/// The materialized inference table.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceTable {
    rows: Vec<InferenceRow>,
}

impl InferenceTable {
    pub fn new(rows: Vec<InferenceRow>) -> InferenceTable {
        InferenceTable { rows }
    }

    /// The uniform-shape stand-in for an empty result: one all-null row.
    pub fn placeholder() -> InferenceTable {
        InferenceTable {
            rows: vec![InferenceRow::null_row()],
        }
    }

    pub fn schema(&self) -> &'static [Column] {
        INFERENCE_SCHEMA
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<&'static str> {
        INFERENCE_SCHEMA.iter().map(|c| c.name).collect()
    }

    pub fn rows(&self) -> &[InferenceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when the table is the single all-null placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.rows.len() == 1 && self.rows[0].values().iter().all(Datum::is_null)
    }
}

fn parse_date(value: &Value) -> Datum {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .map(Datum::Date)
        .unwrap_or(Datum::Null)
}

fn parse_float(value: &Value) -> Datum {
    value.as_f64().map(Datum::Float).unwrap_or(Datum::Null)
}

fn parse_category(value: &Value) -> Datum {
    if let Some(code) = value.as_i64() {
        return Datum::Category(code);
    }
    // Constant and mode attributes may arrive as floats.
    value
        .as_f64()
        .map(|f| Datum::Category(f.round() as i64))
        .unwrap_or(Datum::Null)
}

/// Types a raw backend row against the inference schema.
///
/// Absent or mistyped attributes become [`Datum::Null`]; extra attributes
/// in the raw row are ignored.
pub fn convert_row(row: &SampleRow) -> InferenceRow {
    let values = INFERENCE_SCHEMA
        .iter()
        .map(|column| match row.values.get(column.name) {
            None | Some(Value::Null) => Datum::Null,
            Some(value) => match column.kind {
                ColumnKind::Date => parse_date(value),
                ColumnKind::Float => parse_float(value),
                ColumnKind::Categorical => parse_category(value),
            },
        })
        .collect();

    InferenceRow { values }
}
