//! CSV export of the inference table.
//!
//! A convenience for inspection and offline model runs; the typed
//! [`InferenceTable`] itself is the contract. Nulls serialize as empty
//! fields, dates as ISO `YYYY-MM-DD`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::schema::{Datum, InferenceTable};

/// Writes the table as CSV, header first.
pub fn write_csv<W: Write>(table: &InferenceTable, mut writer: W) -> io::Result<()> {
    let header: Vec<String> = table
        .column_names()
        .iter()
        .map(|name| escape_field(name))
        .collect();
    writeln!(writer, "{}", header.join(","))?;

    for row in table.rows() {
        let fields: Vec<String> = row.values().iter().map(format_datum).collect();
        writeln!(writer, "{}", fields.join(","))?;
    }

    Ok(())
}

/// Writes the table as CSV to a file path.
pub fn export_csv(table: &InferenceTable, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_csv(table, &mut writer)?;
    writer.flush()
}

fn format_datum(datum: &Datum) -> String {
    match datum {
        Datum::Date(date) => date.format("%Y-%m-%d").to_string(),
        Datum::Float(value) => format!("{}", value),
        Datum::Category(code) => format!("{}", code),
        Datum::Null => String::new(),
    }
}

/// Quotes a field when it contains a comma, quote, or newline.
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
