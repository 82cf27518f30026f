//! Row projection and CSV serialization

use serde_json::Value;

use super::types::{Header, Record, Row};

/// Natural string form of a record value. `null` becomes the empty string.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Look up every column of `columns` in `record`. Missing keys yield "".
pub fn project(record: &Record, columns: &Header) -> Row {
    columns
        .columns()
        .iter()
        .map(|column| record.get(column).map(stringify).unwrap_or_default())
        .collect()
}

/// Serialize rows, optionally preceded by a header row, using `\n` after
/// every record.
pub fn compose(header: Option<&Header>, rows: &[Row], delimiter: u8) -> Result<String, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    if let Some(header) = header {
        writer.write_record(header.columns())?;
    }
    for row in rows {
        writer.write_record(row)?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|error| csv::Error::from(error.into_error()))?;
    String::from_utf8(buffer)
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error).into())
}
