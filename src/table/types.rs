//! Type definitions for table processing

/// One input item. Key order follows the input document because
/// `serde_json` is built with `preserve_order`.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One output line, a value per column.
pub type Row = Vec<String>;

/// Ordered column names governing the layout of every row in an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header(Vec<String>);

impl Header {
    pub fn new(columns: Vec<String>) -> Self {
        Self(columns)
    }

    /// Take the column order from the keys of a record.
    pub fn from_record(record: &Record) -> Self {
        Self(record.keys().cloned().collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Header {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}
