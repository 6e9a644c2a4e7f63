// rust/feed-core/src/dataset/format.rs

use crate::config::SlotSchema;
use crate::error::{FeedError, Result};

/// One parsed input line: a slot name and its raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub values: Vec<f32>,
}

/// Describes how a single text line maps to a [`Record`].
pub trait RecordFormat: Send + Sync {
    /// Parse one line. `line_no` is 1-based and only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Malformed`] if the line does not follow the format.
    fn parse_record(&self, line: &str, line_no: usize) -> Result<Record>;

    /// Name of this record format
    fn name(&self) -> &'static str;
}

/// `<name><field_delimiter><v0><value_delimiter><v1>...` records.
///
/// Runs of the value delimiter are collapsed, so trailing or doubled
/// separators do not produce empty tokens.
#[derive(Debug, Clone)]
pub struct DelimitedFormat {
    pub field_delimiter: char,
    pub value_delimiter: char,
}

impl DelimitedFormat {
    pub fn new(field_delimiter: char, value_delimiter: char) -> Self {
        Self {
            field_delimiter,
            value_delimiter,
        }
    }

    pub fn from_schema(schema: &SlotSchema) -> Self {
        Self::new(schema.field_delimiter, schema.value_delimiter)
    }
}

impl Default for DelimitedFormat {
    fn default() -> Self {
        Self::new('\t', ' ')
    }
}

impl RecordFormat for DelimitedFormat {
    fn parse_record(&self, line: &str, line_no: usize) -> Result<Record> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        let mut fields = line.split(self.field_delimiter);
        let (name, values) = match (fields.next(), fields.next(), fields.next()) {
            (Some(name), Some(values), None) => (name, values),
            _ => {
                return Err(FeedError::malformed(
                    line_no,
                    format!(
                        "expected 2 fields separated by {:?}, found {}",
                        self.field_delimiter,
                        line.split(self.field_delimiter).count()
                    ),
                ))
            }
        };

        if name.is_empty() {
            return Err(FeedError::malformed(line_no, "empty slot name"));
        }

        let values = values
            .split(self.value_delimiter)
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<f32>().map_err(|_| {
                    FeedError::malformed(
                        line_no,
                        format!("invalid float token '{token}' in slot '{name}'"),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Record {
            name: name.to_string(),
            values,
        })
    }

    fn name(&self) -> &'static str {
        "delimited"
    }
}
