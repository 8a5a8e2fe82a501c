//! Record sources: anything that can hand the decoder one row of raw cells at a time.
//!
//! The bundled CSV tokenizer lives in [`crate::reader`]; [`IterSource`] adapts
//! already-split rows (useful when cells come from another tokenizer).

/// Error produced by a record source. Surfaced by the decoder unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// The tokenizer could not make a well-formed record (bare or unterminated quote, ...).
    #[error("parse error on line {line}: {message}")]
    Syntax { line: u64, message: String },
    /// Record has a different number of fields than the reader's field-count policy allows.
    #[error("record on line {line}: wrong number of fields: expected {expected}, got {got}")]
    FieldCount {
        line: u64,
        expected: usize,
        got: usize,
    },
}

/// Produces one ordered row of raw text cells per call.
pub trait RecordSource {
    /// Clear `cells` and fill it with the next record, in file order.
    ///
    /// Returns `Ok(false)` once no records remain; that is end of data, not a failure.
    fn read_record(&mut self, cells: &mut Vec<String>) -> Result<bool, ReadError>;
}

impl<S: RecordSource + ?Sized> RecordSource for &mut S {
    fn read_record(&mut self, cells: &mut Vec<String>) -> Result<bool, ReadError> {
        (**self).read_record(cells)
    }
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn read_record(&mut self, cells: &mut Vec<String>) -> Result<bool, ReadError> {
        (**self).read_record(cells)
    }
}

/// Record source over an iterator of pre-split rows.
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    rows: I,
}

impl<I> IterSource<I> {
    pub fn new(rows: I) -> Self {
        IterSource { rows }
    }

    pub fn into_inner(self) -> I {
        self.rows
    }
}

impl<I, Row, Cell> RecordSource for IterSource<I>
where
    I: Iterator<Item = Row>,
    Row: IntoIterator<Item = Cell>,
    Cell: Into<String>,
{
    fn read_record(&mut self, cells: &mut Vec<String>) -> Result<bool, ReadError> {
        cells.clear();
        match self.rows.next() {
            Some(row) => {
                cells.extend(row.into_iter().map(Into::into));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
