//! Decoder: reads one record from a source per call and maps it onto a target struct.

use crate::mapper::{self, DecodeError};
use crate::reader::{Reader, ReaderOptions};
use crate::record::Record;
use crate::source::{ReadError, RecordSource};
use std::io::Read;
use std::marker::PhantomData;

#[derive(Debug)]
pub struct Decoder<S> {
    source: S,
    cells: Vec<String>,
}

impl<R: Read> Decoder<Reader<R>> {
    /// CSV decoder with default options (leading whitespace trimmed).
    pub fn new(input: R) -> Self {
        Self::from_source(Reader::new(input))
    }

    pub fn with_options(input: R, options: ReaderOptions) -> Self {
        Self::from_source(Reader::with_options(input, options))
    }
}

impl<S: RecordSource> Decoder<S> {
    pub fn from_source(source: S) -> Self {
        Decoder {
            source,
            cells: Vec::new(),
        }
    }

    /// Decode the next record into `target`.
    ///
    /// Returns `Ok(false)` at end of data without touching `target`. Exactly one record is
    /// consumed per call that reaches the source, including calls that fail while mapping.
    pub fn decode<T: Record + ?Sized>(&mut self, target: &mut T) -> Result<bool, DecodeError> {
        if !self.source.read_record(&mut self.cells)? {
            return Ok(false);
        }
        mapper::assign(target, &self.cells)?;
        Ok(true)
    }

    /// Iterate over the remaining records, decoding each into a fresh `T::default()`.
    pub fn records<T: Record + Default>(&mut self) -> Records<'_, S, T> {
        Records {
            decoder: self,
            done: false,
            _record: PhantomData,
        }
    }

    /// Cells of the most recently read record.
    pub fn last_cells(&self) -> &[String] {
        &self.cells
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

/// Iterator returned by [`Decoder::records`].
///
/// Mapping and syntax errors are yielded and iteration continues with the next record;
/// it stops at end of data or after an I/O error.
#[derive(Debug)]
pub struct Records<'d, S, T> {
    decoder: &'d mut Decoder<S>,
    done: bool,
    _record: PhantomData<fn() -> T>,
}

impl<S: RecordSource, T: Record + Default> Iterator for Records<'_, S, T> {
    type Item = Result<T, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut record = T::default();
        match self.decoder.decode(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                if matches!(e, DecodeError::Read(ReadError::Io(_))) {
                    self.done = true;
                }
                Some(Err(e))
            }
        }
    }
}
