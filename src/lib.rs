//! # csvstruct — decode CSV rows into structs
//!
//! Reads comma-separated records one at a time and assigns each cell to the field at the
//! same position in a user-defined struct, converting text into the field's type.
//!
//! ## Field types
//!
//! - Signed integers: `isize`, `i8`, `i16`, `i32`, `i64`
//! - Unsigned integers: `usize`, `u8`, `u16`, `u32`, `u64`
//! - Floats: `f32`, `f64`
//! - `String` (copied verbatim)
//! - `Option<T>` / `Option<Box<T>>`: set to `T::default()` before the cell is converted
//! - Any type implementing [`UnmarshalCsv`] (registered with [`csv_field!`])
//!
//! Empty cells decode to zero for every numeric type. `bool`, `char` and `Vec<T>` are
//! accepted as fields but fail with an "unsupported" error when a row reaches them.
//!
//! ## Example
//!
//! ```
//! use csvstruct::{csv_field, csv_record, BoxError, Decoder, UnmarshalCsv};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Padded(String);
//!
//! impl UnmarshalCsv for Padded {
//!     fn unmarshal_csv(&mut self, raw: &str) -> Result<(), BoxError> {
//!         self.0 = format!("{raw:>10}");
//!         Ok(())
//!     }
//! }
//! csv_field!(Padded);
//!
//! csv_record! {
//!     #[derive(Debug, Default)]
//!     struct Row {
//!         f1: i64,
//!         f2: u32,
//!         f3: Option<Box<Padded>>,
//!         f4: f64,
//!     }
//! }
//!
//! let mut dec = Decoder::new("1, 2, \"string\", 5\n6, 7, x, 8.5\n".as_bytes());
//! let mut row = Row::default();
//! while dec.decode(&mut row)? {
//!     println!("{row:?}");
//! }
//! assert_eq!(row.f3.unwrap().0, "         x");
//! # Ok::<(), csvstruct::DecodeError>(())
//! ```
//!
//! ## Modules
//!
//! - [`reader`]: CSV tokenizer (PEST grammar) and its options
//! - [`source`]: the [`RecordSource`] trait any tokenizer can implement
//! - [`record`]: record descriptors, field kinds and the conversion hook
//! - [`mapper`]: positional assignment and type coercion
//! - [`decoder`]: the [`Decoder`] tying a source to the mapper

pub mod decoder;
pub mod mapper;
pub mod reader;
pub mod record;
pub mod source;

pub use decoder::{Decoder, Records};
pub use mapper::{assign, DecodeError, ScalarError};
pub use reader::{FieldsPerRecord, Reader, ReaderOptions};
pub use record::{
    BoxError, CsvField, FieldMut, FieldSlot, FloatSlot, IntSlot, OptionalSlot, Record, UintSlot,
    UnmarshalCsv,
};
pub use source::{IterSource, ReadError, RecordSource};
