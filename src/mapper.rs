//! Field mapping and type coercion: assign one row of raw cells to a record's fields.
//!
//! Cells are matched to slots by position. Per slot, in order: settability, optional
//! initialization, custom hook, built-in scalar parsing, and finally "unsupported".
//! The first failure aborts the row; fields assigned before it keep their new values.

use crate::record::{BoxError, FieldMut, FloatSlot, IntSlot, Record, UintSlot};
use crate::source::ReadError;
use std::num::{ParseFloatError, ParseIntError};
use std::str::FromStr;

/// Underlying error of a built-in numeric conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScalarError {
    #[error(transparent)]
    Int(#[from] ParseIntError),
    #[error(transparent)]
    Float(#[from] ParseFloatError),
    /// Finite text whose value does not fit the float width.
    #[error("value out of range")]
    FloatRange,
    #[error("sign not allowed for unsigned value")]
    UnsignedSign,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Tokenizer or I/O failure from the record source, unmodified.
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("mismatch length of record: expected {expected} fields, got {got}")]
    FieldCount { expected: usize, got: usize },
    #[error("field {0:?} is not settable")]
    NotSettable(&'static str),
    #[error("failed in parsing {field:?} from {value:?}: {source}")]
    Parse {
        field: &'static str,
        value: String,
        source: ScalarError,
    },
    /// Error reported by a field's own [`UnmarshalCsv`](crate::UnmarshalCsv) hook.
    #[error(transparent)]
    Custom(BoxError),
    #[error("do not know how to decode field {0:?}")]
    Unsupported(&'static str),
}

impl DecodeError {
    /// Name of the field the error is about, if it concerns a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            DecodeError::NotSettable(name) | DecodeError::Unsupported(name) => Some(*name),
            DecodeError::Parse { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Assign `cells` to the fields of `target`, position by position.
///
/// Fails without touching `target` when the cell count differs from the field count.
pub fn assign<T, S>(target: &mut T, cells: &[S]) -> Result<(), DecodeError>
where
    T: Record + ?Sized,
    S: AsRef<str>,
{
    let slots = target.fields();
    if slots.len() != cells.len() {
        return Err(DecodeError::FieldCount {
            expected: slots.len(),
            got: cells.len(),
        });
    }
    for (slot, cell) in slots.into_iter().zip(cells) {
        let field = slot.target.ok_or(DecodeError::NotSettable(slot.name))?;
        convert(slot.name, field, cell.as_ref())?;
    }
    Ok(())
}

fn convert(name: &'static str, field: FieldMut<'_>, raw: &str) -> Result<(), DecodeError> {
    let parse_err = |source: ScalarError| DecodeError::Parse {
        field: name,
        value: raw.to_string(),
        source,
    };
    match field {
        FieldMut::Optional(slot) => convert(name, slot.get_or_default(), raw),
        FieldMut::Custom(hook) => hook.unmarshal_csv(raw).map_err(DecodeError::Custom),
        FieldMut::Int(slot) => store_int(slot, raw).map_err(|e| parse_err(e.into())),
        FieldMut::Uint(slot) => store_uint(slot, raw).map_err(parse_err),
        FieldMut::Float(slot) => store_float(slot, raw).map_err(parse_err),
        FieldMut::Text(s) => {
            s.clear();
            s.push_str(raw);
            Ok(())
        }
        FieldMut::Unsupported => Err(DecodeError::Unsupported(name)),
    }
}

/// Empty cells decode to zero.
fn parse_or_zero<T: FromStr + Default>(raw: &str) -> Result<T, T::Err> {
    if raw.is_empty() {
        Ok(T::default())
    } else {
        raw.parse()
    }
}

fn store_int(slot: IntSlot<'_>, raw: &str) -> Result<(), ParseIntError> {
    match slot {
        IntSlot::Isize(v) => *v = parse_or_zero(raw)?,
        IntSlot::I8(v) => *v = parse_or_zero(raw)?,
        IntSlot::I16(v) => *v = parse_or_zero(raw)?,
        IntSlot::I32(v) => *v = parse_or_zero(raw)?,
        IntSlot::I64(v) => *v = parse_or_zero(raw)?,
    }
    Ok(())
}

fn store_uint(slot: UintSlot<'_>, raw: &str) -> Result<(), ScalarError> {
    if raw.starts_with('+') {
        return Err(ScalarError::UnsignedSign);
    }
    match slot {
        UintSlot::Usize(v) => *v = parse_or_zero(raw)?,
        UintSlot::U8(v) => *v = parse_or_zero(raw)?,
        UintSlot::U16(v) => *v = parse_or_zero(raw)?,
        UintSlot::U32(v) => *v = parse_or_zero(raw)?,
        UintSlot::U64(v) => *v = parse_or_zero(raw)?,
    }
    Ok(())
}

fn store_float(slot: FloatSlot<'_>, raw: &str) -> Result<(), ScalarError> {
    match slot {
        FloatSlot::F32(v) => *v = parse_float(raw)?,
        FloatSlot::F64(v) => *v = parse_float(raw)?,
    }
    Ok(())
}

/// Overflow parses to infinity; only an explicit infinity is accepted as one.
fn parse_float<T>(raw: &str) -> Result<T, ScalarError>
where
    T: FromStr<Err = ParseFloatError> + Default + Copy + Into<f64>,
{
    let v: T = parse_or_zero(raw)?;
    if v.into().is_infinite() && !spells_infinity(raw) {
        return Err(ScalarError::FloatRange);
    }
    Ok(v)
}

fn spells_infinity(raw: &str) -> bool {
    let unsigned = raw
        .strip_prefix('+')
        .or_else(|| raw.strip_prefix('-'))
        .unwrap_or(raw);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}
