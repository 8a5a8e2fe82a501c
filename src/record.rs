//! Record descriptors: how a target struct exposes its fields to the decoder.
//!
//! A [`Record`] lists its [`FieldSlot`]s in declaration order; position is the only link
//! between a slot and a CSV cell. Each slot borrows its field as a [`FieldMut`], a closed
//! set of leaf kinds the mapper knows how to fill.
//!
//! Implement [`Record`] with the [`csv_record!`](crate::csv_record) macro or by hand.
//! Types with their own text conversion implement [`UnmarshalCsv`] and register it with
//! [`csv_field!`](crate::csv_field).

/// Error type returned by custom conversion hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Custom text-to-value conversion for a field type.
///
/// When a field's type converts itself, built-in scalar parsing is skipped entirely and
/// any error is returned from `decode` unmodified.
pub trait UnmarshalCsv {
    fn unmarshal_csv(&mut self, raw: &str) -> Result<(), BoxError>;
}

/// Signed integer field of a given width.
#[derive(Debug)]
pub enum IntSlot<'a> {
    Isize(&'a mut isize),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
}

/// Unsigned integer field of a given width.
#[derive(Debug)]
pub enum UintSlot<'a> {
    Usize(&'a mut usize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
}

#[derive(Debug)]
pub enum FloatSlot<'a> {
    F32(&'a mut f32),
    F64(&'a mut f64),
}

/// An optional field (`Option<T>`): filled with `T::default()` before conversion if empty.
pub trait OptionalSlot {
    /// Initialize the value if absent, then borrow it as a field.
    fn get_or_default(&mut self) -> FieldMut<'_>;
}

/// Mutable view of one field, tagged by how the mapper should fill it.
pub enum FieldMut<'a> {
    Custom(&'a mut dyn UnmarshalCsv),
    Optional(&'a mut dyn OptionalSlot),
    Int(IntSlot<'a>),
    Uint(UintSlot<'a>),
    Float(FloatSlot<'a>),
    Text(&'a mut String),
    /// No conversion exists for this field's type.
    Unsupported,
}

impl std::fmt::Debug for FieldMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldMut::Custom(_) => f.write_str("Custom"),
            FieldMut::Optional(_) => f.write_str("Optional"),
            FieldMut::Int(s) => f.debug_tuple("Int").field(s).finish(),
            FieldMut::Uint(s) => f.debug_tuple("Uint").field(s).finish(),
            FieldMut::Float(s) => f.debug_tuple("Float").field(s).finish(),
            FieldMut::Text(s) => f.debug_tuple("Text").field(s).finish(),
            FieldMut::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// A type that can occupy a field slot.
pub trait CsvField {
    fn field_mut(&mut self) -> FieldMut<'_>;
}

macro_rules! scalar_fields {
    ($kind:ident, $slot:ident { $($ty:ty => $variant:ident),* $(,)? }) => {
        $(
            impl CsvField for $ty {
                fn field_mut(&mut self) -> FieldMut<'_> {
                    FieldMut::$kind($slot::$variant(self))
                }
            }
        )*
    };
}

scalar_fields!(Int, IntSlot { isize => Isize, i8 => I8, i16 => I16, i32 => I32, i64 => I64 });
scalar_fields!(Uint, UintSlot { usize => Usize, u8 => U8, u16 => U16, u32 => U32, u64 => U64 });
scalar_fields!(Float, FloatSlot { f32 => F32, f64 => F64 });

impl CsvField for String {
    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Text(self)
    }
}

// Kinds with no text conversion: accepted as slots so arity stays positional,
// rejected when a row reaches them.
impl CsvField for bool {
    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Unsupported
    }
}

impl CsvField for char {
    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Unsupported
    }
}

impl<T> CsvField for Vec<T> {
    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Unsupported
    }
}

impl<T: CsvField + ?Sized> CsvField for Box<T> {
    fn field_mut(&mut self) -> FieldMut<'_> {
        (**self).field_mut()
    }
}

impl<T: CsvField + Default> OptionalSlot for Option<T> {
    fn get_or_default(&mut self) -> FieldMut<'_> {
        self.get_or_insert_with(T::default).field_mut()
    }
}

impl<T: CsvField + Default> CsvField for Option<T> {
    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Optional(self)
    }
}

/// One positional field of a record: its name (for errors) and, if writable, its value.
#[derive(Debug)]
pub struct FieldSlot<'a> {
    pub name: &'static str,
    pub target: Option<FieldMut<'a>>,
}

impl<'a> FieldSlot<'a> {
    pub fn new(name: &'static str, target: FieldMut<'a>) -> Self {
        FieldSlot {
            name,
            target: Some(target),
        }
    }

    /// A column the record occupies but does not accept writes for. Decoding a row
    /// into it fails with a not-settable error.
    pub fn read_only(name: &'static str) -> Self {
        FieldSlot { name, target: None }
    }

    pub fn is_settable(&self) -> bool {
        self.target.is_some()
    }
}

/// A struct that rows can be decoded into.
pub trait Record {
    /// The record's field slots in declaration order. Called once per decoded row.
    fn fields(&mut self) -> Vec<FieldSlot<'_>>;
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn fields(&mut self) -> Vec<FieldSlot<'_>> {
        (**self).fields()
    }
}

/// Declare a struct and implement [`Record`] for it, one slot per field in order.
///
/// Every field type must implement [`CsvField`].
///
/// ```
/// csvstruct::csv_record! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Row {
///         pub id: i64,
///         pub name: String,
///         pub score: Option<f32>,
///     }
/// }
///
/// let mut row = Row::default();
/// let mut dec = csvstruct::Decoder::new("7, ada, 9.5".as_bytes());
/// assert!(dec.decode(&mut row).unwrap());
/// assert_eq!(row, Row { id: 7, name: "ada".into(), score: Some(9.5) });
/// ```
#[macro_export]
macro_rules! csv_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            fn fields(&mut self) -> ::std::vec::Vec<$crate::FieldSlot<'_>> {
                ::std::vec![
                    $(
                        $crate::FieldSlot::new(
                            ::std::stringify!($field),
                            $crate::CsvField::field_mut(&mut self.$field),
                        ),
                    )*
                ]
            }
        }
    };
}

/// Implement [`CsvField`] for types that convert themselves through [`UnmarshalCsv`].
#[macro_export]
macro_rules! csv_field {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::CsvField for $ty {
                fn field_mut(&mut self) -> $crate::FieldMut<'_> {
                    $crate::FieldMut::Custom(self)
                }
            }
        )+
    };
}
