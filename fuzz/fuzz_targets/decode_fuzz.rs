//! Decoder fuzz target: feed arbitrary bytes through the CSV reader into a mixed record.
//! Decoding must not panic; every call returns Ok(true), Ok(false) or an error.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
csvstruct::csv_record! {
    #[derive(Default)]
    struct Mixed {
        a: i8,
        b: u64,
        c: f32,
        d: String,
        e: Option<Box<i32>>,
    }
}

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let trim = data.first().map_or(true, |b| b & 1 == 0);
    let options = csvstruct::ReaderOptions::default()
        .with_trim_leading_space(trim)
        .with_fields_per_record(csvstruct::FieldsPerRecord::Any);
    let mut dec = csvstruct::Decoder::with_options(data, options);
    let mut row = Mixed::default();
    // Each call consumes at least one line, so this terminates.
    loop {
        match dec.decode(&mut row) {
            Ok(true) => {}
            Ok(false) => break,
            Err(csvstruct::DecodeError::Read(csvstruct::ReadError::Io(_))) => break,
            Err(_) => {}
        }
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
