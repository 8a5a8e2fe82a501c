//! CSV tokenizer: turns a byte stream into rows of raw text cells using a PEST grammar.
//!
//! Records are comma-separated, one per line (`\n` or `\r\n`). Double-quoted fields may
//! contain commas, line breaks and doubled quotes (`""`). A quoted field that spans lines
//! keeps reading physical lines until its quotes balance.

use crate::source::{ReadError, RecordSource};
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::io::{BufRead, BufReader, Read};
use tracing::{debug, trace};

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct CsvParser;

/// How many fields each record must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldsPerRecord {
    /// No check.
    Any,
    /// The first record sets the count; every later record must match it.
    #[default]
    FirstRecord,
    /// Every record must have exactly this many fields.
    Exact(usize),
}

/// Tokenizer options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Drop whitespace before each field, including before an opening quote.
    pub trim_leading_space: bool,
    /// Lines starting with this character are skipped.
    pub comment: Option<char>,
    pub fields_per_record: FieldsPerRecord,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            trim_leading_space: true,
            comment: None,
            fields_per_record: FieldsPerRecord::FirstRecord,
        }
    }
}

impl ReaderOptions {
    pub fn with_trim_leading_space(mut self, trim: bool) -> Self {
        self.trim_leading_space = trim;
        self
    }

    pub fn with_comment(mut self, comment: Option<char>) -> Self {
        self.comment = comment;
        self
    }

    pub fn with_fields_per_record(mut self, policy: FieldsPerRecord) -> Self {
        self.fields_per_record = policy;
        self
    }
}

/// Streaming CSV reader.
#[derive(Debug)]
pub struct Reader<R> {
    input: BufReader<R>,
    options: ReaderOptions,
    /// Physical lines consumed so far.
    line: u64,
    /// Field count locked in by the first record under [`FieldsPerRecord::FirstRecord`].
    expected_fields: Option<usize>,
    physical: String,
    logical: String,
}

impl<R: Read> Reader<R> {
    pub fn new(input: R) -> Self {
        Self::with_options(input, ReaderOptions::default())
    }

    pub fn with_options(input: R, options: ReaderOptions) -> Self {
        Reader {
            input: BufReader::new(input),
            options,
            line: 0,
            expected_fields: None,
            physical: String::new(),
            logical: String::new(),
        }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Number of physical lines read so far.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }

    /// Read one physical line into `self.physical`. Returns false at end of input.
    fn next_physical(&mut self) -> Result<bool, ReadError> {
        self.physical.clear();
        if self.input.read_line(&mut self.physical)? == 0 {
            return Ok(false);
        }
        self.line += 1;
        Ok(true)
    }

    /// Assemble the next logical record into `self.logical`, skipping blank and comment lines.
    /// Returns the line number the record starts on, or `None` at end of input.
    fn next_logical(&mut self) -> Result<Option<u64>, ReadError> {
        self.logical.clear();
        loop {
            if !self.next_physical()? {
                return Ok(None);
            }
            let text = strip_terminator(&self.physical);
            if text.is_empty() {
                continue;
            }
            if let Some(c) = self.options.comment {
                if text.starts_with(c) {
                    debug!(line = self.line, "skipping comment line");
                    continue;
                }
            }
            self.logical.push_str(text);
            break;
        }
        let start = self.line;
        let trim = self.options.trim_leading_space;
        let mut in_quotes = ends_in_quotes(&self.logical, trim, false);
        while in_quotes {
            if !self.next_physical()? {
                break;
            }
            let text = strip_terminator(&self.physical);
            in_quotes = ends_in_quotes(text, trim, true);
            self.logical.push('\n');
            self.logical.push_str(text);
        }
        Ok(Some(start))
    }

    fn check_field_count(&mut self, line: u64, got: usize) -> Result<(), ReadError> {
        let expected = match self.options.fields_per_record {
            FieldsPerRecord::Any => return Ok(()),
            FieldsPerRecord::Exact(n) => n,
            FieldsPerRecord::FirstRecord => match self.expected_fields {
                Some(n) => n,
                None => {
                    debug!(line, fields = got, "field count set by first record");
                    self.expected_fields = Some(got);
                    return Ok(());
                }
            },
        };
        if expected != got {
            return Err(ReadError::FieldCount { line, expected, got });
        }
        Ok(())
    }
}

impl<R: Read> RecordSource for Reader<R> {
    fn read_record(&mut self, cells: &mut Vec<String>) -> Result<bool, ReadError> {
        cells.clear();
        let start = match self.next_logical()? {
            Some(line) => line,
            None => return Ok(false),
        };
        split_record(&self.logical, self.options.trim_leading_space, start, cells)?;
        self.check_field_count(start, cells.len())?;
        trace!(line = start, fields = cells.len(), "read record");
        Ok(true)
    }
}

/// Tokenize one logical record into `cells`. Syntax errors report `start_line`.
pub fn split_record(
    text: &str,
    trim_leading_space: bool,
    start_line: u64,
    cells: &mut Vec<String>,
) -> Result<(), ReadError> {
    let rule = if trim_leading_space {
        Rule::record_trimmed
    } else {
        Rule::record
    };
    let pairs = CsvParser::parse(rule, text).map_err(|e| syntax_error(start_line, &e))?;
    for pair in pairs.flatten() {
        match pair.as_rule() {
            Rule::bare => cells.push(pair.as_str().to_string()),
            Rule::quoted_text => cells.push(pair.as_str().replace("\"\"", "\"")),
            _ => {}
        }
    }
    Ok(())
}

fn syntax_error(start_line: u64, e: &pest::error::Error<Rule>) -> ReadError {
    let column = match e.line_col {
        pest::error::LineColLocation::Pos((_, c)) => c,
        pest::error::LineColLocation::Span((_, c), _) => c,
    };
    let message = match &e.variant {
        pest::error::ErrorVariant::CustomError { message } => message.clone(),
        _ => format!("bare or unterminated quote in field (near column {column})"),
    };
    ReadError::Syntax {
        line: start_line,
        message,
    }
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Whether `line` ends inside a quoted field. A quote only opens a field when it is the
/// field's first character (after leading whitespace, when trimming); quotes elsewhere in
/// an unquoted field are left for the grammar to reject.
fn ends_in_quotes(line: &str, trim: bool, mut in_quotes: bool) -> bool {
    let mut field_start = !in_quotes;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
        } else if c == ',' {
            field_start = true;
        } else if field_start && c == '"' {
            in_quotes = true;
            field_start = false;
        } else if !(field_start && trim && c.is_whitespace()) {
            field_start = false;
        }
    }
    in_quotes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str, trim: bool) -> Result<Vec<String>, ReadError> {
        let mut cells = Vec::new();
        split_record(text, trim, 1, &mut cells)?;
        Ok(cells)
    }

    fn read_all(input: &str, options: ReaderOptions) -> Vec<Result<Vec<String>, String>> {
        let mut reader = Reader::with_options(input.as_bytes(), options);
        let mut out = Vec::new();
        loop {
            let mut cells = Vec::new();
            match reader.read_record(&mut cells) {
                Ok(true) => out.push(Ok(cells)),
                Ok(false) => break,
                Err(e) => out.push(Err(e.to_string())),
            }
        }
        out
    }

    #[test]
    fn test_split_plain() {
        assert_eq!(split("a,b,c", false).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_empty_fields() {
        assert_eq!(split(",,", false).unwrap(), vec!["", "", ""]);
        assert_eq!(split("x", false).unwrap(), vec!["x"]);
    }

    #[test]
    fn test_split_keeps_spaces_without_trim() {
        assert_eq!(split("1, 2 ,3", false).unwrap(), vec!["1", " 2 ", "3"]);
    }

    #[test]
    fn test_split_trims_leading_only() {
        assert_eq!(split("1,  2 ,\t3", true).unwrap(), vec!["1", "2 ", "3"]);
    }

    #[test]
    fn test_split_quoted() {
        assert_eq!(
            split(r#""a,b","say ""hi""","""#, false).unwrap(),
            vec!["a,b", r#"say "hi""#, ""]
        );
    }

    #[test]
    fn test_split_quoted_after_space_needs_trim() {
        assert_eq!(split(r#"1, "x""#, true).unwrap(), vec!["1", "x"]);
        assert!(split(r#"1, "x""#, false).is_err());
    }

    #[test]
    fn test_split_bare_quote_is_error() {
        match split(r#"a"b,c"#, false) {
            Err(ReadError::Syntax { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_split_text_after_closing_quote_is_error() {
        assert!(split(r#""a"b,c"#, false).is_err());
    }

    #[test]
    fn test_reader_skips_blank_lines_and_handles_crlf() {
        let got = read_all("a,b\r\n\r\n\nc,d\n", ReaderOptions::default());
        assert_eq!(
            got,
            vec![
                Ok(vec!["a".to_string(), "b".to_string()]),
                Ok(vec!["c".to_string(), "d".to_string()]),
            ]
        );
    }

    #[test]
    fn test_reader_multiline_quoted_field() {
        let mut reader = Reader::new("1,\"two\r\nlines\",3\n4,5,6".as_bytes());
        let mut cells = Vec::new();
        assert!(reader.read_record(&mut cells).unwrap());
        assert_eq!(cells, vec!["1", "two\nlines", "3"]);
        assert_eq!(reader.line(), 2);
        assert!(reader.read_record(&mut cells).unwrap());
        assert_eq!(cells, vec!["4", "5", "6"]);
        assert!(!reader.read_record(&mut cells).unwrap());
    }

    #[test]
    fn test_reader_unterminated_quote_reports_start_line() {
        let mut reader = Reader::new("a,b\nc,\"open\nstill open\n".as_bytes());
        let mut cells = Vec::new();
        assert!(reader.read_record(&mut cells).unwrap());
        match reader.read_record(&mut cells) {
            Err(ReadError::Syntax { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {other:?}"),
        }
        assert!(!reader.read_record(&mut cells).unwrap());
    }

    #[test]
    fn test_reader_comment_lines() {
        let options = ReaderOptions::default().with_comment(Some('#'));
        let got = read_all("# header\n1,2\n#x,y\n3,4\n", options);
        assert_eq!(got.len(), 2);
        assert_eq!(got[1], Ok(vec!["3".to_string(), "4".to_string()]));
    }

    #[test]
    fn test_reader_first_record_sets_field_count() {
        let got = read_all("1,2\n3\n4,5\n", ReaderOptions::default());
        assert_eq!(got[0], Ok(vec!["1".to_string(), "2".to_string()]));
        assert_eq!(
            got[1],
            Err("record on line 2: wrong number of fields: expected 2, got 1".to_string())
        );
        assert_eq!(got[2], Ok(vec!["4".to_string(), "5".to_string()]));
    }

    #[test]
    fn test_reader_any_field_count() {
        let options = ReaderOptions::default().with_fields_per_record(FieldsPerRecord::Any);
        let got = read_all("1,2\n3\n", options);
        assert!(got.iter().all(Result::is_ok));
    }

    #[test]
    fn test_reader_exact_field_count() {
        let options = ReaderOptions::default().with_fields_per_record(FieldsPerRecord::Exact(3));
        let got = read_all("1,2,3\n1,2\n", options);
        assert!(got[0].is_ok());
        assert!(got[1].is_err());
    }

    #[test]
    fn test_reader_invalid_utf8_is_io_error() {
        let mut reader = Reader::new(&b"ok\n\xff\xfe\n"[..]);
        let mut cells = Vec::new();
        assert!(reader.read_record(&mut cells).unwrap());
        assert!(matches!(reader.read_record(&mut cells), Err(ReadError::Io(_))));
    }

    #[test]
    fn test_bare_quote_line_does_not_swallow_later_rows() {
        let options = ReaderOptions::default().with_fields_per_record(FieldsPerRecord::Any);
        let got = read_all("a\"b,c\nd,e\nf,g\n", options);
        assert_eq!(got.len(), 3);
        assert!(got[0].as_ref().unwrap_err().starts_with("parse error on line 1"));
        assert_eq!(got[1], Ok(vec!["d".to_string(), "e".to_string()]));
        assert_eq!(got[2], Ok(vec!["f".to_string(), "g".to_string()]));
    }

    #[test]
    fn test_malformed_middle_line_then_valid_rows() {
        let got = read_all("1,2\n3,x\"y\"\n5,6\n7,8\n", ReaderOptions::default());
        assert_eq!(got.len(), 4);
        assert_eq!(got[0], Ok(vec!["1".to_string(), "2".to_string()]));
        assert!(got[1].as_ref().unwrap_err().starts_with("parse error on line 2"));
        assert_eq!(got[2], Ok(vec!["5".to_string(), "6".to_string()]));
        assert_eq!(got[3], Ok(vec!["7".to_string(), "8".to_string()]));
    }

    #[test]
    fn test_text_after_closing_quote_stays_on_its_line() {
        let got = read_all("\"a\"b,c\nd,e\n", ReaderOptions::default());
        assert_eq!(got.len(), 2);
        assert!(got[0].is_err());
        assert_eq!(got[1], Ok(vec!["d".to_string(), "e".to_string()]));
    }

    #[test]
    fn test_ends_in_quotes() {
        assert!(!ends_in_quotes(r#"a"b,c"#, true, false));
        assert!(ends_in_quotes(r#"a,"open"#, true, false));
        assert!(ends_in_quotes(r#"a, "open"#, true, false));
        assert!(!ends_in_quotes(r#"a, "open"#, false, false));
        assert!(!ends_in_quotes(r#""x ""y"" z",1"#, true, false));
        assert!(ends_in_quotes(r#"still "" inside"#, true, true));
        assert!(!ends_in_quotes(r#"closed",2"#, true, true));
    }
}
