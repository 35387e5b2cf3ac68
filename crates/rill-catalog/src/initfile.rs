//! The init data file: reader and canonical contents.
//!
//! The init data file is UTF-8 text with one statement per line:
//!
//! - `table <tabid> (<typid> <typparam>)*` switches the reader to that
//!   table's schema;
//! - `data <token>*` is one record of the active table, one token per
//!   field.
//!
//! Tokens are whitespace-separated barewords, or double-quoted strings in
//! which `\"` and `\\` are the only recognized escapes. The decoded length
//! of a quoted token is bounded by
//! [`INIT_TOKEN_LIMIT`](rill_common::INIT_TOKEN_LIMIT).
//!
//! The canonical init data enumerating the whole bootstrap catalog is
//! rendered by [`init_file_contents`], so creating a database does not
//! require an external data file.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;

use rill_common::constants::INIT_TOKEN_LIMIT;
use rill_common::types::{Datum, FieldId, NullableDatumRef, Oid};

use crate::bootstrap::BootstrapCatCache;
use crate::fmgr::{function_call_with_typparam, FunctionPtr};
use crate::schema::Schema;
use crate::systables::{bootstrap_data, initoids};

/// The kind of the last line consumed by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitLine {
    /// End of input. Sticky.
    Eof,
    /// A parse failure. Sticky; callers stop consuming.
    Error,
    /// A `table` line switched the active schema.
    Table,
    /// A `data` line produced an encoded record.
    Data,
}

/// A streaming reader over an init data file.
pub struct InitDataFileReader<'a, R> {
    input: R,
    catcache: &'a BootstrapCatCache,
    lineno: usize,
    last_state: InitLine,
    last_error: Option<String>,
    tabid: Oid,
    buf: Vec<u8>,
    schema: Option<Schema>,
    typ_infuncs: HashMap<Oid, FunctionPtr>,
}

impl<'a, R: BufRead> InitDataFileReader<'a, R> {
    /// Creates a reader over `input`, resolving types and input functions
    /// through the bootstrap catalog.
    pub fn new(input: R, catcache: &'a BootstrapCatCache) -> Self {
        Self {
            input,
            catcache,
            lineno: 0,
            // Any good state allows the reader to continue.
            last_state: InitLine::Table,
            last_error: None,
            tabid: Oid::INVALID,
            buf: Vec::new(),
            schema: None,
            typ_infuncs: HashMap::new(),
        }
    }

    /// Number of the last line consumed, 1-based.
    #[inline]
    #[must_use]
    pub fn last_line_no(&self) -> usize {
        self.lineno
    }

    /// OID of the table the reader is currently inserting into.
    #[inline]
    #[must_use]
    pub fn last_tabid(&self) -> Oid {
        self.tabid
    }

    /// The schema of the active table, once a `table` line has been seen.
    #[inline]
    #[must_use]
    pub fn last_schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// The failure message, once the reader has entered the error state.
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The encoded record of the last `data` line. Valid until the next
    /// [`InitDataFileReader::next`] call.
    #[inline]
    #[must_use]
    pub fn record_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn fail(&mut self, message: impl Into<String>) -> InitLine {
        self.last_error = Some(message.into());
        self.last_state = InitLine::Error;
        InitLine::Error
    }

    /// Consumes the next line. On [`InitLine::Data`] the encoded record is
    /// available through [`InitDataFileReader::record_bytes`] until the
    /// next call.
    pub fn next(&mut self) -> InitLine {
        // Once in the eof or error state, stay there forever.
        if matches!(self.last_state, InitLine::Eof | InitLine::Error) {
            return self.last_state;
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => {
                self.last_state = InitLine::Eof;
                return InitLine::Eof;
            }
            Ok(_) => {}
            Err(e) => return self.fail(format!("read failed: {e}")),
        }
        self.lineno += 1;
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            return self.fail("empty line");
        }

        let mut pos = 0usize;
        let keyword = match next_token(line.as_bytes(), &mut pos) {
            Some(t) => t,
            None => return self.fail("missing statement keyword"),
        };

        match keyword.as_ref() {
            b"data" => self.next_data_line(line, pos),
            b"table" => self.next_table_line(line, pos),
            _ => self.fail("unknown init data statement"),
        }
    }

    fn next_data_line(&mut self, line: &str, mut pos: usize) -> InitLine {
        let Some(schema) = self.schema.take() else {
            return self.fail("data line before any table line");
        };

        let mut data: Vec<Datum<'static>> = Vec::with_capacity(schema.num_fields() as usize);
        let mut i: FieldId = 0;
        while pos != line.len() {
            if i == schema.num_fields() {
                self.schema = Some(schema);
                return self.fail("too many fields in data line");
            }
            let Some(token) = next_token(line.as_bytes(), &mut pos) else {
                self.schema = Some(schema);
                return self.fail("malformed token");
            };

            let input_text = Datum::from_varlen_bytes(&token);
            let typparam = schema.field_type_param(i);
            let typid = schema.field_type_id(i);
            let finfo = self.typ_infuncs[&typid];
            let args = [NullableDatumRef::from(&input_text)];
            let datum = match function_call_with_typparam(finfo, typparam, &args) {
                Ok(d) => d,
                Err(e) => {
                    self.schema = Some(schema);
                    return self.fail(format!("type input function failed: {e}"));
                }
            };
            if datum.is_null() {
                self.schema = Some(schema);
                return self.fail("type input function returned NULL");
            }
            data.push(datum);
            i += 1;
        }

        if i != schema.num_fields() {
            self.schema = Some(schema);
            return self.fail("too few fields in data line");
        }

        self.buf.clear();
        let res = schema.write_payload_datums(&data, &mut self.buf);
        self.schema = Some(schema);
        match res {
            Ok(_) => {
                self.last_state = InitLine::Data;
                InitLine::Data
            }
            Err(e) => self.fail(format!("cannot encode record: {e}")),
        }
    }

    fn next_table_line(&mut self, line: &str, mut pos: usize) -> InitLine {
        let Some(tabid) = next_int_token::<u32>(line.as_bytes(), &mut pos) else {
            return self.fail("table line without a table OID");
        };
        self.tabid = Oid::new(tabid);

        let mut typid = Vec::new();
        let mut typparam = Vec::new();
        while pos != line.len() {
            let Some(t) = next_int_token::<u32>(line.as_bytes(), &mut pos) else {
                return self.fail("malformed type OID");
            };
            typid.push(Oid::new(t));

            let Some(p) = next_int_token::<u64>(line.as_bytes(), &mut pos) else {
                return self.fail("malformed type parameter");
            };
            typparam.push(p);
        }

        // The stored catalog rows are never nullable.
        let nullable = vec![false; typid.len()];
        let mut schema = match Schema::create(&typid, &typparam, &nullable) {
            Ok(s) => s,
            Err(e) => return self.fail(format!("cannot create schema: {e}")),
        };
        if let Err(e) = schema.compute_layout(self.catcache) {
            return self.fail(format!("cannot compute schema layout: {e}"));
        }
        debug_assert!(schema.is_layout_computed());

        // Resolve all the type input functions once per type.
        for &t in &typid {
            if self.typ_infuncs.contains_key(&t) {
                continue;
            }
            let Some(typ) = self.catcache.find_type(t) else {
                return self.fail(format!("unknown type {t} in table line"));
            };
            let Some(finfo) = self.catcache.registry().find(typ.typinfunc) else {
                return self.fail(format!("type {t} has no input function"));
            };
            self.typ_infuncs.insert(t, finfo);
        }

        self.schema = Some(schema);
        self.last_state = InitLine::Table;
        InitLine::Table
    }
}

/// Scans the next token starting at `pos`, advancing `pos` past it and its
/// trailing separator.
///
/// Returns `None` when the input is exhausted or the token is malformed (an
/// unterminated quote, an unknown escape, a quote not followed by a space,
/// or a decoded quoted token longer than the parse limit).
fn next_token<'l>(line: &'l [u8], pos: &mut usize) -> Option<Cow<'l, [u8]>> {
    if *pos >= line.len() {
        return None;
    }

    let start = *pos;
    if line[start] == b'"' {
        // Quoted string literal, possibly with escapes. Borrow from the
        // line until the first escape forces a decode buffer.
        let mut decoded: Option<Vec<u8>> = None;
        let mut i = start + 1;
        let s = start + 1;
        while i < line.len() {
            match line[i] {
                b'"' => {
                    if i + 1 == line.len() {
                        *pos = i + 1;
                    } else if line[i + 1] == b' ' {
                        *pos = i + 2;
                    } else {
                        return None;
                    }
                    return match decoded {
                        Some(buf) => Some(Cow::Owned(buf)),
                        None => Some(Cow::Borrowed(&line[s..i])),
                    };
                }
                b'\\' => {
                    if i + 1 == line.len() {
                        return None;
                    }
                    if line[i + 1] != b'\\' && line[i + 1] != b'"' {
                        return None;
                    }
                    let buf = match decoded.as_mut() {
                        Some(buf) => buf,
                        None => {
                            if i - s >= INIT_TOKEN_LIMIT {
                                return None;
                            }
                            decoded = Some(line[s..i].to_vec());
                            decoded.as_mut().unwrap()
                        }
                    };
                    if buf.len() >= INIT_TOKEN_LIMIT {
                        return None;
                    }
                    buf.push(line[i + 1]);
                    i += 2;
                }
                c => {
                    if let Some(buf) = decoded.as_mut() {
                        if buf.len() >= INIT_TOKEN_LIMIT {
                            return None;
                        }
                        buf.push(c);
                    }
                    i += 1;
                }
            }
        }
        // Unterminated quote.
        None
    } else {
        // A plain literal without quotes.
        let mut i = start + 1;
        while i < line.len() && line[i] != b' ' {
            i += 1;
        }
        *pos = if i == line.len() { i } else { i + 1 };
        Some(Cow::Borrowed(&line[start..i]))
    }
}

fn next_int_token<T: std::str::FromStr>(line: &[u8], pos: &mut usize) -> Option<T> {
    let token = next_token(line, pos)?;
    std::str::from_utf8(&token).ok()?.parse().ok()
}

/// Renders a value as an init-file token, quoting when necessary.
fn quote_token(s: &str) -> String {
    if !s.is_empty() && !s.contains([' ', '"', '\\']) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn bool_token(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

fn push_line(out: &mut String, tokens: &[String]) {
    out.push_str("data ");
    out.push_str(&tokens.join(" "));
    out.push('\n');
}

fn push_table_line(out: &mut String, cat: &BootstrapCatCache, tabid: Oid) {
    let cols = cat.find_columns(tabid);
    let mut line = format!("table {tabid}");
    for c in &cols {
        line.push_str(&format!(" {} {}", c.coltypid, c.coltypparam));
    }
    line.push('\n');
    out.push_str(&line);
}

/// Renders the canonical init data file: the `table` declarations of all
/// systables followed by every bootstrap row. The first four blocks are
/// the bootstrap tables themselves, which is what makes the data
/// self-describing.
#[must_use]
pub fn init_file_contents(cat: &BootstrapCatCache) -> String {
    let mut out = String::new();

    push_table_line(&mut out, cat, initoids::TAB_TABLE);
    for t in bootstrap_data::tables() {
        push_line(
            &mut out,
            &[
                t.tabid.to_string(),
                bool_token(t.tabissys).to_string(),
                bool_token(t.tabisvarlen).to_string(),
                t.tabncols.to_string(),
                t.tabfid.as_u32().to_string(),
                quote_token(&t.tabname),
            ],
        );
    }

    push_table_line(&mut out, cat, initoids::TAB_TYPE);
    for t in bootstrap_data::types() {
        push_line(
            &mut out,
            &[
                t.typid.to_string(),
                t.typlen.to_string(),
                bool_token(t.typisvarlen).to_string(),
                bool_token(t.typbyref).to_string(),
                t.typalign.to_string(),
                t.typinfunc.to_string(),
                t.typoutfunc.to_string(),
                t.typlenfunc.to_string(),
                quote_token(&t.typname),
            ],
        );
    }

    push_table_line(&mut out, cat, initoids::TAB_COLUMN);
    for c in bootstrap_data::columns() {
        push_line(
            &mut out,
            &[
                c.coltabid.to_string(),
                c.colid.to_string(),
                c.coltypid.to_string(),
                c.coltypparam.to_string(),
                bool_token(c.colisnullable).to_string(),
                bool_token(c.colisarray).to_string(),
                quote_token(&c.colname),
            ],
        );
    }

    push_table_line(&mut out, cat, initoids::TAB_FUNCTION);
    for f in bootstrap_data::functions() {
        push_line(
            &mut out,
            &[
                f.funcid.to_string(),
                f.funcnargs.to_string(),
                f.funcrettypid.to_string(),
                quote_token(&f.funcname),
            ],
        );
    }

    push_table_line(&mut out, cat, initoids::TAB_FUNCTION_ARGS);
    for a in bootstrap_data::function_args() {
        push_line(
            &mut out,
            &[
                a.funcid.to_string(),
                a.funcargid.to_string(),
                a.funcargtypid.to_string(),
            ],
        );
    }

    push_table_line(&mut out, cat, initoids::TAB_INDEX);
    for i in bootstrap_data::indexes() {
        push_line(
            &mut out,
            &[
                i.idxid.to_string(),
                i.idxtabid.to_string(),
                i.idxtyp.as_u8().to_string(),
                bool_token(i.idxunique).to_string(),
                i.idxfid.as_u32().to_string(),
                quote_token(&i.idxname),
            ],
        );
    }

    push_table_line(&mut out, cat, initoids::TAB_INDEX_COLUMN);
    for ic in bootstrap_data::index_columns() {
        push_line(
            &mut out,
            &[
                ic.idxcolidxid.to_string(),
                ic.idxcolid.to_string(),
                ic.idxcoltabcolid.to_string(),
                ic.idxcolltfuncid.to_string(),
                ic.idxcoleqfuncid.to_string(),
            ],
        );
    }

    push_table_line(&mut out, cat, initoids::TAB_OPERATOR);
    for o in bootstrap_data::operators() {
        push_line(
            &mut out,
            &[
                o.oprtype.as_u8().to_string(),
                o.oproparg0typid.to_string(),
                o.oproparg1typid.to_string(),
                o.oprfuncid.to_string(),
            ],
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader_over<'a>(
        text: &str,
        cat: &'a BootstrapCatCache,
    ) -> InitDataFileReader<'a, Cursor<Vec<u8>>> {
        InitDataFileReader::new(Cursor::new(text.as_bytes().to_vec()), cat)
    }

    #[test]
    fn test_token_scanner() {
        let line = b"data 42 \"quoted token\" plain";
        let mut pos = 0;
        assert_eq!(next_token(line, &mut pos).unwrap().as_ref(), b"data");
        assert_eq!(next_token(line, &mut pos).unwrap().as_ref(), b"42");
        assert_eq!(
            next_token(line, &mut pos).unwrap().as_ref(),
            b"quoted token"
        );
        assert_eq!(next_token(line, &mut pos).unwrap().as_ref(), b"plain");
        assert!(next_token(line, &mut pos).is_none());
    }

    #[test]
    fn test_token_escapes() {
        let line = br#""a\"b\\c""#;
        let mut pos = 0;
        assert_eq!(next_token(line, &mut pos).unwrap().as_ref(), br#"a"b\c"#);

        // Unknown escapes and unterminated quotes are malformed.
        let mut pos = 0;
        assert!(next_token(br#""a\nb""#, &mut pos).is_none());
        let mut pos = 0;
        assert!(next_token(br#""abc"#, &mut pos).is_none());
        // A closing quote must be followed by a separator.
        let mut pos = 0;
        assert!(next_token(br#""abc"x"#, &mut pos).is_none());
    }

    #[test]
    fn test_quote_token_roundtrip() {
        for s in ["plain", "with space", "with\"quote", "back\\slash", ""] {
            let rendered = quote_token(s);
            let mut pos = 0;
            let token = next_token(rendered.as_bytes(), &mut pos).unwrap();
            assert_eq!(token.as_ref(), s.as_bytes(), "token {rendered:?}");
        }
    }

    #[test]
    fn test_simple_table_and_data() {
        let cat = BootstrapCatCache::new().unwrap();
        // A two-column table: (INT4, VARCHAR(10)).
        let text = format!(
            "table 21000 {} 0 {} 10\ndata 42 \"hello world\"\n",
            initoids::TYP_INT4,
            initoids::TYP_VARCHAR
        );
        let mut reader = reader_over(&text, &cat);

        assert_eq!(reader.next(), InitLine::Table);
        assert_eq!(reader.last_tabid(), Oid::new(21000));
        let schema = reader.last_schema().unwrap();
        assert_eq!(schema.num_fields(), 2);

        assert_eq!(reader.next(), InitLine::Data);
        let schema = reader.last_schema().unwrap().clone();
        let rec = reader.record_bytes();
        assert_eq!(rec.len() % 8, 0);
        assert_eq!(schema.get_field(0, rec).get_i32(), 42);
        assert_eq!(schema.get_field(1, rec).varlen_bytes(), b"hello world");

        assert_eq!(reader.next(), InitLine::Eof);
        assert_eq!(reader.next(), InitLine::Eof);
    }

    #[test]
    fn test_error_state_is_sticky() {
        let cat = BootstrapCatCache::new().unwrap();
        let text = format!(
            "table 21000 {} 0\ndata not_an_int\ndata 7\n",
            initoids::TYP_INT4
        );
        let mut reader = reader_over(&text, &cat);

        assert_eq!(reader.next(), InitLine::Table);
        assert_eq!(reader.next(), InitLine::Error);
        assert!(reader.last_error().is_some());
        // The good line after the failure is never consumed.
        assert_eq!(reader.next(), InitLine::Error);
    }

    #[test]
    fn test_field_count_mismatch_is_error() {
        let cat = BootstrapCatCache::new().unwrap();
        let text = format!("table 21000 {} 0 {} 0\ndata 7\n", initoids::TYP_INT4, initoids::TYP_INT4);
        let mut reader = reader_over(&text, &cat);
        assert_eq!(reader.next(), InitLine::Table);
        assert_eq!(reader.next(), InitLine::Error);
    }

    #[test]
    fn test_data_before_table_is_error() {
        let cat = BootstrapCatCache::new().unwrap();
        let mut reader = reader_over("data 1\n", &cat);
        assert_eq!(reader.next(), InitLine::Error);
    }

    #[test]
    fn test_canonical_init_data_parses_fully() {
        let cat = BootstrapCatCache::new().unwrap();
        let text = init_file_contents(&cat);
        let mut reader = reader_over(&text, &cat);

        let mut tables = 0;
        let mut rows = 0;
        loop {
            match reader.next() {
                InitLine::Table => tables += 1,
                InitLine::Data => rows += 1,
                InitLine::Eof => break,
                InitLine::Error => panic!(
                    "canonical init data failed at line {}: {:?}",
                    reader.last_line_no(),
                    reader.last_error()
                ),
            }
        }
        assert_eq!(tables, initoids::ALL_SYSTABLES.len());
        // Eight Table rows plus all the type, column and function rows.
        assert!(rows > 100);
    }
}
