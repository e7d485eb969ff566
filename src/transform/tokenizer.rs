// ABOUTME: Statement tokenizer for INSERT statements in SQL dump text
// ABOUTME: Quote- and parenthesis-aware lexer yielding statement spans and cell values

use crate::error::StatementError;
use crate::transform::mapper::Cell;
use std::ops::Range;

/// A bulk insert found in dump text
#[derive(Debug, Clone, PartialEq)]
pub struct Statement<'a> {
    /// Byte range of the statement in the scanned text, `;` included
    pub span: Range<usize>,
    pub text: &'a str,
    /// `INSERT INTO <table> [(<columns>)] VALUES` plus trailing whitespace, verbatim
    pub preamble: &'a str,
    pub table: &'a str,
    /// Column names declared by the statement, unquoted
    pub columns: Option<Vec<String>>,
    pub tuples: Vec<Tuple<'a>>,
}

/// One parenthesized row of values
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple<'a> {
    pub text: &'a str,
    pub cells: Vec<Cell>,
}

/// Result of scanning a document: statements that parsed, and `INSERT`
/// keywords that did not start a readable statement
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Statement(Statement<'a>),
    Rejected {
        offset: usize,
        error: StatementError,
    },
}

/// Find every well-formed `INSERT` statement in `document`
pub fn find_statements(document: &str) -> Vec<Statement<'_>> {
    scan(document)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Statement(statement) => Some(statement),
            Segment::Rejected { .. } => None,
        })
        .collect()
}

/// Walk `document` once, skipping comments, quoted text, dollar-quoted
/// bodies and `COPY ... FROM stdin` data, and parse each `INSERT` met
/// at the top level.
///
/// An `INSERT` that fails to parse is reported and scanning resumes right
/// after the keyword, so its text stays untouched in any rewrite.
pub fn scan(document: &str) -> Vec<Segment<'_>> {
    let bytes = document.as_bytes();
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];
        pos = match b {
            b'-' if bytes.get(pos + 1) == Some(&b'-') => line_end(bytes, pos),
            b'/' if bytes.get(pos + 1) == Some(&b'*') => block_comment_end(bytes, pos),
            b'\'' | b'"' => quoted_end(bytes, pos, b),
            b'E' | b'e'
                if bytes.get(pos + 1) == Some(&b'\'') && !preceded_by_ident(bytes, pos) =>
            {
                escape_string_end(bytes, pos + 1)
            }
            b'$' if !preceded_by_ident(bytes, pos) => dollar_quoted_end(document, pos),
            b'I' | b'i' if at_keyword(bytes, pos, b"INSERT") => {
                match parse_insert(document, pos) {
                    Ok(statement) => {
                        let end = statement.span.end;
                        segments.push(Segment::Statement(statement));
                        end
                    }
                    Err(error) => {
                        tracing::debug!("Skipping unreadable INSERT at byte {}: {}", pos, error);
                        segments.push(Segment::Rejected { offset: pos, error });
                        pos + "INSERT".len()
                    }
                }
            }
            b'C' | b'c' if at_keyword(bytes, pos, b"COPY") => copy_end(document, pos),
            _ => pos + 1,
        };
    }

    segments
}

/// Parse `text` as exactly one statement, surrounding whitespace allowed
pub fn parse_statement(text: &str) -> Result<Statement<'_>, StatementError> {
    let start = text.len() - text.trim_start().len();
    let statement = parse_insert(text, start)?;

    let rest = &text[statement.span.end..];
    if !rest.trim().is_empty() {
        let offset = statement.span.end + (rest.len() - rest.trim_start().len());
        return Err(StatementError::TrailingText(offset));
    }

    Ok(statement)
}

fn parse_insert(src: &str, start: usize) -> Result<Statement<'_>, StatementError> {
    let mut c = Cursor::new(src, start);

    c.keyword("INSERT")?;
    c.skip_trivia();
    c.keyword("INTO")?;
    c.skip_trivia();

    let table_start = c.pos;
    c.qualified_name()?;
    let table = &src[table_start..c.pos];
    c.skip_trivia();

    let columns = if c.peek() == Some(b'(') {
        let names = c.column_list()?;
        c.skip_trivia();
        Some(names)
    } else {
        None
    };

    c.keyword("VALUES")?;
    c.skip_trivia();
    let preamble = &src[start..c.pos];

    let mut tuples = Vec::new();
    loop {
        tuples.push(c.tuple()?);
        c.skip_trivia();
        if c.peek() == Some(b',') {
            c.pos += 1;
            c.skip_trivia();
        } else {
            break;
        }
    }

    match c.peek() {
        Some(b';') => c.pos += 1,
        Some(_) => return Err(c.unexpected("',' or ';'")),
        None => return Err(StatementError::UnexpectedEnd("';'")),
    }

    Ok(Statement {
        span: start..c.pos,
        text: &src[start..c.pos],
        preamble,
        table,
        columns,
        tuples,
    })
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn unexpected(&self, expected: &'static str) -> StatementError {
        match self.src.get(self.pos..).and_then(|s| s.chars().next()) {
            Some(found) => StatementError::Unexpected {
                expected,
                found,
                offset: self.pos,
            },
            None => StatementError::UnexpectedEnd(expected),
        }
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), StatementError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn keyword(&mut self, keyword: &'static str) -> Result<(), StatementError> {
        if at_keyword(self.bytes(), self.pos, keyword.as_bytes()) {
            self.pos += keyword.len();
            Ok(())
        } else {
            Err(StatementError::ExpectedKeyword {
                keyword,
                offset: self.pos,
            })
        }
    }

    /// Whitespace and comments
    fn skip_trivia(&mut self) {
        let bytes = self.bytes();
        loop {
            match bytes.get(self.pos) {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'-') if bytes.get(self.pos + 1) == Some(&b'-') => {
                    self.pos = line_end(bytes, self.pos)
                }
                Some(b'/') if bytes.get(self.pos + 1) == Some(&b'*') => {
                    self.pos = block_comment_end(bytes, self.pos)
                }
                _ => break,
            }
        }
    }

    fn identifier(&mut self) -> Result<String, StatementError> {
        if self.peek() == Some(b'"') {
            return self.quoted(b'"');
        }

        let start = self.pos;
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected("an identifier"));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn qualified_name(&mut self) -> Result<(), StatementError> {
        self.identifier()?;
        while self.peek() == Some(b'.') {
            self.pos += 1;
            self.identifier()?;
        }
        Ok(())
    }

    fn column_list(&mut self) -> Result<Vec<String>, StatementError> {
        self.expect(b'(', "'('")?;
        let mut names = Vec::new();
        loop {
            self.skip_trivia();
            names.push(self.identifier()?);
            self.skip_trivia();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(names);
                }
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
    }

    fn tuple(&mut self) -> Result<Tuple<'a>, StatementError> {
        let start = self.pos;
        self.expect(b'(', "'('")?;
        self.skip_trivia();
        if self.peek() == Some(b')') {
            return Err(StatementError::EmptyTuple(start));
        }

        let mut cells = Vec::new();
        loop {
            self.skip_trivia();
            cells.push(self.cell()?);
            self.skip_trivia();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }

        Ok(Tuple {
            text: &self.src[start..self.pos],
            cells,
        })
    }

    fn cell(&mut self) -> Result<Cell, StatementError> {
        let bytes = self.bytes();
        match self.peek() {
            None => Err(StatementError::UnexpectedEnd("a value")),
            Some(q @ (b'\'' | b'"')) => self.quoted(q).map(Cell::Text),
            Some(b'E' | b'e') if bytes.get(self.pos + 1) == Some(&b'\'') => {
                self.escape_string().map(Cell::Text)
            }
            Some(_) => self.bare(),
        }
    }

    /// `'...'` or `"..."`, the quote doubled inside to escape it
    fn quoted(&mut self, quote: u8) -> Result<String, StatementError> {
        let start = self.pos;
        let end = quoted_end(self.bytes(), start, quote);
        if end > self.src.len() {
            return Err(StatementError::UnterminatedLiteral(start));
        }

        self.pos = end;
        let body = &self.src[start + 1..end - 1];
        let q = quote as char;
        Ok(body.replace(&format!("{q}{q}"), &q.to_string()))
    }

    /// `E'...'` with backslash escapes
    fn escape_string(&mut self) -> Result<String, StatementError> {
        let start = self.pos;
        let body_start = start + 2;
        let rest = &self.src[body_start..];
        let mut out = String::new();
        let mut chars = rest.char_indices();

        while let Some((i, ch)) = chars.next() {
            match ch {
                '\\' => {
                    let Some((_, escaped)) = chars.next() else {
                        break;
                    };
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        'b' => '\u{8}',
                        'f' => '\u{c}',
                        other => other,
                    });
                }
                '\'' if rest.as_bytes().get(i + 1) == Some(&b'\'') => {
                    chars.next();
                    out.push('\'');
                }
                '\'' => {
                    self.pos = body_start + i + 1;
                    return Ok(out);
                }
                other => out.push(other),
            }
        }

        Err(StatementError::UnterminatedLiteral(start))
    }

    /// Unquoted literal: number, boolean keyword or `NULL`
    fn bare(&mut self) -> Result<Cell, StatementError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b',' | b'(' | b')' | b';' | b'\'' | b'"') || b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected("a value"));
        }

        let token = &self.src[start..self.pos];
        if token.eq_ignore_ascii_case("NULL") {
            Ok(Cell::Null)
        } else {
            Ok(Cell::Text(token.to_string()))
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

fn preceded_by_ident(bytes: &[u8], pos: usize) -> bool {
    pos > 0 && is_ident_byte(bytes[pos - 1])
}

/// Case-insensitive keyword match on identifier boundaries
fn at_keyword(bytes: &[u8], pos: usize, keyword: &[u8]) -> bool {
    let end = pos + keyword.len();
    end <= bytes.len()
        && bytes[pos..end].eq_ignore_ascii_case(keyword)
        && !preceded_by_ident(bytes, pos)
        && !bytes.get(end).is_some_and(|b| is_ident_byte(*b))
}

fn line_end(bytes: &[u8], pos: usize) -> usize {
    bytes[pos..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |i| pos + i + 1)
}

fn block_comment_end(bytes: &[u8], pos: usize) -> usize {
    bytes[pos + 2..]
        .windows(2)
        .position(|w| w == b"*/")
        .map_or(bytes.len(), |i| pos + 2 + i + 2)
}

/// Index just past the closing quote; `bytes.len() + 1` when unterminated
fn quoted_end(bytes: &[u8], pos: usize, quote: u8) -> usize {
    let mut i = pos + 1;
    loop {
        match bytes.get(i) {
            None => return bytes.len() + 1,
            Some(&b) if b == quote => {
                if bytes.get(i + 1) == Some(&quote) {
                    i += 2;
                } else {
                    return i + 1;
                }
            }
            Some(_) => i += 1,
        }
    }
}

fn escape_string_end(bytes: &[u8], quote_pos: usize) -> usize {
    let mut i = quote_pos + 1;
    while let Some(&b) = bytes.get(i) {
        match b {
            b'\\' => i += 2,
            b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
            b'\'' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// `$tag$ ... $tag$` bodies; a lone `$` (e.g. `$1`) is skipped as one byte
fn dollar_quoted_end(document: &str, pos: usize) -> usize {
    let bytes = document.as_bytes();
    let mut i = pos + 1;
    while bytes
        .get(i)
        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
    {
        i += 1;
    }
    let starts_with_digit = bytes.get(pos + 1).is_some_and(|b| b.is_ascii_digit());
    if bytes.get(i) != Some(&b'$') || starts_with_digit {
        return pos + 1;
    }

    let tag = &document[pos..=i];
    let body = i + 1;
    document[body..]
        .find(tag)
        .map_or(document.len(), |found| body + found + tag.len())
}

/// Skip `COPY ... FROM stdin;` and its data block up to the `\.` terminator
fn copy_end(document: &str, pos: usize) -> usize {
    let rest = &document[pos..];
    let Some(semi) = rest.find(';') else {
        return document.len();
    };

    let header = rest[..semi].trim_end().to_ascii_lowercase();
    if !header.ends_with("from stdin") {
        return pos + "COPY".len();
    }

    let data_start = pos + semi + 1;
    document[data_start..]
        .find("\n\\.")
        .map_or(document.len(), |i| data_start + i + 3)
}
