//! Module `scanner` implements a one‑pass, streaming UTF‑8 lexer for the Lox language.
//!
//! It transforms a source string into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a `FusedIterator`,
//! it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input text.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, LoxError>` on each `.next()`, where `Ok(token)` is a scanned token
//!   and `Err` reports a lexing error with line and column.  An error never stops the scan:
//!   the following call resumes right after the offending input.
//!
//! - `tokenize(src) -> (Vec<Token>, Vec<LoxError>)`
//!   Drain a scanner, splitting tokens from the lexical error side channel.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`.
//! - Two‑character operators (maximal munch): `!=`, `==`, `<=`, `>=`.
//! - String literals: `"` … `"` on a single line, no escapes.  A string that reaches a
//!   newline or EOF before its closing quote is reported at the line where it began.
//! - Numeric literals: integer and optional fractional part; a `.` only belongs to the
//!   number when a digit follows it.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a perfect‑hash `KEYWORDS` map.
//! - Errors: any unexpected character yields `LoxError::lex(line, column, message)`.
//!
//! # Performance Notes
//!
//! - Bulk comment and string skipping via `memchr`.
//! - `#[inline(always)]` on hot path helpers.
//!
//! # Example
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let mut scanner = Scanner::new("print 123; // example");
//! for result in &mut scanner {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("Lex error: {}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr2};
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    source: &'a str,            // entire source text
    src: &'a [u8],              // same text, byte view for the hot paths
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    col_mark: usize,            // byte index up to which `col` has been counted
    col: usize,                 // 1‑based column at `col_mark`
    start_line: usize,          // line of the current lexeme's first byte
    start_column: usize,        // column of the current lexeme's first char
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
    finished: bool,             // EOF already emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `source`.
    #[inline]
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            src: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            col_mark: 0,
            col: 1,
            start_line: 1,
            start_column: 1,
            pending: None,
            finished: false,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    /// Return the length of the input.
    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  Callers guard with [`Self::is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Peek one byte beyond [`Self::peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// 1‑based column (in characters) of byte offset `at` on the current line.
    ///
    /// Offsets only move forward within a line, so each byte is counted once.
    fn column_of(&mut self, at: usize) -> usize {
        self.col += self.source[self.col_mark..at].chars().count();
        self.col_mark = at;
        self.col
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.curr`.  If it produces an
    /// actual token the kind is stored in `self.pending`.  Whitespace and
    /// comments are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => self.pending = Some(TokenType::LEFT_PAREN),
            b')' => self.pending = Some(TokenType::RIGHT_PAREN),
            b'{' => self.pending = Some(TokenType::LEFT_BRACE),
            b'}' => self.pending = Some(TokenType::RIGHT_BRACE),
            b',' => self.pending = Some(TokenType::COMMA),
            b'.' => self.pending = Some(TokenType::DOT),
            b'-' => self.pending = Some(TokenType::MINUS),
            b'+' => self.pending = Some(TokenType::PLUS),
            b';' => self.pending = Some(TokenType::SEMICOLON),
            b'*' => self.pending = Some(TokenType::STAR),

            // ── two‑character operators (!=, ==, <=, >=) ─────────────────
            b'!' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };

                self.pending = Some(tt);
            }

            b'=' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };

                self.pending = Some(tt);
            }

            b'<' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };

                self.pending = Some(tt);
            }

            b'>' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };

                self.pending = Some(tt);
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {
                return Ok(());
            }

            b'\n' => {
                self.line += 1;
                self.col_mark = self.curr;
                self.col = 1;

                return Ok(());
            }

            // ── comments (// … until newline) ────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // Leave the newline itself for the next call so line
                    // bookkeeping stays in one place.
                    match memchr(b'\n', &self.src[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.len(),
                    }

                    return Ok(());
                }

                self.pending = Some(TokenType::SLASH);
            }

            // ── string literal " … " ─────────────────────────────────────
            b'"' => {
                return self.parse_string();
            }

            // ── number literal (digit‑leading) ───────────────────────────
            b'0'..=b'9' => {
                self.parse_number();
            }

            // ── identifiers / keywords (alpha or underscore‑leading) ─────
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Skip the whole code point so the next lexeme starts on a
                // char boundary.
                let c: char = self.source[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.curr = self.start + c.len_utf8();

                return Err(LoxError::lex(
                    self.start_line,
                    self.start_column,
                    format!("Unexpected character: {}", c),
                ));
            }
        }

        Ok(())
    }

    /// Parse a double‑quoted string literal.
    ///
    /// * `self.start` still points to the opening `"`.
    /// * On success `self.curr` points **past** the closing `"`; on failure it
    ///   stops at the newline (or EOF) that cut the literal short.
    fn parse_string(&mut self) -> Result<()> {
        match memchr2(b'"', b'\n', &self.src[self.curr..]) {
            Some(pos) if self.src[self.curr + pos] == b'"' => {
                self.curr += pos + 1;
            }
            Some(pos) => {
                self.curr += pos;

                return Err(LoxError::lex(
                    self.start_line,
                    self.start_column,
                    "Unterminated string.",
                ));
            }
            None => {
                self.curr = self.len();

                return Err(LoxError::lex(
                    self.start_line,
                    self.start_column,
                    "Unterminated string.",
                ));
            }
        }

        // Slice excluding the surrounding quotes.
        let s: &str = &self.source[self.start + 1..self.curr - 1];

        self.pending = Some(TokenType::STRING(s.to_owned()));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`).  Fractions are optional.
    fn parse_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Optional fractional part.
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let s: &str = &self.source[self.start..self.curr];
        let n: f64 = s.parse::<f64>().unwrap_or(0.0); // digits only, never fails
        self.pending = Some(TokenType::NUMBER(n));
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(tt);
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        // Loop until we either emit a token, hit EOF, or see an error.
        while !self.finished {
            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.is_at_end() {
                self.finished = true;
                let column = self.column_of(self.len());

                return Some(Ok(Token::new(TokenType::EOF, "", self.line, column)));
            }

            // 2. Reset per‑token state.
            self.start = self.curr;
            self.start_line = self.line;
            self.start_column = self.column_of(self.start);
            self.pending = None;

            // 3. Attempt to scan a token.
            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            // 4. If a real token was recognised, build and return it.
            if let Some(tt) = self.pending.take() {
                let lex: &str = &self.source[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.start_line);

                return Some(Ok(Token::new(
                    tt,
                    lex,
                    self.start_line,
                    self.start_column,
                )));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan all of `source`, separating tokens from lexical errors.
///
/// The token list always ends with exactly one `EOF`.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LoxError>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Tokenized {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_one_based_per_line() {
        let (tokens, errors) = tokenize("var x;\n  print x;");

        assert!(errors.is_empty());
        let print = &tokens[3];
        assert_eq!(print.token_type, TokenType::PRINT);
        assert_eq!((print.line, print.column), (2, 3));
    }

    #[test]
    fn non_ascii_unexpected_character_is_skipped_whole() {
        let (tokens, errors) = tokenize("é1");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Unexpected character: é");
        assert_eq!(tokens[0].token_type, TokenType::NUMBER(0.0));
        assert_eq!(tokens[0].column, 2);
    }

    #[test]
    fn string_cut_by_newline_reports_starting_line() {
        let (tokens, errors) = tokenize("\n\"abc\nprint");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].position(), Some((2, 1)));
        assert_eq!(tokens[0].token_type, TokenType::PRINT);
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn long_single_line_keeps_columns_exact() {
        let source: String = "print 1;".repeat(50_000);
        let (tokens, errors) = tokenize(&source);

        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 150_001);

        let last_print = &tokens[149_997];
        assert_eq!(last_print.token_type, TokenType::PRINT);
        assert_eq!(last_print.column, 8 * 49_999 + 1);
        assert_eq!(tokens[150_000].column, source.len() + 1);
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let (tokens, _) = tokenize("\"héé\" x\n  y");

        assert_eq!(tokens[1].column, 7);
        assert_eq!(tokens[2].column, 3);
    }

    #[test]
    fn scanner_is_fused_after_eof() {
        let mut scanner = Scanner::new("");

        assert!(matches!(scanner.next(), Some(Ok(t)) if t.token_type == TokenType::EOF));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
