//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This gives a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow` in the binary, while still preserving the source position of
//! every diagnostic.
//!
//! The module **does not** print diagnostics itself; see [`crate::lox::Reporter`].

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the offending lexeme started.
        line: usize,

        /// 1‑based column of the offending lexeme.
        column: usize,
    },

    /// Syntactic (parser) error reported at a concrete token.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        /// `" at end"` or `" at '<lexeme>'"`.
        location: String,
        line: usize,
        column: usize,
    },

    /// Static‑analysis failure found by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
        column: usize,
    },

    /// Runtime evaluation error; aborts the rest of the program.
    #[error("{message}\n[line {line}]")]
    Runtime {
        message: String,
        line: usize,
        column: usize,
    },

    /// Wrapper around `std::io::Error` (transparent).  Raised when the output
    /// sink of a `print` statement fails.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex {
            message,
            line,
            column,
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: token.location(),
            line: token.line,
            column: token.column,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: token.location(),
            line: token.line,
            column: token.column,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
            column: token.column,
        }
    }

    /// `(line, column)` of the diagnostic, if it has a source position.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            LoxError::Lex { line, column, .. }
            | LoxError::Parse { line, column, .. }
            | LoxError::Resolve { line, column, .. }
            | LoxError::Runtime { line, column, .. } => Some((*line, *column)),
            LoxError::Io(_) => None,
        }
    }

    /// The bare message without position decoration.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Render the offending source line with a `^` under the error column.
    ///
    /// ```text
    ///    3 | print a + ;
    ///      |           ^
    /// ```
    ///
    /// Returns `None` when the error carries no position or the line is out of
    /// range for `source`.
    pub fn render_context(&self, source: &str) -> Option<String> {
        let (line, column) = self.position()?;
        let text: &str = source.lines().nth(line.checked_sub(1)?)?;

        let gutter: String = " ".repeat(line.to_string().len().max(4));
        let pad: String = text
            .chars()
            .take(column.saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();

        Some(format!("{line:>4} | {text}\n{gutter} | {pad}^"))
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn token(token_type: TokenType, lexeme: &str, line: usize, column: usize) -> Token {
        Token::new(token_type, lexeme, line, column)
    }

    #[test]
    fn parse_error_names_the_offending_lexeme() {
        let err = LoxError::parse(&token(TokenType::SEMICOLON, ";", 2, 9), "Expect expression.");

        assert_eq!(err.to_string(), "[line 2] Error at ';': Expect expression.");
    }

    #[test]
    fn parse_error_at_eof_says_at_end() {
        let err = LoxError::parse(&token(TokenType::EOF, "", 1, 6), "Expect ';' after value.");

        assert_eq!(err.to_string(), "[line 1] Error at end: Expect ';' after value.");
    }

    #[test]
    fn runtime_error_puts_line_after_message() {
        let err = LoxError::runtime(
            &token(TokenType::MINUS, "-", 4, 1),
            "Operand must be a number.",
        );

        assert_eq!(err.to_string(), "Operand must be a number.\n[line 4]");
        assert_eq!(err.position(), Some((4, 1)));
    }

    #[test]
    fn context_points_at_column() {
        let source = "var a = 1;\nprint a + ;\n";
        let err = LoxError::parse(&token(TokenType::SEMICOLON, ";", 2, 11), "Expect expression.");

        let rendered = err.render_context(source).unwrap();

        assert_eq!(rendered, "   2 | print a + ;\n     |           ^");
    }

    #[test]
    fn context_is_none_without_matching_line() {
        let err = LoxError::lex(9, 1, "Unexpected character: #");

        assert!(err.render_context("print 1;").is_none());
    }
}
