//! Lexer for Lox source text.
//!
//! [`Scanner`] walks the source bytes once and yields `Result<Token>` items:
//! an `Err` is a lexical error with its line, after which scanning carries on
//! with the next character. The last item is always a single `EOF` token and
//! the iterator is fused after it.
//!
//! * Operators use longest match (`!=` before `!`).
//! * Strings may span lines; an unterminated one is an error.
//! * Numbers are `digits ( "." digits )?`, so `123.` is a number then a dot.
//! * Identifiers that spell a reserved word become that keyword.
//!
//! ```rust
//! use rlox_tw::scanner::scan_tokens;
//!
//! let (tokens, errors) = scan_tokens("print 123; // comment");
//! assert!(errors.is_empty());
//! assert_eq!(tokens.len(), 4);
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// Reserved words, as a compile-time perfect hash.
static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and"    => TokenType::AND,
    "class"  => TokenType::CLASS,
    "else"   => TokenType::ELSE,
    "false"  => TokenType::FALSE,
    "fun"    => TokenType::FUN,
    "for"    => TokenType::FOR,
    "if"     => TokenType::IF,
    "nil"    => TokenType::NIL,
    "or"     => TokenType::OR,
    "print"  => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "super"  => TokenType::SUPER,
    "this"   => TokenType::THIS,
    "true"   => TokenType::TRUE,
    "var"    => TokenType::VAR,
    "while"  => TokenType::WHILE,
};

/// Streaming lexer over one source string.
pub struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],

    /// First byte of the lexeme being scanned.
    start: usize,

    /// Next byte to examine.
    curr: usize,

    line: usize,

    /// Kind recognised by the last `scan_token`, if it produced a token.
    pending: Option<TokenType>,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            bytes: src.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    // ── cursor ────────────────────────────────────────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Consumes one byte.  Only called when input remains.
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes[self.curr];
        self.curr += 1;
        b
    }

    /// Current byte, or `0` at the end of input.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.bytes[self.curr]
        }
    }

    /// Byte after the current one, or `0`.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.bytes[self.curr + 1]
        }
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        let matched: bool = !self.is_at_end() && self.peek() == expected;
        if matched {
            self.curr += 1;
        }
        matched
    }

    /// `long` when the next byte is `next`, consuming it; `short` otherwise.
    #[inline(always)]
    fn either(&mut self, next: u8, long: TokenType, short: TokenType) -> TokenType {
        if self.match_byte(next) {
            long
        } else {
            short
        }
    }

    #[inline(always)]
    fn lexeme(&self) -> &'a str {
        &self.src[self.start..self.curr]
    }

    // ── lexemes ───────────────────────────────────────────────────────────

    /// Scans one lexeme.  Leaves `pending` empty for whitespace and comments.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
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

            b'!' => self.pending = Some(self.either(b'=', TokenType::BANG_EQUAL, TokenType::BANG)),
            b'=' => self.pending = Some(self.either(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL)),
            b'<' => self.pending = Some(self.either(b'=', TokenType::LESS_EQUAL, TokenType::LESS)),
            b'>' => {
                self.pending = Some(self.either(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER))
            }

            b' ' | b'\r' | b'\t' => {}

            b'\n' => self.line += 1,

            b'/' => {
                if self.match_byte(b'/') {
                    // The newline itself is left for the main loop so the
                    // line counter stays in one place.
                    match memchr(b'\n', &self.bytes[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.len(),
                    }
                } else {
                    self.pending = Some(TokenType::SLASH);
                }
            }

            b'"' => return self.string(),

            b'0'..=b'9' => self.number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // Swallow the whole code point so a multi-byte character is
                // reported once.
                let ch = self.src[self.start..].chars().next().unwrap_or('\u{FFFD}');
                self.curr = self.start + ch.len_utf8();

                debug!("Unexpected character {:?} on line {}", ch, self.line);
                return Err(LoxError::lex(self.line, "Unexpected character."));
            }
        }

        Ok(())
    }

    /// String body after the opening quote.  The token's line is the line of
    /// the closing quote.
    fn string(&mut self) -> Result<()> {
        let close: usize = match memchr(b'"', &self.bytes[self.curr..]) {
            Some(offset) => self.curr + offset,
            None => {
                self.line += self.bytes[self.curr..].iter().filter(|&&b| b == b'\n').count();
                self.curr = self.len();
                return Err(LoxError::lex(self.line, "Unterminated string."));
            }
        };

        self.line += self.bytes[self.curr..close].iter().filter(|&&b| b == b'\n').count();
        self.curr = close;

        self.advance(); // closing quote

        let value: &str = &self.src[self.start + 1..self.curr - 1];
        self.pending = Some(TokenType::STRING(value.to_owned()));

        Ok(())
    }

    /// `123` or `3.14`.
    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // Only ASCII digits and at most one inner dot reach here.
        let n: f64 = self.lexeme().parse::<f64>().unwrap_or(0.0);
        self.pending = Some(TokenType::NUMBER(n));
    }

    fn identifier(&mut self) {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.advance();
        }

        let kind: TokenType = KEYWORDS
            .get(self.lexeme())
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(kind);
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // One position past the end means EOF has already been handed out.
            if self.curr > self.len() {
                return None;
            }

            if self.curr == self.len() {
                self.curr += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(kind) = self.pending.take() {
                debug!("{:?} on line {}", kind, self.line);
                return Some(Ok(Token::new(kind, self.lexeme(), self.line)));
            }
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan `source` to completion, separating tokens from lexical diagnostics.
/// The token vector always ends with a single `EOF`.
pub fn scan_tokens(source: &str) -> (Vec<Token>, Vec<LoxError>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Scanned {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
