//! Lexer and recursive-descent parser for LTL formulas.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! implies  := or ('->' implies)?
//! or       := and (('||' | '|' | '\/') and)*
//! and      := temporal (('&&' | '&' | '/\') temporal)*
//! temporal := unary (('U' | 'R' | 'V') temporal)?
//! unary    := ('!' | '~' | 'X' | '[]' | '<>') unary | primary
//! primary  := '(' implies ')' | 'true' | 'false' | 'did(' name ')' | ident
//! ```

use crate::formula::Formula;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found} at position {position}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },
    #[error("unexpected end of formula")]
    UnexpectedEof,
    #[error("invalid syntax: {message} at position {position}")]
    InvalidSyntax { message: String, position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Not,
    And,
    Or,
    Implies,
    Always,
    Eventually,
    Next,
    Until,
    Release,
    True,
    False,
    Atom(String),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let Some((start, c)) = self.chars.next() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position: self.source.len(),
            });
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '!' | '~' => TokenKind::Not,
            '&' => {
                self.chars.next_if(|(_, c)| *c == '&');
                TokenKind::And
            }
            '|' => {
                self.chars.next_if(|(_, c)| *c == '|');
                TokenKind::Or
            }
            '/' => {
                self.expect_char('\\', start)?;
                TokenKind::And
            }
            '\\' => {
                self.expect_char('/', start)?;
                TokenKind::Or
            }
            '-' => {
                self.expect_char('>', start)?;
                TokenKind::Implies
            }
            '[' => {
                self.expect_char(']', start)?;
                TokenKind::Always
            }
            '<' => {
                self.expect_char('>', start)?;
                TokenKind::Eventually
            }
            c if is_ident_char(c) => self.lex_word(start, c)?,
            other => {
                return Err(ParseError::InvalidSyntax {
                    message: format!("unexpected character '{}'", other),
                    position: start,
                })
            }
        };
        Ok(Token {
            kind,
            position: start,
        })
    }

    fn expect_char(&mut self, want: char, start: usize) -> Result<(), ParseError> {
        match self.chars.next() {
            Some((_, c)) if c == want => Ok(()),
            Some((pos, c)) => Err(ParseError::InvalidSyntax {
                message: format!("expected '{}' after operator start, found '{}'", want, c),
                position: pos,
            }),
            None => Err(ParseError::InvalidSyntax {
                message: format!("operator cut short, expected '{}'", want),
                position: start,
            }),
        }
    }

    fn lex_word(&mut self, start: usize, first: char) -> Result<TokenKind, ParseError> {
        let source = self.source;
        let mut end = start + first.len_utf8();
        while let Some((pos, c)) = self.chars.next_if(|(_, c)| is_ident_char(*c)) {
            end = pos + c.len_utf8();
        }
        let word = &source[start..end];
        Ok(match word {
            "X" => TokenKind::Next,
            "U" => TokenKind::Until,
            "R" | "V" => TokenKind::Release,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "did" if self.chars.next_if(|(_, c)| *c == '(').is_some() => self.lex_did(start)?,
            _ => TokenKind::Atom(word.to_string()),
        })
    }

    /// Event name inside `did( ... )`, up to the `)` that balances the
    /// opening one.
    fn lex_did(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        let mut name = String::new();
        let mut depth = 0usize;
        loop {
            match self.chars.next() {
                Some((_, ')')) if depth == 0 => break,
                Some((_, c)) => {
                    match c {
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    }
                    name.push(c);
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ParseError::InvalidSyntax {
                message: "empty event name in did()".to_string(),
                position: start,
            });
        }
        Ok(TokenKind::Atom(name.to_string()))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: Lexer::new(source).tokenize()?,
            position: 0,
        })
    }

    /// Parse a complete formula; trailing tokens are an error.
    pub fn parse(mut self) -> Result<Formula, ParseError> {
        let formula = self.parse_implies()?;
        if !self.is_at_end() {
            return Err(self.unexpected("end of formula"));
        }
        Ok(formula)
    }

    fn parse_implies(&mut self) -> Result<Formula, ParseError> {
        let left = self.parse_or()?;
        if self.check(&TokenKind::Implies) {
            self.advance();
            let right = self.parse_implies()?;
            return Ok(Formula::Implies(Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Formula::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_temporal()?;
        while self.check(&TokenKind::And) {
            self.advance();
            let right = self.parse_temporal()?;
            left = Formula::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_temporal(&mut self) -> Result<Formula, ParseError> {
        let left = self.parse_unary()?;
        if self.check(&TokenKind::Until) {
            self.advance();
            let right = self.parse_temporal()?;
            return Ok(Formula::Until(Box::new(left), Box::new(right)));
        }
        if self.check(&TokenKind::Release) {
            self.advance();
            let right = self.parse_temporal()?;
            return Ok(Formula::Release(Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Formula, ParseError> {
        let wrap: fn(Box<Formula>) -> Formula = match self.current().kind {
            TokenKind::Not => Formula::Not,
            TokenKind::Next => Formula::Next,
            TokenKind::Always => Formula::Always,
            TokenKind::Eventually => Formula::Eventually,
            _ => return self.parse_primary(),
        };
        self.advance();
        Ok(wrap(Box::new(self.parse_unary()?)))
    }

    fn parse_primary(&mut self) -> Result<Formula, ParseError> {
        if self.check(&TokenKind::LParen) {
            self.advance();
            let inner = self.parse_implies()?;
            self.expect(TokenKind::RParen)?;
            return Ok(inner);
        }
        let formula = match &self.current().kind {
            TokenKind::True => Formula::True,
            TokenKind::False => Formula::False,
            TokenKind::Atom(name) => Formula::Atom(name.clone()),
            TokenKind::Eof => return Err(ParseError::UnexpectedEof),
            _ => return Err(self.unexpected("formula")),
        };
        self.advance();
        Ok(formula)
    }

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.position.min(last)]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.position += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else if self.is_at_end() {
            Err(ParseError::UnexpectedEof)
        } else {
            Err(self.unexpected(&format!("{:?}", kind)))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: format!("{:?}", self.current().kind),
            position: self.current().position,
        }
    }
}
