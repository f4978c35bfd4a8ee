//! Tagged value model shared by commands, returns, and notices.

use std::fmt;

use thiserror::Error;

/// A single protocol value.
///
/// Atoms are keyword tags and are rendered with a leading colon; strings
/// carry arbitrary text and are rendered quoted with `\"` and `\\` escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Keyword tag such as `:load-file`, stored without the leading colon.
    Atom(String),
    /// Quoted text.
    Str(String),
    /// Signed integer.
    Num(i64),
    /// Parenthesised sequence of values.
    List(Vec<Value>),
}

impl Value {
    /// Builds an atom value.
    #[must_use]
    pub fn atom(name: impl Into<String>) -> Self {
        Self::Atom(name.into())
    }

    /// Builds a string value.
    #[must_use]
    pub fn str(text: impl Into<String>) -> Self {
        Self::Str(text.into())
    }

    /// Builds a list value.
    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(items)
    }

    /// Returns the atom name when the value is an atom.
    #[must_use]
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Returns the text when the value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns the number when the value is numeric.
    #[must_use]
    pub fn as_num(&self) -> Option<i64> {
        match self {
            Self::Num(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the items when the value is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Parses a value from its textual encoding.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the input is not a single well-formed
    /// value.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut parser = Parser::new(input);
        parser.skip_whitespace();
        let value = parser.value()?;
        parser.skip_whitespace();
        match parser.peek() {
            Some((at, _)) => Err(ParseError::TrailingInput { at }),
            None => Ok(value),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(name) => write!(formatter, ":{name}"),
            Self::Str(text) => {
                formatter.write_str("\"")?;
                for character in text.chars() {
                    match character {
                        '"' => formatter.write_str("\\\"")?,
                        '\\' => formatter.write_str("\\\\")?,
                        '\n' => formatter.write_str("\\n")?,
                        other => write!(formatter, "{other}")?,
                    }
                }
                formatter.write_str("\"")
            }
            Self::Num(number) => write!(formatter, "{number}"),
            Self::List(items) => {
                formatter.write_str("(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        formatter.write_str(" ")?;
                    }
                    write!(formatter, "{item}")?;
                }
                formatter.write_str(")")
            }
        }
    }
}

/// Errors raised while parsing a textual value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Input ended inside a value.
    #[error("input ended before the value was complete")]
    UnexpectedEnd,
    /// A character that cannot start or continue the expected token.
    #[error("unexpected character '{found}' at byte {at}")]
    UnexpectedChar {
        /// Offending character.
        found: char,
        /// Byte offset of the character.
        at: usize,
    },
    /// An atom marker with no name behind it.
    #[error("empty atom at byte {at}")]
    EmptyAtom {
        /// Byte offset of the colon.
        at: usize,
    },
    /// A numeric token that does not fit the value model.
    #[error("invalid number '{text}' at byte {at}")]
    InvalidNumber {
        /// The unparseable token.
        text: String,
        /// Byte offset of the token.
        at: usize,
    },
    /// Content remained after a complete value.
    #[error("trailing input at byte {at}")]
    TrailingInput {
        /// Byte offset of the first trailing character.
        at: usize,
    },
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some((_, character)) = self.peek() {
            if character.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        match self.peek() {
            None => Err(ParseError::UnexpectedEnd),
            Some((_, '(')) => self.list(),
            Some((_, '"')) => self.string(),
            Some((at, ':')) => self.atom(at),
            Some((at, character)) if character == '-' || character.is_ascii_digit() => {
                self.number(at)
            }
            Some((at, found)) => Err(ParseError::UnexpectedChar { found, at }),
        }
    }

    fn list(&mut self) -> Result<Value, ParseError> {
        self.chars.next();
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ParseError::UnexpectedEnd),
                Some((_, ')')) => {
                    self.chars.next();
                    return Ok(Value::List(items));
                }
                Some(_) => items.push(self.value()?),
            }
        }
    }

    fn string(&mut self) -> Result<Value, ParseError> {
        self.chars.next();
        let mut text = String::new();
        loop {
            match self.chars.next() {
                None => return Err(ParseError::UnexpectedEnd),
                Some((_, '"')) => return Ok(Value::Str(text)),
                Some((_, '\\')) => match self.chars.next() {
                    None => return Err(ParseError::UnexpectedEnd),
                    Some((_, 'n')) => text.push('\n'),
                    Some((_, escaped)) => text.push(escaped),
                },
                Some((_, character)) => text.push(character),
            }
        }
    }

    fn atom(&mut self, at: usize) -> Result<Value, ParseError> {
        self.chars.next();
        let mut name = String::new();
        while let Some((_, character)) = self.peek() {
            if is_atom_char(character) {
                name.push(character);
                self.chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(ParseError::EmptyAtom { at });
        }
        Ok(Value::Atom(name))
    }

    fn number(&mut self, at: usize) -> Result<Value, ParseError> {
        let mut text = String::new();
        if let Some((_, '-')) = self.peek() {
            text.push('-');
            self.chars.next();
        }
        while let Some((_, character)) = self.peek() {
            if character.is_ascii_digit() {
                text.push(character);
                self.chars.next();
            } else {
                break;
            }
        }
        text.parse::<i64>()
            .map(Value::Num)
            .map_err(|_| ParseError::InvalidNumber { text, at })
    }
}

fn is_atom_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '-' || character == '_'
}
