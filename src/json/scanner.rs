use log::trace;

use super::{buffer::JsonBuffer, token::JsonToken};
use crate::{
    bson::Regex,
    error::{Error, Result},
};

/// Splits JSON text into [`JsonToken`]s.
///
/// The scanner is re-entrant from any position it has reported, which is how readers roll
/// back.
///
/// ```
/// use bson_codec::json::{JsonScanner, JsonToken};
///
/// let mut scanner = JsonScanner::new("{ a: -1 }");
/// assert_eq!(scanner.next_token()?, JsonToken::BeginObject);
/// assert_eq!(scanner.next_token()?, JsonToken::UnquotedString("a".into()));
/// assert_eq!(scanner.next_token()?, JsonToken::Colon);
/// assert_eq!(scanner.next_token()?, JsonToken::Int32(-1));
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct JsonScanner {
    buffer: JsonBuffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberState {
    SawLeadingMinus,
    SawLeadingZero,
    SawIntegerDigits,
    SawDecimalPoint,
    SawFractionDigits,
    SawExponentLetter,
    SawExponentSign,
    SawExponentDigits,
    SawMinusInfinity,
    Done,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegexState {
    InPattern,
    InEscapeSequence,
    InOptions,
    Done,
    Invalid,
}

fn is_delimiter(c: Option<char>) -> bool {
    match c {
        None | Some(',' | '}' | ']' | ')') => true,
        Some(c) => c.is_whitespace(),
    }
}

impl JsonScanner {
    pub fn new(text: &str) -> Self {
        Self {
            buffer: JsonBuffer::new(text),
        }
    }

    pub fn buffer_position(&self) -> usize {
        self.buffer.position()
    }

    pub fn set_buffer_position(&mut self, position: usize) -> Result<()> {
        self.buffer.set_position(position)
    }

    /// Scans the next token, skipping leading whitespace.
    pub fn next_token(&mut self) -> Result<JsonToken> {
        let mut c = self.buffer.read()?;
        while c.is_some_and(char::is_whitespace) {
            c = self.buffer.read()?;
        }

        let token = match c {
            None => JsonToken::EndOfFile,
            Some('{') => JsonToken::BeginObject,
            Some('}') => JsonToken::EndObject,
            Some('[') => JsonToken::BeginArray,
            Some(']') => JsonToken::EndArray,
            Some('(') => JsonToken::LeftParen,
            Some(')') => JsonToken::RightParen,
            Some(':') => JsonToken::Colon,
            Some(',') => JsonToken::Comma,
            Some(quote @ ('\'' | '"')) => self.scan_string(quote)?,
            Some('/') => self.scan_regular_expression()?,
            Some(first @ ('-' | '0'..='9')) => self.scan_number(first)?,
            Some(first) if first == '$' || first == '_' || first.is_alphabetic() => {
                self.scan_unquoted_string()?
            }
            Some(other) => {
                let position = self.buffer.position();
                self.buffer.unread(c);
                return Err(Error::parse_at(
                    format!("Invalid JSON input. Position: {position}. Character: '{other}'."),
                    position,
                ));
            }
        };
        trace!("token {token:?}");
        Ok(token)
    }

    fn invalid_at<T>(&self, message: &str) -> Result<T> {
        let position = self.buffer.position();
        Err(Error::parse_at(
            format!("{message} Position: {position}."),
            position,
        ))
    }

    fn scan_regular_expression(&mut self) -> Result<JsonToken> {
        let start = self.buffer.position();
        let mut options_start = start;
        let mut state = RegexState::InPattern;

        loop {
            let c = self.buffer.read()?;
            state = match state {
                RegexState::InPattern => match c {
                    None => RegexState::Invalid,
                    Some('/') => {
                        options_start = self.buffer.position();
                        RegexState::InOptions
                    }
                    Some('\\') => RegexState::InEscapeSequence,
                    Some(_) => RegexState::InPattern,
                },
                RegexState::InEscapeSequence => match c {
                    None => RegexState::Invalid,
                    Some(_) => RegexState::InPattern,
                },
                RegexState::InOptions => match c {
                    Some('i' | 'm' | 'x' | 's') => RegexState::InOptions,
                    c if is_delimiter(c) => RegexState::Done,
                    _ => RegexState::Invalid,
                },
                done_or_invalid => done_or_invalid,
            };

            match state {
                RegexState::Done => {
                    self.buffer.unread(c);
                    let end = self.buffer.position();
                    let pattern = self.buffer.substring(start, options_start - 1);
                    let options = self.buffer.substring(options_start, end);
                    return Ok(JsonToken::RegularExpression(Regex::new(pattern, options)));
                }
                RegexState::Invalid => {
                    return self.invalid_at("Invalid JSON regular expression.");
                }
                _ => {}
            }
        }
    }

    fn scan_unquoted_string(&mut self) -> Result<JsonToken> {
        let start = self.buffer.position() - 1;
        let mut c = self.buffer.read()?;
        while c.is_some_and(|c| c == '$' || c == '_' || c.is_alphanumeric()) {
            c = self.buffer.read()?;
        }
        self.buffer.unread(c);
        let lexeme = self.buffer.substring(start, self.buffer.position());
        Ok(JsonToken::UnquotedString(lexeme))
    }

    fn scan_number(&mut self, first: char) -> Result<JsonToken> {
        let start = self.buffer.position() - 1;
        let mut state = match first {
            '-' => NumberState::SawLeadingMinus,
            '0' => NumberState::SawLeadingZero,
            _ => NumberState::SawIntegerDigits,
        };
        let mut is_double = false;
        let mut is_minus_infinity = false;

        loop {
            let mut c = self.buffer.read()?;
            state = match state {
                NumberState::SawLeadingMinus => match c {
                    Some('0') => NumberState::SawLeadingZero,
                    Some('I') => NumberState::SawMinusInfinity,
                    Some(d) if d.is_ascii_digit() => NumberState::SawIntegerDigits,
                    _ => NumberState::Invalid,
                },
                NumberState::SawLeadingZero | NumberState::SawIntegerDigits => match c {
                    Some('.') => NumberState::SawDecimalPoint,
                    Some('e' | 'E') => NumberState::SawExponentLetter,
                    Some(d) if d.is_ascii_digit() => NumberState::SawIntegerDigits,
                    c if is_delimiter(c) => NumberState::Done,
                    _ => NumberState::Invalid,
                },
                NumberState::SawDecimalPoint => {
                    is_double = true;
                    match c {
                        Some(d) if d.is_ascii_digit() => NumberState::SawFractionDigits,
                        _ => NumberState::Invalid,
                    }
                }
                NumberState::SawFractionDigits => match c {
                    Some('e' | 'E') => NumberState::SawExponentLetter,
                    Some(d) if d.is_ascii_digit() => NumberState::SawFractionDigits,
                    c if is_delimiter(c) => NumberState::Done,
                    _ => NumberState::Invalid,
                },
                NumberState::SawExponentLetter => {
                    is_double = true;
                    match c {
                        Some('+' | '-') => NumberState::SawExponentSign,
                        Some(d) if d.is_ascii_digit() => NumberState::SawExponentDigits,
                        _ => NumberState::Invalid,
                    }
                }
                NumberState::SawExponentSign => match c {
                    Some(d) if d.is_ascii_digit() => NumberState::SawExponentDigits,
                    _ => NumberState::Invalid,
                },
                NumberState::SawExponentDigits => match c {
                    Some(d) if d.is_ascii_digit() => NumberState::SawExponentDigits,
                    c if is_delimiter(c) => NumberState::Done,
                    _ => NumberState::Invalid,
                },
                NumberState::SawMinusInfinity => {
                    let mut matched = true;
                    for expected in "nfinity".chars() {
                        if c != Some(expected) {
                            matched = false;
                            break;
                        }
                        c = self.buffer.read()?;
                    }
                    if matched && is_delimiter(c) {
                        is_double = true;
                        is_minus_infinity = true;
                        NumberState::Done
                    } else {
                        NumberState::Invalid
                    }
                }
                done_or_invalid => done_or_invalid,
            };

            match state {
                NumberState::Invalid => return self.invalid_at("Invalid JSON number."),
                NumberState::Done => {
                    self.buffer.unread(c);
                    let lexeme = self.buffer.substring(start, self.buffer.position());
                    return self.number_token(&lexeme, is_double, is_minus_infinity);
                }
                _ => {}
            }
        }
    }

    fn number_token(
        &self,
        lexeme: &str,
        is_double: bool,
        is_minus_infinity: bool,
    ) -> Result<JsonToken> {
        if is_minus_infinity {
            return Ok(JsonToken::Double(f64::NEG_INFINITY));
        }
        if is_double {
            return match lexeme.parse::<f64>() {
                Ok(d) => Ok(JsonToken::Double(d)),
                Err(_) => self.invalid_at(&format!("Invalid JSON number '{lexeme}'.")),
            };
        }
        match lexeme.parse::<i64>() {
            Ok(value) => Ok(match i32::try_from(value) {
                Ok(small) => JsonToken::Int32(small),
                Err(_) => JsonToken::Int64(value),
            }),
            Err(_) => self.invalid_at(&format!(
                "Invalid JSON number '{lexeme}': integer out of range."
            )),
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<JsonToken> {
        let mut value = String::new();
        loop {
            match self.buffer.read()? {
                None => return self.invalid_at("End of file in JSON string."),
                Some(c) if c == quote => return Ok(JsonToken::String(value)),
                Some('\\') => {
                    let escaped = match self.buffer.read()? {
                        Some(c @ ('\'' | '"' | '\\' | '/')) => c,
                        Some('b') => '\u{08}',
                        Some('f') => '\u{0C}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => self.scan_unicode_escape()?,
                        Some(other) => {
                            return self.invalid_at(&format!(
                                "Invalid escape sequence in JSON string '\\{other}'."
                            ));
                        }
                        None => return self.invalid_at("End of file in JSON string."),
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// Reads the rest of a `\u` escape: either `{H...}` or four hex digits, combining a
    /// UTF-16 surrogate pair when one follows.
    fn scan_unicode_escape(&mut self) -> Result<char> {
        let first = self.buffer.read()?;
        if first == Some('{') {
            let mut hex = String::new();
            loop {
                match self.buffer.read()? {
                    Some('}') => break,
                    Some(c) if c.is_ascii_hexdigit() && hex.len() < 6 => hex.push(c),
                    _ => return self.invalid_at("Invalid unicode escape in JSON string."),
                }
            }
            return u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map_or_else(
                    || self.invalid_at("Invalid unicode escape in JSON string."),
                    Ok,
                );
        }

        self.buffer.unread(first);
        let high = self.scan_hex4()?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high).map_or_else(
                || self.invalid_at("Invalid unicode escape in JSON string."),
                Ok,
            );
        }
        if self.buffer.read()? != Some('\\') || self.buffer.read()? != Some('u') {
            return self.invalid_at("Unpaired surrogate in JSON string.");
        }
        let low = self.scan_hex4()?;
        if !(0xDC00..0xE000).contains(&low) {
            return self.invalid_at("Unpaired surrogate in JSON string.");
        }
        let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        char::from_u32(combined).map_or_else(
            || self.invalid_at("Invalid unicode escape in JSON string."),
            Ok,
        )
    }

    fn scan_hex4(&mut self) -> Result<u32> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self.buffer.read()?.and_then(|c| c.to_digit(16));
            match digit {
                Some(digit) => code = code * 16 + digit,
                None => return self.invalid_at("Invalid unicode escape in JSON string."),
            }
        }
        Ok(code)
    }
}
