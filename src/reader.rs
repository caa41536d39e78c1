use tracing::debug;

use crate::error::Error;
use crate::source::Source;
use crate::value::{Object, Value};

/// Tokens produced by the lexer. `Unknown` stands for any byte sequence
/// the dialect has no reading for; the parser turns it into a positioned
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Unknown,
    Identifier,
    Assignment,
    ObjectBegin,
    ObjectEnd,
    ArrayBegin,
    ArrayEnd,
    Next,
    String,
    Integer,
    Real,
    Hex,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Begin,
    String,
    EscapedChar,
    UnicodeChar,
    NumberSign,
    NumberLiteral,
    NumberKeyword,
    Fraction,
    ExponentSign,
    ExponentHead,
    ExponentBody,
    Hexadecimal,
    Identifier,
    Comment,
    SingleComment,
    PluralComment,
    Whitespace,
}

/// Lexes the next token. On return the token's text is the source's
/// pending lexeme and the source position still points at the start of
/// the whitespace run preceding it; the next call accounts it.
fn next_token(source: &mut Source<'_>) -> Token {
    let mut state = State::Begin;
    let mut unicode_digits = 0;
    source.skip_lexeme();
    loop {
        let character = source.current();
        match state {
            State::Begin => {
                let Some(byte) = character else {
                    return Token::End;
                };
                match byte {
                    b':' => {
                        source.bump();
                        return Token::Assignment;
                    }
                    b'{' => {
                        source.bump();
                        return Token::ObjectBegin;
                    }
                    b'}' => {
                        source.bump();
                        return Token::ObjectEnd;
                    }
                    b'[' => {
                        source.bump();
                        return Token::ArrayBegin;
                    }
                    b']' => {
                        source.bump();
                        return Token::ArrayEnd;
                    }
                    b',' => {
                        source.bump();
                        return Token::Next;
                    }
                    b'"' | b'\'' => state = State::String,
                    b'+' | b'-' => state = State::NumberSign,
                    b'.' => state = State::Fraction,
                    b'/' => state = State::Comment,
                    b'_' => state = State::Identifier,
                    // lead bytes of the multibyte whitespaces (BOM, U+2028, U+2029)
                    0xEF | 0xE2 => state = State::Whitespace,
                    byte if byte.is_ascii_digit() => state = State::NumberLiteral,
                    byte if byte.is_ascii_alphabetic() => state = State::Identifier,
                    byte if !byte.is_ascii_whitespace() => return Token::Unknown,
                    _ => {}
                }
                source.skip_lexeme();
            }
            State::String => match character {
                None => return Token::Unknown,
                Some(b'\\') => state = State::EscapedChar,
                Some(byte) if source.lexeme().first() == Some(&byte) => {
                    source.bump();
                    return Token::String;
                }
                _ => {}
            },
            State::EscapedChar => match character {
                Some(b'u') => {
                    state = State::UnicodeChar;
                    unicode_digits = 0;
                }
                Some(b'"' | b'\'' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' | b'\n') => {
                    state = State::String;
                }
                _ => return Token::Unknown,
            },
            State::UnicodeChar => match character {
                Some(byte) if byte.is_ascii_hexdigit() => {
                    unicode_digits += 1;
                    if unicode_digits == 4 {
                        state = State::String;
                    }
                }
                _ => return Token::Unknown,
            },
            State::NumberSign => match character {
                Some(b'.') => state = State::Fraction,
                Some(byte) if byte.is_ascii_digit() => state = State::NumberLiteral,
                Some(byte) if byte.is_ascii_alphabetic() => state = State::NumberKeyword,
                _ => return Token::Unknown,
            },
            State::NumberKeyword => {
                if !matches!(character, Some(byte) if byte.is_ascii_alphabetic()) {
                    return Token::Real;
                }
            }
            State::NumberLiteral => match character {
                Some(b'.') => state = State::Fraction,
                Some(b'e' | b'E') => state = State::ExponentSign,
                Some(b'x' | b'X') if matches!(source.lexeme(), b"0" | b"+0" | b"-0") => {
                    state = State::Hexadecimal;
                }
                Some(byte) if byte.is_ascii_digit() => {}
                _ => return Token::Integer,
            },
            State::Fraction => match character {
                Some(b'e' | b'E') => state = State::ExponentSign,
                Some(byte) if byte.is_ascii_digit() => {}
                _ => return Token::Real,
            },
            State::ExponentSign => match character {
                Some(b'+' | b'-') => state = State::ExponentHead,
                Some(byte) if byte.is_ascii_digit() => state = State::ExponentBody,
                _ => return Token::Unknown,
            },
            State::ExponentHead => match character {
                Some(byte) if byte.is_ascii_digit() => state = State::ExponentBody,
                _ => return Token::Unknown,
            },
            State::ExponentBody => {
                if !matches!(character, Some(byte) if byte.is_ascii_digit()) {
                    return Token::Real;
                }
            }
            State::Hexadecimal => {
                if !matches!(character, Some(byte) if byte.is_ascii_hexdigit()) {
                    return Token::Hex;
                }
            }
            State::Identifier => {
                if !matches!(character, Some(byte) if byte.is_ascii_alphanumeric() || byte == b'_')
                {
                    return Token::Identifier;
                }
            }
            State::Comment => match character {
                Some(b'/') => state = State::SingleComment,
                Some(b'*') => state = State::PluralComment,
                _ => return Token::Unknown,
            },
            State::SingleComment => match character {
                None | Some(b'\n') => state = State::Begin,
                _ => {}
            },
            State::PluralComment => match character {
                None => return Token::Unknown,
                Some(b'/') if source.lexeme().last() == Some(&b'*') => state = State::Begin,
                _ => {}
            },
            State::Whitespace => {
                let Some(byte) = character else {
                    return Token::Unknown;
                };
                if source.lexeme().len() == 2 {
                    let matched = matches!(
                        (source.lexeme()[0], source.lexeme()[1], byte),
                        (0xEF, 0xBB, 0xBF) | (0xE2, 0x80, 0xA8) | (0xE2, 0x80, 0xA9)
                    );
                    if !matched {
                        return Token::Unknown;
                    }
                    state = State::Begin;
                    source.skip_lexeme();
                }
            }
        }
        source.bump();
    }
}

/// Parser behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Reject trailing content after the top-level value.
    pub strict: bool,
    /// Record every error and keep going instead of failing fast; the
    /// partial tree built so far is returned.
    pub collect_errors: bool,
}

/// Recursive-descent parser for the permissive JSON5-ish dialect.
///
/// A reader is reusable; each `parse_*` call starts with a clean error
/// record.
#[derive(Debug, Default)]
pub struct Reader {
    options: Options,
    errors: Vec<Error>,
}

impl Reader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            errors: Vec::new(),
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn collect_errors(mut self, collect: bool) -> Self {
        self.options.collect_errors = collect;
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.errors.last()
    }

    pub fn parse_str(&mut self, text: &str) -> Result<Value, Error> {
        self.parse_source(&mut Source::from_str(text))
    }

    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Result<Value, Error> {
        self.parse_source(&mut Source::from_bytes(bytes))
    }

    pub fn parse_iter(&mut self, bytes: impl Iterator<Item = u8>) -> Result<Value, Error> {
        self.parse_source(&mut Source::from_iter(bytes))
    }

    pub fn parse_reader(&mut self, stream: impl std::io::Read) -> Result<Value, Error> {
        self.parse_source(&mut Source::from_reader(stream))
    }

    pub fn parse_source(&mut self, source: &mut Source<'_>) -> Result<Value, Error> {
        self.errors.clear();
        let mut root = Value::Null;
        let outcome = self.parse_root(source, &mut root);
        debug!(errors = self.errors.len(), "parse finished");
        match outcome {
            Ok(()) => Ok(root),
            Err(_) if self.options.collect_errors => Ok(root),
            Err(error) => Err(error),
        }
    }

    fn parse_root(&mut self, source: &mut Source<'_>, root: &mut Value) -> Result<(), Error> {
        let token = next_token(source);
        self.parse_value(token, source, root)?;
        if self.options.strict && next_token(source) != Token::End {
            return Err(self.fail("expected end of input", source));
        }
        Ok(())
    }

    fn fail(&mut self, reason: &str, source: &Source<'_>) -> Error {
        let position = source.position();
        let error = Error::at(reason, position.line, position.column);
        self.errors.push(error.clone());
        error
    }

    fn parse_value(
        &mut self,
        token: Token,
        source: &mut Source<'_>,
        value: &mut Value,
    ) -> Result<(), Error> {
        match token {
            Token::String => *value = Value::String(unescape(source.lexeme())),
            Token::Integer => match source.lexeme_str().parse::<i64>() {
                Ok(number) => *value = Value::Integer(number),
                Err(_) => return Err(self.fail("integer is out of range", source)),
            },
            Token::Hex => match parse_hex(&source.lexeme_str()) {
                Some(number) => *value = Value::Integer(number),
                None => return Err(self.fail("hexadecimal is out of range", source)),
            },
            Token::Real => match parse_real(&source.lexeme_str()) {
                Some(number) => *value = Value::Real(number),
                None => return Err(self.fail("malformed number", source)),
            },
            Token::Identifier => {
                *value = match source.lexeme() {
                    b"true" => Value::Bool(true),
                    b"false" => Value::Bool(false),
                    b"null" => Value::Null,
                    b"NaN" => Value::Real(f64::NAN),
                    b"Infinity" => Value::Real(f64::INFINITY),
                    // any other bare word reads as a string
                    other => Value::String(String::from_utf8_lossy(other).into_owned()),
                };
            }
            Token::ArrayBegin => return self.parse_array(source, value),
            Token::ObjectBegin => return self.parse_object(source, value),
            _ => return Err(self.fail("value was expected", source)),
        }
        Ok(())
    }

    fn parse_array(&mut self, source: &mut Source<'_>, value: &mut Value) -> Result<(), Error> {
        *value = Value::Array(Vec::new());
        let mut token = next_token(source);
        while token != Token::ArrayEnd {
            let mut element = Value::Null;
            if let Err(error) = self.parse_value(token, source, &mut element) {
                if self.options.collect_errors {
                    return Err(self.fail("value was expected", source));
                }
                return Err(error);
            }
            value.append(element);
            token = next_token(source);
            if token == Token::Next {
                token = next_token(source);
            } else if token != Token::ArrayEnd {
                return Err(self.fail("']' or ',' were expected", source));
            }
        }
        Ok(())
    }

    fn parse_object(&mut self, source: &mut Source<'_>, value: &mut Value) -> Result<(), Error> {
        *value = Value::Object(Object::new());
        let mut token = next_token(source);
        while token != Token::ObjectEnd {
            let key = match token {
                Token::Identifier => source.lexeme_str().into_owned(),
                Token::String => unescape(source.lexeme()),
                _ => return Err(self.fail("identifier, string or '}' were expected", source)),
            };
            if key.is_empty() {
                return Err(self.fail("empty object key", source));
            }
            if next_token(source) != Token::Assignment {
                return Err(self.fail("assignment was expected", source));
            }
            let next = next_token(source);
            // duplicate keys overwrite, last one wins
            if let Err(error) = self.parse_value(next, source, &mut value[key.as_str()]) {
                if self.options.collect_errors {
                    return Err(self.fail("value was expected", source));
                }
                return Err(error);
            }
            token = next_token(source);
            if token == Token::Next {
                token = next_token(source);
            } else if token != Token::ObjectEnd {
                return Err(self.fail("'}' or ',' were expected", source));
            }
        }
        Ok(())
    }
}

/// Parses with a default fail-fast reader.
pub fn parse(text: &str) -> Result<Value, Error> {
    Reader::new().parse_str(text)
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

fn parse_hex(text: &str) -> Option<i64> {
    let (negative, rest) = split_sign(text);
    let digits = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"))?;
    let magnitude = i64::from_str_radix(digits, 16).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Sign-aware real parse; applying the sign by negation keeps the sign
/// bit of NaN observable.
fn parse_real(text: &str) -> Option<f64> {
    let (negative, rest) = split_sign(text);
    let magnitude: f64 = rest.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Decodes a quoted string lexeme: strips the delimiters, resolves the
/// escapes, drops backslash-newline line continuations and expands
/// `\uXXXX`. Unknown escapes pass their character through.
pub(crate) fn unescape(lexeme: &[u8]) -> String {
    let inner = if lexeme.len() >= 2 {
        &lexeme[1..lexeme.len() - 1]
    } else {
        lexeme
    };
    let mut bytes = Vec::with_capacity(inner.len());
    let mut cursor = 0;
    while cursor < inner.len() {
        let byte = inner[cursor];
        cursor += 1;
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        let Some(&escaped) = inner.get(cursor) else {
            break;
        };
        cursor += 1;
        match escaped {
            b'b' => bytes.push(0x08),
            b'f' => bytes.push(0x0C),
            b'n' => bytes.push(b'\n'),
            b'r' => bytes.push(b'\r'),
            b't' => bytes.push(b'\t'),
            b'\n' => {}
            b'u' => {
                let end = (cursor + 4).min(inner.len());
                let digits = std::str::from_utf8(&inner[cursor..end]).unwrap_or("");
                let unicode = u32::from_str_radix(digits, 16).unwrap_or(0xFFFD);
                cursor = end;
                encode_unicode(unicode, &mut bytes);
            }
            other => bytes.push(other),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// UTF-8 encodes a codepoint into `bytes`.
pub(crate) fn encode_unicode(unicode: u32, bytes: &mut Vec<u8>) {
    if unicode <= 0x7F {
        bytes.push(unicode as u8);
    } else if unicode <= 0x7FF {
        bytes.push(0xC0 | (unicode >> 6) as u8);
        bytes.push(0x80 | (unicode & 0x3F) as u8);
    } else if unicode <= 0xFFFF {
        bytes.push(0xE0 | (unicode >> 12) as u8);
        bytes.push(0x80 | ((unicode >> 6) & 0x3F) as u8);
        bytes.push(0x80 | (unicode & 0x3F) as u8);
    } else {
        bytes.push(0xF0 | (unicode >> 18) as u8);
        bytes.push(0x80 | ((unicode >> 12) & 0x3F) as u8);
        bytes.push(0x80 | ((unicode >> 6) & 0x3F) as u8);
        bytes.push(0x80 | (unicode & 0x3F) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Type;

    fn parsed(text: &str) -> Value {
        parse(text).unwrap()
    }

    #[test]
    fn parse_keywords() {
        assert!(parsed("null").is_null());
        assert_eq!(parsed("true"), Value::Bool(true));
        assert_eq!(parsed("false"), Value::Bool(false));
    }

    #[test]
    fn parse_integers() {
        assert_eq!(parsed("2020"), Value::Integer(2020));
        assert_eq!(parsed("+2020"), Value::Integer(2020));
        assert_eq!(parsed("-17"), Value::Integer(-17));
    }

    #[test]
    fn parse_hex_literals() {
        assert_eq!(parsed("0xabc123"), Value::Integer(0xABC123));
        assert_eq!(parsed("0XFF"), Value::Integer(255));
        assert_eq!(parsed("-0x123ABC"), Value::Integer(-0x123ABC));
    }

    #[test]
    fn parse_reals() {
        assert_eq!(parsed("3.14"), Value::Real(3.14));
        assert_eq!(parsed(".123"), Value::Real(0.123));
        assert_eq!(parsed("123."), Value::Real(123.0));
        assert_eq!(parsed("1e-6"), Value::Real(1e-6));
        assert_eq!(parsed("+2E-6"), Value::Real(2e-6));
        assert_eq!(parsed("-3e+3"), Value::Real(-3000.0));
        assert_eq!(parsed("4E5"), Value::Real(400000.0));
    }

    #[test]
    fn parse_real_keywords_keep_the_sign_bit() {
        let nan = parsed("NaN");
        assert!(nan.is_real());
        assert!(nan.as_real().is_nan());
        assert!(!nan.is_negative());

        let negative_nan = parsed("-NaN");
        assert!(negative_nan.as_real().is_nan());
        assert!(negative_nan.is_negative());

        assert_eq!(parsed("Infinity").as_real(), f64::INFINITY);
        assert_eq!(parsed("+Infinity").as_real(), f64::INFINITY);
        assert_eq!(parsed("-Infinity").as_real(), f64::NEG_INFINITY);
    }

    #[test]
    fn parse_strings_in_either_quote() {
        assert_eq!(parsed("\"json\"").as_string(), "json");
        assert_eq!(parsed("'jsoff'").as_string(), "jsoff");
        assert_eq!(parsed("'it\\'s'").as_string(), "it's");
    }

    #[test]
    fn bare_words_read_as_strings() {
        let value = parsed("json5");
        assert_eq!(value.get_type(), Type::String);
        assert_eq!(value.as_string(), "json5");
    }

    #[test]
    fn unicode_escapes_expand_to_utf8() {
        assert_eq!(
            parsed("\"escape \\u00A9 \\u00abJSON\\u00bb\"").as_string(),
            "escape © «JSON»"
        );
    }

    #[test]
    fn escaped_newline_is_a_line_continuation() {
        assert_eq!(
            parsed("'string with no\\\n new line'").as_string(),
            "string with no new line"
        );
    }

    #[test]
    fn control_escapes() {
        assert_eq!(parsed("\"a\\tb\\nc\"").as_string(), "a\tb\nc");
        assert_eq!(parsed("\"\\\"\\\\\\/\"").as_string(), "\"\\/");
    }

    #[test]
    fn parse_arrays() {
        let value = parsed("[1, 2.78, 'three']");
        assert_eq!(value.size(), 3);
        assert_eq!(value[0], Value::Integer(1));
        assert_eq!(value[1], Value::Real(2.78));
        assert_eq!(value[2].as_string(), "three");
    }

    #[test]
    fn parse_objects_with_bare_keys() {
        let value = parsed("{json: 'on', \"jsoff\": 0}");
        assert!(value.is_object());
        assert_eq!(value["json"].as_string(), "on");
        assert_eq!(value["jsoff"], Value::Integer(0));
    }

    #[test]
    fn trailing_commas_are_permitted() {
        assert_eq!(parsed("[1, 2,]").size(), 2);
        assert_eq!(parsed("{one: 1,}").size(), 1);
    }

    #[test]
    fn duplicate_keys_overwrite() {
        let value = parsed("{a: 1, a: 2}");
        assert_eq!(value.size(), 1);
        assert_eq!(value["a"], Value::Integer(2));
    }

    #[test]
    fn comments_are_skipped() {
        let value = parsed("// heading\n[1, /* gap */ 2] // trailing");
        assert_eq!(value, Value::from_iter([1, 2]));
    }

    #[test]
    fn multibyte_whitespace_is_skipped() {
        let value = parsed("\u{feff}[1,\u{2028}2\u{2029}]");
        assert_eq!(value, Value::from_iter([1, 2]));
    }

    #[test]
    fn nested_structures() {
        let value = parsed("{list: [true, {inner: -1}], n: null}");
        assert_eq!(value["list"][1]["inner"], Value::Integer(-1));
        assert!(value["n"].is_null());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }

    #[test]
    fn empty_object_key_is_an_error() {
        assert!(parse("{'': 1}").is_err());
    }

    #[test]
    fn error_position_points_before_the_offender() {
        let mut reader = Reader::new();
        let error = reader.parse_str("{json = 5}").unwrap_err();
        assert_eq!(error.reason(), "assignment was expected");
        assert_eq!(error.line(), 1);
        assert_eq!(error.column(), 6);
    }

    #[test]
    fn error_position_tracks_lines() {
        let mut reader = Reader::new();
        let error = reader.parse_str("[\n  json; 5\n]").unwrap_err();
        assert_eq!(error.line(), 2);
        assert_eq!(error.column(), 7);
    }

    #[test]
    fn collect_mode_records_errors_and_returns_the_partial_tree() {
        let mut reader = Reader::new().collect_errors(true);
        let value = reader.parse_str("{json = 5}").unwrap();
        assert!(value.is_object());
        assert!(reader.has_errors());
        assert_eq!(reader.errors()[0].reason(), "assignment was expected");

        // a failing element inside an array stacks a second error
        let value = reader.parse_str("[1, ;]").unwrap();
        assert!(value.is_array());
        assert_eq!(value.size(), 1);
        assert_eq!(reader.errors().len(), 2);
        assert_eq!(reader.last_error().unwrap().reason(), "value was expected");
    }

    #[test]
    fn strict_mode_rejects_trailing_content() {
        let mut strict = Reader::new().strict(true);
        let error = strict.parse_str("{json: 5} ...").unwrap_err();
        assert_eq!(error.reason(), "expected end of input");

        let mut lenient = Reader::new();
        assert!(lenient.parse_str("{json: 5} ...").is_ok());
    }

    #[test]
    fn reader_is_reusable_and_clears_its_errors() {
        let mut reader = Reader::new().collect_errors(true);
        reader.parse_str("{bad").unwrap();
        assert!(reader.has_errors());
        let value = reader.parse_str("{good: 1}").unwrap();
        assert!(!reader.has_errors());
        assert_eq!(value["good"], Value::Integer(1));
    }

    #[test]
    fn parse_from_a_read_stream() {
        let stream = std::io::Cursor::new(b"[1, 'two']".to_vec());
        let value = Reader::new().parse_reader(stream).unwrap();
        assert_eq!(value.size(), 2);
    }

    #[test]
    fn parse_from_a_byte_iterator() {
        let text = "{n: 0x10}";
        let value = Reader::new().parse_iter(text.bytes()).unwrap();
        assert_eq!(value["n"], Value::Integer(16));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(parse("'oops").is_err());
        assert!(parse("\"half\\").is_err());
    }

    #[test]
    fn bad_escape_is_an_error() {
        assert!(parse("'\\q'").is_err());
        assert!(parse("'\\u12'").is_err());
    }

    #[test]
    fn hex_only_follows_a_lone_zero() {
        // "10x" stops the integer at the 'x', leaving trailing content
        assert!(Reader::new().strict(true).parse_str("10x10").is_err());
        assert_eq!(parsed("0x10"), Value::Integer(16));
    }
}
