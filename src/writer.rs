use std::fmt::{self, Write as _};

use crate::value::Value;

/// Serialization switches. Defaults give compact single-line output with
/// quoted keys.
#[derive(Debug, Clone)]
pub struct Options {
    pub pretty: bool,
    pub quote_keys: bool,
    pub indent_char: char,
    pub indent_size: usize,
    pub left_margin: usize,
    pub new_line: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            pretty: false,
            quote_keys: true,
            indent_char: ' ',
            indent_size: 3,
            left_margin: 0,
            new_line: "\n".to_owned(),
        }
    }
}

/// Configurable serializer for [`Value`] trees.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    options: Options,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.options.pretty = pretty;
        self
    }

    pub fn quote_keys(mut self, quote: bool) -> Self {
        self.options.quote_keys = quote;
        self
    }

    pub fn indent_char(mut self, character: char) -> Self {
        self.options.indent_char = character;
        self
    }

    pub fn indent_size(mut self, size: usize) -> Self {
        self.options.indent_size = size;
        self
    }

    pub fn left_margin(mut self, margin: usize) -> Self {
        self.options.left_margin = margin;
        self
    }

    pub fn new_line(mut self, text: impl Into<String>) -> Self {
        self.options.new_line = text.into();
        self
    }

    pub fn write<W: fmt::Write>(&self, value: &Value, out: &mut W) -> fmt::Result {
        self.write_indentation(0, out)?;
        self.write_value(value, 0, out)
    }

    pub fn render(&self, value: &Value) -> String {
        let mut text = String::new();
        // writing into a String cannot fail
        let _ = self.write(value, &mut text);
        text
    }

    fn write_new_line<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        if self.options.pretty {
            out.write_str(&self.options.new_line)?;
        }
        Ok(())
    }

    fn write_indentation<W: fmt::Write>(&self, level: usize, out: &mut W) -> fmt::Result {
        if !self.options.pretty {
            return Ok(());
        }
        let width = self.options.left_margin + self.options.indent_size * level;
        for _ in 0..width {
            out.write_char(self.options.indent_char)?;
        }
        Ok(())
    }

    fn write_key<W: fmt::Write>(&self, key: &str, out: &mut W) -> fmt::Result {
        if self.options.quote_keys || !is_identifier(key) {
            out.write_char('"')?;
            escape_into(key, out)?;
            out.write_char('"')?;
        } else {
            out.write_str(key)?;
        }
        out.write_char(':')?;
        if self.options.pretty {
            out.write_char(' ')?;
        }
        Ok(())
    }

    fn write_value<W: fmt::Write>(&self, value: &Value, level: usize, out: &mut W) -> fmt::Result {
        match value {
            Value::Null => out.write_str("null"),
            Value::Bool(true) => out.write_str("true"),
            Value::Bool(false) => out.write_str("false"),
            Value::Integer(number) => write!(out, "{number}"),
            Value::Real(number) => {
                if number.is_sign_negative() {
                    out.write_char('-')?;
                }
                let magnitude = number.abs();
                if magnitude.is_nan() {
                    out.write_str("NaN")
                } else if magnitude.is_infinite() {
                    out.write_str("Infinity")
                } else {
                    write!(out, "{magnitude}")
                }
            }
            Value::String(text) => {
                out.write_char('"')?;
                escape_into(text, out)?;
                out.write_char('"')
            }
            Value::Array(elements) => {
                out.write_char('[')?;
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        out.write_char(',')?;
                    }
                    self.write_new_line(out)?;
                    self.write_indentation(level + 1, out)?;
                    self.write_value(element, level + 1, out)?;
                }
                if !elements.is_empty() {
                    self.write_new_line(out)?;
                    self.write_indentation(level, out)?;
                }
                out.write_char(']')
            }
            Value::Object(members) => {
                out.write_char('{')?;
                for (index, (key, member)) in members.iter().enumerate() {
                    if index > 0 {
                        out.write_char(',')?;
                    }
                    self.write_new_line(out)?;
                    self.write_indentation(level + 1, out)?;
                    self.write_key(key, out)?;
                    self.write_value(member, level + 1, out)?;
                }
                if !members.is_empty() {
                    self.write_new_line(out)?;
                    self.write_indentation(level, out)?;
                }
                out.write_char('}')
            }
        }
    }
}

/// True when `text` is a bare identifier: an ASCII letter or underscore
/// followed by letters, digits or underscores.
pub fn is_identifier(text: &str) -> bool {
    let mut characters = text.chars();
    match characters.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    characters.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Escapes a string body: quotes, backslash and slash get a backslash,
/// the usual control shorthands apply, and every other control or
/// non-ASCII codepoint becomes lowercase `\uXXXX`.
fn escape_into<W: fmt::Write>(text: &str, out: &mut W) -> fmt::Result {
    let bytes = text.as_bytes();
    let mut cursor = 0;
    while cursor < bytes.len() {
        let byte = bytes[cursor];
        match byte {
            b'"' | b'\'' | b'\\' | b'/' => {
                out.write_char('\\')?;
                out.write_char(byte as char)?;
                cursor += 1;
            }
            0x08 => {
                out.write_str("\\b")?;
                cursor += 1;
            }
            0x0C => {
                out.write_str("\\f")?;
                cursor += 1;
            }
            b'\n' => {
                out.write_str("\\n")?;
                cursor += 1;
            }
            b'\r' => {
                out.write_str("\\r")?;
                cursor += 1;
            }
            b'\t' => {
                out.write_str("\\t")?;
                cursor += 1;
            }
            _ => {
                let (unicode, length) = decode_utf8(&bytes[cursor..]);
                if unicode < 0x20 || unicode >= 0x80 {
                    write!(out, "\\u{unicode:04x}")?;
                } else {
                    out.write_char(unicode as u8 as char)?;
                }
                cursor += length;
            }
        }
    }
    Ok(())
}

/// Decodes one UTF-8 sequence, returning the codepoint and the number of
/// bytes consumed. Truncated sequences stop at the defect.
pub(crate) fn decode_utf8(bytes: &[u8]) -> (u32, usize) {
    let first = u32::from(bytes[0]);
    let (mut unicode, extent) = if first >= 0xF0 {
        (first & 0x07, 4)
    } else if first >= 0xE0 {
        (first & 0x0F, 3)
    } else if first >= 0xC0 {
        (first & 0x1F, 2)
    } else {
        (first, 1)
    };
    let mut length = 1;
    while length < extent && length < bytes.len() {
        let byte = bytes[length];
        if byte & 0xC0 != 0x80 {
            break;
        }
        unicode = (unicode << 6) | u32::from(byte & 0x3F);
        length += 1;
    }
    (unicode, length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Type;

    fn compact(value: &Value) -> String {
        Writer::new().render(value)
    }

    #[test]
    fn write_scalars() {
        assert_eq!(compact(&Value::Null), "null");
        assert_eq!(compact(&Value::from(true)), "true");
        assert_eq!(compact(&Value::from(false)), "false");
        assert_eq!(compact(&Value::from(123)), "123");
        assert_eq!(compact(&Value::from(-987)), "-987");
        assert_eq!(compact(&Value::from(3.14)), "3.14");
        assert_eq!(compact(&Value::from(-2.78)), "-2.78");
    }

    #[test]
    fn write_non_finite_reals() {
        assert_eq!(compact(&Value::from(f64::NAN)), "NaN");
        assert_eq!(compact(&Value::from(-f64::NAN)), "-NaN");
        assert_eq!(compact(&Value::from(f64::INFINITY)), "Infinity");
        assert_eq!(compact(&Value::from(f64::NEG_INFINITY)), "-Infinity");
    }

    #[test]
    fn write_string_with_special_chars() {
        assert_eq!(compact(&Value::from("ijhgjih")), "\"ijhgjih\"");
        assert_eq!(compact(&Value::from("'\"\t\r\n")), "\"\\'\\\"\\t\\r\\n\"");
    }

    #[test]
    fn write_string_with_unicode() {
        let value = Value::from_iter([Value::from("€"), Value::from(123)]);
        assert_eq!(compact(&value), "[\"\\u20ac\",123]");
    }

    #[test]
    fn write_compact_containers() {
        let array = Value::from_iter([Value::from(1), Value::from(2.78), Value::from("three")]);
        assert_eq!(compact(&array), "[1,2.78,\"three\"]");

        let mut object = Value::new(Type::Object);
        object["one"] = 1.into();
        assert_eq!(compact(&object), "{\"one\":1}");

        assert_eq!(compact(&Value::new(Type::Array)), "[]");
        assert_eq!(compact(&Value::new(Type::Object)), "{}");
    }

    #[test]
    fn write_without_quoting() {
        let mut object = Value::new(Type::Object);
        object["one"] = 1.into();
        assert_eq!(Writer::new().quote_keys(false).render(&object), "{one:1}");

        // non-identifier keys stay quoted
        let mut tricky = Value::new(Type::Object);
        tricky["not id"] = 1.into();
        assert_eq!(
            Writer::new().quote_keys(false).render(&tricky),
            "{\"not id\":1}"
        );
    }

    #[test]
    fn pretty_write_array() {
        let value = Value::from_iter([Value::from(1), Value::from("two")]);
        assert_eq!(
            Writer::new().pretty(true).render(&value),
            "[\n   1,\n   \"two\"\n]"
        );
    }

    #[test]
    fn pretty_write_object() {
        let mut value = Value::new(Type::Object);
        value["one"] = 1.into();
        assert_eq!(
            Writer::new().pretty(true).render(&value),
            "{\n   \"one\": 1\n}"
        );
    }

    #[test]
    fn pretty_write_with_new_line() {
        let value = Value::from_iter([123]);
        assert_eq!(
            Writer::new().new_line("\r\n").pretty(true).render(&value),
            "[\r\n   123\r\n]"
        );
    }

    #[test]
    fn pretty_write_with_indent_size() {
        let value = Value::from_iter([Value::from(3.14)]);
        assert_eq!(
            Writer::new().indent_size(5).pretty(true).render(&value),
            "[\n     3.14\n]"
        );
    }

    #[test]
    fn pretty_write_with_indent_char() {
        let value = Value::from_iter([Value::Null]);
        assert_eq!(
            Writer::new()
                .indent_char('\t')
                .indent_size(1)
                .pretty(true)
                .render(&value),
            "[\n\tnull\n]"
        );
    }

    #[test]
    fn pretty_write_with_left_margin() {
        let value = Value::from_iter([Value::from(true)]);
        assert_eq!(
            Writer::new()
                .left_margin(1)
                .indent_size(2)
                .pretty(true)
                .render(&value),
            " [\n   true\n ]"
        );
    }

    #[test]
    fn nested_pretty_output() {
        let mut value = Value::new(Type::Object);
        value["list"] = Value::from_iter([1, 2]);
        assert_eq!(
            Writer::new().pretty(true).render(&value),
            "{\n   \"list\": [\n      1,\n      2\n   ]\n}"
        );
    }

    #[test]
    fn identifier_classification() {
        assert!(is_identifier("plain_name2"));
        assert!(is_identifier("_lead"));
        assert!(!is_identifier("2lead"));
        assert!(!is_identifier("not id"));
        assert!(!is_identifier(""));
    }
}
