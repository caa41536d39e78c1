use std::fmt;

use crate::value::Value;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// The whole document, addressed by a lone ".".
    Root,
    Key(String),
    Index(usize),
}

/// An address into a document: a chain of `.key`, `.'quoted key'` and
/// `[index]` segments. A leading key may omit its dot. Malformed input
/// parses to an empty path, which resolves to Null.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

#[derive(Clone, Copy)]
enum State {
    Start,
    DotOrBracket,
    Dot,
    Bracket,
    Quote(char),
    Key,
    Index,
    QuotedKey(char),
}

/// Key characters are anything that is not ASCII punctuation or
/// whitespace, plus underscore and dash.
fn is_key_symbol(character: char) -> bool {
    character == '_'
        || character == '-'
        || !(character.is_ascii_punctuation() || character.is_ascii_whitespace())
}

fn parse(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut state = State::Start;
    let mut offset = 0;
    for (cursor, character) in text.char_indices() {
        match state {
            State::Start => match character {
                '.' => state = State::Dot,
                '[' => state = State::Bracket,
                '"' | '\'' => state = State::Quote(character),
                c if is_key_symbol(c) => {
                    offset = cursor;
                    state = State::Key;
                }
                _ => return Vec::new(),
            },
            State::DotOrBracket => match character {
                '.' => state = State::Dot,
                '[' => state = State::Bracket,
                _ => return Vec::new(),
            },
            State::Dot => match character {
                '"' | '\'' => state = State::Quote(character),
                c if is_key_symbol(c) => {
                    offset = cursor;
                    state = State::Key;
                }
                _ => return Vec::new(),
            },
            State::Bracket => match character {
                c if c.is_ascii_digit() => {
                    offset = cursor;
                    state = State::Index;
                }
                _ => return Vec::new(),
            },
            State::Quote(quote) => {
                if character == quote {
                    // empty quoted key
                    return Vec::new();
                }
                offset = cursor;
                state = State::QuotedKey(quote);
            }
            State::Key => match character {
                '.' => {
                    segments.push(Segment::Key(text[offset..cursor].to_owned()));
                    state = State::Dot;
                }
                '[' => {
                    segments.push(Segment::Key(text[offset..cursor].to_owned()));
                    state = State::Bracket;
                }
                c if is_key_symbol(c) => {}
                _ => return Vec::new(),
            },
            State::Index => match character {
                ']' => {
                    let Ok(index) = text[offset..cursor].parse::<usize>() else {
                        return Vec::new();
                    };
                    segments.push(Segment::Index(index));
                    state = State::DotOrBracket;
                }
                c if c.is_ascii_digit() => {}
                _ => return Vec::new(),
            },
            State::QuotedKey(quote) => {
                if character == quote {
                    segments.push(Segment::Key(text[offset..cursor].to_owned()));
                    state = State::DotOrBracket;
                }
            }
        }
    }
    match state {
        State::Key => segments.push(Segment::Key(text[offset..].to_owned())),
        State::Dot if segments.is_empty() => segments.push(Segment::Root),
        _ => {}
    }
    segments
}

impl Path {
    pub fn new(text: &str) -> Self {
        Self {
            segments: parse(text),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Walks the document immutably. An empty path, a missing member, an
    /// out-of-range index or a type mismatch resolves to the shared Null
    /// sentinel.
    pub fn resolve<'a>(&self, root: &'a Value) -> &'a Value {
        if self.segments.first() == Some(&Segment::Root) {
            return root;
        }
        let mut node = root;
        for segment in &self.segments {
            match segment {
                Segment::Key(key) if node.has(key) => node = &node[key.as_str()],
                Segment::Index(index) if node.has_index(*index) => node = &node[*index],
                _ => return Value::null(),
            }
        }
        if self.segments.is_empty() {
            return Value::null();
        }
        node
    }

    /// Walks the document mutably, auto-vivifying containers along the
    /// way, and returns the addressed slot.
    pub fn make<'a>(&self, root: &'a mut Value) -> &'a mut Value {
        self.segments.iter().fold(root, |node, segment| match segment {
            Segment::Root => node,
            Segment::Key(key) => &mut node[key.as_str()],
            Segment::Index(index) => &mut node[*index],
        })
    }
}

impl From<&str> for Path {
    fn from(text: &str) -> Self {
        Path::new(text)
    }
}

impl fmt::Display for Path {
    /// Canonical form: `.key` for identifier-safe keys, `.'key'`
    /// otherwise, `[index]` for indices, a lone `.` for the root.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Root => f.write_str(".")?,
                Segment::Key(key) => {
                    if !key.is_empty() && key.chars().all(is_key_symbol) {
                        write!(f, ".{key}")?;
                    } else {
                        write!(f, ".'{key}'")?;
                    }
                }
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse as parse_json;
    use crate::value::Type;

    #[test]
    fn lone_dot_resolves_the_root() {
        let json = Value::new(Type::Object);
        assert_eq!(Path::new(".").resolve(&json).get_type(), Type::Object);
        assert_eq!(Path::new(".").segments(), &[Segment::Root]);
    }

    #[test]
    fn empty_path_resolves_null() {
        let json = Value::new(Type::Array);
        assert!(Path::new("").is_empty());
        assert!(Path::new("").resolve(&json).is_null());
    }

    #[test]
    fn resolve_into_objects() {
        let json = parse_json(
            "{id: 0xC0FFEE, 'not id': 'json5', array: [true, 1.2, {one: 1, two: 2}]}",
        )
        .unwrap();
        assert_eq!(Path::new(".id").resolve(&json).as_integer(), 0xC0FFEE);
        assert_eq!(Path::new(".'not id'").resolve(&json).as_string(), "json5");
        assert_eq!(Path::new(".array").resolve(&json).size(), 3);
        assert!(Path::new(".array[0]").resolve(&json).as_bool());
        assert_eq!(Path::new(".array[1]").resolve(&json).as_real(), 1.2);
        assert_eq!(Path::new(".array[2].two").resolve(&json).as_integer(), 2);
        assert!(Path::new(".idk.wtf").resolve(&json).is_null());
    }

    #[test]
    fn resolve_into_arrays() {
        let json = parse_json("[1, 2.0, 'three', [true, [1, 2, 3]]]").unwrap();
        assert_eq!(Path::new("[2]").resolve(&json).as_string(), "three");
        assert!(Path::new("[3][0]").resolve(&json).as_bool());
        assert_eq!(Path::new("[3][1][1]").resolve(&json).as_integer(), 2);
        assert!(Path::new("[3][3]").resolve(&json).is_null());
    }

    #[test]
    fn leading_key_needs_no_dot() {
        let json = parse_json("{one: {two: 2}}").unwrap();
        assert_eq!(Path::new("one.two").resolve(&json).as_integer(), 2);
    }

    #[test]
    fn malformed_paths_parse_empty() {
        assert!(Path::new("[1").is_empty());
        assert!(Path::new("['key']").is_empty());
        assert!(Path::new(".''").is_empty());
        assert!(Path::new("..").is_empty());
        assert!(Path::new(".a..b").is_empty());
        assert!(Path::new("['unterminated").is_empty());
    }

    #[test]
    fn make_object_members() {
        let mut json = Value::default();
        *Path::new(".one").make(&mut json) = 1.into();
        assert!(json.has("one"));
        assert_eq!(json["one"].as_integer(), 1);
    }

    #[test]
    fn make_nested_objects() {
        let mut json = Value::default();
        *Path::new(".one.two.three").make(&mut json) = Value::from_iter([1, 2, 3]);
        assert!(json["one"]["two"].has("three"));
        assert_eq!(json["one"]["two"]["three"].get_type(), Type::Array);
    }

    #[test]
    fn make_nested_arrays() {
        let mut json = Value::default();
        *Path::new("[0][1][2]").make(&mut json) = Value::new(Type::Object);
        assert_eq!(json.size(), 1);
        assert_eq!(json[0].size(), 2);
        assert_eq!(json[0][1].size(), 3);
        assert_eq!(json[0][1][2].get_type(), Type::Object);
    }

    #[test]
    fn make_mixed_path() {
        let mut json = Value::default();
        *Path::new(".array[0].'127.0.0.1'").make(&mut json) = "localhost".into();
        assert_eq!(json["array"][0]["127.0.0.1"].as_string(), "localhost");
    }

    #[test]
    fn make_on_the_root_path_is_the_root() {
        let mut json = Value::from(1);
        *Path::new(".").make(&mut json) = 2.into();
        assert_eq!(json.as_integer(), 2);
    }

    #[test]
    fn display_canonicalizes() {
        assert_eq!(Path::new(".").to_string(), ".");
        assert_eq!(Path::new("one[2].'not id'").to_string(), ".one[2].'not id'");
        assert_eq!(Path::new(".'plain'").to_string(), ".plain");
        assert_eq!(Path::new("").to_string(), "");
    }
}
