use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::error::Error;
use crate::reader::Reader;
use crate::writer::Writer;

pub type Array = Vec<Value>;
pub type Object = BTreeMap<String, Value>;

static NULL: Value = Value::Null;

/// Type tag of a [`Value`]. The declaration order doubles as the rank used
/// when values of different types are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    Null,
    Bool,
    Real,
    Integer,
    String,
    Array,
    Object,
}

impl Type {
    pub fn name(self) -> &'static str {
        match self {
            Type::Null => "null",
            Type::Bool => "bool",
            Type::Real => "real",
            Type::Integer => "integer",
            Type::String => "string",
            Type::Array => "array",
            Type::Object => "object",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamic JSON-like document value.
///
/// Arrays keep their elements in order; objects keep their members sorted
/// by key, regardless of insertion or parse order.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Array(Array),
    Object(Object),
}

impl Value {
    /// An empty value of the given type.
    pub fn new(kind: Type) -> Value {
        match kind {
            Type::Null => Value::Null,
            Type::Bool => Value::Bool(false),
            Type::Real => Value::Real(0.0),
            Type::Integer => Value::Integer(0),
            Type::String => Value::String(String::new()),
            Type::Array => Value::Array(Array::new()),
            Type::Object => Value::Object(Object::new()),
        }
    }

    /// The shared sentinel returned by immutable indexing on a miss.
    pub fn null() -> &'static Value {
        &NULL
    }

    /// Builds an Array or an Object from a heterogeneous list: the result
    /// is an Object exactly when every element is a two-element array whose
    /// first element is a string. An empty list classifies as an Object.
    pub fn from_list<I>(items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        let items: Vec<Value> = items.into_iter().collect();
        let keyed = items.iter().all(|item| match item {
            Value::Array(pair) => pair.len() == 2 && pair[0].is_string(),
            _ => false,
        });
        if !keyed {
            return Value::Array(items);
        }
        let mut members = Object::new();
        for item in items {
            if let Value::Array(mut pair) = item {
                if let (Some(value), Some(Value::String(key))) = (pair.pop(), pair.pop()) {
                    members.insert(key, value);
                }
            }
        }
        Value::Object(members)
    }

    /// Builds a String value from UTF-16 code units. Unpaired surrogates
    /// are replaced.
    pub fn from_utf16(units: &[u16]) -> Value {
        Value::String(String::from_utf16_lossy(units))
    }

    pub fn get_type(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Bool(_) => Type::Bool,
            Value::Integer(_) => Type::Integer,
            Value::Real(_) => Type::Real,
            Value::String(_) => Type::String,
            Value::Array(_) => Type::Array,
            Value::Object(_) => Type::Object,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.get_type().name()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Value::Real(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Real(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Value::Integer(number) => *number < 0,
            Value::Real(number) => number.is_sign_negative(),
            _ => false,
        }
    }

    /// Destroys the current content and reinstalls an empty value of the
    /// given type.
    pub fn reset(&mut self, kind: Type) {
        *self = Value::new(kind);
    }

    /// Moves the content out, leaving Null behind.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    pub fn swap(&mut self, other: &mut Value) {
        std::mem::swap(self, other);
    }

    /// Best-effort coercion to bool. Containers and Null are false; NaN is
    /// false; a string is false when empty or case-insensitively "false".
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(flag) => *flag,
            Value::Integer(number) => *number != 0,
            Value::Real(number) => !(number.is_nan() || *number == 0.0),
            Value::String(text) => !(text.is_empty() || text.eq_ignore_ascii_case("false")),
            _ => false,
        }
    }

    /// Best-effort coercion to an integer. Strings contribute their longest
    /// leading decimal run, "3D" giving 3 and "any" giving 0.
    pub fn as_integer(&self) -> i64 {
        match self {
            Value::Bool(flag) => i64::from(*flag),
            Value::Integer(number) => *number,
            Value::Real(number) => *number as i64,
            Value::String(text) => integer_prefix(text),
            _ => 0,
        }
    }

    /// Best-effort coercion to a real. Strings contribute their longest
    /// leading numeric prefix, "2.4 GHz" giving 2.4.
    pub fn as_real(&self) -> f64 {
        match self {
            Value::Bool(flag) => {
                if *flag {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Integer(number) => *number as f64,
            Value::Real(number) => *number,
            Value::String(text) => real_prefix(text),
            _ => 0.0,
        }
    }

    /// Best-effort coercion to a string. Scalars serialize; containers
    /// yield an empty string.
    pub fn as_string(&self) -> String {
        match self {
            Value::String(text) => text.clone(),
            Value::Array(_) | Value::Object(_) => String::new(),
            other => Writer::new().render(other),
        }
    }

    /// UTF-16 code units of the string coercion.
    pub fn to_utf16(&self) -> Vec<u16> {
        self.as_string().encode_utf16().collect()
    }

    /// Element count for containers, byte length for strings, 0 otherwise.
    pub fn size(&self) -> usize {
        match self {
            Value::String(text) => text.len(),
            Value::Array(elements) => elements.len(),
            Value::Object(members) => members.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(text) => text.is_empty(),
            Value::Array(elements) => elements.is_empty(),
            Value::Object(members) => members.is_empty(),
            _ => false,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        match self {
            Value::Object(members) => members.contains_key(key),
            _ => false,
        }
    }

    pub fn has_index(&self, index: usize) -> bool {
        match self {
            Value::Array(elements) => index < elements.len(),
            _ => false,
        }
    }

    /// The member under `key`, or `default` when the receiver is not an
    /// object or the member is missing.
    pub fn get<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        match self {
            Value::Object(members) => members.get(key).unwrap_or(default),
            _ => default,
        }
    }

    /// The element under `index`, or `default` when the receiver is not an
    /// array or the index is out of range.
    pub fn get_index<'a>(&'a self, index: usize, default: &'a Value) -> &'a Value {
        match self {
            Value::Array(elements) => elements.get(index).unwrap_or(default),
            _ => default,
        }
    }

    pub fn get_array(&self) -> Result<&Array, Error> {
        match self {
            Value::Array(elements) => Ok(elements),
            _ => Err(Error::new("value is not an array")),
        }
    }

    pub fn get_object(&self) -> Result<&Object, Error> {
        match self {
            Value::Object(members) => Ok(members),
            _ => Err(Error::new("value is not an object")),
        }
    }

    /// Pushes onto an array. A Null receiver becomes an empty array first;
    /// any other non-array receiver is converted to an array, so its old
    /// content survives as the first element.
    pub fn append(&mut self, item: impl Into<Value>) -> &mut Value {
        match self {
            Value::Array(_) => {}
            Value::Null => *self = Value::Array(Array::new()),
            _ => {
                self.convert(Type::Array);
            }
        }
        let Value::Array(elements) = self else {
            unreachable!()
        };
        let index = elements.len();
        elements.push(item.into());
        &mut elements[index]
    }

    pub fn append_all<T, I>(&mut self, items: I) -> &mut Self
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        for item in items {
            self.append(item);
        }
        self
    }

    /// In-place type conversion. Converting to the current type is a no-op;
    /// an object becomes the array of its values in key order; an array
    /// becomes an object keyed "id0", "id1", ...; any other value lands in
    /// a one-element container.
    pub fn convert(&mut self, target: Type) -> &mut Self {
        if self.get_type() == target {
            return self;
        }
        match target {
            Type::Null => *self = Value::Null,
            Type::Bool => *self = Value::Bool(self.as_bool()),
            Type::Integer => *self = Value::Integer(self.as_integer()),
            Type::Real => *self = Value::Real(self.as_real()),
            Type::String => *self = Value::String(self.as_string()),
            Type::Array => {
                let old = self.take();
                *self = Value::Array(Array::new());
                match old {
                    Value::Object(members) => {
                        for (_, member) in members {
                            self.append(member);
                        }
                    }
                    other => {
                        self.append(other);
                    }
                }
            }
            Type::Object => {
                let old = self.take();
                *self = Value::Object(Object::new());
                match old {
                    Value::Array(elements) => {
                        for (index, element) in elements.into_iter().enumerate() {
                            self[format!("id{index}").as_str()] = element;
                        }
                    }
                    other => {
                        let key = other.type_name();
                        self[key] = other;
                    }
                }
            }
        }
        self
    }

    /// Copying variant of [`Value::convert`].
    pub fn converted(&self, target: Type) -> Value {
        let mut copy = self.clone();
        copy.convert(target);
        copy
    }

    /// Iterates members: array elements in order under `None` keys, object
    /// members in key order under `Some(key)`, Null as empty. Every other
    /// type refuses.
    pub fn try_iter(&self) -> Result<Members<'_>, Error> {
        match self {
            Value::Null => Ok(Members::Empty),
            Value::Array(elements) => Ok(Members::Array(elements.iter())),
            Value::Object(members) => Ok(Members::Object(members.iter())),
            other => Err(Error::new(format!(
                "cannot iterate over a {} value",
                other.type_name()
            ))),
        }
    }

    /// Serializes with the default pretty writer.
    pub fn stringify(&self) -> String {
        Writer::new().pretty(true).render(self)
    }

    fn object_slot(&mut self) -> &mut Object {
        if !self.is_object() {
            self.reset(Type::Object);
        }
        match self {
            Value::Object(members) => members,
            _ => unreachable!(),
        }
    }

    fn array_slot(&mut self) -> &mut Array {
        if !self.is_array() {
            self.reset(Type::Array);
        }
        match self {
            Value::Array(elements) => elements,
            _ => unreachable!(),
        }
    }
}

/// strtoll-style prefix parse: skip leading whitespace, take an optional
/// sign and the longest run of decimal digits, clamp on overflow.
fn integer_prefix(text: &str) -> i64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }
    match text[..end].parse::<i64>() {
        Ok(number) => number,
        Err(_) if bytes[0] == b'-' => i64::MIN,
        Err(_) => i64::MAX,
    }
}

/// strtod-style prefix parse: optional sign, then digits with optional
/// fraction and exponent, or a case-insensitive inf/infinity/nan keyword.
fn real_prefix(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let negative = bytes.first() == Some(&b'-');
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let sign_end = end;
    let rest = &text[end..];
    if rest.get(..8).is_some_and(|head| head.eq_ignore_ascii_case("infinity")) {
        end += 8;
    } else if rest.get(..3).is_some_and(|head| head.eq_ignore_ascii_case("inf")) {
        end += 3;
    } else if rest.get(..3).is_some_and(|head| head.eq_ignore_ascii_case("nan")) {
        end += 3;
    } else {
        let mut cursor = end;
        let mut digits = 0;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
            digits += 1;
        }
        if cursor < bytes.len() && bytes[cursor] == b'.' {
            cursor += 1;
            while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
                cursor += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return 0.0;
        }
        end = cursor;
        if cursor < bytes.len() && matches!(bytes[cursor], b'e' | b'E') {
            let mut exponent = cursor + 1;
            if exponent < bytes.len() && matches!(bytes[exponent], b'+' | b'-') {
                exponent += 1;
            }
            let exponent_digits = exponent;
            while exponent < bytes.len() && bytes[exponent].is_ascii_digit() {
                exponent += 1;
            }
            if exponent > exponent_digits {
                end = exponent;
            }
        }
    }
    // sign applied by negation so the sign bit of NaN survives
    let magnitude: f64 = text[sign_end..end].parse().unwrap_or(0.0);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Iterator over the members of an array, object or Null value.
pub enum Members<'a> {
    Empty,
    Array(std::slice::Iter<'a, Value>),
    Object(std::collections::btree_map::Iter<'a, String, Value>),
}

impl<'a> Iterator for Members<'a> {
    type Item = (Option<&'a str>, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Members::Empty => None,
            Members::Array(elements) => elements.next().map(|value| (None, value)),
            Members::Object(members) => members
                .next()
                .map(|(key, value)| (Some(key.as_str()), value)),
        }
    }
}

impl PartialOrd for Value {
    /// Values of different types order by type rank; same-type containers
    /// order lexicographically. NaN keeps its usual unordered behavior.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.get_type() != other.get_type() {
            return self.get_type().partial_cmp(&other.get_type());
        }
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Array(a), Value::Array(b)) => a.partial_cmp(b),
            (Value::Object(a), Value::Object(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Missing member or non-object receiver answers the shared Null
    /// sentinel; reading never mutates.
    fn index(&self, key: &str) -> &Value {
        match self {
            Value::Object(members) => members.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

impl IndexMut<&str> for Value {
    /// Auto-vivifies: a non-object receiver is reset to an object and the
    /// member is created as Null when missing.
    fn index_mut(&mut self, key: &str) -> &mut Value {
        self.object_slot().entry(key.to_owned()).or_default()
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        match self {
            Value::Array(elements) => elements.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

impl IndexMut<usize> for Value {
    /// Auto-vivifies: a non-array receiver is reset to an array and the
    /// array grows with Null padding up to the index.
    fn index_mut(&mut self, index: usize) -> &mut Value {
        let elements = self.array_slot();
        if elements.len() <= index {
            elements.resize_with(index + 1, Value::default);
        }
        &mut elements[index]
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Writer::new().pretty(true).write(self, f)
    }
}

impl FromStr for Value {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Reader::new().parse_str(text)
    }
}

impl From<Type> for Value {
    fn from(kind: Type) -> Value {
        Value::new(kind)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Value {
        Value::Bool(flag)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Value {
        Value::Integer(i64::from(number))
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Value {
        Value::Integer(number)
    }
}

impl From<u32> for Value {
    fn from(number: u32) -> Value {
        Value::Integer(i64::from(number))
    }
}

impl From<u64> for Value {
    fn from(number: u64) -> Value {
        Value::Integer(number as i64)
    }
}

impl From<usize> for Value {
    fn from(number: usize) -> Value {
        Value::Integer(number as i64)
    }
}

impl From<f32> for Value {
    fn from(number: f32) -> Value {
        Value::Real(f64::from(number))
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Value {
        Value::Real(number)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Value {
        Value::String(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Value {
        Value::String(text)
    }
}

impl From<Array> for Value {
    fn from(elements: Array) -> Value {
        Value::Array(elements)
    }
}

impl From<Object> for Value {
    fn from(members: Object) -> Value {
        Value::Object(members)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Value {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
