use std::io::Read;

/// A byte cursor with a single character of lookahead.
pub trait Input {
    /// The byte under the cursor, or `None` at end of input.
    fn current(&self) -> Option<u8>;

    /// Moves the cursor one byte forward.
    fn advance(&mut self);
}

/// In-memory input over a slice.
pub struct SliceInput<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> SliceInput<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }
}

impl Input for SliceInput<'_> {
    fn current(&self) -> Option<u8> {
        self.bytes.get(self.cursor).copied()
    }

    fn advance(&mut self) {
        if self.cursor < self.bytes.len() {
            self.cursor += 1;
        }
    }
}

/// Input over an arbitrary byte iterator.
pub struct IterInput<I: Iterator<Item = u8>> {
    bytes: I,
    current: Option<u8>,
}

impl<I: Iterator<Item = u8>> IterInput<I> {
    pub fn new(mut bytes: I) -> Self {
        let current = bytes.next();
        Self { bytes, current }
    }
}

impl<I: Iterator<Item = u8>> Input for IterInput<I> {
    fn current(&self) -> Option<u8> {
        self.current
    }

    fn advance(&mut self) {
        self.current = self.bytes.next();
    }
}

/// Input over a blocking [`Read`] stream; read failures end the input.
pub struct ReadInput<R: Read> {
    stream: R,
    current: Option<u8>,
}

impl<R: Read> ReadInput<R> {
    pub fn new(stream: R) -> Self {
        let mut input = Self {
            stream,
            current: None,
        };
        input.advance();
        input
    }
}

impl<R: Read> Input for ReadInput<R> {
    fn current(&self) -> Option<u8> {
        self.current
    }

    fn advance(&mut self) {
        let mut buffer = [0u8; 1];
        self.current = match self.stream.read(&mut buffer) {
            Ok(1) => Some(buffer[0]),
            _ => None,
        };
    }
}

/// A 1-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: i32,
    pub column: i32,
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

/// Character source shared by the lexer: any [`Input`] backing plus the
/// pending lexeme buffer and the position bookkeeping.
///
/// The position points at the first byte of the pending lexeme; bytes are
/// only accounted into line/column when [`Source::skip_lexeme`] clears
/// them.
pub struct Source<'a> {
    input: Box<dyn Input + 'a>,
    lexeme: Vec<u8>,
    position: Position,
}

impl<'a> Source<'a> {
    pub fn new(input: impl Input + 'a) -> Self {
        Self {
            input: Box::new(input),
            lexeme: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn from_str(text: &'a str) -> Self {
        Self::new(SliceInput::new(text.as_bytes()))
    }

    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::new(SliceInput::new(bytes))
    }

    pub fn from_iter(bytes: impl Iterator<Item = u8> + 'a) -> Self {
        Self::new(IterInput::new(bytes))
    }

    pub fn from_reader(stream: impl Read + 'a) -> Self {
        Self::new(ReadInput::new(stream))
    }

    pub fn current(&self) -> Option<u8> {
        self.input.current()
    }

    /// Appends the current byte to the pending lexeme and advances.
    pub fn bump(&mut self) {
        if let Some(byte) = self.input.current() {
            self.lexeme.push(byte);
        }
        self.input.advance();
    }

    /// Accounts the pending lexeme into the position and clears it. A
    /// newline resets the column to 1 and bumps the line.
    pub fn skip_lexeme(&mut self) {
        for &byte in &self.lexeme {
            self.position.column += 1;
            if byte == b'\n' {
                self.position.column = 1;
                self.position.line += 1;
            }
        }
        self.lexeme.clear();
    }

    pub fn lexeme(&self) -> &[u8] {
        &self.lexeme
    }

    pub fn lexeme_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.lexeme)
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_input_walks_to_the_end() {
        let mut source = Source::from_str("ab");
        assert_eq!(source.current(), Some(b'a'));
        source.bump();
        assert_eq!(source.current(), Some(b'b'));
        source.bump();
        assert_eq!(source.current(), None);
        assert_eq!(source.lexeme(), b"ab");
    }

    #[test]
    fn skip_lexeme_tracks_lines_and_columns() {
        let mut source = Source::from_str("ab\ncd");
        for _ in 0..4 {
            source.bump();
        }
        source.skip_lexeme();
        assert_eq!(source.position(), Position { line: 2, column: 2 });
        assert!(source.lexeme().is_empty());
    }

    #[test]
    fn reader_input_matches_slice_input() {
        let stream = std::io::Cursor::new(b"xy".to_vec());
        let mut source = Source::from_reader(stream);
        assert_eq!(source.current(), Some(b'x'));
        source.bump();
        source.bump();
        assert_eq!(source.current(), None);
        assert_eq!(source.lexeme(), b"xy");
    }

    #[test]
    fn iterator_input_is_consumed_lazily() {
        let mut source = Source::from_iter([1u8, 2, 3].into_iter());
        assert_eq!(source.current(), Some(1));
        source.bump();
        source.bump();
        assert_eq!(source.current(), Some(3));
    }
}
