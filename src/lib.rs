//! Permissive JSON5-style document handling: a dynamic [`Value`] model, a
//! forgiving [`Reader`] with positioned error collection, a configurable
//! [`Writer`] and a [`Path`] mini-language for addressing into documents.
//!
//! ```
//! use loosejson::{parse, Path};
//!
//! let doc = parse("{service: 'cache', ports: [6379, 6380,], /* dev */}").unwrap();
//! assert_eq!(Path::new(".ports[1]").resolve(&doc).as_integer(), 6380);
//! ```

pub mod error;
pub mod interop;
pub mod path;
pub mod reader;
pub mod source;
pub mod value;
pub mod writer;

pub use error::Error;
pub use path::{Path, Segment};
pub use reader::{parse, Reader, Token};
pub use source::Source;
pub use value::{Array, Object, Type, Value};
pub use writer::Writer;
