//! A layered reader for the PDF file format.
//!
//! Three layers compose bottom-up: [`ByteSource`] buffers a seekable binary
//! input in fixed-size blocks and tracks the absolute read position;
//! [`Tokenizer`] turns the byte stream into typed lexical tokens with
//! one-token lookahead; [`ObjectParser`] assembles tokens into [`Object`]
//! values, extracts raw stream payloads, and builds the cross-reference
//! index used to resolve indirect references on demand.

pub mod base;
pub mod codecs;
pub mod parser;
mod utils;

pub use base::*;
pub use base::types::*;
pub use parser::{ByteSource, ObjectParser, Token, Tokenizer};
