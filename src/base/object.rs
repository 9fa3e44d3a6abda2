use std::fmt::{Display, Formatter};

use super::dict::Dict;
use super::name::Name;
use super::number::Number;
use super::stream::Stream;
use super::string::format_string;
use super::types::*;
use super::xref::XrefIndex;

/// The object-level output of the parser.
///
/// Besides the value kinds of the PDF object model this carries the
/// file-structure items that
/// [`ObjectParser::next_object`](crate::parser::ObjectParser::next_object)
/// can produce: the `%PDF-m.n` and `%%EOF` markers, the `startxref` keyword,
/// cross-reference sections, trailers, and the end-of-input pseudo-object.
#[derive(Debug, PartialEq, Clone)]
pub enum Object {
    Bool(bool),
    Number(Number),
    /// Strings.
    ///
    /// No distinction is made whether this was literal or hex-encoded in the
    /// source; the payload is raw bytes either way.
    String(Vec<u8>),
    Name(Name),
    Array(Vec<Object>),
    Dict(Dict),
    Stream(Stream),
    /// An indirect object definition (`n g obj ... endobj`).
    Indirect(ObjRef, Box<Object>),
    /// An indirect object reference (`n g R`).
    Ref(ObjRef),
    Null,
    /// The `%PDF-m.n` version marker.
    Version(u8, u8),
    /// The `%%EOF` marker.
    EofMarker,
    /// The `startxref` keyword. The offset follows as a separate integer.
    StartXref,
    /// A classic cross-reference section.
    Xref(XrefIndex),
    Trailer(Dict),
    /// End of input.
    Eof
}

impl Object {
    /// A utility method to create [`Self::String`] from a byte slice.
    pub fn new_string(s: &[u8]) -> Object {
        Object::String(s.to_owned())
    }

    /// A utility method to create [`Self::Name`] from a byte slice. Don't
    /// pass the initial `'/'`.
    pub fn new_name(s: &[u8]) -> Object {
        Object::Name(Name::from(s))
    }

    /// Numeric value of an integer object, in any integer type it fits.
    pub fn num_value<T: TryFrom<i64>>(&self) -> Option<T> {
        match self {
            &Object::Number(Number::Int(num)) => num.try_into().ok(),
            _ => None
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ObjRef {
    pub num: ObjNum,
    pub gen: ObjGen
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Bool(true) => f.write_str("true"),
            Object::Bool(false) => f.write_str("false"),
            Object::Number(Number::Int(x)) => write!(f, "{x}"),
            Object::Number(Number::Real(x)) => write!(f, "{x}"),
            Object::String(s) => format_string(f, s),
            Object::Name(name) => write!(f, "{name}"),
            Object::Array(arr) => {
                f.write_str("[ ")?;
                for obj in arr {
                    write!(f, "{obj} ")?;
                }
                f.write_str("]")
            },
            Object::Dict(dict) => write!(f, "{dict}"),
            Object::Stream(stm) => write!(f, "{} stream...", stm.dict),
            Object::Indirect(ObjRef { num, gen }, obj) => write!(f, "{num} {gen} obj {obj} endobj"),
            Object::Ref(ObjRef { num, gen }) => write!(f, "{num} {gen} R"),
            Object::Null => f.write_str("null"),
            Object::Version(major, minor) => write!(f, "%PDF-{major}.{minor}"),
            Object::EofMarker => f.write_str("%%EOF"),
            Object::StartXref => f.write_str("startxref"),
            Object::Xref(index) => write!(f, "xref ({} subsections)", index.subsections().len()),
            Object::Trailer(dict) => write!(f, "trailer {dict}"),
            Object::Eof => f.write_str("<eof>")
        }
    }
}
