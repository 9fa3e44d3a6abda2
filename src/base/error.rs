/// The failure type of all fallible operations in this crate.
///
/// Malformed input is always reported as a value of this type, never as a
/// panic. End of input is not an error; it surfaces as
/// [`Token::Eof`](crate::parser::Token::Eof) and
/// [`Object::Eof`](crate::base::Object::Eof).
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Syntax(&'static str)
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
