mod flate;
mod pred;

use crate::base::{Error, Object};

/// Runs stream data through the filter chain named by a `/Filter` entry.
/// Only `/FlateDecode` is supported; an absent or empty filter passes the
/// data through unchanged.
pub fn defilter(data: &[u8], filter: &Object) -> Result<Vec<u8>, Error> {
    match filter {
        Object::Null => Ok(data.to_vec()),
        Object::Name(name) if name == b"FlateDecode" => flate::decode(data),
        Object::Array(filters) => match &filters[..] {
            [] => Ok(data.to_vec()),
            [Object::Name(name)] if name == b"FlateDecode" => flate::decode(data),
            _ => Err(Error::Syntax("unsupported filter"))
        },
        _ => Err(Error::Syntax("unsupported filter"))
    }
}

/// Reverses the predictor transform applied before compression. Predictor 1
/// is the identity; 12 is the PNG "Up" filter over rows of `columns` bytes
/// (plus the per-row tag byte). Other predictors are not supported.
pub fn undo_predictor(data: &[u8], predictor: i64, columns: usize) -> Result<Vec<u8>, Error> {
    match predictor {
        1 => Ok(data.to_vec()),
        12 => Ok(pred::undo_up(data, columns)),
        _ => Err(Error::Syntax("unsupported predictor"))
    }
}
