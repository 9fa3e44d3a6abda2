use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::base::Error;

pub(crate) fn decode(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}
