use super::dict::Dict;

/// A stream object: its header dictionary plus the raw payload.
///
/// The payload holds exactly `/Length` bytes as they appear in the file; no
/// filters have been applied to it.
#[derive(Debug, PartialEq, Clone)]
pub struct Stream {
    pub dict: Dict,
    pub data: Vec<u8>
}
