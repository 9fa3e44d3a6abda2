/// Reverses the PNG "Up" filter: rows are `columns` bytes wide preceded by a
/// one-byte filter tag, and each byte is stored as a delta against the byte
/// above it. The first row's predecessor is all zeroes. The tag bytes are
/// not part of the output.
pub(crate) fn undo_up(data: &[u8], columns: usize) -> Vec<u8> {
    let width = columns + 1;
    let mut prev = vec![0u8; columns];
    let mut out = Vec::with_capacity(data.len() - data.len() / width);
    for row in data.chunks_exact(width) {
        for (i, &b) in row[1..].iter().enumerate() {
            prev[i] = b.wrapping_add(prev[i]);
        }
        out.extend_from_slice(&prev);
    }
    if data.len() % width != 0 {
        log::warn!("{} trailing bytes ignored in predicted stream", data.len() % width);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_up() {
        // 255 + 2 wraps around
        let data = [2, 0xFF, 0x00, 2, 0x02, 0x01];
        assert_eq!(undo_up(&data, 2), vec![0xFF, 0x00, 0x01, 0x01]);
        assert_eq!(undo_up(&[], 2), Vec::<u8>::new());
        // trailing partial row is dropped
        assert_eq!(undo_up(&[2, 1, 2, 9], 2), vec![1, 2]);
    }
}
