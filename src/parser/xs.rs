use crate::base::types::*;
use crate::base::{Dict, Error, Object, Record, Stream, XrefIndex, XrefSubsection};
use crate::codecs;

/// Decodes a PDF 1.5 cross-reference stream into subsections.
///
/// The stream dictionary supplies `/Size`, the three field widths `/W`, the
/// optional `/Index` ranges (default `[0 Size]`), the filter chain, and the
/// predictor parameters. Fields are assembled big-endian; a zero-width type
/// field defaults to 1, a zero-width third field to 0.
pub(crate) fn decode_xref_stream(stm: &Stream) -> Result<XrefIndex, Error> {
    let dict = &stm.dict;
    if dict.lookup(b"Type") != &Object::new_name(b"XRef") {
        return Err(Error::Syntax("malformed xref stream (/Type)"));
    }
    let size = dict.lookup(b"Size").num_value::<u64>()
        .ok_or(Error::Syntax("malformed xref stream (/Size)"))?;
    let widths = read_widths(dict)?;
    let ranges = read_index(dict, size)?;
    let rec_width: usize = widths.iter().sum();

    let data = codecs::defilter(&stm.data, dict.lookup(b"Filter"))?;
    let data = match dict.lookup(b"DecodeParms") {
        Object::Null => data,
        Object::Dict(parms) => {
            let predictor = parms.lookup(b"Predictor").num_value::<i64>().unwrap_or(1);
            // The row width is fixed by the field widths, not /Columns.
            codecs::undo_predictor(&data, predictor, rec_width)?
        },
        _ => return Err(Error::Syntax("malformed xref stream (/DecodeParms)"))
    };

    let mut records = data.chunks_exact(rec_width);
    let mut section = XrefIndex::default();
    for (start, count) in ranges {
        let mut entries = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            let record = records.next().ok_or(Error::Syntax("truncated xref stream"))?;
            entries.push(read_record(record, &widths)?);
        }
        section.push(XrefSubsection { start, entries });
    }
    if records.next().is_some() {
        log::warn!("extra records at the end of a cross-reference stream");
    }
    Ok(section)
}

fn read_widths(dict: &Dict) -> Result<[usize; 3], Error> {
    let widths: [usize; 3] = match dict.lookup(b"W") {
        Object::Array(arr) => arr.iter()
            .map(|obj| match obj.num_value::<usize>() {
                Some(w) if w < 8 => Ok(w),
                _ => Err(Error::Syntax("malformed xref stream (/W)"))
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(Error::Syntax("malformed xref stream (/W)"))
    }.try_into().map_err(|_| Error::Syntax("malformed xref stream (/W)"))?;
    if widths[1] == 0 {
        return Err(Error::Syntax("malformed xref stream (/W)"));
    }
    Ok(widths)
}

fn read_index(dict: &Dict, size: u64) -> Result<Vec<(ObjNum, u64)>, Error> {
    let pairs = match dict.lookup(b"Index") {
        Object::Null => return Ok(vec![(0, size)]),
        Object::Array(arr) => arr.iter()
            .map(|obj| obj.num_value::<u64>()
                .ok_or(Error::Syntax("malformed xref stream (/Index)")))
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(Error::Syntax("malformed xref stream (/Index)"))
    };
    if pairs.len() % 2 != 0 {
        return Err(Error::Syntax("malformed xref stream (/Index)"));
    }
    Ok(pairs.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect())
}

fn read_record(record: &[u8], widths: &[usize; 3]) -> Result<Record, Error> {
    let [w1, w2, w3] = *widths;
    let read_field = |from: usize, width: usize| {
        let mut buf = [0u8; 8];
        buf[8 - width..].copy_from_slice(&record[from..from + width]);
        u64::from_be_bytes(buf)
    };
    let tpe = if w1 > 0 { read_field(0, w1) } else { 1 };
    let f2 = read_field(w1, w2);
    let f3 = read_field(w1 + w2, w3);
    Ok(match tpe {
        0 => Record::Free {
            next: f2,
            gen: f3.try_into().map_err(|_| Error::Syntax("malformed xref stream (generation)"))?
        },
        1 => Record::Used {
            offset: f2,
            gen: f3.try_into().map_err(|_| Error::Syntax("malformed xref stream (generation)"))?
        },
        2 => Record::Compressed {
            num_within: f2,
            index: f3.try_into().map_err(|_| Error::Syntax("malformed xref stream (index)"))?
        },
        other => {
            log::warn!("unknown cross-reference record type {other}, treating as free");
            Record::Free { next: 0, gen: 65535 }
        }
    })
}
