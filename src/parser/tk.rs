use std::collections::VecDeque;
use std::io::{Cursor, Read, Seek};

use crate::base::types::*;
use crate::base::{Error, Name, Record};
use crate::utils;

use super::bs::ByteSource;
use super::cc::CharClass;

/// A lexical token.
///
/// Line ends are tokens of their own (not whitespace) because the grammar
/// assigns them meaning around stream bodies and cross-reference lines.
/// `Eof` and `Unexpected` are ordinary values: the former reports the end of
/// input, the latter a failed subsection-header probe after the input has
/// been rolled back. Malformed lexemes are reported as
/// [`Error::Syntax`](crate::base::Error::Syntax).
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Version(u8, u8),
    EofMarker,
    Cr,
    Lf,
    CrLf,
    Int(i64),
    Real(f64),
    LitString(Vec<u8>),
    HexString(Vec<u8>),
    Name(Name),
    ArrayBegin,
    ArrayEnd,
    DictBegin,
    DictEnd,
    True,
    False,
    Null,
    Obj,
    EndObj,
    Stream,
    EndStream,
    Ref,
    Xref,
    Trailer,
    StartXref,
    SubsectionHeader { start: ObjNum, count: u64 },
    SubsectionEntry(Record),
    Eof,
    Unexpected
}

impl Token {
    pub fn is_eol(&self) -> bool {
        matches!(self, Token::Cr | Token::Lf | Token::CrLf)
    }
}

/// Converts a byte stream into a stream of [`Token`]s.
///
/// The scanner state is a single look-ahead byte: it has been read from the
/// source but not yet classified. Every scanner leaves the stream in that
/// state, which makes a [`Tokenizer::seek`] a pure rewind. On top of that
/// sits a FIFO of tokens put aside by [`Tokenizer::peek_token`]; they are
/// handed back in order before any new byte is touched.
pub struct Tokenizer<R: Read + Seek> {
    src: ByteSource<R>,
    cc: Option<u8>,
    peeked: VecDeque<Token>
}

impl<R: Read + Seek> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self { src: ByteSource::new(reader), cc: None, peeked: VecDeque::new() }
    }

    /// Position of the look-ahead byte, i.e. of the first byte the next
    /// freshly scanned token would start at.
    pub fn tell(&self) -> Offset {
        self.src.tell() - self.cc.is_some() as u64
    }

    pub fn seek(&mut self, pos: Offset) -> Result<(), Error> {
        self.peeked.clear();
        self.rewind(pos)
    }

    /// Total input length. Drops any lookahead; callers seek afterwards.
    pub fn stream_len(&mut self) -> Result<u64, Error> {
        self.peeked.clear();
        self.cc = None;
        Ok(self.src.stream_len()?)
    }

    /// Repositions the source without touching the peek queue. Used by the
    /// scanners themselves for probe rollback.
    fn rewind(&mut self, pos: Offset) -> Result<(), Error> {
        self.src.seek(pos)?;
        self.cc = None;
        Ok(())
    }

    fn cur(&mut self) -> Result<Option<u8>, Error> {
        if self.cc.is_none() {
            self.cc = self.src.read_byte()?;
        }
        Ok(self.cc)
    }

    fn bump(&mut self) -> Result<Option<u8>, Error> {
        let c = self.cur()?;
        self.cc = self.src.read_byte()?;
        Ok(c)
    }

    fn bump_if(&mut self, cond: impl FnOnce(u8) -> bool) -> Result<Option<u8>, Error> {
        match self.cur()? {
            Some(c) if cond(c) => self.bump(),
            _ => Ok(None)
        }
    }

    /// Consumes `n` bytes starting at the look-ahead byte. On a short read
    /// the position is undefined; callers rewind.
    fn take_bytes(&mut self, n: usize) -> Result<Option<Vec<u8>>, Error> {
        if n == 0 {
            return Ok(Some(Vec::new()));
        }
        let mut out = Vec::with_capacity(n.min(8192));
        if let Some(c) = self.cc.take() {
            out.push(c);
        }
        if out.len() < n {
            match self.src.read_bytes(n - out.len())? {
                Some(bytes) => out.extend_from_slice(&bytes),
                None => return Ok(None)
            }
        }
        Ok(Some(out))
    }

    /// Returns the next token, delivering previously peeked tokens in FIFO
    /// order before scanning new ones.
    pub fn next_token(&mut self) -> Result<Token, Error> {
        match self.peeked.pop_front() {
            Some(tok) => Ok(tok),
            None => self.scan_token()
        }
    }

    /// Returns the next not-yet-peeked token without consuming it from the
    /// queue. Successive calls look further and further ahead.
    pub fn peek_token(&mut self) -> Result<Token, Error> {
        let tok = self.scan_token()?;
        self.peeked.push_back(tok.clone());
        Ok(tok)
    }

    /// Bulk-reads `n` raw bytes, bypassing tokenisation. Queued lookahead is
    /// invalidated; the look-ahead byte is re-established at the position
    /// after the read. Returns `None` if the input ends first.
    pub fn read_stream_bytes(&mut self, n: usize) -> Result<Option<Vec<u8>>, Error> {
        self.peeked.clear();
        self.take_bytes(n)
    }

    fn scan_token(&mut self) -> Result<Token, Error> {
        let cc = loop {
            match self.cur()? {
                None => return Ok(Token::Eof),
                Some(c) if CharClass::of(c) == CharClass::Space => { self.bump()?; },
                Some(c) => break c
            }
        };
        match cc {
            b'(' => {
                self.bump()?;
                self.scan_lit_string()
            },
            b'<' => {
                self.bump()?;
                match self.cur()? {
                    Some(b'<') => {
                        self.bump()?;
                        Ok(Token::DictBegin)
                    },
                    Some(c) if utils::hex_value(c).is_some() => self.scan_hex_string(),
                    _ => Err(Error::Syntax("'<' not followed by hex digit or second '<'"))
                }
            },
            b'>' => {
                self.bump()?;
                match self.cur()? {
                    Some(b'>') => {
                        self.bump()?;
                        Ok(Token::DictEnd)
                    },
                    _ => Err(Error::Syntax("'>' not followed by a second '>'"))
                }
            },
            b'/' => {
                self.bump()?;
                self.scan_name().map(Token::Name)
            },
            b'%' => {
                self.bump()?;
                self.scan_marker_or_comment()
            },
            b'[' => {
                self.bump()?;
                Ok(Token::ArrayBegin)
            },
            b']' => {
                self.bump()?;
                Ok(Token::ArrayEnd)
            },
            b'\r' => {
                self.bump()?;
                if self.bump_if(|c| c == b'\n')?.is_some() {
                    Ok(Token::CrLf)
                } else {
                    Ok(Token::Cr)
                }
            },
            b'\n' => {
                self.bump()?;
                Ok(Token::Lf)
            },
            b')' | b'{' | b'}' => {
                self.bump()?;
                Err(Error::Syntax("unexpected character"))
            },
            _ => self.scan_regular_run()
        }
    }

    /// The opening paren has been consumed. Escapes are decoded here; the
    /// nesting counter follows every parenthesis byte that goes into the
    /// output, so an escaped `(` opens a group just like a bare one. Octal
    /// escapes yield plain bytes and never affect nesting.
    fn scan_lit_string(&mut self) -> Result<Token, Error> {
        let mut ret = Vec::new();
        let mut parens = 1;
        loop {
            let Some(c) = self.bump()? else { return Ok(Token::Eof) };
            let c = if c == b'\\' {
                let Some(esc) = self.bump()? else { return Ok(Token::Eof) };
                match esc {
                    b'n' => b'\x0a',
                    b'r' => b'\x0d',
                    b't' => b'\x09',
                    b'b' => b'\x08',
                    b'f' => b'\x0c',
                    d1 @ b'0'..=b'7' => {
                        let d1 = d1 - b'0';
                        let d2 = self.bump_if(|c| (b'0'..=b'7').contains(&c))?.map(|c| c - b'0');
                        let d3 = self.bump_if(|c| (b'0'..=b'7').contains(&c))?.map(|c| c - b'0');
                        let code = match (d2, d3) {
                            (Some(d2), Some(d3)) => (d1 << 6) + (d2 << 3) + d3,
                            (Some(d2), None) => (d1 << 3) + d2,
                            (None, None) => d1,
                            _ => unreachable!()
                        };
                        ret.push(code);
                        continue;
                    },
                    // The backslash is dropped; the byte itself is kept.
                    other => other
                }
            } else {
                c
            };
            match c {
                b'(' => {
                    parens += 1;
                    ret.push(c);
                },
                b')' => {
                    parens -= 1;
                    if parens == 0 {
                        break;
                    }
                    ret.push(c);
                },
                c => ret.push(c)
            }
        }
        Ok(Token::LitString(ret))
    }

    /// The opening `<` has been consumed and the look-ahead is a hex digit.
    fn scan_hex_string(&mut self) -> Result<Token, Error> {
        let mut digits = Vec::new();
        loop {
            match self.bump()? {
                None => return Ok(Token::Eof),
                Some(b'>') => break,
                Some(c) => match utils::hex_value(c) {
                    Some(d) => digits.push(d),
                    None => return Err(Error::Syntax("malformed hex string"))
                }
            }
        }
        let mut ret = Vec::with_capacity(digits.len().div_ceil(2));
        for pair in digits.chunks(2) {
            match *pair {
                [hi, lo] => ret.push((hi << 4) | lo),
                // odd digit count: padded with a trailing zero
                [hi] => ret.push(hi << 4),
                _ => unreachable!()
            }
        }
        Ok(Token::HexString(ret))
    }

    /// The `/` has been consumed. The terminating delimiter or whitespace
    /// byte stays as the look-ahead.
    fn scan_name(&mut self) -> Result<Name, Error> {
        let mut name = Vec::new();
        loop {
            match self.cur()? {
                Some(c) if CharClass::of(c) == CharClass::Reg => {
                    self.bump()?;
                    if c == b'#' {
                        let d1 = self.bump()?.and_then(utils::hex_value);
                        let d2 = self.bump()?.and_then(utils::hex_value);
                        match (d1, d2) {
                            (Some(0), Some(0)) => return Err(Error::Syntax("illegal name (contains #00)")),
                            (Some(d1), Some(d2)) => name.push((d1 << 4) | d2),
                            _ => return Err(Error::Syntax("malformed name"))
                        }
                    } else if (33..=126).contains(&c) {
                        name.push(c);
                    } else {
                        return Err(Error::Syntax("malformed name"));
                    }
                },
                _ => break
            }
        }
        Ok(Name(name))
    }

    /// The `%` has been consumed. Probes for the `%PDF-m.n` and `%%EOF`
    /// markers; otherwise the comment is discarded and its line end token
    /// returned.
    fn scan_marker_or_comment(&mut self) -> Result<Token, Error> {
        let save = self.tell();
        match self.take_bytes(7)? {
            Some(probe) if matches!(probe[..],
                    [b'P', b'D', b'F', b'-', b'0'..=b'9', b'.', b'0'..=b'9']) => {
                return Ok(Token::Version(probe[4] - b'0', probe[6] - b'0'));
            },
            _ => self.rewind(save)?
        }
        match self.take_bytes(4)? {
            Some(probe) if probe == b"%EOF" => return Ok(Token::EofMarker),
            _ => self.rewind(save)?
        }
        loop {
            match self.bump()? {
                None => return Ok(Token::Eof),
                Some(b'\r') => {
                    return if self.bump_if(|c| c == b'\n')?.is_some() {
                        Ok(Token::CrLf)
                    } else {
                        Ok(Token::Cr)
                    }
                },
                Some(b'\n') => return Ok(Token::Lf),
                Some(_) => ()
            }
        }
    }

    fn scan_regular_run(&mut self) -> Result<Token, Error> {
        let mut run = Vec::new();
        while let Some(c) = self.bump_if(|c| CharClass::of(c) == CharClass::Reg)? {
            run.push(c);
        }
        match &run[..] {
            b"true" => Ok(Token::True),
            b"false" => Ok(Token::False),
            b"null" => Ok(Token::Null),
            b"obj" => Ok(Token::Obj),
            b"endobj" => Ok(Token::EndObj),
            b"stream" => Ok(Token::Stream),
            b"endstream" => Ok(Token::EndStream),
            b"R" => Ok(Token::Ref),
            b"xref" => Ok(Token::Xref),
            b"trailer" => Ok(Token::Trailer),
            b"startxref" => Ok(Token::StartXref),
            _ => Self::classify_number(&run)
        }
    }

    fn classify_number(run: &[u8]) -> Result<Token, Error> {
        if run.contains(&b'e') || run.contains(&b'E') {
            return Err(Error::Syntax("unrecognized token"));
        }
        if run.contains(&b'.') {
            utils::parse_num::<f64>(run).map(Token::Real)
                .ok_or(Error::Syntax("unrecognized token"))
        } else {
            utils::parse_num::<i64>(run).map(Token::Int)
                .ok_or(Error::Syntax("unrecognized token"))
        }
    }

    /// Scans one line of the form `<first> SP <count> EOL`.
    ///
    /// When the line is not of that shape the input is rolled back to where
    /// it was before the call and `Token::Unexpected` is returned; the caller
    /// takes this as the end of the cross-reference section. A line that
    /// does look like a header but whose numbers cannot be represented is a
    /// syntax error.
    pub fn read_xref_subsection_header(&mut self) -> Result<Token, Error> {
        let save = self.tell();
        let mut line = Vec::new();
        loop {
            match self.bump()? {
                None => {
                    return if line.is_empty() && save == self.tell() {
                        Ok(Token::Eof)
                    } else {
                        self.rewind(save)?;
                        Ok(Token::Unexpected)
                    }
                },
                Some(b'\r') => {
                    self.bump_if(|c| c == b'\n')?;
                    break;
                },
                Some(b'\n') => break,
                Some(c) => line.push(c)
            }
        }
        let header = (|| {
            let sp = line.iter().position(|&c| c == b' ')?;
            let (first, rest) = line.split_at(sp);
            let count = &rest[1..];
            if first.is_empty() || count.is_empty() {
                return None;
            }
            if !first.iter().all(u8::is_ascii_digit) || !count.iter().all(u8::is_ascii_digit) {
                return None;
            }
            Some((first.to_owned(), count.to_owned()))
        })();
        let Some((first, count)) = header else {
            self.rewind(save)?;
            return Ok(Token::Unexpected);
        };
        let start = utils::parse_num::<ObjNum>(&first)
            .ok_or(Error::Syntax("malformed xref subsection header"))?;
        let count = utils::parse_num::<u64>(&count)
            .ok_or(Error::Syntax("malformed xref subsection header"))?;
        Ok(Token::SubsectionHeader { start, count })
    }

    /// Scans exactly 20 bytes of the form
    /// `(\d{10}) SP (\d{5}) SP [nf] (CRLF | SP LF | SP CR)`.
    pub fn read_xref_subsection_entry(&mut self) -> Result<Token, Error> {
        let Some(entry) = self.take_bytes(20)? else { return Ok(Token::Eof) };
        if entry[10] != b' ' || entry[16] != b' ' {
            return Err(Error::Syntax("malformed xref entry"));
        }
        if !entry[0..10].iter().all(u8::is_ascii_digit)
                || !entry[11..16].iter().all(u8::is_ascii_digit) {
            return Err(Error::Syntax("malformed xref entry"));
        }
        if !matches!(&entry[18..20], b"\r\n" | b" \n" | b" \r") {
            return Err(Error::Syntax("malformed xref entry"));
        }
        let value = utils::parse_num::<u64>(&entry[0..10])
            .ok_or(Error::Syntax("malformed xref entry"))?;
        let gen = utils::parse_num::<ObjGen>(&entry[11..16])
            .ok_or(Error::Syntax("malformed xref entry"))?;
        let record = match entry[17] {
            b'n' => Record::Used { offset: value, gen },
            b'f' => Record::Free { next: value, gen },
            _ => return Err(Error::Syntax("malformed xref entry"))
        };
        Ok(Token::SubsectionEntry(record))
    }
}

impl<T: Into<String>> From<T> for Tokenizer<Cursor<String>> {
    fn from(input: T) -> Self {
        Tokenizer::new(Cursor::new(input.into()))
    }
}
