use std::collections::VecDeque;
use std::io::{Cursor, Read, Seek};

use crate::base::types::*;
use crate::base::*;
use crate::utils;

use super::tk::{Token, Tokenizer};
use super::xs;

/// Assembles tokens into [`Object`] values.
///
/// The parser exclusively owns its [`Tokenizer`] and the [`XrefIndex`] it
/// builds: every cross-reference section it parses, classic or stream form,
/// appends its subsections to the index, and [`ObjectParser::dereference`]
/// answers from it. Sections are expected newest first (the order
/// [`ObjectParser::load_cross_references`] produces), making updated entries
/// shadow older ones.
pub struct ObjectParser<R: Read + Seek> {
    tkn: Tokenizer<R>,
    index: XrefIndex
}

impl<R: Read + Seek> ObjectParser<R> {
    pub fn new(reader: R) -> Self {
        Self { tkn: Tokenizer::new(reader), index: XrefIndex::default() }
    }

    pub fn seek(&mut self, pos: Offset) -> Result<(), Error> {
        self.tkn.seek(pos)
    }

    pub fn tell(&self) -> Offset {
        self.tkn.tell()
    }

    pub fn xref_index(&self) -> &XrefIndex {
        &self.index
    }

    /// Parses one object at the current position.
    ///
    /// Line-end tokens before the object are skipped. The end of input is
    /// reported as [`Object::Eof`]; syntax problems as `Err`, which does not
    /// poison the parser — the caller may keep going.
    pub fn next_object(&mut self) -> Result<Object, Error> {
        let tok = loop {
            let tok = self.tkn.next_token()?;
            if !tok.is_eol() {
                break tok;
            }
        };
        match tok {
            Token::Eof => Ok(Object::Eof),
            Token::Version(major, minor) => Ok(Object::Version(major, minor)),
            Token::EofMarker => Ok(Object::EofMarker),
            Token::StartXref => Ok(Object::StartXref),
            Token::True => Ok(Object::Bool(true)),
            Token::False => Ok(Object::Bool(false)),
            Token::Null => Ok(Object::Null),
            Token::Int(num) => self.read_number_or_indirect(num),
            Token::Real(x) => Ok(Object::Number(Number::Real(x))),
            Token::LitString(s) | Token::HexString(s) => Ok(Object::String(s)),
            Token::Name(name) => Ok(Object::Name(name)),
            Token::ArrayBegin => self.read_array(),
            Token::DictBegin => self.read_dict_or_stream(),
            Token::Xref => self.read_xref_section(),
            Token::Trailer => self.read_trailer(),
            Token::Stream => Err(Error::Syntax("stream keyword without a dictionary")),
            _ => Err(Error::Syntax("unexpected token"))
        }
    }

    /// An integer may open an indirect definition (`n g obj`) or a reference
    /// (`n g R`); the third token decides. Anything else rolls the tokenizer
    /// back to just after the first integer and yields it plain.
    fn read_number_or_indirect(&mut self, num: i64) -> Result<Object, Error> {
        let save = self.tkn.tell();
        if let Ok(Token::Int(gen)) = self.tkn.next_token() {
            match self.tkn.next_token() {
                Ok(Token::Obj) => return self.read_indirect_def(num, gen),
                Ok(Token::Ref) => return Ok(Object::Ref(Self::make_objref(num, gen)?)),
                _ => ()
            }
        }
        self.tkn.seek(save)?;
        Ok(Object::Number(Number::Int(num)))
    }

    fn make_objref(num: i64, gen: i64) -> Result<ObjRef, Error> {
        let num = num.try_into().map_err(|_| Error::Syntax("invalid object number"))?;
        let gen = gen.try_into().map_err(|_| Error::Syntax("invalid generation number"))?;
        Ok(ObjRef { num, gen })
    }

    fn read_indirect_def(&mut self, num: i64, gen: i64) -> Result<Object, Error> {
        let oref = Self::make_objref(num, gen)?;
        let obj = self.next_object()?;
        if matches!(obj, Object::Eof) {
            return Ok(Object::Eof);
        }
        let mut tok = self.tkn.next_token()?;
        if tok.is_eol() {
            tok = self.tkn.next_token()?;
        }
        match tok {
            Token::EndObj => Ok(Object::Indirect(oref, Box::new(obj))),
            Token::Eof => Ok(Object::Eof),
            _ => Err(Error::Syntax("endobj not found"))
        }
    }

    fn read_array(&mut self) -> Result<Object, Error> {
        let mut arr = Vec::new();
        loop {
            let tok = self.tkn.peek_token()?;
            match tok {
                Token::ArrayEnd => {
                    self.tkn.next_token()?;
                    break;
                },
                tok if tok.is_eol() => {
                    self.tkn.next_token()?;
                },
                Token::Eof => return Ok(Object::Eof),
                _ => {
                    let obj = self.next_object()?;
                    if matches!(obj, Object::Eof) {
                        return Ok(Object::Eof);
                    }
                    arr.push(obj);
                }
            }
        }
        Ok(Object::Array(arr))
    }

    /// Parses the pairs of a dictionary whose `<<` has been consumed.
    /// Returns `Object::Dict` or, on premature end of input, `Object::Eof`.
    fn read_dict_body(&mut self) -> Result<Object, Error> {
        let mut dict = Dict::default();
        loop {
            let tok = self.tkn.next_token()?;
            if tok.is_eol() {
                continue;
            }
            match tok {
                Token::DictEnd => break,
                Token::Eof => return Ok(Object::Eof),
                Token::Name(key) => {
                    let value = self.next_object()?;
                    if matches!(value, Object::Eof) {
                        return Ok(Object::Eof);
                    }
                    dict.insert(key, value);
                },
                _ => return Err(Error::Syntax("malformed dictionary"))
            }
        }
        Ok(Object::Dict(dict))
    }

    /// A dictionary immediately followed (ignoring line ends) by the
    /// `stream` keyword is a stream header; anything else is returned as the
    /// plain dictionary, with the peeked token left for the next call.
    fn read_dict_or_stream(&mut self) -> Result<Object, Error> {
        let dict = match self.read_dict_body()? {
            Object::Dict(dict) => dict,
            other => return Ok(other)
        };
        loop {
            let tok = self.tkn.peek_token()?;
            if tok.is_eol() {
                self.tkn.next_token()?;
                continue;
            }
            if tok != Token::Stream {
                return Ok(Object::Dict(dict));
            }
            self.tkn.next_token()?;
            break;
        }
        self.read_stream_body(dict)
    }

    /// The `stream` keyword has been consumed. It must be followed by LF or
    /// CRLF (a lone CR is rejected), then exactly `/Length` raw bytes, one
    /// EOL not counted in the length, and `endstream`.
    fn read_stream_body(&mut self, dict: Dict) -> Result<Object, Error> {
        match self.tkn.next_token()? {
            Token::Lf | Token::CrLf => (),
            Token::Eof => return Ok(Object::Eof),
            _ => return Err(Error::Syntax("stream keyword not followed by proper EOL"))
        }
        let len: usize = match dict.lookup(b"Length") {
            Object::Ref(objref) => {
                let objref = *objref;
                self.dereference(&objref)?.as_ref().and_then(Object::num_value)
            },
            obj => obj.num_value()
        }.ok_or(Error::Syntax("stream length not resolvable"))?;
        let Some(data) = self.tkn.read_stream_bytes(len)? else {
            return Ok(Object::Eof);
        };
        match self.tkn.next_token()? {
            tok if tok.is_eol() => (),
            Token::Eof => return Ok(Object::Eof),
            _ => return Err(Error::Syntax("stream data not followed by EOL"))
        }
        match self.tkn.next_token()? {
            Token::EndStream => Ok(Object::Stream(Stream { dict, data })),
            Token::Eof => Ok(Object::Eof),
            _ => Err(Error::Syntax("endstream not found"))
        }
    }

    /// The `xref` keyword has been consumed. Subsections accumulate until a
    /// line that is not a subsection header ends the section; the tokenizer
    /// has already rolled back to the start of that line.
    fn read_xref_section(&mut self) -> Result<Object, Error> {
        match self.tkn.next_token()? {
            tok if tok.is_eol() => (),
            Token::Eof => return Ok(Object::Eof),
            _ => return Err(Error::Syntax("xref keyword not followed by EOL"))
        }
        let mut section = XrefIndex::default();
        loop {
            match self.tkn.read_xref_subsection_header()? {
                Token::SubsectionHeader { start, count } => {
                    let mut entries = Vec::with_capacity(count.min(1024) as usize);
                    for _ in 0..count {
                        match self.tkn.read_xref_subsection_entry()? {
                            Token::SubsectionEntry(record) => entries.push(record),
                            _ => return Ok(Object::Eof)
                        }
                    }
                    section.push(XrefSubsection { start, entries });
                },
                Token::Unexpected => break,
                _ => return Ok(Object::Eof)
            }
        }
        self.index.extend_from(&section);
        Ok(Object::Xref(section))
    }

    fn read_trailer(&mut self) -> Result<Object, Error> {
        let tok = loop {
            let tok = self.tkn.next_token()?;
            if !tok.is_eol() {
                break tok;
            }
        };
        match tok {
            Token::DictBegin => match self.read_dict_body()? {
                Object::Dict(dict) => Ok(Object::Trailer(dict)),
                other => Ok(other)
            },
            Token::Eof => Ok(Object::Eof),
            _ => Err(Error::Syntax("trailer keyword not followed by a dictionary"))
        }
    }

    /// Looks a reference up in the cross-reference index, reads the object
    /// definition stored at the recorded offset, and returns the inner
    /// object. The current position is preserved across the call.
    ///
    /// `Ok(None)` means the reference does not resolve: no entry, a free or
    /// compressed entry, or a definition of a different object number. A
    /// generation mismatch is tolerated with a warning.
    pub fn dereference(&mut self, objref: &ObjRef) -> Result<Option<Object>, Error> {
        let Some(Record::Used { offset, gen }) = self.index.locate(objref.num) else {
            return Ok(None);
        };
        if gen != objref.gen {
            log::warn!("dereferencing {} {}: xref records generation {}", objref.num, objref.gen, gen);
        }
        let save = self.tkn.tell();
        self.tkn.seek(offset)?;
        let result = self.next_object();
        self.tkn.seek(save)?;
        match result? {
            Object::Indirect(oref, inner) => {
                if oref.num != objref.num {
                    log::warn!("offset {} holds object {}, expected {}", offset, oref.num, objref.num);
                    return Ok(None);
                }
                if oref.gen != objref.gen {
                    log::warn!("object {} defined with generation {}, expected {}",
                        oref.num, oref.gen, objref.gen);
                }
                Ok(Some(*inner))
            },
            _ => Ok(None)
        }
    }

    /// Parses the cross-reference section at the current position, in either
    /// the classic table form or the PDF 1.5 stream form. The decoded
    /// subsections are appended to the owned index in both cases; the parsed
    /// object is returned as found in the file.
    pub fn parse_cross_reference(&mut self) -> Result<Object, Error> {
        let tok = loop {
            let tok = self.tkn.peek_token()?;
            if !tok.is_eol() {
                break tok;
            }
            self.tkn.next_token()?;
        };
        match tok {
            Token::Xref => self.next_object(),
            Token::Int(_) => {
                let obj = self.next_object()?;
                let section = match &obj {
                    Object::Indirect(_, inner) => match &**inner {
                        Object::Stream(stm) => xs::decode_xref_stream(stm)?,
                        _ => return Err(Error::Syntax("expected a cross-reference stream"))
                    },
                    Object::Eof => return Ok(Object::Eof),
                    _ => return Err(Error::Syntax("expected a cross-reference stream"))
                };
                self.index.extend_from(&section);
                Ok(obj)
            },
            Token::Eof => Ok(Object::Eof),
            _ => Err(Error::Syntax("expected a cross-reference table or stream"))
        }
    }

    /// Locates the entry point by scanning the final kibibyte of the input
    /// for the last `startxref` keyword and returns the offset given on the
    /// following line.
    pub fn entrypoint(&mut self) -> Result<Offset, Error> {
        const KEYWORD: &[u8] = b"startxref";
        let len = self.tkn.stream_len()?;
        let tail = len.min(1024);
        self.tkn.seek(len - tail)?;
        let Some(data) = self.tkn.read_stream_bytes(tail as usize)? else {
            return Err(Error::Syntax("startxref not found"));
        };
        let sxref = data.windows(KEYWORD.len())
            .rposition(|w| w == KEYWORD)
            .ok_or(Error::Syntax("startxref not found"))?;
        let rest = &data[sxref + KEYWORD.len()..];
        let skip = rest.iter().take_while(|&&c| matches!(c, b'\r' | b'\n' | b' ')).count();
        let digits = rest[skip..].iter().take_while(|&&c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(Error::Syntax("malformed startxref"));
        }
        utils::parse_num(&rest[skip..skip + digits]).ok_or(Error::Syntax("malformed startxref"))
    }

    /// Builds the cross-reference index: follows the `startxref` entry point
    /// and every `/XRefStm` and `/Prev` link, newest first, appending each
    /// section to the index. Offsets already visited break the chain with a
    /// warning. Returns the trailer dictionary of the entry section.
    pub fn load_cross_references(&mut self) -> Result<Dict, Error> {
        let entry = self.entrypoint()?;
        let mut queue = VecDeque::from([entry]);
        let mut visited = Vec::new();
        let mut entry_trailer = None;
        while let Some(offset) = queue.pop_front() {
            if visited.contains(&offset) {
                log::warn!("breaking cross-reference chain loop at {offset}");
                continue;
            }
            visited.push(offset);
            self.tkn.seek(offset)?;
            let trailer = match self.parse_cross_reference()? {
                Object::Xref(_) => match self.next_object()? {
                    Object::Trailer(dict) => dict,
                    _ => return Err(Error::Syntax("malformed trailer"))
                },
                Object::Indirect(_, inner) => match *inner {
                    Object::Stream(stm) => stm.dict,
                    _ => return Err(Error::Syntax("expected a cross-reference stream"))
                },
                _ => return Err(Error::Syntax("expected a cross-reference table or stream"))
            };
            for key in [b"XRefStm".as_slice(), b"Prev".as_slice()] {
                if let Some(next) = trailer.lookup(key).num_value::<Offset>() {
                    queue.push_back(next);
                }
            }
            if entry_trailer.is_none() {
                entry_trailer = Some(trailer);
            }
        }
        entry_trailer.ok_or(Error::Syntax("could not read any cross-reference section"))
    }
}

impl<T: Into<String>> From<T> for ObjectParser<Cursor<String>> {
    fn from(input: T) -> Self {
        ObjectParser::new(Cursor::new(input.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        let mut parser = ObjectParser::from("/Name 123 true false null 34.5 (lit) <4869>");
        assert_eq!(parser.next_object().unwrap(), Object::new_name(b"Name"));
        assert_eq!(parser.next_object().unwrap(), Object::Number(Number::Int(123)));
        assert_eq!(parser.next_object().unwrap(), Object::Bool(true));
        assert_eq!(parser.next_object().unwrap(), Object::Bool(false));
        assert_eq!(parser.next_object().unwrap(), Object::Null);
        assert_eq!(parser.next_object().unwrap(), Object::Number(Number::Real(34.5)));
        assert_eq!(parser.next_object().unwrap(), Object::new_string(b"lit"));
        assert_eq!(parser.next_object().unwrap(), Object::new_string(b"Hi"));
        assert_eq!(parser.next_object().unwrap(), Object::Eof);
    }

    #[test]
    fn test_indirect_refs() {
        let mut parser = ObjectParser::from("<</Length 8 0 R>>");
        assert_eq!(parser.next_object().unwrap(), Object::Dict(Dict::from(vec![
            (Name::from(b"Length"), Object::Ref(ObjRef { num: 8, gen: 0 }))
        ])));

        let mut parser = ObjectParser::from("1 2 3 R 4 R");
        assert_eq!(parser.next_object().unwrap(), Object::Number(Number::Int(1)));
        assert_eq!(parser.next_object().unwrap(), Object::Ref(ObjRef { num: 2, gen: 3 }));
        assert_eq!(parser.next_object().unwrap(), Object::Number(Number::Int(4)));
        assert!(parser.next_object().is_err());

        // a line end between the integers breaks the indirect forms
        let mut parser = ObjectParser::from("1\n2 R");
        assert_eq!(parser.next_object().unwrap(), Object::Number(Number::Int(1)));
        assert_eq!(parser.next_object().unwrap(), Object::Number(Number::Int(2)));
        assert!(parser.next_object().is_err());
    }

    #[test]
    fn test_indirect_def() {
        let mut parser = ObjectParser::from("10 0 obj\n<< /Type /X >>\nendobj\n");
        assert_eq!(parser.next_object().unwrap(), Object::Indirect(
            ObjRef { num: 10, gen: 0 },
            Box::new(Object::Dict(Dict::from(vec![
                (Name::from(b"Type"), Object::new_name(b"X"))
            ])))
        ));
        assert_eq!(parser.next_object().unwrap(), Object::Eof);

        let mut parser = ObjectParser::from("7 1 obj (payload) endobj");
        assert_eq!(parser.next_object().unwrap(), Object::Indirect(
            ObjRef { num: 7, gen: 1 },
            Box::new(Object::new_string(b"payload"))
        ));

        let mut parser = ObjectParser::from("7 1 obj (payload) trailer");
        assert!(parser.next_object().is_err());
    }

    #[test]
    fn test_array() {
        let mut parser = ObjectParser::from("[549 3.14 false (Ralph) /SomeName] [ %\n ] [[1 2] 3]");
        assert_eq!(parser.next_object().unwrap(), Object::Array(vec![
            Object::Number(Number::Int(549)),
            Object::Number(Number::Real(3.14)),
            Object::Bool(false),
            Object::new_string(b"Ralph"),
            Object::new_name(b"SomeName")
        ]));
        assert_eq!(parser.next_object().unwrap(), Object::Array(Vec::new()));
        assert_eq!(parser.next_object().unwrap(), Object::Array(vec![
            Object::Array(vec![
                Object::Number(Number::Int(1)),
                Object::Number(Number::Int(2))
            ]),
            Object::Number(Number::Int(3))
        ]));

        let mut parser = ObjectParser::from("[1 2");
        assert_eq!(parser.next_object().unwrap(), Object::Eof);

        let mut parser = ObjectParser::from("[1 >> 2]");
        assert!(parser.next_object().is_err());
    }

    #[test]
    fn test_dict() {
        let mut parser = ObjectParser::from("<</Type /Example
    /Version 0.01
    /IntegerItem 12
    /StringItem (a string)
    /Subdictionary <<
        /Item1 0.4
        /Item2 true
        >>
    >>");
        assert_eq!(parser.next_object().unwrap(), Object::Dict(Dict::from(vec![
            (Name::from(b"Type"), Object::new_name(b"Example")),
            (Name::from(b"Version"), Object::Number(Number::Real(0.01))),
            (Name::from(b"IntegerItem"), Object::Number(Number::Int(12))),
            (Name::from(b"StringItem"), Object::new_string(b"a string")),
            (Name::from(b"Subdictionary"), Object::Dict(Dict::from(vec![
                (Name::from(b"Item1"), Object::Number(Number::Real(0.4))),
                (Name::from(b"Item2"), Object::Bool(true))
            ])))
        ])));

        // duplicate keys: the later value wins
        let mut parser = ObjectParser::from("<< /A 1 /B 2 /A 3 >>");
        let Object::Dict(dict) = parser.next_object().unwrap() else { panic!() };
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.lookup(b"A"), &Object::Number(Number::Int(3)));
        assert_eq!(dict.lookup(b"B"), &Object::Number(Number::Int(2)));

        // a non-name key is malformed
        let mut parser = ObjectParser::from("<< 1 2 >>");
        assert!(parser.next_object().is_err());
    }

    #[test]
    fn test_stream() {
        let mut parser = ObjectParser::from("<< /Length 5 >>\nstream\nHello\nendstream");
        assert_eq!(parser.next_object().unwrap(), Object::Stream(Stream {
            dict: Dict::from(vec![(Name::from(b"Length"), Object::Number(Number::Int(5)))]),
            data: b"Hello".to_vec()
        }));

        // CRLF after the keyword, CRLF before endstream
        let mut parser = ObjectParser::from("<< /Length 5 >> stream\r\nHello\r\nendstream");
        let Object::Stream(stm) = parser.next_object().unwrap() else { panic!() };
        assert_eq!(stm.data, b"Hello");

        // a lone CR after the keyword is rejected
        let mut parser = ObjectParser::from("<< /Length 5 >> stream\rHello\nendstream");
        assert!(parser.next_object().is_err());

        // the length may span line ends inside the payload
        let mut parser = ObjectParser::from("<< /Length 6 >>\nstream\nab\ncd\n\nendstream");
        let Object::Stream(stm) = parser.next_object().unwrap() else { panic!() };
        assert_eq!(stm.data, b"ab\ncd\n");

        // missing endstream
        let mut parser = ObjectParser::from("<< /Length 5 >>\nstream\nHello\nendobj");
        assert!(parser.next_object().is_err());

        // unresolvable length
        let mut parser = ObjectParser::from("<< /Type /X >>\nstream\nHello\nendstream");
        assert!(parser.next_object().is_err());

        // payload truncated by end of input
        let mut parser = ObjectParser::from("<< /Length 99 >>\nstream\nHello");
        assert_eq!(parser.next_object().unwrap(), Object::Eof);

        // a dictionary not followed by the keyword stays a dictionary
        let mut parser = ObjectParser::from("<< /Length 5 >>\n42");
        assert_eq!(parser.next_object().unwrap(), Object::Dict(Dict::from(vec![
            (Name::from(b"Length"), Object::Number(Number::Int(5)))
        ])));
        assert_eq!(parser.next_object().unwrap(), Object::Number(Number::Int(42)));

        // stream keyword with no dictionary before it
        let mut parser = ObjectParser::from("stream\nHello\nendstream");
        assert!(parser.next_object().is_err());
    }

    #[test]
    fn test_xref_section() {
        let input = "xref\n0 3\n0000000000 65535 f \n0000000017 00000 n \n0000000081 00000 n \ntrailer\n<< /Size 3 >>";
        let mut parser = ObjectParser::from(input);
        let Object::Xref(section) = parser.next_object().unwrap() else { panic!() };
        assert_eq!(section.subsections().len(), 1);
        let subs = &section.subsections()[0];
        assert_eq!(subs.start, 0);
        assert_eq!(subs.count(), 3);
        assert_eq!(subs.entries, vec![
            Record::Free { next: 0, gen: 65535 },
            Record::Used { offset: 17, gen: 0 },
            Record::Used { offset: 81, gen: 0 },
        ]);
        assert_eq!(parser.next_object().unwrap(), Object::Trailer(Dict::from(vec![
            (Name::from(b"Size"), Object::Number(Number::Int(3)))
        ])));

        // the accumulated index answers lookups
        assert_eq!(parser.xref_index().locate(1), Some(Record::Used { offset: 17, gen: 0 }));

        // two subsections
        let input = "xref\n0 1\n0000000000 65535 f \n4 2\n0000000100 00000 n \n0000000200 00000 n \ntrailer";
        let mut parser = ObjectParser::from(input);
        let Object::Xref(section) = parser.next_object().unwrap() else { panic!() };
        assert_eq!(section.subsections().len(), 2);
        assert_eq!(section.locate(5), Some(Record::Used { offset: 200, gen: 0 }));
        assert_eq!(section.locate(3), None);

        // no EOL after the keyword
        let mut parser = ObjectParser::from("xref 0 3");
        assert!(parser.next_object().is_err());

        // a malformed entry is an error, not a silent termination
        let input = "xref\n0 1\n00000000x0 65535 f \ntrailer";
        let mut parser = ObjectParser::from(input);
        assert!(parser.next_object().is_err());
    }

    #[test]
    fn test_trailer() {
        let mut parser = ObjectParser::from("trailer\n<< /Size 3 /Root 1 0 R >>");
        assert_eq!(parser.next_object().unwrap(), Object::Trailer(Dict::from(vec![
            (Name::from(b"Size"), Object::Number(Number::Int(3))),
            (Name::from(b"Root"), Object::Ref(ObjRef { num: 1, gen: 0 }))
        ])));

        let mut parser = ObjectParser::from("trailer 42");
        assert!(parser.next_object().is_err());
    }

    #[test]
    fn test_file_markers() {
        let mut parser = ObjectParser::from("%PDF-1.4\nstartxref\n416\n%%EOF\n");
        assert_eq!(parser.next_object().unwrap(), Object::Version(1, 4));
        assert_eq!(parser.next_object().unwrap(), Object::StartXref);
        assert_eq!(parser.next_object().unwrap(), Object::Number(Number::Int(416)));
        assert_eq!(parser.next_object().unwrap(), Object::EofMarker);
        assert_eq!(parser.next_object().unwrap(), Object::Eof);
    }

    /// A small complete file: two objects, a cross-reference table, trailer,
    /// startxref. The second object is the stream's `/Length`.
    fn sample_pdf() -> (Vec<u8>, Offset, Offset, Offset) {
        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n");
        let stm_off = pdf.len() as Offset;
        pdf.extend_from_slice(b"1 0 obj\n<< /Length 2 0 R >>\nstream\nHello\nendstream\nendobj\n");
        let len_off = pdf.len() as Offset;
        pdf.extend_from_slice(b"2 0 obj\n5\nendobj\n");
        let xref_off = pdf.len() as Offset;
        pdf.extend_from_slice(b"xref\n0 3\n");
        pdf.extend_from_slice(b"0000000000 65535 f \n");
        pdf.extend_from_slice(format!("{:010} {:05} n \n", stm_off, 0).as_bytes());
        pdf.extend_from_slice(format!("{:010} {:05} n \n", len_off, 0).as_bytes());
        pdf.extend_from_slice(b"trailer\n<< /Size 3 >>\nstartxref\n");
        pdf.extend_from_slice(format!("{}\n", xref_off).as_bytes());
        pdf.extend_from_slice(b"%%EOF\n");
        (pdf, stm_off, len_off, xref_off)
    }

    #[test]
    fn test_dereference() {
        let (pdf, stm_off, _, xref_off) = sample_pdf();
        let mut parser = ObjectParser::new(Cursor::new(pdf));
        parser.seek(xref_off).unwrap();
        let Object::Xref(_) = parser.next_object().unwrap() else { panic!() };

        assert_eq!(parser.dereference(&ObjRef { num: 2, gen: 0 }).unwrap(),
            Some(Object::Number(Number::Int(5))));
        // free entry
        assert_eq!(parser.dereference(&ObjRef { num: 0, gen: 0 }).unwrap(), None);
        // absent entry
        assert_eq!(parser.dereference(&ObjRef { num: 9, gen: 0 }).unwrap(), None);
        // generation mismatch is tolerated
        assert_eq!(parser.dereference(&ObjRef { num: 2, gen: 1 }).unwrap(),
            Some(Object::Number(Number::Int(5))));

        // the stream object now parses, resolving its indirect /Length,
        // and the parser's position survives the excursion
        parser.seek(stm_off).unwrap();
        let Object::Indirect(oref, inner) = parser.next_object().unwrap() else { panic!() };
        assert_eq!(oref, ObjRef { num: 1, gen: 0 });
        let Object::Stream(stm) = *inner else { panic!() };
        assert_eq!(stm.data, b"Hello");
    }

    #[test]
    fn test_dereference_num_mismatch() {
        let (pdf, stm_off, len_off, _) = sample_pdf();
        let mut parser = ObjectParser::new(Cursor::new(pdf));
        // hand-build an index that records object 3 at object 1's offset
        parser.index.push(XrefSubsection { start: 3, entries: vec![
            Record::Used { offset: stm_off, gen: 0 },
        ]});
        parser.index.push(XrefSubsection { start: 2, entries: vec![
            Record::Used { offset: len_off, gen: 0 },
        ]});
        assert_eq!(parser.dereference(&ObjRef { num: 3, gen: 0 }).unwrap(), None);
    }

    #[test]
    fn test_entrypoint_and_load() {
        let (pdf, _, len_off, xref_off) = sample_pdf();
        let mut parser = ObjectParser::new(Cursor::new(pdf));
        assert_eq!(parser.entrypoint().unwrap(), xref_off);

        let trailer = parser.load_cross_references().unwrap();
        assert_eq!(trailer.lookup(b"Size"), &Object::Number(Number::Int(3)));
        assert_eq!(parser.xref_index().locate(2), Some(Record::Used { offset: len_off, gen: 0 }));

        // sequential walk over the whole file, index already in place
        parser.seek(0).unwrap();
        let mut kinds = Vec::new();
        loop {
            match parser.next_object().unwrap() {
                Object::Eof => break,
                obj => kinds.push(obj)
            }
        }
        assert!(matches!(kinds[0], Object::Version(1, 4)));
        assert!(matches!(kinds[1], Object::Indirect(ObjRef { num: 1, gen: 0 }, _)));
        assert!(matches!(kinds[2], Object::Indirect(ObjRef { num: 2, gen: 0 }, _)));
        assert!(matches!(kinds[3], Object::Xref(_)));
        assert!(matches!(kinds[4], Object::Trailer(_)));
        assert!(matches!(kinds[5], Object::StartXref));
        assert!(matches!(kinds[6], Object::Number(Number::Int(_))));
        assert!(matches!(kinds[7], Object::EofMarker));
    }

    #[test]
    fn test_load_prev_chain() {
        // an older section defines 1 0 at a bogus offset; the newer one
        // shadows it
        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n");
        let obj_off = pdf.len() as Offset;
        pdf.extend_from_slice(b"1 0 obj 7 endobj\n");
        let old_xref = pdf.len() as Offset;
        pdf.extend_from_slice(b"xref\n0 2\n0000000000 65535 f \n0000009999 00000 n \ntrailer\n<< /Size 2 >>\n");
        let new_xref = pdf.len() as Offset;
        pdf.extend_from_slice(b"xref\n1 1\n");
        pdf.extend_from_slice(format!("{:010} {:05} n \n", obj_off, 0).as_bytes());
        pdf.extend_from_slice(format!("trailer\n<< /Size 2 /Prev {} >>\nstartxref\n{}\n%%EOF\n",
            old_xref, new_xref).as_bytes());

        let mut parser = ObjectParser::new(Cursor::new(pdf));
        let trailer = parser.load_cross_references().unwrap();
        assert_eq!(trailer.lookup(b"Prev"), &Object::Number(Number::Int(old_xref as i64)));
        assert_eq!(parser.xref_index().locate(1), Some(Record::Used { offset: obj_off, gen: 0 }));
        assert_eq!(parser.dereference(&ObjRef { num: 1, gen: 0 }).unwrap(),
            Some(Object::Number(Number::Int(7))));
    }

    #[test]
    fn test_load_chain_loop() {
        // /Prev pointing back at the same section must not hang
        let mut pdf = Vec::new();
        let xref_off = pdf.len() as Offset;
        pdf.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
        pdf.extend_from_slice(format!("trailer\n<< /Size 1 /Prev {} >>\nstartxref\n{}\n%%EOF\n",
            xref_off, xref_off).as_bytes());
        let mut parser = ObjectParser::new(Cursor::new(pdf));
        let trailer = parser.load_cross_references().unwrap();
        assert_eq!(trailer.lookup(b"Size"), &Object::Number(Number::Int(1)));
    }

    #[test]
    fn test_error_recovery() {
        // a lexical error does not poison the parser
        let mut parser = ObjectParser::from("} 42");
        assert!(parser.next_object().is_err());
        assert_eq!(parser.next_object().unwrap(), Object::Number(Number::Int(42)));
    }

    #[test]
    fn test_array_of_refs() {
        let mut parser = ObjectParser::from("[2 0 R 3 0 R 4] << /Kids [5 0 R] >>");
        assert_eq!(parser.next_object().unwrap(), Object::Array(vec![
            Object::Ref(ObjRef { num: 2, gen: 0 }),
            Object::Ref(ObjRef { num: 3, gen: 0 }),
            Object::Number(Number::Int(4))
        ]));
        assert_eq!(parser.next_object().unwrap(), Object::Dict(Dict::from(vec![
            (Name::from(b"Kids"), Object::Array(vec![
                Object::Ref(ObjRef { num: 5, gen: 0 })
            ]))
        ])));
    }

    #[test]
    fn test_seek_replay() {
        let mut parser = ObjectParser::from("1 0 obj [1 2 R] endobj 9");
        let pos = parser.tell();
        let first = parser.next_object().unwrap();
        assert!(matches!(first, Object::Indirect(..)));
        assert_eq!(parser.next_object().unwrap(), Object::Number(Number::Int(9)));
        parser.seek(pos).unwrap();
        assert_eq!(parser.next_object().unwrap(), first);
        assert_eq!(parser.next_object().unwrap(), Object::Number(Number::Int(9)));
    }

    #[test]
    fn test_parse_cross_reference_classic() {
        let input = "xref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 >>";
        let mut parser = ObjectParser::from(input);
        let Object::Xref(section) = parser.parse_cross_reference().unwrap() else { panic!() };
        assert_eq!(section.subsections().len(), 1);
        assert_eq!(parser.xref_index().locate(0), Some(Record::Free { next: 0, gen: 65535 }));
        assert!(matches!(parser.next_object().unwrap(), Object::Trailer(_)));

        let mut parser = ObjectParser::from("(not an xref)");
        assert!(parser.parse_cross_reference().is_err());
    }

    #[test]
    fn test_parse_cross_reference_stream() {
        // 1 0 obj << /Type /XRef ... >> stream ... endstream endobj
        let mut records = Vec::new();
        records.extend_from_slice(&[0, 0x00, 0x00, 0xFF]);
        records.extend_from_slice(&[1, 0x00, 0x40, 0x00]);
        let mut pdf = Vec::new();
        pdf.extend_from_slice(
            format!("1 0 obj\n<< /Type /XRef /Size 2 /W [1 2 1] /Length {} >>\nstream\n",
                records.len()).as_bytes());
        pdf.extend_from_slice(&records);
        pdf.extend_from_slice(b"\nendstream\nendobj\n");

        let mut parser = ObjectParser::new(Cursor::new(pdf));
        let obj = parser.parse_cross_reference().unwrap();
        let Object::Indirect(oref, inner) = obj else { panic!() };
        assert_eq!(oref, ObjRef { num: 1, gen: 0 });
        assert!(matches!(*inner, Object::Stream(_)));
        assert_eq!(parser.xref_index().locate(1), Some(Record::Used { offset: 0x40, gen: 0 }));
    }
}
