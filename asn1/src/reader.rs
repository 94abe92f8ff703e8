//! Minimal pull reader over DER bytes.

use nom::Parser;

use crate::error::Error;

/// Sequential reader over a DER-encoded byte buffer.
///
/// Reads one element at a time without interpreting the content; nesting is
/// handled by constructing a new reader over a returned content slice.
#[derive(Debug, Clone)]
pub struct DerReader<'a> {
    input: &'a [u8],
}

impl<'a> DerReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        DerReader { input }
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Tag byte of the next element, without advancing.
    pub fn peek_tag(&self) -> Result<u8, Error> {
        self.input.first().copied().ok_or(Error::TruncatedElement)
    }

    /// Reads the next element, returning its tag byte and content octets.
    pub fn read(&mut self) -> Result<(u8, &'a [u8]), Error> {
        let (rest, tag, content) = parse_element(self.input)?;
        self.input = rest;
        Ok((tag, content))
    }

    /// Reads the next element whole, header included.
    pub fn read_raw(&mut self) -> Result<&'a [u8], Error> {
        let (rest, _, _) = parse_element(self.input)?;
        let consumed = self.input.len() - rest.len();
        let raw = &self.input[..consumed];
        self.input = rest;
        Ok(raw)
    }
}

fn parse_element(input: &[u8]) -> Result<(&[u8], u8, &[u8]), Error> {
    let parsed: nom::IResult<&[u8], u8> = nom::number::be_u8().parse(input);
    let (input, tag) = parsed.map_err(|_| Error::TruncatedElement)?;
    let (input, length) = parse_length(input)?;
    let length = usize::try_from(length).map_err(|_| Error::TruncatedElement)?;
    let parsed: nom::IResult<&[u8], &[u8]> = nom::bytes::complete::take(length).parse(input);
    let (input, content) = parsed.map_err(|_| Error::TruncatedElement)?;
    Ok((input, tag, content))
}

fn parse_length(input: &[u8]) -> Result<(&[u8], u64), Error> {
    let parsed: nom::IResult<&[u8], u8> = nom::number::be_u8().parse(input);
    let (input, n) = parsed.map_err(|_| Error::TruncatedElement)?;
    if n & 0x80 == 0x80 {
        // long form: the low bits give the byte count of the length field
        let count = n & 0x7f;
        let parsed: nom::IResult<&[u8], &[u8]> = nom::bytes::complete::take(count).parse(input);
        let (input, bytes) = parsed.map_err(|_| Error::TruncatedElement)?;
        if bytes.len() > 8 {
            return Err(Error::InvalidLength);
        }
        let length = bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        return Ok((input, length));
    }
    // short form: 0-127
    Ok((input, u64::from(n)))
}
