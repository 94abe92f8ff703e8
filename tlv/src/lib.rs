//! Sequential pull reader for the compact TLV certificate encoding.
//!
//! Every element starts with a control byte: the upper three bits select the
//! tag form, the lower five bits the element type. Only the anonymous and
//! context-specific (one tag byte) forms are used by the certificate format.
//! Multi-byte integers and string length prefixes are little-endian.

use std::fmt;

use nom::Parser;

pub mod error;

pub use error::Error;

const TAG_CONTROL_ANONYMOUS: u8 = 0x00;
const TAG_CONTROL_CONTEXT: u8 = 0x01;

const TYPE_INT8: u8 = 0x00;
const TYPE_INT64: u8 = 0x03;
const TYPE_UINT8: u8 = 0x04;
const TYPE_UINT64: u8 = 0x07;
const TYPE_BOOL_FALSE: u8 = 0x08;
const TYPE_BOOL_TRUE: u8 = 0x09;
const TYPE_UTF8_1: u8 = 0x0c;
const TYPE_UTF8_8: u8 = 0x0f;
const TYPE_BYTES_1: u8 = 0x10;
const TYPE_BYTES_8: u8 = 0x13;
const TYPE_NULL: u8 = 0x14;
const TYPE_STRUCTURE: u8 = 0x15;
const TYPE_ARRAY: u8 = 0x16;
const TYPE_LIST: u8 = 0x17;
const TYPE_END_OF_CONTAINER: u8 = 0x18;

/// Tag of a TLV element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Anonymous,
    Context(u8),
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Anonymous => write!(f, "anonymous tag"),
            Tag::Context(n) => write!(f, "context tag {}", n),
        }
    }
}

/// Container element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerType {
    Structure,
    Array,
    List,
}

/// Type of the current element, as reported by [`TlvReader::element_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Signed,
    Unsigned,
    Boolean,
    Utf8String,
    ByteString,
    Null,
    Container(ContainerType),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind<'a> {
    Signed(i64),
    Unsigned(u64),
    Boolean(bool),
    Utf8(&'a str),
    Bytes(&'a [u8]),
    Null,
    Container(ContainerType),
    EndOfContainer,
}

#[derive(Debug, Clone, Copy)]
struct Element<'a> {
    tag: Tag,
    kind: Kind<'a>,
}

/// Pull reader over a TLV-encoded byte buffer.
///
/// The reader holds at most one current element. [`TlvReader::next`] advances
/// to the following element and returns `Ok(false)` at the end of the current
/// container or at the end of input; that is the expected end-of-list signal,
/// not an error. Value accessors do not advance the reader.
#[derive(Debug)]
pub struct TlvReader<'a> {
    input: &'a [u8],
    current: Option<Element<'a>>,
    depth: Vec<ContainerType>,
}

impl<'a> TlvReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        TlvReader {
            input,
            current: None,
            depth: Vec::new(),
        }
    }

    /// Advances to the next element.
    ///
    /// An unentered container element is skipped whole, nested containers
    /// included. The end-of-container marker is left in place for
    /// [`TlvReader::exit_container`].
    pub fn next(&mut self) -> Result<bool, Error> {
        self.finish_current()?;
        if self.input.is_empty() {
            if self.depth.is_empty() {
                return Ok(false);
            }
            return Err(Error::UnexpectedEndOfData);
        }
        let (rest, element) = read_element(self.input)?;
        if matches!(element.kind, Kind::EndOfContainer) {
            if self.depth.is_empty() {
                return Err(Error::UnexpectedEndOfContainer);
            }
            return Ok(false);
        }
        self.input = rest;
        self.current = Some(element);
        Ok(true)
    }

    /// Advances and requires a specific tag on the new element.
    pub fn next_expect(&mut self, tag: Tag) -> Result<(), Error> {
        if !self.next()? {
            return Err(Error::UnexpectedEndOfData);
        }
        self.expect(tag)
    }

    /// Requires the current element to carry the given tag.
    pub fn expect(&self, tag: Tag) -> Result<(), Error> {
        let found = self.tag()?;
        if found != tag {
            return Err(Error::UnexpectedTag {
                expected: tag,
                found,
            });
        }
        Ok(())
    }

    /// Asserts that the current container (or the input) has no further
    /// elements.
    pub fn expect_end(&mut self) -> Result<(), Error> {
        if self.next()? {
            return Err(Error::TrailingElements);
        }
        Ok(())
    }

    pub fn tag(&self) -> Result<Tag, Error> {
        Ok(self.element()?.tag)
    }

    pub fn element_type(&self) -> Result<ElementType, Error> {
        Ok(match self.element()?.kind {
            Kind::Signed(_) => ElementType::Signed,
            Kind::Unsigned(_) => ElementType::Unsigned,
            Kind::Boolean(_) => ElementType::Boolean,
            Kind::Utf8(_) => ElementType::Utf8String,
            Kind::Bytes(_) => ElementType::ByteString,
            Kind::Null => ElementType::Null,
            Kind::Container(t) => ElementType::Container(t),
            // never stored as the current element
            Kind::EndOfContainer => return Err(Error::NoElement),
        })
    }

    /// Whether the reader is positioned on an element.
    pub fn has_element(&self) -> bool {
        self.current.is_some()
    }

    pub fn get_bool(&self) -> Result<bool, Error> {
        match self.element()?.kind {
            Kind::Boolean(v) => Ok(v),
            _ => Err(Error::UnexpectedValueType { expected: "boolean" }),
        }
    }

    pub fn get_u8(&self) -> Result<u8, Error> {
        u8::try_from(self.unsigned()?).map_err(|_| Error::IntegerOutOfRange("u8"))
    }

    pub fn get_u16(&self) -> Result<u16, Error> {
        u16::try_from(self.unsigned()?).map_err(|_| Error::IntegerOutOfRange("u16"))
    }

    pub fn get_u32(&self) -> Result<u32, Error> {
        u32::try_from(self.unsigned()?).map_err(|_| Error::IntegerOutOfRange("u32"))
    }

    pub fn get_u64(&self) -> Result<u64, Error> {
        self.unsigned()
    }

    pub fn get_i64(&self) -> Result<i64, Error> {
        match self.element()?.kind {
            Kind::Signed(v) => Ok(v),
            _ => Err(Error::UnexpectedValueType {
                expected: "signed integer",
            }),
        }
    }

    pub fn get_bytes(&self) -> Result<&'a [u8], Error> {
        match self.element()?.kind {
            Kind::Bytes(b) => Ok(b),
            _ => Err(Error::UnexpectedValueType {
                expected: "byte string",
            }),
        }
    }

    pub fn get_str(&self) -> Result<&'a str, Error> {
        match self.element()?.kind {
            Kind::Utf8(s) => Ok(s),
            _ => Err(Error::UnexpectedValueType {
                expected: "UTF-8 string",
            }),
        }
    }

    /// Enters the container the reader is positioned on.
    pub fn enter_container(&mut self) -> Result<ContainerType, Error> {
        let kind = self.element()?.kind;
        match kind {
            Kind::Container(t) => {
                self.current = None;
                self.depth.push(t);
                Ok(t)
            }
            _ => Err(Error::NotAContainer),
        }
    }

    /// Enters the current container, requiring a specific container type.
    pub fn enter(&mut self, expected: ContainerType) -> Result<(), Error> {
        let kind = self.element()?.kind;
        match kind {
            Kind::Container(t) if t == expected => {
                self.current = None;
                self.depth.push(t);
                Ok(())
            }
            _ => Err(Error::UnexpectedValueType {
                expected: container_name(expected),
            }),
        }
    }

    /// Leaves the innermost entered container, skipping any unread elements
    /// up to and including the matching end-of-container marker.
    pub fn exit_container(&mut self) -> Result<(), Error> {
        if self.depth.is_empty() {
            return Err(Error::NotInContainer);
        }
        self.finish_current()?;
        loop {
            let (rest, element) = read_element(self.input)?;
            self.input = rest;
            match element.kind {
                Kind::EndOfContainer => break,
                Kind::Container(_) => self.skip_body()?,
                _ => {}
            }
        }
        self.depth.pop();
        Ok(())
    }

    fn element(&self) -> Result<&Element<'a>, Error> {
        self.current.as_ref().ok_or(Error::NoElement)
    }

    fn unsigned(&self) -> Result<u64, Error> {
        match self.element()?.kind {
            Kind::Unsigned(v) => Ok(v),
            _ => Err(Error::UnexpectedValueType {
                expected: "unsigned integer",
            }),
        }
    }

    // Consumes the body of the current element if it is an unentered
    // container.
    fn finish_current(&mut self) -> Result<(), Error> {
        if let Some(element) = self.current.take() {
            if matches!(element.kind, Kind::Container(_)) {
                self.skip_body()?;
            }
        }
        Ok(())
    }

    // Consumes a container body up to and including its end marker.
    fn skip_body(&mut self) -> Result<(), Error> {
        let mut depth = 1usize;
        while depth > 0 {
            let (rest, element) = read_element(self.input)?;
            self.input = rest;
            match element.kind {
                Kind::Container(_) => depth += 1,
                Kind::EndOfContainer => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }
}

fn container_name(container_type: ContainerType) -> &'static str {
    match container_type {
        ContainerType::Structure => "structure container",
        ContainerType::Array => "array container",
        ContainerType::List => "list container",
    }
}

fn read_element(input: &[u8]) -> Result<(&[u8], Element<'_>), Error> {
    let (input, control) = take_byte(input)?;
    let tag_control = control >> 5;
    let element_type = control & 0x1f;
    let (input, tag) = match tag_control {
        TAG_CONTROL_ANONYMOUS => (input, Tag::Anonymous),
        TAG_CONTROL_CONTEXT => {
            let (input, n) = take_byte(input)?;
            (input, Tag::Context(n))
        }
        _ => return Err(Error::UnsupportedTagControl(tag_control)),
    };
    let (input, kind) = read_value(input, element_type)?;
    Ok((input, Element { tag, kind }))
}

fn read_value(input: &[u8], element_type: u8) -> Result<(&[u8], Kind<'_>), Error> {
    match element_type {
        TYPE_INT8..=TYPE_INT64 => {
            let width_code = element_type - TYPE_INT8;
            let (input, raw) = take_le(input, width_code)?;
            Ok((input, Kind::Signed(sign_extend(raw, width_code))))
        }
        TYPE_UINT8..=TYPE_UINT64 => {
            let width_code = element_type - TYPE_UINT8;
            let (input, raw) = take_le(input, width_code)?;
            Ok((input, Kind::Unsigned(raw)))
        }
        TYPE_BOOL_FALSE => Ok((input, Kind::Boolean(false))),
        TYPE_BOOL_TRUE => Ok((input, Kind::Boolean(true))),
        TYPE_UTF8_1..=TYPE_UTF8_8 => {
            let (input, data) = take_with_length(input, element_type - TYPE_UTF8_1)?;
            let s = std::str::from_utf8(data).map_err(|_| Error::InvalidUtf8)?;
            Ok((input, Kind::Utf8(s)))
        }
        TYPE_BYTES_1..=TYPE_BYTES_8 => {
            let (input, data) = take_with_length(input, element_type - TYPE_BYTES_1)?;
            Ok((input, Kind::Bytes(data)))
        }
        TYPE_NULL => Ok((input, Kind::Null)),
        TYPE_STRUCTURE => Ok((input, Kind::Container(ContainerType::Structure))),
        TYPE_ARRAY => Ok((input, Kind::Container(ContainerType::Array))),
        TYPE_LIST => Ok((input, Kind::Container(ContainerType::List))),
        TYPE_END_OF_CONTAINER => Ok((input, Kind::EndOfContainer)),
        _ => Err(Error::UnsupportedElementType(element_type)),
    }
}

fn take_byte(input: &[u8]) -> Result<(&[u8], u8), Error> {
    let parsed: nom::IResult<&[u8], u8> = nom::number::be_u8().parse(input);
    parsed.map_err(|_| Error::UnexpectedEndOfData)
}

// Little-endian unsigned value; the width code selects 1/2/4/8 bytes.
fn take_le(input: &[u8], width_code: u8) -> Result<(&[u8], u64), Error> {
    match width_code {
        0 => {
            let (input, v) = take_byte(input)?;
            Ok((input, u64::from(v)))
        }
        1 => {
            let parsed: nom::IResult<&[u8], u16> = nom::number::le_u16().parse(input);
            let (input, v) = parsed.map_err(|_| Error::UnexpectedEndOfData)?;
            Ok((input, u64::from(v)))
        }
        2 => {
            let parsed: nom::IResult<&[u8], u32> = nom::number::le_u32().parse(input);
            let (input, v) = parsed.map_err(|_| Error::UnexpectedEndOfData)?;
            Ok((input, u64::from(v)))
        }
        _ => {
            let parsed: nom::IResult<&[u8], u64> = nom::number::le_u64().parse(input);
            parsed.map_err(|_| Error::UnexpectedEndOfData)
        }
    }
}

fn sign_extend(raw: u64, width_code: u8) -> i64 {
    match width_code {
        0 => i64::from(raw as u8 as i8),
        1 => i64::from(raw as u16 as i16),
        2 => i64::from(raw as u32 as i32),
        _ => raw as i64,
    }
}

fn take_with_length(input: &[u8], width_code: u8) -> Result<(&[u8], &[u8]), Error> {
    let (input, len) = take_le(input, width_code)?;
    let len = usize::try_from(len).map_err(|_| Error::UnexpectedEndOfData)?;
    let parsed: nom::IResult<&[u8], &[u8]> = nom::bytes::complete::take(len).parse(input);
    parsed.map_err(|_| Error::UnexpectedEndOfData)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::{ContainerType, ElementType, Error, Tag, TlvReader};

    #[rstest(input, expected,
        case(vec![0x04, 0x2a], 42),
        case(vec![0x05, 0x34, 0x12], 0x1234),
        case(vec![0x06, 0x78, 0x56, 0x34, 0x12], 0x1234_5678),
        case(vec![0x07, 0xef, 0xcd, 0xab, 0x89, 0x67, 0x45, 0x23, 0x01], 0x0123_4567_89ab_cdef),
    )]
    fn test_read_unsigned_widths(input: Vec<u8>, expected: u64) {
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        assert_eq!(Tag::Anonymous, reader.tag().unwrap());
        assert_eq!(expected, reader.get_u64().unwrap());
    }

    #[rstest(input, expected,
        case(vec![0x00, 0xff], -1),
        case(vec![0x01, 0x00, 0x80], -32768),
        case(vec![0x00, 0x7f], 127),
    )]
    fn test_read_signed(input: Vec<u8>, expected: i64) {
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        assert_eq!(expected, reader.get_i64().unwrap());
    }

    #[test]
    fn test_width_coercion() {
        // the value fits in u8 even though it is encoded in two bytes
        let input = vec![0x05, 0x07, 0x00];
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        assert_eq!(7, reader.get_u8().unwrap());

        let input = vec![0x05, 0x2c, 0x01];
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        assert_eq!(Err(Error::IntegerOutOfRange("u8")), reader.get_u8());
        assert_eq!(300, reader.get_u16().unwrap());
    }

    #[test]
    fn test_context_tag() {
        let input = vec![0x24, 0x07, 0x2a];
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        assert_eq!(Tag::Context(7), reader.tag().unwrap());
        assert_eq!(42, reader.get_u8().unwrap());
        reader.expect(Tag::Context(7)).unwrap();
        assert_eq!(
            Err(Error::UnexpectedTag {
                expected: Tag::Context(1),
                found: Tag::Context(7),
            }),
            reader.expect(Tag::Context(1))
        );
    }

    #[rstest(input, expected, case(vec![0x08], false), case(vec![0x09], true))]
    fn test_read_boolean(input: Vec<u8>, expected: bool) {
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        assert_eq!(expected, reader.get_bool().unwrap());
    }

    #[test]
    fn test_read_byte_string() {
        let input = vec![0x10, 0x03, 0x01, 0x02, 0x03];
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        assert_eq!(ElementType::ByteString, reader.element_type().unwrap());
        assert_eq!(&[0x01, 0x02, 0x03][..], reader.get_bytes().unwrap());
    }

    #[test]
    fn test_read_utf8_string() {
        let input = vec![0x0c, 0x02, 0x68, 0x69];
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        assert_eq!("hi", reader.get_str().unwrap());

        let input = vec![0x0c, 0x02, 0xff, 0xfe];
        let mut reader = TlvReader::new(&input);
        assert_eq!(Err(Error::InvalidUtf8), reader.next());
    }

    #[test]
    fn test_structure_walk() {
        // structure { u8 1, u8 2 }
        let input = vec![0x15, 0x04, 0x01, 0x04, 0x02, 0x18];
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        assert_eq!(
            ElementType::Container(ContainerType::Structure),
            reader.element_type().unwrap()
        );
        assert_eq!(ContainerType::Structure, reader.enter_container().unwrap());
        assert!(reader.next().unwrap());
        assert_eq!(1, reader.get_u8().unwrap());
        assert!(reader.next().unwrap());
        assert_eq!(2, reader.get_u8().unwrap());
        assert!(!reader.next().unwrap());
        reader.exit_container().unwrap();
        assert!(!reader.next().unwrap());
    }

    #[test]
    fn test_skip_unentered_container() {
        // structure { list { u8 1, u8 2 }, u8 3 }
        let input = vec![0x15, 0x17, 0x04, 0x01, 0x04, 0x02, 0x18, 0x04, 0x03, 0x18];
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        reader.enter(ContainerType::Structure).unwrap();
        assert!(reader.next().unwrap());
        assert_eq!(
            ElementType::Container(ContainerType::List),
            reader.element_type().unwrap()
        );
        // advancing past the unentered list lands on the trailing u8
        assert!(reader.next().unwrap());
        assert_eq!(3, reader.get_u8().unwrap());
        reader.exit_container().unwrap();
    }

    #[test]
    fn test_exit_skips_unread_elements() {
        // structure { u8 1, array { u8 2 }, u8 3 } u8 9
        let input = vec![
            0x15, 0x04, 0x01, 0x16, 0x04, 0x02, 0x18, 0x04, 0x03, 0x18, 0x04, 0x09,
        ];
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        reader.enter(ContainerType::Structure).unwrap();
        assert!(reader.next().unwrap());
        reader.exit_container().unwrap();
        assert!(reader.next().unwrap());
        assert_eq!(9, reader.get_u8().unwrap());
    }

    #[test]
    fn test_enter_wrong_container_type() {
        let input = vec![0x16, 0x18];
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        assert_eq!(
            Err(Error::UnexpectedValueType {
                expected: "list container",
            }),
            reader.enter(ContainerType::List)
        );
    }

    #[test]
    fn test_end_of_input() {
        let mut reader = TlvReader::new(&[]);
        assert!(!reader.next().unwrap());
        reader.expect_end().unwrap();
    }

    #[test]
    fn test_trailing_element() {
        let input = vec![0x04, 0x01];
        let mut reader = TlvReader::new(&input);
        assert_eq!(Err(Error::TrailingElements), reader.expect_end());
    }

    #[rstest(input, expected,
        case(vec![0x44, 0x2a], Error::UnsupportedTagControl(0x02)),
        case(vec![0xe4, 0x2a], Error::UnsupportedTagControl(0x07)),
        case(vec![0x0a, 0x00, 0x00, 0x00, 0x00], Error::UnsupportedElementType(0x0a)),
        case(vec![0x0b; 9], Error::UnsupportedElementType(0x0b)),
        case(vec![0x1f], Error::UnsupportedElementType(0x1f)),
        case(vec![0x18], Error::UnexpectedEndOfContainer),
        case(vec![0x10, 0x05, 0x01], Error::UnexpectedEndOfData),
    )]
    fn test_read_errors(input: Vec<u8>, expected: Error) {
        let mut reader = TlvReader::new(&input);
        assert_eq!(Err(expected), reader.next());
    }

    #[test]
    fn test_truncated_container() {
        // structure opened but never terminated
        let input = vec![0x15, 0x04, 0x01];
        let mut reader = TlvReader::new(&input);
        assert!(reader.next().unwrap());
        reader.enter_container().unwrap();
        assert!(reader.next().unwrap());
        assert_eq!(Err(Error::UnexpectedEndOfData), reader.next());
    }

    #[test]
    fn test_next_expect() {
        let input = vec![0x24, 0x01, 0x2a];
        let mut reader = TlvReader::new(&input);
        reader.next_expect(Tag::Context(1)).unwrap();
        assert_eq!(42, reader.get_u8().unwrap());
        assert_eq!(
            Err(Error::UnexpectedEndOfData),
            reader.next_expect(Tag::Context(2))
        );
    }
}
