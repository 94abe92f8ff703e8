//! DER encoding support for certificate transcoding.
//!
//! The central type is [`Asn1Writer`], a sequential DER writer with deferred
//! container lengths: a `begin_*` call opens a container, `end` closes the
//! innermost one and fixes up its header. A discarding variant
//! ([`Asn1Writer::null`]) accepts the same call sequence while producing no
//! output, so decode-only passes can share the encoding code path.

use chrono::{Datelike, NaiveDateTime};
use num_bigint::BigInt;

pub mod error;
pub mod oid;
pub mod reader;

pub use error::Error;
pub use oid::ObjectIdentifier;
pub use reader::DerReader;

const TAG_BOOLEAN: u8 = 0x01;
const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_OBJECT_IDENTIFIER: u8 = 0x06;
const TAG_UTF8_STRING: u8 = 0x0c;
const TAG_PRINTABLE_STRING: u8 = 0x13;
const TAG_IA5_STRING: u8 = 0x16;
const TAG_UTC_TIME: u8 = 0x17;
const TAG_GENERALIZED_TIME: u8 = 0x18;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_SET: u8 = 0x31;
const TAG_CONTEXT_PRIMITIVE: u8 = 0x80;
const TAG_CONTEXT_CONSTRUCTED: u8 = 0xa0;

/// Start offset handed back by [`Asn1Writer::mark`], resolvable to the byte
/// range written since via [`Asn1Writer::bytes_since`].
#[derive(Debug, Clone, Copy)]
pub struct Mark(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Constructed,
    OctetString,
    BitString,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    tag: u8,
    start: usize,
    kind: FrameKind,
}

/// Sequential DER writer with a hard output capacity.
#[derive(Debug)]
pub struct Asn1Writer {
    buf: Vec<u8>,
    capacity: usize,
    null: bool,
    stack: Vec<Frame>,
}

impl Asn1Writer {
    /// A real writer; output beyond `capacity` bytes is rejected with
    /// [`Error::BufferTooSmall`].
    pub fn with_capacity(capacity: usize) -> Self {
        Asn1Writer {
            buf: Vec::new(),
            capacity,
            null: false,
            stack: Vec::new(),
        }
    }

    /// A discarding writer: every `put`/`begin`/`end` succeeds and writes
    /// nothing. Container balance is still tracked.
    pub fn null() -> Self {
        Asn1Writer {
            buf: Vec::new(),
            capacity: 0,
            null: true,
            stack: Vec::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.null
    }

    /// Bytes committed so far. Headers of still-open containers are not yet
    /// counted.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_boolean(&mut self, value: bool) -> Result<(), Error> {
        self.put_element(TAG_BOOLEAN, &[if value { 0xff } else { 0x00 }])
    }

    pub fn put_integer(&mut self, value: i64) -> Result<(), Error> {
        let body = BigInt::from(value).to_signed_bytes_be();
        self.put_element(TAG_INTEGER, &body)
    }

    /// INTEGER with a caller-supplied content encoding, written verbatim.
    pub fn put_raw_integer(&mut self, body: &[u8]) -> Result<(), Error> {
        self.put_element(TAG_INTEGER, body)
    }

    pub fn put_bit_string(&mut self, unused: u8, data: &[u8]) -> Result<(), Error> {
        let mut content = Vec::with_capacity(data.len() + 1);
        content.push(unused);
        content.extend_from_slice(data);
        self.put_element(TAG_BIT_STRING, &content)
    }

    /// BIT STRING from a named-bit flag word: flag bit 0 becomes the most
    /// significant bit of the first content octet, trailing zero bits are
    /// dropped per DER.
    pub fn put_named_bits(&mut self, bits: u16) -> Result<(), Error> {
        if bits == 0 {
            return self.put_element(TAG_BIT_STRING, &[0x00]);
        }
        let highest = 15 - bits.leading_zeros() as usize;
        let nbytes = highest / 8 + 1;
        let mut content = vec![0u8; nbytes + 1];
        content[0] = (nbytes * 8 - (highest + 1)) as u8;
        for i in 0..=highest {
            if bits & (1 << i) != 0 {
                content[1 + i / 8] |= 0x80 >> (i % 8);
            }
        }
        self.put_element(TAG_BIT_STRING, &content)
    }

    pub fn put_octet_string(&mut self, data: &[u8]) -> Result<(), Error> {
        self.put_element(TAG_OCTET_STRING, data)
    }

    /// IMPLICIT `[slot]` primitive holding raw octets.
    pub fn put_context_octets(&mut self, slot: u8, data: &[u8]) -> Result<(), Error> {
        self.put_element(TAG_CONTEXT_PRIMITIVE | slot, data)
    }

    /// OBJECT IDENTIFIER from its dotted-decimal form.
    pub fn put_object_id(&mut self, oid: &str) -> Result<(), Error> {
        let oid: ObjectIdentifier = oid.parse()?;
        let body = Vec::<u8>::try_from(oid)?;
        self.put_element(TAG_OBJECT_IDENTIFIER, &body)
    }

    pub fn put_utf8_string(&mut self, s: &str) -> Result<(), Error> {
        self.put_element(TAG_UTF8_STRING, s.as_bytes())
    }

    pub fn put_printable_string(&mut self, s: &str) -> Result<(), Error> {
        self.put_element(TAG_PRINTABLE_STRING, s.as_bytes())
    }

    pub fn put_ia5_string(&mut self, s: &str) -> Result<(), Error> {
        self.put_element(TAG_IA5_STRING, s.as_bytes())
    }

    /// UTCTime for years 1950-2049, GeneralizedTime otherwise.
    pub fn put_time(&mut self, time: NaiveDateTime) -> Result<(), Error> {
        if (1950..=2049).contains(&time.year()) {
            let s = time.format("%y%m%d%H%M%SZ").to_string();
            self.put_element(TAG_UTC_TIME, s.as_bytes())
        } else {
            let s = time.format("%Y%m%d%H%M%SZ").to_string();
            self.put_element(TAG_GENERALIZED_TIME, s.as_bytes())
        }
    }

    /// A complete pre-encoded DER element, copied through verbatim.
    pub fn put_der(&mut self, element: &[u8]) -> Result<(), Error> {
        self.commit(element)
    }

    pub fn begin_sequence(&mut self) -> Result<(), Error> {
        self.begin(TAG_SEQUENCE, FrameKind::Constructed)
    }

    pub fn begin_set(&mut self) -> Result<(), Error> {
        self.begin(TAG_SET, FrameKind::Constructed)
    }

    /// EXPLICIT `[slot]` constructed container.
    pub fn begin_context(&mut self, slot: u8) -> Result<(), Error> {
        self.begin(TAG_CONTEXT_CONSTRUCTED | slot, FrameKind::Constructed)
    }

    /// OCTET STRING encapsulating the elements written until `end`.
    pub fn begin_octet_string(&mut self) -> Result<(), Error> {
        self.begin(TAG_OCTET_STRING, FrameKind::OctetString)
    }

    /// BIT STRING encapsulating the elements written until `end`; the
    /// unused-bits octet is zero.
    pub fn begin_bit_string(&mut self) -> Result<(), Error> {
        self.begin(TAG_BIT_STRING, FrameKind::BitString)
    }

    /// Closes the innermost open container and writes its header.
    pub fn end(&mut self) -> Result<(), Error> {
        let frame = self.stack.pop().ok_or(Error::NoOpenContainer)?;
        if self.null {
            return Ok(());
        }
        if frame.kind == FrameKind::BitString {
            self.grow_check(1)?;
            self.buf.insert(frame.start, 0x00);
        }
        let content_len = self.buf.len() - frame.start;
        let mut header = Vec::with_capacity(5);
        header.push(frame.tag);
        encode_length(&mut header, content_len)?;
        self.grow_check(header.len())?;
        self.buf.splice(frame.start..frame.start, header);
        Ok(())
    }

    /// Marks the current output position.
    pub fn mark(&self) -> Mark {
        Mark(self.buf.len())
    }

    /// The bytes written since `mark`. The range is only meaningful while
    /// every container that was open at the mark is still open; containers
    /// closed since then have their headers in place.
    pub fn bytes_since(&self, mark: &Mark) -> Result<&[u8], Error> {
        if self.null {
            return Err(Error::NullWriter);
        }
        if mark.0 > self.buf.len() {
            return Err(Error::InvalidMark);
        }
        Ok(&self.buf[mark.0..])
    }

    /// Consumes the writer and returns the encoded output.
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        if self.null {
            return Err(Error::NullWriter);
        }
        if !self.stack.is_empty() {
            return Err(Error::UnbalancedContainer);
        }
        Ok(self.buf)
    }

    fn begin(&mut self, tag: u8, kind: FrameKind) -> Result<(), Error> {
        self.stack.push(Frame {
            tag,
            start: self.buf.len(),
            kind,
        });
        Ok(())
    }

    fn put_element(&mut self, tag: u8, content: &[u8]) -> Result<(), Error> {
        if self.null {
            return Ok(());
        }
        let mut element = Vec::with_capacity(content.len() + 5);
        element.push(tag);
        encode_length(&mut element, content.len())?;
        element.extend_from_slice(content);
        self.commit(&element)
    }

    fn commit(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if self.null {
            return Ok(());
        }
        self.grow_check(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn grow_check(&self, extra: usize) -> Result<(), Error> {
        if self.buf.len() + extra > self.capacity {
            return Err(Error::BufferTooSmall {
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

fn encode_length(out: &mut Vec<u8>, len: usize) -> Result<(), Error> {
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.push(0x81);
        out.push(len as u8);
    } else if len <= 0xffff {
        out.push(0x82);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else if len <= 0xff_ffff {
        out.push(0x83);
        out.extend_from_slice(&(len as u32).to_be_bytes()[1..]);
    } else if len <= 0xffff_ffff {
        out.push(0x84);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    } else {
        return Err(Error::LengthTooLarge(len));
    }
    Ok(())
}
