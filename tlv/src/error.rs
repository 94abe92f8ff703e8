use thiserror::Error;

use crate::Tag;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of data")]
    UnexpectedEndOfData,
    #[error("end-of-container marker outside any container")]
    UnexpectedEndOfContainer,
    #[error("unsupported tag control 0x{0:02x}")]
    UnsupportedTagControl(u8),
    #[error("unsupported element type 0x{0:02x}")]
    UnsupportedElementType(u8),
    #[error("no current element")]
    NoElement,
    #[error("expected {expected}, found {found}")]
    UnexpectedTag { expected: Tag, found: Tag },
    #[error("unexpected element type: expected {expected}")]
    UnexpectedValueType { expected: &'static str },
    #[error("integer value out of range for {0}")]
    IntegerOutOfRange(&'static str),
    #[error("invalid UTF-8 in string element")]
    InvalidUtf8,
    #[error("not positioned on a container")]
    NotAContainer,
    #[error("not inside a container")]
    NotInContainer,
    #[error("trailing elements in container")]
    TrailingElements,
}
