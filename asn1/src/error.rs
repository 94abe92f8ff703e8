use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("output buffer too small (capacity {capacity} bytes)")]
    BufferTooSmall { capacity: usize },
    #[error("element length {0} exceeds the supported DER length encoding")]
    LengthTooLarge(usize),
    #[error("no container is open")]
    NoOpenContainer,
    #[error("container left open at end of encoding")]
    UnbalancedContainer,
    #[error("null writer holds no output")]
    NullWriter,
    #[error("mark does not lie within the written output")]
    InvalidMark,
    #[error("truncated DER element")]
    TruncatedElement,
    #[error("invalid DER length encoding")]
    InvalidLength,
    #[error("OBJECT IDENTIFIER: empty encoding")]
    OidEmpty,
    #[error("OBJECT IDENTIFIER: incomplete arc encoding")]
    OidIncompleteEncoding,
    #[error("OBJECT IDENTIFIER: too few components (need at least 2)")]
    OidTooFewComponents,
    #[error("OBJECT IDENTIFIER: invalid component")]
    OidInvalidComponent(#[source] ParseIntError),
}
