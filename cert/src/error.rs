use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("malformed certificate encoding: {0}")]
    Tlv(#[from] tlv::Error),
    #[error("DER encoding failed: {0}")]
    Asn1(#[from] asn1::Error),
    #[error("unsupported signature algorithm id {0}")]
    UnsupportedSignatureAlgorithm(u8),
    #[error("unsupported public key algorithm id {0}")]
    UnsupportedPublicKeyAlgorithm(u8),
    #[error("unsupported elliptic curve id {0}")]
    UnsupportedEllipticCurve(u8),
    #[error("unsupported key usage bits 0x{0:04x}")]
    UnsupportedKeyUsage(u16),
    #[error("unsupported key purpose id {0}")]
    UnsupportedKeyPurpose(u8),
    #[error("unsupported extension tag {0}")]
    UnsupportedExtension(u8),
    #[error("extension entry must carry a context tag")]
    UntaggedExtension,
    #[error("unsupported DN attribute tag {0}")]
    UnsupportedDnAttribute(u8),
    #[error("DN attribute must carry a context tag")]
    UntaggedDnAttribute,
    #[error("not-before time {not_before} is not earlier than not-after time {not_after}")]
    InvalidValidity { not_before: u32, not_after: u32 },
    #[error("path length constraint present on a non-CA certificate")]
    PathLenWithoutCa,
    #[error("invalid public key length {0}")]
    InvalidPublicKeyLength(usize),
    #[error("invalid signature length {0}")]
    InvalidSignatureLength(usize),
    #[error("malformed future extension")]
    MalformedFutureExtension,
    #[error("future extension carries the recognized extension id {0}")]
    RecognizedFutureExtension(String),
    #[error("TBS hash requires the ECDSA-with-SHA256 signature algorithm")]
    UnsupportedTbsHashAlgorithm,
    #[error("internal error: {0}")]
    Internal(&'static str),
}
