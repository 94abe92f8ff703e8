//! Structured certificate record and its flag types.

use serde::Serialize;

use crate::dn::DistinguishedName;

/// Certificate-epoch sentinel meaning "never expires" when used as the
/// not-after time.
pub const NULL_CERT_TIME: u32 = 0;

/// Structured output of a certificate decode.
///
/// Default-initialized to an all-empty state and populated by exactly one
/// decode pass. Key, serial and signature bytes are owned copies; the record
/// keeps no references into the source buffer.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateRecord {
    pub serial_number: Vec<u8>,
    pub sig_algo_oid: &'static str,
    pub issuer: DistinguishedName,
    pub not_before: u32,
    pub not_after: u32,
    pub subject: DistinguishedName,
    pub pub_key_algo_oid: &'static str,
    pub pub_key_curve_oid: &'static str,
    pub public_key: Vec<u8>,
    pub authority_key_id: Vec<u8>,
    pub subject_key_id: Vec<u8>,
    pub key_usage: KeyUsageFlags,
    pub is_ca: bool,
    pub path_len_constraint: Option<u8>,
    pub key_purposes: KeyPurposeFlags,
    pub signature: Vec<u8>,
    pub tbs_hash: Option<[u8; 32]>,
    pub flags: CertFlags,
}

/// The nine recognized key-usage purposes. Any other bit fails decoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeyUsageFlags(u16);

impl KeyUsageFlags {
    pub const DIGITAL_SIGNATURE: Self = Self(0x0001);
    pub const NON_REPUDIATION: Self = Self(0x0002);
    pub const KEY_ENCIPHERMENT: Self = Self(0x0004);
    pub const DATA_ENCIPHERMENT: Self = Self(0x0008);
    pub const KEY_AGREEMENT: Self = Self(0x0010);
    pub const KEY_CERT_SIGN: Self = Self(0x0020);
    pub const CRL_SIGN: Self = Self(0x0040);
    pub const ENCIPHER_ONLY: Self = Self(0x0080);
    pub const DECIPHER_ONLY: Self = Self(0x0100);

    /// Mask of every recognized bit.
    pub const MASK: u16 = 0x01ff;

    /// Accepts only bit patterns within [`KeyUsageFlags::MASK`].
    pub fn from_bits(bits: u16) -> Option<Self> {
        (bits & !Self::MASK == 0).then_some(Self(bits))
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn has(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }
}

/// Extended-key-usage purposes, one bit per purpose id.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeyPurposeFlags(u8);

impl KeyPurposeFlags {
    pub const SERVER_AUTH: Self = Self(0x01);
    pub const CLIENT_AUTH: Self = Self(0x02);
    pub const CODE_SIGNING: Self = Self(0x04);
    pub const EMAIL_PROTECTION: Self = Self(0x08);
    pub const TIME_STAMPING: Self = Self(0x10);
    pub const OCSP_SIGNING: Self = Self(0x20);

    // purpose ids are validated against the key-purpose table before this
    pub(crate) fn set_purpose(&mut self, purpose_id: u8) {
        self.0 |= 1 << (purpose_id - 1);
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn has(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }
}

/// Presence and status flags accumulated during a decode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CertFlags(u16);

impl CertFlags {
    pub const EXT_BASIC_CONSTRAINTS: Self = Self(0x0001);
    pub const EXT_KEY_USAGE: Self = Self(0x0002);
    pub const EXT_EXTENDED_KEY_USAGE: Self = Self(0x0004);
    pub const EXT_SUBJECT_KEY_ID: Self = Self(0x0008);
    pub const EXT_AUTHORITY_KEY_ID: Self = Self(0x0010);
    pub const FUTURE_EXT_CRITICAL: Self = Self(0x0020);
    pub const TBS_HASH_PRESENT: Self = Self(0x0040);
    pub const TRUST_ANCHOR: Self = Self(0x0080);

    pub fn set(&mut self, flag: Self) {
        self.0 |= flag.0;
    }

    pub fn has(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }
}

/// Options for the decode entry points.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecodeOptions {
    /// Hash the to-be-signed region and store the digest in the record.
    pub generate_tbs_hash: bool,
    /// Mark the record as an implicitly trusted anchor, independent of any
    /// certificate content.
    pub trust_anchor: bool,
}
