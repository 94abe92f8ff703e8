//! Device certificate decoding and X.509 DER conversion.
//!
//! Certificates arrive in a compact TLV encoding and are transcoded in a
//! single pass: decoded into a [`CertificateRecord`], validated against the
//! supported profile (one signature algorithm, one curve, a fixed extension
//! set) and, on the convert path, re-encoded as a standard X.509 DER
//! certificate. A compact "network identity" variant carrying only a public
//! key expands to a fixed well-known template.

pub mod dn;
pub mod error;
pub mod oid;
pub mod record;

mod compact;
mod crypto;
mod time;
mod transcode;

pub use crypto::{P256_PUBLIC_KEY_LEN, P256_SIGNATURE_LEN};
pub use dn::{AttributeValue, DistinguishedName, DnAttribute};
pub use error::Error;
pub use record::{
    CertFlags, CertificateRecord, DecodeOptions, KeyPurposeFlags, KeyUsageFlags, NULL_CERT_TIME,
};

use asn1::Asn1Writer;
use tlv::TlvReader;

/// Hard upper bound on the DER encoding of a certificate this profile
/// supports; it also sizes the TBS scratch buffer for hashing.
pub const MAX_DER_CERT_LEN: usize = 600;

/// Converts a TLV certificate to its X.509 DER form.
///
/// Fails if the result would exceed [`MAX_DER_CERT_LEN`] bytes. On any
/// failure the output is discarded; no partial encoding is returned.
pub fn convert_cert_to_der(cert: &[u8]) -> Result<Vec<u8>, Error> {
    let mut reader = TlvReader::new(cert);
    let mut writer = Asn1Writer::with_capacity(MAX_DER_CERT_LEN);
    let mut record = CertificateRecord::default();
    transcode::transcode_certificate(&mut reader, &mut writer, &mut record, false)?;
    reader.expect_end()?;
    Ok(writer.finish()?)
}

/// Decodes a TLV certificate into a structured record.
///
/// With [`DecodeOptions::generate_tbs_hash`] set, the to-be-signed region is
/// re-encoded into a bounded scratch buffer and its SHA-256 digest stored in
/// the record; this requires the ECDSA-with-SHA256 signature algorithm.
/// [`DecodeOptions::trust_anchor`] marks the record as an implicitly trusted
/// anchor, independent of any certificate content.
pub fn decode_cert(cert: &[u8], options: DecodeOptions) -> Result<CertificateRecord, Error> {
    let mut reader = TlvReader::new(cert);
    let mut writer = if options.generate_tbs_hash {
        Asn1Writer::with_capacity(MAX_DER_CERT_LEN)
    } else {
        Asn1Writer::null()
    };
    let mut record = CertificateRecord::default();
    transcode::transcode_certificate(
        &mut reader,
        &mut writer,
        &mut record,
        options.generate_tbs_hash,
    )?;
    reader.expect_end()?;
    if options.trust_anchor {
        record.flags.set(CertFlags::TRUST_ANCHOR);
    }
    Ok(record)
}

/// Decodes a standalone Distinguished Name.
///
/// The reader must be positioned on (or immediately before) a TLV list
/// element holding the name.
pub fn decode_dn(reader: &mut TlvReader<'_>) -> Result<DistinguishedName, Error> {
    if !reader.has_element() && !reader.next()? {
        return Err(tlv::Error::UnexpectedEndOfData.into());
    }
    DistinguishedName::decode_tlv(reader)
}
