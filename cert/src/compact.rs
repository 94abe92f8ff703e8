//! Compact network-identity certificate profile.
//!
//! A network identity carries only the subject public key on the wire; every
//! other field is a fixed template value shared by all identities of this
//! class. The encoder reproduces the template exactly, so the TBS bytes are
//! stable for signature hashing no matter which peer produced them.

use asn1::Asn1Writer;
use tlv::{Tag, TlvReader};

use crate::crypto::P256_PUBLIC_KEY_LEN;
use crate::dn::DistinguishedName;
use crate::error::Error;
use crate::oid;
use crate::record::{CertFlags, CertificateRecord, KeyPurposeFlags, KeyUsageFlags, NULL_CERT_TIME};
use crate::time;
use crate::transcode::{TAG_EC_PUBLIC_KEY, X509_VERSION_V3};

const NETWORK_IDENTITY_SERIAL_NUMBER: &[u8] = &[0x01];
const NETWORK_IDENTITY_NOT_BEFORE: u32 = 1;
const NETWORK_IDENTITY_NOT_AFTER: u32 = NULL_CERT_TIME;
const NETWORK_IDENTITY_COMMON_NAME: &str = "*";
const NETWORK_IDENTITY_KEY_USAGE: KeyUsageFlags = KeyUsageFlags::DIGITAL_SIGNATURE;
const NETWORK_IDENTITY_KEY_PURPOSES: KeyPurposeFlags =
    KeyPurposeFlags::CLIENT_AUTH.union(KeyPurposeFlags::SERVER_AUTH);

fn network_identity_name() -> DistinguishedName {
    DistinguishedName::common_name(NETWORK_IDENTITY_COMMON_NAME)
}

/// Reads the one variable field (the public key) and fills the rest of the
/// record from the template. The reader is positioned on the public-key
/// element.
pub(crate) fn decode_convert_compact_identity_tbs(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    reader.expect(Tag::Context(TAG_EC_PUBLIC_KEY))?;
    let public_key = reader.get_bytes()?;
    if public_key.len() != P256_PUBLIC_KEY_LEN {
        return Err(Error::InvalidPublicKeyLength(public_key.len()));
    }
    record.public_key = public_key.to_vec();

    record.serial_number = NETWORK_IDENTITY_SERIAL_NUMBER.to_vec();
    record.sig_algo_oid = oid::SIG_ALGO_ECDSA_WITH_SHA256;
    record.issuer = network_identity_name();
    record.not_before = NETWORK_IDENTITY_NOT_BEFORE;
    record.not_after = NETWORK_IDENTITY_NOT_AFTER;
    record.subject = network_identity_name();
    record.pub_key_algo_oid = oid::PUB_KEY_ALGO_EC_PUBLIC_KEY;
    record.pub_key_curve_oid = oid::ELLIPTIC_CURVE_PRIME256V1;
    record.flags.set(CertFlags::EXT_BASIC_CONSTRAINTS);
    record.flags.set(CertFlags::EXT_KEY_USAGE);
    record.key_usage = NETWORK_IDENTITY_KEY_USAGE;
    record.flags.set(CertFlags::EXT_EXTENDED_KEY_USAGE);
    record.key_purposes = NETWORK_IDENTITY_KEY_PURPOSES;

    if !writer.is_null() {
        encode_network_identity_tbs(&record.public_key, &record.issuer, writer)?;
    }
    Ok(())
}

// Emits the complete well-known TBSCertificate for a network identity: the
// template constants plus the supplied key.
fn encode_network_identity_tbs(
    public_key: &[u8],
    name: &DistinguishedName,
    writer: &mut Asn1Writer,
) -> Result<(), Error> {
    writer.begin_sequence()?;

    writer.begin_context(0)?;
    writer.put_integer(X509_VERSION_V3)?;
    writer.end()?;

    writer.put_raw_integer(NETWORK_IDENTITY_SERIAL_NUMBER)?;

    writer.begin_sequence()?;
    writer.put_object_id(oid::SIG_ALGO_ECDSA_WITH_SHA256)?;
    writer.end()?;

    name.encode_der(writer)?;

    writer.begin_sequence()?;
    writer.put_time(time::validity_time(NETWORK_IDENTITY_NOT_BEFORE)?)?;
    writer.put_time(time::validity_time(NETWORK_IDENTITY_NOT_AFTER)?)?;
    writer.end()?;

    name.encode_der(writer)?;

    writer.begin_sequence()?;
    writer.begin_sequence()?;
    writer.put_object_id(oid::PUB_KEY_ALGO_EC_PUBLIC_KEY)?;
    writer.put_object_id(oid::ELLIPTIC_CURVE_PRIME256V1)?;
    writer.end()?;
    writer.put_bit_string(0, public_key)?;
    writer.end()?;

    writer.begin_context(3)?;
    writer.begin_sequence()?;

    // basicConstraints: critical, not a CA, no path length
    writer.begin_sequence()?;
    writer.put_object_id(oid::EXT_BASIC_CONSTRAINTS)?;
    writer.put_boolean(true)?;
    writer.begin_octet_string()?;
    writer.begin_sequence()?;
    writer.end()?;
    writer.end()?;
    writer.end()?;

    // keyUsage: critical, digitalSignature
    writer.begin_sequence()?;
    writer.put_object_id(oid::EXT_KEY_USAGE)?;
    writer.put_boolean(true)?;
    writer.begin_octet_string()?;
    writer.put_named_bits(NETWORK_IDENTITY_KEY_USAGE.bits())?;
    writer.end()?;
    writer.end()?;

    // extendedKeyUsage: critical, clientAuth then serverAuth
    writer.begin_sequence()?;
    writer.put_object_id(oid::EXT_EXTENDED_KEY_USAGE)?;
    writer.put_boolean(true)?;
    writer.begin_octet_string()?;
    writer.begin_sequence()?;
    writer.put_object_id(oid::KEY_PURPOSE_CLIENT_AUTH)?;
    writer.put_object_id(oid::KEY_PURPOSE_SERVER_AUTH)?;
    writer.end()?;
    writer.end()?;
    writer.end()?;

    writer.end()?;
    writer.end()?;

    writer.end()?;
    Ok(())
}
