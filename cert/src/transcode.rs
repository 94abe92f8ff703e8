//! One-pass certificate decode/validate/convert pipeline.
//!
//! The transcoder walks the TLV source in fixed schema order, validates each
//! field, fills in the [`CertificateRecord`] and emits the equivalent X.509
//! DER through the writer. With a null writer the same walk performs a plain
//! decode. A byte-range mark taken just inside the output Certificate
//! SEQUENCE delimits the to-be-signed region for hashing.

use asn1::{Asn1Writer, DerReader, ObjectIdentifier};
use tlv::{ContainerType, Tag, TlvReader};

use crate::compact;
use crate::crypto::{self, P256_PUBLIC_KEY_LEN, P256_SIGNATURE_LEN};
use crate::dn::DistinguishedName;
use crate::error::Error;
use crate::oid;
use crate::record::{CertFlags, CertificateRecord, KeyUsageFlags, NULL_CERT_TIME};
use crate::time;

pub(crate) const TAG_SERIAL_NUMBER: u8 = 1;
pub(crate) const TAG_SIGNATURE_ALGORITHM: u8 = 2;
pub(crate) const TAG_ISSUER: u8 = 3;
pub(crate) const TAG_NOT_BEFORE: u8 = 4;
pub(crate) const TAG_NOT_AFTER: u8 = 5;
pub(crate) const TAG_SUBJECT: u8 = 6;
pub(crate) const TAG_PUBLIC_KEY_ALGORITHM: u8 = 7;
pub(crate) const TAG_ELLIPTIC_CURVE_ID: u8 = 8;
pub(crate) const TAG_EC_PUBLIC_KEY: u8 = 9;
pub(crate) const TAG_EXTENSIONS: u8 = 10;
pub(crate) const TAG_ECDSA_SIGNATURE: u8 = 11;

const TAG_EXT_BASIC_CONSTRAINTS: u8 = 1;
const TAG_EXT_KEY_USAGE: u8 = 2;
const TAG_EXT_EXTENDED_KEY_USAGE: u8 = 3;
const TAG_EXT_SUBJECT_KEY_ID: u8 = 4;
const TAG_EXT_AUTHORITY_KEY_ID: u8 = 5;
const TAG_EXT_FUTURE: u8 = 6;

const TAG_BASIC_CONSTRAINTS_IS_CA: u8 = 1;
const TAG_BASIC_CONSTRAINTS_PATH_LEN: u8 = 2;

pub(crate) const X509_VERSION_V3: i64 = 2;

const DER_TAG_BOOLEAN: u8 = 0x01;
const DER_TAG_OBJECT_IDENTIFIER: u8 = 0x06;
const DER_TAG_SEQUENCE: u8 = 0x30;

/// Drives the whole top-level schema: TBS body (full walk or compact
/// identity), repeated signature-algorithm identifier, signature value.
pub(crate) fn transcode_certificate(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
    generate_tbs_hash: bool,
) -> Result<(), Error> {
    if !reader.has_element() && !reader.next()? {
        return Err(tlv::Error::UnexpectedEndOfData.into());
    }
    reader.expect(Tag::Anonymous)?;
    reader.enter(ContainerType::Structure)?;

    // Certificate ::= SEQUENCE
    writer.begin_sequence()?;
    let tbs_mark = writer.mark();

    if !reader.next()? {
        return Err(tlv::Error::UnexpectedEndOfData.into());
    }
    if reader.tag()? == Tag::Context(TAG_EC_PUBLIC_KEY) {
        // A record starting at the public key is a network identity in the
        // compact form.
        compact::decode_convert_compact_identity_tbs(reader, writer, record)?;
    } else {
        decode_convert_tbs(reader, writer, record)?;
    }

    if generate_tbs_hash {
        if record.sig_algo_oid != oid::SIG_ALGO_ECDSA_WITH_SHA256 {
            return Err(Error::UnsupportedTbsHashAlgorithm);
        }
        record.tbs_hash = Some(crypto::sha256(writer.bytes_since(&tbs_mark)?));
        record.flags.set(CertFlags::TBS_HASH_PRESENT);
    }

    // signatureAlgorithm AlgorithmIdentifier, repeated from the TBS portion
    // to mirror the destination schema
    writer.begin_sequence()?;
    writer.put_object_id(record.sig_algo_oid)?;
    writer.end()?;

    decode_convert_signature(reader, writer, record)?;
    writer.end()?;

    reader.expect_end()?;
    reader.exit_container()?;
    Ok(())
}

// Full schema walk. The reader is positioned on the serial-number element.
fn decode_convert_tbs(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    // TBSCertificate ::= SEQUENCE
    writer.begin_sequence()?;

    // version [0] EXPLICIT INTEGER; the source format has exactly one
    // version and carries no version field
    writer.begin_context(0)?;
    writer.put_integer(X509_VERSION_V3)?;
    writer.end()?;

    // serialNumber INTEGER, content copied verbatim
    reader.expect(Tag::Context(TAG_SERIAL_NUMBER))?;
    record.serial_number = reader.get_bytes()?.to_vec();
    writer.put_raw_integer(&record.serial_number)?;

    // signature AlgorithmIdentifier ::= SEQUENCE
    writer.begin_sequence()?;
    reader.next_expect(Tag::Context(TAG_SIGNATURE_ALGORITHM))?;
    let sig_algo_id = reader.get_u8()?;
    record.sig_algo_oid = oid::signature_algorithm(sig_algo_id)
        .ok_or(Error::UnsupportedSignatureAlgorithm(sig_algo_id))?;
    writer.put_object_id(record.sig_algo_oid)?;
    writer.end()?;

    // issuer Name
    reader.next_expect(Tag::Context(TAG_ISSUER))?;
    record.issuer = DistinguishedName::decode_tlv(reader)?;
    record.issuer.encode_der(writer)?;

    decode_convert_validity(reader, writer, record)?;

    // subject Name
    reader.next_expect(Tag::Context(TAG_SUBJECT))?;
    record.subject = DistinguishedName::decode_tlv(reader)?;
    record.subject.encode_der(writer)?;

    decode_convert_subject_public_key_info(reader, writer, record)?;
    decode_convert_extensions(reader, writer, record)?;

    writer.end()?;
    Ok(())
}

fn decode_convert_validity(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    // Validity ::= SEQUENCE { notBefore Time, notAfter Time }
    writer.begin_sequence()?;

    reader.next_expect(Tag::Context(TAG_NOT_BEFORE))?;
    record.not_before = reader.get_u32()?;
    writer.put_time(time::validity_time(record.not_before)?)?;

    reader.next_expect(Tag::Context(TAG_NOT_AFTER))?;
    record.not_after = reader.get_u32()?;
    writer.put_time(time::validity_time(record.not_after)?)?;

    // ordering is not meaningful against the never-expires sentinel
    if record.not_after != NULL_CERT_TIME && record.not_before >= record.not_after {
        return Err(Error::InvalidValidity {
            not_before: record.not_before,
            not_after: record.not_after,
        });
    }

    writer.end()?;
    Ok(())
}

fn decode_convert_subject_public_key_info(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    reader.next_expect(Tag::Context(TAG_PUBLIC_KEY_ALGORITHM))?;
    let algo_id = reader.get_u8()?;
    record.pub_key_algo_oid = oid::public_key_algorithm(algo_id)
        .ok_or(Error::UnsupportedPublicKeyAlgorithm(algo_id))?;
    if record.pub_key_algo_oid != oid::PUB_KEY_ALGO_EC_PUBLIC_KEY {
        return Err(Error::UnsupportedPublicKeyAlgorithm(algo_id));
    }

    reader.next_expect(Tag::Context(TAG_ELLIPTIC_CURVE_ID))?;
    let curve_id = reader.get_u8()?;
    record.pub_key_curve_oid =
        oid::elliptic_curve(curve_id).ok_or(Error::UnsupportedEllipticCurve(curve_id))?;
    if record.pub_key_curve_oid != oid::ELLIPTIC_CURVE_PRIME256V1 {
        return Err(Error::UnsupportedEllipticCurve(curve_id));
    }

    // SubjectPublicKeyInfo ::= SEQUENCE
    writer.begin_sequence()?;

    // AlgorithmIdentifier ::= SEQUENCE { algorithm OID, namedCurve OID }
    writer.begin_sequence()?;
    writer.put_object_id(record.pub_key_algo_oid)?;
    writer.put_object_id(record.pub_key_curve_oid)?;
    writer.end()?;

    reader.next_expect(Tag::Context(TAG_EC_PUBLIC_KEY))?;
    let public_key = reader.get_bytes()?;
    if public_key.len() != P256_PUBLIC_KEY_LEN {
        return Err(Error::InvalidPublicKeyLength(public_key.len()));
    }
    record.public_key = public_key.to_vec();
    // the X9.62 point goes into the subjectPublicKey BIT STRING as-is
    writer.put_bit_string(0, &record.public_key)?;

    writer.end()?;
    Ok(())
}

fn decode_convert_extensions(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    reader.next_expect(Tag::Context(TAG_EXTENSIONS))?;
    reader.enter(ContainerType::List)?;

    // extensions [3] EXPLICIT SEQUENCE OF Extension
    writer.begin_context(3)?;
    writer.begin_sequence()?;
    while reader.next()? {
        decode_convert_extension(reader, writer, record)?;
    }
    writer.end()?;
    writer.end()?;

    reader.exit_container()?;
    Ok(())
}

type ExtensionBodyFn =
    fn(&mut TlvReader<'_>, &mut Asn1Writer, &mut CertificateRecord) -> Result<(), Error>;

struct ExtensionRule {
    tlv_tag: u8,
    oid: &'static str,
    /// Forced in the destination form regardless of the source bytes.
    critical: bool,
    presence: CertFlags,
    body: ExtensionBodyFn,
}

static EXTENSION_RULES: [ExtensionRule; 5] = [
    ExtensionRule {
        tlv_tag: TAG_EXT_BASIC_CONSTRAINTS,
        oid: oid::EXT_BASIC_CONSTRAINTS,
        critical: true,
        presence: CertFlags::EXT_BASIC_CONSTRAINTS,
        body: basic_constraints_body,
    },
    ExtensionRule {
        tlv_tag: TAG_EXT_KEY_USAGE,
        oid: oid::EXT_KEY_USAGE,
        critical: true,
        presence: CertFlags::EXT_KEY_USAGE,
        body: key_usage_body,
    },
    ExtensionRule {
        tlv_tag: TAG_EXT_EXTENDED_KEY_USAGE,
        oid: oid::EXT_EXTENDED_KEY_USAGE,
        critical: true,
        presence: CertFlags::EXT_EXTENDED_KEY_USAGE,
        body: extended_key_usage_body,
    },
    ExtensionRule {
        tlv_tag: TAG_EXT_SUBJECT_KEY_ID,
        oid: oid::EXT_SUBJECT_KEY_ID,
        critical: false,
        presence: CertFlags::EXT_SUBJECT_KEY_ID,
        body: subject_key_id_body,
    },
    ExtensionRule {
        tlv_tag: TAG_EXT_AUTHORITY_KEY_ID,
        oid: oid::EXT_AUTHORITY_KEY_ID,
        critical: false,
        presence: CertFlags::EXT_AUTHORITY_KEY_ID,
        body: authority_key_id_body,
    },
];

fn decode_convert_extension(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    let ext_tag = match reader.tag()? {
        Tag::Context(n) => n,
        Tag::Anonymous => return Err(Error::UntaggedExtension),
    };
    if ext_tag == TAG_EXT_FUTURE {
        return decode_convert_future_extension(reader, writer, record);
    }
    let rule = EXTENSION_RULES
        .iter()
        .find(|rule| rule.tlv_tag == ext_tag)
        .ok_or(Error::UnsupportedExtension(ext_tag))?;
    record.flags.set(rule.presence);

    // Extension ::= SEQUENCE { extnID OID, critical BOOLEAN, extnValue
    // OCTET STRING }; an omitted critical flag defaults to false
    writer.begin_sequence()?;
    writer.put_object_id(rule.oid)?;
    if rule.critical {
        writer.put_boolean(true)?;
    }
    writer.begin_octet_string()?;
    (rule.body)(reader, writer, record)?;
    writer.end()?;
    writer.end()?;
    Ok(())
}

fn basic_constraints_body(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    reader.enter(ContainerType::Structure)?;

    // BasicConstraints ::= SEQUENCE { cA BOOLEAN DEFAULT FALSE,
    //                                 pathLenConstraint INTEGER OPTIONAL }
    writer.begin_sequence()?;

    reader.next_expect(Tag::Context(TAG_BASIC_CONSTRAINTS_IS_CA))?;
    let is_ca = reader.get_bool()?;
    if is_ca {
        writer.put_boolean(true)?;
        record.is_ca = true;
    }

    if reader.next()? {
        reader.expect(Tag::Context(TAG_BASIC_CONSTRAINTS_PATH_LEN))?;
        if !is_ca {
            return Err(Error::PathLenWithoutCa);
        }
        let path_len = reader.get_u8()?;
        record.path_len_constraint = Some(path_len);
        writer.put_integer(i64::from(path_len))?;
        reader.expect_end()?;
    }

    writer.end()?;
    reader.exit_container()?;
    Ok(())
}

fn key_usage_body(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    let bits = reader.get_u16()?;
    record.key_usage = KeyUsageFlags::from_bits(bits).ok_or(Error::UnsupportedKeyUsage(bits))?;
    // KeyUsage ::= BIT STRING
    writer.put_named_bits(bits)?;
    Ok(())
}

fn extended_key_usage_body(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    reader.enter(ContainerType::Array)?;

    // ExtKeyUsageSyntax ::= SEQUENCE OF KeyPurposeId
    writer.begin_sequence()?;
    while reader.next()? {
        reader.expect(Tag::Anonymous)?;
        let purpose_id = reader.get_u8()?;
        let purpose_oid =
            oid::key_purpose(purpose_id).ok_or(Error::UnsupportedKeyPurpose(purpose_id))?;
        writer.put_object_id(purpose_oid)?;
        record.key_purposes.set_purpose(purpose_id);
    }
    writer.end()?;

    reader.exit_container()?;
    Ok(())
}

fn subject_key_id_body(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    // SubjectKeyIdentifier ::= KeyIdentifier ::= OCTET STRING
    record.subject_key_id = reader.get_bytes()?.to_vec();
    writer.put_octet_string(&record.subject_key_id)?;
    Ok(())
}

fn authority_key_id_body(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    record.authority_key_id = reader.get_bytes()?.to_vec();
    // AuthorityKeyIdentifier ::= SEQUENCE { keyIdentifier [0] IMPLICIT
    // KeyIdentifier }
    writer.begin_sequence()?;
    writer.put_context_octets(0, &record.authority_key_id)?;
    writer.end()?;
    Ok(())
}

// An unrecognized extension arrives as a pre-encoded DER Extension. Its
// wrapper is validated, a critical marking is recorded without failing the
// decode, and the bytes are copied through verbatim.
fn decode_convert_future_extension(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    let extension = reader.get_bytes()?;

    let mut outer = DerReader::new(extension);
    let (tag, content) = outer.read().map_err(|_| Error::MalformedFutureExtension)?;
    if tag != DER_TAG_SEQUENCE || !outer.is_empty() {
        return Err(Error::MalformedFutureExtension);
    }

    let mut fields = DerReader::new(content);
    let (tag, oid_body) = fields.read().map_err(|_| Error::MalformedFutureExtension)?;
    if tag != DER_TAG_OBJECT_IDENTIFIER {
        return Err(Error::MalformedFutureExtension);
    }
    let extension_oid =
        ObjectIdentifier::try_from(oid_body).map_err(|_| Error::MalformedFutureExtension)?;
    if oid::is_known_oid(&extension_oid) {
        return Err(Error::RecognizedFutureExtension(extension_oid.to_string()));
    }

    // critical BOOLEAN DEFAULT FALSE, then the opaque extnValue
    let (tag, flag) = fields.read().map_err(|_| Error::MalformedFutureExtension)?;
    if tag == DER_TAG_BOOLEAN {
        match flag {
            [0xff] => record.flags.set(CertFlags::FUTURE_EXT_CRITICAL),
            [0x00] => {}
            _ => return Err(Error::MalformedFutureExtension),
        }
        fields.read().map_err(|_| Error::MalformedFutureExtension)?;
    }
    if !fields.is_empty() {
        return Err(Error::MalformedFutureExtension);
    }

    writer.put_der(extension)?;
    Ok(())
}

fn decode_convert_signature(
    reader: &mut TlvReader<'_>,
    writer: &mut Asn1Writer,
    record: &mut CertificateRecord,
) -> Result<(), Error> {
    reader.next_expect(Tag::Context(TAG_ECDSA_SIGNATURE))?;
    let signature = reader.get_bytes()?;
    if signature.len() != P256_SIGNATURE_LEN {
        return Err(Error::InvalidSignatureLength(signature.len()));
    }
    record.signature = signature.to_vec();

    // converting the signature is real work, skip it for decode-only passes
    if writer.is_null() {
        return Ok(());
    }

    // signatureValue BIT STRING encapsulating the DER ECDSA-Sig-Value
    writer.begin_bit_string()?;
    crypto::ecdsa_signature_raw_to_der(&record.signature, writer)?;
    writer.end()?;
    Ok(())
}
