//! Hashing and signature-format primitives.

use num_bigint::{BigInt, Sign};
use sha2::{Digest, Sha256};

use asn1::Asn1Writer;

use crate::error::Error;

/// Uncompressed P-256 point: the 0x04 form byte plus two 32-byte
/// coordinates.
pub const P256_PUBLIC_KEY_LEN: usize = 65;

/// Raw ECDSA P-256 signature: 32-byte r followed by 32-byte s.
pub const P256_SIGNATURE_LEN: usize = 64;

pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Rewrites a raw r||s signature as the DER `ECDSA-Sig-Value`
/// `SEQUENCE { r INTEGER, s INTEGER }`.
pub(crate) fn ecdsa_signature_raw_to_der(
    raw: &[u8],
    writer: &mut Asn1Writer,
) -> Result<(), Error> {
    if raw.len() != P256_SIGNATURE_LEN {
        return Err(Error::InvalidSignatureLength(raw.len()));
    }
    let (r, s) = raw.split_at(P256_SIGNATURE_LEN / 2);
    writer.begin_sequence()?;
    put_unsigned_integer(writer, r)?;
    put_unsigned_integer(writer, s)?;
    writer.end()?;
    Ok(())
}

// Minimal signed-magnitude INTEGER body for an unsigned big-endian value.
fn put_unsigned_integer(writer: &mut Asn1Writer, bytes: &[u8]) -> Result<(), Error> {
    let body = BigInt::from_bytes_be(Sign::Plus, bytes).to_signed_bytes_be();
    writer.put_raw_integer(&body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use asn1::Asn1Writer;

    use crate::crypto::{ecdsa_signature_raw_to_der, sha256};
    use crate::error::Error;

    #[test]
    fn test_sha256() {
        // SHA-256 of the empty input
        assert_eq!(
            [
                0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99,
                0x6f, 0xb9, 0x24, 0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95,
                0x99, 0x1b, 0x78, 0x52, 0xb8, 0x55,
            ],
            sha256(&[])
        );
    }

    #[test]
    fn test_signature_raw_to_der() {
        // r has the high bit set and gains a leading zero octet, s is the
        // value 1 and shrinks to a single octet
        let mut raw = vec![0x80];
        raw.extend_from_slice(&[0x00; 31]);
        raw.extend_from_slice(&[0x00; 31]);
        raw.push(0x01);

        let mut writer = Asn1Writer::with_capacity(128);
        ecdsa_signature_raw_to_der(&raw, &mut writer).unwrap();
        let out = writer.finish().unwrap();

        let mut expected = vec![0x30, 0x26, 0x02, 0x21, 0x00, 0x80];
        expected.extend_from_slice(&[0x00; 31]);
        expected.extend_from_slice(&[0x02, 0x01, 0x01]);
        assert_eq!(expected, out);
    }

    #[test]
    fn test_signature_length_checked() {
        let mut writer = Asn1Writer::with_capacity(128);
        assert_eq!(
            Err(Error::InvalidSignatureLength(63)),
            ecdsa_signature_raw_to_der(&[0u8; 63], &mut writer)
        );
    }

    #[test]
    fn test_conversion_skipped_content_on_null_writer() {
        // the null writer accepts the conversion without producing output
        let mut writer = Asn1Writer::null();
        ecdsa_signature_raw_to_der(&[0x11; 64], &mut writer).unwrap();
        assert_eq!(0, writer.len());
    }
}
