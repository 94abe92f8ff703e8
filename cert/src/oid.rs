//! Object-identifier lookup tables, partitioned by category.
//!
//! The wire format names algorithms, curves, key purposes, extensions and DN
//! attribute types by small integer ids; each category maps its ids to the
//! stable dotted OID. The lookups are partial: an id outside a table yields
//! `None`, never a placeholder value.

use asn1::ObjectIdentifier;

pub const SIG_ALGO_ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";

pub const PUB_KEY_ALGO_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";

pub const ELLIPTIC_CURVE_PRIME256V1: &str = "1.2.840.10045.3.1.7";

pub const KEY_PURPOSE_SERVER_AUTH: &str = "1.3.6.1.5.5.7.3.1";
pub const KEY_PURPOSE_CLIENT_AUTH: &str = "1.3.6.1.5.5.7.3.2";
pub const KEY_PURPOSE_CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";
pub const KEY_PURPOSE_EMAIL_PROTECTION: &str = "1.3.6.1.5.5.7.3.4";
pub const KEY_PURPOSE_TIME_STAMPING: &str = "1.3.6.1.5.5.7.3.8";
pub const KEY_PURPOSE_OCSP_SIGNING: &str = "1.3.6.1.5.5.7.3.9";

pub const EXT_BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const EXT_KEY_USAGE: &str = "2.5.29.15";
pub const EXT_EXTENDED_KEY_USAGE: &str = "2.5.29.37";
pub const EXT_SUBJECT_KEY_ID: &str = "2.5.29.14";
pub const EXT_AUTHORITY_KEY_ID: &str = "2.5.29.35";

pub const ATTR_COMMON_NAME: &str = "2.5.4.3";
pub const ATTR_SURNAME: &str = "2.5.4.4";
pub const ATTR_SERIAL_NUMBER: &str = "2.5.4.5";
pub const ATTR_COUNTRY_NAME: &str = "2.5.4.6";
pub const ATTR_LOCALITY_NAME: &str = "2.5.4.7";
pub const ATTR_STATE_OR_PROVINCE_NAME: &str = "2.5.4.8";
pub const ATTR_ORG_NAME: &str = "2.5.4.10";
pub const ATTR_ORG_UNIT_NAME: &str = "2.5.4.11";
pub const ATTR_TITLE: &str = "2.5.4.12";
pub const ATTR_NAME: &str = "2.5.4.41";
pub const ATTR_GIVEN_NAME: &str = "2.5.4.42";
pub const ATTR_INITIALS: &str = "2.5.4.43";
pub const ATTR_GENERATION_QUALIFIER: &str = "2.5.4.44";
pub const ATTR_DN_QUALIFIER: &str = "2.5.4.46";
pub const ATTR_PSEUDONYM: &str = "2.5.4.65";
pub const ATTR_DOMAIN_COMPONENT: &str = "0.9.2342.19200300.100.1.25";
pub const ATTR_NODE_ID: &str = "1.3.6.1.4.1.37244.1.1";
pub const ATTR_FIRMWARE_SIGNING_ID: &str = "1.3.6.1.4.1.37244.1.2";
pub const ATTR_ICA_ID: &str = "1.3.6.1.4.1.37244.1.3";
pub const ATTR_ROOT_CA_ID: &str = "1.3.6.1.4.1.37244.1.4";
pub const ATTR_FABRIC_ID: &str = "1.3.6.1.4.1.37244.1.5";
pub const ATTR_CAT_ID: &str = "1.3.6.1.4.1.37244.1.6";

pub fn signature_algorithm(id: u8) -> Option<&'static str> {
    match id {
        1 => Some(SIG_ALGO_ECDSA_WITH_SHA256),
        _ => None,
    }
}

pub fn public_key_algorithm(id: u8) -> Option<&'static str> {
    match id {
        1 => Some(PUB_KEY_ALGO_EC_PUBLIC_KEY),
        _ => None,
    }
}

pub fn elliptic_curve(id: u8) -> Option<&'static str> {
    match id {
        1 => Some(ELLIPTIC_CURVE_PRIME256V1),
        _ => None,
    }
}

pub fn key_purpose(id: u8) -> Option<&'static str> {
    match id {
        1 => Some(KEY_PURPOSE_SERVER_AUTH),
        2 => Some(KEY_PURPOSE_CLIENT_AUTH),
        3 => Some(KEY_PURPOSE_CODE_SIGNING),
        4 => Some(KEY_PURPOSE_EMAIL_PROTECTION),
        5 => Some(KEY_PURPOSE_TIME_STAMPING),
        6 => Some(KEY_PURPOSE_OCSP_SIGNING),
        _ => None,
    }
}

pub fn extension(id: u8) -> Option<&'static str> {
    match id {
        1 => Some(EXT_BASIC_CONSTRAINTS),
        2 => Some(EXT_KEY_USAGE),
        3 => Some(EXT_EXTENDED_KEY_USAGE),
        4 => Some(EXT_SUBJECT_KEY_ID),
        5 => Some(EXT_AUTHORITY_KEY_ID),
        _ => None,
    }
}

const KNOWN_OIDS: [&str; 36] = [
    SIG_ALGO_ECDSA_WITH_SHA256,
    PUB_KEY_ALGO_EC_PUBLIC_KEY,
    ELLIPTIC_CURVE_PRIME256V1,
    KEY_PURPOSE_SERVER_AUTH,
    KEY_PURPOSE_CLIENT_AUTH,
    KEY_PURPOSE_CODE_SIGNING,
    KEY_PURPOSE_EMAIL_PROTECTION,
    KEY_PURPOSE_TIME_STAMPING,
    KEY_PURPOSE_OCSP_SIGNING,
    EXT_BASIC_CONSTRAINTS,
    EXT_KEY_USAGE,
    EXT_EXTENDED_KEY_USAGE,
    EXT_SUBJECT_KEY_ID,
    EXT_AUTHORITY_KEY_ID,
    ATTR_COMMON_NAME,
    ATTR_SURNAME,
    ATTR_SERIAL_NUMBER,
    ATTR_COUNTRY_NAME,
    ATTR_LOCALITY_NAME,
    ATTR_STATE_OR_PROVINCE_NAME,
    ATTR_ORG_NAME,
    ATTR_ORG_UNIT_NAME,
    ATTR_TITLE,
    ATTR_NAME,
    ATTR_GIVEN_NAME,
    ATTR_INITIALS,
    ATTR_GENERATION_QUALIFIER,
    ATTR_DN_QUALIFIER,
    ATTR_PSEUDONYM,
    ATTR_DOMAIN_COMPONENT,
    ATTR_NODE_ID,
    ATTR_FIRMWARE_SIGNING_ID,
    ATTR_ICA_ID,
    ATTR_ROOT_CA_ID,
    ATTR_FABRIC_ID,
    ATTR_CAT_ID,
];

/// Whether the identifier belongs to any category this profile recognizes.
/// Future extensions must carry an id this returns `false` for.
pub fn is_known_oid(oid: &ObjectIdentifier) -> bool {
    KNOWN_OIDS.iter().any(|&known| *oid == known)
}
