//! Distinguished-Name sub-codec.
//!
//! A DN arrives as a TLV list of context-tagged attribute values and leaves
//! as a DER `RDNSequence` with one single-attribute SET per attribute. The
//! attribute type is the context tag number; bit 0x80 of the tag selects the
//! PrintableString rendering for string-valued types. The 64-bit and 32-bit
//! identifier types are rendered as fixed-width uppercase-hex UTF8Strings.

use std::fmt;

use serde::Serialize;

use asn1::Asn1Writer;
use tlv::{ContainerType, Tag, TlvReader};

use crate::error::Error;
use crate::oid;

const PRINTABLE_FLAG: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeKind {
    DirectoryString,
    Ia5String,
    Id64,
    Id32,
}

struct AttributeType {
    tag: u8,
    label: &'static str,
    oid: &'static str,
    kind: AttributeKind,
}

static ATTRIBUTE_TYPES: [AttributeType; 22] = [
    AttributeType { tag: 1, label: "CN", oid: oid::ATTR_COMMON_NAME, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 2, label: "SN", oid: oid::ATTR_SURNAME, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 3, label: "serialNumber", oid: oid::ATTR_SERIAL_NUMBER, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 4, label: "C", oid: oid::ATTR_COUNTRY_NAME, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 5, label: "L", oid: oid::ATTR_LOCALITY_NAME, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 6, label: "ST", oid: oid::ATTR_STATE_OR_PROVINCE_NAME, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 7, label: "O", oid: oid::ATTR_ORG_NAME, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 8, label: "OU", oid: oid::ATTR_ORG_UNIT_NAME, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 9, label: "T", oid: oid::ATTR_TITLE, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 10, label: "name", oid: oid::ATTR_NAME, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 11, label: "GN", oid: oid::ATTR_GIVEN_NAME, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 12, label: "initials", oid: oid::ATTR_INITIALS, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 13, label: "generationQualifier", oid: oid::ATTR_GENERATION_QUALIFIER, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 14, label: "dnQualifier", oid: oid::ATTR_DN_QUALIFIER, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 15, label: "pseudonym", oid: oid::ATTR_PSEUDONYM, kind: AttributeKind::DirectoryString },
    AttributeType { tag: 16, label: "DC", oid: oid::ATTR_DOMAIN_COMPONENT, kind: AttributeKind::Ia5String },
    AttributeType { tag: 17, label: "node-id", oid: oid::ATTR_NODE_ID, kind: AttributeKind::Id64 },
    AttributeType { tag: 18, label: "firmware-signing-id", oid: oid::ATTR_FIRMWARE_SIGNING_ID, kind: AttributeKind::Id64 },
    AttributeType { tag: 19, label: "ica-id", oid: oid::ATTR_ICA_ID, kind: AttributeKind::Id64 },
    AttributeType { tag: 20, label: "root-ca-id", oid: oid::ATTR_ROOT_CA_ID, kind: AttributeKind::Id64 },
    AttributeType { tag: 21, label: "fabric-id", oid: oid::ATTR_FABRIC_ID, kind: AttributeKind::Id64 },
    AttributeType { tag: 22, label: "cat-id", oid: oid::ATTR_CAT_ID, kind: AttributeKind::Id32 },
];

fn attribute_type(tag: u8) -> Option<&'static AttributeType> {
    ATTRIBUTE_TYPES.iter().find(|a| a.tag == tag)
}

/// Value of a single DN attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AttributeValue {
    Text(String),
    Id64(u64),
    Id32(u32),
}

impl fmt::Display for AttributeValue {
    // identifier values use the same fixed-width hex as the DER encoding
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => write!(f, "{}", s),
            AttributeValue::Id64(v) => write!(f, "{:016X}", v),
            AttributeValue::Id32(v) => write!(f, "{:08X}", v),
        }
    }
}

/// One attribute-type/value pair of a Distinguished Name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnAttribute {
    label: &'static str,
    oid: &'static str,
    value: AttributeValue,
    #[serde(skip)]
    kind: AttributeKind,
    #[serde(skip)]
    printable: bool,
}

impl DnAttribute {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn oid(&self) -> &'static str {
        self.oid
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    pub fn is_printable(&self) -> bool {
        self.printable
    }
}

/// Ordered sequence of attribute-type/value pairs naming an issuer or
/// subject.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DistinguishedName {
    attributes: Vec<DnAttribute>,
}

impl DistinguishedName {
    /// A DN holding a single common-name attribute, rendered as a
    /// UTF8String.
    pub fn common_name(name: &str) -> Self {
        DistinguishedName {
            attributes: vec![DnAttribute {
                label: "CN",
                oid: oid::ATTR_COMMON_NAME,
                value: AttributeValue::Text(name.to_string()),
                kind: AttributeKind::DirectoryString,
                printable: false,
            }],
        }
    }

    pub fn attributes(&self) -> &[DnAttribute] {
        &self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Decodes a DN from the TLV list element the reader is positioned on.
    pub(crate) fn decode_tlv(reader: &mut TlvReader<'_>) -> Result<Self, Error> {
        reader.enter(ContainerType::List)?;
        let mut attributes = Vec::new();
        while reader.next()? {
            let tag = match reader.tag()? {
                Tag::Context(n) => n,
                Tag::Anonymous => return Err(Error::UntaggedDnAttribute),
            };
            let base = tag & !PRINTABLE_FLAG;
            let printable = tag & PRINTABLE_FLAG != 0;
            let info = attribute_type(base).ok_or(Error::UnsupportedDnAttribute(tag))?;
            let value = match info.kind {
                AttributeKind::DirectoryString | AttributeKind::Ia5String => {
                    AttributeValue::Text(reader.get_str()?.to_string())
                }
                AttributeKind::Id64 => {
                    if printable {
                        return Err(Error::UnsupportedDnAttribute(tag));
                    }
                    AttributeValue::Id64(reader.get_u64()?)
                }
                AttributeKind::Id32 => {
                    if printable {
                        return Err(Error::UnsupportedDnAttribute(tag));
                    }
                    AttributeValue::Id32(reader.get_u32()?)
                }
            };
            attributes.push(DnAttribute {
                label: info.label,
                oid: info.oid,
                value,
                kind: info.kind,
                printable,
            });
        }
        reader.exit_container()?;
        Ok(DistinguishedName { attributes })
    }

    /// Emits the DER `Name`: a SEQUENCE of single-attribute SETs.
    pub(crate) fn encode_der(&self, writer: &mut Asn1Writer) -> Result<(), Error> {
        writer.begin_sequence()?;
        for attribute in &self.attributes {
            writer.begin_set()?;
            writer.begin_sequence()?;
            writer.put_object_id(attribute.oid)?;
            match (&attribute.value, attribute.kind) {
                (AttributeValue::Text(s), AttributeKind::Ia5String) => writer.put_ia5_string(s)?,
                (AttributeValue::Text(s), _) if attribute.printable => {
                    writer.put_printable_string(s)?
                }
                (AttributeValue::Text(s), _) => writer.put_utf8_string(s)?,
                (AttributeValue::Id64(v), _) => writer.put_utf8_string(&format!("{:016X}", v))?,
                (AttributeValue::Id32(v), _) => writer.put_utf8_string(&format!("{:08X}", v))?,
            }
            writer.end()?;
            writer.end()?;
        }
        writer.end()?;
        Ok(())
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .attributes
            .iter()
            .map(|attr| format!("{}={}", attr.label, attr.value))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", formatted)
    }
}

#[cfg(test)]
mod tests {
    use asn1::Asn1Writer;
    use tlv::TlvReader;

    use crate::dn::{AttributeValue, DistinguishedName};
    use crate::error::Error;

    fn decode(input: &[u8]) -> Result<DistinguishedName, Error> {
        let mut reader = TlvReader::new(input);
        assert!(reader.next().unwrap());
        DistinguishedName::decode_tlv(&mut reader)
    }

    fn encode(dn: &DistinguishedName) -> Vec<u8> {
        let mut writer = Asn1Writer::with_capacity(512);
        dn.encode_der(&mut writer).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_common_name_printable() {
        // list { [0x81 (CN, printable)] utf8 "CA" }
        let input = vec![0x17, 0x2c, 0x81, 0x02, 0x43, 0x41, 0x18];
        let dn = decode(&input).unwrap();
        assert_eq!(1, dn.attributes().len());
        let attr = &dn.attributes()[0];
        assert_eq!("CN", attr.label());
        assert_eq!("2.5.4.3", attr.oid());
        assert_eq!(&AttributeValue::Text("CA".to_string()), attr.value());
        assert!(attr.is_printable());
        assert_eq!("CN=CA", dn.to_string());

        assert_eq!(
            vec![
                0x30, 0x0d, 0x31, 0x0b, 0x30, 0x09, 0x06, 0x03, 0x55, 0x04, 0x03, 0x13, 0x02,
                0x43, 0x41,
            ],
            encode(&dn)
        );
    }

    #[test]
    fn test_node_id_hex_rendering() {
        // list { [17] u16 0xDEAD }
        let input = vec![0x17, 0x25, 0x11, 0xad, 0xde, 0x18];
        let dn = decode(&input).unwrap();
        assert_eq!(
            &AttributeValue::Id64(0xdead),
            dn.attributes()[0].value()
        );
        assert_eq!("node-id=000000000000DEAD", dn.to_string());

        let mut expected = vec![
            0x30, 0x22, 0x31, 0x20, 0x30, 0x1e, 0x06, 0x0a, 0x2b, 0x06, 0x01, 0x04, 0x01, 0x82,
            0xa2, 0x7c, 0x01, 0x01, 0x0c, 0x10,
        ];
        expected.extend_from_slice(b"000000000000DEAD");
        assert_eq!(expected, encode(&dn));
    }

    #[test]
    fn test_domain_component_ia5() {
        // list { [16] utf8 "example" }
        let mut input = vec![0x17, 0x2c, 0x10, 0x07];
        input.extend_from_slice(b"example");
        input.push(0x18);
        let dn = decode(&input).unwrap();
        let der = encode(&dn);
        // the value is re-encoded as an IA5String
        let mut needle = vec![0x16, 0x07];
        needle.extend_from_slice(b"example");
        assert!(der.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_multiple_attributes_keep_order() {
        // list { [0x84 (C, printable)] "JP", [1 (CN)] "node" }
        let input = vec![
            0x17, 0x2c, 0x84, 0x02, 0x4a, 0x50, 0x2c, 0x01, 0x04, 0x6e, 0x6f, 0x64, 0x65, 0x18,
        ];
        let dn = decode(&input).unwrap();
        assert_eq!(2, dn.attributes().len());
        assert_eq!("C", dn.attributes()[0].label());
        assert_eq!("CN", dn.attributes()[1].label());
        assert_eq!("C=JP, CN=node", dn.to_string());
    }

    #[test]
    fn test_unknown_attribute_tag() {
        let input = vec![0x17, 0x24, 0x63, 0x01, 0x18];
        assert_eq!(Err(Error::UnsupportedDnAttribute(0x63)), decode(&input));
    }

    #[test]
    fn test_printable_flag_on_identifier_attribute() {
        // [0x91] = node-id with the printable bit, which only applies to
        // string-valued types
        let input = vec![0x17, 0x24, 0x91, 0x01, 0x18];
        assert_eq!(Err(Error::UnsupportedDnAttribute(0x91)), decode(&input));
    }

    #[test]
    fn test_wrongly_typed_value() {
        // CN carrying an unsigned integer instead of a string
        let input = vec![0x17, 0x24, 0x01, 0x07, 0x18];
        assert!(matches!(
            decode(&input),
            Err(Error::Tlv(tlv::Error::UnexpectedValueType { .. }))
        ));
    }

    #[test]
    fn test_empty_name() {
        let input = vec![0x17, 0x18];
        let dn = decode(&input).unwrap();
        assert!(dn.is_empty());
        assert_eq!(vec![0x30, 0x00], encode(&dn));
    }
}
