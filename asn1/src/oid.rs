//! OBJECT IDENTIFIER arc-list type.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// An OBJECT IDENTIFIER as a list of arcs.
///
/// Parses from and formats to the dotted-decimal form, and converts to and
/// from the DER content octets (the encoding without tag and length).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectIdentifier {
    arcs: Vec<u64>,
}

impl ObjectIdentifier {
    pub fn arcs(&self) -> &[u64] {
        &self.arcs
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self.arcs.first() {
            Some(n) => self.arcs[1..]
                .iter()
                .fold(n.to_string(), |s, n| s + "." + &n.to_string()),
            None => String::new(),
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let arcs = s
            .split('.')
            .map(|arc| arc.parse::<u64>().map_err(Error::OidInvalidComponent))
            .collect::<Result<Vec<u64>, Error>>()?;
        if arcs.len() < 2 {
            return Err(Error::OidTooFewComponents);
        }
        Ok(ObjectIdentifier { arcs })
    }
}

impl TryFrom<&[u8]> for ObjectIdentifier {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(Error::OidEmpty);
        }

        let first = u64::from(value[0]);
        let mut arcs = vec![first / 40, first % 40];

        let mut arc = 0u64;
        let mut in_progress = false;
        for &b in &value[1..] {
            arc = (arc << 7) | u64::from(b & 0x7f);
            if b & 0x80 == 0 {
                arcs.push(arc);
                arc = 0;
                in_progress = false;
            } else {
                in_progress = true;
            }
        }
        if in_progress {
            return Err(Error::OidIncompleteEncoding);
        }

        Ok(ObjectIdentifier { arcs })
    }
}

impl TryFrom<ObjectIdentifier> for Vec<u8> {
    type Error = Error;

    fn try_from(oid: ObjectIdentifier) -> Result<Self, Self::Error> {
        if oid.arcs.len() < 2 {
            return Err(Error::OidTooFewComponents);
        }

        let mut out = Vec::new();
        out.push((oid.arcs[0] * 40 + oid.arcs[1]) as u8);

        for &arc in &oid.arcs[2..] {
            let mut groups = Vec::new();
            let mut value = arc;
            loop {
                groups.push((value & 0x7f) as u8);
                value >>= 7;
                if value == 0 {
                    break;
                }
            }
            while let Some(b) = groups.pop() {
                if groups.is_empty() {
                    out.push(b);
                } else {
                    out.push(b | 0x80);
                }
            }
        }

        Ok(out)
    }
}

impl PartialEq<&str> for ObjectIdentifier {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl PartialEq<ObjectIdentifier> for &str {
    fn eq(&self, other: &ObjectIdentifier) -> bool {
        *self == other.to_string()
    }
}
