// Represents a domain name on the wire
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// An absolute domain name
///
/// Stored as ASCII labels without the root label. Comparison is
/// case-insensitive, as in DNS.
#[derive(Debug, Clone, Eq)]
pub struct Name {
    labels: Vec<String>,
}

impl Name {
    /// Longest encoded name, root label included (RFC 1035)
    pub const MAX_WIRE_LEN: usize = 255;

    /// Longest single label (RFC 1035)
    pub const MAX_LABEL_LEN: usize = 63;

    pub fn root() -> Name {
        Name { labels: Vec::new() }
    }

    /// Parse a textual name; the trailing `.` is optional
    ///
    /// Empty labels (`a..b`) and the empty string are rejected. `.` alone is
    /// the root.
    pub fn parse(s: &str) -> Result<Name> {
        if s.is_empty() {
            return Err(Error::encoding("empty domain name"));
        }
        if s == "." {
            return Ok(Name::root());
        }

        let labels = s
            .strip_suffix('.')
            .unwrap_or(s)
            .split('.')
            .map(Name::valid_label)
            .collect::<Result<Vec<_>>>()?;

        let name = Name { labels };
        if name.wire_len() > Name::MAX_WIRE_LEN {
            return Err(Error::encoding(format!("domain name '{}' is too long", s)));
        }

        Ok(name)
    }

    fn valid_label(label: &str) -> Result<String> {
        if label.is_empty() {
            return Err(Error::encoding("empty labels are not valid"));
        }
        if label.len() > Name::MAX_LABEL_LEN {
            return Err(Error::encoding(format!(
                "label '{}' is longer than {}",
                label,
                Name::MAX_LABEL_LEN
            )));
        }
        if !label.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(Error::encoding(format!(
                "label '{}' must be printable ascii",
                label
            )));
        }
        Ok(label.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Encoded length, including the root label
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// Append the uncompressed wire form
    pub fn compose(&self, buf: &mut Vec<u8>) {
        for label in &self.labels {
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
        buf.push(0);
    }

    /// Append the canonical wire form: uncompressed and lower-cased
    ///
    /// Used for the names that enter a TSIG digest (RFC 8945 §4.3.3).
    pub fn compose_canonical(&self, buf: &mut Vec<u8>) {
        for label in &self.labels {
            buf.push(label.len() as u8);
            buf.extend(label.bytes().map(|b| b.to_ascii_lowercase()));
        }
        buf.push(0);
    }

    /// Build a name from labels known to be valid
    pub(crate) fn from_static(labels: &[&'static str]) -> Name {
        Name {
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Build a name from raw wire labels, as read from a message
    pub(crate) fn from_labels(labels: Vec<Vec<u8>>) -> Result<Name> {
        let labels = labels
            .into_iter()
            .map(|l| {
                String::from_utf8(l).map_err(|_| Error::malformed("non-ascii label in name"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Name { labels })
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(&other.labels)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Name::parse(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.labels.is_empty() {
            return write!(f, ".");
        }

        for label in &self.labels {
            write!(f, "{}.", label)?
        }

        Ok(())
    }
}
