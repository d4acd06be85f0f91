//! Parsing of delivered mail artifacts.
//!
//! The assertion stage inspects one collected Maildir file: a header block
//! up to the first blank line, then the body verbatim. Folded continuation
//! lines are joined into the owning header's value.

use anyhow::{bail, Result};

/// A delivered message split into headers and body.
#[derive(Debug, Clone)]
pub struct MailMessage {
    headers: Vec<(String, String)>,
    /// Everything after the first blank line, byte for byte.
    pub body: String,
}

impl MailMessage {
    /// Parse message text in the classic header-block format.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers: Vec<(String, String)> = Vec::new();
        let mut rest = text;

        loop {
            let (line, remainder) = match rest.find('\n') {
                Some(idx) => (&rest[..idx], &rest[idx + 1..]),
                None => (rest, ""),
            };

            if line.is_empty() || line == "\r" {
                rest = remainder;
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                match headers.last_mut() {
                    Some((_, value)) => {
                        value.push(' ');
                        value.push_str(line.trim());
                    }
                    None => bail!("continuation line before any header: '{}'", line),
                }
            } else {
                match line.split_once(':') {
                    Some((name, value)) => {
                        headers.push((name.trim().to_string(), value.trim().to_string()));
                    }
                    None => bail!("malformed header line: '{}'", line),
                }
            }

            rest = remainder;
            if rest.is_empty() {
                break;
            }
        }

        Ok(Self {
            headers,
            body: rest.to_string(),
        })
    }

    /// First value of the named header. Lookup is case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of the named header, in order of appearance.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }
}
