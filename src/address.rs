//! Device address lists.
//!
//! The operator supplies addresses as a single comma-separated string. The
//! list is never cached: every lookup re-parses the live text, so edits take
//! effect on the next poll without restarting anything.

use log::warn;
use std::fs;
use std::path::PathBuf;

/// Parse a comma-separated address list.
///
/// Tokens are trimmed and empty tokens dropped. Duplicates are kept in
/// position. Blank input yields an empty list.
///
/// # Example
/// ```
/// use thermistor_poller::address::parse;
///
/// let ips = parse(" 10.0.0.1 , 10.0.0.2,  ");
/// assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2"]);
/// ```
pub fn parse(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// Resolve the address under the cursor, wrapping modulo the list length.
pub fn current(list: &[String], index: usize) -> Option<&str> {
    if list.is_empty() {
        return None;
    }
    Some(list[index % list.len()].as_str())
}

/// Move the cursor one step forward, wrapping at `len`.
///
/// An empty list leaves the cursor where it is.
pub fn advance(index: usize, len: usize) -> usize {
    if len == 0 {
        return index;
    }
    (index + 1) % len
}

/// Supplier of the raw, unparsed address text.
///
/// Read on demand at every lookup; implementations must not cache.
pub trait AddressSource: Send + Sync {
    fn address_text(&self) -> String;

    /// Parse the current text into an address list.
    fn addresses(&self) -> Vec<String> {
        parse(&self.address_text())
    }
}

impl AddressSource for str {
    fn address_text(&self) -> String {
        self.to_string()
    }
}

impl AddressSource for String {
    fn address_text(&self) -> String {
        self.clone()
    }
}

/// Address text kept in a file that the operator may edit while polling.
///
/// An unreadable file is treated as an empty list after logging a warning.
#[derive(Debug, Clone)]
pub struct AddressFile {
    path: PathBuf,
}

impl AddressFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AddressSource for AddressFile {
    fn address_text(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(text) => text.replace(['\n', '\r'], ","),
            Err(e) => {
                warn!("cannot read address file {}: {e}", self.path.display());
                String::new()
            }
        }
    }
}
