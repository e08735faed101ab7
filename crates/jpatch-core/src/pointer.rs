//! RFC 6901 JSON Pointer codec.
//!
//! A [`Pointer`] is an ordered list of raw (unescaped) tokens; the empty list
//! addresses the document root. Encoding escapes `~` as `~0` and `/` as `~1`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ErrorKind;

/// Token that addresses the slot after the last array element.
pub const APPEND_TOKEN: &str = "-";

/// Encodes raw tokens into a pointer string.
///
/// ```
/// # use jpatch_core::pointer::encode;
/// assert_eq!(encode(["a/b", "~c", "0"]), "/a~1b/~0c/0");
/// assert_eq!(encode(Vec::<String>::new()), "");
/// ```
#[must_use]
pub fn encode<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pointer = String::new();
    for token in tokens {
        pointer.push('/');
        escape_into(&mut pointer, token.as_ref());
    }
    pointer
}

/// Decodes a pointer string into raw tokens.
///
/// ```
/// # use jpatch_core::pointer::decode;
/// assert_eq!(decode("/a~1b/~0c/0")?, vec!["a/b", "~c", "0"]);
/// assert_eq!(decode("/")?, vec![""]);
/// assert!(decode("/bad~2escape").is_err());
/// # Ok::<(), jpatch_core::ErrorKind>(())
/// ```
pub fn decode(pointer: &str) -> Result<Vec<String>, ErrorKind> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(malformed(pointer, "must be empty or start with '/'"));
    };
    rest.split('/').map(|token| unescape(pointer, token)).collect()
}

fn escape_into(out: &mut String, token: &str) {
    for ch in token.chars() {
        match ch {
            '~' => out.push_str("~0"),
            '/' => out.push_str("~1"),
            other => out.push(other),
        }
    }
}

fn unescape(pointer: &str, token: &str) -> Result<String, ErrorKind> {
    if !token.contains('~') {
        return Ok(token.to_owned());
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(ch) = chars.next() {
        if ch != '~' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            Some(_) => return Err(malformed(pointer, "'~' must be followed by '0' or '1'")),
            None => return Err(malformed(pointer, "dangling '~' at end of token")),
        }
    }
    Ok(out)
}

fn malformed(pointer: &str, reason: &'static str) -> ErrorKind {
    ErrorKind::MalformedPointer { pointer: pointer.to_owned(), reason }
}

/// Parses an array index token.
///
/// Only canonical base-10 integers are accepted (`0`, `17`, not `017` or `+1`).
/// Indices too large for `usize` saturate, so they name no element.
pub(crate) fn parse_index(token: &str) -> Option<usize> {
    let bytes = token.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    Some(token.parse().unwrap_or(usize::MAX))
}

/// A decoded JSON Pointer.
///
/// ```
/// # use jpatch_core::Pointer;
/// let pointer = Pointer::root().child("users").child(0usize).child("name");
/// assert_eq!(pointer.to_string(), "/users/0/name");
/// assert_eq!(pointer.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer(Vec<String>);

impl Pointer {
    /// The pointer addressing the whole document.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a pointer from raw tokens.
    #[must_use]
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    /// Parses an encoded pointer string.
    pub fn parse(pointer: &str) -> Result<Self, ErrorKind> {
        decode(pointer).map(Self)
    }

    /// Returns the raw tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Indicates whether this is the root pointer.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends a token in place.
    pub fn push<T>(&mut self, token: T)
    where
        T: ToToken,
    {
        self.0.push(token.to_token());
    }

    /// Returns a new pointer extended by one token.
    #[must_use]
    pub fn child<T>(&self, token: T) -> Self
    where
        T: ToToken,
    {
        let mut tokens = Vec::with_capacity(self.0.len() + 1);
        tokens.extend(self.0.iter().cloned());
        tokens.push(token.to_token());
        Self(tokens)
    }

    /// Returns the pointer to the containing value, or `None` for the root.
    ///
    /// ```
    /// # use jpatch_core::Pointer;
    /// let pointer: Pointer = "/a/b".parse()?;
    /// assert_eq!(pointer.parent().unwrap().to_string(), "/a");
    /// assert!(Pointer::root().parent().is_none());
    /// # Ok::<(), jpatch_core::ErrorKind>(())
    /// ```
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.to_vec()))
    }

    /// The last token, or `None` for the root.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Indicates whether `self` equals `other` or is one of its ancestors.
    ///
    /// ```
    /// # use jpatch_core::Pointer;
    /// let a: Pointer = "/a".parse()?;
    /// let ab: Pointer = "/a/b".parse()?;
    /// assert!(a.is_prefix_of(&ab));
    /// assert!(a.is_prefix_of(&a));
    /// assert!(!ab.is_prefix_of(&a));
    /// # Ok::<(), jpatch_core::ErrorKind>(())
    /// ```
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Indicates whether `self` is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Consumes the pointer and returns the owned tokens.
    #[must_use]
    pub fn into_tokens(self) -> Vec<String> {
        self.0
    }
}

/// Conversion into a raw pointer token.
pub trait ToToken {
    /// Returns the raw (unescaped) token.
    fn to_token(self) -> String;
}

impl ToToken for &str {
    fn to_token(self) -> String {
        self.to_owned()
    }
}

impl ToToken for String {
    fn to_token(self) -> String {
        self
    }
}

impl ToToken for &String {
    fn to_token(self) -> String {
        self.clone()
    }
}

impl ToToken for usize {
    fn to_token(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(&self.0))
    }
}

impl FromStr for Pointer {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Vec<String>> for Pointer {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl<'a> IntoIterator for &'a Pointer {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for Pointer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Pointer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl serde::de::Visitor<'_> for Visitor {
            type Value = Pointer;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON Pointer string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Pointer::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::{collection::vec, prelude::*, string::string_regex};

    #[test]
    fn escapes_tilde_before_slash() {
        assert_eq!(encode(["~1"]), "/~01");
        assert_eq!(decode("/~01").unwrap(), vec!["~1"]);
        assert_eq!(encode(["/"]), "/~1");
    }

    #[test]
    fn empty_tokens_are_preserved() {
        assert_eq!(decode("//").unwrap(), vec!["", ""]);
        assert_eq!(encode(["", ""]), "//");
    }

    #[test]
    fn rejects_relative_pointers() {
        let err = decode("a/b").unwrap_err();
        assert!(matches!(err, ErrorKind::MalformedPointer { .. }));
    }

    #[test]
    fn rejects_bad_escapes() {
        assert!(matches!(decode("/a~"), Err(ErrorKind::MalformedPointer { .. })));
        assert!(matches!(decode("/a~2"), Err(ErrorKind::MalformedPointer { .. })));
    }

    #[test]
    fn index_tokens_must_be_canonical() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("42"), Some(42));
        assert_eq!(parse_index("042"), None);
        assert_eq!(parse_index("-"), None);
        assert_eq!(parse_index(""), None);
        assert_eq!(parse_index("+1"), None);
        assert_eq!(parse_index("99999999999999999999999"), Some(usize::MAX));
    }

    #[test]
    fn serde_uses_pointer_strings() {
        let pointer = Pointer::from_tokens(["a/b", "0"]);
        let json = serde_json::to_string(&pointer).unwrap();
        assert_eq!(json, "\"/a~1b/0\"");
        let decoded: Pointer = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, pointer);
        assert!(serde_json::from_str::<Pointer>("\"nope\"").is_err());
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(tokens in vec(string_regex("[a-z0-9~/]{0,5}").unwrap(), 0..5)) {
            let encoded = encode(&tokens);
            prop_assert_eq!(decode(&encoded).unwrap(), tokens);
        }
    }
}
