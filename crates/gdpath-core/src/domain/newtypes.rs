//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for remote identifiers and logical paths.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Remote identifiers
// ============================================================================

/// Sentinel ID the remote service accepts for the root folder
pub const ROOT_ID: &str = "root";

/// Opaque, service-assigned object ID
///
/// Format: non-empty string of ASCII alphanumerics, `-` and `_`,
/// e.g. "1aBcD3fGh-IjK_lMnOp". The root folder uses the [`ROOT_ID`] sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteId(String);

impl RemoteId {
    /// Create a new RemoteId
    ///
    /// # Errors
    /// Returns error if the ID is empty or contains characters the service
    /// never hands out
    pub fn new(id: String) -> Result<Self, DomainError> {
        if id.is_empty() {
            return Err(DomainError::InvalidRemoteId(
                "Remote ID cannot be empty".to_string(),
            ));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::InvalidRemoteId(format!(
                "Remote ID contains invalid characters: {id}"
            )));
        }

        Ok(Self(id))
    }

    /// The root folder sentinel; never looked up remotely
    #[must_use]
    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    /// Whether this is the root sentinel
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RemoteId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemoteId> for String {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}

/// Kind of a remote object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Folder,
    File,
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Folder => write!(f, "folder"),
            ObjectKind::File => write!(f, "file"),
        }
    }
}

/// A resolved remote object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObjectRef {
    pub id: RemoteId,
    pub kind: ObjectKind,
}

impl RemoteObjectRef {
    /// The root folder
    #[must_use]
    pub fn root() -> Self {
        Self {
            id: RemoteId::root(),
            kind: ObjectKind::Folder,
        }
    }
}

// ============================================================================
// Logical paths
// ============================================================================

/// A normalized slash-separated logical path, used as the cache key
///
/// Normalization drops leading, trailing and repeated slashes as well as `.`
/// segments, so `"/a//b/./c/"` and `"a/b/c"` are the same key. The root is
/// the empty key; `""`, `"."` and `"/"` all parse to it. `..` is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathKey(String);

impl PathKey {
    /// Parse and normalize a logical path
    ///
    /// # Errors
    /// Returns error if the path contains a `..` segment
    pub fn parse(path: &str) -> Result<Self, DomainError> {
        let mut segments = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(DomainError::InvalidPath(format!(
                        "parent segments are not supported: {path}"
                    )))
                }
                s => segments.push(s),
            }
        }
        Ok(Self(segments.join("/")))
    }

    /// The root path
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Whether this key denotes the root folder
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the inner string reference (empty for the root)
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the path segments, left to right
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Iterate over every non-empty prefix together with its last segment
    ///
    /// `"a/b/c"` yields `("a", "a")`, `("a/b", "b")`, `("a/b/c", "c")`.
    pub fn prefixes(&self) -> impl Iterator<Item = (PathKey, &str)> {
        let full = self.0.as_str();
        let mut end = 0;
        self.segments().map(move |segment| {
            end = if end == 0 {
                segment.len()
            } else {
                end + 1 + segment.len()
            };
            (PathKey(full[..end].to_string()), segment)
        })
    }

    /// Split into the containing directory and the final segment
    ///
    /// The root has no leaf: `("", None)`.
    #[must_use]
    pub fn split_leaf(&self) -> (PathKey, Option<&str>) {
        match self.0.rfind('/') {
            Some(idx) => (PathKey(self.0[..idx].to_string()), Some(&self.0[idx + 1..])),
            None if self.0.is_empty() => (PathKey::root(), None),
            None => (PathKey::root(), Some(self.0.as_str())),
        }
    }

    /// Append a single name
    ///
    /// # Errors
    /// Returns error if `name` is empty, `.`, `..` or contains a slash
    pub fn join(&self, name: &str) -> Result<Self, DomainError> {
        validate_name(name)?;
        if self.is_root() {
            Ok(Self(name.to_string()))
        } else {
            Ok(Self(format!("{}/{name}", self.0)))
        }
    }

    /// Whether `self` is `other` or lies underneath it
    #[must_use]
    pub fn starts_with(&self, other: &PathKey) -> bool {
        if other.is_root() {
            return true;
        }
        self.0 == other.0
            || (self.0.starts_with(&other.0) && self.0.as_bytes().get(other.0.len()) == Some(&b'/'))
    }
}

/// Validate a single object name usable as a path segment
///
/// # Errors
/// Returns error if `name` is empty, `.`, `..` or contains a slash
pub fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(DomainError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl Display for PathKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for PathKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PathKey {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PathKey> for String {
    fn from(key: PathKey) -> Self {
        key.0
    }
}
