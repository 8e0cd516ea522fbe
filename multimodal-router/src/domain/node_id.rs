//! Node identifier type.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid node id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node id: {reason}")]
pub struct InvalidNodeId {
    reason: &'static str,
}

/// Identifier of a graph node.
///
/// For hubs this is the provider's hub code (an IATA airport code such as
/// `COK`, or a UN/LOCODE such as `NLRTM`). For origin and destination it is
/// whatever the caller supplied. Ids are trimmed and never empty, which this
/// type guarantees by construction.
///
/// Cloning is cheap: the string is shared.
///
/// # Examples
///
/// ```
/// use multimodal_router::domain::NodeId;
///
/// let rtm = NodeId::parse(" NLRTM ").unwrap();
/// assert_eq!(rtm.as_str(), "NLRTM");
///
/// assert!(NodeId::parse("").is_err());
/// assert!(NodeId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Parse a node id, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidNodeId> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(InvalidNodeId {
                reason: "must not be empty",
            });
        }

        if trimmed.chars().any(char::is_control) {
            return Err(InvalidNodeId {
                reason: "must not contain control characters",
            });
        }

        Ok(NodeId(Arc::from(trimmed)))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NodeId::parse(&raw).map_err(serde::de::Error::custom)
    }
}
