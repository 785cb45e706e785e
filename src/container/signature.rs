//! Closed table of recognized chunk signatures.
//!
//! The role set is fixed ([`ChunkRole`]); which four bytes select a role is data, versioned and
//! overridable through configuration.

use std::collections::BTreeMap;
use std::fmt;

use crate::foundation::error::{AeplanError, AeplanResult};

/// Current version of the built-in signature table.
pub const SIGNATURE_TABLE_VERSION: u32 = 1;

/// Four-byte chunk tag.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    /// Build from a byte string literal.
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    /// Raw bytes.
    pub fn bytes(self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({self})")
    }
}

impl serde::Serialize for FourCc {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for FourCc {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes: [u8; 4] = s.as_bytes().try_into().map_err(|_| {
            serde::de::Error::custom(format!("chunk tag '{s}' must be exactly 4 ASCII bytes"))
        })?;
        if !bytes.iter().all(|b| b.is_ascii()) {
            return Err(serde::de::Error::custom(format!(
                "chunk tag '{s}' must be ASCII"
            )));
        }
        Ok(Self(bytes))
    }
}

/// Semantic role of a chunk.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ChunkRole {
    /// Container root; its payload holds every other chunk.
    Root,
    /// Composition header.
    Composition,
    /// Layer header.
    Layer,
    /// Text document of the current layer.
    Text,
    /// Shape fill of the current layer.
    Shape,
    /// Footage (asset) reference.
    Footage,
    /// Effect applied to the current layer.
    Effect,
    /// Property expression on the current layer.
    Expression,
    /// Start of an animated property group.
    Animation,
    /// Keyframe of the current animated property.
    Keyframe,
}

impl ChunkRole {
    /// All roles, in declaration order.
    pub const ALL: [ChunkRole; 10] = [
        Self::Root,
        Self::Composition,
        Self::Layer,
        Self::Text,
        Self::Shape,
        Self::Footage,
        Self::Effect,
        Self::Expression,
        Self::Animation,
        Self::Keyframe,
    ];
}

/// Versioned mapping from tag bytes to chunk role.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SignatureRegistry {
    /// Table version, bumped whenever the built-in tags change.
    pub version: u32,
    /// Tag to role table. Several tags may share a role.
    pub tags: BTreeMap<FourCc, ChunkRole>,
}

impl Default for SignatureRegistry {
    fn default() -> Self {
        let tags = [
            (b"RIFX", ChunkRole::Root),
            (b"cdta", ChunkRole::Composition),
            (b"Layr", ChunkRole::Layer),
            (b"btdk", ChunkRole::Text),
            (b"shap", ChunkRole::Shape),
            (b"alas", ChunkRole::Footage),
            (b"EfdG", ChunkRole::Effect),
            (b"expr", ChunkRole::Expression),
            (b"tdgp", ChunkRole::Animation),
            (b"ldat", ChunkRole::Keyframe),
        ]
        .into_iter()
        .map(|(tag, role)| (FourCc::new(tag), role))
        .collect();
        Self {
            version: SIGNATURE_TABLE_VERSION,
            tags,
        }
    }
}

impl SignatureRegistry {
    /// Role registered for `tag`, if any.
    pub fn role(&self, tag: FourCc) -> Option<ChunkRole> {
        self.tags.get(&tag).copied()
    }

    /// First tag registered for `role`, in tag order.
    pub fn tag_for(&self, role: ChunkRole) -> Option<FourCc> {
        self.tags
            .iter()
            .find_map(|(&tag, &r)| (r == role).then_some(tag))
    }

    /// Tags that may start a container.
    pub fn root_tags(&self) -> impl Iterator<Item = FourCc> + '_ {
        self.tags
            .iter()
            .filter_map(|(&tag, &r)| (r == ChunkRole::Root).then_some(tag))
    }

    /// Replace the tag bound to `role`, dropping its previous tags.
    pub fn with_tag(mut self, role: ChunkRole, tag: FourCc) -> Self {
        self.tags.retain(|_, r| *r != role);
        self.tags.insert(tag, role);
        self
    }

    /// Require at least one root tag.
    pub fn validate(&self) -> AeplanResult<()> {
        if self.root_tags().next().is_none() {
            return Err(AeplanError::validation(
                "signature registry must register at least one root tag",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/container/signature.rs"]
mod tests;
