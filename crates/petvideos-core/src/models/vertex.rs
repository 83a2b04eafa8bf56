//! Graph vertex and edge model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three vertex kinds stored in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexKind {
    User,
    Directory,
    Video,
}

impl VertexKind {
    /// Storage label (table name) of the kind.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Directory => "directory",
            Self::Video => "video",
        }
    }

    /// Entity type name used in decision requests, without namespace.
    pub fn entity_type(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Directory => "Directory",
            Self::Video => "Video",
        }
    }

    /// Directories and videos are resources; users are principals.
    pub fn is_resource(self) -> bool {
        !matches!(self, Self::User)
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Edge labels.
///
/// `Owner` points from a user to the resource it owns; `MemberOf` points
/// from a resource to its parent directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Owner,
    MemberOf,
}

impl EdgeKind {
    /// Storage label (relation table name) of the edge.
    pub fn label(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::MemberOf => "member_of",
        }
    }

    /// Vertex kinds allowed at the tail (`in`) of the edge.
    pub fn sources(self) -> &'static [VertexKind] {
        match self {
            Self::Owner => &[VertexKind::User],
            Self::MemberOf => &[VertexKind::Directory, VertexKind::Video],
        }
    }

    /// Vertex kinds allowed at the head (`out`) of the edge.
    pub fn targets(self) -> &'static [VertexKind] {
        match self {
            Self::Owner => &[VertexKind::Directory, VertexKind::Video],
            Self::MemberOf => &[VertexKind::Directory],
        }
    }

    /// Whether `from -[self]-> to` is a well-typed edge.
    pub fn connects(self, from: VertexKind, to: VertexKind) -> bool {
        self.sources().contains(&from) && self.targets().contains(&to)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => f.write_str("OWNER"),
            Self::MemberOf => f.write_str("MEMBEROF"),
        }
    }
}

/// Handle to a stored vertex.
///
/// `id` is the immutable opaque identity; `name` is the human-readable
/// lookup key, unique within its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexRef {
    pub kind: VertexKind,
    pub id: String,
    pub name: String,
}

/// Input for creating a vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVertex {
    pub kind: VertexKind,
    /// Caller-chosen id. Users carry their principal identifier here;
    /// when `None` a UUID is generated.
    pub id: Option<String>,
    pub name: String,
    /// Ignored for users.
    pub is_public: bool,
}

impl NewVertex {
    pub fn user(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: VertexKind::User,
            id: Some(id.into()),
            name: name.into(),
            is_public: false,
        }
    }

    pub fn directory(name: impl Into<String>, is_public: bool) -> Self {
        Self {
            kind: VertexKind::Directory,
            id: None,
            name: name.into(),
            is_public,
        }
    }

    pub fn video(name: impl Into<String>, is_public: bool) -> Self {
        Self {
            kind: VertexKind::Video,
            id: None,
            name: name.into(),
            is_public,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_typing() {
        assert!(EdgeKind::Owner.connects(VertexKind::User, VertexKind::Video));
        assert!(EdgeKind::Owner.connects(VertexKind::User, VertexKind::Directory));
        assert!(!EdgeKind::Owner.connects(VertexKind::Directory, VertexKind::Video));
        assert!(EdgeKind::MemberOf.connects(VertexKind::Video, VertexKind::Directory));
        assert!(!EdgeKind::MemberOf.connects(VertexKind::Directory, VertexKind::Video));
        assert!(!EdgeKind::MemberOf.connects(VertexKind::User, VertexKind::Directory));
    }

    #[test]
    fn labels() {
        assert_eq!(VertexKind::Video.label(), "video");
        assert_eq!(VertexKind::Directory.entity_type(), "Directory");
        assert_eq!(EdgeKind::MemberOf.label(), "member_of");
        assert_eq!(EdgeKind::MemberOf.to_string(), "MEMBEROF");
    }
}
