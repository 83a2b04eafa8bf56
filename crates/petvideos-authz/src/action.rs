//! Actions a principal can request and the routes that map onto them.

use std::fmt;
use std::str::FromStr;

use petvideos_core::error::{PetVideosError, PetVideosResult};
use petvideos_core::models::vertex::VertexKind;

/// Action group granted to owners of a resource or of any ancestor.
pub const OWNER_ACTIONS: &str = "OwnerActions";
/// Action group granted on resources flagged public.
pub const PUBLIC_ACTIONS: &str = "PublicActions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ViewDirectory,
    ViewVideo,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::ViewDirectory, Action::ViewVideo];

    pub fn id(self) -> &'static str {
        match self {
            Self::ViewDirectory => "ViewDirectory",
            Self::ViewVideo => "ViewVideo",
        }
    }

    /// Kind of vertex the action is performed on.
    pub fn resource_kind(self) -> VertexKind {
        match self {
            Self::ViewDirectory => VertexKind::Directory,
            Self::ViewVideo => VertexKind::Video,
        }
    }

    /// Action groups this action belongs to.
    pub fn groups(self) -> &'static [&'static str] {
        match self {
            Self::ViewDirectory | Self::ViewVideo => &[OWNER_ACTIONS, PUBLIC_ACTIONS],
        }
    }

    /// Map an API route to its action.
    pub fn from_route(path: &str, method: &str) -> PetVideosResult<Self> {
        match (path, method.to_ascii_uppercase().as_str()) {
            ("/directory/get", "GET") => Ok(Self::ViewDirectory),
            ("/video/get", "GET") => Ok(Self::ViewVideo),
            _ => Err(PetVideosError::UnknownAction(format!("{method} {path}"))),
        }
    }
}

impl FromStr for Action {
    type Err = PetVideosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.id() == s)
            .ok_or_else(|| PetVideosError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
