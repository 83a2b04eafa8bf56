//! Hierarchy resolver.
//!
//! Computes, for a resource vertex, the owners reachable along its
//! containment chain, the chain itself and the public flag. Read-only.

use std::collections::HashSet;
use std::time::Duration;

use petvideos_core::error::{PetVideosError, PetVideosResult};
use petvideos_core::models::hierarchy::ResolvedHierarchy;
use petvideos_core::models::vertex::{EdgeKind, VertexKind, VertexRef};
use petvideos_core::repository::{GraphStore, IS_PUBLIC, ScalarValue};
use tracing::debug;

use crate::config::AuthzConfig;

/// Run one graph store call under `timeout`; an expired call is a store
/// failure, never an empty result.
pub(crate) async fn store_call<T>(
    timeout: Duration,
    operation: &str,
    call: impl Future<Output = PetVideosResult<T>>,
) -> PetVideosResult<T> {
    tokio::time::timeout(timeout, call).await.map_err(|_| {
        PetVideosError::StoreUnavailable(format!("{operation} timed out after {timeout:?}"))
    })?
}

#[derive(Debug, Clone)]
pub struct HierarchyResolver {
    root_directory: Option<String>,
    max_depth: usize,
    timeout: Duration,
}

impl HierarchyResolver {
    pub fn new(root_directory: Option<String>, max_depth: usize, timeout: Duration) -> Self {
        Self {
            root_directory,
            max_depth,
            timeout,
        }
    }

    pub fn from_config(config: &AuthzConfig) -> Self {
        Self::new(
            config.root_directory.clone(),
            config.max_depth,
            config.store_timeout,
        )
    }

    /// Resolve the closure of `resource`.
    ///
    /// The public flag, the direct owners and the ancestor walk are
    /// independent and run concurrently. Owners are deduplicated by id in
    /// discovery order: direct owners first, then nearest ancestor up.
    pub async fn resolve<G: GraphStore>(
        &self,
        store: &G,
        resource: &VertexRef,
    ) -> PetVideosResult<ResolvedHierarchy> {
        let (is_public, direct_owners, (ancestors, ancestor_owners)) = tokio::try_join!(
            self.public_flag(store, resource),
            store_call(
                self.timeout,
                "owner lookup",
                store.in_edges(resource, EdgeKind::Owner)
            ),
            self.walk(store, resource),
        )?;

        let mut seen = HashSet::new();
        let owners: Vec<VertexRef> = direct_owners
            .into_iter()
            .chain(ancestor_owners)
            .filter(|owner| seen.insert(owner.id.clone()))
            .collect();

        let resolved = ResolvedHierarchy {
            resource: resource.clone(),
            owners,
            ancestors,
            is_public,
        };
        debug!(
            resource = %resource.id,
            owners = ?resolved.owner_ids().collect::<Vec<_>>(),
            ancestors = ?resolved.ancestor_ids().collect::<Vec<_>>(),
            is_public,
            "Resolved hierarchy"
        );
        Ok(resolved)
    }

    /// A missing flag reads as private; anything but a boolean is rejected.
    async fn public_flag<G: GraphStore>(&self, store: &G, vertex: &VertexRef) -> PetVideosResult<bool> {
        match store_call(self.timeout, "public flag", store.attribute(vertex, IS_PUBLIC)).await? {
            None => Ok(false),
            Some(ScalarValue::Bool(b)) => Ok(b),
            Some(other) => Err(PetVideosError::InvalidRequestShape(format!(
                "{IS_PUBLIC} of {} is not a boolean: {other:?}",
                vertex.id
            ))),
        }
    }

    fn is_root(&self, vertex: &VertexRef) -> bool {
        vertex.kind == VertexKind::Directory
            && self.root_directory.as_deref() == Some(vertex.name.as_str())
    }

    /// Follow MEMBEROF edges to the root, collecting each ancestor and its
    /// direct owners. Hops are sequential.
    async fn walk<G: GraphStore>(
        &self,
        store: &G,
        resource: &VertexRef,
    ) -> PetVideosResult<(Vec<VertexRef>, Vec<VertexRef>)> {
        let mut ancestors = Vec::new();
        let mut owners = Vec::new();
        let mut visited = HashSet::from([(resource.kind, resource.id.clone())]);
        let mut cursor = resource.clone();

        while !self.is_root(&cursor) {
            let parents = store_call(
                self.timeout,
                "parent lookup",
                store.out_edges(&cursor, EdgeKind::MemberOf),
            )
            .await?;

            let parent = match parents.as_slice() {
                [] => break,
                [parent] => parent.clone(),
                many => {
                    return Err(PetVideosError::MalformedHierarchy {
                        vertex: cursor.id,
                        parents: many.len(),
                    });
                }
            };

            if ancestors.len() == self.max_depth
                || !visited.insert((parent.kind, parent.id.clone()))
            {
                return Err(PetVideosError::CycleDetected {
                    vertex: resource.id.clone(),
                    max_depth: self.max_depth,
                });
            }

            owners.extend(
                store_call(
                    self.timeout,
                    "owner lookup",
                    store.in_edges(&parent, EdgeKind::Owner),
                )
                .await?,
            );
            ancestors.push(parent.clone());
            cursor = parent;
        }

        Ok((ancestors, owners))
    }
}
