//! Sample topology used by local runs and tests.
//!
//! ```text
//! charlie -OWNER-> petVideosDirectory
//! alice   -OWNER-> aliceVideosDirectory -MEMBEROF-> petVideosDirectory
//! bob     -OWNER-> bobVideosDirectory   -MEMBEROF-> petVideosDirectory
//! alice   -OWNER-> aliceCatVideo.mp4    -MEMBEROF-> aliceVideosDirectory
//! bob     -OWNER-> bobDogVideo.mp4      -MEMBEROF-> bobVideosDirectory
//! ```

use petvideos_core::models::vertex::{EdgeKind, NewVertex, VertexRef};
use tracing::info;

use crate::error::DbError;
use crate::repository::GraphWriter;

pub const ROOT_DIRECTORY: &str = "petVideosDirectory";

/// Handles to every vertex created by [`seed_sample_topology`].
#[derive(Debug, Clone)]
pub struct SampleTopology {
    pub alice: VertexRef,
    pub bob: VertexRef,
    pub charlie: VertexRef,
    pub pet_videos: VertexRef,
    pub alice_videos: VertexRef,
    pub bob_videos: VertexRef,
    pub alice_cat_video: VertexRef,
    pub bob_dog_video: VertexRef,
}

/// Principal id of a sample user in the given identity pool.
pub fn principal_id(user_pool_id: &str, sub: &str) -> String {
    format!("{user_pool_id}|{sub}")
}

/// Seed the sample users, directories, videos and edges.
///
/// Users get the principal id `"<user_pool_id>|<name>"`, i.e. the sample
/// identity tokens carry the user name as `sub`.
pub async fn seed_sample_topology<W: GraphWriter>(
    writer: &W,
    user_pool_id: &str,
) -> Result<SampleTopology, DbError> {
    let user = |name: &str| NewVertex::user(principal_id(user_pool_id, name), name);

    let alice = writer.create_vertex(user("alice")).await?;
    let bob = writer.create_vertex(user("bob")).await?;
    let charlie = writer.create_vertex(user("charlie")).await?;

    let alice_videos = writer
        .create_vertex(NewVertex::directory("aliceVideosDirectory", false))
        .await?;
    let bob_videos = writer
        .create_vertex(NewVertex::directory("bobVideosDirectory", false))
        .await?;
    let pet_videos = writer
        .create_vertex(NewVertex::directory(ROOT_DIRECTORY, false))
        .await?;

    let alice_cat_video = writer
        .create_vertex(NewVertex::video("aliceCatVideo.mp4", false))
        .await?;
    let bob_dog_video = writer
        .create_vertex(NewVertex::video("bobDogVideo.mp4", false))
        .await?;

    writer.relate(&charlie, EdgeKind::Owner, &pet_videos).await?;
    writer.relate(&alice_videos, EdgeKind::MemberOf, &pet_videos).await?;
    writer.relate(&bob_videos, EdgeKind::MemberOf, &pet_videos).await?;
    writer.relate(&alice, EdgeKind::Owner, &alice_videos).await?;
    writer.relate(&alice_cat_video, EdgeKind::MemberOf, &alice_videos).await?;
    writer.relate(&bob, EdgeKind::Owner, &bob_videos).await?;
    writer.relate(&bob_dog_video, EdgeKind::MemberOf, &bob_videos).await?;
    writer.relate(&alice, EdgeKind::Owner, &alice_cat_video).await?;
    writer.relate(&bob, EdgeKind::Owner, &bob_dog_video).await?;

    info!(root = %pet_videos.id, "Seeded sample topology");

    Ok(SampleTopology {
        alice,
        bob,
        charlie,
        pet_videos,
        alice_videos,
        bob_videos,
        alice_cat_video,
        bob_dog_video,
    })
}
