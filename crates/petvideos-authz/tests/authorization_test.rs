//! End-to-end authorization checks over the sample topology with the
//! embedded Cedar engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use jsonwebtoken::{EncodingKey, Header};
use petvideos_authz::decision::{DecisionRequest, DecisionResponse};
use petvideos_authz::engine::{OWNER_ACTIONS_POLICY_ID, PUBLIC_ACTIONS_POLICY_ID};
use petvideos_authz::principal::IdentityClaims;
use petvideos_authz::{
    AuthorizationService, AuthzConfig, CedarDecisionEngine, DecisionEngine, DecisionError,
};
use petvideos_core::error::{ErrorKind, PetVideosResult};
use petvideos_core::models::vertex::{EdgeKind, VertexKind, VertexRef};
use petvideos_core::repository::{GraphStore, ScalarValue};
use petvideos_db::bootstrap::{SampleTopology, seed_sample_topology};
use petvideos_db::{DbError, GraphWriter, MemoryGraphStore};

const POOL: &str = "us-east-1_test";
const POLICY_STORE: &str = "ps-test";

fn token(sub: &str) -> String {
    let claims = IdentityClaims {
        iss: format!("https://cognito-idp.us-east-1.amazonaws.com/{POOL}"),
        sub: sub.into(),
    };
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test")).unwrap()
}

fn config() -> AuthzConfig {
    AuthzConfig {
        policy_store_id: POLICY_STORE.into(),
        ..AuthzConfig::default()
    }
}

/// Counts every request that reaches the wrapped engine.
struct Counting<E> {
    inner: E,
    calls: Arc<AtomicUsize>,
}

impl<E: DecisionEngine> DecisionEngine for Counting<E> {
    async fn is_authorized_with_token(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionResponse, DecisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.is_authorized_with_token(request).await
    }
}

/// Engine that is down.
struct Unreachable;

impl DecisionEngine for Unreachable {
    async fn is_authorized_with_token(
        &self,
        _request: &DecisionRequest,
    ) -> Result<DecisionResponse, DecisionError> {
        Err(DecisionError::Unavailable("connection refused".into()))
    }
}

/// Engine that never answers.
struct Hanging;

impl DecisionEngine for Hanging {
    async fn is_authorized_with_token(
        &self,
        _request: &DecisionRequest,
    ) -> Result<DecisionResponse, DecisionError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(DecisionError::Unavailable("unreachable".into()))
    }
}

/// Store whose owner traversals never complete.
struct StalledStore {
    inner: MemoryGraphStore,
}

impl GraphStore for StalledStore {
    async fn find_vertex(&self, kind: VertexKind, name: &str) -> PetVideosResult<Option<VertexRef>> {
        self.inner.find_vertex(kind, name).await
    }

    async fn out_edges(&self, vertex: &VertexRef, edge: EdgeKind) -> PetVideosResult<Vec<VertexRef>> {
        self.inner.out_edges(vertex, edge).await
    }

    async fn in_edges(&self, vertex: &VertexRef, edge: EdgeKind) -> PetVideosResult<Vec<VertexRef>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        self.inner.in_edges(vertex, edge).await
    }

    async fn attribute(&self, vertex: &VertexRef, name: &str) -> PetVideosResult<Option<ScalarValue>> {
        self.inner.attribute(vertex, name).await
    }
}

/// Store whose owner traversals fail outright.
struct BrokenStore {
    inner: MemoryGraphStore,
}

impl GraphStore for BrokenStore {
    async fn find_vertex(&self, kind: VertexKind, name: &str) -> PetVideosResult<Option<VertexRef>> {
        self.inner.find_vertex(kind, name).await
    }

    async fn out_edges(&self, vertex: &VertexRef, edge: EdgeKind) -> PetVideosResult<Vec<VertexRef>> {
        self.inner.out_edges(vertex, edge).await
    }

    async fn in_edges(&self, _vertex: &VertexRef, _edge: EdgeKind) -> PetVideosResult<Vec<VertexRef>> {
        Err(DbError::Row("owner edge without an `in` record".into()).into())
    }

    async fn attribute(&self, vertex: &VertexRef, name: &str) -> PetVideosResult<Option<ScalarValue>> {
        self.inner.attribute(vertex, name).await
    }
}

struct Fixture {
    store: MemoryGraphStore,
    topology: SampleTopology,
    calls: Arc<AtomicUsize>,
    service: AuthorizationService<MemoryGraphStore, Counting<CedarDecisionEngine>>,
}

async fn fixture() -> Fixture {
    let store = MemoryGraphStore::new();
    let topology = seed_sample_topology(&store, POOL).await.unwrap();
    let config = config();
    let engine = CedarDecisionEngine::pet_videos(
        POLICY_STORE,
        config.app_namespace.clone(),
        &topology.pet_videos.id,
    )
    .unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let service = AuthorizationService::new(
        store.clone(),
        Counting {
            inner: engine,
            calls: calls.clone(),
        },
        &config,
    );
    Fixture {
        store,
        topology,
        calls,
        service,
    }
}

#[tokio::test]
async fn owner_may_view_own_video() {
    let f = fixture().await;
    let outcome = f
        .service
        .authorize(&token("bob"), "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap();

    assert!(outcome.allowed);
    assert_eq!(outcome.determining_policy.as_deref(), Some(OWNER_ACTIONS_POLICY_ID));
    assert_eq!(
        outcome.reason,
        format!("Access allowed -- determining policy id is {OWNER_ACTIONS_POLICY_ID}")
    );
}

#[tokio::test]
async fn stranger_is_denied() {
    let f = fixture().await;
    let outcome = f
        .service
        .authorize(&token("alice"), "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap();

    assert!(!outcome.allowed);
    assert_eq!(outcome.reason, "Access denied -- permissions check failed");
    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn public_root_is_viewable_by_anyone() {
    let f = fixture().await;
    f.store.set_public(&f.topology.pet_videos, true).await.unwrap();

    for user in ["alice", "dave"] {
        let outcome = f
            .service
            .authorize(&token(user), "ViewDirectory", "petVideosDirectory")
            .await
            .unwrap();
        assert!(outcome.allowed, "{user} should see the public root");
        assert_eq!(outcome.determining_policy.as_deref(), Some(PUBLIC_ACTIONS_POLICY_ID));
    }
}

#[tokio::test]
async fn missing_resource_never_reaches_the_engine() {
    let f = fixture().await;
    let err = f
        .service
        .authorize(&token("bob"), "ViewVideo", "noSuchVideo.mp4")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    assert!(err.is_client_error());
    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn lookup_is_scoped_to_the_action_resource_kind() {
    let f = fixture().await;
    let err = f
        .service
        .authorize(&token("bob"), "ViewVideo", "bobVideosDirectory")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
}

#[tokio::test]
async fn stalled_store_is_unavailable_not_denied() {
    let store = MemoryGraphStore::new();
    let topology = seed_sample_topology(&store, POOL).await.unwrap();
    let config = AuthzConfig {
        store_timeout: Duration::from_millis(50),
        ..config()
    };
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = Counting {
        inner: CedarDecisionEngine::pet_videos(POLICY_STORE, "PetVideosApp", &topology.pet_videos.id)
            .unwrap(),
        calls: calls.clone(),
    };
    let service = AuthorizationService::new(StalledStore { inner: store }, engine, &config);

    let err = service
        .authorize(&token("bob"), "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failing_store_is_unavailable_not_denied() {
    let store = MemoryGraphStore::new();
    let topology = seed_sample_topology(&store, POOL).await.unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = Counting {
        inner: CedarDecisionEngine::pet_videos(POLICY_STORE, "PetVideosApp", &topology.pet_videos.id)
            .unwrap(),
        calls: calls.clone(),
    };
    let service = AuthorizationService::new(BrokenStore { inner: store }, engine, &config());

    let err = service
        .authorize(&token("bob"), "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    assert!(!err.is_client_error());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn engine_outage_is_not_a_deny() {
    let store = MemoryGraphStore::new();
    seed_sample_topology(&store, POOL).await.unwrap();
    let service = AuthorizationService::new(store, Unreachable, &config());

    let err = service
        .authorize(&token("bob"), "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyEngineUnavailable);
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn engine_timeout_is_unavailable() {
    let store = MemoryGraphStore::new();
    seed_sample_topology(&store, POOL).await.unwrap();
    let config = AuthzConfig {
        decision_timeout: Duration::from_millis(50),
        ..config()
    };
    let service = AuthorizationService::new(store, Hanging, &config);

    let err = service
        .authorize(&token("bob"), "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyEngineUnavailable);
}

#[tokio::test]
async fn granting_ownership_on_an_ancestor_turns_deny_into_allow() {
    let f = fixture().await;
    let alice = token("alice");

    let before = f
        .service
        .authorize(&alice, "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap();
    assert!(!before.allowed);

    f.store
        .relate(&f.topology.alice, EdgeKind::Owner, &f.topology.bob_videos)
        .await
        .unwrap();

    let after = f
        .service
        .authorize(&alice, "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap();
    assert!(after.allowed);
    assert_eq!(after.determining_policy.as_deref(), Some(OWNER_ACTIONS_POLICY_ID));
}

#[tokio::test]
async fn revoking_every_ownership_edge_turns_allow_into_deny() {
    let f = fixture().await;
    let bob = token("bob");

    let before = f
        .service
        .authorize(&bob, "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap();
    assert!(before.allowed);

    // bob owns the video and its directory; dropping only one keeps access.
    let t = &f.topology;
    assert_eq!(f.store.unrelate(&t.bob, EdgeKind::Owner, &t.bob_dog_video).await, 1);
    let partial = f
        .service
        .authorize(&bob, "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap();
    assert!(partial.allowed);

    assert_eq!(f.store.unrelate(&t.bob, EdgeKind::Owner, &t.bob_videos).await, 1);
    let after = f
        .service
        .authorize(&bob, "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap();
    assert!(!after.allowed);
    assert_eq!(after.determining_policy, None);
}

#[tokio::test]
async fn root_owner_inherits_access_to_everything_below() {
    let f = fixture().await;
    let charlie = token("charlie");
    for (action, name) in [
        ("ViewVideo", "bobDogVideo.mp4"),
        ("ViewVideo", "aliceCatVideo.mp4"),
        ("ViewDirectory", "aliceVideosDirectory"),
    ] {
        let outcome = f.service.authorize(&charlie, action, name).await.unwrap();
        assert!(outcome.allowed, "charlie should reach {name}");
    }
}

#[tokio::test]
async fn repeated_checks_agree() {
    let f = fixture().await;
    let bob = token("bob");
    let first = f
        .service
        .authorize(&bob, "ViewVideo", "aliceCatVideo.mp4")
        .await
        .unwrap();
    let second = f
        .service
        .authorize(&bob, "ViewVideo", "aliceCatVideo.mp4")
        .await
        .unwrap();
    assert_eq!(first, second);
    assert!(!first.allowed);
}

#[tokio::test]
async fn public_video_is_viewable_by_non_owner() {
    let f = fixture().await;
    f.store
        .set_public(&f.topology.alice_cat_video, true)
        .await
        .unwrap();

    let outcome = f
        .service
        .authorize(&token("bob"), "ViewVideo", "aliceCatVideo.mp4")
        .await
        .unwrap();
    assert!(outcome.allowed);
    assert_eq!(outcome.determining_policy.as_deref(), Some(PUBLIC_ACTIONS_POLICY_ID));
}

#[tokio::test]
async fn branching_membership_is_malformed() {
    let f = fixture().await;
    f.store
        .relate(
            &f.topology.bob_dog_video,
            EdgeKind::MemberOf,
            &f.topology.alice_videos,
        )
        .await
        .unwrap();

    let err = f
        .service
        .authorize(&token("bob"), "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedHierarchy);
    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_action_and_missing_token_are_rejected_early() {
    let f = fixture().await;

    let err = f
        .service
        .authorize(&token("bob"), "DeleteVideo", "bobDogVideo.mp4")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownAction);

    let err = f
        .service
        .authorize("", "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);

    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreadable_token_is_unauthenticated() {
    let f = fixture().await;
    let err = f
        .service
        .authorize("not-a-jwt", "ViewVideo", "bobDogVideo.mp4")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[tokio::test]
async fn application_check_without_resource_is_denied() {
    let f = fixture().await;
    let outcome = f
        .service
        .authorize_application(&token("charlie"), "ViewDirectory")
        .await
        .unwrap();
    assert!(!outcome.allowed);
    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
}
