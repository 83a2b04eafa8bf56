//! Process-wide SurrealDB handle.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::{info, warn};

use crate::repository::SurrealGraphStore;

/// Where the graph lives and how to sign in to it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `host:port` of the SurrealDB WebSocket endpoint.
    pub url: String,
    /// SurrealDB namespace holding the graph.
    pub namespace: String,
    /// Database within the namespace.
    pub database: String,
    /// Root user for sign-in.
    pub username: String,
    /// Root password for sign-in.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "petvideos".into(),
            database: "graph".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Opened once per process, handed to every check through
/// [`DbManager::graph`], released with [`DbManager::close`].
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Open the WebSocket connection, sign in as root and select the
    /// configured namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        let db = Surreal::new::<Ws>(config.url.as_str()).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;

        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Graph store connected"
        );
        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }

    /// Graph store sharing this connection.
    pub fn graph(&self) -> SurrealGraphStore<Client> {
        SurrealGraphStore::new(self.db.clone())
    }

    pub async fn close(self) {
        if let Err(e) = self.db.invalidate().await {
            warn!(error = %e, "Session invalidation failed during shutdown");
        }
        info!("Graph store connection released");
    }
}
