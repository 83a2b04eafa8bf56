//! PetVideos authorization core entry point.
//!
//! Connects to the graph store, applies migrations, optionally seeds the
//! sample topology and runs one authorization check per invocation.

mod config;
mod engine;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use petvideos_authz::{AuthorizationService, CedarDecisionEngine, HttpDecisionEngine};
use petvideos_core::models::vertex::VertexKind;
use petvideos_core::repository::GraphStore;
use petvideos_db::bootstrap::{ROOT_DIRECTORY, seed_sample_topology};
use petvideos_db::{DbManager, GraphWriter, run_migrations};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::engine::Engine;

#[derive(Parser)]
#[command(name = "petvideos")]
#[command(about = "Relationship-based authorization for PetVideos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply migrations (and seed when PETVIDEOS_SEED is set)
    Init,
    /// Decide whether the token's principal may perform an action
    Check {
        /// Identity token of the caller
        token: String,
        /// Action id, e.g. ViewVideo
        action: String,
        /// Resource name; omitted for application-level checks
        resource: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("petvideos=info".parse()?))
        .json()
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::from_env().context("load configuration")?;

    let db = DbManager::connect(&config.db)
        .await
        .context("connect to SurrealDB")?;
    let result = run(cli.command, &config, &db).await;
    db.close().await;
    result
}

async fn run(command: Commands, config: &ServerConfig, db: &DbManager) -> Result<()> {
    run_migrations(db.client())
        .await
        .context("apply migrations")?;

    let store = db.graph();
    if config.seed {
        seed(&store, &config.user_pool_id).await?;
    }

    let Commands::Check {
        token,
        action,
        resource,
    } = command
    else {
        return Ok(());
    };

    let engine = build_engine(config, &store).await?;
    info!(engine = engine.name(), "Decision engine ready");
    let service = AuthorizationService::new(store, engine, &config.authz);

    let result = match resource.as_deref() {
        Some(name) => service.authorize(&token, &action, name).await,
        None => service.authorize_application(&token, &action).await,
    };

    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(e) => {
            println!(
                "{}",
                json!({"error": format!("{:?}", e.kind()), "message": e.to_string()})
            );
            Err(e.into())
        }
    }
}

async fn seed<S: GraphStore + GraphWriter>(store: &S, user_pool_id: &str) -> Result<()> {
    if store
        .find_vertex(VertexKind::Directory, ROOT_DIRECTORY)
        .await?
        .is_some()
    {
        info!("Sample topology already present");
        return Ok(());
    }
    seed_sample_topology(store, user_pool_id)
        .await
        .context("seed sample topology")?;
    Ok(())
}

async fn build_engine<G: GraphStore>(config: &ServerConfig, store: &G) -> Result<Engine> {
    if let Some(remote) = &config.engine {
        return Ok(Engine::Remote(HttpDecisionEngine::new(remote.clone())?));
    }

    let root_name = config
        .authz
        .root_directory
        .as_deref()
        .context("the embedded engine needs PETVIDEOS_ROOT_DIRECTORY")?;
    let root = store
        .find_vertex(VertexKind::Directory, root_name)
        .await?
        .with_context(|| format!("root directory {root_name} not found; run with PETVIDEOS_SEED=1"))?;

    Ok(Engine::Embedded(CedarDecisionEngine::pet_videos(
        config.authz.policy_store_id.clone(),
        config.authz.app_namespace.clone(),
        &root.id,
    )?))
}
