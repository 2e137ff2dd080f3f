use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::DefaultBodyLimit,
        response::{IntoResponse, Json},
        routing::{get, post},
    },
    tower_http::{
        cors::{Any, CorsLayer},
        services::ServeDir,
        trace::TraceLayer,
    },
    tracing::info,
};

use {
    skillrack_config::{RegistryConfig, StorageConfig},
    skillrack_registry::{FileVersionStore, FsSkillRepository, SkillRepository, VersionStore},
};

use crate::{download_routes, skill_routes, upload_routes};

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub versions: Arc<dyn VersionStore>,
    pub skills: Arc<dyn SkillRepository>,
}

impl AppState {
    pub fn new(versions: Arc<dyn VersionStore>, skills: Arc<dyn SkillRepository>) -> Self {
        Self { versions, skills }
    }

    /// File-backed store and repository laid out as `storage` describes.
    pub fn from_storage(storage: &StorageConfig) -> Self {
        Self::new(
            Arc::new(FileVersionStore::new(storage.versions_path())),
            Arc::new(FsSkillRepository::new(
                storage.skills_path(),
                storage.hidden_prefix.clone(),
            )),
        )
    }
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the registry router (shared between production startup and tests).
pub fn build_registry_app(state: AppState, config: &RegistryConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/skills/{locale}", get(skill_routes::list_skills))
        .route(
            "/skill/{skill_name}/{version_tag}",
            get(skill_routes::skill_detail),
        )
        .route(
            "/update/{locale}/{skill_name}/{version}",
            get(skill_routes::check_update),
        )
        .route(
            "/download/{skill_name}/{version_tag}",
            get(download_routes::download),
        )
        .route(
            "/upload",
            post(upload_routes::upload).layer(DefaultBodyLimit::max(config.upload.max_bytes)),
        );

    let public_dir = config.storage.public_path();
    if public_dir.is_dir() {
        info!(path = %public_dir.display(), "serving static files");
        router = router.fallback_service(ServeDir::new(public_dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the registry HTTP server and run until it fails.
pub async fn start_server(bind: &str, port: u16, config: RegistryConfig) -> anyhow::Result<()> {
    let state = AppState::from_storage(&config.storage);

    // Creates the index file on first start.
    let index = state.versions.load().await;
    info!(
        skills = index.skills().count(),
        root = %config.storage.skills_path().display(),
        "loaded version index"
    );

    let app = build_registry_app(state, &config);

    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address {bind}:{port}: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on: http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
