/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_api::{app::{build_router, AppState}, config::Config};
/// use taskhub_shared::notify::{DisabledNotifier, NotificationDispatcher};
/// use taskhub_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let dispatcher = NotificationDispatcher::new(Arc::new(DisabledNotifier));
/// let state = AppState::new(config, Arc::new(MemoryStore::new()), None, dispatcher);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, build_router(state)).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use taskhub_shared::notify::NotificationDispatcher;
use taskhub_shared::services::{AuthSettings, Services};
use taskhub_shared::storage::{BlobStore, LocalBlobStore};
use taskhub_shared::store::Store;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Upper bound on an upload request; the 10 MB file limit is enforced by the
/// attachment service so oversize files get a proper validation error
pub const UPLOAD_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,

    /// Kept for the health check
    pub store: Arc<dyn Store>,

    /// Filesystem blob store, when attachments are enabled; serves `/files`
    pub files: Option<Arc<LocalBlobStore>>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        files: Option<Arc<LocalBlobStore>>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        let blobs = files.clone().map(|f| f as Arc<dyn BlobStore>);
        let services = Services::new(
            store.clone(),
            blobs,
            dispatcher,
            AuthSettings {
                jwt_secret: config.jwt.secret.clone(),
                token_ttl_hours: config.jwt.expires_in_hours,
            },
        );

        Self {
            services,
            store,
            files,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// ├── /files/*key                    # Signed attachment downloads (public)
/// └── /v1/
///     ├── /auth/register, /auth/login  (public)
///     ├── /auth/me
///     ├── /users, /users/:id/role
///     ├── /projects[/:id[/members|/tasks|/activities]]
///     ├── /tasks/:id[/attachments|/comments]
///     └── /comments/:id
/// ```
///
/// Everything under `/v1` except registration and login requires a bearer
/// token.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/files/*key", get(routes::files::download));

    let auth_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/users", get(routes::users::list_users))
        .route("/users/:id/role", put(routes::users::update_role))
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/projects/:id/members", post(routes::projects::add_member))
        .route(
            "/projects/:id/members/:user_id",
            axum::routing::delete(routes::projects::remove_member),
        )
        .route(
            "/projects/:id/activities",
            get(routes::activities::list_activities),
        )
        .route(
            "/projects/:id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/tasks/:id/attachments",
            post(routes::attachments::upload_attachment)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/tasks/:id/attachments/:attachment_id",
            get(routes::attachments::download_attachment)
                .delete(routes::attachments::delete_attachment),
        )
        .route(
            "/tasks/:id/comments",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .route(
            "/comments/:id",
            put(routes::comments::update_comment).delete(routes::comments::delete_comment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::require_auth,
        ));

    let v1_routes = Router::new().merge(auth_routes).merge(protected_routes);

    let mut app = Router::new().merge(public_routes).nest("/v1", v1_routes);
    if !state.config.api.production {
        app = app.layer(axum::middleware::map_response(
            crate::error::expose_internal_detail,
        ));
    }

    app.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
