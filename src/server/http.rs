//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One shared [`AppState`]
//! carries every service; requests are stateless and safely parallel.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::achievements::{LifecycleEngine, MongoContentStore, PgReferenceStore};
use crate::auth::{AuthService, JwtValidator};
use crate::blob::{BlobStore, LocalBlobStore};
use crate::config::Args;
use crate::db::MongoClient;
use crate::directory::{PersonDirectory, PgDirectory, ScopeResolver};
use crate::reporting::ReportService;
use crate::routes;
use crate::routes::helpers::{cors_preflight, not_found, BoxBody};
use crate::types::LaurelError;
use crate::users::{PgUserStore, UserService, UserStore};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub jwt: JwtValidator,
    pub auth: AuthService,
    pub users: UserService,
    pub user_store: Arc<dyn UserStore>,
    pub engine: LifecycleEngine,
    pub directory: Arc<dyn PersonDirectory>,
    pub scopes: ScopeResolver,
    pub reports: ReportService,
    pub blobs: Arc<dyn BlobStore>,
    pub pg_pool: PgPool,
    pub mongo: MongoClient,
    pub started_at: Instant,
}

impl AppState {
    /// Wire every service to the two store connections
    pub async fn new(args: Args, pg_pool: PgPool, mongo: MongoClient) -> Result<Self, LaurelError> {
        let jwt = match &args.jwt_secret {
            Some(secret) => JwtValidator::new(secret.clone(), args.jwt_expiry_seconds)?,
            None if args.dev_mode => JwtValidator::new_dev(),
            None => {
                return Err(LaurelError::Config(
                    "JWT_SECRET is required in production mode".into(),
                ))
            }
        };

        let user_store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pg_pool.clone()));
        let directory: Arc<dyn PersonDirectory> = Arc::new(PgDirectory::new(pg_pool.clone()));
        let references = Arc::new(PgReferenceStore::new(pg_pool.clone()));
        let contents = Arc::new(MongoContentStore::new(&mongo).await?);

        let auth = AuthService::new(user_store.clone(), jwt.clone());
        let users = UserService::new(user_store.clone());
        let engine = LifecycleEngine::new(references.clone(), contents.clone(), directory.clone());
        let scopes = ScopeResolver::new(directory.clone());
        let reports = ReportService::new(references, contents, directory.clone());
        let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(
            args.uploads_dir.clone(),
            args.uploads_prefix.clone(),
        ));

        Ok(Self {
            args,
            jwt,
            auth,
            users,
            user_store,
            engine,
            directory,
            scopes,
            reports,
            blobs,
            pg_pool,
            mongo,
            started_at: Instant::now(),
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), LaurelError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Laurel listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    if method == Method::OPTIONS {
        return Ok(cors_preflight());
    }

    // Probes first: no auth, no body
    match (&method, path.as_str()) {
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => {
            return Ok(routes::health_check(state));
        }
        (&Method::GET, "/ready") | (&Method::GET, "/readyz") => {
            return Ok(routes::readiness_check(state).await);
        }
        (&Method::GET, "/version") => {
            return Ok(routes::version_info());
        }
        _ => {}
    }

    // Each area handler consumes the request and returns None for paths it
    // does not recognize.
    let response = if path.starts_with("/auth") {
        routes::handle_auth_request(req, state).await
    } else if path.starts_with("/achievements") {
        routes::handle_achievement_request(req, state).await
    } else if path.starts_with("/students") {
        routes::handle_student_request(req, state).await
    } else if path.starts_with("/lecturers") {
        routes::handle_lecturer_request(req, state).await
    } else if path.starts_with("/reports") {
        routes::handle_report_request(req, state).await
    } else if path.starts_with("/users") {
        routes::handle_user_request(req, state).await
    } else {
        None
    };

    Ok(response.unwrap_or_else(|| not_found(&path)))
}
