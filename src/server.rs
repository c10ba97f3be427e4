// ABOUTME: HTTP server assembly, shared request resources and startup tasks
// ABOUTME: Merges every route group, applies tracing and CORS layers and serves with graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{AuthManager, AuthUser};
use crate::config::ServerConfig;
use crate::database::{Database, NewUser};
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};
use crate::oidc::OidcRegistrar;
use crate::routes::{
    ActivityRoutes, AuthRoutes, HealthRoutes, OidcRoutes, ProgramRoutes, ProviderPlatformRoutes,
    UserRoutes,
};

/// Username of the account created on an empty database
pub const DEFAULT_ADMIN_USERNAME: &str = "SuperAdmin";

/// Everything a request handler needs
pub struct ServerResources {
    /// Database pool
    pub database: Database,
    /// Session tokens and password hashing
    pub auth: AuthManager,
    /// OIDC client registration
    pub oidc: OidcRegistrar,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Wire up resources from configuration and an open database
    ///
    /// # Errors
    ///
    /// Returns a config error if the outbound HTTP client cannot be built
    pub fn new(database: Database, config: ServerConfig) -> AppResult<Self> {
        let auth = AuthManager::new(&config.auth);
        let oidc = OidcRegistrar::new(&config.oidc)?;
        Ok(Self {
            database,
            auth,
            oidc,
            config: Arc::new(config),
        })
    }

    /// Resolve the caller of a request
    ///
    /// # Errors
    ///
    /// Returns 401 when credentials are missing or invalid
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthUser> {
        self.auth.authenticate(headers)
    }

    /// Resolve the caller and require the admin role
    ///
    /// # Errors
    ///
    /// Returns 401 without valid credentials and 403 for non-admins
    pub fn authenticate_admin(&self, headers: &HeaderMap) -> AppResult<AuthUser> {
        let caller = self.authenticate(headers)?;
        caller.require_admin()?;
        Ok(caller)
    }

    /// Whether session cookies get the `Secure` attribute
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        let app_url = self.config.oidc.app_url.as_str();
        if app_url.is_empty() {
            self.config.environment.is_production()
        } else {
            app_url.starts_with("https://")
        }
    }
}

/// Build the application router
#[must_use]
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let router = Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(UserRoutes::routes(Arc::clone(&resources)))
        .merge(ActivityRoutes::routes(Arc::clone(&resources)))
        .merge(ProgramRoutes::routes(Arc::clone(&resources)))
        .merge(ProviderPlatformRoutes::routes(Arc::clone(&resources)))
        .merge(OidcRoutes::routes(Arc::clone(&resources)))
        .layer(TraceLayer::new_for_http());

    match cors_layer(&resources.config.oidc.frontend_url) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// CORS for the configured frontend origin, if any
fn cors_layer(frontend_url: &str) -> Option<CorsLayer> {
    let origin = frontend_url.trim().trim_end_matches('/');
    if origin.is_empty() {
        return None;
    }
    match HeaderValue::from_str(origin) {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        ),
        Err(e) => {
            warn!("Ignoring invalid FRONTEND_URL for CORS: {e}");
            None
        }
    }
}

/// Create the bootstrap administrator when no users exist
///
/// Returns the created account, or `None` when users already exist.
///
/// # Errors
///
/// Returns an error if counting, hashing or inserting fails
pub async fn ensure_default_admin(resources: &ServerResources) -> AppResult<Option<User>> {
    if resources.database.get_user_count().await? > 0 {
        return Ok(None);
    }

    let password_hash = resources
        .auth
        .hash_password(&resources.config.auth.default_admin_password)
        .await?;
    let admin = resources
        .database
        .create_user(&NewUser {
            username: DEFAULT_ADMIN_USERNAME.to_owned(),
            name_first: "Super".to_owned(),
            name_last: "Admin".to_owned(),
            email: "admin@unlocked.local".to_owned(),
            password_hash,
            role: UserRole::Admin,
            password_reset: true,
        })
        .await?;

    warn!(
        username = DEFAULT_ADMIN_USERNAME,
        "Created default admin account, change its password at first login"
    );
    Ok(Some(admin))
}

/// Bind and serve until SIGINT or SIGTERM
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails
pub async fn run(resources: Arc<ServerResources>) -> AppResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], resources.config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!("HTTP server listening on {addr}");

    axum::serve(listener, build_router(resources))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("HTTP server error: {e}")))?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
