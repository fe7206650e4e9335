//! # Axum Helpers
//!
//! Shared HTTP plumbing for the catalog API.
//!
//! - **[`errors`]**: the `{code, kind, message, fields?}` error envelope and [`AppError`]
//! - **[`extractors`]**: UUID path, validated JSON and validated query extractors
//! - **[`http`]**: CORS and security headers
//! - **[`server`]**: router assembly with OpenAPI UIs, health/readiness, graceful shutdown
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//!
//! let router = create_router::<ApiDoc>(api_routes, &config.server)?;
//! let app = router.merge(health_router(app_info!()));
//! create_production_app(app, &config.server, Duration::from_secs(30), cleanup).await?;
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use errors::{AppError, ErrorCode, ErrorResponse, FieldError};
pub use extractors::{UuidPath, ValidatedJson, ValidatedQuery};
pub use server::{
    HealthCheckFuture, ShutdownCoordinator, create_production_app, create_router, health_router,
    run_health_checks, shutdown_signal,
};
