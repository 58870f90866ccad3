use axum::{
    extract::{DefaultBodyLimit, FromRef, MatchedPath, Request},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use http::HeaderName;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::extractors::REQUEST_ID_HEADER;
use super::handlers::{self, analytics, articles, auth, categories, transactions};
use super::middleware::track_requests;
use crate::observability::HealthChecker;
use crate::repositories::{ArticleRepository, CategoryRepository, UserRepository};
use crate::services::{
    AnalyticsService, ArticleService, CategoryService, TokenIssuer, TransactionService,
    UserService,
};
use crate::storage::FileGateway;

/// Largest accepted article image.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub transactions: TransactionService,
    pub categories: CategoryService,
    pub articles: ArticleService,
    pub users: UserService,
    pub analytics: AnalyticsService,
    pub tokens: TokenIssuer,
    pub health_checker: Arc<HealthChecker>,
    pub metrics_handle: Option<PrometheusHandle>,
    pub content_routes: bool,
}

impl AppState {
    /// Wires the Postgres-backed services around `pool`.
    pub fn new(
        pool: PgPool,
        files: Arc<dyn FileGateway>,
        tokens: TokenIssuer,
        image_bucket: impl Into<String>,
    ) -> Self {
        let image_bucket = image_bucket.into();

        Self {
            transactions: TransactionService::new(pool.clone()),
            categories: CategoryService::new(Arc::new(CategoryRepository::new(pool.clone()))),
            articles: ArticleService::new(
                Arc::new(ArticleRepository::new(pool.clone())),
                files.clone(),
                image_bucket.clone(),
            ),
            users: UserService::new(Arc::new(UserRepository::new(pool.clone())), tokens.clone()),
            analytics: AnalyticsService::new(pool.clone()),
            health_checker: Arc::new(HealthChecker::new(pool.clone(), files, image_bucket)),
            tokens,
            pool,
            metrics_handle: None,
            content_routes: true,
        }
    }

    /// Adds metrics handle to the state.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Replaces the user service, e.g. to lower the bcrypt cost.
    pub fn with_user_service(mut self, users: UserService) -> Self {
        self.users = users;
        self
    }

    /// Toggles the article and category management routes.
    pub fn with_content_routes(mut self, enabled: bool) -> Self {
        self.content_routes = enabled;
        self
    }
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

fn api_routes(content_routes: bool) -> Router<AppState> {
    let router = Router::new()
        // Auth
        .route("/subject_types", get(auth::subject_types))
        .route("/registration", post(auth::register))
        .route("/login", post(auth::login))
        // Analytics
        .route(
            "/analytics/dynamics/by-period",
            post(analytics::dynamics_by_period),
        )
        .route(
            "/analytics/categories-summary",
            post(analytics::categories_summary),
        )
        // Transactions
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route("/transactions/filter", post(transactions::filter_transactions))
        .route(
            "/transactions/prepared",
            get(transactions::list_prepared).post(transactions::create_prepared),
        )
        .route(
            "/transactions/prepared/:id/confirm",
            post(transactions::confirm_prepared),
        )
        .route("/transactions/:id", delete(transactions::delete_transaction))
        .route("/trans_statuses", get(transactions::list_statuses));

    if !content_routes {
        return router.route("/categories", get(transactions::list_categories));
    }

    router
        // Categories
        .route(
            "/categories",
            get(transactions::list_categories).post(categories::create_category),
        )
        .route("/categories/search", get(categories::search_flat))
        .route(
            "/categories/:id",
            get(categories::get_category)
                .put(categories::update_category_name)
                .delete(categories::delete_category),
        )
        .route("/admin/categories", get(categories::search_paginated))
        .route("/admin/categories/:id", get(categories::get_admin_category))
        // Articles
        .route(
            "/articles",
            get(articles::search_articles).post(articles::create_article),
        )
        .route(
            "/articles/:id",
            get(articles::get_article)
                .put(articles::update_article)
                .delete(articles::delete_article),
        )
        .route(
            "/articles/:id/image",
            get(articles::download_image)
                .put(articles::upload_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route("/articles/:id/categories", put(articles::link_categories))
}

/// Creates the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());
            tracing::debug_span!("http", method = %req.method(), uri = %req.uri(), matched_path)
        })
        .on_failure(());

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check))
        // Metrics endpoint
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest("/api/v1", api_routes(state.content_routes))
        .layer(middleware::from_fn(track_requests))
        .layer(trace_layer)
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}
