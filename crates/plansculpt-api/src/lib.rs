//! HTTP API for Plansculpt
//!
//! Axum router over [`plansculpt_core::Store`]. Everything under `/api`
//! except health, registration and login requires a session token in the
//! `Authorization: Bearer` header.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use plansculpt_auth::JwtValidator;
use plansculpt_core::Store;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

pub use error::{ApiError, ApiResult};

/// Application state shared across handlers
pub struct AppState {
    pub store: Store,
    /// HMAC secret used to sign session tokens
    pub jwt_secret: String,
    pub validator: JwtValidator,
}

impl AppState {
    pub fn new(store: Store, jwt_secret: impl Into<String>) -> Self {
        let jwt_secret = jwt_secret.into();
        Self {
            validator: JwtValidator::new(jwt_secret.as_bytes()),
            store,
            jwt_secret,
        }
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Plansculpt API",
        version = "0.1.0",
        description = "REST API for employees, projects, tasks, invoices, transactions and payroll"
    ),
    paths(
        handlers::health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::employees::list_employees,
        handlers::employees::create_employee,
        handlers::employees::get_employee,
        handlers::employees::update_employee,
        handlers::employees::delete_employee,
        handlers::employees::employee_earnings,
        handlers::projects::list_projects,
        handlers::projects::create_project,
        handlers::projects::get_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::tasks::list_tasks,
        handlers::tasks::create_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task,
        handlers::tasks::pay_task,
        handlers::invoices::list_invoices,
        handlers::invoices::create_invoice,
        handlers::invoices::get_invoice,
        handlers::invoices::update_invoice,
        handlers::invoices::delete_invoice,
        handlers::transactions::list_transactions,
        handlers::transactions::create_transactions,
        handlers::transactions::delete_transaction,
        handlers::finance::dashboard,
        handlers::finance::statement,
        handlers::finance::payroll_status,
        handlers::finance::run_payroll,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::delete_user,
        handlers::users::reset_password,
        handlers::users::change_role,
        handlers::users::user_activity,
    ),
    components(
        schemas(
            models::HealthResponse,
            models::ErrorResponse,
            models::User,
            models::LoginRequest,
            models::AuthResponse,
            models::PasswordResetRequest,
            models::RoleChangeRequest,
            models::ActivityEntry,
            models::Employee,
            models::Project,
            models::Rollup,
            models::Task,
            models::Transaction,
            models::TransactionPayload,
            models::TransactionCreated,
            models::LineItem,
            models::Invoice,
            models::Dashboard,
            models::PayrollRunRequest,
            plansculpt_core::UserInput,
            plansculpt_core::EmployeeInput,
            plansculpt_core::ProjectInput,
            plansculpt_core::TaskInput,
            plansculpt_core::InvoiceInput,
            plansculpt_core::LineItemInput,
            plansculpt_core::TransactionInput,
            plansculpt_core::EmployeeEarnings,
            plansculpt_core::Statement,
            plansculpt_core::StatementRow,
            plansculpt_core::PayrollReport,
            plansculpt_core::PayrollFailure,
            plansculpt_core::PayrollStatus,
            plansculpt_core::PayrollMonthStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and the current account"),
        (name = "employees", description = "Employee records"),
        (name = "projects", description = "Projects and their budget rollups"),
        (name = "tasks", description = "Project tasks and task payment"),
        (name = "invoices", description = "Invoices and payment linkage"),
        (name = "transactions", description = "Income and expense ledger"),
        (name = "finance", description = "Dashboard and statements"),
        (name = "payroll", description = "Monthly salary runs"),
        (name = "users", description = "User administration"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for a browser frontend on another origin)
    pub enable_cors: bool,
    /// Allowed CORS origins (if None, allows all)
    pub cors_origins: Option<Vec<String>>,
    /// JWT secret for signing session tokens
    pub jwt_secret: String,
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, store: Store) -> Self {
        let state = Arc::new(AppState::new(store, config.jwt_secret.clone()));
        Self { config, state }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        // Build PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route("/api/auth/register", post(handlers::auth::register))
            .route("/api/auth/login", post(handlers::auth::login))
            .with_state(self.state.clone());

        // Build PROTECTED routes (require a session token)
        let protected_router = Router::new()
            .route("/api/auth/me", get(handlers::auth::me))
            .route(
                "/api/employees",
                get(handlers::employees::list_employees).post(handlers::employees::create_employee),
            )
            .route(
                "/api/employees/{id}",
                get(handlers::employees::get_employee)
                    .put(handlers::employees::update_employee)
                    .delete(handlers::employees::delete_employee),
            )
            .route(
                "/api/employees/{id}/earnings",
                get(handlers::employees::employee_earnings),
            )
            .route(
                "/api/projects",
                get(handlers::projects::list_projects).post(handlers::projects::create_project),
            )
            .route(
                "/api/projects/{id}",
                get(handlers::projects::get_project)
                    .put(handlers::projects::update_project)
                    .delete(handlers::projects::delete_project),
            )
            .route(
                "/api/tasks",
                get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
            )
            .route(
                "/api/tasks/{id}",
                put(handlers::tasks::update_task).delete(handlers::tasks::delete_task),
            )
            .route("/api/tasks/{id}/pay", post(handlers::tasks::pay_task))
            .route(
                "/api/invoices",
                get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice),
            )
            .route(
                "/api/invoices/{id}",
                get(handlers::invoices::get_invoice)
                    .put(handlers::invoices::update_invoice)
                    .delete(handlers::invoices::delete_invoice),
            )
            .route(
                "/api/transactions",
                get(handlers::transactions::list_transactions)
                    .post(handlers::transactions::create_transactions),
            )
            .route(
                "/api/transactions/{id}",
                delete(handlers::transactions::delete_transaction),
            )
            .route("/api/finance/dashboard", get(handlers::finance::dashboard))
            .route("/api/finance/statement", get(handlers::finance::statement))
            .route("/api/payroll/run", post(handlers::finance::run_payroll))
            .route(
                "/api/payroll/{year}/{month}",
                get(handlers::finance::payroll_status),
            )
            .route(
                "/api/users",
                get(handlers::users::list_users).post(handlers::users::create_user),
            )
            .route("/api/users/{id}", delete(handlers::users::delete_user))
            .route(
                "/api/users/{id}/password",
                put(handlers::users::reset_password),
            )
            .route("/api/users/{id}/role", put(handlers::users::change_role))
            .route(
                "/api/users/{id}/activity",
                get(handlers::users::user_activity),
            )
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                self.state.clone(),
                middleware::require_auth,
            ));

        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(public_router)
            .merge(protected_router);

        let mut router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(self.cors_layer());
        }

        router
    }

    fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        match &self.config.cors_origins {
            Some(origins) => {
                let origins: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|origin| match HeaderValue::from_str(origin) {
                        Ok(value) => Some(value),
                        Err(_) => {
                            warn!("Ignoring invalid CORS origin: {}", origin);
                            None
                        }
                    })
                    .collect();
                layer.allow_origin(AllowOrigin::list(origins))
            }
            None => layer.allow_origin(Any),
        }
    }

    /// Serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        info!("API server stopped");
        Ok(())
    }
}
