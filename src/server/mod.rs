use crate::{
    auth::{
        admin_middleware, api_key_only_middleware, auth_middleware, ApiKeyService, JwtService,
    },
    catalog::{Catalog, Gender},
    classifier::{ClassifierWithDefault, HttpClassifier, VisionClassifier},
    config::Config,
    database::Database,
    error::AppError,
    health::{DatabaseHealthChecker, HealthRegistry},
    jobs::{ExpiryWarningsJob, Job, JobScheduler, MonthlyResetJob, TokenExpiryJob},
    ledger::TokenLedger,
    metrics,
    payments::PaymentService,
    pipeline::Pipeline,
    provider::{HttpImageProvider, ImageProvider},
    rate_limit::{rate_limit_middleware, RateLimitService},
    routes::{
        create_admin_payment_routes, create_admin_user_routes, create_api_key_routes,
        create_catalog_routes, create_generate_routes, create_generation_routes,
        create_health_routes, create_interactive_routes, create_payment_routes,
        create_token_routes,
    },
    shutdown::ShutdownCoordinator,
    storage::{HttpObjectStore, ObjectStore, PresignCache},
};
use axum::{extract::DefaultBodyLimit, middleware, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// Maximum request body size (10MB)
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    pub database: Database,
    pub jwt_service: Arc<JwtService>,
    pub classifier: ClassifierWithDefault,
    pub catalog: Catalog,
    pub ledger: TokenLedger,
    pub payments: PaymentService,
    pub api_keys: ApiKeyService,
    pub pipeline: Arc<Pipeline>,
    pub rate_limiter: Arc<RateLimitService>,
    pub health: Arc<HealthRegistry>,
    pub shutdown_coordinator: Arc<ShutdownCoordinator>,
}

impl Server {
    /// Build a server with production adapters
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let database = Database::connect(&config.database.url)
            .await
            .map_err(AppError::Database)?;

        let provider: Arc<dyn ImageProvider> = Arc::new(HttpImageProvider::new(&config.provider));
        let store: Arc<dyn ObjectStore> = Arc::new(HttpObjectStore::new(&config.storage));
        let classifier: Arc<dyn VisionClassifier> = Arc::new(HttpClassifier::new(&config.classifier));

        Self::with_adapters(config, database, provider, store, classifier)
    }

    /// Build a server around injected adapters (tests use mocks here)
    pub fn with_adapters(
        config: Config,
        database: Database,
        provider: Arc<dyn ImageProvider>,
        store: Arc<dyn ObjectStore>,
        classifier: Arc<dyn VisionClassifier>,
    ) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let jwt_service = Arc::new(JwtService::new(&config.auth)?);

        let default_gender =
            Gender::parse_or(&config.classifier.default_gender, Gender::Female);
        let classifier = ClassifierWithDefault::new(
            classifier,
            config.classifier.default_category.clone(),
            default_gender,
        );

        let ledger = TokenLedger::new(database.token_balances());
        let catalog = Catalog::new(database.enhancements());
        let payments = PaymentService::new(database.payments(), ledger.clone());
        let api_keys = ApiKeyService::new(database.api_keys(), config.api_keys.clone());

        let presign_cache = Arc::new(PresignCache::new(
            config.storage.url_cache_capacity,
            config.storage.url_cache_margin_secs as i64,
        ));

        let pipeline = Arc::new(Pipeline::new(
            provider,
            store,
            classifier.clone(),
            catalog.clone(),
            ledger.clone(),
            database.generations(),
            database.users(),
            presign_cache,
            config.pipeline.clone(),
        ));

        let rate_limiter = Arc::new(RateLimitService::new(config.rate_limit.clone()));

        let mut health = HealthRegistry::new();
        health.register(Arc::new(DatabaseHealthChecker::new(database.clone())));

        Ok(Self {
            config,
            database,
            jwt_service,
            classifier,
            catalog,
            ledger,
            payments,
            api_keys,
            pipeline,
            rate_limiter,
            health: Arc::new(health),
            shutdown_coordinator: Arc::new(ShutdownCoordinator::new()),
        })
    }

    pub fn default_gender(&self) -> Gender {
        Gender::parse_or(&self.config.classifier.default_gender, Gender::Female)
    }

    /// Run migrations, start jobs, serve until shutdown
    pub async fn run(self) -> Result<(), AppError> {
        self.database.migrate().await.map_err(AppError::Database)?;

        let _metrics_handle = if self.config.metrics.enabled {
            match metrics::init_metrics(self.config.metrics.port) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    return Err(AppError::Internal(format!(
                        "Failed to start metrics server: {e}"
                    )));
                }
            }
        } else {
            None
        };

        let mut scheduler = JobScheduler::with_shutdown_coordinator(
            self.config.jobs.clone(),
            self.shutdown_coordinator.subscribe(),
        );
        let jobs: Vec<Arc<dyn Job>> = vec![
            Arc::new(TokenExpiryJob::new(self.ledger.clone())),
            Arc::new(ExpiryWarningsJob::new(
                self.ledger.clone(),
                self.config.jobs.expiry_warnings.horizon_days,
            )),
            Arc::new(MonthlyResetJob::new(self.database.users())),
        ];
        scheduler.start(jobs).await?;

        let app = self.create_app();
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind {addr}: {e}")))?;
        info!("Server listening on http://{}", addr);

        let shutdown_coordinator = self.shutdown_coordinator.clone();
        tokio::spawn(async move {
            shutdown_coordinator.wait_for_shutdown_signal().await;
        });

        let mut shutdown_rx = self.shutdown_coordinator.subscribe();
        let serve_result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            info!("Graceful shutdown initiated");
        })
        .await;

        if let Err(e) = serve_result {
            error!("Server error: {}", e);
        }

        scheduler.stop().await;
        info!("Server shutdown complete");
        Ok(())
    }

    /// Creates the application router
    pub fn create_app(&self) -> Router {
        let mut app = Router::new()
            .nest("/health", create_health_routes())
            .nest("/api", self.public_api_routes())
            .nest("/api", self.interactive_api_routes())
            .nest("/api/admin", self.admin_api_routes())
            .with_state(self.clone())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http());

        if self.config.metrics.enabled {
            app = app.layer(middleware::from_fn(metrics::metrics_middleware));
        }
        app
    }

    /// Third-party surface: API key auth only, rate limited
    fn public_api_routes(&self) -> Router<Server> {
        create_generate_routes()
            .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.clone(),
                api_key_only_middleware,
            ))
    }

    /// Interactive surface: JWT or API key auth
    fn interactive_api_routes(&self) -> Router<Server> {
        create_interactive_routes()
            .merge(create_catalog_routes())
            .merge(create_token_routes())
            .merge(create_generation_routes())
            .merge(create_payment_routes())
            .merge(create_api_key_routes())
            .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(middleware::from_fn_with_state(self.clone(), auth_middleware))
    }

    fn admin_api_routes(&self) -> Router<Server> {
        create_admin_user_routes()
            .merge(create_admin_payment_routes())
            .layer(middleware::from_fn(admin_middleware))
            .layer(middleware::from_fn_with_state(self.clone(), auth_middleware))
    }
}
