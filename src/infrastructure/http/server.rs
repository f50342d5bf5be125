//! HTTP server implementation for reverse proxy deployment
//!
//! Wires the adapters, services and routes together. TLS termination is
//! expected to happen in front of this process.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use warp::{Filter, Reply};

use crate::application::services::{OrderOrchestrator, RequestAuthenticator, WebhookNotifier};
use crate::application::use_cases::HealthCheckUseCase;
use crate::config::AppConfig;
use crate::domain::credentials::DomainMatchPolicy;
use crate::domain::ports::{NonceLedger, PaymentGateway};
use crate::domain::signing::SessionNonceIssuer;
use crate::infrastructure::adapters::{ConfigCredentialStore, LedgerStore, PayPalGatewayAdapter, StaticProductCatalog};
use crate::infrastructure::http::routes::RouteBuilder;
use crate::shared::error::{AppError, AppResult};

/// HTTP server implementation optimized for reverse proxy deployment
pub struct HttpServer {
    config: Arc<AppConfig>,
    orchestrator: Arc<OrderOrchestrator>,
    health_use_case: Arc<HealthCheckUseCase>,
}

impl HttpServer {
    /// Create a server backed by PayPal and, when configured, Redis
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let config = Arc::new(config);

        let redis = match &config.ledger.redis_url {
            Some(url) => Some(LedgerStore::connect(url).await?),
            None => None,
        };
        let ledger = LedgerStore::new(
            redis,
            config.ledger.key.clone(),
            config.security.nonce_ceiling,
            config.security.ledger_capacity,
        );
        let restored = ledger.restore().await?;
        info!(orders = restored, "Nonce ledger ready");

        let gateway = PayPalGatewayAdapter::new(&config.paypal, config.server.public_url.clone())?;
        if !gateway.is_configured() {
            warn!("PayPal client credentials missing; create, capture and refund will fail");
        }

        Self::with_components(config, Arc::new(ledger), Arc::new(gateway))
    }

    /// Create a server around an existing ledger and payment gateway
    pub fn with_components(
        config: Arc<AppConfig>,
        ledger: Arc<dyn NonceLedger>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> AppResult<Self> {
        if config.security.testing_mode {
            error!("TESTING MODE ENABLED: checkout requests are NOT verified. Never run this in production.");
        }
        if config.security.domain_match == DomainMatchPolicy::Substring {
            warn!("Substring domain matching is enabled; any host containing a store domain is accepted");
        }

        let credentials = Arc::new(ConfigCredentialStore::from_config(&config));
        if credentials.is_empty() {
            warn!("No store credentials configured; every signed request will be rejected");
        }

        let sessions = SessionNonceIssuer::new(
            config.security.session_secret.clone(),
            config.security.session_nonce_ttl_hours,
        );
        let authenticator = Arc::new(RequestAuthenticator::new(
            credentials.clone(),
            ledger,
            sessions,
            &config.server.public_url,
            config.security.testing_mode,
        ));
        let notifier = Arc::new(WebhookNotifier::new(&config.webhook, credentials)?);
        let catalog = Arc::new(StaticProductCatalog::from_config(&config.catalog));

        let orchestrator = Arc::new(OrderOrchestrator::new(
            config.clone(),
            authenticator,
            gateway.clone(),
            notifier,
            catalog,
        ));
        let health_use_case = Arc::new(HealthCheckUseCase::new(gateway));

        Ok(Self {
            config,
            orchestrator,
            health_use_case,
        })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// All application routes, with rejections recovered
    pub fn routes(&self) -> impl Filter<Extract = impl Reply, Error = std::convert::Infallible> + Clone {
        RouteBuilder::build_routes(
            self.orchestrator.clone(),
            self.health_use_case.clone(),
            self.config.server.max_request_size,
        )
    }

    /// Run the HTTP server until the process is stopped
    #[instrument(skip(self))]
    pub async fn run(self) -> AppResult<()> {
        let addr: std::net::SocketAddr = self
            .config
            .server_address()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid server address: {}", e)))?;

        info!("Starting PayPal proxy bridge on {}", addr);
        info!("Public URL: {}", self.config.server.public_url);

        warp::serve(self.routes()).run(addr).await;

        Ok(())
    }
}
