use std::sync::Arc;
use std::{io, net, time};

use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::dev::Server;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::alert_cycle::AlertCycle;
use crate::alert_worker::AlertWorker;
use crate::configuration::{DatabaseSettings, RateLimitSettings, Settings};
use crate::routes::{
    about, contact, disclaimer, form_error_handler, healthcheck, home, menu_toggle, not_found,
    robots, subscribe, tool, unsubscribe,
};
use crate::subscriber_store::{PgSubscriberStore, SubscriberStore};

/// Application base URL
pub struct ApplicationBaseUrl(pub String);

/// Service context shared by the HTTP server and the alert worker
pub struct AppContext {
    pub cycle: Arc<AlertCycle>,
    pub subscribers: Arc<dyn SubscriberStore>,
}

impl AppContext {
    /// Build the context backed by the configured Postgres database
    pub fn build(config: &Settings) -> anyhow::Result<Self> {
        let db_pool = get_db_pool(&config.database);
        Self::with_store(config, Arc::new(PgSubscriberStore::new(db_pool)))
    }

    /// Build the context around an existing subscriber store
    pub fn with_store(
        config: &Settings,
        subscribers: Arc<dyn SubscriberStore>,
    ) -> anyhow::Result<Self> {
        let rate_source = config
            .rate_source
            .clone()
            .client(config.alert.cross_rate())?;
        let notifier = config.email_client.clone().client(&config.alert)?;
        let cycle = AlertCycle::new(
            Arc::new(rate_source),
            subscribers.clone(),
            Arc::new(notifier),
            config.alert.threshold,
        );
        Ok(Self {
            cycle: Arc::new(cycle),
            subscribers,
        })
    }

    /// Worker driving this context's alert cycle
    pub fn worker(&self, period: time::Duration) -> AlertWorker {
        AlertWorker::new(self.cycle.clone(), period)
    }
}

/// Lazily connected database pool
pub fn get_db_pool(config: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(time::Duration::from_secs(2))
        .connect_lazy_with(config.db_options())
}

/// Application
pub struct Application {
    server: Server,
    port: u16,
}

impl Application {
    /// Build an application based on settings and a service context
    pub fn build(config: &Settings, context: &AppContext) -> anyhow::Result<Self> {
        let listener = net::TcpListener::bind(format!(
            "{}:{}",
            config.application.app_host, config.application.app_port
        ))?;
        let port = listener.local_addr()?.port();
        let server = run_server(
            listener,
            context,
            config.application.base_url.clone(),
            &config.rate_limit,
        )?;
        Ok(Self { server, port })
    }

    /// Get application port
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Run application until it is stopped
    pub async fn run_until_stopped(self) -> io::Result<()> {
        self.server.await
    }
}

/// Run the HTTP server
pub fn run_server(
    listener: net::TcpListener,
    context: &AppContext,
    base_url: String,
    rate_limit: &RateLimitSettings,
) -> io::Result<Server> {
    // Share the service context with every worker thread
    let cycle = web::Data::from(context.cycle.clone());
    let subscribers: web::Data<dyn SubscriberStore> = web::Data::from(context.subscribers.clone());
    let base_url = web::Data::new(ApplicationBaseUrl(base_url));

    // Per-IP request budget shared by all worker threads
    let governor = GovernorConfigBuilder::default()
        .period(rate_limit.replenish_interval())
        .burst_size(rate_limit.max_requests.get())
        .finish()
        .ok_or_else(|| io::Error::other("Invalid rate limit settings"))?;

    // Start the HTTP server
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Governor::new(&governor))
            .wrap(security_headers())
            .wrap(TracingLogger::default())
            .route("/", web::get().to(home))
            .route("/subscribe", web::post().to(subscribe))
            .route("/unsubscribe", web::post().to(unsubscribe))
            .route("/about", web::get().to(about))
            .route("/disclaimer", web::get().to(disclaimer))
            .route("/contact", web::get().to(contact))
            .route("/tool", web::get().to(tool))
            .route("/robots.txt", web::get().to(robots))
            .route("/menu-toggle.js", web::get().to(menu_toggle))
            .route("/healthcheck", web::get().to(healthcheck))
            .default_service(web::to(not_found))
            .app_data(cycle.clone())
            .app_data(subscribers.clone())
            .app_data(base_url.clone())
            .app_data(web::FormConfig::default().error_handler(form_error_handler))
    })
    .listen(listener)?
    .run())
}

/// Hardening headers added to every response
fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "SAMEORIGIN"))
        .add(("Referrer-Policy", "no-referrer"))
        .add((
            "Content-Security-Policy",
            "default-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:",
        ))
}
