use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use std::{env, io, time};

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rate_alert::alert_cycle::AlertCycle;
use rate_alert::configuration::Settings;
use rate_alert::domain::{EmailAddress, Subscriber};
use rate_alert::startup::{AppContext, Application};
use rate_alert::subscriber_store::{StoreError, SubscriberStore};
use rate_alert::telemetry::{get_subscriber, init_subscriber};

/// Ensure the tracing stack is initialized only once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if env::var("TEST_LOG").is_ok() {
        init_subscriber(get_subscriber(
            subscriber_name,
            default_filter_level,
            io::stdout,
        ))
        .expect("Failed to initialize tracing");
    } else {
        init_subscriber(get_subscriber(
            subscriber_name,
            default_filter_level,
            io::sink,
        ))
        .expect("Failed to initialize tracing");
    };
});

/// Subscriber store kept in memory, failing every call while `broken` is set
#[derive(Default)]
pub struct InMemoryStore {
    emails: Mutex<Vec<EmailAddress>>,
    pub broken: AtomicBool,
}

impl InMemoryStore {
    pub fn emails(&self) -> Vec<String> {
        self.emails
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn add(&self, email: &str) {
        let email = EmailAddress::parse(email.to_string()).unwrap();
        self.emails.lock().unwrap().push(email);
    }

    pub fn break_down(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            Err(StoreError::Unexpected(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SubscriberStore for InMemoryStore {
    async fn insert(&self, email: &EmailAddress) -> Result<(), StoreError> {
        self.check()?;
        let mut emails = self.emails.lock().unwrap();
        if emails.contains(email) {
            return Err(StoreError::AlreadySubscribed(email.clone()));
        }
        emails.push(email.clone());
        Ok(())
    }

    async fn delete(&self, email: &EmailAddress) -> Result<bool, StoreError> {
        self.check()?;
        let mut emails = self.emails.lock().unwrap();
        let before = emails.len();
        emails.retain(|e| e != email);
        Ok(emails.len() < before)
    }

    async fn list_all(&self) -> Result<Vec<Subscriber>, StoreError> {
        self.check()?;
        Ok(self
            .emails
            .lock()
            .unwrap()
            .iter()
            .map(|email| Subscriber {
                email: email.clone(),
            })
            .collect())
    }
}

/// Test application data
pub struct TestApp {
    pub address: String,
    pub rate_server: MockServer,
    pub email_server: MockServer,
    pub subscribers: Arc<InMemoryStore>,
    pub cycle: Arc<AlertCycle>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spin up a test application and return its data
    pub async fn spawn() -> Self {
        // Initialize logging
        LazyLock::force(&TRACING);

        // Launch mock servers to stand in for the rate provider and SMTP2GO
        let rate_server = MockServer::start().await;
        let email_server = MockServer::start().await;

        // Get settings and modify them for testing
        let config = {
            let mut c = Settings::get_config().expect("Failed to read configuration");
            // Listen on a random TCP port
            c.application.app_port = 0;
            c.rate_source.base_url = rate_server.uri();
            c.rate_source.timeout_millis = 500;
            c.email_client.base_url = email_server.uri();
            c.email_client.template_id = Some("tmpl-test".into());
            c
        };

        // Build the application around an in-memory store and get its address
        let subscribers = Arc::new(InMemoryStore::default());
        let context = AppContext::with_store(&config, subscribers.clone())
            .expect("Failed to build service context");
        let app = Application::build(&config, &context).expect("Failed to build application");
        let address = format!("http://127.0.0.1:{}", app.port());

        // Run the application and return its data
        #[allow(clippy::let_underscore_future)]
        let _ = tokio::spawn(app.run_until_stopped());
        Self {
            address,
            rate_server,
            email_server,
            subscribers,
            cycle: context.cycle,
            api_client: reqwest::Client::new(),
        }
    }

    /// Make the rate provider quote `usd_to_mxn`
    pub async fn mount_rate(&self, usd_to_mxn: f64) {
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": {"MXN": usd_to_mxn}})),
            )
            .mount(&self.rate_server)
            .await;
    }

    /// Make the rate provider answer with an error
    pub async fn mount_failing_rate(&self) {
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&self.rate_server)
            .await;
    }

    /// Make the rate provider answer after the client has given up
    pub async fn mount_slow_rate(&self) {
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": {"MXN": 17.0}}))
                    .set_delay(time::Duration::from_secs(2)),
            )
            .mount(&self.rate_server)
            .await;
    }

    /// GET a page
    pub async fn get(&self, page: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}{page}", &self.address))
            .send()
            .await
            .expect("Failed to send request")
    }

    /// GET the landing page, extract HTML
    pub async fn get_home_html(&self) -> String {
        self.get("/").await.text().await.unwrap()
    }

    /// POST a form to the subscribe endpoint
    pub async fn post_subscribe(&self, body: &str) -> reqwest::Response {
        self.post_form("/subscribe", body).await
    }

    /// POST a form to the unsubscribe endpoint
    pub async fn post_unsubscribe(&self, body: &str) -> reqwest::Response {
        self.post_form("/unsubscribe", body).await
    }

    async fn post_form(&self, endpoint: &str, body: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}{endpoint}", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send request")
    }
}

/// SMTP2GO response for an accepted message
pub fn email_accepted() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(serde_json::json!({"data": {"succeeded": 1, "failed": 0}}))
}
