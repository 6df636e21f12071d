use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::{redirect, Client, Response};
use secrecy::Secret;
use serde::Serialize;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use weathermail::dispatch::{EmailNotificationDispatcher, InMemoryJobQueue};
use weathermail::domain::SubscriberEmail;
use weathermail::email_client::EmailClient;
use weathermail::lifecycle::SubscriptionLifecycle;
use weathermail::signed_link::LinkSigner;
use weathermail::startup;
use weathermail::storage::InMemorySubscriptionStore;
use weathermail::telemetry;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber =
            telemetry::get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        telemetry::initialize_subscriber(subscriber);
    } else {
        let subscriber =
            telemetry::get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        telemetry::initialize_subscriber(subscriber);
    };
});

pub struct App {
    pub address: SocketAddr,
    pub client: Client,
    pub email_server: MockServer,
    pub store: Arc<InMemorySubscriptionStore>,
    pub jobs: Arc<InMemoryJobQueue>,
    pub signer: LinkSigner,
}

impl App {
    pub async fn new() -> Self {
        Lazy::force(&TRACING);

        // configure listener
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to start a test application");
        let address = listener.local_addr().unwrap();

        // run email server
        let email_server = MockServer::start().await;

        // wire the lifecycle against in-memory collaborators
        let store = Arc::new(InMemorySubscriptionStore::new());
        let jobs = Arc::new(InMemoryJobQueue::new());
        let sender = SubscriberEmail::parse("weather@example.com".to_string()).unwrap();
        let email_client = EmailClient::new(
            email_server.uri(),
            sender,
            Secret::new("test-token".to_string()),
            Duration::from_millis(200),
        );
        let dispatcher = Arc::new(EmailNotificationDispatcher::new(email_client, jobs.clone()));
        let signer = LinkSigner::new(&Secret::new("test-signing-secret".to_string())).unwrap();
        let lifecycle = SubscriptionLifecycle::new(
            store.clone(),
            dispatcher,
            signer.clone(),
            format!("http://{}", address),
        );

        // start a server
        tokio::spawn(startup::run(listener, lifecycle));

        // redirects are followed manually so tests can see the 303s; the
        // cookie store carries flash messages across requests
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .cookie_store(true)
            .build()
            .unwrap();

        App {
            address,
            client,
            email_server,
            store,
            jobs,
            signer,
        }
    }

    pub async fn mount_email_mock(&self) {
        Mock::given(path("/email"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.email_server)
            .await;
    }
}

impl App {
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("http://{}{}", self.address, path))
            .send()
            .await
            .unwrap()
    }

    pub async fn get_url(&self, url: reqwest::Url) -> Response {
        self.client.get(url).send().await.unwrap()
    }

    pub async fn post_subscribe<T: Serialize + ?Sized>(&self, parameter: &T) -> Response {
        self.client
            .post(format!("http://{}/subscribe", self.address))
            .form(parameter)
            .send()
            .await
            .unwrap()
    }

    /// Fetches the subscription form, consuming any pending flash.
    pub async fn subscribe_page_html(&self) -> String {
        self.get("/subscribe").await.text().await.unwrap()
    }

    /// Fetches the landing page, consuming any pending flash.
    pub async fn home_page_html(&self) -> String {
        self.get("/").await.text().await.unwrap()
    }
}

pub struct ConfirmationLinks {
    pub in_html: reqwest::Url,
    pub in_text: reqwest::Url,
}

impl App {
    pub fn get_confirmation_links(&self, email_request: &wiremock::Request) -> ConfirmationLinks {
        let body: serde_json::Value = serde_json::from_slice(&email_request.body).unwrap();

        let get_link = |s: &str| {
            let links: Vec<_> = linkify::LinkFinder::new()
                .links(s)
                .filter(|l| *l.kind() == linkify::LinkKind::Url)
                .collect();
            assert_eq!(links.len(), 1);
            links[0].as_str().to_owned()
        };

        let link_in_html = &get_link(body["HtmlBody"].as_str().unwrap());
        let link_in_text = &get_link(body["TextBody"].as_str().unwrap());

        ConfirmationLinks {
            in_html: reqwest::Url::parse(link_in_html).unwrap(),
            in_text: reqwest::Url::parse(link_in_text).unwrap(),
        }
    }

    pub async fn last_confirmation_links(&self) -> ConfirmationLinks {
        let email_request = self
            .email_server
            .received_requests()
            .await
            .unwrap()
            .pop()
            .expect("No confirmation email was sent");
        self.get_confirmation_links(&email_request)
    }
}
