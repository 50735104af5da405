//! Alert delivery to WhatsApp recipients
//!
//! [`WhatsAppSender`] posts text messages to the Meta Graph API using a
//! pre-authenticated access token. [`AlertDispatcher`] fans one message out
//! to every recipient, one at a time, isolating failures per recipient.

use crate::AlertError;
use crate::config::AlertConfig;
use crate::message::AlertMessage;
use crate::models::{PhoneNumber, RecipientList};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONNECTION, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Per-send delivery policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Pause before the message is handed to the transport
    pub wait: Duration,
    /// Release the transport session once the message is sent
    pub close_after_send: bool,
}

impl SendOptions {
    #[must_use]
    pub fn from_config(config: &AlertConfig) -> Self {
        Self {
            wait: config.messenger.wait(),
            close_after_send: config.messenger.close_after_send,
        }
    }
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(15),
            close_after_send: true,
        }
    }
}

/// A transport able to deliver one text message to one phone number.
///
/// The pre-send wait is applied by [`AlertDispatcher`], not by senders.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(
        &self,
        to: &PhoneNumber,
        message: &AlertMessage,
        options: SendOptions,
    ) -> crate::Result<()>;
}

/// WhatsApp Cloud API sender
#[derive(Debug, Clone)]
pub struct WhatsAppSender {
    client: Client,
    messages_url: String,
    access_token: String,
    /// Whether idle connections are pooled between sends
    keep_alive: bool,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    msg_type: &'static str,
    text: TextContent<'a>,
}

#[derive(Debug, Serialize)]
struct TextContent<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    messages: Vec<MessageInfo>,
}

#[derive(Debug, Deserialize)]
struct MessageInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: i64,
    message: String,
}

impl WhatsAppSender {
    pub fn new(config: &AlertConfig) -> crate::Result<Self> {
        let messenger = &config.messenger;
        if messenger.access_token.is_empty() {
            return Err(AlertError::config("access_token is required"));
        }
        if messenger.phone_number_id.is_empty() {
            return Err(AlertError::config("phone_number_id is required"));
        }

        // A `Connection: close` header is dropped on HTTP/2, so closing has
        // to come from the pool itself.
        let mut builder = Client::builder().timeout(messenger.timeout());
        if messenger.close_after_send {
            builder = builder.pool_max_idle_per_host(0);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            messages_url: format!(
                "{}/{}/{}/messages",
                messenger.base_url.trim_end_matches('/'),
                messenger.api_version,
                messenger.phone_number_id
            ),
            access_token: messenger.access_token.clone(),
            keep_alive: !messenger.close_after_send,
        })
    }

    /// Whether connections outlive a send
    #[must_use]
    pub fn keeps_connections_alive(&self) -> bool {
        self.keep_alive
    }
}

#[async_trait]
impl MessageSender for WhatsAppSender {
    #[instrument(skip(self, message), fields(to = %to))]
    async fn send(
        &self,
        to: &PhoneNumber,
        message: &AlertMessage,
        options: SendOptions,
    ) -> crate::Result<()> {
        let request = SendMessageRequest {
            messaging_product: "whatsapp",
            to: to.digits(),
            msg_type: "text",
            text: TextContent {
                body: message.as_str(),
            },
        };

        debug!(
            message_len = message.as_str().len(),
            keep_alive = self.keep_alive,
            "Sending WhatsApp message"
        );

        let mut builder = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.access_token)
            .json(&request);
        if options.close_after_send {
            builder = builder.header(CONNECTION, HeaderValue::from_static("close"));
        }

        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            let body: SendMessageResponse = response.json().await.map_err(|e| {
                AlertError::delivery(format!("Unexpected send response: {e}"))
            })?;
            if let Some(info) = body.messages.first() {
                debug!(message_id = %info.id, "WhatsApp accepted message");
            }
            return Ok(());
        }

        match response.json::<ApiErrorResponse>().await {
            Ok(api_error) => Err(AlertError::delivery(format!(
                "API error {}: {}",
                api_error.error.code, api_error.error.message
            ))),
            Err(_) => Err(AlertError::delivery(format!(
                "WhatsApp API returned status {status}"
            ))),
        }
    }
}

/// Outcome of one delivery attempt
#[derive(Debug)]
pub struct DeliveryResult {
    pub recipient: PhoneNumber,
    pub outcome: crate::Result<()>,
}

impl DeliveryResult {
    #[must_use]
    pub fn delivered(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Sends one alert to every recipient in order
pub struct AlertDispatcher {
    sender: Box<dyn MessageSender>,
    options: SendOptions,
}

impl AlertDispatcher {
    pub fn new(sender: impl MessageSender + 'static, options: SendOptions) -> Self {
        Self {
            sender: Box::new(sender),
            options,
        }
    }

    /// Attempt every recipient; the result has one entry per recipient, in order
    pub async fn deliver_all(
        &self,
        message: &AlertMessage,
        recipients: &RecipientList,
    ) -> Vec<DeliveryResult> {
        let mut results = Vec::with_capacity(recipients.len());

        for recipient in recipients {
            if !self.options.wait.is_zero() {
                debug!("Waiting {:?} before sending to {}", self.options.wait, recipient);
                tokio::time::sleep(self.options.wait).await;
            }

            let outcome = self.sender.send(recipient, message, self.options).await;
            match &outcome {
                Ok(()) => info!("Weather alert sent to {}", recipient),
                Err(e) => error!("WhatsApp sending failed for {}: {}", recipient, e),
            }
            results.push(DeliveryResult {
                recipient: recipient.clone(),
                outcome,
            });
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageFormatter;
    use crate::models::{PlaceName, WeatherSnapshot};
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> AlertMessage {
        MessageFormatter::format(
            Some(&WeatherSnapshot::new(Some(24.0), 2)),
            &PlaceName::fallback(),
        )
    }

    fn no_wait() -> SendOptions {
        SendOptions {
            wait: Duration::ZERO,
            close_after_send: true,
        }
    }

    fn messenger_config(base_url: &str, close_after_send: bool) -> AlertConfig {
        let mut config = AlertConfig::default();
        config.messenger.base_url = base_url.to_string();
        config.messenger.access_token = "test_access_token".to_string();
        config.messenger.phone_number_id = "123456789".to_string();
        config.messenger.close_after_send = close_after_send;
        config
    }

    fn sender_for(server: &MockServer) -> WhatsAppSender {
        WhatsAppSender::new(&messenger_config(&server.uri(), true)).unwrap()
    }

    async fn mount_accepting(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v18.0/123456789/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{ "id": "wamid.test" }]
            })))
            .mount(server)
            .await;
    }

    /// Fails for numbers listed in `failing`, records every attempt
    struct ScriptedSender {
        failing: Vec<&'static str>,
        attempts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl MessageSender for ScriptedSender {
        async fn send(
            &self,
            to: &PhoneNumber,
            _message: &AlertMessage,
            _options: SendOptions,
        ) -> crate::Result<()> {
            self.attempts.lock().unwrap().push(to.to_string());
            if self.failing.iter().any(|number| *number == to.as_str()) {
                Err(AlertError::delivery("browser session closed"))
            } else {
                Ok(())
            }
        }
    }

    /// Records how far the paused clock had moved at every send
    struct TimedSender {
        start: tokio::time::Instant,
        offsets: Arc<Mutex<Vec<Duration>>>,
    }

    #[async_trait]
    impl MessageSender for TimedSender {
        async fn send(
            &self,
            _to: &PhoneNumber,
            _message: &AlertMessage,
            _options: SendOptions,
        ) -> crate::Result<()> {
            self.offsets.lock().unwrap().push(self.start.elapsed());
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatcher_waits_before_each_send() {
        let recipients = RecipientList::parse(&["+26879089337", "+26876897613"]).unwrap();
        let offsets: Arc<Mutex<Vec<Duration>>> = Arc::default();
        let sender = TimedSender {
            start: tokio::time::Instant::now(),
            offsets: Arc::clone(&offsets),
        };
        let dispatcher = AlertDispatcher::new(sender, SendOptions::default());

        let results = dispatcher.deliver_all(&message(), &recipients).await;
        assert!(results.iter().all(DeliveryResult::delivered));

        let offsets = offsets.lock().unwrap().clone();
        assert_eq!(offsets.len(), 2);
        assert!(offsets[0] >= Duration::from_secs(15) && offsets[0] < Duration::from_secs(16));
        assert!(offsets[1] >= Duration::from_secs(30) && offsets[1] < Duration::from_secs(31));
    }

    #[tokio::test]
    async fn test_first_failure_does_not_stop_second_delivery() {
        let recipients = RecipientList::parse(&["+26879089337", "+26876897613"]).unwrap();
        let sender = ScriptedSender {
            failing: vec!["+26879089337"],
            attempts: Arc::default(),
        };
        let dispatcher = AlertDispatcher::new(sender, no_wait());

        let results = dispatcher.deliver_all(&message(), &recipients).await;
        let summary: Vec<(&str, bool)> = results
            .iter()
            .map(|r| (r.recipient.as_str(), r.delivered()))
            .collect();

        assert_eq!(
            summary,
            vec![("+26879089337", false), ("+26876897613", true)]
        );
    }

    #[tokio::test]
    async fn test_every_recipient_attempted_when_all_fail() {
        let recipients =
            RecipientList::parse(&["+26870000001", "+26870000002", "+26870000003"]).unwrap();
        let attempts: Arc<Mutex<Vec<String>>> = Arc::default();
        let sender = ScriptedSender {
            failing: vec!["+26870000001", "+26870000002", "+26870000003"],
            attempts: Arc::clone(&attempts),
        };
        let dispatcher = AlertDispatcher::new(sender, no_wait());

        let results = dispatcher.deliver_all(&message(), &recipients).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| !r.delivered()));
        assert_eq!(
            *attempts.lock().unwrap(),
            vec!["+26870000001", "+26870000002", "+26870000003"]
        );
    }

    #[tokio::test]
    async fn test_whatsapp_sender_posts_text_message() {
        let server = MockServer::start().await;
        let message = message();
        Mock::given(method("POST"))
            .and(path("/v18.0/123456789/messages"))
            .and(header("authorization", "Bearer test_access_token"))
            .and(body_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "to": "26879089337",
                "type": "text",
                "text": { "body": message.as_str() }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "contacts": [{ "input": "26879089337", "wa_id": "26879089337" }],
                "messages": [{ "id": "wamid.HBgLMjY4NzkwODkzMzcVAgARGBI" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let to = PhoneNumber::parse("+26879089337").unwrap();
        sender_for(&server).send(&to, &message, no_wait()).await.unwrap();
    }

    #[tokio::test]
    async fn test_whatsapp_sender_reports_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "code": 131030,
                    "message": "Recipient phone number not in allowed list",
                    "type": "OAuthException"
                }
            })))
            .mount(&server)
            .await;

        let to = PhoneNumber::parse("+26879089337").unwrap();
        let err = sender_for(&server)
            .send(&to, &message(), no_wait())
            .await
            .unwrap_err();

        assert!(matches!(err, AlertError::Delivery { .. }));
        assert!(err.to_string().contains("131030"));
    }

    #[tokio::test]
    async fn test_whatsapp_sender_reports_bare_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let to = PhoneNumber::parse("+26879089337").unwrap();
        let err = sender_for(&server)
            .send(&to, &message(), no_wait())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_close_after_send_sets_connection_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("connection", "close"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{ "id": "wamid.test" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let to = PhoneNumber::parse("+26879089337").unwrap();
        sender_for(&server).send(&to, &message(), no_wait()).await.unwrap();
    }

    #[tokio::test]
    async fn test_keep_alive_omits_connection_header() {
        let server = MockServer::start().await;
        mount_accepting(&server).await;

        let sender = WhatsAppSender::new(&messenger_config(&server.uri(), false)).unwrap();
        let options = SendOptions {
            wait: Duration::ZERO,
            close_after_send: false,
        };
        let to = PhoneNumber::parse("+26879089337").unwrap();
        sender.send(&to, &message(), options).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("connection").is_none());
    }

    #[test]
    fn test_connection_pool_follows_close_after_send() {
        let closing = WhatsAppSender::new(&messenger_config("http://localhost", true)).unwrap();
        assert!(!closing.keeps_connections_alive());

        let pooled = WhatsAppSender::new(&messenger_config("http://localhost", false)).unwrap();
        assert!(pooled.keeps_connections_alive());
    }

    #[test]
    fn test_sender_requires_credentials() {
        let result = WhatsAppSender::new(&AlertConfig::default());
        assert!(matches!(result, Err(AlertError::Config { .. })));
    }

    #[test]
    fn test_send_options_follow_config() {
        let mut config = AlertConfig::default();
        config.messenger.wait_seconds = 5;
        config.messenger.close_after_send = false;

        let options = SendOptions::from_config(&config);
        assert_eq!(options.wait, Duration::from_secs(5));
        assert!(!options.close_after_send);
        assert_eq!(SendOptions::default().wait, Duration::from_secs(15));
    }
}
