use async_trait::async_trait;
use reqwest::Client;
use subwatch_core::{Config, CoreError, NotificationError, Notifier};
use tracing::{debug, error, info};
use url::{form_urlencoded, Url};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub token: String,
    pub chat_id: String,
}

impl From<&Config> for TelegramOptions {
    fn from(config: &Config) -> Self {
        Self {
            token: config.telegram_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
        }
    }
}

/// Delivers post notifications through the Bot API `sendMessage` call.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http_client: Client,
    options: TelegramOptions,
    base_url: String,
}

impl TelegramNotifier {
    pub fn new(config: &Config) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self::with_http_client(http_client, TelegramOptions::from(config)))
    }

    pub fn with_http_client(http_client: Client, options: TelegramOptions) -> Self {
        Self {
            http_client,
            options,
            base_url: TELEGRAM_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The `sendMessage` URL for `text`. Contains the bot token; never log it.
    fn send_message_url(&self, text: &str) -> Result<Url, CoreError> {
        let raw = format!(
            "{}/bot{}/sendMessage?chat_id={}&text={}",
            self.base_url,
            self.options.token,
            encode(&self.options.chat_id),
            encode(text)
        );
        Url::parse(&raw).map_err(|e| {
            error!("Could not build sendMessage request: {}", e);
            CoreError::Notification(NotificationError::InvalidRequest {
                endpoint: "sendMessage".to_string(),
            })
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, title: &str, link: &str) -> Result<(), CoreError> {
        let url = self.send_message_url(&format_message(title, link))?;

        let response = self.http_client.get(url).send().await.map_err(|e| {
            let e = e.without_url();
            error!("Could not send telegram message: {}", e);
            CoreError::Network(e)
        })?;

        let status = response.status();
        if status.is_success() {
            debug!("Telegram accepted message for '{}'", title);
            return Ok(());
        }

        error!("Telegram rejected message with status {}", status);
        match response.text().await {
            Ok(body) => info!("Telegram response body: {}", body),
            Err(e) => error!("Could not read Telegram response body: {}", e.without_url()),
        }

        Err(CoreError::Notification(NotificationError::DeliveryFailed {
            status_code: status.as_u16(),
        }))
    }
}

/// Title and link separated by a blank line, with a leading newline.
pub fn format_message(title: &str, link: &str) -> String {
    format!("\n{}\n\n{}", title, link)
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one HTTP response and hand back the raw request head.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn test_notifier(base_url: &str) -> TelegramNotifier {
        let http_client = Client::builder().no_proxy().build().unwrap();
        let options = TelegramOptions {
            token: "123:abc".to_string(),
            chat_id: "-10042".to_string(),
        };
        TelegramNotifier::with_http_client(http_client, options).with_base_url(base_url)
    }

    #[test]
    fn test_format_message() {
        assert_eq!(
            format_message("RTX sale", "http://x/1"),
            "\nRTX sale\n\nhttp://x/1"
        );
    }

    #[test]
    fn test_send_message_url_encodes_text() {
        let notifier = test_notifier("https://api.telegram.org");
        let url = notifier
            .send_message_url(&format_message("50% off & free", "http://x/1?a=b"))
            .unwrap();

        assert_eq!(url.path(), "/bot123:abc/sendMessage");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("chat_id".to_string(), "-10042".to_string()),
                (
                    "text".to_string(),
                    "\n50% off & free\n\nhttp://x/1?a=b".to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_send_success() {
        let (base_url, server) = serve_once("200 OK", r#"{"ok":true}"#).await;
        let notifier = test_notifier(&base_url);

        notifier.send("RTX sale", "http://x/1").await.unwrap();

        let request_head = server.await.unwrap();
        assert!(request_head.starts_with("GET /bot123:abc/sendMessage?chat_id=-10042&text="));
        assert!(request_head.contains("RTX+sale"));
        assert!(request_head.contains("http%3A%2F%2Fx%2F1"));
    }

    #[tokio::test]
    async fn test_send_non_success_is_delivery_failure() {
        let (base_url, _server) = serve_once(
            "500 Internal Server Error",
            r#"{"ok":false,"description":"boom"}"#,
        )
        .await;
        let notifier = test_notifier(&base_url);

        let result = notifier.send("RTX sale", "http://x/1").await;
        assert!(matches!(
            result,
            Err(CoreError::Notification(NotificationError::DeliveryFailed {
                status_code: 500
            }))
        ));
    }

    #[tokio::test]
    async fn test_redirect_status_is_not_success() {
        let (base_url, _server) = serve_once("304 Not Modified", "").await;
        let notifier = test_notifier(&base_url);

        let result = notifier.send("RTX sale", "http://x/1").await;
        assert!(matches!(
            result,
            Err(CoreError::Notification(NotificationError::DeliveryFailed {
                status_code: 304
            }))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_is_returned_directly() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = test_notifier(&format!("http://{}", addr));
        let result = notifier.send("RTX sale", "http://x/1").await;
        assert!(matches!(result, Err(CoreError::Network(_))));
    }
}
