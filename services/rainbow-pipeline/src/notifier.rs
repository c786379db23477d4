//! Push notifications for matched cities.
//!
//! Delivery is best effort: failures are logged and counted, never
//! returned to the caller.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use gazetteer::City;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Channel that receives the per-run audit message.
pub const DEBUG_CHANNEL: &str = "debug";

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Push endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

/// Message language, chosen by the city's country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Ru,
}

impl Language {
    pub fn for_country(country: &str) -> Self {
        match country.to_ascii_lowercase().as_str() {
            "ru" | "by" | "kz" | "ua" => Self::Ru,
            _ => Self::En,
        }
    }

    pub fn render(self, place: &str) -> String {
        match self {
            Self::En => format!("High chance of rainbows near {}", place),
            Self::Ru => format!("Высокая вероятность радуги в районе {}", place),
        }
    }

    /// The city name shown in this language.
    pub fn city_name(self, city: &City) -> &str {
        match self {
            Self::En => &city.name_en,
            Self::Ru => &city.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub channel: String,
    pub message: String,
}

impl PushMessage {
    pub fn for_city(city: &City) -> Self {
        let language = Language::for_country(&city.country);
        Self {
            channel: format!("city-{}", city.id),
            message: language.render(language.city_name(city)),
        }
    }

    /// Audit message listing every matched city, if there are any.
    pub fn debug_summary(cities: &[City]) -> Option<Self> {
        if cities.is_empty() {
            return None;
        }
        let names: Vec<&str> = cities.iter().map(|c| c.name_en.as_str()).collect();
        Some(Self {
            channel: DEBUG_CHANNEL.to_string(),
            message: format!("Rainbow cities: {}", names.join(", ")),
        })
    }
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn push(&self, message: &PushMessage) -> Result<(), NotifyError>;
}

/// POSTs `{channel, message}` as JSON.
pub struct HttpPushTransport {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpPushTransport {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn push(&self, message: &PushMessage) -> Result<(), NotifyError> {
        let mut request = self.client.post(&self.endpoint).json(message);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status(response.status()))
        }
    }
}

/// Logs messages instead of sending them.
pub struct LogTransport;

#[async_trait]
impl PushTransport for LogTransport {
    async fn push(&self, message: &PushMessage) -> Result<(), NotifyError> {
        info!(channel = %message.channel, message = %message.message, "Push (not delivered)");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotifyReport {
    pub sent: usize,
    pub failed: usize,
}

pub struct Notifier {
    transport: Arc<dyn PushTransport>,
    concurrency: usize,
}

impl Notifier {
    pub fn new(transport: Arc<dyn PushTransport>, concurrency: usize) -> Self {
        Self {
            transport,
            concurrency: concurrency.max(1),
        }
    }

    /// One message per distinct city, then the debug summary.
    pub async fn notify(&self, cities: &[City]) -> NotifyReport {
        let mut seen = HashSet::new();
        let unique: Vec<City> = cities
            .iter()
            .filter(|c| seen.insert(c.id.as_str()))
            .cloned()
            .collect();

        let mut messages: Vec<PushMessage> = unique.iter().map(PushMessage::for_city).collect();
        messages.extend(PushMessage::debug_summary(&unique));
        if messages.is_empty() {
            debug!("No rainbow cities, nothing to send");
            return NotifyReport::default();
        }

        let results = stream::iter(messages)
            .map(|message| {
                let transport = self.transport.clone();
                async move {
                    match transport.push(&message).await {
                        Ok(()) => {
                            debug!(channel = %message.channel, "Push sent");
                            true
                        }
                        Err(e) => {
                            warn!(channel = %message.channel, error = %e, "Push delivery failed");
                            false
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let sent = results.iter().filter(|ok| **ok).count();
        let report = NotifyReport {
            sent,
            failed: results.len() - sent,
        };
        info!(sent = report.sent, failed = report.failed, "Notifications dispatched");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::ForecastGridProjection;
    use std::sync::Mutex;

    /// Records messages; fails for channels listed in `reject`.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<PushMessage>>,
        reject: Vec<String>,
    }

    #[async_trait]
    impl PushTransport for RecordingTransport {
        async fn push(&self, message: &PushMessage) -> Result<(), NotifyError> {
            if self.reject.contains(&message.channel) {
                return Err(NotifyError::Status(reqwest::StatusCode::BAD_GATEWAY));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn city(country: &str, name: &str, name_en: &str, lat: f64, lon: f64) -> City {
        City::new(country, name, name_en, lat, lon, &ForecastGridProjection::default())
    }

    #[test]
    fn test_language_for_country() {
        assert_eq!(Language::for_country("ru"), Language::Ru);
        assert_eq!(Language::for_country("UA"), Language::Ru);
        assert_eq!(Language::for_country("nl"), Language::En);
        assert_eq!(Language::for_country(""), Language::En);
    }

    #[test]
    fn test_city_message() {
        let moscow = city("ru", "Москва", "Moscow", 55.75, 37.62);
        let msg = PushMessage::for_city(&moscow);
        assert_eq!(msg.channel, format!("city-{}", moscow.id));
        assert_eq!(msg.message, "Высокая вероятность радуги в районе Москва");

        let paris = city("fr", "Paris", "Paris", 48.87, 2.33);
        assert_eq!(
            PushMessage::for_city(&paris).message,
            "High chance of rainbows near Paris"
        );
    }

    #[test]
    fn test_debug_summary() {
        assert!(PushMessage::debug_summary(&[]).is_none());

        let cities = [
            city("ru", "Москва", "Moscow", 55.75, 37.62),
            city("fr", "Paris", "Paris", 48.87, 2.33),
        ];
        let msg = PushMessage::debug_summary(&cities).unwrap();
        assert_eq!(msg.channel, "debug");
        assert_eq!(msg.message, "Rainbow cities: Moscow, Paris");
    }

    #[test]
    fn test_payload_shape() {
        let msg = PushMessage {
            channel: "city-abc".into(),
            message: "hi".into(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            serde_json::json!({"channel": "city-abc", "message": "hi"})
        );
    }

    #[tokio::test]
    async fn test_notify_dedupes_and_adds_summary() {
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), 2);
        let moscow = city("ru", "Москва", "Moscow", 55.75, 37.62);

        let report = notifier.notify(&[moscow.clone(), moscow.clone()]).await;
        assert_eq!(report, NotifyReport { sent: 2, failed: 0 });

        let mut channels: Vec<_> = transport
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.channel.clone())
            .collect();
        channels.sort();
        assert_eq!(channels, vec![format!("city-{}", moscow.id), "debug".to_string()]);
    }

    #[tokio::test]
    async fn test_notify_nothing_for_no_cities() {
        let transport = Arc::new(RecordingTransport::default());
        let report = Notifier::new(transport.clone(), 4).notify(&[]).await;
        assert_eq!(report, NotifyReport::default());
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_raised() {
        let transport = Arc::new(RecordingTransport {
            reject: vec!["debug".to_string()],
            ..Default::default()
        });
        let cities = [
            city("ru", "Москва", "Moscow", 55.75, 37.62),
            city("fr", "Paris", "Paris", 48.87, 2.33),
        ];

        let report = Notifier::new(transport, 4).notify(&cities).await;
        assert_eq!(report, NotifyReport { sent: 2, failed: 1 });
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_softly() {
        let transport = HttpPushTransport::new("http://127.0.0.1:9/push", None).unwrap();
        let notifier = Notifier::new(Arc::new(transport), 1);
        let report = notifier
            .notify(&[city("fr", "Paris", "Paris", 48.87, 2.33)])
            .await;
        assert_eq!(report, NotifyReport { sent: 0, failed: 2 });
    }
}
