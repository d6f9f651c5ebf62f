// HTTP client for the meter server's JSON API
use crate::application::telemetry_api::{ApiError, TelemetryApi};
use crate::domain::reading::Reading;
use crate::domain::relay::RelayId;
use crate::domain::statistics::{StatisticsSnapshot, StatsPeriod};
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpTelemetryApi {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct RelayCommand {
    relay: u8,
    state: bool,
}

impl HttpTelemetryApi {
    pub fn new(base_url: &str, request_timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport)?;

        let response = ensure_success(response).await?;
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ApiError::Decode(e.to_string())
            } else {
                transport(e)
            }
        })
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Server {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// The server answers errors with `{"status": "error", "message": "..."}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

#[async_trait]
impl TelemetryApi for HttpTelemetryApi {
    async fn latest(&self) -> Result<Reading, ApiError> {
        self.get_json("/latest").await
    }

    async fn statistics(&self, period: StatsPeriod) -> Result<StatisticsSnapshot, ApiError> {
        let path = format!("/stats?period={}", urlencoding::encode(period.as_str()));
        self.get_json(&path).await
    }

    async fn history(&self, hours: u32) -> Result<Vec<Reading>, ApiError> {
        self.get_json(&format!("/history?hours={}", hours)).await
    }

    async fn set_relay(&self, relay: RelayId, state: bool) -> Result<(), ApiError> {
        let command = RelayCommand {
            relay: relay.number(),
            state,
        };

        let response = self
            .client
            .post(self.url("/relay"))
            .json(&command)
            .send()
            .await
            .map_err(transport)?;

        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeServer {
        relay_posts: Arc<Mutex<Vec<Value>>>,
        history_hours: Arc<Mutex<Vec<String>>>,
    }

    fn row(ts: &str, total_power: f64, relay1: i64) -> Value {
        json!({
            "id": 1,
            "timestamp": ts,
            "voltage": 230.4,
            "current1": 1.2,
            "current2": 0.4,
            "current3": 0.0,
            "total_current": 1.6,
            "power1": 270.0,
            "power2": 90.0,
            "total_power": total_power,
            "relay1_state": relay1,
            "relay2_state": 0
        })
    }

    async fn latest() -> Json<Value> {
        Json(row("2024-05-01T12:00:00", 360.0, 1))
    }

    async fn stats(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let avg = if params.get("period").map(String::as_str) == Some("week") {
            229.5
        } else {
            231.0
        };
        Json(json!({ "avg_voltage": avg, "max_power": null, "total_readings": 12 }))
    }

    async fn history(
        State(server): State<FakeServer>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        server
            .history_hours
            .lock()
            .unwrap()
            .push(params.get("hours").cloned().unwrap_or_default());
        Json(json!([
            row("2024-05-01T11:00:00", 100.0, 0),
            row("2024-05-01T11:00:10", 110.0, 0)
        ]))
    }

    async fn relay(
        State(server): State<FakeServer>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        server.relay_posts.lock().unwrap().push(body.clone());
        match body.get("relay").and_then(Value::as_u64) {
            Some(1) | Some(2) => (StatusCode::OK, Json(json!({ "status": "success" }))),
            _ => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": "Invalid relay number" })),
            ),
        }
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    async fn meter_server() -> (String, FakeServer) {
        let server = FakeServer::default();
        let router = Router::new()
            .route("/api/latest", get(latest))
            .route("/api/stats", get(stats))
            .route("/api/history", get(history))
            .route("/api/relay", post(relay))
            .with_state(server.clone());
        (spawn(router).await, server)
    }

    #[tokio::test]
    async fn test_latest_decodes_server_row() {
        let (url, _) = meter_server().await;
        let api = HttpTelemetryApi::new(&url, None).unwrap();

        let reading = api.latest().await.unwrap();
        assert_eq!(reading.total_power, 360.0);
        assert!(reading.relay1_state);
        assert!(!reading.relay2_state);
    }

    #[tokio::test]
    async fn test_statistics_sends_period() {
        let (url, _) = meter_server().await;
        let api = HttpTelemetryApi::new(&format!("{}/", url), None).unwrap();

        let week = api.statistics(StatsPeriod::Week).await.unwrap();
        assert_eq!(week.avg_voltage, Some(229.5));
        assert_eq!(week.max_power, None);
        assert_eq!(week.total_readings, Some(12));

        let day = api.statistics(StatsPeriod::Day).await.unwrap();
        assert_eq!(day.avg_voltage, Some(231.0));
    }

    #[tokio::test]
    async fn test_history_is_ordered_and_windowed() {
        let (url, server) = meter_server().await;
        let api = HttpTelemetryApi::new(&url, None).unwrap();

        let readings = api.history(24).await.unwrap();
        assert_eq!(readings.len(), 2);
        assert!(readings[0].timestamp < readings[1].timestamp);
        assert_eq!(server.history_hours.lock().unwrap().as_slice(), &["24".to_string()]);
    }

    #[tokio::test]
    async fn test_relay_command_body() {
        let (url, server) = meter_server().await;
        let api = HttpTelemetryApi::new(&url, None).unwrap();

        api.set_relay(RelayId::Two, true).await.unwrap();
        assert_eq!(
            server.relay_posts.lock().unwrap().as_slice(),
            &[json!({ "relay": 2, "state": true })]
        );
    }

    #[tokio::test]
    async fn test_error_status_becomes_server_error() {
        let router = Router::new().route(
            "/api/latest",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "status": "no data", "message": "No readings available" })),
                )
            }),
        );
        let api = HttpTelemetryApi::new(&spawn(router).await, None).unwrap();

        assert_eq!(
            api.latest().await.unwrap_err(),
            ApiError::Server {
                status: 404,
                message: "No readings available".into()
            }
        );
    }

    #[tokio::test]
    async fn test_relay_rejection_is_an_error() {
        let router = Router::new().route(
            "/api/relay",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let api = HttpTelemetryApi::new(&spawn(router).await, None).unwrap();

        let err = api.set_relay(RelayId::One, false).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Server {
                status: 500,
                message: "boom".into()
            }
        );
    }

    #[tokio::test]
    async fn test_bad_body_is_decode_error() {
        let router = Router::new().route(
            "/api/latest",
            get(|| async { Json(json!({ "voltage": 1 })) }),
        );
        let api = HttpTelemetryApi::new(&spawn(router).await, None).unwrap();

        assert!(matches!(api.latest().await, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpTelemetryApi::new(&format!("http://{}/api", addr), None).unwrap();
        assert!(matches!(api.latest().await, Err(ApiError::Transport(_))));
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(
            error_message(r#"{"message": "Database connection failed"}"#),
            "Database connection failed"
        );
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }
}
