//! End-to-end REST tests against a server on an ephemeral port.

#![allow(clippy::panic, missing_docs)]

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::net::TcpListener;

use notify_gateway::app_state::AppState;
use notify_gateway::config::BrokerConfig;
use notify_gateway::gateway::TransportGateway;
use notify_gateway::server;
use notify_gateway::service::NotificationBroker;
use notify_gateway::transport::{Transport, WebSocketTransport};

async fn spawn_server(config: BrokerConfig) -> SocketAddr {
    let broker = NotificationBroker::new(&config);
    let transport: Arc<dyn Transport> = Arc::new(WebSocketTransport::default());
    let gateway = Arc::new(TransportGateway::start(broker.clone(), transport));
    let state = AppState::new(broker, gateway);

    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = server::serve(listener, state, std::future::pending()).await;
    });
    addr
}

async fn json_body(response: reqwest::Response) -> Value {
    let Ok(body) = response.json::<Value>().await else {
        panic!("response was not JSON");
    };
    body
}

#[tokio::test]
async fn push_then_read_history() {
    let addr = spawn_server(BrokerConfig::default()).await;
    let client = reqwest::Client::new();

    let Ok(response) = client
        .post(format!("http://{addr}/api/v1/notifications"))
        .json(&json!({"type": "INFO", "message": "Test"}))
        .send()
        .await
    else {
        panic!("push request failed");
    };
    assert_eq!(response.status().as_u16(), 201);
    let created = json_body(response).await;

    let Ok(response) = client
        .get(format!("http://{addr}/api/v1/notifications"))
        .send()
        .await
    else {
        panic!("history request failed");
    };
    let history = json_body(response).await;
    assert_eq!(history["count"], 1);
    assert_eq!(history["data"][0]["id"], created["id"]);
}

#[tokio::test]
async fn history_is_empty_without_persistence() {
    let addr = spawn_server(BrokerConfig {
        persist: false,
        ..BrokerConfig::default()
    })
    .await;
    let client = reqwest::Client::new();

    let Ok(response) = client
        .post(format!("http://{addr}/api/v1/notifications"))
        .json(&json!({"type": "SUCCESS", "message": "saved"}))
        .send()
        .await
    else {
        panic!("push request failed");
    };
    assert_eq!(response.status().as_u16(), 201);

    let Ok(response) = client
        .get(format!("http://{addr}/api/v1/notifications"))
        .send()
        .await
    else {
        panic!("history request failed");
    };
    let history = json_body(response).await;
    assert_eq!(history["count"], 0);
}

#[tokio::test]
async fn invalid_type_is_rejected() {
    let addr = spawn_server(BrokerConfig::default()).await;
    let Ok(response) = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/notifications"))
        .json(&json!({"type": "LOUD", "message": "x"}))
        .send()
        .await
    else {
        panic!("push request failed");
    };
    assert_eq!(response.status().as_u16(), 400);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "invalid notification type: LOUD");
}

#[tokio::test]
async fn health_reports_connections_and_broker() {
    let addr = spawn_server(BrokerConfig::default()).await;
    let Ok(response) = reqwest::get(format!("http://{addr}/health")).await else {
        panic!("health request failed");
    };
    assert_eq!(response.status().as_u16(), 200);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["transport"], "websocket");
    assert_eq!(body["active_connections"], 0);
    assert_eq!(body["active_rooms"], 0);
    assert_eq!(body["broker"]["subscribers"], 1);
}
