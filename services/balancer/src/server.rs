//! REST + WebSocket boundary
//!
//! Serves the telemetry push endpoint, the read-only query surface, the
//! control surface, and the WebSocket push channel. Every handler is a
//! thin shim over [`Engine`]; the engine lock is held only inside the
//! engine calls, never across a response write.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use warp::http::StatusCode;
use warp::ws::Message;
use warp::{Filter, Rejection, Reply};

use config::ServiceConfig;
use types::{PushMessage, TelemetryReport};

use crate::client::ClientManager;
use crate::engine::Engine;
use crate::error::{BalancerError, Result};

/// REST/WebSocket server for one engine instance.
pub struct ApiServer {
    config: ServiceConfig,
    engine: Arc<Engine>,
    client_manager: Arc<ClientManager>,
}

impl ApiServer {
    pub fn new(config: ServiceConfig, engine: Arc<Engine>) -> Self {
        let client_manager = Arc::new(ClientManager::new(config.max_connections));
        Self {
            config,
            engine,
            client_manager,
        }
    }

    /// Bind and serve until the process exits. Also spawns the forwarder
    /// that fans engine updates out to WebSocket clients.
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| BalancerError::Configuration {
                message: format!("invalid bind address: {}", e),
            })?;

        let _forwarder = spawn_update_forwarder(self.engine.clone(), self.client_manager.clone());

        let routes = routes(self.engine.clone(), self.client_manager.clone());

        info!("API server listening on http://{}", addr);
        if self.config.enable_cors {
            let cors_routes = routes.with(warp::cors().allow_any_origin());
            warp::serve(cors_routes).run(addr).await;
        } else {
            warp::serve(routes).run(addr).await;
        }
        Ok(())
    }
}

/// Relay engine state updates onto the WebSocket broadcast.
pub fn spawn_update_forwarder(
    engine: Arc<Engine>,
    client_manager: Arc<ClientManager>,
) -> tokio::task::JoinHandle<()> {
    let mut updates = engine.subscribe();
    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => {
                    client_manager
                        .broadcast(PushMessage::StateUpdate(update))
                        .await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "push forwarder lagged behind the control loop");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AutoBody {
    enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SpeedBody {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct TopologyBody {
    topology: String,
}

#[derive(Debug, Deserialize)]
struct TrafficBody {
    pattern: String,
    intensity: Option<f64>,
}

/// Assemble the full route tree.
pub fn routes(
    engine: Arc<Engine>,
    client_manager: Arc<ClientManager>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let telemetry = warp::path!("api" / "telemetry")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_engine(engine.clone()))
        .and_then(handle_telemetry);

    let topology = warp::path!("api" / "topology")
        .and(warp::get())
        .and(with_engine(engine.clone()))
        .and_then(handle_topology);

    let controllers = warp::path!("api" / "controllers")
        .and(warp::get())
        .and(with_engine(engine.clone()))
        .and_then(handle_controllers);

    let switches = warp::path!("api" / "switches")
        .and(warp::get())
        .and(with_engine(engine.clone()))
        .and_then(handle_switches);

    let summary = warp::path!("api" / "stats" / "summary")
        .and(warp::get())
        .and(with_engine(engine.clone()))
        .and_then(handle_summary);

    let timeseries = warp::path!("api" / "stats" / "timeseries")
        .and(warp::get())
        .and(warp::query::<LimitQuery>())
        .and(with_engine(engine.clone()))
        .and_then(handle_timeseries);

    let comparison = warp::path!("api" / "stats" / "comparison")
        .and(warp::get())
        .and(with_engine(engine.clone()))
        .and_then(handle_comparison);

    let traffic_stats = warp::path!("api" / "stats" / "traffic")
        .and(warp::get())
        .and(with_engine(engine.clone()))
        .and_then(handle_traffic_stats);

    let history = warp::path!("api" / "migration" / "history")
        .and(warp::get())
        .and(warp::query::<LimitQuery>())
        .and(with_engine(engine.clone()))
        .and_then(handle_history);

    let trigger = warp::path!("api" / "migration" / "trigger")
        .and(warp::post())
        .and(with_engine(engine.clone()))
        .and_then(handle_trigger);

    let auto = warp::path!("api" / "migration" / "auto")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_engine(engine.clone()))
        .and_then(handle_auto);

    let speed = warp::path!("api" / "config" / "speed")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_engine(engine.clone()))
        .and_then(handle_speed);

    let set_topology = warp::path!("api" / "config" / "topology")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_engine(engine.clone()))
        .and_then(handle_set_topology);

    let set_traffic = warp::path!("api" / "config" / "traffic")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_engine(engine.clone()))
        .and_then(handle_set_traffic);

    let ws_route = warp::path("ws")
        .and(warp::ws())
        .and(with_engine(engine))
        .and(with_clients(client_manager))
        .map(|ws: warp::ws::Ws, engine: Arc<Engine>, clients: Arc<ClientManager>| {
            ws.on_upgrade(move |socket| handle_websocket(engine, clients, socket))
        });

    telemetry
        .or(topology)
        .or(controllers)
        .or(switches)
        .or(summary)
        .or(timeseries)
        .or(comparison)
        .or(traffic_stats)
        .or(history)
        .or(trigger)
        .or(auto)
        .or(speed)
        .or(set_topology)
        .or(set_traffic)
        .or(ws_route)
        .recover(handle_rejection)
}

fn with_engine(
    engine: Arc<Engine>,
) -> impl Filter<Extract = (Arc<Engine>,), Error = Infallible> + Clone {
    warp::any().map(move || engine.clone())
}

fn with_clients(
    clients: Arc<ClientManager>,
) -> impl Filter<Extract = (Arc<ClientManager>,), Error = Infallible> + Clone {
    warp::any().map(move || clients.clone())
}

async fn handle_telemetry(
    report: TelemetryReport,
    engine: Arc<Engine>,
) -> std::result::Result<impl Reply, Rejection> {
    let outcome = engine.ingest(&report);
    debug!(
        controller_id = %report.controller_id,
        accepted = outcome.accepted,
        dropped_stale = outcome.dropped_stale,
        dropped_unknown = outcome.dropped_unknown,
        "telemetry applied"
    );
    // Never fail the producer, even for unknown controllers
    Ok(warp::reply::json(&json!({"ok": true})))
}

async fn handle_topology(engine: Arc<Engine>) -> std::result::Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&engine.topology_view()))
}

async fn handle_controllers(engine: Arc<Engine>) -> std::result::Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&engine.controllers_view()))
}

async fn handle_switches(engine: Arc<Engine>) -> std::result::Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&engine.switches_view()))
}

async fn handle_summary(engine: Arc<Engine>) -> std::result::Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&engine.summary()))
}

async fn handle_timeseries(
    query: LimitQuery,
    engine: Arc<Engine>,
) -> std::result::Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&engine.timeseries(query.limit)))
}

async fn handle_comparison(engine: Arc<Engine>) -> std::result::Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&engine.comparison()))
}

async fn handle_traffic_stats(engine: Arc<Engine>) -> std::result::Result<impl Reply, Rejection> {
    match engine.traffic_summary() {
        Ok(summary) => Ok(reply_with_status(json!(summary), StatusCode::OK)),
        Err(e) => Ok(error_reply(&e)),
    }
}

async fn handle_history(
    query: LimitQuery,
    engine: Arc<Engine>,
) -> std::result::Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&engine.history(query.limit)))
}

async fn handle_trigger(engine: Arc<Engine>) -> std::result::Result<impl Reply, Rejection> {
    match engine.trigger_migration().await {
        Some(record) => Ok(warp::reply::json(&json!({"migration": record}))),
        None => Ok(warp::reply::json(&json!({
            "migration": null,
            "message": "no feasible migration",
        }))),
    }
}

async fn handle_auto(
    body: AutoBody,
    engine: Arc<Engine>,
) -> std::result::Result<impl Reply, Rejection> {
    let enabled = engine.set_auto(body.enabled);
    Ok(warp::reply::json(&json!({"auto_migration": enabled})))
}

async fn handle_speed(
    body: SpeedBody,
    engine: Arc<Engine>,
) -> std::result::Result<impl Reply, Rejection> {
    match engine.set_speed(body.speed) {
        Ok(interval) => Ok(reply_with_status(
            json!({"speed": body.speed, "polling_interval": interval}),
            StatusCode::OK,
        )),
        Err(e) => Ok(error_reply(&e)),
    }
}

async fn handle_set_topology(
    body: TopologyBody,
    engine: Arc<Engine>,
) -> std::result::Result<impl Reply, Rejection> {
    match engine.set_topology(&body.topology) {
        Ok(view) => Ok(reply_with_status(json!(view), StatusCode::OK)),
        Err(e) => Ok(error_reply(&e)),
    }
}

async fn handle_set_traffic(
    body: TrafficBody,
    engine: Arc<Engine>,
) -> std::result::Result<impl Reply, Rejection> {
    match engine.set_traffic(&body.pattern, body.intensity) {
        Ok(summary) => Ok(reply_with_status(json!(summary), StatusCode::OK)),
        Err(e) => Ok(error_reply(&e)),
    }
}

fn reply_with_status(value: Value, status: StatusCode) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&value), status)
}

fn error_reply(err: &BalancerError) -> warp::reply::WithStatus<warp::reply::Json> {
    let status = match err {
        BalancerError::SimulatorDisabled => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    reply_with_status(json!({"error": err.to_string()}), status)
}

/// Map rejections to the boundary's JSON error contract.
async fn handle_rejection(err: Rejection) -> std::result::Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found")
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        (StatusCode::BAD_REQUEST, "no data")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
    } else {
        (StatusCode::BAD_REQUEST, "bad request")
    };
    Ok(reply_with_status(json!({"error": message}), status))
}

/// One WebSocket connection: register with the client manager (which
/// queues the greeting ahead of any tick update), then pump outgoing push
/// messages and drain (ignore) inbound frames until either side closes.
async fn handle_websocket(
    engine: Arc<Engine>,
    client_manager: Arc<ClientManager>,
    ws: warp::ws::WebSocket,
) {
    let (client_id, mut rx) = match client_manager.register(engine.hello()).await {
        Ok(registered) => registered,
        Err(e) => {
            warn!(error = %e, "rejecting websocket connection");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws.split();

    loop {
        tokio::select! {
            outgoing = rx.recv() => {
                match outgoing {
                    Some(message) => {
                        let text = match serde_json::to_string(&message) {
                            Ok(s) => s,
                            Err(e) => {
                                warn!(error = %e, "failed to serialize push message");
                                continue;
                            }
                        };
                        if ws_sender.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            incoming = ws_receiver.next() => {
                match incoming {
                    Some(Ok(msg)) => {
                        if msg.is_close() {
                            break;
                        }
                        if msg.is_text() {
                            debug!(client_id = %client_id, "ignoring inbound websocket frame");
                        }
                    }
                    Some(Err(e)) => {
                        warn!(client_id = %client_id, error = %e, "websocket error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    client_manager.unregister(client_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::LoggingActuator;

    fn test_server() -> (Arc<Engine>, Arc<ClientManager>) {
        let mut config = ServiceConfig::default();
        config.topology = "custom".to_string();
        config.simulator.enabled = false;
        let engine = Arc::new(Engine::new(&config, Arc::new(LoggingActuator)));
        (engine, Arc::new(ClientManager::new(16)))
    }

    #[tokio::test]
    async fn telemetry_roundtrip() {
        let (engine, clients) = test_server();
        let api = routes(engine, clients);

        let resp = warp::test::request()
            .method("POST")
            .path("/api/telemetry")
            .json(&json!({
                "controller_id": "c1",
                "cpu": 5.0,
                "memory": 2.0,
                "switches": {"1": 40}
            }))
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn malformed_telemetry_is_rejected_with_no_data() {
        let (engine, clients) = test_server();
        let api = routes(engine, clients);

        let resp = warp::test::request()
            .method("POST")
            .path("/api/telemetry")
            .body("not json at all")
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["error"], "no data");
    }

    #[tokio::test]
    async fn unknown_controller_still_returns_ok() {
        let (engine, clients) = test_server();
        let api = routes(engine, clients);

        let resp = warp::test::request()
            .method("POST")
            .path("/api/telemetry")
            .json(&json!({
                "controller_id": "c999",
                "switches": {"1": 40}
            }))
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn query_surface_serves_views() {
        let (engine, clients) = test_server();
        let api = routes(engine.clone(), clients);

        for path in [
            "/api/topology",
            "/api/controllers",
            "/api/switches",
            "/api/stats/summary",
            "/api/stats/timeseries?limit=5",
            "/api/stats/comparison",
            "/api/migration/history?limit=5",
        ] {
            let resp = warp::test::request().method("GET").path(path).reply(&api).await;
            assert_eq!(resp.status(), StatusCode::OK, "path {}", path);
        }

        let resp = warp::test::request()
            .method("GET")
            .path("/api/controllers")
            .reply(&api)
            .await;
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn speed_endpoint_validates_range() {
        let (engine, clients) = test_server();
        let api = routes(engine.clone(), clients);

        let resp = warp::test::request()
            .method("POST")
            .path("/api/config/speed")
            .json(&json!({"speed": 2.0}))
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["polling_interval"], json!(0.5));

        let resp = warp::test::request()
            .method("POST")
            .path("/api/config/speed")
            .json(&json!({"speed": 99.0}))
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn topology_endpoint_rejects_unknown_names() {
        let (engine, clients) = test_server();
        let api = routes(engine, clients);

        let resp = warp::test::request()
            .method("POST")
            .path("/api/config/topology")
            .json(&json!({"topology": "arn"}))
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = warp::test::request()
            .method("POST")
            .path("/api/config/topology")
            .json(&json!({"topology": "atlantis"}))
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn trigger_reports_no_feasible_migration() {
        let (engine, clients) = test_server();
        let api = routes(engine, clients);

        let resp = warp::test::request()
            .method("POST")
            .path("/api/migration/trigger")
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert!(body["migration"].is_null());
    }

    #[tokio::test]
    async fn auto_endpoint_toggles() {
        let (engine, clients) = test_server();
        let api = routes(engine.clone(), clients);

        let resp = warp::test::request()
            .method("POST")
            .path("/api/migration/auto")
            .json(&json!({"enabled": false}))
            .reply(&api)
            .await;
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["auto_migration"], json!(false));

        // Empty body toggles
        let resp = warp::test::request()
            .method("POST")
            .path("/api/migration/auto")
            .json(&json!({}))
            .reply(&api)
            .await;
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["auto_migration"], json!(true));
    }

    #[tokio::test]
    async fn traffic_stats_404_without_simulator() {
        let (engine, clients) = test_server();
        let api = routes(engine, clients);

        let resp = warp::test::request()
            .method("GET")
            .path("/api/stats/traffic")
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
