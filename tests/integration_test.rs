use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use aura_dashboard::{routes, Config, Dashboard};
use axum::{http::StatusCode, routing::get, Router};
use reqwest::Client;
use serde_json::Value;

const SNAPSHOT_CSV: &str = "humidity,rainfall,temperature,waterLevel,timestamp
60.0,22.0,27.5,100.0,2025-01-10 09:00:00
61.0,24.0,27.4,,2025-01-10 08:00:00
62.0,26.0,27.2,120.0,2025-01-10 10:00:00
broken,row
";

const PREDICTION_JSON: &str = r#"{
    "timestamp": "2025-01-10 10:00:00",
    "prediction": 1,
    "probability": 0.82,
    "model_used": "Decision Tree",
    "model_accuracy": 0.94,
    "input_data": {"rainfall": 26.0, "humidity": 62.0, "temperature": 27.2, "water_level": 120.0}
}"#;

const PHOTOS_JSON: &str = r#"[
    {"id": "p1", "url": "detected_waste_photos/p1.jpg", "date": "2025-01-10", "time": "08:15:00", "original_name": "a.jpg"},
    {"id": "p2", "url": "detected_waste_photos/p2.jpg", "date": "2025-01-10", "time": "09:30:00", "original_name": "b.jpg"}
]"#;

// ---

async fn serve(app: Router) -> Result<SocketAddr> {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}

/// Start the dashboard against an upstream and return its base URL.
async fn start_dashboard(upstream: Router) -> Result<(Dashboard, String)> {
    // ---
    let upstream_addr = serve(upstream).await?;
    let config = Config::with_base_url(format!("http://{upstream_addr}/aura/"));
    let dashboard = Dashboard::start(config)?;
    let app_addr = serve(routes::router(dashboard.state())).await?;
    Ok((dashboard, format!("http://{app_addr}")))
}

/// Poll `/api/{panel}` until it stops loading, failing if it never does.
async fn settled_panel(client: &Client, base: &str, panel: &str) -> Result<Value> {
    // ---
    for _ in 0..100 {
        let body: Value = client
            .get(format!("{base}/api/{panel}"))
            .send()
            .await?
            .json()
            .await?;
        if body["loading"] == false {
            return Ok(body);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    anyhow::bail!("{panel} panel never finished loading")
}

/// Wait for the snapshot and prediction panels to load, then fetch
/// `/api/analytics`.
async fn settled_analytics(client: &Client, base: &str) -> Result<Value> {
    // ---
    settled_panel(client, base, "readings").await?;
    settled_panel(client, base, "prediction").await?;

    let view = client
        .get(format!("{base}/api/analytics"))
        .send()
        .await?
        .json()
        .await?;
    Ok(view)
}

#[tokio::test]
async fn analytics_reflects_published_artifacts() -> Result<()> {
    // ---
    let upstream = Router::new()
        .route("/aura/sensor_data.csv", get(|| async { SNAPSHOT_CSV }))
        .route("/aura/latest_flood_risk.json", get(|| async { PREDICTION_JSON }))
        .route("/aura/detected_waste_photos/photos.json", get(|| async { PHOTOS_JSON }))
        .route(
            "/aura/detected_waste_photos/waste_history.json",
            get(|| async { PHOTOS_JSON }),
        );
    let (dashboard, base) = start_dashboard(upstream).await?;
    let client = Client::new();

    let view = settled_analytics(&client, &base).await?;

    assert_eq!(view["status"], "ready");
    assert_eq!(view["reading_count"], 3);

    // Latest row: water 120 (+30), rain 26 (+25), humidity 62 (+0)
    assert_eq!(view["risk"]["level"], "High");
    assert_eq!(view["risk"]["score"], 55);

    let water = &view["charts"][0];
    assert_eq!(water["metric"], "waterLevel");
    // Sorted by timestamp; the 08:00 row has no water level and stays a gap
    assert!(water["points"][0]["value"].is_null());
    assert_eq!(water["points"][1]["value"], 100.0);
    assert_eq!(water["points"][2]["value"], 120.0);

    let summary = view["summary"]["text"].as_str().unwrap_or_default();
    assert!(summary.starts_with("Latest reading: water level 120.0 cm"));
    assert_eq!(view["summary"]["implication"], "elevated_flood_risk");

    assert_eq!(view["prediction"]["data"]["model_used"], "Decision Tree");

    let readings: Value = client.get(format!("{base}/api/readings")).send().await?.json().await?;
    assert_eq!(readings["data"].as_array().map(Vec::len), Some(3));
    assert!(readings["error"].is_null());

    let gallery = settled_panel(&client, &base, "gallery").await?;
    assert_eq!(gallery["data"]["total"], 2);
    assert_eq!(gallery["data"]["recent"][0]["id"], "p2");
    assert_eq!(gallery["data"]["hourly_counts"][8], 1);
    assert_eq!(gallery["data"]["daily_counts"]["2025-01-10"], 2);

    let export = client.get(format!("{base}/api/export")).send().await?;
    assert_eq!(export.status(), reqwest::StatusCode::OK);
    assert_eq!(
        export.headers()["content-type"].to_str()?,
        "application/zip"
    );
    assert!(export.bytes().await?.starts_with(b"PK"));

    dashboard.shutdown();
    Ok(())
}

#[tokio::test]
async fn missing_artifacts_mean_waiting_not_error() -> Result<()> {
    // ---
    let (dashboard, base) = start_dashboard(Router::new()).await?;
    let client = Client::new();

    let view = settled_analytics(&client, &base).await?;

    assert_eq!(view["status"], "waiting");
    assert_eq!(view["risk"]["level"], "Unknown");
    assert_eq!(view["risk"]["message"], "Waiting for live sensor readings...");
    assert!(view["errors"].as_array().is_some_and(|e| e.is_empty()));
    assert!(view["prediction"]["data"].is_null());
    assert!(view["prediction"]["error"].is_null());

    dashboard.shutdown();
    Ok(())
}

#[tokio::test]
async fn transport_failure_is_scoped_to_its_panel() -> Result<()> {
    // ---
    let upstream = Router::new()
        .route(
            "/aura/sensor_data.csv",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "oops") }),
        )
        .route("/aura/latest_flood_risk.json", get(|| async { PREDICTION_JSON }));
    let (dashboard, base) = start_dashboard(upstream).await?;
    let client = Client::new();

    let view = settled_analytics(&client, &base).await?;

    assert_eq!(view["status"], "error");
    assert_eq!(view["errors"].as_array().map(Vec::len), Some(1));
    // The prediction panel is unaffected
    assert!(view["prediction"]["error"].is_null());
    assert_eq!(view["prediction"]["data"]["prediction"], 1);

    let health: Value = client.get(format!("{base}/health")).send().await?.json().await?;
    assert_eq!(health["status"], "ok");

    dashboard.shutdown();
    Ok(())
}
