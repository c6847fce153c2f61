//! Farm HTTP client tests against a mock farm API.

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use farmline::config::FarmConfig;
use farmline::farm::{FarmClient, HttpFarmClient, JobId, JobInfo, OutputPair, PluginInfo};
use std::path::PathBuf;

fn farm_config(url: &str) -> FarmConfig {
    FarmConfig {
        url: url.to_string(),
        api_key: "secret".to_string(),
        enabled: true,
    }
}

fn job() -> JobInfo {
    JobInfo {
        plugin: "3dsmax".to_string(),
        name: "sp010_Test - rendering".to_string(),
        batch_name: "Test".to_string(),
        priority: 52,
        pool: "render".to_string(),
        secondary_pool: None,
        group: None,
        initial_status: "Active".to_string(),
        dependencies: Vec::new(),
        outputs: vec![OutputPair {
            directory: PathBuf::from("/out/renders/sp010_Test"),
            filename: "sp010_Test.exr".to_string(),
        }],
        task_timeout_minutes: None,
        whitelist: Vec::new(),
        blacklist: Vec::new(),
    }
}

fn plugin() -> PluginInfo {
    let mut info = PluginInfo::new();
    info.set("SceneFile", "/mnt/test/scenes/sp010_Test_render.max");
    info
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_posts_job_and_plugin_info() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .and(header("X-Api-Key", "secret"))
        .and(body_partial_json(serde_json::json!({
            "JobInfo": {
                "Plugin": "3dsmax",
                "Name": "sp010_Test - rendering",
                "Priority": "52",
                "Pool": "render",
                "OutputDirectory0": "/out/renders/sp010_Test",
                "OutputFilename0": "sp010_Test.exr",
            },
            "PluginInfo": {
                "SceneFile": "/mnt/test/scenes/sp010_Test_render.max",
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "_id": "650a1b2c3d4e5f60718293a4",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpFarmClient::new(&farm_config(&server.uri()));
    let job_id = client.submit(&job(), &plugin()).await.unwrap();
    assert_eq!(job_id, JobId("650a1b2c3d4e5f60718293a4".to_string()));
}

#[tokio::test]
async fn submit_joins_dependencies_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .and(body_partial_json(serde_json::json!({
            "JobInfo": { "JobDependencies": "a1,b2" },
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "_id": "c3" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut chained = job();
    chained.dependencies = vec![JobId("a1".into()), JobId("b2".into())];

    let client = HttpFarmClient::new(&farm_config(&server.uri()));
    let job_id = client.submit(&chained, &plugin()).await.unwrap();
    assert_eq!(job_id.as_str(), "c3");
}

#[tokio::test]
async fn submit_error_status_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("queue unavailable"))
        .mount(&server)
        .await;

    let client = HttpFarmClient::new(&farm_config(&server.uri()));
    let err = client.submit(&job(), &plugin()).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Farm rejected job"));
    assert!(message.contains("queue unavailable"));
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "_id": "ok" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpFarmClient::new(&farm_config(&format!("{}/", server.uri())));
    client.submit(&job(), &plugin()).await.unwrap();
}

// ---------------------------------------------------------------------------
// Ping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_reports_a_reachable_farm() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .and(header("X-Api-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = HttpFarmClient::new(&farm_config(&server.uri()));
    assert!(client.ping().await.unwrap());
}

#[tokio::test]
async fn ping_reports_a_broken_farm() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = HttpFarmClient::new(&farm_config(&server.uri()));
    assert!(!client.ping().await.unwrap());
}
