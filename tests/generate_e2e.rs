//! End-to-end test: build a request from defaults, run the full
//! submit -> poll -> download cycle against a mock service, and check the
//! artifacts land in the output directory.

use std::path::PathBuf;
use std::time::Duration;

use nova_clip::bedrock::{BedrockClient, GenerationRequest, JobOutcome, RequestOverrides};
use nova_clip::config::Settings;
use nova_clip::output::OutputDir;

use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn prompt_to_downloaded_video() {
    let server = MockServer::start().await;

    // Settings as they would come out of a fully-populated environment.
    let lookup_env = [
        ("AWS_ACCESS_KEY_ID", "AKIAE2ETEST"),
        ("AWS_SECRET_ACCESS_KEY", "e2e-secret"),
    ];
    let settings =
        Settings::from_lookup(|k| lookup_env.iter().find(|(n, _)| *n == k).map(|(_, v)| v.to_string()))
            .unwrap();

    // Defaults flow into the request untouched.
    let request = GenerationRequest::from_prompt(
        "a cat on a skateboard",
        &RequestOverrides::default(),
        &settings,
    )
    .unwrap();
    assert_eq!(request.model_id, "amazon.nova.video-1080p");
    assert_eq!(request.duration_ms, 5000);
    assert_eq!(request.quality.as_str(), "standard");

    let video_url = format!("{}/assets/video_e2e.mp4", server.uri());
    let thumb_url = format!("{}/assets/thumb_e2e.jpg", server.uri());

    // Submission: the payload carries the defaults and the derived seed.
    Mock::given(method("POST"))
        .and(path("/model/amazon.nova.video-1080p/invoke"))
        .and(body_json(serde_json::json!({
            "prompt": "a cat on a skateboard",
            "seed": request.seed,
            "duration": 5000,
            "aspectRatio": "16:9",
            "jobType": "video-generation",
            "taskType": "text-to-video",
            "imageQuality": "standard"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"jobId": "e2e-1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Polling: completed on the first check.
    Mock::given(method("POST"))
        .and(body_json(serde_json::json!({
            "jobId": "e2e-1",
            "taskType": "text-to-video"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "completed",
            "videos": [{"url": video_url}],
            "thumbnails": [{"url": thumb_url}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/assets/video_e2e.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video payload".to_vec()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/assets/thumb_e2e.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"thumb payload".to_vec()))
        .mount(&server)
        .await;

    let client = BedrockClient::with_base_url(&settings, server.uri())
        .unwrap()
        .with_wait(Duration::from_millis(10), Duration::from_secs(5));

    let result = client.submit_and_wait(&request).await.unwrap();
    assert_eq!(result.status, JobOutcome::Succeeded);
    assert_eq!(result.job_id, "e2e-1");
    let video_uri = result.video_uri.clone().unwrap();
    assert!(video_uri.ends_with("/assets/video_e2e.mp4"));

    // Download into a fresh output directory.
    let dir = tempfile::tempdir().unwrap();
    let out = OutputDir::new(PathBuf::from(dir.path()));
    out.ensure_exists().unwrap();

    let video_dest = out.video_path(request.task_type, &result.job_id);
    client.download(&video_uri, &video_dest).await.unwrap();
    assert_eq!(std::fs::read(&video_dest).unwrap(), b"video payload");
    assert!(video_dest.ends_with("video_e2e-1.mp4"));

    let thumb_dest = out.thumbnail_path(request.task_type, &result.job_id);
    client
        .download(result.thumbnail_uri.as_ref().unwrap(), &thumb_dest)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&thumb_dest).unwrap(), b"thumb payload");
}
