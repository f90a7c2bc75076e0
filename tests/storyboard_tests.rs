//! Filesystem tests for storyboard manifest loading and validation.

use std::fs;
use std::path::PathBuf;

use nova_clip::bedrock::{
    GenerationRequest, RequestOverrides, Storyboard, ValidationError, MANIFEST_FILE,
};
use nova_clip::config::{ImageQuality, Settings};

fn settings() -> Settings {
    Settings {
        access_key_id: "AKIATESTKEY".to_string(),
        secret_access_key: "test-secret-key".to_string(),
        region: "us-east-1".to_string(),
        default_model_id: "amazon.nova.video-1080p".to_string(),
        default_duration_ms: 5000,
        default_image_quality: ImageQuality::Standard,
        output_dir: PathBuf::from("output"),
    }
}

#[test]
fn load_dir_reads_manifest() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(MANIFEST_FILE),
        r#"
[[shot]]
prompt = "A lighthouse at dawn"
duration_ms = 2000

[[shot]]
prompt = "Waves crashing against the rocks"
"#,
    )
    .unwrap();

    let storyboard = Storyboard::load_dir(dir.path()).unwrap();
    assert_eq!(storyboard.len(), 2);
    assert_eq!(storyboard.shots[0].prompt, "A lighthouse at dawn");
    assert_eq!(storyboard.shots[0].duration_ms, Some(2000));
    assert!(storyboard.shots[0].image.is_none());
    assert_eq!(storyboard.shots[1].duration_ms, None);
}

#[test]
fn load_dir_resolves_relative_image_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("01.png"), b"not really a png").unwrap();
    fs::write(
        dir.path().join(MANIFEST_FILE),
        r#"
[[shot]]
prompt = "Opening frame"
image = "01.png"
"#,
    )
    .unwrap();

    let storyboard = Storyboard::load_dir(dir.path()).unwrap();
    assert_eq!(
        storyboard.shots[0].image.as_deref(),
        Some(dir.path().join("01.png").as_path())
    );
}

#[test]
fn load_dir_without_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = Storyboard::load_dir(dir.path());
    assert!(matches!(
        result,
        Err(ValidationError::MissingManifest { .. })
    ));
}

#[test]
fn load_dir_with_empty_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(MANIFEST_FILE), "# no shots here\n").unwrap();

    let result = Storyboard::load_dir(dir.path());
    assert!(matches!(result, Err(ValidationError::EmptyStoryboard)));
}

#[test]
fn load_dir_with_blank_prompt_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(MANIFEST_FILE),
        r#"
[[shot]]
prompt = "A valid shot"

[[shot]]
prompt = "   "
"#,
    )
    .unwrap();

    let result = Storyboard::load_dir(dir.path());
    assert!(matches!(
        result,
        Err(ValidationError::BlankShotPrompt { index: 1 })
    ));
}

#[test]
fn load_dir_with_missing_image_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(MANIFEST_FILE),
        r#"
[[shot]]
prompt = "A shot whose image is gone"
image = "missing.png"
"#,
    )
    .unwrap();

    let result = Storyboard::load_dir(dir.path());
    assert!(matches!(result, Err(ValidationError::MissingImage { .. })));
}

#[test]
fn load_dir_with_malformed_toml_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(MANIFEST_FILE), "[[shot]\nprompt = ").unwrap();

    let result = Storyboard::load_dir(dir.path());
    assert!(matches!(result, Err(ValidationError::ManifestParse { .. })));
}

#[test]
fn loaded_storyboard_builds_request_with_embedded_image() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("01.png"), b"pixels").unwrap();
    fs::write(
        dir.path().join(MANIFEST_FILE),
        r#"
[[shot]]
prompt = "Opening frame"
image = "01.png"
duration_ms = 1500
"#,
    )
    .unwrap();

    let storyboard = Storyboard::load_dir(dir.path()).unwrap();
    let request = GenerationRequest::from_storyboard(
        storyboard,
        &RequestOverrides {
            seed: Some(3),
            ..Default::default()
        },
        &settings(),
    )
    .unwrap();

    let json = serde_json::to_value(request.to_payload().unwrap()).unwrap();
    let shots = json["storyboard"].as_array().unwrap();
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0]["prompt"], "Opening frame");
    assert_eq!(shots[0]["duration"], 1500);
    // "pixels" base64-encoded
    assert_eq!(shots[0]["base64EncodedImage"], "cGl4ZWxz");
}

#[test]
fn zero_shot_storyboard_never_builds_a_request() {
    let result = GenerationRequest::from_storyboard(
        Storyboard { shots: vec![] },
        &RequestOverrides::default(),
        &settings(),
    );
    assert!(matches!(result, Err(ValidationError::EmptyStoryboard)));
}
