use std::sync::Arc;

use tts_tester::devices::Device;
use tts_tester::error::TesterError;
use tts_tester::tts::{SynthesisRequest, TtsService};

mod common;
use common::mock_backend::MockBackend;
use common::TestContext;

fn prefixes() -> Vec<String> {
    vec![
        "tts_models/en/".to_string(),
        "tts_models/multilingual/".to_string(),
    ]
}

fn request(ctx: &TestContext, text: &str) -> SynthesisRequest {
    SynthesisRequest {
        model: "tts_models/en/vctk/vits".into(),
        text: text.into(),
        output_path: ctx.output_path(),
        speaker: Some("p225".into()),
        language: None,
        speed: 1.0,
        device: Device::Cpu,
    }
}

#[tokio::test]
async fn test_list_models_applies_prefixes() {
    let service = TtsService::new(Arc::new(MockBackend::new()), prefixes());
    let models = service.list_available_models().await.unwrap();

    let names: Vec<&str> = models.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "tts_models/en/vctk/vits",
            "tts_models/multilingual/multi-dataset/xtts_v2"
        ]
    );
    assert!(models[0].1);
    assert!(!models[1].1);
}

#[tokio::test]
async fn test_empty_prefixes_keep_everything() {
    let service = TtsService::new(Arc::new(MockBackend::new()), Vec::new());
    assert_eq!(service.list_available_models().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_synthesis_requires_loaded_model() {
    let ctx = TestContext::new();
    let backend = Arc::new(MockBackend::new());
    let service = TtsService::new(backend.clone(), prefixes());

    let err = service
        .synthesize_text(&request(&ctx, "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, TesterError::Tts(ref msg) if msg == "No TTS model loaded"));
    assert!(backend.get_requests().is_empty());
}

#[tokio::test]
async fn test_synthesis_reports_size_and_replaces_old_output() {
    let ctx = TestContext::new();
    let backend = Arc::new(MockBackend::new());
    let service = TtsService::new(backend.clone(), prefixes());

    let info = service.load_model("tts_models/en/vctk/vits").await.unwrap();
    assert!(info.is_multi_speaker());
    assert_eq!(
        service.current_model().as_deref(),
        Some("tts_models/en/vctk/vits")
    );

    // stale output from an earlier run
    std::fs::create_dir_all(ctx.output_path().parent().unwrap()).unwrap();
    std::fs::write(ctx.output_path(), vec![1u8; 4096]).unwrap();

    let report = service
        .synthesize_text(&request(&ctx, "hello world"))
        .await
        .unwrap();
    assert!((report.file_size_mb - 1024.0 / (1024.0 * 1024.0)).abs() < 1e-9);
    assert!(report.total_time >= report.synthesis_time);
    assert_eq!(std::fs::metadata(ctx.output_path()).unwrap().len(), 1024);

    let requests = backend.get_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].speaker.as_deref(), Some("p225"));
}

#[tokio::test]
async fn test_missing_output_is_an_error() {
    let ctx = TestContext::new();
    let backend = Arc::new(MockBackend {
        skip_write: true,
        ..MockBackend::new()
    });
    let service = TtsService::new(backend, prefixes());
    service.load_model("tts_models/en/vctk/vits").await.unwrap();

    let err = service
        .synthesize_text(&request(&ctx, "hello"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "TTS engine error: Audio file was not created");
}

#[tokio::test]
async fn test_backend_failure_is_reported() {
    let ctx = TestContext::new();
    let backend = Arc::new(MockBackend::new());
    *backend.should_fail.lock().unwrap() = true;
    let service = TtsService::new(backend, prefixes());
    service.load_model("tts_models/en/vctk/vits").await.unwrap();

    let err = service
        .synthesize_text(&request(&ctx, "hello"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Mock synthesis failure"));
}

#[tokio::test]
async fn test_process_errors_keep_their_kind() {
    let ctx = TestContext::new();
    let backend = Arc::new(MockBackend {
        missing_binary: true,
        ..MockBackend::new()
    });
    let service = TtsService::new(backend, prefixes());
    service.load_model("tts_models/en/vctk/vits").await.unwrap();

    let err = service
        .synthesize_text(&request(&ctx, "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, TesterError::Process(ref msg) if msg.contains("Failed to spawn")));
}

#[tokio::test]
async fn test_unknown_model_and_cleanup() {
    let service = TtsService::new(Arc::new(MockBackend::new()), prefixes());
    assert!(service.load_model("tts_models/xx/none").await.is_err());
    assert!(service.current_model().is_none());

    service.load_model("tts_models/en/vctk/vits").await.unwrap();
    let info = service
        .get_model_info("tts_models/multilingual/multi-dataset/xtts_v2")
        .await
        .unwrap();
    assert_eq!(info.model, "tts_models/multilingual/multi-dataset/xtts_v2");
    // querying does not switch the current model
    assert_eq!(
        service.current_model().as_deref(),
        Some("tts_models/en/vctk/vits")
    );

    service.cleanup();
    assert!(service.current_model().is_none());
}
