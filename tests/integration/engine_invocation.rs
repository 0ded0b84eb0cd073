//! Llamafile invocation against stub engine scripts
#![cfg(unix)]

use super::test_utils::{destination, RecordingSink};
use llamarelay::config::{ModelConfig, QueueConfig};
use llamarelay::engine::{GenerationEngine, LlamafileEngine};
use llamarelay::error::EngineError;
use llamarelay::pipeline::Pipeline;
use llamarelay::request::{Request, TextPayload};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Prints the quoted prompt, the first parameter and the argument count,
/// padded with whitespace.
const ECHO_ARGS_SCRIPT: &str = "printf '  %s|%s|%s  \\n' \"$2\" \"$3\" \"$#\"\n";

fn stub(dir: &TempDir, name: &str, body: &str) -> String {
    let path: PathBuf = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

fn params(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn test_engine_passes_quoted_prompt_params_and_silent_flag() {
    let dir = TempDir::new().unwrap();
    let script = stub(&dir, "echo_args.llamafile", ECHO_ARGS_SCRIPT);
    let engine = LlamafileEngine::default();

    let output = engine
        .generate(&script, "Q: hi", &params(&["--temp", "0"]))
        .await
        .unwrap();

    // -p, "<prompt>", --temp, 0, --silent-prompt
    assert_eq!(output, "\"Q: hi\"|--temp|5");
}

#[tokio::test]
async fn test_engine_output_is_trimmed() {
    let dir = TempDir::new().unwrap();
    let script = stub(&dir, "hello.llamafile", "printf '\\n  hello world  \\n\\n'\n");

    let output = LlamafileEngine::default()
        .generate(&script, "x", &[])
        .await
        .unwrap();
    assert_eq!(output, "hello world");
}

#[tokio::test]
async fn test_nonzero_exit_is_exit_error() {
    let dir = TempDir::new().unwrap();
    let script = stub(&dir, "broken.llamafile", "echo partial output\nexit 3\n");

    let err = LlamafileEngine::default()
        .generate(&script, "x", &params(&["-n", "8"]))
        .await
        .unwrap_err();

    match &err {
        EngineError::Exit { path, params, status } => {
            assert_eq!(path, &script);
            assert_eq!(params, &vec!["-n".to_string(), "8".to_string()]);
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("[-n 8]"));
}

#[tokio::test]
async fn test_missing_executable_without_launcher_is_spawn_error() {
    let engine = LlamafileEngine::new(None, "--silent-prompt");
    let err = engine
        .generate("/nonexistent/model.llamafile", "x", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Spawn { .. }));
}

#[tokio::test]
async fn test_direct_execution_without_launcher() {
    let engine = LlamafileEngine::new(None, "--silent-prompt");
    let output = engine.generate("/bin/echo", "hi", &[]).await.unwrap();
    assert_eq!(output, "-p \"hi\" --silent-prompt");
}

#[tokio::test]
async fn test_pipeline_replies_with_stub_output() {
    let dir = TempDir::new().unwrap();
    let script = stub(&dir, "tiny.llamafile", ECHO_ARGS_SCRIPT);
    let model = Arc::new(ModelConfig {
        name: None,
        llamafile_path: Some(script),
        llamafile_prompt_pattern: Some("<s>{{P}}</s>".to_string()),
        llamafile_prompt_placeholder: Some("{{P}}".to_string()),
        llamafile_other_parameters: params(&["-n", "16"]),
        disabled: false,
    });

    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::start(
        &QueueConfig::default(),
        Arc::new(LlamafileEngine::default()),
        sink.clone(),
    );
    pipeline
        .submitter()
        .submit(Request::new(
            model,
            TextPayload::Single("hello".to_string()),
            destination(3),
        ))
        .await
        .unwrap();
    pipeline.close().await;

    let replies = sink.replies();
    assert_eq!(replies.len(), 1);
    let (dest, text) = &replies[0];
    assert_eq!(*dest, destination(3));
    assert!(text.starts_with("<pre><code>\n\"&lt;s&gt;hello&lt;/s&gt;\"|-n|5\n</code></pre>"));
    assert!(text.contains("processed by <strong>tiny.llamafile</strong> in "));
    assert!(text.ends_with(" seconds)</em>"));
}
