//! Ordering, exclusivity and back-pressure of the request pipeline

use super::test_utils::{destination, model, GatedEngine, RecordingSink, TrackingEngine};
use llamarelay::config::{ModelConfig, QueueConfig};
use llamarelay::pipeline::{Pipeline, Submitter};
use llamarelay::request::{Request, TextPayload};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn request(model: Arc<ModelConfig>, text: &str, message_id: i32) -> Request {
    Request::new(
        model,
        TextPayload::Single(text.to_string()),
        destination(message_id),
    )
}

async fn submit_within(submitter: &Submitter, request: Request) {
    tokio::time::timeout(Duration::from_secs(5), submitter.submit(request))
        .await
        .expect("submission should not block")
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_requests_run_one_at_a_time_in_fifo_order() {
    let engine = Arc::new(TrackingEngine::default());
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::start(&QueueConfig::default(), engine.clone(), sink.clone());
    let submitter = pipeline.submitter();

    for i in 0..6 {
        submit_within(&submitter, request(model("m"), &format!("msg{}", i), i)).await;
    }
    drop(submitter);
    pipeline.close().await;

    assert_eq!(engine.max_in_flight.load(Ordering::SeqCst), 1);
    let prompts = engine.prompts.lock().unwrap().clone();
    let expected: Vec<String> = (0..6).map(|i| format!("[msg{}]", i)).collect();
    assert_eq!(prompts, expected);

    let replies = sink.replies();
    let ids: Vec<i32> = replies.iter().map(|(dest, _)| dest.message_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    assert!(replies
        .iter()
        .all(|(_, text)| text.starts_with("<pre><code>\n/models/m.llamafile says [msg")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_admission_queue_blocks_submitter() {
    let (engine, mut started) = GatedEngine::new();
    let engine = Arc::new(engine);
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::start(
        &QueueConfig {
            admission_capacity: 1,
        },
        engine.clone(),
        sink.clone(),
    );
    let submitter = pipeline.submitter();

    submit_within(&submitter, request(model("m"), "r1", 1)).await;
    let first = tokio::time::timeout(Duration::from_secs(5), started.recv())
        .await
        .unwrap();
    assert_eq!(first.as_deref(), Some("[r1]"));

    // Worker holds r1; the processing slot, the relay and the admission
    // slot take one request each.
    for i in 2..=4 {
        submit_within(&submitter, request(model("m"), &format!("r{}", i), i)).await;
    }

    let blocked = {
        let submitter = submitter.clone();
        tokio::spawn(async move { submitter.submit(request(model("m"), "r5", 5)).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!blocked.is_finished(), "fifth submission should wait");
    assert!(sink.replies().is_empty());

    engine.release(5);
    tokio::time::timeout(Duration::from_secs(5), blocked)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    sink.wait_for(5).await;
    drop(submitter);
    pipeline.close().await;

    let ids: Vec<i32> = sink
        .replies()
        .iter()
        .map(|(dest, _)| dest.message_id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_misconfigured_model_gets_error_reply_in_turn() {
    let engine = Arc::new(TrackingEngine::default());
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::start(&QueueConfig::default(), engine.clone(), sink.clone());
    let submitter = pipeline.submitter();

    let broken = Arc::new(ModelConfig {
        name: Some("broken".to_string()),
        llamafile_path: Some("/models/broken.llamafile".to_string()),
        ..ModelConfig::default()
    });

    submit_within(&submitter, request(model("a"), "hi", 1)).await;
    submit_within(&submitter, request(broken, "hi", 2)).await;
    submit_within(&submitter, request(model("b"), "hi", 3)).await;
    drop(submitter);
    pipeline.close().await;

    assert_eq!(engine.prompts.lock().unwrap().len(), 2);

    let replies = sink.replies();
    assert_eq!(replies.len(), 3);
    assert!(replies[0].1.contains("<strong>a.llamafile</strong>"));
    assert_eq!(
        replies[1].1,
        "Error: misconfiguration in your config (broken: missing llamafile_prompt_pattern, llamafile_prompt_placeholder)"
    );
    assert!(replies[2].1.contains("<strong>b.llamafile</strong>"));
}

#[tokio::test]
async fn test_close_answers_every_admitted_request() {
    let engine = Arc::new(TrackingEngine::default());
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::start(
        &QueueConfig {
            admission_capacity: 2,
        },
        engine,
        sink.clone(),
    );
    let submitter = pipeline.submitter();
    for i in 0..4 {
        submit_within(&submitter, request(model("m"), "x", i)).await;
    }
    drop(submitter);

    tokio::time::timeout(Duration::from_secs(5), pipeline.close())
        .await
        .unwrap();
    assert_eq!(sink.replies().len(), 4);
}
