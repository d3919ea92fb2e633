//! Handler chain wiring: filter → admin → detection, driven with core messages.

mod common;

use std::sync::Arc;

use common::*;
use resurface::chain::HandlerChain;
use resurface::config::DetectorConfig;
use resurface::handlers::{AdminHandler, DetectionHandler, FilterHandler};
use resurface::pipeline::Pipeline;
use resurface::store::conversation_dir;
use resurface::{Admin, BotError, Chat, HandlerResponse};

const NEWS: &str = "server migration tonight at 10";

struct Setup {
    _dir: tempfile::TempDir,
    chain: HandlerChain,
    pipeline: Arc<Pipeline>,
}

fn setup() -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let (store, _clock) = manual_store(&dir.path().join("conversations"), 7, T0);
    let mut config = DetectorConfig {
        enable_judge: false,
        ..DetectorConfig::default()
    };
    config.admin_user_ids.insert(42);

    let pipeline = Arc::new(
        Pipeline::new(config.clone(), store)
            .with_embedder(Arc::new(KeyedEmbedder::new().with(NEWS, vec![0.2, 0.9]))),
    );
    let admin = Admin::new(pipeline.clone(), dir.path().join("reminder.jpg"));
    let chain = HandlerChain::new()
        .add_handler(Arc::new(FilterHandler::new(config)))
        .add_handler(Arc::new(AdminHandler::new(admin)))
        .add_handler(Arc::new(DetectionHandler::new(pipeline.clone())));
    Setup {
        _dir: dir,
        chain,
        pipeline,
    }
}

async fn stored(pipeline: &Pipeline) -> usize {
    pipeline.store().load(&GROUP.to_string()).await.len()
}

/// **Test: group messages reach detection and are recorded; filtered ones are not.**
#[tokio::test]
async fn test_filtered_messages_are_not_recorded() {
    let s = setup();

    let response = s.chain.handle(&group_message("1", 1, NEWS)).await.unwrap();
    assert_eq!(response, HandlerResponse::Stop);
    assert_eq!(stored(&s.pipeline).await, 1);

    s.chain.handle(&group_message("2", 1, "/start")).await.unwrap();
    s.chain.handle(&group_message("3", 1, "k")).await.unwrap();
    let mut private = group_message("4", 1, NEWS);
    private.chat = Chat::private(1);
    s.chain.handle(&private).await.unwrap();

    assert_eq!(stored(&s.pipeline).await, 1);
}

/// **Test: /memory_status replies to admins only and is never recorded.**
#[tokio::test]
async fn test_status_command_for_admins() {
    let s = setup();
    s.chain.handle(&group_message("1", 1, NEWS)).await.unwrap();

    let response = s
        .chain
        .handle(&group_message("2", 42, "/memory_status"))
        .await
        .unwrap();
    let HandlerResponse::Reply(text) = response else {
        panic!("expected a status reply, got {:?}", response);
    };
    assert!(text.contains("Records: 1"));
    assert!(text.contains("with text fingerprint: 1"));
    assert!(text.contains("Judge: disabled"));
    assert!(text.contains("Reminder image: no"));

    let response = s
        .chain
        .handle(&group_message("3", 7, "/memory_status"))
        .await
        .unwrap();
    assert_eq!(response, HandlerResponse::Stop);
    assert_eq!(stored(&s.pipeline).await, 1);
}

/// **Test: /erase_memory from an admin wipes the conversation.**
#[tokio::test]
async fn test_erase_command() {
    let s = setup();
    s.chain.handle(&group_message("1", 1, NEWS)).await.unwrap();
    s.chain.handle(&group_message("2", 2, NEWS)).await.unwrap();
    assert_eq!(stored(&s.pipeline).await, 2);

    s.chain.handle(&group_message("3", 7, "/erase_memory")).await.unwrap();
    assert_eq!(stored(&s.pipeline).await, 2);

    let response = s
        .chain
        .handle(&group_message("4", 42, "/erase_memory"))
        .await
        .unwrap();
    assert_eq!(response, HandlerResponse::Stop);
    assert_eq!(stored(&s.pipeline).await, 0);
}

/// **Test: an erase that cannot delete the stored data fails the chain with a storage error.**
#[tokio::test]
async fn test_erase_failure_is_returned() {
    let s = setup();
    let root = s.pipeline.store().root().to_path_buf();
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(conversation_dir(&root, &GROUP.to_string()), b"not a directory").unwrap();

    let result = s
        .chain
        .handle(&group_message("1", 42, "/erase_memory"))
        .await;
    assert!(matches!(result, Err(BotError::Storage(_))));
}
