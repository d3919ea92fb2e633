//! Component factory: builds the store, capabilities, pipeline and handler chain from config.

use std::sync::Arc;

use anyhow::Result;
use embedding::{EmbeddingConfig, EmbeddingService};
use llm_client::{LlmClient, LlmConfig, OpenAILlmClient};
use openai_embedding::OpenAIEmbedding;
use tracing::{info, instrument, warn};

use crate::admin::Admin;
use crate::capabilities::{HttpImageFetcher, LlmJudge, LlmVision, ReminderSink};
use crate::chain::HandlerChain;
use crate::clock::Clock;
use crate::config::BotConfig;
use crate::handlers::{AdminHandler, DetectionHandler, FilterHandler};
use crate::pipeline::Pipeline;
use crate::store::{ConversationStore, ImageCache};

/// Everything the runner and the CLI need.
#[derive(Clone)]
pub struct BotComponents {
    pub store: Arc<ConversationStore>,
    pub pipeline: Arc<Pipeline>,
    pub admin: Admin,
}

/// Embedding adapter, when a provider is selected and has credentials.
pub fn build_embedder(config: &dyn EmbeddingConfig) -> Option<Arc<dyn EmbeddingService>> {
    if !config.is_enabled() {
        info!("Embedding disabled, text fingerprints off");
        return None;
    }
    let embedder = OpenAIEmbedding::from_config(config);
    info!(model = %config.model(), "Using OpenAI-compatible embedding for text fingerprints");
    Some(Arc::new(embedder))
}

fn llm_for(config: &dyn LlmConfig, model: Option<&str>) -> Option<Arc<dyn LlmClient>> {
    let model = model?;
    if config.api_key().is_empty() {
        warn!(model = %model, "Model configured without OPENAI_API_KEY, capability disabled");
        return None;
    }
    Some(Arc::new(OpenAILlmClient::from_config(config, model)))
}

/// Builds the components. `reminder` is the transport's sink; `None` records without replying.
#[instrument(skip_all)]
pub fn build_bot_components(
    config: &BotConfig,
    clock: Arc<dyn Clock>,
    reminder: Option<Arc<dyn ReminderSink>>,
) -> Result<BotComponents> {
    let detector = config.detector().clone();
    let store = Arc::new(ConversationStore::new(
        config.base.conversations_dir(),
        detector.retention_days,
        clock,
    ));

    let mut pipeline = Pipeline::new(detector.clone(), store.clone())
        .with_image_cache(ImageCache::new(config.base.image_cache_dir()))
        .with_fetcher(Arc::new(HttpImageFetcher::new()?));

    if let Some(embedder) = build_embedder(&config.embedding) {
        pipeline = pipeline.with_embedder(embedder);
    }
    if let Some(client) = llm_for(&config.llm, config.llm.vision_model()) {
        info!(model = %client.model(), "Vision enabled");
        pipeline = pipeline.with_vision(Arc::new(
            LlmVision::new(client).with_prompt(detector.vision_prompt.clone()),
        ));
    }
    if let Some(client) = llm_for(&config.llm, config.llm.judge_model()) {
        info!(model = %client.model(), "Judge enabled");
        pipeline = pipeline.with_judge(Arc::new(
            LlmJudge::new(client).with_template(detector.judge_prompt.clone()),
        ));
    } else if detector.enable_judge {
        warn!("ENABLE_JUDGE is on but JUDGE_MODEL is not configured; matches will stay silent");
    }
    if let Some(sink) = reminder {
        pipeline = pipeline.with_reminder(sink);
    }

    let pipeline = Arc::new(pipeline);
    let admin = Admin::new(pipeline.clone(), config.base.reminder_image_path.clone());
    Ok(BotComponents {
        store,
        pipeline,
        admin,
    })
}

/// filter → admin commands → detection. `bot_username` scopes `/command@name` handling.
pub fn build_handler_chain(components: &BotComponents, bot_username: Option<&str>) -> HandlerChain {
    let username = bot_username.map(str::to_string);
    HandlerChain::new()
        .add_handler(Arc::new(
            FilterHandler::new(components.pipeline.config().clone())
                .with_bot_username(username.clone()),
        ))
        .add_handler(Arc::new(
            AdminHandler::new(components.admin.clone()).with_bot_username(username),
        ))
        .add_handler(Arc::new(DetectionHandler::new(components.pipeline.clone())))
}
