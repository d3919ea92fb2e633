//! Runs the decision pipeline on every message that got through the filter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::core::{Handler, HandlerResponse, Message, Result};
use crate::pipeline::Pipeline;

pub struct DetectionHandler {
    pipeline: Arc<Pipeline>,
}

impl DetectionHandler {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Handler for DetectionHandler {
    #[instrument(skip(self, message))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let decision = self.pipeline.process(message).await;
        debug!(decision = ?decision, "step: detection done");
        Ok(HandlerResponse::Stop)
    }
}
