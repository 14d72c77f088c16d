//! Message-level classification with memoization.

use std::sync::Arc;

use chatlens_core::DetectionConfig;

use crate::cache::{Cache, MemoryCache};
use crate::detector::Detector;
use crate::message::Message;
use crate::segments::is_strongly_code_like;

/// Decides whether messages carry code and redacts them.
///
/// Results are memoized per message id, content hash and mode. A second
/// cache holds the strongly-code-like message count of each recorded
/// conversation, which decides whether that conversation's messages are
/// classified aggressively.
pub struct CodeClassifier {
    detector: Detector,
    detections: Arc<dyn Cache<bool>>,
    conversation_counts: Arc<dyn Cache<usize>>,
}

impl CodeClassifier {
    /// Classifier with in-memory caches.
    pub fn new(config: DetectionConfig) -> Self {
        Self::with_caches(
            config,
            Arc::new(MemoryCache::new()),
            Arc::new(MemoryCache::new()),
        )
    }

    /// Classifier with caller-provided caches.
    pub fn with_caches(
        config: DetectionConfig,
        detections: Arc<dyn Cache<bool>>,
        conversation_counts: Arc<dyn Cache<usize>>,
    ) -> Self {
        Self {
            detector: Detector::new(config),
            detections,
            conversation_counts,
        }
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Whether the message contains renderable code. Media is never code.
    pub fn is_code_content(&self, message: &Message) -> bool {
        self.classify(message, false)
    }

    /// Like [`is_code_content`](Self::is_code_content), but aggressive when
    /// the recorded conversation is code-heavy.
    pub fn is_code_content_in(&self, message: &Message, conversation_id: &str) -> bool {
        let aggressive = self.is_code_heavy_conversation(conversation_id);
        self.classify(message, aggressive)
    }

    /// Count the conversation's strongly code-like messages and cache it.
    ///
    /// A conversation already recorded keeps its first count.
    pub fn record_conversation(&self, conversation_id: &str, messages: &[Message]) -> usize {
        if let Some(count) = self.conversation_counts.get(conversation_id) {
            return count;
        }

        let count = messages
            .iter()
            .filter(|m| !m.is_media() && is_strongly_code_like(&m.content_text()))
            .count();
        self.conversation_counts
            .set(conversation_id.to_string(), count);

        tracing::debug!(
            conversation = conversation_id,
            count,
            code_heavy = count >= self.detector.config().code_heavy_threshold,
            "Recorded conversation"
        );
        count
    }

    /// Whether a recorded conversation reaches the code-heavy threshold.
    /// Unrecorded conversations are not code-heavy.
    pub fn is_code_heavy_conversation(&self, conversation_id: &str) -> bool {
        self.conversation_counts
            .get(conversation_id)
            .is_some_and(|count| count >= self.detector.config().code_heavy_threshold)
    }

    /// Message text with code replaced by placeholders. Media passes
    /// through unchanged.
    pub fn redact_message(&self, message: &Message) -> String {
        let text = message.content_text();
        if message.is_media() {
            return text;
        }
        self.detector.remove_code(&text)
    }

    fn classify(&self, message: &Message, aggressive: bool) -> bool {
        if message.is_media() {
            return false;
        }

        let text = message.content_text();
        if text.trim().is_empty() {
            return false;
        }

        let mode = if aggressive { "aggressive" } else { "normal" };
        let key = format!("{}:{}:{}", message.id, message.content_hash(), mode);
        if let Some(hit) = self.detections.get(&key) {
            return hit;
        }

        let blocks = self.detector.find_code_blocks(&text, aggressive);
        let result = !crate::render::filter_renderable_blocks(&text, &blocks).is_empty();
        self.detections.set(key, result);
        result
    }
}
