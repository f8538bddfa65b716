//! # Coach Module
//!
//! Turns the technical rep verdict into coaching text off the frame loop.
//!
//! A completed rep hands the session's [`RephraseRequest`] to the
//! [`RephraseDispatcher`], which runs the [`Rephraser`] on the blocking pool
//! and publishes the result through the [`FeedbackSlot`] ticket. A request
//! that finishes after a newer one, or after a reset, is discarded by the slot.

use kinex_core::{
    FeedbackSlot, KinexError, RepVerdict, RephraseRequest, primitives::NEUTRAL_COACH_TEXT,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

// =============================================================================
// REPHRASER
// =============================================================================

/// Converts technical feedback into something a person wants to hear.
pub trait Rephraser: Send + Sync {
    /// Rephrase `technical`. Empty input yields the neutral default.
    fn rephrase(&self, technical: &str) -> Result<String, KinexError>;
}

/// Deterministic phrase table for the rep verdicts.
///
/// Text that is not a known verdict is passed through trimmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRephraser;

impl TemplateRephraser {
    fn phrase_for(verdict: RepVerdict) -> &'static str {
        match verdict {
            RepVerdict::NotDeepEnough => {
                "Nice effort! Sink your hips a little lower on the next one."
            }
            RepVerdict::TooDeep => "Strong rep, but ease off at the bottom to protect your knees.",
            RepVerdict::Good => "Great depth! That's exactly the range we want, keep it going.",
        }
    }
}

impl Rephraser for TemplateRephraser {
    fn rephrase(&self, technical: &str) -> Result<String, KinexError> {
        let technical = technical.trim();
        if technical.is_empty() {
            return Ok(NEUTRAL_COACH_TEXT.to_string());
        }

        let phrase = [
            RepVerdict::NotDeepEnough,
            RepVerdict::TooDeep,
            RepVerdict::Good,
        ]
        .into_iter()
        .find(|v| v.message() == technical)
        .map(Self::phrase_for);

        Ok(phrase.map_or_else(|| technical.to_string(), str::to_string))
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

/// Runs rephrase requests in the background.
#[derive(Clone)]
pub struct RephraseDispatcher {
    rephraser: Arc<dyn Rephraser>,
}

impl Default for RephraseDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(TemplateRephraser))
    }
}

impl std::fmt::Debug for RephraseDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RephraseDispatcher").finish_non_exhaustive()
    }
}

impl RephraseDispatcher {
    #[must_use]
    pub fn new(rephraser: Arc<dyn Rephraser>) -> Self {
        Self { rephraser }
    }

    /// Spawn a task that rephrases `request` and publishes it to `slot`.
    ///
    /// The handle resolves to `true` if the text reached the slot. Failures
    /// are logged and leave the slot untouched. Must be called from within a
    /// tokio runtime.
    pub fn dispatch(&self, slot: FeedbackSlot, request: RephraseRequest) -> JoinHandle<bool> {
        let rephraser = Arc::clone(&self.rephraser);

        tokio::spawn(async move {
            let text = request.text.clone();
            let result = tokio::task::spawn_blocking(move || rephraser.rephrase(&text)).await;

            match result {
                Ok(Ok(coaching)) => {
                    let published = slot.publish(request.ticket, coaching);
                    if published {
                        tracing::debug!(rep = request.rep_number, "Coaching text published");
                    } else {
                        tracing::debug!(
                            rep = request.rep_number,
                            "Discarding stale coaching text"
                        );
                    }
                    published
                }
                Ok(Err(e)) => {
                    tracing::warn!(rep = request.rep_number, error = %e, "Rephrase failed");
                    false
                }
                Err(e) => {
                    tracing::warn!(rep = request.rep_number, error = %e, "Rephrase task aborted");
                    false
                }
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingRephraser;

    impl Rephraser for FailingRephraser {
        fn rephrase(&self, _technical: &str) -> Result<String, KinexError> {
            Err(KinexError::RephraseError("backend offline".to_string()))
        }
    }

    fn request(slot: &FeedbackSlot, rep_number: u32, verdict: RepVerdict) -> RephraseRequest {
        RephraseRequest {
            ticket: slot.reserve(),
            rep_number,
            verdict,
            text: verdict.message().to_string(),
        }
    }

    #[test]
    fn empty_input_gives_neutral_text() {
        let text = TemplateRephraser.rephrase("   ").expect("rephrase");
        assert_eq!(text, NEUTRAL_COACH_TEXT);
    }

    #[test]
    fn verdicts_map_to_phrases() {
        let text = TemplateRephraser
            .rephrase(RepVerdict::TooDeep.message())
            .expect("rephrase");
        assert!(text.contains("knees"));
    }

    #[test]
    fn unknown_text_passes_through() {
        let text = TemplateRephraser.rephrase(" Hold the bottom. ").expect("rephrase");
        assert_eq!(text, "Hold the bottom.");
    }

    #[tokio::test]
    async fn dispatch_publishes_to_slot() {
        let slot = FeedbackSlot::new("Start your first set!");
        let dispatcher = RephraseDispatcher::default();

        let published = dispatcher
            .dispatch(slot.clone(), request(&slot, 1, RepVerdict::Good))
            .await
            .expect("join");

        assert!(published);
        assert!(slot.text().starts_with("Great depth!"));
    }

    #[tokio::test]
    async fn failure_leaves_slot_untouched() {
        let slot = FeedbackSlot::new("Start your first set!");
        let dispatcher = RephraseDispatcher::new(Arc::new(FailingRephraser));

        let published = dispatcher
            .dispatch(slot.clone(), request(&slot, 1, RepVerdict::Good))
            .await
            .expect("join");

        assert!(!published);
        assert_eq!(slot.text(), "Start your first set!");
    }

    #[tokio::test]
    async fn late_older_result_is_discarded() {
        let slot = FeedbackSlot::new("Start your first set!");
        let dispatcher = RephraseDispatcher::default();
        let older = request(&slot, 1, RepVerdict::NotDeepEnough);
        let newer = request(&slot, 2, RepVerdict::Good);

        assert!(dispatcher.dispatch(slot.clone(), newer).await.expect("join"));
        assert!(!dispatcher.dispatch(slot.clone(), older).await.expect("join"));
        assert!(slot.text().starts_with("Great depth!"));
    }
}
