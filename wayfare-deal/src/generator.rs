use std::sync::Arc;

use tracing::{debug, warn};
use wayfare_core::text::{CompletionRequest, TextGenerator};

use crate::models::{ContentParts, TravelDeal};

/// Model identifiers tried in order, most capable first.
pub const DEFAULT_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-3.5-turbo"];

pub const SUBTITLE_FALLBACK: &str = "Your Perfect Getaway Awaits";
pub const RESORT_SUMMARY_FALLBACK: &str =
    "Relax in a beautiful resort with everything you need for a memorable holiday in the sun.";
pub const HASHTAGS_FALLBACK: &str = "#TravelDeals #HolidayOffers #Getaway #Travel #Holiday";

/// Which piece of post copy is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Subtitle,
    ResortSummary,
    Hashtags,
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Subtitle => "subtitle",
            ContentKind::ResortSummary => "resort_summary",
            ContentKind::Hashtags => "hashtags",
        }
    }

    pub fn max_tokens(&self) -> u32 {
        match self {
            ContentKind::Subtitle => 50,
            ContentKind::ResortSummary => 150,
            ContentKind::Hashtags => 100,
        }
    }

    pub fn fallback(&self) -> &'static str {
        match self {
            ContentKind::Subtitle => SUBTITLE_FALLBACK,
            ContentKind::ResortSummary => RESORT_SUMMARY_FALLBACK,
            ContentKind::Hashtags => HASHTAGS_FALLBACK,
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            ContentKind::Subtitle => {
                "You write catchy subtitles for holiday deal posts on social media. \
                 Reply with a single line of at most eight words, no quotes and no hashtags."
            }
            ContentKind::ResortSummary => {
                "You are a travel copywriter. Describe the resort or destination of a holiday \
                 deal in two or three warm, factual sentences. No hashtags, no prices, no emojis."
            }
            ContentKind::Hashtags => {
                "You create hashtags for travel deal posts. Reply with 5 to 8 relevant hashtags \
                 on one line separated by spaces and nothing else."
            }
        }
    }

    fn user_prompt(&self, deal: &TravelDeal) -> String {
        let mut details = format!("Deal: {}", deal.title);
        let optional = [
            ("Destination", &deal.destination),
            ("Travel date", &deal.travel_date),
            ("Nights", &deal.nights),
            ("Board basis", &deal.board_basis),
            ("Departure airport", &deal.departure_airport),
        ];
        for (label, value) in optional {
            if let Some(value) = value {
                details.push_str(&format!("\n{}: {}", label, value));
            }
        }

        match self {
            ContentKind::Subtitle => format!("Write a subtitle for this holiday deal.\n\n{}", details),
            ContentKind::ResortSummary => {
                format!("Write a short resort summary for this holiday deal.\n\n{}", details)
            }
            ContentKind::Hashtags => format!("Write hashtags for this holiday deal.\n\n{}", details),
        }
    }

    fn tidy(&self, raw: &str) -> String {
        match self {
            ContentKind::Subtitle => raw.trim().trim_matches('"').trim().to_string(),
            ContentKind::ResortSummary => raw.trim().to_string(),
            ContentKind::Hashtags => raw.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// Writes post copy through a [`TextGenerator`], walking the model list until one answers.
///
/// Never fails: when every model errors or comes back empty the fixed fallback for that piece
/// is returned instead.
#[derive(Clone)]
pub struct ContentGenerator {
    backend: Arc<dyn TextGenerator>,
    models: Vec<String>,
}

impl ContentGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>, models: Vec<String>) -> Self {
        Self { backend, models }
    }

    pub fn with_default_models(backend: Arc<dyn TextGenerator>) -> Self {
        Self::new(backend, DEFAULT_MODELS.iter().map(|m| m.to_string()).collect())
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub async fn generate(&self, kind: ContentKind, deal: &TravelDeal) -> String {
        let system_prompt = kind.system_prompt().to_string();
        let user_prompt = kind.user_prompt(deal);

        for model in &self.models {
            let request = CompletionRequest {
                model: model.clone(),
                system_prompt: system_prompt.clone(),
                user_prompt: user_prompt.clone(),
                max_tokens: kind.max_tokens(),
            };

            match self.backend.complete(&request).await {
                Ok(text) => {
                    let text = kind.tidy(&text);
                    if text.is_empty() {
                        warn!(model = %model, kind = kind.label(), "Empty generation, trying next model");
                        continue;
                    }
                    debug!(model = %model, kind = kind.label(), "Generated deal content");
                    return text;
                }
                Err(e) => {
                    warn!(model = %model, kind = kind.label(), error = %e, "Generation failed, trying next model");
                }
            }
        }

        warn!(kind = kind.label(), "All models failed, using fallback text");
        kind.fallback().to_string()
    }

    pub async fn generate_subtitle(&self, deal: &TravelDeal) -> String {
        self.generate(ContentKind::Subtitle, deal).await
    }

    pub async fn generate_resort_summary(&self, deal: &TravelDeal) -> String {
        self.generate(ContentKind::ResortSummary, deal).await
    }

    pub async fn generate_hashtags(&self, deal: &TravelDeal) -> String {
        self.generate(ContentKind::Hashtags, deal).await
    }

    /// All three pieces concurrently. A subtitle already on the deal is used as-is.
    pub async fn generate_parts(&self, deal: &TravelDeal) -> ContentParts {
        let subtitle = async {
            match &deal.subtitle {
                Some(subtitle) => subtitle.clone(),
                None => self.generate_subtitle(deal).await,
            }
        };

        let (subtitle, resort_summary, hashtags) = tokio::join!(
            subtitle,
            self.generate_resort_summary(deal),
            self.generate_hashtags(deal),
        );

        ContentParts {
            subtitle,
            resort_summary,
            hashtags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use wayfare_core::{CoreError, CoreResult};

    /// Fails for the listed models, answers with `reply` otherwise.
    struct ScriptedBackend {
        failing_models: Vec<&'static str>,
        reply: &'static str,
        calls: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedBackend {
        fn new(failing_models: Vec<&'static str>, reply: &'static str) -> Self {
            Self {
                failing_models,
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<CompletionRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedBackend {
        async fn complete(&self, request: &CompletionRequest) -> CoreResult<String> {
            self.calls.lock().unwrap().push(request.clone());
            if self.failing_models.contains(&request.model.as_str()) {
                return Err(CoreError::ExternalError {
                    service: "ai".into(),
                    status: Some(503),
                    payload: serde_json::Value::Null,
                });
            }
            Ok(self.reply.to_string())
        }
    }

    fn deal() -> TravelDeal {
        let mut deal = TravelDeal::new("Sunny Escape");
        deal.destination = Some("Tenerife".into());
        deal
    }

    #[tokio::test]
    async fn test_first_model_answers() {
        let backend = Arc::new(ScriptedBackend::new(vec![], "Sun, Sea and Sangria"));
        let generator = ContentGenerator::with_default_models(backend.clone());

        let subtitle = generator.generate_subtitle(&deal()).await;

        assert_eq!(subtitle, "Sun, Sea and Sangria");
        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "gpt-4o");
        assert_eq!(calls[0].max_tokens, 50);
        assert!(calls[0].user_prompt.contains("Tenerife"));
    }

    #[tokio::test]
    async fn test_falls_through_to_next_model() {
        let backend = Arc::new(ScriptedBackend::new(vec!["gpt-4o"], "#Tenerife #Sun"));
        let generator = ContentGenerator::with_default_models(backend.clone());

        let hashtags = generator.generate_hashtags(&deal()).await;

        assert_eq!(hashtags, "#Tenerife #Sun");
        let models: Vec<String> = backend.calls().into_iter().map(|c| c.model).collect();
        assert_eq!(models, vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()]);
    }

    #[tokio::test]
    async fn test_every_model_failing_returns_fallbacks() {
        let backend = Arc::new(ScriptedBackend::new(DEFAULT_MODELS.to_vec(), "unused"));
        let generator = ContentGenerator::with_default_models(backend.clone());
        let deal = deal();

        assert_eq!(generator.generate_subtitle(&deal).await, SUBTITLE_FALLBACK);
        assert_eq!(generator.generate_resort_summary(&deal).await, RESORT_SUMMARY_FALLBACK);
        assert_eq!(generator.generate_hashtags(&deal).await, HASHTAGS_FALLBACK);
        assert_eq!(backend.calls().len(), DEFAULT_MODELS.len() * 3);
    }

    #[tokio::test]
    async fn test_empty_reply_counts_as_failure() {
        let backend = Arc::new(ScriptedBackend::new(vec![], "   \n  "));
        let generator = ContentGenerator::new(backend.clone(), vec!["only-model".into()]);

        let summary = generator.generate_resort_summary(&deal()).await;

        assert_eq!(summary, RESORT_SUMMARY_FALLBACK);
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_no_models_configured_uses_fallback() {
        let backend = Arc::new(ScriptedBackend::new(vec![], "never"));
        let generator = ContentGenerator::new(backend.clone(), vec![]);

        assert_eq!(generator.generate_hashtags(&deal()).await, HASHTAGS_FALLBACK);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_supplied_subtitle_skips_generation() {
        let backend = Arc::new(ScriptedBackend::new(vec![], "generated"));
        let generator = ContentGenerator::with_default_models(backend.clone());
        let mut deal = deal();
        deal.subtitle = Some("Hand written".into());

        let parts = generator.generate_parts(&deal).await;

        assert_eq!(parts.subtitle, "Hand written");
        assert_eq!(parts.resort_summary, "generated");
        assert_eq!(parts.hashtags, "generated");
        let budgets: Vec<u32> = backend.calls().into_iter().map(|c| c.max_tokens).collect();
        assert_eq!(budgets.len(), 2);
        assert!(!budgets.contains(&50));
    }

    #[test]
    fn test_tidy_normalises_output() {
        assert_eq!(ContentKind::Subtitle.tidy("  \"Sun & Sea\"\n"), "Sun & Sea");
        assert_eq!(ContentKind::Hashtags.tidy("#A\n#B   #C"), "#A #B #C");
    }
}
