use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::api_connection::endpoints::{Detection, GenerateRecipeRequest};
use crate::api_connection::{ApiClient, ApiConnectionError};

pub const GENERATION_LIMIT: u32 = 55;
pub const GENERATION_WINDOW: Duration = Duration::from_secs(60);
pub const THROTTLE_NOTICE: &str =
    "Hang tight! Our CodeChefs are busy preparing your dishes. Please wait for a minute";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{}", THROTTLE_NOTICE)]
    Throttled,
    #[error(transparent)]
    Api(#[from] ApiConnectionError),
}

#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRecipeRequest) -> Result<String, ApiConnectionError>;
}

#[async_trait]
impl RecipeGenerator for ApiClient {
    async fn generate(
        &self,
        request: &GenerateRecipeRequest,
    ) -> Result<String, ApiConnectionError> {
        self.generate_recipe(request).await
    }
}

/// Client-side cap on generation requests per minute.
///
/// The window opens on the first request after the previous window expired; only
/// successful generations count against it.
#[derive(Debug, Default, Clone)]
pub struct GenerationThrottle {
    window_start: Option<Instant>,
    count: u32,
}

impl GenerationThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        match self.window_start {
            Some(start) if now.duration_since(start) < GENERATION_WINDOW => {
                self.count < GENERATION_LIMIT
            }
            _ => {
                self.window_start = Some(now);
                self.count = 0;
                true
            }
        }
    }

    pub fn record_success(&mut self) {
        self.count += 1;
    }
}

pub fn detected_labels(detections: &[Detection]) -> Vec<String> {
    detections.iter().map(|d| d.label.clone()).collect()
}

/// Asks the generator for a recipe built from the detected vegetables.
pub async fn generate_from_detections<G: RecipeGenerator + ?Sized>(
    generator: &G,
    throttle: &mut GenerationThrottle,
    detections: &[Detection],
    preferences: &str,
) -> Result<String, GenerationError> {
    if !throttle.try_acquire() {
        tracing::info!("recipe generation throttled");
        return Err(GenerationError::Throttled);
    }

    let request = GenerateRecipeRequest {
        ingredients: detected_labels(detections),
        preferences: preferences.to_string(),
    };
    let recipe = generator.generate(&request).await?;
    throttle.record_success();
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct EchoGenerator {
        seen: Mutex<Vec<GenerateRecipeRequest>>,
    }

    #[async_trait]
    impl RecipeGenerator for EchoGenerator {
        async fn generate(
            &self,
            request: &GenerateRecipeRequest,
        ) -> Result<String, ApiConnectionError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(format!("{} Curry\n**Name:** Curry", request.ingredients.join(" ")))
        }
    }

    #[test]
    fn throttle_caps_requests_within_a_window() {
        let start = Instant::now();
        let mut throttle = GenerationThrottle::new();

        for _ in 0..GENERATION_LIMIT {
            assert!(throttle.try_acquire_at(start));
            throttle.record_success();
        }
        assert!(!throttle.try_acquire_at(start + Duration::from_secs(30)));
        assert!(throttle.try_acquire_at(start + Duration::from_secs(61)));
    }

    #[test]
    fn failed_generations_do_not_count() {
        let start = Instant::now();
        let mut throttle = GenerationThrottle::new();
        for _ in 0..(GENERATION_LIMIT * 2) {
            assert!(throttle.try_acquire_at(start));
        }
    }

    #[tokio::test]
    async fn generation_sends_detected_labels() {
        let generator = EchoGenerator {
            seen: Mutex::new(Vec::new()),
        };
        let mut throttle = GenerationThrottle::new();
        let detections = vec![
            Detection {
                label: "tomato".into(),
                confidence: 0.91,
            },
            Detection {
                label: "onion".into(),
                confidence: 0.77,
            },
        ];

        let recipe = generate_from_detections(&generator, &mut throttle, &detections, "vegan")
            .await
            .unwrap();
        assert!(recipe.starts_with("tomato onion Curry"));

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[0].ingredients, vec!["tomato", "onion"]);
        assert_eq!(seen[0].preferences, "vegan");
    }
}
