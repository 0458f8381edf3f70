use crate::recipe_parser::Language;

/// Slightly slower than normal speech so steps can be followed while cooking.
pub const STEP_SPEECH_RATE: f32 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang_tag: &'static str,
    pub rate: f32,
}

impl Utterance {
    pub fn for_step(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            lang_tag: speech_tag(language),
            rate: STEP_SPEECH_RATE,
        }
    }
}

pub fn speech_tag(language: Language) -> &'static str {
    match language {
        Language::Primary => "en-US",
        Language::Secondary => "hi-IN",
    }
}

/// A text-to-speech backend.
pub trait Speaker: Send + Sync {
    fn speak(&self, utterance: &Utterance);
    fn cancel(&self);
}

/// Reads a step aloud, cutting off whatever was being spoken before.
pub fn speak_step(speaker: &dyn Speaker, text: &str, language: Language) -> Utterance {
    speaker.cancel();
    let utterance = Utterance::for_step(text, language);
    speaker.speak(&utterance);
    utterance
}

/// Speaker for terminals without a speech engine: the step goes to the log instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn speak(&self, utterance: &Utterance) {
        tracing::info!(lang = utterance.lang_tag, rate = utterance.rate, "🔊 {}", utterance.text);
    }

    fn cancel(&self) {}
}
