//! Bilingual recipe document parser.
//!
//! Generated recipes arrive as a markdown-ish blob: an English section, optionally
//! followed by a `**Hindi Translation**` marker and the same recipe in Hindi. Every
//! extraction here is total. A header that cannot be found yields an empty field,
//! never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const UNTITLED_RECIPE: &str = "Untitled Recipe";

/// Which of the two embedded sections a caller wants to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    Primary,
    #[serde(rename = "hi")]
    Secondary,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Primary => "en",
            Language::Secondary => "hi",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Language::Primary => Language::Secondary,
            Language::Secondary => Language::Primary,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" | "primary" => Ok(Language::Primary),
            "hi" | "hindi" | "secondary" => Ok(Language::Secondary),
            other => Err(format!("unknown language '{}', expected 'en' or 'hi'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionFact {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDocument {
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub nutrition: Vec<NutritionFact>,
}

impl RecipeDocument {
    fn empty() -> Self {
        Self {
            title: UNTITLED_RECIPE.to_string(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            nutrition: Vec::new(),
        }
    }
}

/// Storage key derived from a recipe title: every run of whitespace becomes `_`.
///
/// Titles that differ only in whitespace map to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeKey(String);

impl RecipeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("static regex must compile"))
        }
    };
}

static_regex!(translation_marker, r"(?i)\*\*\s*Hindi Translation\s*[:：]?\s*\*\*");
static_regex!(
    ingredients_header,
    r"(?i)\*\*\s*(?:Ingredients|सामग्री)\s*[:：]?\s*\*\*\s*[:：]?"
);
static_regex!(
    instructions_header,
    r"(?i)\*\*\s*(?:Instructions|निर्देश)\s*[:：]?\s*\*\*\s*[:：]?"
);
static_regex!(
    nutrition_header,
    r"(?i)\*\*\s*Approximate Nutritional Value\s*[:：]?\s*\*\*\s*[:：]?"
);
static_regex!(
    any_section_header,
    r"(?i)\*\*\s*(?:Ingredients|सामग्री|Instructions|निर्देश)\s*[:：]?\s*\*\*|\*\*\s*Approximate Nutritional Value"
);
static_regex!(primary_title, r"(?i)^\*\*\s*Name\s*[:：]?\s*\*\*\s*[:：]?\s*(.+)$");
static_regex!(secondary_title, r"^\*\*\s*नाम\s*[:：]?\s*\*\*\s*[:：]?\s*(.+)$");
static_regex!(step_ordinal, r"^\d+\.\s*(.*)$");
static_regex!(step_duration, r"(?i)(\d+)\s*(?:minutes?|mins?|मिनट)");
static_regex!(whitespace_run, r"\s+");

/// Parses `raw` into its structured sections for the requested language.
pub fn parse(raw: &str, language: Language) -> RecipeDocument {
    let Some(section) = language_content(raw, language) else {
        return RecipeDocument::empty();
    };

    RecipeDocument {
        title: extract_title(section, language),
        ingredients: extract_ingredients(section),
        steps: extract_steps(section),
        nutrition: extract_nutrition(section),
    }
}

/// Returns the section of `raw` written in `language`, or `None` when that section is
/// missing or blank (e.g. a recipe that was never translated).
pub fn language_content(raw: &str, language: Language) -> Option<&str> {
    let mut parts = translation_marker().split(raw);
    let section = match language {
        Language::Primary => parts.next(),
        Language::Secondary => parts.nth(1),
    }?;

    if section.trim().is_empty() {
        None
    } else {
        Some(section)
    }
}

pub fn extract_title(section: &str, language: Language) -> String {
    let pattern = match language {
        Language::Primary => primary_title(),
        Language::Secondary => secondary_title(),
    };

    section
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.to_lowercase().contains("translation"))
        .find_map(|line| pattern.captures(line).map(|caps| caps[1].trim().to_string()))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED_RECIPE.to_string())
}

pub fn extract_ingredients(section: &str) -> Vec<String> {
    section_block(section, ingredients_header())
        .map(|block| block.lines().filter_map(strip_bullet).collect())
        .unwrap_or_default()
}

pub fn extract_steps(section: &str) -> Vec<String> {
    section_block(section, instructions_header())
        .map(|block| {
            block
                .lines()
                .filter_map(|line| {
                    step_ordinal()
                        .captures(line.trim())
                        .map(|caps| caps[1].trim().to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn extract_nutrition(section: &str) -> Vec<NutritionFact> {
    let Some(block) = section_block(section, nutrition_header()) else {
        return Vec::new();
    };

    block
        .lines()
        .filter_map(strip_bullet)
        .filter_map(|line| {
            let split_at = line.find(|c: char| c == ':' || c == '：')?;
            let separator_len = line[split_at..].chars().next()?.len_utf8();
            let label = line[..split_at].trim();
            let value = line[split_at + separator_len..].trim();
            if label.is_empty() || value.is_empty() {
                None
            } else {
                Some(NutritionFact {
                    label: label.to_string(),
                    value: value.to_string(),
                })
            }
        })
        .collect()
}

/// Text between `header` and the next recognised section header (or end of text).
fn section_block<'a>(section: &'a str, header: &Regex) -> Option<&'a str> {
    let start = header.find(section)?.end();
    let rest = &section[start..];
    let end = any_section_header()
        .find(rest)
        .map(|m| m.start())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn strip_bullet(line: &str) -> Option<String> {
    let line = line.trim();
    // Bold text is a header remnant, not a bullet.
    if line.starts_with("**") {
        return None;
    }
    let rest = line
        .strip_prefix('*')
        .or_else(|| line.strip_prefix('-'))
        .or_else(|| line.strip_prefix('•'))?;
    let item = rest.trim();
    if item.is_empty() {
        None
    } else {
        Some(item.to_string())
    }
}

pub fn recipe_key(title: &str) -> RecipeKey {
    RecipeKey(whitespace_run().replace_all(title, "_").into_owned())
}

/// First "<n> minutes" style duration mentioned in a step, used to offer a timer.
pub fn step_minutes(step: &str) -> Option<u32> {
    step_duration()
        .captures(step)
        .and_then(|caps| caps[1].parse().ok())
}

/// Splits a freshly generated recipe into `(title, content)`: the first line is the title.
pub fn split_generated(recipe: &str) -> (String, String) {
    let mut lines = recipe.lines();
    let title = lines.next().unwrap_or_default().trim().to_string();
    let content = lines.collect::<Vec<_>>().join("\n");
    (title, content)
}
