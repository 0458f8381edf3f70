use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::{ProgressStore, StorageKey, StoreError};
use crate::api_connection::endpoints::{CookedRequest, UpdateCookedRequest};
use crate::recipe_parser::{self, recipe_key, Language, RecipeDocument, RecipeKey};

/// A recipe as carried through the cooking flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecipe {
    /// Server-assigned cook-history id, once known.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
}

impl StoredRecipe {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
        }
    }

    /// Builds a recipe from a document on disk.
    ///
    /// Generated recipes open with a plain title line, which becomes the title and is
    /// dropped from the content. Documents that open with a markdown header are titled
    /// from their `**Name:**` line instead.
    pub fn from_text(raw: &str) -> Self {
        let raw = raw.trim_start();
        let first_line = raw.lines().next().unwrap_or_default().trim();
        let is_header = first_line.starts_with("**") || first_line.starts_with('#');
        if !first_line.is_empty() && !is_header {
            let (title, content) = recipe_parser::split_generated(raw);
            return Self::new(title, content);
        }
        let title = recipe_parser::parse(raw, Language::Primary).title;
        Self::new(title, raw)
    }

    pub fn key(&self) -> RecipeKey {
        recipe_key(&self.title)
    }
}

/// Durable per-recipe progress, stored under `cookingProgress_<key>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub recipe: StoredRecipe,
    pub current_step: usize,
    pub lang: Language,
    #[serde(default = "Utc::now")]
    pub last_left_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

/// Most recent session, stored under `cookingProgress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub recipe: StoredRecipe,
    pub current_step: usize,
    pub lang: Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookingState {
    NotStarted,
    InProgress,
    Completed,
}

/// Remote history write the caller should dispatch after a local transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncRequest {
    StartCooking(CookedRequest),
    UpdateHistory {
        remote_id: Option<String>,
        update: UpdateCookedRequest,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: CookingState,
    pub current_step: usize,
    pub changed: bool,
    pub sync: Option<SyncRequest>,
}

/// What a view needs to rehydrate a recipe's cooking position.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumePoint {
    pub current_step: usize,
    pub language: Language,
    pub completed: bool,
    pub last_left_at: Option<DateTime<Utc>>,
}

impl Default for ResumePoint {
    fn default() -> Self {
        Self {
            current_step: 0,
            language: Language::Primary,
            completed: false,
            last_left_at: None,
        }
    }
}

impl ResumePoint {
    pub fn state(&self) -> CookingState {
        if self.last_left_at.is_none() {
            CookingState::NotStarted
        } else if self.completed {
            CookingState::Completed
        } else {
            CookingState::InProgress
        }
    }

    /// Completed when flagged, or when the stored step already sits on the last step.
    pub fn is_completed(&self, step_count: usize) -> bool {
        self.completed || (step_count > 0 && self.current_step >= step_count - 1)
    }
}

/// Reads the persisted position for a recipe title, defaulting to `(0, Primary)`.
pub fn resume<S: ProgressStore>(store: &S, title: &str) -> ResumePoint {
    store
        .load::<ProgressRecord>(&StorageKey::RecipeProgress(recipe_key(title)))
        .map(|record| ResumePoint {
            current_step: record.current_step,
            language: record.lang,
            completed: record.completed,
            last_left_at: Some(record.last_left_at),
        })
        .unwrap_or_default()
}

fn start_request(recipe: &StoredRecipe, language: Language) -> SyncRequest {
    SyncRequest::StartCooking(CookedRequest {
        title: recipe.title.clone(),
        content: recipe.content.clone(),
        language,
    })
}

/// Language last chosen for cooking, if any.
pub fn preferred_language<S: ProgressStore>(store: &S) -> Option<Language> {
    store.get(&StorageKey::CookingLang)?.parse().ok()
}

/// Step-by-step progress through one recipe, persisted after every mutation.
///
/// Every transition writes locally first; remote history updates are returned to the
/// caller as [`SyncRequest`]s and never block local progress.
#[derive(Debug)]
pub struct CookingSession<S: ProgressStore> {
    store: S,
    key: RecipeKey,
    record: ProgressRecord,
    steps: Vec<String>,
}

impl<S: ProgressStore> CookingSession<S> {
    /// Enters the cooking flow for `recipe`.
    ///
    /// A recipe without stored progress gets a fresh record at `start_step`; an existing
    /// record is resumed at its stored step. Either way a `StartCooking` sync is requested
    /// while the record has no history id, so a failed first attempt is retried here.
    pub fn begin(
        mut store: S,
        recipe: StoredRecipe,
        language: Language,
        start_step: usize,
    ) -> Result<(Self, Transition), StoreError> {
        let key = recipe.key();
        let existing = store.load::<ProgressRecord>(&StorageKey::RecipeProgress(key.clone()));
        store.set(&StorageKey::CookingLang, language.code().to_string())?;

        let (record, sync) = match existing {
            Some(mut record) => {
                tracing::debug!(
                    recipe = %key,
                    step = record.current_step,
                    "resuming stored progress"
                );
                let known_id = record.recipe.id.take();
                record.recipe = StoredRecipe {
                    id: recipe.id.or(known_id),
                    ..recipe
                };
                record.lang = language;
                record.last_left_at = Utc::now();
                let sync = match record.recipe.id {
                    Some(_) => None,
                    None => {
                        tracing::info!(recipe = %key, "no history id yet, recording again");
                        Some(start_request(&record.recipe, language))
                    }
                };
                (record, sync)
            }
            None => {
                let steps = recipe_parser::parse(&recipe.content, language).steps;
                let current_step = start_step.min(steps.len().saturating_sub(1));
                let sync = start_request(&recipe, language);
                tracing::info!(recipe = %key, step = current_step, "starting to cook");
                let record = ProgressRecord {
                    recipe,
                    current_step,
                    lang: language,
                    last_left_at: Utc::now(),
                    completed: false,
                };
                (record, Some(sync))
            }
        };

        let mut session = Self::from_record(store, record);
        let completion = session.settle_completion();
        session.persist()?;
        // A pending StartCooking wins; the completion follows once the id is known.
        let transition = session.transition(true, sync.or(completion));
        Ok((session, transition))
    }

    /// Rehydrates the most recent session snapshot, if one was stored.
    pub fn continue_current(store: S) -> Option<Self> {
        let snapshot = store.load::<SessionSnapshot>(&StorageKey::CookingProgress)?;
        let key = snapshot.recipe.key();
        let record = match store.load::<ProgressRecord>(&StorageKey::RecipeProgress(key)) {
            Some(mut record) => {
                record.current_step = snapshot.current_step;
                record.lang = snapshot.lang;
                record
            }
            None => ProgressRecord {
                recipe: snapshot.recipe,
                current_step: snapshot.current_step,
                lang: snapshot.lang,
                last_left_at: Utc::now(),
                completed: false,
            },
        };
        Some(Self::from_record(store, record))
    }

    fn from_record(store: S, record: ProgressRecord) -> Self {
        let steps = recipe_parser::parse(&record.recipe.content, record.lang).steps;
        Self {
            store,
            key: record.recipe.key(),
            record,
            steps,
        }
    }

    pub fn advance(&mut self) -> Result<Transition, StoreError> {
        let Some(last) = self.last_index() else {
            return Ok(self.transition(false, None));
        };

        let next = (self.record.current_step + 1).min(last);
        let changed = next != self.record.current_step;
        self.record.current_step = next;
        let sync = self.settle_completion();

        if changed || sync.is_some() {
            self.touch_and_persist()?;
        }
        Ok(self.transition(changed, sync))
    }

    pub fn retreat(&mut self) -> Result<Transition, StoreError> {
        if self.record.current_step == 0 {
            return Ok(self.transition(false, None));
        }

        let last = self.last_index().unwrap_or(0);
        self.record.current_step = (self.record.current_step - 1).min(last);

        // Stepping back out of a finished recipe reopens it.
        let mut sync = None;
        if self.record.completed {
            self.record.completed = false;
            sync = Some(self.history_update(Some(false)));
        }

        self.touch_and_persist()?;
        Ok(self.transition(true, sync))
    }

    /// Stores the language preference and keeps the step index. Landing on the last step
    /// of the new language completes the recipe.
    pub fn set_language(&mut self, language: Language) -> Result<Transition, StoreError> {
        let mut changed = self.record.lang != language;
        self.record.lang = language;
        self.steps = recipe_parser::parse(&self.record.recipe.content, language).steps;
        let sync = self.settle_completion();
        changed |= sync.is_some();
        self.store.set(&StorageKey::CookingLang, language.code().to_string())?;
        self.touch_and_persist()?;
        Ok(self.transition(changed, sync))
    }

    /// "Cook again": back to the first step with completion cleared.
    pub fn restart(&mut self) -> Result<Transition, StoreError> {
        let changed = self.record.current_step != 0 || self.record.completed;
        self.record.current_step = 0;
        self.record.completed = false;
        self.touch_and_persist()?;
        tracing::info!(recipe = %self.key, "restarting recipe");
        let sync = self.history_update(Some(false));
        Ok(self.transition(changed, Some(sync)))
    }

    /// Records the server-assigned history id so later updates can address it.
    pub fn attach_remote_id(&mut self, id: impl Into<String>) -> Result<(), StoreError> {
        self.record.recipe.id = Some(id.into());
        self.persist()
    }

    pub fn state(&self) -> CookingState {
        if self.record.completed {
            CookingState::Completed
        } else {
            CookingState::InProgress
        }
    }

    pub fn current_step(&self) -> usize {
        self.record.current_step
    }

    pub fn language(&self) -> Language {
        self.record.lang
    }

    pub fn is_completed(&self) -> bool {
        self.record.completed
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn current_instruction(&self) -> Option<&str> {
        self.steps.get(self.record.current_step).map(String::as_str)
    }

    pub fn is_last_step(&self) -> bool {
        self.last_index() == Some(self.record.current_step)
    }

    pub fn recipe(&self) -> &StoredRecipe {
        &self.record.recipe
    }

    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    pub fn key(&self) -> &RecipeKey {
        &self.key
    }

    pub fn document(&self) -> RecipeDocument {
        recipe_parser::parse(&self.record.recipe.content, self.record.lang)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn last_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }

    /// Flags the recipe completed once the position reaches the last step.
    fn settle_completion(&mut self) -> Option<SyncRequest> {
        let last = self.last_index()?;
        if self.record.current_step < last || self.record.completed {
            return None;
        }
        self.record.completed = true;
        tracing::info!(recipe = %self.key, "recipe completed");
        Some(self.history_update(Some(true)))
    }

    /// Progress made before the history record existed, to replay once it does.
    pub(crate) fn catch_up_update(&self) -> Option<SyncRequest> {
        if self.record.current_step == 0 && !self.record.completed {
            return None;
        }
        Some(self.history_update(Some(self.record.completed)))
    }

    fn history_update(&self, completed: Option<bool>) -> SyncRequest {
        SyncRequest::UpdateHistory {
            remote_id: self.record.recipe.id.clone(),
            update: UpdateCookedRequest {
                current_step: Some(self.record.current_step),
                completed,
            },
        }
    }

    fn transition(&self, changed: bool, sync: Option<SyncRequest>) -> Transition {
        Transition {
            state: self.state(),
            current_step: self.record.current_step,
            changed,
            sync,
        }
    }

    fn touch_and_persist(&mut self) -> Result<(), StoreError> {
        self.record.last_left_at = Utc::now();
        self.persist()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.store
            .save(&StorageKey::RecipeProgress(self.key.clone()), &self.record)?;
        let snapshot = SessionSnapshot {
            recipe: self.record.recipe.clone(),
            current_step: self.record.current_step,
            lang: self.record.lang,
        };
        self.store.save(&StorageKey::CookingProgress, &snapshot)
    }
}
