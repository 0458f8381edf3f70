use async_trait::async_trait;
use recipe_companion::api_connection::endpoints::{
    CookedRecord, CookedRequest, UpdateCookedRequest,
};
use recipe_companion::api_connection::ApiConnectionError;
use recipe_companion::progress::{
    resume, sync_transition, CookHistoryApi, CookingSession, CookingState, JsonFileStore,
    StoredRecipe, SyncOutcome,
};
use recipe_companion::recipe_parser::{self, split_generated, Language};
use std::sync::Mutex;
use tempfile::tempdir;

const GENERATED: &str = "Mixed Vegetable Curry
**Name:** Mixed Vegetable Curry
**Ingredients:**
* 1 carrot, diced
* 1 cup peas
* 2 tomatoes
**Instructions:**
1. Heat oil in a pan.
2. Add the carrot and cook for 5 minutes.
3. Add peas and tomatoes, simmer for 10 minutes.
4. Serve with rice.
**Approximate Nutritional Value**
* Calories: 220 kcal
* Protein: 6 g
**Hindi Translation**
**नाम:** मिक्स वेज करी
**सामग्री:**
* 1 गाजर
* 1 कप मटर
* 2 टमाटर
**निर्देश:**
1. पैन में तेल गरम करें।
2. गाजर डालें और 5 मिनट पकाएं।
3. मटर और टमाटर डालें।
4. चावल के साथ परोसें।
";

#[derive(Default)]
struct RecordingHistory {
    started: Mutex<Vec<CookedRequest>>,
    updates: Mutex<Vec<(String, UpdateCookedRequest)>>,
}

#[async_trait]
impl CookHistoryApi for RecordingHistory {
    async fn record_cooked(
        &self,
        request: &CookedRequest,
    ) -> Result<CookedRecord, ApiConnectionError> {
        self.started.lock().unwrap().push(request.clone());
        Ok(CookedRecord {
            id: "cooked-42".to_string(),
            title: request.title.clone(),
            content: request.content.clone(),
            language: Some(request.language),
            current_step: Some(0),
            completed: false,
        })
    }

    async fn update_cooked(
        &self,
        id: &str,
        update: &UpdateCookedRequest,
    ) -> Result<(), ApiConnectionError> {
        self.updates.lock().unwrap().push((id.to_string(), update.clone()));
        Ok(())
    }
}

#[test]
fn generated_recipe_parses_in_both_languages() {
    let (title, content) = split_generated(GENERATED);
    assert_eq!(title, "Mixed Vegetable Curry");

    let en = recipe_parser::parse(&content, Language::Primary);
    assert_eq!(en.title, "Mixed Vegetable Curry");
    assert_eq!(en.ingredients, vec!["1 carrot, diced", "1 cup peas", "2 tomatoes"]);
    assert_eq!(en.steps.len(), 4);
    assert_eq!(en.nutrition.len(), 2);

    let hi = recipe_parser::parse(&content, Language::Secondary);
    assert_eq!(hi.title, "मिक्स वेज करी");
    assert_eq!(hi.ingredients.len(), 3);
    assert_eq!(hi.steps[1], "गाजर डालें और 5 मिनट पकाएं।");
    assert!(hi.nutrition.is_empty());

    assert_eq!(recipe_parser::step_minutes(&en.steps[1]), Some(5));
    assert_eq!(recipe_parser::step_minutes(&hi.steps[1]), Some(5));
}

#[tokio::test]
async fn full_cook_through_survives_restarts_of_the_app() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let api = RecordingHistory::default();
    let (title, content) = split_generated(GENERATED);

    // First launch: start cooking and take two steps.
    {
        let recipe = StoredRecipe::new(title.clone(), content.clone());
        let (mut session, transition) =
            CookingSession::begin(JsonFileStore::new(&path), recipe, Language::Primary, 0).unwrap();
        let outcome = sync_transition(&mut session, &api, transition).await.unwrap();
        assert!(matches!(outcome, Some(SyncOutcome::Recorded(_))));

        session.advance().unwrap();
        session.advance().unwrap();
    }

    let point = resume(&JsonFileStore::new(&path), &title);
    assert_eq!(point.current_step, 2);
    assert_eq!(point.state(), CookingState::InProgress);

    // Second launch: pick up where we left off, in Hindi, and finish.
    {
        let mut session = CookingSession::continue_current(JsonFileStore::new(&path)).unwrap();
        assert_eq!(session.recipe().id.as_deref(), Some("cooked-42"));
        session.set_language(Language::Secondary).unwrap();
        assert_eq!(session.current_instruction(), Some("मटर और टमाटर डालें।"));

        let done = session.advance().unwrap();
        assert_eq!(done.state, CookingState::Completed);
        let outcome = sync_transition(&mut session, &api, done).await.unwrap();
        assert_eq!(outcome, Some(SyncOutcome::Updated));

        let again = session.advance().unwrap();
        assert!(sync_transition(&mut session, &api, again).await.unwrap().is_none());
    }

    // Third launch: cook it again.
    {
        let mut session = CookingSession::continue_current(JsonFileStore::new(&path)).unwrap();
        assert_eq!(session.state(), CookingState::Completed);
        let transition = session.restart().unwrap();
        sync_transition(&mut session, &api, transition).await.unwrap();
        assert_eq!(session.current_step(), 0);
        assert_eq!(session.language(), Language::Secondary);
    }

    assert_eq!(api.started.lock().unwrap().len(), 1);
    let updates = api.updates.lock().unwrap();
    assert_eq!(
        updates.iter().map(|(_, u)| u.completed).collect::<Vec<_>>(),
        vec![Some(true), Some(false)]
    );
    assert!(updates.iter().all(|(id, _)| id == "cooked-42"));

    let point = resume(&JsonFileStore::new(&path), &title);
    assert_eq!((point.current_step, point.completed), (0, false));
}

#[test]
fn corrupt_store_file_behaves_like_a_fresh_install() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    assert!(CookingSession::continue_current(JsonFileStore::new(&path)).is_none());
    let point = resume(&JsonFileStore::new(&path), "Mixed Vegetable Curry");
    assert_eq!(point.state(), CookingState::NotStarted);
    assert_eq!(point.language, Language::Primary);
}
