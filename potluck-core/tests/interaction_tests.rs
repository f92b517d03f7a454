//! End-to-end checks of the interaction engine against the store.

use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use potluck_core::{
    filter_recipes, Category, Difficulty, EngineConfig, FilterMode, InteractionEngine, Recipe,
    RecipeError, RecipeStore, UserProfile,
};

fn recipe(id: &str, tags: &[&str]) -> Recipe {
    Recipe {
        id: id.to_string(),
        title: format!("Recipe {id}"),
        description: String::new(),
        image_url: String::new(),
        ingredients: Vec::new(),
        steps: Vec::new(),
        region: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        prep_time: 5,
        cook_time: 10,
        servings: 4,
        difficulty: Difficulty::Easy,
        author_id: "chef".to_string(),
        author_name: "Chef".to_string(),
        author_avatar: String::new(),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        likes: 0,
        is_liked: false,
        is_saved: false,
        rating: 0.0,
        rating_count: 0,
        comments: Vec::new(),
    }
}

fn engine(recipes: Vec<Recipe>) -> InteractionEngine {
    let store = Arc::new(RecipeStore::new());
    for r in recipes {
        store.upsert(r).unwrap();
    }
    InteractionEngine::new(store, EngineConfig::default())
}

fn assert_rating_invariant(r: &Recipe) {
    if r.rating_count == 0 {
        assert_eq!(r.rating, 0.0, "unrated recipe {} has rating {}", r.id, r.rating);
    } else {
        assert!(
            (0.0..=5.0).contains(&r.rating),
            "recipe {} rating {} out of range",
            r.id,
            r.rating
        );
    }
}

#[test]
fn running_mean_example() {
    let store = RecipeStore::new();
    store.upsert(recipe("R", &[])).unwrap();

    let r = store.add_rating("R", 4.0).unwrap();
    assert_eq!(r.rating, 4.0);
    assert_eq!(r.rating_count, 1);

    let r = store.add_rating("R", 2.0).unwrap();
    assert_eq!(r.rating, 3.0);
    assert_eq!(r.rating_count, 2);
}

#[test]
fn like_example() {
    let mut r = recipe("R", &[]);
    r.likes = 5;
    let engine = engine(vec![r]);

    let out = engine.like("R", "U").unwrap();
    assert_eq!(out.recipe.likes, 6);
    assert!(out.recipe.is_liked);

    let out = engine.like("R", "U").unwrap();
    assert_eq!(out.recipe.likes, 6);
    assert!(out.recipe.is_liked);

    let other = engine.store().get_for_viewer("R", "V").unwrap();
    assert_eq!(other.likes, 6);
    assert!(!other.is_liked);
}

#[test]
fn unlike_never_liked_is_noop() {
    let mut r = recipe("R", &[]);
    r.likes = 2;
    let engine = engine(vec![r]);

    let before = engine.store().get_for_viewer("R", "U").unwrap();
    let out = engine.unlike("R", "U").unwrap();
    assert!(!out.changed);
    assert_eq!(out.recipe, before);
}

#[test]
fn empty_comment_leaves_store_unchanged() {
    let engine = engine(vec![recipe("R", &[])]);
    let before = engine.store().get("R").unwrap();

    let err = engine
        .comment("R", &UserProfile::new("U", "Uma"), "")
        .unwrap_err();
    assert!(matches!(err, RecipeError::InvalidComment(_)));
    assert_eq!(engine.store().get("R").unwrap(), before);
}

#[test]
fn rate_unknown_recipe_has_no_side_effects() {
    let engine = engine(vec![recipe("R", &[])]);
    let before = engine.store().snapshot();

    let err = engine.rate("missing", "U", 3.0).unwrap_err();
    assert_eq!(err, RecipeError::NotFound("missing".to_string()));
    assert_eq!(engine.store().snapshot(), before);
    assert_eq!(engine.store().rating_by("R", "U").unwrap(), None);
}

#[test]
fn filter_without_selection_is_identity() {
    let recipes = vec![
        recipe("b", &["dinner"]),
        recipe("a", &["lunch"]),
        recipe("c", &[]),
    ];
    assert_eq!(filter_recipes(&recipes, None, FilterMode::Tag), recipes);
    assert!(filter_recipes(&[], Some(&Category::named("dinner")), FilterMode::Tag).is_empty());
}

#[test]
fn ratings_stay_in_range_across_many_users() {
    let engine = engine(vec![recipe("R", &[])]);
    let values = [0.0, 5.0, 2.5, 4.75, 1.0, 3.3, 5.0, 0.1];

    for (i, value) in values.iter().enumerate() {
        let out = engine.rate("R", &format!("user-{i}"), *value).unwrap();
        assert_rating_invariant(&out.recipe);
    }
    for (i, value) in values.iter().enumerate() {
        // Everyone changes their mind
        let out = engine.rate("R", &format!("user-{i}"), 5.0 - value).unwrap();
        assert_rating_invariant(&out.recipe);
    }

    let r = engine.store().get("R").unwrap();
    assert_eq!(r.rating_count, values.len() as u64);
    let expected = values.iter().map(|v| 5.0 - v).sum::<f64>() / values.len() as f64;
    assert!((r.rating - expected).abs() < 1e-9);
}

#[test]
fn concurrent_likes_count_each_user_once() {
    let engine = Arc::new(engine(vec![recipe("R", &[]), recipe("S", &[])]));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for u in 0..50 {
                    // Every thread likes as the same 50 users, so most calls are duplicates
                    let user = format!("user-{u}");
                    engine.like("R", &user).unwrap();
                    engine.save("S", &user).unwrap();
                    if t % 2 == 0 {
                        engine.like("S", &format!("t{t}-{u}")).unwrap();
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(engine.store().get("R").unwrap().likes, 50);
    assert_eq!(engine.store().get("S").unwrap().likes, 4 * 50);
    assert!(engine.store().get_for_viewer("S", "user-7").unwrap().is_saved);
}

#[test]
fn concurrent_ratings_keep_count_and_mean_consistent() {
    let engine = Arc::new(engine(vec![recipe("R", &[])]));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..25 {
                    let out = engine.rate("R", &format!("t{t}-{i}"), 4.0).unwrap();
                    assert_eq!(out.recipe.rating, 4.0);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let r = engine.store().get("R").unwrap();
    assert_eq!(r.rating_count, 100);
    assert!((r.rating - 4.0).abs() < 1e-9);
}

#[test]
fn redelivered_comment_applies_once() {
    let engine = engine(vec![recipe("R", &[])]);
    let author = UserProfile::new("U", "Uma");

    let comment = engine.comment("R", &author, "Made this twice already").unwrap();
    for _ in 0..3 {
        assert!(!engine.redeliver_comment(comment.clone()).unwrap().changed);
    }

    let r = engine.store().get("R").unwrap();
    assert_eq!(r.comment_count(), 1);
    assert_eq!(r.comments[0].id, comment.id);
}

#[test]
fn delete_removes_comments_with_recipe() {
    let engine = engine(vec![recipe("R", &[])]);
    engine
        .comment("R", &UserProfile::new("U", "Uma"), "Nice")
        .unwrap();

    let removed = engine.delete("R").unwrap();
    assert_eq!(removed.comment_count(), 1);
    assert!(matches!(
        engine.comment("R", &UserProfile::new("U", "Uma"), "Hello?"),
        Err(RecipeError::NotFound(_))
    ));
}
