use chrono::{TimeZone, Utc};
use potluck_core::{Difficulty, Ingredient, Recipe, Step};

struct SeedRecipe {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    region: Option<&'static str>,
    tags: &'static [&'static str],
    ingredients: &'static [(&'static str, &'static str, &'static str)], // (name, amount, unit)
    steps: &'static [&'static str],
    prep_time: u32,
    cook_time: u32,
    servings: u32,
    difficulty: Difficulty,
    /// Day of January 2024 the recipe was shared
    shared_on: u32,
    likes: u64,
    rating: f64,
    rating_count: u64,
}

const SAMPLE_RECIPES: &[SeedRecipe] = &[
    SeedRecipe {
        id: "spaghetti-carbonara",
        title: "Classic Spaghetti Carbonara",
        description: "A rich and creamy Italian pasta dish with eggs, cheese, and pancetta.",
        region: Some("Italian"),
        tags: &["pasta", "dinner", "quick"],
        ingredients: &[
            ("spaghetti", "400", "g"),
            ("pancetta", "200", "g"),
            ("eggs", "4", "large"),
            ("Pecorino Romano", "100", "g"),
            ("black pepper", "2", "tsp"),
        ],
        steps: &[
            "Cook spaghetti in salted water until al dente.",
            "Fry pancetta until crispy.",
            "Whisk eggs with grated cheese and pepper.",
            "Toss hot pasta with pancetta off the heat, then stir in the egg mixture.",
        ],
        prep_time: 10,
        cook_time: 15,
        servings: 4,
        difficulty: Difficulty::Medium,
        shared_on: 3,
        likes: 12,
        rating: 4.5,
        rating_count: 4,
    },
    SeedRecipe {
        id: "chicken-tikka-masala",
        title: "Chicken Tikka Masala",
        description: "Tender chicken pieces in a creamy, spiced tomato sauce.",
        region: Some("Indian"),
        tags: &["curry", "dinner", "spicy"],
        ingredients: &[
            ("chicken thighs", "800", "g"),
            ("yogurt", "1", "cup"),
            ("garam masala", "2", "tbsp"),
            ("tomato puree", "400", "g"),
            ("heavy cream", "1", "cup"),
        ],
        steps: &[
            "Marinate chicken in yogurt and spices for at least 2 hours.",
            "Grill the chicken until charred.",
            "Simmer tomato puree, cream and spices for 15 minutes.",
            "Add the chicken and simmer 10 minutes more.",
        ],
        prep_time: 130,
        cook_time: 40,
        servings: 4,
        difficulty: Difficulty::Medium,
        shared_on: 7,
        likes: 30,
        rating: 4.8,
        rating_count: 10,
    },
    SeedRecipe {
        id: "overnight-oats",
        title: "Overnight Oats",
        description: "Make-ahead breakfast that waits for you in the fridge.",
        region: None,
        tags: &["breakfast", "vegetarian", "quick"],
        ingredients: &[
            ("rolled oats", "1/2", "cup"),
            ("milk", "1/2", "cup"),
            ("chia seeds", "1", "tbsp"),
            ("maple syrup", "1-2", "tsp"),
        ],
        steps: &[
            "Stir everything together in a jar.",
            "Refrigerate overnight.",
        ],
        prep_time: 5,
        cook_time: 0,
        servings: 1,
        difficulty: Difficulty::Easy,
        shared_on: 12,
        likes: 4,
        rating: 0.0,
        rating_count: 0,
    },
    SeedRecipe {
        id: "fish-tacos",
        title: "Baja Fish Tacos",
        description: "Crispy battered fish with cabbage slaw and lime crema.",
        region: Some("Mexican"),
        tags: &["seafood", "dinner"],
        ingredients: &[
            ("white fish fillets", "500", "g"),
            ("corn tortillas", "8", ""),
            ("red cabbage", "2", "cups"),
            ("lime", "1", ""),
        ],
        steps: &[
            "Batter and fry the fish.",
            "Toss the cabbage with lime juice and salt.",
            "Warm tortillas and assemble.",
        ],
        prep_time: 20,
        cook_time: 15,
        servings: 4,
        difficulty: Difficulty::Medium,
        shared_on: 18,
        likes: 9,
        rating: 4.0,
        rating_count: 2,
    },
    SeedRecipe {
        id: "mushroom-risotto",
        title: "Mushroom Risotto",
        description: "Slow-stirred arborio rice with mixed mushrooms and parmesan.",
        region: Some("Italian"),
        tags: &["vegetarian", "dinner"],
        ingredients: &[
            ("arborio rice", "300", "g"),
            ("mixed mushrooms", "400", "g"),
            ("vegetable stock", "1.2", "l"),
            ("parmesan", "60", "g"),
        ],
        steps: &[
            "Saute the mushrooms and set aside.",
            "Toast the rice, then add stock a ladle at a time.",
            "Fold in mushrooms and parmesan.",
        ],
        prep_time: 15,
        cook_time: 35,
        servings: 4,
        difficulty: Difficulty::Hard,
        shared_on: 25,
        likes: 0,
        rating: 0.0,
        rating_count: 0,
    },
];

impl SeedRecipe {
    fn to_recipe(&self) -> Recipe {
        Recipe {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            image_url: format!("https://images.potluck.example/{}.png", self.id),
            ingredients: self
                .ingredients
                .iter()
                .enumerate()
                .map(|(i, (name, amount, unit))| Ingredient {
                    id: format!("ing-{}", i + 1),
                    name: name.to_string(),
                    amount: amount.to_string(),
                    unit: unit.to_string(),
                })
                .collect(),
            steps: self
                .steps
                .iter()
                .enumerate()
                .map(|(i, description)| Step {
                    id: format!("step-{}", i + 1),
                    description: description.to_string(),
                    image_url: None,
                })
                .collect(),
            region: self.region.map(str::to_string),
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings: self.servings,
            difficulty: self.difficulty,
            author_id: "potluck-kitchen".to_string(),
            author_name: "Potluck Kitchen".to_string(),
            author_avatar: String::new(),
            created_at: Utc
                .with_ymd_and_hms(2024, 1, self.shared_on, 12, 0, 0)
                .single()
                .unwrap_or_default(),
            likes: self.likes,
            is_liked: false,
            is_saved: false,
            rating: self.rating,
            rating_count: self.rating_count,
            comments: Vec::new(),
        }
    }
}

/// The sample recipes written by `potluck seed`.
pub fn sample_recipes() -> Vec<Recipe> {
    SAMPLE_RECIPES.iter().map(SeedRecipe::to_recipe).collect()
}
