mod seed;
mod storage;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use potluck_core::{
    available_categories, filter_recipes, sort_recipes, Category, EngineConfig, FilterMode,
    InteractionEngine, Recipe, RecipeQuery, RecipeStore, SortBy, UserProfile,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "potluck")]
#[command(about = "Browse and interact with a potluck recipe file", long_about = None)]
struct Cli {
    /// Recipe file to read and update
    #[arg(long, global = true, env = "POTLUCK_DATA", default_value = "recipes.json")]
    data: PathBuf,

    /// User acting on the recipes
    #[arg(long, global = true, env = "POTLUCK_USER", default_value = "me")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a set of sample recipes to the data file
    Seed {
        /// Overwrite an existing data file
        #[arg(long)]
        force: bool,
    },
    /// List recipes, optionally narrowed to a category or search query
    List {
        /// Category name to filter by
        #[arg(long)]
        category: Option<String>,
        /// Match the category against tags or regions (default: POTLUCK_FILTER_MODE)
        #[arg(long, value_parser = parse_filter_mode)]
        by: Option<FilterMode>,
        /// Search query, e.g. "curry tag:dinner max-time:45"
        #[arg(long, short)]
        query: Option<String>,
        /// newest | top-rated | most-liked | quickest
        #[arg(long, value_parser = parse_sort, default_value = "newest")]
        sort: SortBy,
    },
    /// List the categories present in the data file
    Categories {
        #[arg(long, value_parser = parse_filter_mode)]
        by: Option<FilterMode>,
    },
    /// Print a recipe as JSON
    Show { id: String },
    Like { id: String },
    Unlike { id: String },
    Save { id: String },
    Unsave { id: String },
    /// Rate a recipe from 0 to 5, replacing your earlier rating
    Rate { id: String, value: f64 },
    /// Comment on a recipe
    Comment {
        id: String,
        text: String,
        /// Display name (default: the user id)
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "")]
        avatar: String,
    },
    /// Delete a recipe and its comments
    Delete { id: String },
}

fn parse_filter_mode(s: &str) -> Result<FilterMode, String> {
    FilterMode::parse(s).ok_or_else(|| format!("expected 'tag' or 'region', got '{s}'"))
}

fn parse_sort(s: &str) -> Result<SortBy, String> {
    SortBy::parse(s).ok_or_else(|| {
        format!("expected newest, top-rated, most-liked or quickest, got '{s}'")
    })
}

fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = EngineConfig::from_env()?;

    if let Commands::Seed { force } = cli.command {
        return seed(&cli.data, force);
    }

    let store = Arc::new(RecipeStore::for_viewer(cli.user.clone()).with_config(&config));
    storage::load_into(&cli.data, &store)?;
    let engine = InteractionEngine::new(store, config);

    let mutated = run(&engine, &cli.user, cli.command)?;

    for failure in engine.take_sync_failures() {
        tracing::warn!(recipe_id = %failure.recipe_id, error = %failure.error, "change not synced");
    }

    if mutated {
        storage::save_store(&cli.data, engine.store())?;
    }

    Ok(())
}

fn seed(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let file = storage::RecipeFile::from(seed::sample_recipes());
    storage::save(path, &file)?;
    println!("Wrote {} recipes to {}", file.recipes.len(), path.display());
    Ok(())
}

/// Execute one command. Returns whether the store changed and should be saved.
fn run(engine: &InteractionEngine, user: &str, command: Commands) -> Result<bool> {
    let changed = match command {
        Commands::Seed { .. } => unreachable!("seed is handled before the store is loaded"),
        Commands::List {
            category,
            by,
            query,
            sort,
        } => {
            let mode = by.unwrap_or(engine.config().filter_mode);
            let selected = category.map(Category::named);
            let mut recipes = filter_recipes(&engine.store().snapshot(), selected.as_ref(), mode);
            if let Some(q) = query {
                recipes = RecipeQuery::parse(&q).apply(&recipes);
            }
            sort_recipes(&mut recipes, sort);

            if recipes.is_empty() {
                println!("No recipes found");
            }
            for recipe in &recipes {
                print_summary(recipe);
            }
            false
        }
        Commands::Categories { by } => {
            let mode = by.unwrap_or(engine.config().filter_mode);
            for category in available_categories(&engine.store().snapshot(), mode) {
                println!("{}", category.name);
            }
            false
        }
        Commands::Show { id } => {
            let recipe = engine.store().get(&id)?;
            println!("{}", serde_json::to_string_pretty(&recipe)?);
            false
        }
        Commands::Like { id } => report(engine.like(&id, user)?.changed, &id, "liked"),
        Commands::Unlike { id } => report(engine.unlike(&id, user)?.changed, &id, "unliked"),
        Commands::Save { id } => report(engine.save(&id, user)?.changed, &id, "saved"),
        Commands::Unsave { id } => report(engine.unsave(&id, user)?.changed, &id, "unsaved"),
        Commands::Rate { id, value } => {
            let outcome = engine.rate(&id, user, value)?;
            println!(
                "{}: rated {} ({:.2} from {} ratings)",
                id, value, outcome.recipe.rating, outcome.recipe.rating_count
            );
            true
        }
        Commands::Comment {
            id,
            text,
            name,
            avatar,
        } => {
            let author = UserProfile::new(user, name.unwrap_or_else(|| user.to_string()))
                .with_avatar(avatar);
            let comment = engine.comment(&id, &author, &text)?;
            println!("{}: comment {} added", id, comment.id);
            true
        }
        Commands::Delete { id } => {
            let removed = engine.delete(&id)?;
            println!(
                "Deleted {} ({} comments removed)",
                removed.title,
                removed.comment_count()
            );
            true
        }
    };

    Ok(changed)
}

fn report(changed: bool, id: &str, verb: &str) -> bool {
    if changed {
        println!("{id}: {verb}");
    } else {
        println!("{id}: already {verb}");
    }
    changed
}

fn print_summary(recipe: &Recipe) {
    let rating = if recipe.rating_count == 0 {
        "unrated".to_string()
    } else {
        format!("{:.1}★ ({})", recipe.rating, recipe.rating_count)
    };
    let mut flags = String::new();
    if recipe.is_liked {
        flags.push_str(" [liked]");
    }
    if recipe.is_saved {
        flags.push_str(" [saved]");
    }

    println!(
        "{:<24} {:<32} {:>4} min  {:>3} likes  {}{}",
        recipe.id,
        recipe.title,
        recipe.total_time(),
        recipe.likes,
        rating,
        flags
    );
}
