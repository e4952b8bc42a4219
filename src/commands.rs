// Top level implementations of the subcommands. Listings go to stdout, everything else is logged.

use crate::{
    cli::ScrapeArgs,
    cocktaildb, db,
    models::{Recipe, RecipeWithReviews},
    reviews::gen_reviews,
    scrape,
    signals::Shutdown,
};
use anyhow::{Context, Result, anyhow};
use chrono::Local;
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, info};

pub async fn scrape(pg: &PgPool, args: &ScrapeArgs) -> Result<scrape::Summary> {
    let client = cocktaildb::Client::build(args.client_opts())?;
    let mut shutdown = Shutdown::listen()?;
    Ok(scrape::run(&client, pg, &args.scrape_opts(), shutdown.recv()).await)
}

/// Generate and store random reviews for every recipe. Returns the number of reviews added.
pub async fn review(pg: &PgPool, seed: Option<u64>) -> Result<u64> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let now = Local::now();
    let mut total = 0;
    for recipe in db::list_recipes(pg).await? {
        let reviews = gen_reviews(&mut rng, now, recipe.recipe_id);
        if reviews.is_empty() {
            debug!(name = %recipe.name, "No reviews drawn");
            continue;
        }
        let added = db::insert_reviews(pg, reviews)
            .await
            .with_context(|| format!("failed to add reviews for {}", recipe.name))?;
        debug!(name = %recipe.name, added, "Added reviews");
        total += added;
    }
    info!(total, "Reviews added");
    Ok(total)
}

/// Print a recipe, its first review, and the recipe with all of its reviews
pub async fn sample(pg: &PgPool, name: &str) -> Result<()> {
    let recipe = db::find_recipe_by_name(pg, name)
        .await?
        .ok_or_else(|| anyhow!("no recipe named {name:?}"))?;
    let review = db::find_review_for_recipe(pg, recipe.recipe_id).await?;
    let reviews = db::list_reviews_for_recipe(pg, recipe.recipe_id).await?;
    let with_reviews = RecipeWithReviews::new(recipe.clone(), reviews);

    let mut out = String::new();
    out.push_str(&pretty(&recipe)?);
    out.push('\n');
    out.push_str(&pretty(&review)?);
    out.push('\n');
    out.push_str(&pretty(&with_reviews)?);
    println!("{out}");
    Ok(())
}

/// Print all recipes, the ones with a given ingredient, and the highest rated with their ratings
pub async fn report(pg: &PgPool, ingredient: &str, limit: i64) -> Result<()> {
    let all = db::list_recipes(pg).await?;
    let with_ingredient = db::find_recipes_with_ingredient(pg, ingredient).await?;
    let mut top = Vec::new();
    for rated in db::top_rated(pg, limit).await? {
        debug!(recipe = %rated, "Top rated");
        let reviews = db::list_reviews_for_recipe(pg, rated.recipe.recipe_id).await?;
        top.push(RecipeWithReviews::new(rated.recipe, reviews));
    }

    let mut out = String::new();
    out.push_str(&recipe_section("All Cocktails", &all));
    out.push_str(&recipe_section(&format!("{ingredient} Cocktails"), &with_ingredient));
    out.push_str(&rated_section(&format!("{limit} Highest Reviewed"), &top));
    print!("{out}");
    Ok(())
}

fn pretty<T: Serialize>(v: &T) -> Result<String> {
    serde_json::to_string_pretty(v).map_err(anyhow::Error::from)
}

fn heading(s: &str) -> String {
    format!("\n{}\n{}\n", s, "-".repeat(s.chars().count()))
}

fn recipe_section(title: &str, recipes: &[Recipe]) -> String {
    let lines: String = recipes
        .iter()
        .map(|r| format!("Cocktail: {}\n", r.name))
        .collect();
    heading(title) + &lines
}

fn rated_section(title: &str, recipes: &[RecipeWithReviews]) -> String {
    let lines: String = recipes.iter().map(|r| format!("{r}\n")).collect();
    heading(title) + &lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Review;

    #[test]
    fn heading_is_underlined() {
        assert_eq!("\nSorting\n-------\n", heading("Sorting"));
        // counts characters, not bytes
        assert_eq!("\nPiña Colada\n-----------\n", heading("Piña Colada"));
    }

    #[test]
    fn empty_section_is_just_the_heading() {
        assert_eq!(
            "\nVodka Cocktails\n---------------\n",
            recipe_section("Vodka Cocktails", &[])
        );
        assert_eq!("\nTop\n---\n", rated_section("Top", &[]));
    }

    #[test]
    fn sections() {
        let recipes = vec![Recipe::new("Addison"), Recipe::new("Negroni")];
        assert_eq!(
            "\nAll Cocktails\n-------------\nCocktail: Addison\nCocktail: Negroni\n",
            recipe_section("All Cocktails", &recipes)
        );

        let review = |rating| Review {
            rating,
            ..Default::default()
        };
        let rated = vec![RecipeWithReviews::new(
            Recipe::new("Negroni"),
            vec![review(4), review(5)],
        )];
        assert_eq!(
            "\nTop\n---\nRecipe: Negroni, Rating: 4.5 (4, 5)\n",
            rated_section("Top", &rated)
        );
    }
}
