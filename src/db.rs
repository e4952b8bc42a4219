// Recipes and reviews live in Postgres. Ingredients are a jsonb column on the recipe, so a
// recipe is always written and read in one statement. Reviews are inserted in batches, one batch
// per recipe, in a transaction so a recipe never ends up with half its generated reviews.

use crate::models::{RatedRecipe, Recipe, Review, ReviewRows};
use anyhow::{Context, Error, Result};
use sqlx::{Executor, PgPool, Postgres, postgres::PgPoolOptions, types::Json};
use std::time::Instant;
use tracing::trace;
use uuid::Uuid;

pub async fn connect(url: &str) -> Result<PgPool> {
    let pg = PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .context("failed to connect to database")?;
    trace!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pg)
        .await
        .context("failed to run migrations")?;
    Ok(pg)
}

/// Store a recipe. Returns false if a recipe for the same source drink was already stored.
pub async fn insert_recipe(pg: &PgPool, recipe: &Recipe) -> Result<bool> {
    trace!(name = %recipe.name, "Adding recipe with {} ingredients to DB", recipe.ingredients.len());

    let res = sqlx::query(
        r#"
            insert into recipe (recipe_id, source_id, recipe_name, instructions, ingredients, created_at)
            values ($1, $2, $3, $4, $5, $6)
            on conflict (source_id) do nothing
        "#,
    )
    .bind(recipe.recipe_id)
    .bind(recipe.source_id.as_deref())
    .bind(&recipe.name)
    .bind(&recipe.instructions[..])
    .bind(Json(&recipe.ingredients))
    .bind(recipe.created_at)
    .execute(pg)
    .await?;

    Ok(res.rows_affected() > 0)
}

pub async fn list_recipes(pg: &PgPool) -> Result<Vec<Recipe>> {
    let start = Instant::now();
    let res = sqlx::query_as::<_, Recipe>(
        r#"
            select recipe_id, source_id, recipe_name, instructions, ingredients, created_at
            from recipe order by recipe_name
        "#,
    )
    .fetch_all(pg)
    .await?;
    trace!("Fetched {} recipes in {:?}", res.len(), start.elapsed());
    Ok(res)
}

pub async fn find_recipe_by_name<'e, E>(executor: E, name: &str) -> Result<Option<Recipe>>
where
    E: Executor<'e, Database = Postgres>,
{
    trace!(name, "Searching for recipe...");

    sqlx::query_as::<_, Recipe>(
        r#"
            select recipe_id, source_id, recipe_name, instructions, ingredients, created_at
            from recipe where recipe_name = $1 order by created_at limit 1
        "#,
    )
    .bind(name)
    .fetch_optional(executor)
    .await
    .map_err(Error::from)
}

/// All recipes with an ingredient of exactly the given name
pub async fn find_recipes_with_ingredient(pg: &PgPool, ingredient: &str) -> Result<Vec<Recipe>> {
    trace!(ingredient, "Searching for recipes by ingredient...");

    sqlx::query_as::<_, Recipe>(
        r#"
            select recipe_id, source_id, recipe_name, instructions, ingredients, created_at
            from recipe where ingredients @> $1 order by recipe_name
        "#,
    )
    .bind(Json(serde_json::json!([{ "name": ingredient }])))
    .fetch_all(pg)
    .await
    .map_err(Error::from)
}

/// Batch insert reviews. Returns the number of reviews added.
pub async fn insert_reviews(pg: &PgPool, reviews: Vec<Review>) -> Result<u64> {
    // convert to format suitable for use with unnest
    let rows = ReviewRows::from(reviews);
    if rows.is_empty() {
        return Ok(0);
    }
    trace!("Adding {} reviews to DB", rows.len());

    let mut tx = pg.begin().await?;
    let res = sqlx::query(
        r#"
            insert into review (review_id, recipe_id, rating, reviewed_at)
            select * from unnest($1::uuid[], $2::uuid[], $3::int2[], $4::timestamptz[])
        "#,
    )
    .bind(&rows.review_ids[..])
    .bind(&rows.recipe_ids[..])
    .bind(&rows.ratings[..])
    .bind(&rows.whens[..])
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(res.rows_affected())
}

/// The earliest review of a recipe, if it has any
pub async fn find_review_for_recipe(pg: &PgPool, recipe_id: Uuid) -> Result<Option<Review>> {
    sqlx::query_as::<_, Review>(
        r#"
            select review_id, recipe_id, rating, reviewed_at from review
            where recipe_id = $1 order by reviewed_at limit 1
        "#,
    )
    .bind(recipe_id)
    .fetch_optional(pg)
    .await
    .map_err(Error::from)
}

pub async fn list_reviews_for_recipe(pg: &PgPool, recipe_id: Uuid) -> Result<Vec<Review>> {
    sqlx::query_as::<_, Review>(
        r#"
            select review_id, recipe_id, rating, reviewed_at from review
            where recipe_id = $1 order by reviewed_at
        "#,
    )
    .bind(recipe_id)
    .fetch_all(pg)
    .await
    .map_err(Error::from)
}

/// Recipes with at least one review, best average rating first
pub async fn top_rated(pg: &PgPool, limit: i64) -> Result<Vec<RatedRecipe>> {
    let start = Instant::now();
    let res = sqlx::query_as::<_, RatedRecipe>(
        r#"
            select r.recipe_id, r.source_id, r.recipe_name, r.instructions, r.ingredients, r.created_at,
                avg(v.rating)::float8 as rating, count(v.review_id) as review_count
            from recipe r join review v on v.recipe_id = r.recipe_id
            group by r.recipe_id
            order by rating desc, r.recipe_name
            limit $1
        "#,
    )
    .bind(limit)
    .fetch_all(pg)
    .await?;
    trace!("Fetched top {} rated recipes in {:?}", res.len(), start.elapsed());
    Ok(res)
}
