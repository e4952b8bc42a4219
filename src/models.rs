// The structs in this module map directly to the DB tables. Ingredients are stored as a JSON
// column on the recipe, since they're never queried on their own except for name lookups.

use crate::measure::ParsedQuantity;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Ingredient {
    /// Name of the ingredient, e.g. "Gin"
    pub name: String,
    /// Parsed quantity, if the source had one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<ParsedQuantity>,
}

impl Ingredient {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_quantity(self, quantity: Option<ParsedQuantity>) -> Self {
        Self { quantity, ..self }
    }
}

impl Display for Ingredient {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.quantity {
            Some(q) => write!(f, "{} {}", q, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, sqlx::FromRow)]
#[serde(default)]
pub struct Recipe {
    #[serde(skip_serializing)]
    pub recipe_id: Uuid,
    /// ID of the drink at the source API, used to avoid storing the same drink twice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[sqlx(rename = "recipe_name")]
    pub name: String,
    /// One entry per sentence of the source instructions
    pub instructions: Vec<String>,
    #[sqlx(json)]
    pub ingredients: Vec<Ingredient>,
    /// When the recipe was stored
    pub created_at: DateTime<Local>,
}

impl Recipe {
    pub fn new(name: &str) -> Self {
        Self {
            recipe_id: Uuid::new_v4(),
            name: name.into(),
            created_at: Local::now(),
            ..Default::default()
        }
    }

    pub fn with_source_id(self, source_id: &str) -> Self {
        Self {
            source_id: Some(source_id.into()),
            ..self
        }
    }

    pub fn with_instructions(self, instructions: Vec<String>) -> Self {
        Self {
            instructions,
            ..self
        }
    }

    pub fn with_ingredients(self, ingredients: Vec<Ingredient>) -> Self {
        Self {
            ingredients,
            ..self
        }
    }
}

impl Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} ({})",
            self.name,
            self.ingredients
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, sqlx::FromRow)]
#[serde(default)]
pub struct Review {
    #[serde(skip_serializing)]
    pub review_id: Uuid,
    #[serde(skip_serializing)]
    pub recipe_id: Uuid, // parent recipe
    /// 0 to 5
    pub rating: i16,
    #[sqlx(rename = "reviewed_at")]
    pub when: DateTime<Local>,
}

impl Display for Review {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.rating)
    }
}

/// ReviewRows maps a list of Review into lists of all its fields, for batch inserts with
/// Postgres' UNNEST.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewRows {
    pub review_ids: Vec<Uuid>,
    pub recipe_ids: Vec<Uuid>,
    pub ratings: Vec<i16>,
    pub whens: Vec<DateTime<Local>>,
}

impl ReviewRows {
    fn with_capacity(cap: usize) -> Self {
        Self {
            review_ids: Vec::with_capacity(cap),
            recipe_ids: Vec::with_capacity(cap),
            ratings: Vec::with_capacity(cap),
            whens: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.review_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.review_ids.is_empty()
    }
}

impl From<Vec<Review>> for ReviewRows {
    fn from(v: Vec<Review>) -> Self {
        let mut rr = Self::with_capacity(v.len());

        for r in v {
            rr.review_ids.push(r.review_id);
            rr.recipe_ids.push(r.recipe_id);
            rr.ratings.push(r.rating);
            rr.whens.push(r.when);
        }

        rr
    }
}

/// A recipe together with its average rating, as listed in the "top rated" report
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, sqlx::FromRow)]
#[serde(default)]
pub struct RatedRecipe {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub recipe: Recipe,
    pub rating: f64,
    pub review_count: i64,
}

impl Display for RatedRecipe {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}, Rating: {:.1} ({} reviews)",
            self.recipe.name, self.rating, self.review_count
        )
    }
}

/// A recipe with all its reviews, used when printing samples
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RecipeWithReviews {
    #[serde(flatten)]
    pub recipe: Recipe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub reviews: Vec<Review>,
}

impl RecipeWithReviews {
    pub fn new(recipe: Recipe, reviews: Vec<Review>) -> Self {
        let rating = average_rating(&reviews);
        Self {
            recipe,
            rating,
            reviews,
        }
    }
}

impl Display for RecipeWithReviews {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Recipe: {}, Rating: {} ({})",
            self.recipe.name,
            self.rating
                .map(|r| format!("{:.1}", r))
                .unwrap_or_else(|| String::from("-")),
            self.reviews
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: f64 = reviews.iter().map(|r| f64::from(r.rating)).sum();
    Some(sum / reviews.len() as f64)
}
