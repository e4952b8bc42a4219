// Client for the public TheCocktailDB JSON API, and conversion of its drinks into our recipe
// structure.
//
// The API returns ingredients as numbered, flat fields: strIngredient1..strIngredient15 with
// matching strMeasure1..strMeasure15, padded with nulls. We walk them in order until the first
// missing ingredient.

use crate::{
    measure::{MeasureError, parse_measure},
    models::{Ingredient, Recipe},
    util::split_instructions,
};
use clap::ValueEnum;
use serde::Deserialize;
use serde_json::Value;
use std::{collections::HashMap, time::Duration};
use tracing::{trace, warn};

pub static DEFAULT_BASE_URL: &str = "https://www.thecocktaildb.com/api/json/v1/1";
static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(thiserror::Error, Debug)]
pub enum DrinkError {
    #[error("no drink found with id {0}")]
    NotFound(String),
    #[error("response did not contain any drinks")]
    EmptyResponse,
    #[error("drink {drink}: {source}")]
    Measure {
        drink: String,
        #[source]
        source: MeasureError,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// What to do with an ingredient whose measurement can't be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MeasurePolicy {
    /// Give up on the whole drink
    #[default]
    Abort,
    /// Keep the ingredient, but without a quantity
    Skip,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DrinksResponse {
    drinks: Option<Vec<Drink>>,
}

/// A drink as returned by the API. Only the fields we need are named, the rest are kept in
/// `fields` so the numbered ingredient and measure fields can be looked up.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Drink {
    #[serde(rename = "idDrink")]
    pub id: String,
    #[serde(rename = "strDrink")]
    pub name: String,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

impl Drink {
    /// A field as a string, if it's present and not blank. Blank counts the same as null.
    fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Ingredient names with their raw measurements, in order, up to the first missing name
    pub fn ingredients(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        (1..).map_while(move |i| {
            let name = self.field(&format!("strIngredient{i}"))?;
            Some((name, self.field(&format!("strMeasure{i}"))))
        })
    }

    pub fn to_recipe(&self, policy: MeasurePolicy) -> Result<Recipe, DrinkError> {
        let mut ingredients = Vec::new();
        for (name, measure) in self.ingredients() {
            let quantity = match parse_measure(measure) {
                Ok(q) => q,
                Err(err) if policy == MeasurePolicy::Skip => {
                    warn!(drink = %self.id, ingredient = name, %err, "Dropping unparseable quantity");
                    None
                }
                Err(source) => {
                    return Err(DrinkError::Measure {
                        drink: self.id.clone(),
                        source,
                    });
                }
            };
            ingredients.push(Ingredient::new(name.trim()).with_quantity(quantity));
        }

        Ok(Recipe::new(self.name.trim())
            .with_source_id(&self.id)
            .with_instructions(split_instructions(
                self.instructions.as_deref().unwrap_or_default(),
            ))
            .with_ingredients(ingredients))
    }
}

#[derive(Clone, Debug)]
pub struct Opts {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Opts {
    fn build_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::ClientBuilder::new()
            .user_agent(APP_USER_AGENT)
            .timeout(self.request_timeout)
            .build()
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn build(opts: Opts) -> reqwest::Result<Self> {
        Ok(Self {
            client: opts.build_client()?,
            base_url: opts.base_url.trim_end_matches('/').into(),
        })
    }

    async fn get_drinks(&self, req: reqwest::RequestBuilder) -> Result<Vec<Drink>, DrinkError> {
        let res: DrinksResponse = req.send().await?.error_for_status()?.json().await?;
        Ok(res.drinks.unwrap_or_default())
    }

    /// Fetch a single random drink
    pub async fn random_drink(&self) -> Result<Drink, DrinkError> {
        let url = format!("{}/random.php", self.base_url);
        trace!(%url, "Fetching random drink...");
        self.get_drinks(self.client.get(url))
            .await?
            .into_iter()
            .next()
            .ok_or(DrinkError::EmptyResponse)
    }

    /// Fetch a drink by its API id
    pub async fn lookup_drink(&self, id: &str) -> Result<Drink, DrinkError> {
        let url = format!("{}/lookup.php", self.base_url);
        trace!(%url, id, "Looking up drink...");
        self.get_drinks(self.client.get(url).query(&[("i", id)]))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DrinkError::NotFound(id.into()))
    }
}
