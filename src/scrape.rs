// The scrape loop: fetch drinks one at a time, convert them to recipes and store them.
// Nothing here runs concurrently, a failing drink is logged and skipped and the loop moves on.

use crate::{
    cocktaildb::{self, Drink, DrinkError, MeasurePolicy},
    db,
    models::Recipe,
    util::wait_jittered,
};
use anyhow::Result;
use sqlx::PgPool;
use std::{future::Future, pin::pin, time::Duration};
use tracing::{debug, error, info, warn};

/// Where drinks come from
// only awaited inline by `run`, the futures never need to be Send
#[allow(async_fn_in_trait)]
pub trait DrinkSource {
    fn name(&self) -> &'static str;
    async fn fetch(&self, target: &Target) -> Result<Drink, DrinkError>;
}

/// Where recipes end up. `store` returns false if the recipe was already there.
#[allow(async_fn_in_trait)]
pub trait RecipeSink {
    async fn store(&self, recipe: &Recipe) -> Result<bool>;
}

impl DrinkSource for cocktaildb::Client {
    fn name(&self) -> &'static str {
        "TheCocktailDB"
    }

    async fn fetch(&self, target: &Target) -> Result<Drink, DrinkError> {
        match target {
            Target::Random => self.random_drink().await,
            Target::Id(id) => self.lookup_drink(id).await,
        }
    }
}

impl RecipeSink for PgPool {
    async fn store(&self, recipe: &Recipe) -> Result<bool> {
        db::insert_recipe(self, recipe).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Random,
    Id(String),
}

#[derive(Debug, Clone, Default)]
pub struct Opts {
    /// Number of random drinks to fetch, ignored if `ids` is set
    pub count: usize,
    /// Fetch exactly these drinks instead of random ones
    pub ids: Vec<String>,
    pub delay: Duration,
    pub jitter: Duration,
    pub policy: MeasurePolicy,
}

impl Opts {
    pub fn targets(&self) -> Vec<Target> {
        if self.ids.is_empty() {
            vec![Target::Random; self.count]
        } else {
            self.ids.iter().cloned().map(Target::Id).collect()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub stored: usize,
    pub duplicates: usize,
    pub failed: usize,
}

enum Outcome {
    Stored,
    Duplicate,
}

async fn scrape_one<S, K>(
    source: &S,
    sink: &K,
    target: &Target,
    policy: MeasurePolicy,
) -> Result<Outcome>
where
    S: DrinkSource,
    K: RecipeSink,
{
    let drink = source.fetch(target).await?;
    info!(drink = %drink.id, name = %drink.name, "Fetched drink");
    let recipe = drink.to_recipe(policy)?;
    debug!(?recipe, "Converted drink");
    if sink.store(&recipe).await? {
        Ok(Outcome::Stored)
    } else {
        Ok(Outcome::Duplicate)
    }
}

/// Run the scrape loop until all targets are done, or `stop` resolves. A resolved `stop` is
/// checked before each item, so an item in progress is abandoned.
pub async fn run<S, K, F>(source: &S, sink: &K, opts: &Opts, stop: F) -> Summary
where
    S: DrinkSource,
    K: RecipeSink,
    F: Future<Output = ()>,
{
    let targets = opts.targets();
    let mut stop = pin!(stop);
    let mut summary = Summary::default();
    info!(source = source.name(), count = targets.len(), "Starting scrape");

    for (n, target) in targets.iter().enumerate() {
        let res = tokio::select! {
            biased;
            _ = &mut stop => {
                warn!(n, "Scrape interrupted");
                break;
            }
            res = scrape_one(source, sink, target, opts.policy) => res,
        };
        match res {
            Ok(Outcome::Stored) => summary.stored += 1,
            Ok(Outcome::Duplicate) => {
                debug!(n, "Drink already stored");
                summary.duplicates += 1;
            }
            Err(err) => {
                error!(n, ?target, "Failed to scrape drink: {err:#}");
                summary.failed += 1;
            }
        }

        if n + 1 < targets.len() {
            tokio::select! {
                biased;
                _ = &mut stop => {
                    warn!(n, "Scrape interrupted");
                    break;
                }
                _ = wait_jittered(opts.delay, opts.jitter) => {}
            }
        }
    }

    info!(
        stored = summary.stored,
        duplicates = summary.duplicates,
        failed = summary.failed,
        "Scrape done"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, collections::HashSet, future::pending};

    /// Hands out canned drinks by id, random targets cycle through them
    struct FakeSource {
        drinks: Vec<serde_json::Value>,
        next: RefCell<usize>,
    }

    impl FakeSource {
        fn new(drinks: Vec<serde_json::Value>) -> Self {
            Self {
                drinks,
                next: RefCell::new(0),
            }
        }
    }

    impl DrinkSource for FakeSource {
        fn name(&self) -> &'static str {
            "Fake"
        }

        async fn fetch(&self, target: &Target) -> Result<Drink, DrinkError> {
            let j = match target {
                Target::Random => {
                    let mut next = self.next.borrow_mut();
                    let j = self.drinks[*next % self.drinks.len()].clone();
                    *next += 1;
                    j
                }
                Target::Id(id) => self
                    .drinks
                    .iter()
                    .find(|d| d["idDrink"] == id.as_str())
                    .cloned()
                    .ok_or_else(|| DrinkError::NotFound(id.clone()))?,
            };
            Ok(serde_json::from_value(j).unwrap())
        }
    }

    #[derive(Default)]
    struct FakeSink {
        stored: RefCell<HashSet<String>>,
    }

    impl RecipeSink for FakeSink {
        async fn store(&self, recipe: &Recipe) -> Result<bool> {
            let id = recipe.source_id.clone().unwrap_or_default();
            Ok(self.stored.borrow_mut().insert(id))
        }
    }

    fn drink(id: &str, measure: &str) -> serde_json::Value {
        serde_json::json!({
            "idDrink": id,
            "strDrink": format!("Drink {id}"),
            "strInstructions": "Shake. Strain.",
            "strIngredient1": "Gin",
            "strMeasure1": measure,
            "strIngredient2": null,
        })
    }

    fn source() -> FakeSource {
        FakeSource::new(vec![
            drink("1", "2 cl"),
            drink("2", "a dash"),
            drink("3", "Juice of 1/2"),
        ])
    }

    #[test]
    fn targets_from_opts() {
        let opts = Opts {
            count: 2,
            ..Default::default()
        };
        assert_eq!(vec![Target::Random, Target::Random], opts.targets());

        let opts = Opts {
            count: 2,
            ids: vec![String::from("11003")],
            ..Default::default()
        };
        assert_eq!(vec![Target::Id(String::from("11003"))], opts.targets());
    }

    #[tokio::test]
    async fn failures_are_skipped() {
        let sink = FakeSink::default();
        let opts = Opts {
            count: 4,
            ..Default::default()
        };
        let summary = run(&source(), &sink, &opts, pending()).await;
        assert_eq!(
            Summary {
                stored: 2,
                duplicates: 1,
                failed: 1
            },
            summary
        );
        assert_eq!(2, sink.stored.borrow().len());
    }

    #[tokio::test]
    async fn skip_policy_keeps_drink() {
        let sink = FakeSink::default();
        let opts = Opts {
            count: 3,
            policy: MeasurePolicy::Skip,
            ..Default::default()
        };
        let summary = run(&source(), &sink, &opts, pending()).await;
        assert_eq!(3, summary.stored);
        assert_eq!(0, summary.failed);
    }

    #[tokio::test]
    async fn lookup_by_id() {
        let sink = FakeSink::default();
        let opts = Opts {
            ids: vec![String::from("3"), String::from("404")],
            ..Default::default()
        };
        let summary = run(&source(), &sink, &opts, pending()).await;
        assert_eq!(1, summary.stored);
        assert_eq!(1, summary.failed);
        assert!(sink.stored.borrow().contains("3"));
    }

    #[tokio::test]
    async fn stop_ends_loop() {
        let sink = FakeSink::default();
        let opts = Opts {
            count: 10,
            ..Default::default()
        };
        let summary = run(&source(), &sink, &opts, std::future::ready(())).await;
        assert_eq!(Summary::default(), summary);
    }
}
