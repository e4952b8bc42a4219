// Generation of fake reviews, to have something to aggregate on while developing queries.
//
// Each recipe gets between 0 and 20 ratings, drawn from a normal distribution with a random mean
// and spread, so that some recipes end up clearly better rated than others.

use crate::models::Review;
use chrono::{DateTime, Local, TimeDelta};
use rand::Rng;
use rand_distr::Normal;
use uuid::Uuid;

pub const MAX_RATINGS: usize = 20;
pub const MIN_RATING: i16 = 0;
pub const MAX_RATING: i16 = 5;
const MAX_AGE_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub rating: i16,
    pub when: DateTime<Local>,
}

impl Rating {
    pub fn for_recipe(self, recipe_id: Uuid) -> Review {
        Review {
            review_id: Uuid::new_v4(),
            recipe_id,
            rating: self.rating,
            when: self.when,
        }
    }
}

/// Generate a random set of ratings for one recipe, dated within the year before `now`.
/// Samples are rounded half to even before clamping.
pub fn gen_ratings<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Local>) -> Vec<Rating> {
    let count = rng.random_range(0..=MAX_RATINGS);
    let mean = f64::from(rng.random_range(1..=MAX_RATING));
    let std_dev = rng.random_range(0.0..2.0);
    let Ok(dist) = Normal::new(mean, std_dev) else {
        return Vec::new();
    };

    (0..count)
        .map(|_| Rating {
            rating: clamp_rating(rng.sample(dist)),
            when: now - TimeDelta::seconds(rng.random_range(0..MAX_AGE_SECS)),
        })
        .collect()
}

fn clamp_rating(v: f64) -> i16 {
    (v.round_ties_even() as i16).clamp(MIN_RATING, MAX_RATING)
}

/// Generate ratings for one recipe and turn them into reviews for it
pub fn gen_reviews<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Local>,
    recipe_id: Uuid,
) -> Vec<Review> {
    gen_ratings(rng, now)
        .into_iter()
        .map(|r| r.for_recipe(recipe_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn ratings_are_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let now = Local::now();
        let year_ago = now - TimeDelta::days(365);
        for _ in 0..500 {
            let ratings = gen_ratings(&mut rng, now);
            assert!(ratings.len() <= MAX_RATINGS);
            for r in ratings {
                assert!((MIN_RATING..=MAX_RATING).contains(&r.rating), "{r:?}");
                assert!(r.when <= now && r.when > year_ago, "{r:?}");
            }
        }
    }

    #[test]
    fn seeded_runs_repeat() {
        let now = Local::now();
        let a = gen_ratings(&mut StdRng::seed_from_u64(7), now);
        let b = gen_ratings(&mut StdRng::seed_from_u64(7), now);
        assert_eq!(a, b);
    }

    #[test]
    fn counts_vary() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = Local::now();
        let counts: Vec<usize> = (0..200).map(|_| gen_ratings(&mut rng, now).len()).collect();
        assert!(counts.iter().any(|c| *c < 5));
        assert!(counts.iter().any(|c| *c > 15));
    }

    #[test]
    fn ratings_are_clamped() {
        assert_eq!(0, clamp_rating(-1.7));
        assert_eq!(0, clamp_rating(0.4));
        // halves go to the even neighbour
        assert_eq!(2, clamp_rating(2.5));
        assert_eq!(4, clamp_rating(3.5));
        assert_eq!(3, clamp_rating(2.51));
        assert_eq!(5, clamp_rating(5.49));
        assert_eq!(5, clamp_rating(9.0));
    }

    #[test]
    fn reviews_belong_to_recipe() {
        let id = Uuid::new_v4();
        let reviews = gen_reviews(&mut StdRng::seed_from_u64(3), Local::now(), id);
        assert!(reviews.iter().all(|r| r.recipe_id == id && !r.review_id.is_nil()));
    }
}
