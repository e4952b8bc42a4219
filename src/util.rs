use rand::Rng;
use std::time::Duration;

pub fn reduce_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Split free text instructions into sentences on ". ", the way the drink API writes them
pub fn split_instructions(s: &str) -> Vec<String> {
    s.split(". ")
        .map(reduce_whitespace)
        .filter(|v| !v.is_empty())
        .collect()
}

/// The base delay plus a random extra amount of at most `jitter`
pub fn jittered(delay: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return delay;
    }
    delay + rand::rng().random_range(Duration::ZERO..=jitter)
}

// Throttle requests to not get blocked
pub async fn wait_jittered(delay: Duration, jitter: Duration) {
    tokio::time::sleep(jittered(delay, jitter)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_are_split_on_sentences() {
        assert_eq!(
            vec!["Stir into glass over ice", "Garnish and serve."],
            split_instructions("Stir into glass over ice.  Garnish and serve.")
        );
        assert_eq!(
            vec!["Shake", "Strain"],
            split_instructions(" Shake.   Strain ")
        );
        assert!(split_instructions("").is_empty());
        assert!(split_instructions(" . ").is_empty());
    }

    #[test]
    fn whitespace_is_reduced() {
        assert_eq!("a b c", reduce_whitespace("  a\tb\n  c "));
    }

    #[test]
    fn jitter_stays_in_range() {
        let delay = Duration::from_millis(100);
        assert_eq!(delay, jittered(delay, Duration::ZERO));
        for _ in 0..100 {
            let d = jittered(delay, Duration::from_millis(50));
            assert!(d >= delay && d <= Duration::from_millis(150), "{d:?}");
        }
    }
}
