use rand::Rng;

use crate::{SelectionPolicy, Session};

/// Reduce `matches` to one value according to `policy` and store it under
/// `variable`.
///
/// An empty `matches` leaves the session untouched, so a value set by an
/// earlier action survives a missed extraction.
pub fn select(matches: &[String], policy: SelectionPolicy, variable: &str, session: &mut Session) {
    select_with(matches, policy, variable, session, &mut rand::thread_rng());
}

/// [`select`] with a caller-supplied random source.
pub fn select_with<R>(
    matches: &[String],
    policy: SelectionPolicy,
    variable: &str,
    session: &mut Session,
    rng: &mut R,
) where
    R: Rng + ?Sized,
{
    if let Some(value) = pick(matches, policy, rng) {
        session.insert(variable, value.as_str());
    }
}

fn pick<'a, R>(matches: &'a [String], policy: SelectionPolicy, rng: &mut R) -> Option<&'a String>
where
    R: Rng + ?Sized,
{
    match policy {
        SelectionPolicy::First => matches.first(),
        SelectionPolicy::Last => matches.last(),
        SelectionPolicy::Random => match matches.len() {
            0 => None,
            1 => matches.first(),
            // every index, the last one included
            n => matches.get(rng.gen_range(0..n)),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn matches(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn first_and_last() {
        let m = matches(&["x", "y", "z"]);
        let mut session = Session::new();

        select(&m, SelectionPolicy::First, "v", &mut session);
        assert_eq!(session.get("v"), Some("x"));

        select(&m, SelectionPolicy::Last, "v", &mut session);
        assert_eq!(session.get("v"), Some("z"));
    }

    #[test]
    fn random_reaches_every_match() {
        let m = matches(&["x", "y", "z"]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();

        for _ in 0..300 {
            let mut session = Session::new();
            select_with(&m, SelectionPolicy::Random, "v", &mut session, &mut rng);
            seen.insert(session.get("v").unwrap().to_string());
        }

        assert_eq!(seen, HashSet::from(["x".to_string(), "y".to_string(), "z".to_string()]));
    }

    #[test]
    fn single_match_wins_under_every_policy() {
        let m = matches(&["only"]);
        for policy in [
            SelectionPolicy::First,
            SelectionPolicy::Last,
            SelectionPolicy::Random,
        ] {
            let mut session = Session::new();
            select(&m, policy, "v", &mut session);
            assert_eq!(session.get("v"), Some("only"), "{policy:?}");
        }
    }

    #[test]
    fn no_matches_keeps_previous_value() {
        for policy in [
            SelectionPolicy::First,
            SelectionPolicy::Last,
            SelectionPolicy::Random,
        ] {
            let mut session: Session = [("v", "orig")].into_iter().collect();
            select(&[], policy, "v", &mut session);
            assert_eq!(session.get("v"), Some("orig"));
        }
    }

    #[test]
    fn overwrites_previous_value_on_match() {
        let mut session: Session = [("v", "orig")].into_iter().collect();
        select(&matches(&["new"]), SelectionPolicy::First, "v", &mut session);
        assert_eq!(session.get("v"), Some("new"));
    }
}
