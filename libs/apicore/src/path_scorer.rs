//! Weighted positional path scoring and best-match selection.
//!
//! For a candidate route of length `n` matched against a request path of
//! the same length, each position `i` (0-indexed from the left) contributes
//! `w(i) * m(i)` to the total score, where `w(i) = n - i` weights earlier
//! components more heavily than later ones, and `m(i)` is:
//!
//! - `2` if the route component at `i` is a literal equal to the request
//!   component at `i`,
//! - `1` if the route component at `i` is the wildcard token `?`,
//! - `0` (and the route is disqualified) on a literal mismatch.
//!
//! The wildcard token is the only component that scores as a parameter.
//! A component that merely looks like a named placeholder (`:id`) is an
//! ordinary literal and only scores if the request component equals it
//! exactly — naming a wildcard's bound parameter is a separate concern
//! handled by `Route::param_name`, not by path syntax.
//!
//! Routes of a different length than the request never match. Among
//! routes that do match, the highest total score wins; ties keep the
//! first candidate encountered (registration order), matching the two-pass
//! lookup the registry performs by `(method, path length)`.

use crate::route::Route;

/// Per-component match weight. `None` marks a literal mismatch —
/// disqualifying the whole route.
fn component_score(route_component: &str, is_wildcard: bool, request_component: &str) -> Option<u32> {
    if is_wildcard {
        Some(1)
    } else if route_component == request_component {
        Some(2)
    } else {
        None
    }
}

/// Score a single route against a request's path components. Returns
/// `None` if lengths differ or any literal component fails to match.
#[must_use]
pub fn score_route(route: &Route, request_components: &[&str]) -> Option<u32> {
    if route.components.len() != request_components.len() {
        return None;
    }

    let n = route.components.len();
    let mut total = 0u32;

    for i in 0..n {
        let weight = (n - i) as u32;
        let is_wildcard = route.wildcards[i];
        let m = component_score(&route.components[i], is_wildcard, request_components[i])?;
        total += weight * m;
    }

    Some(total)
}

/// Find the best-matching route among candidates of equal length to the
/// request path. First-registered wins ties.
#[must_use]
pub fn best_match<'a>(candidates: &'a [Route], request_components: &[&str]) -> Option<&'a Route> {
    let mut best: Option<(&Route, u32)> = None;

    for route in candidates {
        let Some(score) = score_route(route, request_components) else {
            continue;
        };
        match &best {
            Some((_, best_score)) if score <= *best_score => {}
            _ => best = Some((route, score)),
        }
    }

    best.map(|(route, _)| route)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::route::HttpMethod;

    #[test]
    fn literal_beats_wildcard_at_same_position() {
        let literal = Route::new(HttpMethod::Get, "/Users/123");
        let wildcard = Route::new(HttpMethod::Get, "/Users/?");
        let request = ["Users", "123"];

        let literal_score = score_route(&literal, &request).unwrap();
        let wildcard_score = score_route(&wildcard, &request).unwrap();
        assert!(literal_score > wildcard_score);
    }

    #[test]
    fn mismatched_length_never_matches() {
        let route = Route::new(HttpMethod::Get, "/Users/:id");
        assert_eq!(score_route(&route, &["Users"]), None);
        assert_eq!(score_route(&route, &["Users", "1", "posts"]), None);
    }

    #[test]
    fn literal_mismatch_disqualifies_route() {
        let route = Route::new(HttpMethod::Get, "/Users/active");
        assert_eq!(score_route(&route, &["Users", "inactive"]), None);
    }

    #[test]
    fn earlier_positions_weigh_more_than_later_ones() {
        let early_literal = Route::new(HttpMethod::Get, "/Users/?");
        let late_literal = Route::new(HttpMethod::Get, "/?/123");
        let request = ["Users", "123"];

        let early_score = score_route(&early_literal, &request).unwrap();
        let late_score = score_route(&late_literal, &request).unwrap();
        assert!(early_score > late_score);
    }

    #[test]
    fn best_match_picks_highest_scoring_candidate() {
        let routes = vec![
            Route::new(HttpMethod::Get, "/Users/?"),
            Route::new(HttpMethod::Get, "/Users/123"),
        ];
        let request = ["Users", "123"];

        let winner = best_match(&routes, &request).unwrap();
        assert_eq!(winner.path, "/Users/123");
    }

    #[test]
    fn best_match_keeps_first_registered_on_tie() {
        let routes = vec![
            Route::new(HttpMethod::Get, "/Users/?").param_name("id"),
            Route::new(HttpMethod::Get, "/Accounts/?").param_name("id"),
        ];
        let request = ["Users", "123"];

        let winner = best_match(&routes, &request).unwrap();
        assert_eq!(winner.path, "/Users/?");
    }

    #[test]
    fn a_colon_prefixed_component_does_not_tie_with_a_wildcard() {
        let literal_colon = Route::new(HttpMethod::Get, "/Users/:id");
        let wildcard = Route::new(HttpMethod::Get, "/Users/?");
        let request = ["Users", "123"];

        assert_eq!(score_route(&literal_colon, &request), None);
        assert_eq!(score_route(&wildcard, &request), Some(3));
    }

    #[test]
    fn best_match_returns_none_when_nothing_matches() {
        let routes = vec![Route::new(HttpMethod::Get, "/Users/active")];
        let request = ["Users", "inactive"];
        assert!(best_match(&routes, &request).is_none());
    }
}
