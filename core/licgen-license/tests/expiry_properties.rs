//! Property-based tests for expiry resolution.

mod common;

use chrono::TimeDelta;
use common::fixed_now;
use licgen_license::resolve_valid_to;
use proptest::prelude::*;

fn unit_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["years", "months", "days", "hours", "minutes", "seconds"])
}

proptest! {
    /// Day specs always land exactly `count` days after issuance.
    #[test]
    fn days_add_exact_duration(count in 0u32..1_000_000) {
        let now = fixed_now();
        let resolved = resolve_valid_to(now, Some(format!("days-{count}").as_str()));
        prop_assert_eq!(resolved, Some(now + TimeDelta::days(i64::from(count))));
    }

    /// Seconds specs are fixed durations too.
    #[test]
    fn seconds_add_exact_duration(count in 0u32..100_000_000) {
        let now = fixed_now();
        let resolved = resolve_valid_to(now, Some(format!("seconds-{count}").as_str()));
        prop_assert_eq!(resolved, Some(now + TimeDelta::seconds(i64::from(count))));
    }

    /// A resolvable spec never lands before issuance.
    #[test]
    fn resolved_is_never_before_now(unit in unit_strategy(), count in 0u32..1000) {
        let now = fixed_now();
        let resolved = resolve_valid_to(now, Some(format!("{unit}-{count}").as_str()));
        prop_assert!(resolved.is_some());
        prop_assert!(resolved.unwrap() >= now);
    }

    /// Matching ignores case.
    #[test]
    fn case_does_not_matter(unit in unit_strategy(), count in 0u32..1000) {
        let now = fixed_now();
        let lower = resolve_valid_to(now, Some(format!("{unit}-{count}").as_str()));
        let upper = resolve_valid_to(now, Some(format!("{}-{count}", unit.to_uppercase()).as_str()));
        prop_assert_eq!(lower, upper);
    }

    /// Anything outside the six unit keywords resolves to nothing.
    #[test]
    fn unknown_units_resolve_to_none(unit in "[a-z]{1,10}", count in 0u32..1000) {
        prop_assume!(!["years", "months", "days", "hours", "minutes", "seconds"].contains(&unit.as_str()));
        prop_assert_eq!(resolve_valid_to(fixed_now(), Some(format!("{unit}-{count}").as_str())), None);
    }
}
