//! Tests for `choose_users` and `select_assignments`

use super::super::*;

use rand::SeedableRng;
use rand::rngs::StdRng;

fn pool(logins: &[&str]) -> Vec<String> {
    logins.iter().map(|l| l.to_string()).collect()
}

fn sorted(mut v: Vec<String>) -> Vec<String> {
    v.sort();
    v
}

/// Parse an inline TOML document into an `AssignmentConfig`.
fn config(doc: &str) -> AssignmentConfig {
    toml::from_str(doc).unwrap()
}

#[test]
fn count_zero_returns_whole_eligible_pool() {
    let pool = pool(&["user1", "user2", "user3"]);
    let chosen = choose_users(&mut StdRng::seed_from_u64(0), &pool, 0, "user2");
    assert_eq!(sorted(chosen), ["user1", "user3"]);
}

#[test]
fn count_at_least_eligible_returns_whole_eligible_pool() {
    let pool = pool(&["user1", "user2", "user3"]);
    for count in 2..6 {
        let chosen = choose_users(&mut StdRng::seed_from_u64(0), &pool, count, "user2");
        assert_eq!(sorted(chosen), ["user1", "user3"], "count={count}");
    }
}

#[test]
fn restrictive_count_samples_exactly() {
    let pool = pool(&["user1", "user2", "user3", "user4", "user5"]);
    for seed in 0..16 {
        let chosen = choose_users(&mut StdRng::seed_from_u64(seed), &pool, 2, "user3");
        assert_eq!(chosen.len(), 2, "seed={seed}");
        let unique = sorted(chosen.clone());
        assert!(unique.windows(2).all(|w| w[0] != w[1]), "seed={seed}");
        for login in &chosen {
            assert_ne!(login, "user3", "seed={seed}");
            assert!(pool.contains(login), "seed={seed}");
        }
    }
}

#[test]
fn exclusion_is_case_sensitive() {
    let pool = pool(&["User1", "user1"]);
    let chosen = choose_users(&mut StdRng::seed_from_u64(0), &pool, 0, "user1");
    assert_eq!(chosen, ["User1"]);
}

#[test]
fn empty_pool_yields_empty_selection() {
    let chosen = choose_users(&mut StdRng::seed_from_u64(0), &[], 0, "user1");
    assert!(chosen.is_empty());
    let chosen = choose_users(&mut StdRng::seed_from_u64(0), &[], 3, "user1");
    assert!(chosen.is_empty());
}

#[test]
fn duplicate_logins_are_not_over_weighted() {
    let pool = pool(&["user1", "user1", "user2"]);
    let chosen = choose_users(&mut StdRng::seed_from_u64(0), &pool, 0, "nobody");
    assert_eq!(sorted(chosen), ["user1", "user2"]);
}

#[test]
fn reviewers_only_with_full_pool() {
    // Scenario A: assignees disabled, reviewers get the whole pool.
    let config = config(
        r#"
        add-assignees = false
        add-reviewers = true
        number-of-reviewers = 0
        reviewers = ["reviewer1", "reviewer2", "reviewer3"]
"#,
    );
    let selections = select_assignments(&config, "author", &mut StdRng::seed_from_u64(0));
    assert!(selections.assignees.is_empty());
    assert_eq!(
        sorted(selections.reviewers),
        ["reviewer1", "reviewer2", "reviewer3"]
    );
}

#[test]
fn assignees_fall_back_to_reviewer_pool() {
    // Scenario B: no separate assignees list, the reviewer pool is used.
    let config = config(
        r#"
        add-assignees = true
        add-reviewers = false
        number-of-reviewers = 0
        reviewers = ["reviewer1", "reviewer2", "reviewer3"]
"#,
    );
    let selections = select_assignments(&config, "author", &mut StdRng::seed_from_u64(0));
    assert_eq!(
        sorted(selections.assignees),
        ["reviewer1", "reviewer2", "reviewer3"]
    );
    assert!(selections.reviewers.is_empty());
}

#[test]
fn explicit_assignee_pool_and_count() {
    // Scenario C: explicit assignees list with an explicit count.
    let config = config(
        r#"
        add-assignees = true
        add-reviewers = false
        assignees = ["assignee1"]
        number-of-assignees = 1
        number-of-reviewers = 0
        reviewers = ["reviewer1", "reviewer2", "reviewer3"]
"#,
    );
    let selections = select_assignments(&config, "author", &mut StdRng::seed_from_u64(0));
    assert_eq!(selections.assignees, ["assignee1"]);
}

#[test]
fn assignee_count_falls_back_to_reviewer_count() {
    // Scenario D: number-of-assignees unset, so number-of-reviewers caps
    // both selections.
    let config = config(
        r#"
        add-assignees = true
        add-reviewers = true
        assignees = ["assignee1", "assignee2", "assignee3"]
        number-of-reviewers = 2
        reviewers = ["reviewer1", "reviewer2", "reviewer3"]
"#,
    );
    for seed in 0..8 {
        let selections = select_assignments(&config, "author", &mut StdRng::seed_from_u64(seed));
        assert_eq!(selections.assignees.len(), 2, "seed={seed}");
        for login in &selections.assignees {
            assert!(config.assignees.contains(login), "seed={seed}");
        }
        assert_eq!(selections.reviewers.len(), 2, "seed={seed}");
        for login in &selections.reviewers {
            assert!(config.reviewers.contains(login), "seed={seed}");
        }
    }
}

#[test]
fn author_mode_forces_self_assignment() {
    let config = config(
        r#"
        add-assignees = "author"
        add-reviewers = true
        number-of-reviewers = 0
        reviewers = ["reviewer1", "author"]
"#,
    );
    let selections = select_assignments(&config, "author", &mut StdRng::seed_from_u64(0));
    assert_eq!(selections.assignees, ["author"]);
    // The author is still excluded from the reviewer side.
    assert_eq!(selections.reviewers, ["reviewer1"]);
}

#[test]
fn author_in_pool_is_never_selected() {
    let config = config(
        r#"
        add-assignees = true
        add-reviewers = true
        number-of-reviewers = 0
        reviewers = ["reviewer1", "reviewer2", "author"]
"#,
    );
    for seed in 0..8 {
        let selections = select_assignments(&config, "author", &mut StdRng::seed_from_u64(seed));
        assert_eq!(sorted(selections.reviewers), ["reviewer1", "reviewer2"]);
        assert_eq!(sorted(selections.assignees), ["reviewer1", "reviewer2"]);
    }
}

#[test]
fn disabled_sides_select_nothing() {
    let config = config(
        r#"
        add-assignees = false
        add-reviewers = false
        reviewers = ["reviewer1"]
"#,
    );
    let selections = select_assignments(&config, "author", &mut StdRng::seed_from_u64(0));
    assert!(selections.reviewers.is_empty());
    assert!(selections.assignees.is_empty());
}

#[test]
fn skip_keyword_matches_case_insensitive_substring() {
    let keywords = pool(&["WIP", "do not merge"]);
    assert_eq!(find_skip_keyword("wip: new parser", &keywords), Some("WIP"));
    assert_eq!(
        find_skip_keyword("please DO NOT MERGE yet", &keywords),
        Some("do not merge")
    );
    assert_eq!(find_skip_keyword("ready for review", &keywords), None);
    assert_eq!(find_skip_keyword("ready", &[]), None);
}
