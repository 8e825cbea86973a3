use crate::workflows::scheduling::cover::domain::{
    EligibleStaffMember, EmployeeId, NotificationChannel, ReplacementCandidate,
};
use crate::workflows::scheduling::cover::scoring::{composite_score, rank_candidates};

fn candidate(
    id: &str,
    reliability: f32,
    distance: f32,
    wants_more_hours: bool,
) -> ReplacementCandidate {
    ReplacementCandidate {
        employee_id: EmployeeId(id.to_string()),
        display_name: format!("Staff {id}"),
        reliability,
        distance,
        wants_more_hours,
        has_required_skills: true,
        speaks_required_languages: true,
        currently_available: true,
    }
}

#[test]
fn ranks_concrete_scenario_best_first() {
    let a = candidate("A", 90.0, 2.0, true);
    let b = candidate("B", 95.0, 1.0, false);
    let mut c = candidate("C", 99.0, 0.0, true);
    c.has_required_skills = false;

    assert_eq!(composite_score(&a), 188.0);
    assert_eq!(composite_score(&b), 189.0);

    let ranked = rank_candidates(vec![a, b, c]);
    let order: Vec<&str> = ranked
        .iter()
        .map(|candidate| candidate.employee_id.0.as_str())
        .collect();
    assert_eq!(order, vec!["B", "A"]);
}

#[test]
fn hard_filters_exclude_regardless_of_score() {
    let mut no_skills = candidate("no-skills", 100.0, 0.0, true);
    no_skills.has_required_skills = false;
    let mut no_language = candidate("no-language", 100.0, 0.0, true);
    no_language.speaks_required_languages = false;
    let mut unavailable = candidate("unavailable", 100.0, 0.0, true);
    unavailable.currently_available = false;
    let weak_but_qualified = candidate("qualified", 1.0, 50.0, false);

    let ranked = rank_candidates(vec![no_skills, no_language, unavailable, weak_but_qualified]);

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].employee_id.0, "qualified");
}

#[test]
fn ordering_is_descending_by_score() {
    let ranked = rank_candidates(vec![
        candidate("low", 10.0, 5.0, false),
        candidate("high", 95.0, 1.0, true),
        candidate("mid", 50.0, 2.0, false),
    ]);

    for pair in ranked.windows(2) {
        assert!(composite_score(&pair[0]) >= composite_score(&pair[1]));
    }
    assert_eq!(ranked[0].employee_id.0, "high");
}

#[test]
fn equal_scores_keep_input_order() {
    // Same composite score, distinct ids: stability keeps submission order.
    let first = candidate("first", 50.0, 3.0, false);
    let second = candidate("second", 50.0, 3.0, false);
    let third = candidate("third", 50.0, 3.0, false);

    let ranked = rank_candidates(vec![first, second, third]);
    let order: Vec<&str> = ranked
        .iter()
        .map(|candidate| candidate.employee_id.0.as_str())
        .collect();
    assert_eq!(order, vec!["first", "second", "third"]);

    let again = rank_candidates(ranked.clone());
    assert_eq!(again, ranked);
}

#[test]
fn empty_input_yields_empty_output() {
    assert!(rank_candidates(Vec::new()).is_empty());

    let mut all_filtered = candidate("only", 80.0, 1.0, false);
    all_filtered.currently_available = false;
    assert!(rank_candidates(vec![all_filtered]).is_empty());
}

#[test]
fn missing_metrics_are_repaired_to_worst_case() {
    let member = EligibleStaffMember {
        employee_id: EmployeeId("emp-x".to_string()),
        display_name: "No Metrics".to_string(),
        eligible: true,
        channel_preference: NotificationChannel::Push,
        reliability: None,
        travel_distance: None,
        wants_more_hours: false,
        has_required_skills: true,
        speaks_required_languages: true,
        currently_available: true,
    };

    let repaired = ReplacementCandidate::from_staff(&member);
    assert_eq!(repaired.reliability, 0.0);
    assert_eq!(repaired.distance, f32::MAX);

    // A repaired candidate still ranks, just last.
    let ranked = rank_candidates(vec![repaired, candidate("known", 10.0, 100.0, false)]);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].employee_id.0, "known");
}

#[test]
fn out_of_range_metrics_are_clamped() {
    let member = EligibleStaffMember {
        employee_id: EmployeeId("emp-y".to_string()),
        display_name: "Weird Feed".to_string(),
        eligible: true,
        channel_preference: NotificationChannel::Sms,
        reliability: Some(250.0),
        travel_distance: Some(-3.0),
        wants_more_hours: true,
        has_required_skills: true,
        speaks_required_languages: true,
        currently_available: true,
    };

    let repaired = ReplacementCandidate::from_staff(&member);
    assert_eq!(repaired.reliability, 100.0);
    assert_eq!(repaired.distance, f32::MAX);
}
