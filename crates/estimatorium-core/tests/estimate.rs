use estimatorium_core::{
    project_from_str, size_team, standard_risks, Currency, Duration, EstimateError, Project,
    TimeUnit, DIRECTIVES, TASKS_MARKER, TEAM_MARKER,
};
use proptest::prelude::*;

const SHOP: &str = r#"
# Online shop estimate
project Online shop
author Jane Roe
currency usd
time_unit day
acceptance_percent 15
desired_duration 1 month

team
be rate=60
fe rate=55
qa rate=40 formula="(be+fe)*0.3"

tasks
Backend|Catalog API|be=20 risks=low
Backend|Checkout|be=15 risks=low
Frontend|Catalog page|fe=10 risks=medium
"#;

#[test]
fn duplicate_currency_reports_only_the_duplicate() {
    let outcome = project_from_str("currency usd\ncurrency eur\n");
    let errors: Vec<&EstimateError> = outcome.errors.iter().collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        EstimateError::DuplicateDirective { line: 2, name } if name == "currency"
    ));
    assert_eq!(outcome.value.currency, Some(Currency::Usd));
}

#[test]
fn default_risks_without_directive() {
    for doc in ["", "project X\n", "team\nbe\ntasks\nA|b|be=1\n"] {
        assert_eq!(project_from_str(doc).value.risks, standard_risks());
    }
}

#[test]
fn default_risk_catalog_resolves_task_risk() {
    let outcome = project_from_str("team be=1\ntasks\na|b|be=1 risks=low\n");
    assert!(outcome.is_ok(), "{}", outcome.errors);
    let project = outcome.value;
    assert_eq!(project.team[0].count, 1);
    assert_eq!(project.tasks[0].risk, "low");
}

#[test]
fn unknown_effort_resource_is_an_error() {
    let outcome = project_from_str("team be=1\ntasks\na|b|zz=1\n");
    let err = outcome.into_result().unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.to_string(), "line 3: task 'b' references unknown resource 'zz'");
}

#[test]
fn parser_errors_precede_builder_errors() {
    let outcome = project_from_str("time_unit fortnight\nbogus 1\n");
    let lines: Vec<usize> = outcome.errors.iter().map(EstimateError::line).collect();
    assert_eq!(lines, vec![2, 1]);
}

#[test]
fn sizing_back_solves_headcount() {
    let doc = "time_unit day\ndesired_duration 1mth\nteam\nbe\ntasks\nA|one|be=20 risks=low\nA|two|be=15 risks=low\n";
    let mut project: Project = doc.parse().unwrap();
    size_team(&mut project);

    // 35 days * 8h * 1.1 = 308h against 168h
    assert_eq!(project.team.len(), 1);
    assert_eq!(project.team[0].id, "be");
    assert_eq!(project.team[0].count, 2);
}

#[test]
fn derived_resource_gets_placeholder_count() {
    let doc = "time_unit day\ndesired_duration 1mth\nteam\nbe\nqa formula=be\ntasks\nA|one|be=35 risks=low\n";
    let mut project: Project = doc.parse().unwrap();
    size_team(&mut project);

    assert_eq!(project.resource("be").map(|r| r.count), Some(2));
    // Placeholder only: the formula is not evaluated numerically.
    assert_eq!(project.resource("qa").map(|r| r.count), Some(1));
}

#[test]
fn sizing_is_idempotent() {
    let mut project: Project = SHOP.parse().unwrap();
    size_team(&mut project);
    let once = project.team.clone();
    size_team(&mut project);
    assert_eq!(project.team, once);
}

#[test]
fn full_document() {
    let mut project: Project = SHOP.parse().unwrap();
    assert_eq!(project.name.as_deref(), Some("Online shop"));
    assert_eq!(project.desired_duration, Some(Duration::new(1.0, TimeUnit::Month)));
    assert_eq!(project.team_excluding_derived().len(), 2);

    size_team(&mut project);
    let counts: Vec<(&str, u32)> = project.team.iter().map(|r| (r.id.as_str(), r.count)).collect();
    assert_eq!(counts, vec![("be", 2), ("fe", 1), ("qa", 1)]);
}

#[test]
fn every_problem_is_reported_at_once() {
    let doc = "currency gbp\nrisks low=0.9\nteam\nbe rate=abc\ntasks\nA|b\nA|c|be=x risks=low\n";
    let outcome = project_from_str(doc);
    // unknown currency, bad multiplier, bad rate, two-part task line,
    // bad effort, and "low" no longer resolving
    assert_eq!(outcome.errors.len(), 6, "{}", outcome.errors);
}

fn any_time_unit() -> impl Strategy<Value = TimeUnit> {
    prop::sample::select(TimeUnit::ALL.to_vec())
}

proptest! {
    #[test]
    fn unknown_directive_reported_once(name in "[a-z_]{1,12}", value in "[ -~]{0,20}") {
        let known = DIRECTIVES.iter().any(|d| d.name == name)
            || name == TEAM_MARKER
            || name == TASKS_MARKER;
        prop_assume!(!known);
        let outcome = project_from_str(&format!("{name} {value}\n"));
        prop_assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn durations_parse_with_and_without_space(magnitude in 0u32..10_000, unit in any_time_unit(), spaced in any::<bool>()) {
        let sep = if spaced { " " } else { "" };
        let parsed = Duration::parse(&format!("{magnitude}{sep}{unit}")).unwrap();
        prop_assert_eq!(parsed, Duration::new(f64::from(magnitude), unit));
    }

    #[test]
    fn headcount_covers_work(effort in 1u32..500, months in 1u32..12) {
        let doc = format!("time_unit day\ndesired_duration {months}mth\nteam\nbe\ntasks\nA|b|be={effort}\n");
        let mut project: Project = doc.parse().unwrap();
        size_team(&mut project);
        let count = f64::from(project.team[0].count);
        let work = f64::from(effort) * 8.0;
        let capacity = f64::from(months) * 168.0;
        prop_assert!(count * capacity >= work);
        prop_assert!((count - 1.0) * capacity < work);
    }
}
