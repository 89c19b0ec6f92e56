//! Team sizing: back-solve headcount from the desired project duration.

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::project::Project;

/// Risk-weighted work in hours per resource id, in first-seen task order.
pub fn risk_weighted_work(project: &Project) -> IndexMap<String, f64> {
    let unit_hours = f64::from(project.effort_unit().hours());
    let mut work: IndexMap<String, f64> = IndexMap::new();

    for task in &project.tasks {
        if !task.risk.is_empty() && !project.risks.contains_key(&task.risk) {
            warn!(task = %task.title, risk = %task.risk, "unknown risk, counting effort unweighted");
        }
        let multiplier = project.risk_multiplier(&task.risk);
        for (resource, effort) in &task.work {
            *work.entry(resource.clone()).or_insert(0.0) += effort * unit_hours * multiplier;
        }
    }
    work
}

/// Recompute `count` of every team resource that can be sized.
///
/// Does nothing when no desired duration is set or it is zero. Otherwise the
/// team is replaced by the resources that could be sized, in their original
/// order:
/// - a resource with work gets `ceil(work / desired hours)`;
/// - a derived resource without work of its own gets 1 (its real demand only
///   exists as a spreadsheet formula);
/// - any other resource is dropped.
pub fn size_team(project: &mut Project) {
    let Some(desired) = project.desired_duration.filter(|d| !d.is_zero()) else {
        debug!("no desired duration, keeping team as declared");
        return;
    };
    let desired_hours = desired.hours();
    let work = risk_weighted_work(project);

    let before = project.team.len();
    let team = std::mem::take(&mut project.team);
    project.team = team
        .into_iter()
        .filter_map(|mut resource| {
            match work.get(&resource.id).copied().filter(|hours| *hours > 0.0) {
                Some(hours) => {
                    resource.count = (hours / desired_hours).ceil() as u32;
                    debug!(resource = %resource.id, hours, count = resource.count, "sized resource");
                }
                None if resource.is_derived() => resource.count = 1,
                None => {
                    debug!(resource = %resource.id, "no work, dropping resource");
                    return None;
                }
            }
            Some(resource)
        })
        .collect();

    info!(
        desired = %desired,
        desired_hours,
        resources = project.team.len(),
        dropped = before - project.team.len(),
        headcount = project.team.iter().map(|r| r.count).sum::<u32>(),
        "sized team"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{standard_risks, Resource, Task};
    use crate::units::{Duration, TimeUnit};

    fn task(risk: &str, work: &[(&str, f64)]) -> Task {
        Task {
            category: "Core".to_string(),
            title: "work".to_string(),
            risk: risk.to_string(),
            work: work.iter().map(|(id, e)| (id.to_string(), *e)).collect(),
        }
    }

    fn project(team: Vec<Resource>, tasks: Vec<Task>) -> Project {
        Project {
            time_unit: Some(TimeUnit::Day),
            desired_duration: Some(Duration::new(1.0, TimeUnit::Month)),
            risks: standard_risks(),
            team,
            tasks,
            ..Project::default()
        }
    }

    #[test]
    fn test_risk_weighted_work() {
        let p = project(
            vec![Resource::new("be"), Resource::new("fe")],
            vec![task("low", &[("be", 10.0)]), task("", &[("be", 1.0), ("fe", 2.0)])],
        );
        let work = risk_weighted_work(&p);
        assert!((work["be"] - (10.0 * 8.0 * 1.1 + 8.0)).abs() < 1e-9);
        assert_eq!(work["fe"], 16.0);
    }

    #[test]
    fn test_exact_fit_is_one() {
        let mut p = project(vec![Resource::new("be")], vec![task("", &[("be", 21.0)])]);
        size_team(&mut p);
        assert_eq!(p.team[0].count, 1);
    }

    #[test]
    fn test_resource_without_work_is_dropped() {
        let mut p = project(
            vec![Resource::new("be"), Resource::new("fe").with_count(3)],
            vec![task("", &[("be", 30.0), ("fe", 0.0)])],
        );
        size_team(&mut p);
        let ids: Vec<&str> = p.team.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["be"]);
        assert_eq!(p.team[0].count, 2);
    }

    #[test]
    fn test_zero_duration_is_noop() {
        let mut p = project(
            vec![Resource::new("be").with_count(7), Resource::new("fe")],
            vec![task("", &[("be", 500.0)])],
        );
        p.desired_duration = Some(Duration::new(0.0, TimeUnit::Week));
        let before = p.clone();
        size_team(&mut p);
        assert_eq!(p, before);

        p.desired_duration = None;
        size_team(&mut p);
        assert_eq!(p, before);
    }

    #[test]
    fn test_missing_time_unit_counts_hours() {
        let mut p = project(vec![Resource::new("be")], vec![task("", &[("be", 169.0)])]);
        p.time_unit = None;
        size_team(&mut p);
        assert_eq!(p.team[0].count, 2);
    }

    #[test]
    fn test_unknown_risk_counts_as_one() {
        let p = project(vec![Resource::new("be")], vec![task("mystery", &[("be", 1.0)])]);
        assert_eq!(risk_weighted_work(&p)["be"], 8.0);
    }
}
