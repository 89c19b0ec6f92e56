//! Turns a [`ParsedProject`] into a validated [`Project`].
//!
//! Every field is built independently and every problem is recorded, so one
//! pass reports all of a document's mistakes. The returned project is a best
//! effort and is only trustworthy when no error was collected.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ErrorList, EstimateError, Outcome};
use crate::formula;
use crate::parsing::{ParsedProject, TaskRecord, TeamRecord};
use crate::project::{standard_risks, standard_title, Project, Resource, Risks, Task};
use crate::units::{Currency, Duration, TimeUnit};

/// Builds a [`Project`] from parsed records, collecting errors as it goes.
pub struct ProjectBuilder<'a> {
    parsed: &'a ParsedProject,
    errors: ErrorList,
}

impl<'a> ProjectBuilder<'a> {
    pub fn new(parsed: &'a ParsedProject) -> Self {
        Self {
            parsed,
            errors: ErrorList::new(),
        }
    }

    pub fn build(mut self) -> Outcome<Project> {
        let mut project = Project {
            name: self.single("project").map(|(v, _)| v.to_string()),
            author: self.single("author").map(|(v, _)| v.to_string()),
            ..Project::default()
        };

        project.time_unit = self.time_unit();
        project.currency = self.currency();
        project.acceptance_percent = self.acceptance_percent();
        project.risks = self.risks();
        project.team = self.team();
        project.tasks = self.tasks(&project);
        project.desired_duration = self.desired_duration();

        debug!(
            team = project.team.len(),
            tasks = project.tasks.len(),
            risks = project.risks.len(),
            errors = self.errors.len(),
            "built project"
        );

        Outcome::new(project, self.errors)
    }

    fn single(&self, name: &str) -> Option<(&'a str, usize)> {
        let parsed: &'a ParsedProject = self.parsed;
        let directive = parsed.directive(name)?;
        let value = directive.value.as_single()?;
        Some((value, directive.line))
    }

    fn time_unit(&mut self) -> Option<TimeUnit> {
        let (value, line) = self.single("time_unit")?;
        let unit = TimeUnit::parse(value);
        if unit.is_none() {
            self.errors.push(EstimateError::UnknownTimeUnit {
                line,
                value: value.to_string(),
            });
        }
        unit
    }

    fn currency(&mut self) -> Option<Currency> {
        let (value, line) = self.single("currency")?;
        let currency = Currency::parse(value);
        if currency.is_none() {
            self.errors.push(EstimateError::UnknownCurrency {
                line,
                value: value.to_string(),
            });
        }
        currency
    }

    fn acceptance_percent(&mut self) -> f64 {
        let Some((value, line)) = self.single("acceptance_percent") else {
            return 0.0;
        };
        match value.trim().parse::<f64>() {
            Ok(percent) if (0.0..=100.0).contains(&percent) => percent,
            _ => {
                self.errors.push(EstimateError::InvalidAcceptancePercent {
                    line,
                    value: value.to_string(),
                });
                0.0
            }
        }
    }

    fn risks(&mut self) -> Risks {
        let Some(directive) = self.parsed.directive("risks") else {
            return standard_risks();
        };

        let mut risks = Risks::new();
        let mut seen = HashSet::new();
        for (name, value) in directive.value.as_pairs() {
            if !seen.insert(name.as_str()) {
                self.errors.push(EstimateError::DuplicateRisk {
                    line: directive.line,
                    name: name.clone(),
                });
                continue;
            }
            match value.parse::<f64>() {
                Ok(multiplier) if multiplier.is_finite() && multiplier >= 1.0 => {
                    risks.insert(name.clone(), multiplier);
                }
                _ => self.errors.push(EstimateError::InvalidRiskMultiplier {
                    line: directive.line,
                    name: name.clone(),
                    value: value.clone(),
                }),
            }
        }
        risks
    }

    fn team(&mut self) -> Vec<Resource> {
        let parsed = self.parsed;
        let Some(records) = parsed.team.as_ref() else {
            return Vec::new();
        };

        let team: Vec<Resource> = records.iter().map(|r| self.resource(r)).collect();

        let ids: HashSet<&str> = team.iter().map(|r| r.id.as_str()).collect();
        for (record, resource) in records.iter().zip(&team) {
            if resource.is_derived() {
                self.check_formula(record, resource, &ids);
                if in_cycle(&team, resource) {
                    self.errors.push(EstimateError::CircularFormula {
                        line: record.line,
                        resource: resource.id.clone(),
                    });
                }
            }
        }
        team
    }

    fn resource(&mut self, record: &TeamRecord) -> Resource {
        let title = match &record.title {
            Some(title) => title.clone(),
            None => standard_title(&record.id).unwrap_or_default().to_string(),
        };

        let rate = match record.rate.as_deref() {
            None => 0.0,
            Some(value) => match value.parse::<f64>() {
                Ok(rate) if rate.is_finite() && rate >= 0.0 => rate,
                _ => {
                    self.errors.push(EstimateError::InvalidRate {
                        line: record.line,
                        resource: record.id.clone(),
                        value: value.to_string(),
                    });
                    0.0
                }
            },
        };

        let count = match record.count.as_deref() {
            None => 0,
            Some(value) => value.parse::<u32>().unwrap_or_else(|_| {
                self.errors.push(EstimateError::InvalidCount {
                    line: record.line,
                    resource: record.id.clone(),
                    value: value.to_string(),
                });
                0
            }),
        };

        Resource {
            id: record.id.clone(),
            title,
            rate,
            count,
            formula: record.formula.clone().unwrap_or_default(),
        }
    }

    fn check_formula(&mut self, record: &TeamRecord, resource: &Resource, ids: &HashSet<&str>) {
        for reference in formula::references(&resource.formula) {
            if reference == resource.id {
                self.errors.push(EstimateError::SelfReferencingFormula {
                    line: record.line,
                    resource: resource.id.clone(),
                });
            } else if !ids.contains(reference) {
                self.errors.push(EstimateError::UnknownFormulaResource {
                    line: record.line,
                    resource: resource.id.clone(),
                    reference: reference.to_string(),
                });
            }
        }
    }

    fn tasks(&mut self, project: &Project) -> Vec<Task> {
        let parsed = self.parsed;
        parsed
            .tasks
            .iter()
            .map(|record| self.task(record, project))
            .collect()
    }

    fn task(&mut self, record: &TaskRecord, project: &Project) -> Task {
        let risk = record.risk.clone().unwrap_or_default();
        if !risk.is_empty() && !project.risks.contains_key(&risk) {
            self.errors.push(EstimateError::UnknownRisk {
                line: record.line,
                task: record.title.clone(),
                risk: risk.clone(),
            });
        }

        let mut work = IndexMap::new();
        for (resource, value) in &record.efforts {
            match value.parse::<f64>() {
                Ok(effort) if effort.is_finite() && effort >= 0.0 => {
                    work.insert(resource.clone(), effort);
                }
                _ => self.errors.push(EstimateError::InvalidEffort {
                    line: record.line,
                    task: record.title.clone(),
                    resource: resource.clone(),
                    value: value.clone(),
                }),
            }
        }

        for resource in work.keys() {
            if project.resource(resource).is_none() {
                self.errors.push(EstimateError::UnknownResource {
                    line: record.line,
                    task: record.title.clone(),
                    resource: resource.clone(),
                });
            }
        }

        Task {
            category: record.category.clone(),
            title: record.title.clone(),
            risk,
            work,
        }
    }

    fn desired_duration(&mut self) -> Option<Duration> {
        let (value, line) = self.single("desired_duration")?;
        match Duration::parse(value) {
            Ok(duration) => Some(duration),
            Err(source) => {
                self.errors.push(EstimateError::InvalidDuration { line, source });
                None
            }
        }
    }
}

/// Whether `start` can reach itself through other derived resources.
/// Direct self references are reported separately and not followed here.
fn in_cycle(team: &[Resource], start: &Resource) -> bool {
    let derived = |id: &str| team.iter().find(|r| r.id == id && r.is_derived());
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&Resource> = formula::references(&start.formula)
        .into_iter()
        .filter(|id| *id != start.id)
        .filter_map(derived)
        .collect();

    while let Some(resource) = stack.pop() {
        if resource.id == start.id {
            return true;
        }
        if !seen.insert(resource.id.as_str()) {
            continue;
        }
        stack.extend(
            formula::references(&resource.formula)
                .into_iter()
                .filter_map(derived),
        );
    }
    false
}

/// Build a project from already parsed records.
pub fn build(parsed: &ParsedProject) -> Outcome<Project> {
    ProjectBuilder::new(parsed).build()
}
