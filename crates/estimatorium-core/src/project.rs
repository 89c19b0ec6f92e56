//! The estimation domain model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::units::{Currency, Duration, TimeUnit};

/// Risk name to effort multiplier (always >= 1), in declaration order.
pub type Risks = IndexMap<String, f64>;

/// Standard role ids with their default display titles.
pub const STANDARD_RESOURCES: [(&str, &str); 10] = [
    ("fe", "Front dev"),
    ("be", "Back dev"),
    ("mob", "Mob dev"),
    ("ios", "iOS dev"),
    ("droid", "Android dev"),
    ("do", "DevOps"),
    ("pm", "Project Manager"),
    ("ba", "Business Analyst"),
    ("qa", "QA Engineer"),
    ("ds", "UI Designer"),
];

const STANDARD_RISKS: [(&str, f64); 4] = [
    ("low", 1.1),
    ("medium", 1.5),
    ("high", 2.0),
    ("extreme", 5.0),
];

/// Risk catalog applied when a document declares no `risks` directive.
pub fn standard_risks() -> Risks {
    STANDARD_RISKS
        .iter()
        .map(|(name, multiplier)| (name.to_string(), *multiplier))
        .collect()
}

/// Default title of a standard role, if `id` is one.
pub fn standard_title(id: &str) -> Option<&'static str> {
    STANDARD_RESOURCES
        .iter()
        .find(|(rid, _)| *rid == id)
        .map(|(_, title)| *title)
}

/// A team role.
///
/// A resource with an empty `formula` is *direct*: its work comes from task
/// efforts. A non-empty formula makes it *derived* from other resources.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub rate: f64,
    pub count: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub formula: String,
}

impl Resource {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let title = standard_title(&id).unwrap_or_default().to_string();
        Self {
            id,
            title,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = formula.into();
        self
    }

    pub fn is_derived(&self) -> bool {
        !self.formula.is_empty()
    }

    pub fn is_direct(&self) -> bool {
        self.formula.is_empty()
    }
}

/// A unit of work with per-resource effort in project time units.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    pub category: String,
    pub title: String,
    /// Empty means no risk (multiplier 1).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub risk: String,
    pub work: IndexMap<String, f64>,
}

/// Root aggregate of an estimate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Project {
    pub name: Option<String>,
    pub author: Option<String>,
    pub time_unit: Option<TimeUnit>,
    pub currency: Option<Currency>,
    /// "Cleanup & acceptance" overhead in percent; 0 disables it.
    pub acceptance_percent: f64,
    pub team: Vec<Resource>,
    pub desired_duration: Option<Duration>,
    pub risks: Risks,
    pub tasks: Vec<Task>,
}

impl Project {
    /// Unit task efforts are expressed in; hours when none was declared.
    pub fn effort_unit(&self) -> TimeUnit {
        self.time_unit.unwrap_or(TimeUnit::Hr)
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.team.iter().find(|r| r.id == id)
    }

    /// Direct resources, in team order.
    pub fn team_excluding_derived(&self) -> Vec<&Resource> {
        self.team.iter().filter(|r| r.is_direct()).collect()
    }

    /// Multiplier of a task's risk; 1 for no risk or a name missing from the catalog.
    pub fn risk_multiplier(&self, risk: &str) -> f64 {
        if risk.is_empty() {
            return 1.0;
        }
        self.risks.get(risk).copied().unwrap_or(1.0)
    }
}
