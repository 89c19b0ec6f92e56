//! Summary printed after sizing.

use std::io::Write;

use serde::Serialize;

use estimatorium_core::{risk_weighted_work, Project};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Trait for types that can be formatted for output
pub trait FormattedOutput {
    fn format_text(&self) -> String;
    fn format_json(&self) -> Result<String, serde_json::Error>;
}

/// Write formatted output, followed by a newline.
pub fn write_output<T, W>(format: OutputFormat, value: &T, mut writer: W) -> Result<(), CliError>
where
    T: FormattedOutput + Serialize,
    W: Write,
{
    let output = match format {
        OutputFormat::Text => value.format_text(),
        OutputFormat::Json => value
            .format_json()
            .map_err(|e| CliError::Other(anyhow::anyhow!("JSON serialization failed: {e}")))?,
    };

    writeln!(writer, "{output}")?;
    Ok(())
}

/// One sized team member.
#[derive(Debug, Serialize)]
pub struct MemberSummary {
    pub id: String,
    pub title: String,
    pub count: u32,
    pub rate: f64,
    /// Risk-weighted hours; absent for derived resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
}

/// Sized team of a project.
#[derive(Debug, Serialize)]
pub struct SizingSummary {
    pub project: Option<String>,
    pub currency: Option<String>,
    /// Desired duration in hours, when one was declared.
    pub desired_hours: Option<f64>,
    pub team: Vec<MemberSummary>,
}

impl SizingSummary {
    pub fn new(project: &Project) -> Self {
        let work = risk_weighted_work(project);
        let team = project
            .team
            .iter()
            .map(|r| MemberSummary {
                id: r.id.clone(),
                title: r.title.clone(),
                count: r.count,
                rate: r.rate,
                hours: if r.is_derived() {
                    None
                } else {
                    Some(work.get(&r.id).copied().unwrap_or(0.0))
                },
            })
            .collect();

        Self {
            project: project.name.clone(),
            currency: project.currency.map(|c| c.as_str().to_string()),
            desired_hours: project.desired_duration.map(|d| d.hours()),
            team,
        }
    }

    pub fn headcount(&self) -> u32 {
        self.team.iter().map(|m| m.count).sum()
    }
}

impl FormattedOutput for SizingSummary {
    fn format_text(&self) -> String {
        let mut out = String::new();
        out.push_str(self.project.as_deref().unwrap_or("(unnamed project)"));
        out.push('\n');

        if self.team.is_empty() {
            out.push_str("  no team\n");
        }

        let id_width = self.team.iter().map(|m| m.id.len()).max().unwrap_or(0);
        let title_width = self.team.iter().map(|m| m.title.chars().count()).max().unwrap_or(0);
        for m in &self.team {
            out.push_str(&format!(
                "  {:<id_width$}  {:<title_width$}  x{:<3} rate {}\n",
                m.id, m.title, m.count, m.rate
            ));
        }

        out.push_str(&format!("headcount: {}", self.headcount()));
        out
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
