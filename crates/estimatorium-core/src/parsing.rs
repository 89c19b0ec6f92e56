//! Line-oriented parser for estimation documents.
//!
//! A document starts in directive mode (`name value` lines). A line holding
//! only `team` switches to team mode, one holding only `tasks` to task mode.
//! Blank lines and `#` comments are skipped everywhere. Nothing here checks
//! cross references; that is left to [`crate::builder`].

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::error::{ErrorList, EstimateError, Outcome};

/// Marker line that switches to team mode.
pub const TEAM_MARKER: &str = "team";
/// Marker line that switches to task mode.
pub const TASKS_MARKER: &str = "tasks";

/// How the value part of a directive is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Everything after the name, trimmed.
    SingleValue,
    /// Whitespace separated `key=value` pairs.
    KeyValues,
}

/// A recognised top-level directive.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveDef {
    pub name: &'static str,
    pub kind: DirectiveKind,
}

pub const DIRECTIVES: [DirectiveDef; 7] = [
    DirectiveDef { name: "project", kind: DirectiveKind::SingleValue },
    DirectiveDef { name: "author", kind: DirectiveKind::SingleValue },
    DirectiveDef { name: "currency", kind: DirectiveKind::SingleValue },
    DirectiveDef { name: "time_unit", kind: DirectiveKind::SingleValue },
    DirectiveDef { name: "acceptance_percent", kind: DirectiveKind::SingleValue },
    DirectiveDef { name: "risks", kind: DirectiveKind::KeyValues },
    DirectiveDef { name: "desired_duration", kind: DirectiveKind::SingleValue },
];

/// Parsed value of a directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DirectiveValue {
    Single(String),
    Pairs(Vec<(String, String)>),
}

impl DirectiveValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Pairs(_) => None,
        }
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        match self {
            Self::Single(_) => &[],
            Self::Pairs(pairs) => pairs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub name: String,
    pub value: DirectiveValue,
    pub line: usize,
}

/// One team line; values are kept as written for the builder to validate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TeamRecord {
    pub id: String,
    pub title: Option<String>,
    pub rate: Option<String>,
    pub count: Option<String>,
    pub formula: Option<String>,
    pub line: usize,
}

/// One task line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TaskRecord {
    pub category: String,
    pub title: String,
    pub risk: Option<String>,
    pub efforts: Vec<(String, String)>,
    pub line: usize,
}

/// Intermediate result of parsing, before semantic validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParsedProject {
    /// Directives by name, each at most once.
    pub directives: IndexMap<String, Directive>,
    /// `None` when the document has no team section at all.
    pub team: Option<Vec<TeamRecord>>,
    pub tasks: Vec<TaskRecord>,
}

impl ParsedProject {
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.get(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    #[default]
    Directives,
    Team,
    Tasks,
}

#[derive(Default)]
struct ParseState {
    mode: Mode,
}

/// Estimation document parser.
pub struct DirectiveParser {
    directives: &'static [DirectiveDef],
}

impl DirectiveParser {
    pub fn new() -> Self {
        Self {
            directives: &DIRECTIVES,
        }
    }

    /// Parse a whole document, collecting every line-level error.
    pub fn parse(&self, content: &str) -> Outcome<ParsedProject> {
        let mut parsed = ParsedProject::default();
        let mut errors = ErrorList::new();
        let mut state = ParseState::default();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(e) = self.parse_line(&mut parsed, &mut state, line, index + 1) {
                errors.push(e);
            }
        }

        debug!(
            directives = parsed.directives.len(),
            team = parsed.team.as_ref().map_or(0, Vec::len),
            tasks = parsed.tasks.len(),
            errors = errors.len(),
            "parsed estimation document"
        );

        Outcome::new(parsed, errors)
    }

    fn parse_line(
        &self,
        parsed: &mut ParsedProject,
        state: &mut ParseState,
        line: &str,
        line_num: usize,
    ) -> Result<(), EstimateError> {
        if line == TEAM_MARKER {
            state.mode = Mode::Team;
            parsed.team.get_or_insert_with(Vec::new);
            return Ok(());
        }
        if line == TASKS_MARKER {
            state.mode = Mode::Tasks;
            return Ok(());
        }

        match state.mode {
            Mode::Directives => self.parse_directive(parsed, line, line_num),
            Mode::Team => {
                let record = parse_team_line(line, line_num)?;
                push_team_record(parsed, record)
            }
            Mode::Tasks => {
                let record = parse_task_line(line, line_num)?;
                parsed.tasks.push(record);
                Ok(())
            }
        }
    }

    fn parse_directive(
        &self,
        parsed: &mut ParsedProject,
        line: &str,
        line_num: usize,
    ) -> Result<(), EstimateError> {
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        // Earlier revisions of the format declared the team inline as
        // `team be=2 fe=1`, giving each resource a pre-set count.
        if name == TEAM_MARKER {
            return self.parse_inline_team(parsed, rest, line_num);
        }

        let def = self
            .directives
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| EstimateError::UnknownDirective {
                line: line_num,
                name: name.to_string(),
            })?;

        if parsed.directives.contains_key(name) {
            return Err(EstimateError::DuplicateDirective {
                line: line_num,
                name: name.to_string(),
            });
        }

        let value = match def.kind {
            DirectiveKind::SingleValue => DirectiveValue::Single(rest.to_string()),
            DirectiveKind::KeyValues => DirectiveValue::Pairs(split_pairs(rest, line_num)?),
        };

        debug!(line = line_num, directive = name, "directive");
        parsed.directives.insert(
            name.to_string(),
            Directive {
                name: name.to_string(),
                value,
                line: line_num,
            },
        );
        Ok(())
    }

    fn parse_inline_team(
        &self,
        parsed: &mut ParsedProject,
        rest: &str,
        line_num: usize,
    ) -> Result<(), EstimateError> {
        if parsed.directives.contains_key(TEAM_MARKER) {
            return Err(EstimateError::DuplicateDirective {
                line: line_num,
                name: TEAM_MARKER.to_string(),
            });
        }
        let pairs = split_pairs(rest, line_num)?;
        parsed.directives.insert(
            TEAM_MARKER.to_string(),
            Directive {
                name: TEAM_MARKER.to_string(),
                value: DirectiveValue::Pairs(pairs.clone()),
                line: line_num,
            },
        );
        parsed.team.get_or_insert_with(Vec::new);

        for (id, count) in pairs {
            push_team_record(
                parsed,
                TeamRecord {
                    id,
                    count: Some(count),
                    line: line_num,
                    ..TeamRecord::default()
                },
            )?;
        }
        Ok(())
    }
}

impl Default for DirectiveParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a document with the standard directive set.
pub fn parse(content: &str) -> Outcome<ParsedProject> {
    DirectiveParser::new().parse(content)
}

fn push_team_record(parsed: &mut ParsedProject, record: TeamRecord) -> Result<(), EstimateError> {
    let team = parsed.team.get_or_insert_with(Vec::new);
    if team.iter().any(|r| r.id == record.id) {
        return Err(EstimateError::DuplicateResource {
            line: record.line,
            id: record.id,
        });
    }
    team.push(record);
    Ok(())
}

/// `<resource-id> [title=.. rate=.. cnt=.. formula=..]`
fn parse_team_line(line: &str, line_num: usize) -> Result<TeamRecord, EstimateError> {
    let (id, rest) = match line.split_once(char::is_whitespace) {
        Some((id, rest)) => (id, rest),
        None => (line, ""),
    };

    let mut record = TeamRecord {
        id: id.to_string(),
        line: line_num,
        ..TeamRecord::default()
    };

    for (key, value) in split_pairs(rest, line_num)? {
        let slot = match key.as_str() {
            "title" => &mut record.title,
            "rate" => &mut record.rate,
            "cnt" => &mut record.count,
            "formula" => &mut record.formula,
            _ => {
                return Err(EstimateError::UnknownTeamProperty {
                    line: line_num,
                    resource: record.id.clone(),
                    key: key.clone(),
                })
            }
        };
        *slot = Some(value);
    }

    Ok(record)
}

/// `<category> | <title> | <res>=<effort> ... [risks=<name>]`
fn parse_task_line(line: &str, line_num: usize) -> Result<TaskRecord, EstimateError> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() != 3 {
        return Err(EstimateError::MalformedTaskLine {
            line: line_num,
            parts: parts.len(),
        });
    }

    let mut record = TaskRecord {
        category: parts[0].trim().to_string(),
        title: parts[1].trim().to_string(),
        line: line_num,
        ..TaskRecord::default()
    };

    for (key, value) in split_pairs(parts[2], line_num)? {
        if key == "risks" {
            if record.risk.is_some() {
                return Err(EstimateError::DuplicateEffort {
                    line: line_num,
                    resource: key,
                });
            }
            record.risk = Some(value);
        } else if record.efforts.iter().any(|(k, _)| *k == key) {
            return Err(EstimateError::DuplicateEffort {
                line: line_num,
                resource: key,
            });
        } else {
            record.efforts.push((key, value));
        }
    }

    Ok(record)
}

/// Split `a=1 b="two words"` on runs of spaces/tabs outside double quotes,
/// then each token on its first `=`.
pub fn split_pairs(text: &str, line_num: usize) -> Result<Vec<(String, String)>, EstimateError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in text.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(EstimateError::UnterminatedQuote { line: line_num });
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
        .into_iter()
        .map(|token| match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(EstimateError::MalformedPair {
                line: line_num,
                token,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
project Project Name
author email@example.com

# the billing side
currency usd
time_unit day
acceptance_percent 10

risks low=1.1 medium=1.5 high=2
desired_duration 3mth

team
be rate=40
fe rate=30 title="Front-end dev"
qa rate=20 formula=(be+fe)*0.3

tasks

Initial	|Research 		| be=3 fe=3 risks=low
Initial	|Bootstrap		| be=1 fe=1 risks=low
API		| API task 1	| be=2
"#;

    #[test]
    fn test_parse_directives() {
        let outcome = parse(SAMPLE);
        assert!(outcome.is_ok(), "{}", outcome.errors);
        let parsed = outcome.value;

        assert_eq!(
            parsed.directive("project").unwrap().value,
            DirectiveValue::Single("Project Name".to_string())
        );
        assert_eq!(
            parsed.directive("currency").unwrap().value.as_single(),
            Some("usd")
        );
        let risks = parsed.directive("risks").unwrap().value.as_pairs();
        assert_eq!(risks.len(), 3);
        assert_eq!(risks[2], ("high".to_string(), "2".to_string()));
        assert_eq!(parsed.directive("desired_duration").unwrap().line, 11);
    }

    #[test]
    fn test_parse_team_section() {
        let parsed = parse(SAMPLE).value;
        let team = parsed.team.unwrap();

        assert_eq!(team.len(), 3);
        assert_eq!(team[0].id, "be");
        assert_eq!(team[0].rate.as_deref(), Some("40"));
        assert_eq!(team[1].title.as_deref(), Some("Front-end dev"));
        assert_eq!(team[2].formula.as_deref(), Some("(be+fe)*0.3"));
    }

    #[test]
    fn test_parse_tasks() {
        let parsed = parse(SAMPLE).value;

        assert_eq!(parsed.tasks.len(), 3);
        let research = &parsed.tasks[0];
        assert_eq!(research.category, "Initial");
        assert_eq!(research.title, "Research");
        assert_eq!(research.risk.as_deref(), Some("low"));
        assert_eq!(
            research.efforts,
            vec![
                ("be".to_string(), "3".to_string()),
                ("fe".to_string(), "3".to_string())
            ]
        );
        assert_eq!(parsed.tasks[2].risk, None);
    }

    #[test]
    fn test_duplicate_directive() {
        let outcome = parse("currency usd\ncurrency eur\n");
        let errors: Vec<_> = outcome.errors.into_iter().collect();

        assert_eq!(
            errors,
            vec![EstimateError::DuplicateDirective {
                line: 2,
                name: "currency".to_string()
            }]
        );
        assert_eq!(
            outcome.value.directive("currency").unwrap().value.as_single(),
            Some("usd")
        );
    }

    #[test]
    fn test_errors_are_collected_not_fatal() {
        let doc = "bogus 1\nproject X\nproject Y\ntasks\na|b\nc|d|be=1\n";
        let outcome = parse(doc);

        let lines: Vec<usize> = outcome.errors.iter().map(EstimateError::line).collect();
        assert_eq!(lines, vec![1, 3, 5]);
        assert!(matches!(
            outcome.errors.iter().nth(2),
            Some(EstimateError::MalformedTaskLine { parts: 2, .. })
        ));
        assert_eq!(outcome.value.tasks.len(), 1);
    }

    #[test]
    fn test_too_many_task_parts() {
        let outcome = parse("tasks\na|b|c|be=1\n");
        assert!(matches!(
            outcome.errors.iter().next(),
            Some(EstimateError::MalformedTaskLine { line: 2, parts: 4 })
        ));
    }

    #[test]
    fn test_directives_only_before_sections() {
        let outcome = parse("team\nbe\ncurrency\n");
        let team = outcome.value.team.unwrap();
        assert_eq!(team.len(), 2);
        assert_eq!(team[1].id, "currency");
        assert!(outcome.value.directives.is_empty());

        // Read as a team line, `usd` is not a key=value pair.
        let outcome = parse("team\nbe\ncurrency usd\n");
        assert!(matches!(
            outcome.errors.iter().next(),
            Some(EstimateError::MalformedPair { line: 3, .. })
        ));
    }

    #[test]
    fn test_team_present_but_empty() {
        let parsed = parse("team\ntasks\n").value;
        assert_eq!(parsed.team, Some(vec![]));
        assert_eq!(parse("project X\n").value.team, None);
    }

    #[test]
    fn test_inline_team_directive() {
        let outcome = parse("team be=2 fe=1\n");
        assert!(outcome.is_ok(), "{}", outcome.errors);
        let team = outcome.value.team.unwrap();
        assert_eq!(team.len(), 2);
        assert_eq!(team[0].count.as_deref(), Some("2"));
        assert_eq!(team[1].id, "fe");
    }

    #[test]
    fn test_duplicate_resource() {
        let outcome = parse("team\nbe\nbe rate=1\n");
        assert!(matches!(
            outcome.errors.iter().next(),
            Some(EstimateError::DuplicateResource { line: 3, .. })
        ));
    }

    #[test]
    fn test_unknown_team_property() {
        let outcome = parse("team\nbe salary=10\n");
        assert!(matches!(
            outcome.errors.iter().next(),
            Some(EstimateError::UnknownTeamProperty { key, .. }) if key == "salary"
        ));
    }

    #[test]
    fn test_pair_without_equals_is_malformed() {
        let outcome = parse("risks low=1.1 medium\n");
        assert_eq!(
            outcome.errors.iter().next(),
            Some(&EstimateError::MalformedPair {
                line: 1,
                token: "medium".to_string()
            })
        );
        assert!(outcome.value.directive("risks").is_none());
    }

    #[test]
    fn test_duplicate_effort() {
        let outcome = parse("tasks\na|b|be=1 be=2\n");
        assert!(matches!(
            outcome.errors.iter().next(),
            Some(EstimateError::DuplicateEffort { resource, .. }) if resource == "be"
        ));
    }

    #[test]
    fn test_split_pairs_quotes_and_tabs() {
        let pairs = split_pairs("title=\"QA lead\"\trate=20  ", 1).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("title".to_string(), "QA lead".to_string()),
                ("rate".to_string(), "20".to_string())
            ]
        );
        assert_eq!(
            split_pairs("title=\"open", 9),
            Err(EstimateError::UnterminatedQuote { line: 9 })
        );
        assert!(split_pairs("=5", 1).is_err());
        assert_eq!(split_pairs("   ", 1), Ok(vec![]));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let pairs = split_pairs("formula=a=b", 1).unwrap();
        assert_eq!(pairs, vec![("formula".to_string(), "a=b".to_string())]);
    }
}
