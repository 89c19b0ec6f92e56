//! Estimatorium core.
//!
//! Parses the estimation DSL into a validated [`Project`] and sizes its team
//! against a desired duration. Everything here is synchronous and free of I/O.

pub mod builder;
pub mod calculate;
pub mod error;
pub mod formula;
pub mod parsing;
pub mod project;
pub mod units;

pub use builder::*;
pub use calculate::*;
pub use error::*;
pub use parsing::*;
pub use project::*;
pub use units::*;

/// Parse and build a project in one pass.
///
/// Parser errors come first, followed by the builder's. The project is
/// returned even when errors were found.
pub fn project_from_str(content: &str) -> Outcome<Project> {
    let Outcome {
        value: parsed,
        mut errors,
    } = parsing::parse(content);
    let built = builder::build(&parsed);
    errors.merge(built.errors);
    Outcome::new(built.value, errors)
}

impl std::str::FromStr for Project {
    type Err = ErrorList;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        project_from_str(s).into_result()
    }
}
