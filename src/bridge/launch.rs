//! Launch-argument configuration for the child process.
//!
//! The bridge restarts the child with different argument vectors as the
//! operator switches sessions or models. Modeling these as a closed
//! variant set keeps the router's transition table exhaustive instead
//! of concatenating strings ad hoc.

use std::fmt;

/// The argument form the child will be (re)started with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LaunchConfig {
    /// Plain start with no extra arguments.
    #[default]
    Base,
    /// Continue the most recent session (`--continue`).
    Continue,
    /// Present the child's interactive session picker (`--resume`).
    ResumeList,
    /// Resume the session matching a query (`--resume <query>`).
    ResumeById(String),
    /// Plain start pinned to a model (`--model <name>`).
    WithModel(String),
}

impl LaunchConfig {
    /// The full argument vector, program name first.
    #[must_use]
    pub fn argv(&self, program: &str) -> Vec<String> {
        let mut argv = vec![program.to_owned()];
        match self {
            Self::Base => {}
            Self::Continue => argv.push("--continue".to_owned()),
            Self::ResumeList => argv.push("--resume".to_owned()),
            Self::ResumeById(query) => {
                argv.push("--resume".to_owned());
                argv.push(query.clone());
            }
            Self::WithModel(model) => {
                argv.push("--model".to_owned());
                argv.push(model.clone());
            }
        }
        argv
    }

    /// Render the command line for status display.
    #[must_use]
    pub fn command_line(&self, program: &str) -> String {
        self.argv(program).join(" ")
    }
}

impl fmt::Display for LaunchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str("base"),
            Self::Continue => f.write_str("continue"),
            Self::ResumeList => f.write_str("resume-list"),
            Self::ResumeById(query) => write!(f, "resume({query})"),
            Self::WithModel(model) => write!(f, "model({model})"),
        }
    }
}
