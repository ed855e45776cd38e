//! Rendering of download outcomes
//!
//! Human output is one line per PDB. JSON output is a `"pdb"` field meant to be spliced
//! into a larger JSON object, so consecutive fields are comma separated.

use crate::error::Result;
use serde::Serialize;

/// How outcomes are rendered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// `PDB "<name>" download success`
    #[default]
    Human,
    /// `"pdb":{"file":"<name>","download":true}`
    Json,
}

#[derive(Serialize)]
struct PdbField<'a> {
    file: &'a str,
    download: bool,
}

/// Accumulates rendered actions for one report
///
/// ```
/// use pdb_dl::output::{OutputFormat, Report};
///
/// let mut report = Report::new(OutputFormat::Human);
/// assert_eq!(report.render("a.pdb", true).unwrap(), "PDB \"a.pdb\" download success\n");
/// assert_eq!(report.actions_done(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Report {
    format: OutputFormat,
    actions_done: usize,
}

impl Report {
    /// Create an empty report
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            actions_done: 0,
        }
    }

    /// Continue a report that already rendered `actions_done` fields elsewhere
    pub fn with_actions_done(format: OutputFormat, actions_done: usize) -> Self {
        Self {
            format,
            actions_done,
        }
    }

    /// Number of actions rendered so far
    pub fn actions_done(&self) -> usize {
        self.actions_done
    }

    /// Render the outcome for `file` and count it as one action
    pub fn render(&mut self, file: &str, succeeded: bool) -> Result<String> {
        let rendered = match self.format {
            OutputFormat::Human => format!(
                "PDB \"{}\" download {}\n",
                file,
                if succeeded { "success" } else { "failed" }
            ),
            OutputFormat::Json => {
                let field = serde_json::to_string(&PdbField {
                    file,
                    download: succeeded,
                })?;
                let separator = if self.actions_done > 0 { "," } else { "" };
                format!("{}\"pdb\":{}", separator, field)
            }
        };
        self.actions_done += 1;
        Ok(rendered)
    }
}
