//! Response segmentation: turns raw model text into display sections.
//!
//! The delimiter protocol sits behind `SectionParser` so a structured response
//! format can replace it without touching the pipeline or handlers.

use serde::Serialize;

/// The reserved token separating the three sections of a model reply.
pub const SECTION_DELIMITER: &str = "|||";

pub const SECTION_TITLES: [&str; 3] = ["Compatibility Report", "A Day in the Role", "Cover Letter"];

/// A model reply, partitioned positionally or kept whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisSections {
    Segmented {
        compatibility_report: String,
        role_simulation: String,
        cover_letter: String,
    },
    /// The model ignored the format; the raw reply is shown as one block.
    Unsegmented(String),
}

/// One panel of rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub body: String,
}

impl AnalysisSections {
    pub fn is_segmented(&self) -> bool {
        matches!(self, AnalysisSections::Segmented { .. })
    }

    /// Section bodies in display order: three when segmented, otherwise one.
    pub fn bodies(&self) -> Vec<&str> {
        match self {
            AnalysisSections::Segmented {
                compatibility_report,
                role_simulation,
                cover_letter,
            } => vec![
                compatibility_report.as_str(),
                role_simulation.as_str(),
                cover_letter.as_str(),
            ],
            AnalysisSections::Unsegmented(raw) => vec![raw.as_str()],
        }
    }

    pub fn into_panels(self) -> Vec<Section> {
        match self {
            AnalysisSections::Segmented {
                compatibility_report,
                role_simulation,
                cover_letter,
            } => SECTION_TITLES
                .iter()
                .zip([compatibility_report, role_simulation, cover_letter])
                .map(|(title, body)| Section {
                    title: title.to_string(),
                    body,
                })
                .collect(),
            AnalysisSections::Unsegmented(raw) => vec![Section {
                title: "Analysis".to_string(),
                body: raw,
            }],
        }
    }
}

/// Swappable reply protocol: the instruction given to the model and the matching parser.
pub trait SectionParser: Send + Sync {
    /// Text appended to the prompt telling the model how to separate sections.
    fn format_instruction(&self) -> String;

    fn parse(&self, raw: &str) -> AnalysisSections;
}

/// Splits on every `|||`. Three or more pieces expose the first three positionally
/// (anything after a third delimiter is dropped); fewer fall back to the whole reply.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelimitedSectionParser;

impl SectionParser for DelimitedSectionParser {
    fn format_instruction(&self) -> String {
        format!(
            "OUTPUT FORMAT: Separate the three sections with the exact token {SECTION_DELIMITER} \
             on its own. Put nothing else between sections, do not use {SECTION_DELIMITER} \
             anywhere else, and do not number the sections."
        )
    }

    fn parse(&self, raw: &str) -> AnalysisSections {
        let mut pieces = raw.split(SECTION_DELIMITER);
        match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(first), Some(second), Some(third)) => AnalysisSections::Segmented {
                compatibility_report: first.to_string(),
                role_simulation: second.to_string(),
                cover_letter: third.to_string(),
            },
            _ => AnalysisSections::Unsegmented(raw.to_string()),
        }
    }
}
