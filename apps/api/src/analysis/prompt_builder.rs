//! Prompt Builder: embeds the résumé and job text into the analysis instruction.
//!
//! Both texts go in verbatim. There is no escaping and no length check: a text
//! containing the section delimiter will mis-partition the reply, and an
//! oversized pair fails at the API as an `LlmError`.

use crate::analysis::prompts::ANALYSIS_PROMPT_TEMPLATE;
use crate::analysis::segmenter::SectionParser;
use crate::llm_client::prompts::{fill_template, HIRING_MANAGER_PERSONA};

/// A fully built analysis instruction. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    prompt: String,
}

impl AnalysisRequest {
    pub fn build(resume_text: &str, job_text: &str, parser: &dyn SectionParser) -> Self {
        let format_instruction = parser.format_instruction();
        let prompt = fill_template(
            ANALYSIS_PROMPT_TEMPLATE,
            &[
                ("persona", HIRING_MANAGER_PERSONA),
                ("format_instruction", &format_instruction),
                ("resume_text", resume_text),
                ("job_text", job_text),
            ],
        );
        Self { prompt }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}
