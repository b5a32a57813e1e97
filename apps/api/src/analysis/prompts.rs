// All prompt constants for the Analysis module.
// Reuses the persona fragment from llm_client::prompts.

/// Instruction sent with a job-posting image. The reply is used verbatim as the job text.
pub const TRANSCRIBE_JOB_IMAGE_PROMPT: &str = "\
Transcribe this job-posting image into plain text. \
Preserve the headings, the list of responsibilities, and every stated requirement \
in the order they appear. Do not summarize, translate, or add commentary. \
Return only the transcribed text.";

/// Résumé-vs-posting analysis prompt.
/// Replace: {persona}, {resume_text}, {job_text}, {format_instruction}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"{persona}

TASK: Compare the candidate's résumé with the job posting below and produce exactly three sections, in this order.

SECTION 1 — COMPATIBILITY REPORT
### Compatibility Score
A single score out of 100 with a one-sentence justification.
### Matching Strengths
The requirements the résumé clearly satisfies, each tied to evidence from the résumé.
### Missing Skills and Gaps
Required or preferred qualifications the résumé does not demonstrate.
### Recommendations
Concrete steps the candidate can take to close the gaps before applying.

SECTION 2 — A DAY IN THE ROLE
### Morning
### Afternoon
### Challenges This Candidate Would Face
Simulate a realistic working day in this position for this specific candidate, grounded in the posting's responsibilities.

SECTION 3 — COVER LETTER DRAFT
### Cover Letter
A short cover letter under 150 words, written in the first person as the candidate, addressed to the hiring team.

{format_instruction}

RÉSUMÉ:
{resume_text}

JOB POSTING:
{job_text}"#;
