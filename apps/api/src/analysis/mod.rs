// Résumé-vs-posting analysis.
// Implements: prompt building, image transcription, model call orchestration, reply segmentation.
// All model calls go through llm_client; no direct Gemini calls here.

pub mod handlers;
pub mod pipeline;
pub mod prompt_builder;
pub mod prompts;
pub mod segmenter;
pub mod transcribe;
