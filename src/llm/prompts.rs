//! Prompts sent to the LLM collaborator.

/// Collection of prompts used for summary and description generation.
pub struct Prompts;

impl Prompts {
    /// Prompt to summarize one section's text.
    pub fn node_summary() -> &'static str {
        r#"You are given a part of a document, your task is to generate a description of the partial document about what are main points covered in the partial document.

Partial Document Text: {text}

Directly return the description, do not include any other text."#
    }

    /// Prompt to produce a one-sentence description of a whole document
    /// from its reconciled structure.
    pub fn doc_description() -> &'static str {
        r#"You are an expert in generating descriptions for a document.
You are given a structure of a document. Your task is to generate a one-sentence description for the document, which makes it easy to distinguish the document from other documents.

Document Structure: {structure}

Directly return the description, do not include any other text."#
    }

    /// System prompt for all requests.
    pub fn system_document_analyzer() -> &'static str {
        "You are an expert document analyzer. You always respond with exactly what is asked, without additional commentary."
    }
}
