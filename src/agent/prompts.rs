//! Prompt templates and engineering

use handlebars::Handlebars;
use serde::Serialize;

use crate::core::ScoredMemory;
use crate::error::{Error, Result};

/// System prompt used when no override is configured
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are Atlas, an analytical assistant that turns data and past interactions into clear, actionable insight.

Guidelines:
- Ground your answer in the relevant memories when they apply
- Say so plainly when the memories do not cover the question
- Prefer concrete figures and short explanations over generalities"#;

/// Template for the system message of a memory-augmented query
pub const QUERY_TEMPLATE: &str = r#"{{system_prompt}}
{{#if persona}}

Respond in the voice of: {{persona}}
{{/if}}
{{#if domain}}

Domain: {{domain}}
{{/if}}
{{#if memories}}

Relevant memories (closest first):
{{#each memories}}
{{this.rank}}. [{{this.timestamp}}] {{this.text}}
{{/each}}
{{/if}}"#;

/// A prompt template using Handlebars syntax
pub struct PromptTemplate {
    /// Template name
    name: String,
    /// Handlebars registry
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(name: impl Into<String>, template: &str) -> Result<Self> {
        let name = name.into();
        let mut registry = Handlebars::new();
        // Prompts are plain text, not HTML
        registry.register_escape_fn(handlebars::no_escape);

        registry
            .register_template_string(&name, template)
            .map_err(|e| Error::Internal(format!("Invalid template: {}", e)))?;

        Ok(PromptTemplate { name, registry })
    }

    /// Render the template with given data
    pub fn render<T: Serialize>(&self, data: &T) -> Result<String> {
        self.registry
            .render(&self.name, data)
            .map_err(|e| Error::Internal(format!("Template render error: {}", e)))
    }
}

#[derive(Serialize)]
struct MemoryLine<'a> {
    rank: usize,
    timestamp: String,
    text: &'a str,
}

/// Data rendered into [`QUERY_TEMPLATE`]
#[derive(Serialize)]
pub struct QueryPrompt<'a> {
    system_prompt: &'a str,
    persona: Option<&'a str>,
    domain: Option<&'a str>,
    memories: Vec<MemoryLine<'a>>,
}

impl<'a> QueryPrompt<'a> {
    /// Collect prompt data; blank persona or domain is dropped
    pub fn new(
        system_prompt: &'a str,
        persona: Option<&'a str>,
        domain: Option<&'a str>,
        memories: &'a [ScoredMemory],
    ) -> Self {
        QueryPrompt {
            system_prompt,
            persona: persona.filter(|p| !p.trim().is_empty()),
            domain: domain.filter(|d| !d.trim().is_empty()),
            memories: memories
                .iter()
                .enumerate()
                .map(|(i, m)| MemoryLine {
                    rank: i + 1,
                    timestamp: m.timestamp.format("%Y-%m-%d %H:%M UTC").to_string(),
                    text: &m.text,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn memory(id: i64, text: &str) -> ScoredMemory {
        ScoredMemory {
            id,
            text: text.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            metadata: Default::default(),
            distance: id as f32,
        }
    }

    #[test]
    fn test_template_rendering() {
        let template = PromptTemplate::new("test", "Hello, {{name}}!").unwrap();
        let result = template
            .render(&serde_json::json!({"name": "World"}))
            .unwrap();
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_template_does_not_html_escape() {
        let template = PromptTemplate::new("test", "{{q}}").unwrap();
        let result = template
            .render(&serde_json::json!({"q": "a < b & \"c\""}))
            .unwrap();
        assert_eq!(result, "a < b & \"c\"");
    }

    #[test]
    fn test_invalid_template() {
        assert!(PromptTemplate::new("bad", "{{#if open}}never closed").is_err());
    }

    #[test]
    fn test_query_prompt_numbers_memories_in_order() {
        let template = PromptTemplate::new("query", QUERY_TEMPLATE).unwrap();
        let memories = vec![memory(7, "closest note"), memory(3, "second note")];
        let rendered = template
            .render(&QueryPrompt::new("SYS", Some("analyst"), Some("health"), &memories))
            .unwrap();

        assert!(rendered.starts_with("SYS"));
        assert!(rendered.contains("Respond in the voice of: analyst"));
        assert!(rendered.contains("Domain: health"));
        assert!(rendered.contains("1. [2024-03-01 09:30 UTC] closest note"));
        assert!(rendered.contains("2. [2024-03-01 09:30 UTC] second note"));
        assert!(rendered.find("closest note") < rendered.find("second note"));
    }

    #[test]
    fn test_query_prompt_omits_empty_sections() {
        let template = PromptTemplate::new("query", QUERY_TEMPLATE).unwrap();
        let rendered = template
            .render(&QueryPrompt::new("SYS", Some("  "), None, &[]))
            .unwrap();

        assert_eq!(rendered.trim(), "SYS");
    }
}
