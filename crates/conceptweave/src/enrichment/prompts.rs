//! Prompt templates sent to the text-generation model.

pub fn summary_prompt(content: &str) -> String {
    format!(
        r#"You are an academic assistant.

Create a **detailed, well-structured summary** of the following content suitable for:
- Exam preparation
- Conceptual understanding
- Revision notes

Requirements:
- Use headings and subheadings
- Explain each concept clearly in 2-4 lines
- Do NOT over-compress
- Preserve important definitions and examples
- Use bullet points where helpful

Content:
{content}
"#
    )
}

pub fn concept_map_prompt(content: &str) -> String {
    format!(
        r#"Return a concept map derived from the content below.

You MUST respond with a valid JSON object only.
Do not include any explanation, heading, or commentary.

Schema:
{{
  "nodes": [
    {{ "id": "A", "label": "Main Topic", "type": "concept" }},
    {{ "id": "B", "label": "Supporting idea", "type": "detail" }}
  ],
  "edges": [
    {{ "id": "e1", "source": "A", "target": "B", "label": "relates to" }}
  ]
}}

Rules:
- "type" is one of "concept", "detail", "example"
- Every edge must reference node ids that exist
- Response must start with '{{' and end with '}}'
- No markdown
- No extra text
- No comments

Content:
{content}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prompt_embeds_content() {
        let prompt = summary_prompt("Cell membranes are selectively permeable.");
        assert!(prompt.starts_with("You are an academic assistant."));
        assert!(prompt.contains("Use headings and subheadings"));
        assert!(prompt.trim_end().ends_with("Cell membranes are selectively permeable."));
    }

    #[test]
    fn test_concept_map_prompt_shows_schema() {
        let prompt = concept_map_prompt("Graphs");
        assert!(prompt.contains("You MUST respond with a valid JSON object only."));
        assert!(prompt.contains(r#""source": "A", "target": "B""#));
        assert!(prompt.contains("Response must start with '{' and end with '}'"));
        assert!(prompt.trim_end().ends_with("Graphs"));
    }
}
