use crate::schema::Entity;

pub fn build_relation_prompt(text: &str, entities: &[Entity]) -> String {
    let entity_list = entities
        .iter()
        .map(|e| format!("- {} ({})", e.text, e.category))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Extract factual relations between the given entities from the text below.

INSTRUCTIONS:
1. Only use entities from the ENTITIES list, with their exact names
2. Extract relations actually stated in the text
3. Output ONLY valid JSON, nothing else
4. Use the exact schema below

SCHEMA:
{{
  "triples": [
    {{"head": "EntityName", "relation": "relation phrase", "tail": "OtherEntity", "confidence": 0.9}}
  ]
}}

RULES:
- Relations should be short verb phrases: "is the capital of", "works at", "founded", etc.
- confidence is your certainty in [0, 1] that the text states this relation
- Never relate an entity to itself
- Output ONLY the JSON object, no markdown, no explanations

ENTITIES:
{}

TEXT:
{}

JSON OUTPUT:"#,
        entity_list, text
    )
}

pub fn build_retry_prompt(invalid_json: &str) -> String {
    format!(
        r#"The following JSON is invalid:

{}

Fix this JSON. Output only valid JSON with no markdown formatting, no code blocks, no explanations. Just the raw JSON object."#,
        invalid_json
    )
}
