pub fn extraction_prompt(input_text: &str) -> String {
    // Contract: a bare JSON array of strings. Prose around it is tolerated by the parser.
    format!(
        r#"You are a claim extraction assistant. Extract the main factual claims from the text below.

Rules:
1) Each claim must be a single, self-contained factual assertion.
2) Do not add facts that are not in the text.
3) Return ONLY a JSON array of strings.

Text:
{input_text}

Output format: ["claim 1", "claim 2", ...]
"#
    )
}
