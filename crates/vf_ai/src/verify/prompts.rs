pub fn verification_prompt(claim: &str, evidence: &[String]) -> String {
    let evidence_text = if evidence.is_empty() {
        "- (no matching verified statements were found)".to_string()
    } else {
        evidence
            .iter()
            .map(|e| format!("- {e}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are a fact-checking assistant. Compare the claim against the retrieved evidence and decide whether the claim is True, False, or Unverifiable.

Rules:
1) Use ONLY the evidence below.
2) If the evidence does not settle the claim, the verdict is Unverifiable.

Claim: {claim}

Retrieved evidence:
{evidence_text}

Respond with a JSON object in exactly this shape:
{{
    "verdict": "True" | "False" | "Unverifiable",
    "reasoning": "why this verdict was chosen"
}}
"#
    )
}
