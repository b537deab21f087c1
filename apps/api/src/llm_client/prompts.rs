// Shared prompt fragments. Each capability keeps its own prompts.rs alongside it;
// this file holds the pieces every structured call needs.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every rewrite so the layout estimate stays meaningful.
pub const ONE_SENTENCE_PER_LINE: &str = "\
    Output each sentence on its own line. Each sentence is one bullet point and should fill \
    roughly one line of a letter-sized page. Do not include bullet characters, only newlines.";

/// Instruction protecting facts and the fixed-format trailing line.
pub const NO_INVENTION: &str = "\
    Do not invent facts. Never remove or reword the 'Technologies used:' line. \
    Keep any existing double-asterisk emphasis markers exactly as they are.";

/// Builds a complete system prompt: role line followed by the JSON-only rules.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_system_appends_rules() {
        let system = json_system("You are a resume editor.");
        assert!(system.starts_with("You are a resume editor."));
        assert!(system.contains("valid JSON only"));
    }
}
