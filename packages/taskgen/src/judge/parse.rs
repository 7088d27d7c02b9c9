use serde_json::Value;

/// Result of pulling a JSON object out of free-form model output.
#[derive(Debug, Clone, PartialEq)]
pub enum JudgeParse {
    Parsed(Value),
    Unparsable,
}

impl JudgeParse {
    pub fn into_value(self) -> Option<Value> {
        match self {
            JudgeParse::Parsed(value) => Some(value),
            JudgeParse::Unparsable => None,
        }
    }
}

/// Layered extraction: the whole text, then each fenced code block, then
/// every brace-balanced candidate in order. Only objects are accepted.
pub fn extract_json(text: &str) -> JudgeParse {
    let text = text.trim();

    if let Some(value) = parse_object(text) {
        return JudgeParse::Parsed(value);
    }

    for block in fenced_blocks(text) {
        if let Some(value) = parse_object(block.trim()) {
            return JudgeParse::Parsed(value);
        }
    }

    for candidate in balanced_objects(text) {
        if let Some(value) = parse_object(candidate) {
            return JudgeParse::Parsed(value);
        }
    }

    JudgeParse::Unparsable
}

fn parse_object(s: &str) -> Option<Value> {
    serde_json::from_str::<Value>(s)
        .ok()
        .filter(Value::is_object)
}

/// Bodies of ``` fences, skipping the language tag line.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(after.len());
        let body = &after[body_start..];
        let Some(close) = body.find("```") else {
            break;
        };
        blocks.push(&body[..close]);
        rest = &body[close + 3..];
    }
    blocks
}

/// Top-level `{...}` spans, tracking string literals and escapes.
fn balanced_objects(input: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escape = false;

    for (pos, c) in input.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' if depth > 0 => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(pos);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        spans.push(&input[s..pos + c.len_utf8()]);
                    }
                }
            }
            _ => {}
        }
    }
    spans
}
