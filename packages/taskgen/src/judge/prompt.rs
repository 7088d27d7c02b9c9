use std::fmt::Write;
use std::path::{Path, PathBuf};

use super::JudgeError;
use super::schema::ScoreSchema;

/// Per-file character budget in the grading prompt.
pub const MAX_FILE_CHARS: usize = 20_000;

/// One produced file as shown to the judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Path relative to the output directory, `/`-separated.
    pub name: String,
    pub size: u64,
    /// Text content, or a placeholder for binary files.
    pub content: String,
    pub truncated: bool,
}

/// Walk `dir` and load every file in sorted order.
///
/// Fails when the directory is missing or holds no files.
pub async fn collect_outputs(dir: &Path) -> Result<Vec<OutputFile>, JudgeError> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => {}
        _ => return Err(JudgeError::OutputMissing(dir.to_path_buf())),
    }

    let mut files: Vec<PathBuf> = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }
    if files.is_empty() {
        return Err(JudgeError::OutputEmpty(dir.to_path_buf()));
    }
    files.sort();

    let mut outputs = Vec::with_capacity(files.len());
    for path in files {
        let bytes = tokio::fs::read(&path).await?;
        let name = path
            .strip_prefix(dir)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        outputs.push(to_output(name, bytes));
    }
    Ok(outputs)
}

fn to_output(name: String, bytes: Vec<u8>) -> OutputFile {
    let size = bytes.len() as u64;
    match String::from_utf8(bytes) {
        Ok(text) => {
            let truncated = text.chars().count() > MAX_FILE_CHARS;
            let content = if truncated {
                text.chars().take(MAX_FILE_CHARS).collect()
            } else {
                text
            };
            OutputFile {
                name,
                size,
                content,
                truncated,
            }
        }
        Err(_) => OutputFile {
            name,
            size,
            content: format!("<binary file, {size} bytes>"),
            truncated: false,
        },
    }
}

/// Grading prompt: task, scoring guide, expected JSON shape and the outputs.
pub fn build_prompt(
    instruction: &str,
    guide: &str,
    schema: &ScoreSchema,
    outputs: &[OutputFile],
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "## Task\n{}\n", instruction.trim());
    let _ = writeln!(prompt, "## Scoring guide\n{guide}\n");
    let _ = writeln!(
        prompt,
        "## Response format\nRespond with one JSON object matching this schema:\n{}\n",
        serde_json::to_string_pretty(&schema.to_json_schema()).unwrap_or_default()
    );
    let _ = writeln!(prompt, "## Submitted outputs");
    for file in outputs {
        let _ = writeln!(prompt, "\n### {} ({} bytes)", file.name, file.size);
        let _ = writeln!(prompt, "{}", file.content);
        if file.truncated {
            let _ = writeln!(prompt, "[truncated after {MAX_FILE_CHARS} characters]");
        }
    }
    prompt
}
