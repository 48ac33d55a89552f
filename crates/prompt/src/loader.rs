//! Prompt loader: built-in definitions plus workspace overrides.

use crate::types::PromptDefinition;
use docent_core::{config::STATE_DIR, AppError, AppResult};
use std::path::{Path, PathBuf};

/// Identifier of the grounded question-answering prompt.
pub const RAG_ANSWER_PROMPT_ID: &str = "rag.answer";

const RAG_ANSWER_TEMPLATE: &str = r#"You are a helpful assistant that answers questions using the provided context.

Use the following rules:
- ONLY use the context to answer the question.
- If the answer is not in the context, say "I don’t know based on the available information."
- Be concise and factual. Do not hallucinate.
- Always cite the source if available.

Context:
{{context}}

Question:
{{question}}

Answer:
"#;

/// Built-in prompt definitions shipped with the binary.
pub fn builtin_prompt(prompt_id: &str) -> Option<PromptDefinition> {
    match prompt_id {
        RAG_ANSWER_PROMPT_ID => Some(PromptDefinition {
            id: RAG_ANSWER_PROMPT_ID.to_string(),
            title: "Grounded answer with citations".to_string(),
            api_version: "1.0".to_string(),
            system: None,
            template: RAG_ANSWER_TEMPLATE.to_string(),
            input_variables: vec!["context".to_string(), "question".to_string()],
        }),
        _ => None,
    }
}

/// Load a prompt definition by ID.
///
/// A file `.docent/prompts/<id>.yaml` (or `.yml`) in the workspace takes
/// precedence over the built-in definition of the same ID.
///
/// # Example
/// ```no_run
/// use docent_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "rag.answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    if let Some(prompt_file) = find_prompt_file(workspace_path, prompt_id) {
        tracing::debug!("Loading prompt from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to parse prompt YAML {:?}: {}",
                prompt_file, e
            ))
        })?;

        validate_prompt(&definition)?;
        tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    builtin_prompt(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", prompt_id)))
}

/// List prompt IDs: built-ins plus workspace files, sorted and deduplicated.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids = vec![RAG_ANSWER_PROMPT_ID.to_string()];
    let prompts_dir = prompts_dir(workspace_path);

    if prompts_dir.exists() {
        for entry in walkdir::WalkDir::new(&prompts_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_yaml = matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yaml") | Some("yml")
            );
            if path.is_file() && is_yaml {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(STATE_DIR).join("prompts")
}

fn find_prompt_file(workspace_path: &Path, prompt_id: &str) -> Option<PathBuf> {
    let dir = prompts_dir(workspace_path);
    ["yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", prompt_id, ext)))
        .find(|p| p.is_file())
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, file_name: &str, content: &str) {
        let prompts_dir = dir.join(".docent/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(prompts_dir.join(file_name), content).unwrap();
    }

    #[test]
    fn test_builtin_rag_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), RAG_ANSWER_PROMPT_ID).unwrap();
        assert!(prompt.template.contains("ONLY use the context"));
        assert!(prompt.template.contains("{{question}}"));
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "rag.answer.yaml",
            "id: rag.answer\ntitle: Terse\napiVersion: \"1.0\"\ntemplate: \"{{question}}?\"\n",
        );

        let prompt = load_prompt(temp_dir.path(), RAG_ANSWER_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Terse");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "broken.yml", "invalid: yaml: content:");
        assert!(load_prompt(temp_dir.path(), "broken").is_err());
    }

    #[test]
    fn test_rejects_bad_api_version() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "v.yaml",
            "id: v\ntitle: V\napiVersion: \"1\"\ntemplate: \"x\"\n",
        );
        assert!(load_prompt(temp_dir.path(), "v").is_err());
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "summary.yaml", "id: summary");
        write_prompt(temp_dir.path(), "rag.answer.yml", "id: rag.answer");

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts, vec!["rag.answer".to_string(), "summary".to_string()]);
    }
}
