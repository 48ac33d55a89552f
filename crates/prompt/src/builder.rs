//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use docent_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Variables named in `input_variables` but missing from `variables` are an
/// error; Handlebars alone would silently render them empty.
///
/// # Example
/// ```no_run
/// use docent_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What color is the sky?".to_string());
/// vars.insert("context".to_string(), "The sky is blue.".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    if let Some(missing) = definition
        .input_variables
        .iter()
        .find(|name| !variables.contains_key(name.as_str()))
    {
        return Err(AppError::Prompt(format!(
            "Missing variable '{}' for prompt {}",
            missing, definition.id
        )));
    }

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        definition.system.clone(),
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{builtin_prompt, RAG_ANSWER_PROMPT_ID};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let rendered =
            render_template("Question: {{prompt}}", &vars(&[("prompt", "Hello, world!")]));
        assert_eq!(rendered.unwrap(), "Question: Hello, world!");
    }

    #[test]
    fn test_no_html_escaping() {
        let rendered = render_template("{{q}}", &vars(&[("q", "a < b & \"c\"")])).unwrap();
        assert_eq!(rendered, "a < b & \"c\"");
    }

    #[test]
    fn test_build_rag_prompt() {
        let def = builtin_prompt(RAG_ANSWER_PROMPT_ID).unwrap();
        let built = build_prompt(
            &def,
            vars(&[
                ("context", "[a.txt] The sky is blue."),
                ("question", "What color is the sky?"),
            ]),
        )
        .unwrap();

        assert!(built.user.contains("[a.txt] The sky is blue."));
        assert!(built.user.contains("Question:\nWhat color is the sky?"));
        assert_eq!(built.metadata.source_prompt_id, "rag.answer");
    }

    #[test]
    fn test_missing_declared_variable() {
        let def = builtin_prompt(RAG_ANSWER_PROMPT_ID).unwrap();
        let result = build_prompt(&def, vars(&[("question", "Why?")]));
        assert!(matches!(result, Err(AppError::Prompt(msg)) if msg.contains("context")));
    }
}
