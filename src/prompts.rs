// System prompt loading

use crate::error::{Error, Result};
use serde_json::Value;
use std::path::Path;

/// Read `<key>.system_prompt` from a JSON prompts file
pub fn load_system_prompt(path: impl AsRef<Path>, key: &str) -> Result<String> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read prompts file {}: {}", path.display(), e))
    })?;
    let prompts: Value = serde_json::from_str(&contents)?;

    prompts
        .get(key)
        .and_then(|entry| entry.get("system_prompt"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::PromptNotFound {
            key: key.to_string(),
            path: path.display().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_system_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.json");
        std::fs::write(
            &path,
            r#"{"agent_com": {"system_prompt": "You turn requests into SD prompts."}}"#,
        )
        .unwrap();

        let prompt = load_system_prompt(&path, "agent_com").unwrap();
        assert_eq!(prompt, "You turn requests into SD prompts.");

        let err = load_system_prompt(&path, "other").unwrap_err();
        assert!(matches!(err, Error::PromptNotFound { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_system_prompt("/no/such/prompts.json", "agent_com").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
