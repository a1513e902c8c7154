//! Grammar file loading.

use anyhow::{Context, Result};
use lintworm_syntax::{GrammarConfig, GrammarSet};
use std::fs;
use std::path::Path;

/// Compile the grammar from a JSON file, or the standard grammar without one.
pub fn load_grammars(path: Option<&Path>) -> Result<GrammarSet> {
    let config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read grammar file {}", path.display()))?;
            parse_grammar(&text)
                .with_context(|| format!("invalid grammar file {}", path.display()))?
        }
        None => GrammarConfig::default(),
    };
    GrammarSet::compile(&config).context("failed to compile documentation grammar")
}

fn parse_grammar(text: &str) -> Result<GrammarConfig> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_keys_use_standard_templates() {
        let config = parse_grammar(r#"{"method": {"raise_start": ":throws:[ ]+"}}"#).unwrap();
        assert_eq!(config.method.raise_start, ":throws:[ ]+");
        assert_eq!(config.function, GrammarConfig::default().function);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_grammar(r#"{"module": {}}"#).is_err());
    }

    #[test]
    fn bad_fragment_reports_kind_and_field() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"class": {"parameter_end": "(["}}"#).unwrap();
        let err = load_grammars(Some(file.path())).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("class template: `parameter_end`"), "{message}");
    }
}
