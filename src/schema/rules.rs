use crate::error::{CheckgateError, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Rule set shipped with the crate.
pub const BUILTIN_RULES: &str = include_str!("../../schema/checklist-rules.yml");

#[derive(Debug, Deserialize)]
struct RuleFile {
    name: LengthRule,
    categories: Vec<String>,
    severities: Vec<String>,
    version_pattern: String,
    reference_pattern: String,
    items: CountRule,
    item: ItemRuleFile,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LengthRule {
    pub min_length: usize,
    pub max_length: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CountRule {
    pub min_items: usize,
    pub max_items: usize,
}

#[derive(Debug, Deserialize)]
struct ItemRuleFile {
    id_pattern: String,
    text_min_length: usize,
}

/// Compiled form of the declarative rule file.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub name: LengthRule,
    pub categories: Vec<String>,
    pub severities: Vec<String>,
    pub version: Regex,
    pub reference: Regex,
    pub items: CountRule,
    pub item_id: Regex,
    pub item_text_min_length: usize,
}

impl RuleSet {
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_RULES)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CheckgateError::Config(format!(
                "Cannot read schema rules {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content).map_err(|e| {
            CheckgateError::Config(format!("Malformed schema rules {}: {}", path.display(), e))
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: RuleFile = serde_yaml::from_str(content)?;

        if file.name.min_length > file.name.max_length {
            return Err(CheckgateError::Config(
                "name.min_length exceeds name.max_length".to_string(),
            ));
        }
        if file.items.min_items > file.items.max_items {
            return Err(CheckgateError::Config(
                "items.min_items exceeds items.max_items".to_string(),
            ));
        }
        if file.categories.is_empty() || file.severities.is_empty() {
            return Err(CheckgateError::Config(
                "categories and severities must not be empty".to_string(),
            ));
        }

        Ok(Self {
            name: file.name,
            categories: file.categories,
            severities: file.severities,
            version: compile("version_pattern", &file.version_pattern)?,
            reference: compile("reference_pattern", &file.reference_pattern)?,
            items: file.items,
            item_id: compile("item.id_pattern", &file.item.id_pattern)?,
            item_text_min_length: file.item.text_min_length,
        })
    }
}

fn compile(field: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| CheckgateError::Config(format!("Invalid regex in {}: {}", field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_parse() {
        let rules = RuleSet::builtin().unwrap();
        assert_eq!(rules.name.min_length, 3);
        assert_eq!(rules.name.max_length, 100);
        assert!(rules.severities.contains(&"critical".to_string()));
        assert!(rules.version.is_match("1.0.0"));
        assert!(rules.version.is_match("2.1.0-rc.1+build.5"));
        assert!(!rules.version.is_match("1.0"));
        assert!(rules.item_id.is_match("tests-pass"));
        assert!(!rules.item_id.is_match("Tests_Pass"));
        assert!(rules.reference.is_match("story/base"));
    }

    #[test]
    fn test_malformed_rules_fail_fast() {
        assert!(RuleSet::parse("name: [1, 2]").is_err());

        let bad_regex = BUILTIN_RULES.replace(
            "id_pattern: '^[a-z0-9]+(-[a-z0-9]+)*$'",
            "id_pattern: '(['",
        );
        let err = RuleSet::parse(&bad_regex).unwrap_err();
        assert!(err.to_string().contains("item.id_pattern"));
    }

    #[test]
    fn test_missing_rules_file_is_config_error() {
        let err = RuleSet::load(Path::new("/nonexistent/rules.yml")).unwrap_err();
        assert!(matches!(err, CheckgateError::Config(_)));
    }
}
