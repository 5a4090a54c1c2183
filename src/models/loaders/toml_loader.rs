use crate::error::{AnalyzerError, Result};
use crate::models::field::{FieldDefinition, FieldRegistry};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 字段定义文件的结构
///
/// ```toml
/// [[fields]]
/// name = "Half-life"
/// question_template = "What is the half-life of {drug_name} during ECMO?"
/// answer_structure = "Hours, as a range"
/// system_prompt_template = "You are a pharmacologist studying {drug_name}."
/// ```
#[derive(Debug, Deserialize)]
struct FieldFile {
    #[serde(default)]
    fields: Vec<FieldDefinition>,
}

/// 解析 TOML 文本中的字段定义
pub fn parse_field_definitions(content: &str, source: &str) -> Result<Vec<FieldDefinition>> {
    let file: FieldFile = toml::from_str(content).map_err(|e| AnalyzerError::FieldFile {
        path: source.to_string(),
        source: e,
    })?;

    for field in &file.fields {
        field.validate()?;
    }

    Ok(file.fields)
}

/// 从 TOML 文件加载字段定义
pub async fn load_field_definitions(toml_file_path: &Path) -> Result<Vec<FieldDefinition>> {
    let path_str = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AnalyzerError::io(&path_str, e))?;

    let fields = parse_field_definitions(&content, &path_str)?;
    tracing::info!("从 {} 加载了 {} 个字段定义", path_str, fields.len());

    Ok(fields)
}

/// 将文件中的字段合并进注册表（同名覆盖）
pub async fn merge_field_file(registry: &mut FieldRegistry, toml_file_path: &Path) -> Result<usize> {
    let fields = load_field_definitions(toml_file_path).await?;
    let count = fields.len();

    for field in fields {
        let name = field.name.clone();
        if registry.insert(field)?.is_some() {
            tracing::info!("字段定义已覆盖: {}", name);
        } else {
            tracing::info!("新增字段定义: {}", name);
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOM_FIELDS: &str = r#"
[[fields]]
name = "Half-life"
definition = "Elimination half-life on ECMO."
question_template = "What is the half-life of {drug_name} during ECMO?"
answer_structure = "Hours, as a range"
system_prompt_template = "You are a pharmacologist studying {drug_name}."

[[fields]]
name = "Effect on ECMO"
question_template = "Does ECMO change {drug_name} exposure?"
structure = "One sentence"
system_prompt = "Be brief about {drug_name}."
"#;

    #[test]
    fn test_parse_accepts_reference_key_aliases() {
        let fields = parse_field_definitions(CUSTOM_FIELDS, "inline").unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].definition, "Elimination half-life on ECMO.");
        assert_eq!(fields[1].answer_structure, "One sentence");
        assert_eq!(fields[1].definition, "");
    }

    #[test]
    fn test_parse_rejects_missing_key() {
        let broken = r#"
[[fields]]
name = "Half-life"
question_template = "What is the half-life of {drug_name}?"
"#;
        assert!(matches!(
            parse_field_definitions(broken, "inline"),
            Err(AnalyzerError::FieldFile { .. })
        ));
    }

    #[tokio::test]
    async fn test_merge_overwrites_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.toml");
        std::fs::write(&path, CUSTOM_FIELDS).unwrap();

        let mut registry = FieldRegistry::ecmo_defaults();
        let merged = merge_field_file(&mut registry, &path).await.unwrap();

        assert_eq!(merged, 2);
        assert_eq!(registry.len(), 8);
        assert_eq!(registry.names()[0], "Effect on ECMO");
        assert_eq!(
            registry.get("Effect on ECMO").unwrap().answer_structure,
            "One sentence"
        );
        assert_eq!(registry.names().last().unwrap(), "Half-life");
    }
}
