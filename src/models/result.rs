//! 字段分析结果与结果集

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 引用相关的元数据，三个键始终存在
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// 原文引用
    #[serde(default)]
    pub exact_citation: String,
    /// 参考文献
    #[serde(default)]
    pub reference: String,
    /// 参考文献的研究类型与质量说明
    #[serde(default)]
    pub ref_details: String,
}

/// 单个字段的分析结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldResult {
    pub answer: String,
    pub formatted_answer: String,
    pub metadata: FieldMetadata,
}

/// 批量模式下失败字段的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldFailure {
    pub error: String,
}

/// 结果集中的一个槽位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOutcome {
    Success(FieldResult),
    Failure(FieldFailure),
}

impl FieldOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        FieldOutcome::Failure(FieldFailure {
            error: message.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FieldOutcome::Success(_))
    }

    pub fn as_result(&self) -> Option<&FieldResult> {
        match self {
            FieldOutcome::Success(result) => Some(result),
            FieldOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FieldOutcome::Success(_) => None,
            FieldOutcome::Failure(failure) => Some(&failure.error),
        }
    }
}

impl From<FieldResult> for FieldOutcome {
    fn from(result: FieldResult) -> Self {
        FieldOutcome::Success(result)
    }
}

/// 结果集：字段名 → 结果，保持插入顺序
///
/// 序列化为 JSON 对象，键顺序与分析顺序一致
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    entries: Vec<(String, FieldOutcome)>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个字段的结果；同名字段覆盖原值
    pub fn insert(&mut self, field_name: impl Into<String>, outcome: impl Into<FieldOutcome>) {
        let field_name = field_name.into();
        let outcome = outcome.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field_name) {
            Some((_, slot)) => *slot = outcome,
            None => self.entries.push((field_name, outcome)),
        }
    }

    pub fn get(&self, field_name: &str) -> Option<&FieldOutcome> {
        self.entries
            .iter()
            .find(|(name, _)| name == field_name)
            .map(|(_, outcome)| outcome)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldOutcome)> {
        self.entries.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|(_, o)| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, outcome) in &self.entries {
            map.serialize_entry(name, outcome)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResultSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultSetVisitor;

        impl<'de> Visitor<'de> for ResultSetVisitor {
            type Value = ResultSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field name to field result")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ResultSet, A::Error> {
                let mut set = ResultSet::new();
                while let Some((name, outcome)) = access.next_entry::<String, FieldOutcome>()? {
                    set.insert(name, outcome);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(ResultSetVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_result(answer: &str) -> FieldResult {
        FieldResult {
            answer: answer.to_string(),
            formatted_answer: answer.to_string(),
            metadata: FieldMetadata::default(),
        }
    }

    #[test]
    fn test_serialize_keeps_insertion_order() {
        let mut set = ResultSet::new();
        set.insert("Zeta", sample_result("z"));
        set.insert("Alpha", FieldOutcome::failure("timeout"));

        let text = serde_json::to_string(&set).unwrap();
        assert!(text.find("Zeta").unwrap() < text.find("Alpha").unwrap());

        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["Alpha"], json!({"error": "timeout"}));
        assert_eq!(
            value["Zeta"],
            json!({
                "answer": "z",
                "formatted_answer": "z",
                "metadata": {"exact_citation": "", "reference": "", "ref_details": ""}
            })
        );
    }

    #[test]
    fn test_deserialize_distinguishes_failures() {
        let text = r#"{
            "B": {"error": "engine down"},
            "A": {"answer": "x", "formatted_answer": "x",
                  "metadata": {"exact_citation": "", "reference": "", "ref_details": ""}}
        }"#;
        let set: ResultSet = serde_json::from_str(text).unwrap();
        assert_eq!(set.field_names(), vec!["B", "A"]);
        assert_eq!(set.get("B").unwrap().error(), Some("engine down"));
        assert_eq!(set.get("A").unwrap().as_result().unwrap().answer, "x");
        assert_eq!(set.success_count(), 1);
        assert_eq!(set.failure_count(), 1);
    }

    #[test]
    fn test_insert_same_name_overwrites() {
        let mut set = ResultSet::new();
        set.insert("A", FieldOutcome::failure("first"));
        set.insert("A", sample_result("second"));
        assert_eq!(set.len(), 1);
        assert!(set.get("A").unwrap().is_success());
    }
}
