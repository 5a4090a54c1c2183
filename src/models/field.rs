//! 分析字段定义与字段注册表

use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};

/// 模板中药物名称的占位符
pub const DRUG_NAME_PLACEHOLDER: &str = "{drug_name}";

/// 单个分析字段的定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// 字段名称（注册表中的键）
    pub name: String,
    /// 字段含义说明
    #[serde(default)]
    pub definition: String,
    /// 问题模板，含 `{drug_name}` 占位符
    pub question_template: String,
    /// 期望的答案结构描述
    #[serde(alias = "structure")]
    pub answer_structure: String,
    /// 系统提示词模板
    #[serde(alias = "system_prompt")]
    pub system_prompt_template: String,
}

impl FieldDefinition {
    pub fn new(
        name: impl Into<String>,
        question_template: impl Into<String>,
        answer_structure: impl Into<String>,
        system_prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            definition: String::new(),
            question_template: question_template.into(),
            answer_structure: answer_structure.into(),
            system_prompt_template: system_prompt_template.into(),
        }
    }

    /// 附加字段说明
    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    /// 检查必填项
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AnalyzerError::invalid_field("<空>", "字段名称不能为空"));
        }

        let required = [
            ("question_template", &self.question_template),
            ("answer_structure", &self.answer_structure),
            ("system_prompt_template", &self.system_prompt_template),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(AnalyzerError::invalid_field(name, format!("{} 不能为空", key)));
            }
        }

        if !self.question_template.contains(DRUG_NAME_PLACEHOLDER) {
            return Err(AnalyzerError::invalid_field(
                name,
                format!("question_template 缺少 {} 占位符", DRUG_NAME_PLACEHOLDER),
            ));
        }

        Ok(())
    }

    /// 生成针对某个药物的问题
    pub fn render_question(&self, drug_name: &str) -> String {
        render_template(&self.question_template, drug_name)
    }

    /// 生成针对某个药物的系统提示词
    pub fn render_system_prompt(&self, drug_name: &str) -> String {
        render_template(&self.system_prompt_template, drug_name)
    }
}

fn render_template(template: &str, drug_name: &str) -> String {
    template.replace(DRUG_NAME_PLACEHOLDER, drug_name)
}

/// 字段注册表
///
/// 按插入顺序保存字段；覆盖已有字段时保留其原位置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRegistry {
    fields: Vec<FieldDefinition>,
}

impl FieldRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 七个标准 ECMO 分析字段
    pub fn ecmo_defaults() -> Self {
        let mut registry = Self::new();
        for field in default_ecmo_fields() {
            registry.fields.push(field);
        }
        registry
    }

    /// 插入或覆盖字段定义，返回被覆盖的旧定义
    pub fn insert(&mut self, definition: FieldDefinition) -> Result<Option<FieldDefinition>> {
        definition.validate()?;

        match self.position(&definition.name) {
            Some(idx) => Ok(Some(std::mem::replace(&mut self.fields[idx], definition))),
            None => {
                self.fields.push(definition);
                Ok(None)
            }
        }
    }

    /// 删除字段
    pub fn remove(&mut self, name: &str) -> Option<FieldDefinition> {
        self.position(name).map(|idx| self.fields.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// 按插入顺序返回字段名
    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

fn default_ecmo_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new(
            "Effect on ECMO",
            "What is the effect of ECMO on {drug_name}? Summarize all investigators' conclusions about how ECMO affects {drug_name} pharmacokinetics and pharmacodynamics.",
            "A single short sentence that summarizes the impact on ECMO, e.g. - no change, minimal impact on PK, significant impact on PK, significant sequestration is possible, effect unknown.",
            "You are a clinical pharmacologist analyzing the effect of ECMO on {drug_name}. Focus on pharmacokinetic and pharmacodynamic changes. Provide a concise summary of all investigators' conclusions. Structure your response as a single short sentence indicating the impact level (no change, minimal impact, significant impact, significant sequestration possible, or effect unknown).",
        )
        .with_definition("Summarize all the investigators' conclusions regarding the effect of ECMO on the drug."),
        FieldDefinition::new(
            "Final Recommendation",
            "What are all the dosing recommendations for {drug_name} when used during ECMO in pediatric patients? Compile all dose adjustment recommendations from the available studies.",
            "Generate/formulate a recommendation according to the accumulated data found on the drug. E.g., Standard dose, Dose at high end of normal range, increased dosing suggested: 2 gm IV (bolus) q8h, or 2 gm IV (over 4 hr) q12h, Insufficient data for a recommendation, Increased dosing suggested, Increase loading dose duration. Start at 6 mg/kg IV q12h x2 days (or after oxygenator change) and then reduce dose to 3–4 mg/kg q24h",
            "You are a pediatric pharmacist compiling dosing recommendations for {drug_name} during ECMO. Review all available studies and synthesize a clear dosing recommendation. Include specific doses, routes, frequencies, and any special considerations for pediatric ECMO patients. Format as a clear recommendation statement.",
        )
        .with_definition("Collect all recommendations on dose adjustment of the drug from the studies we provided."),
        FieldDefinition::new(
            "Volume of distribution (Vd)",
            "How does ECMO affect the volume of distribution (Vd) of {drug_name}? Compare Vd values during ECMO versus standard treatment.",
            "A concise answer: no change / increased / decreased (add original quotations and references)",
            "You are analyzing pharmacokinetic changes for {drug_name} during ECMO. Focus specifically on volume of distribution changes. Compare Vd values between ECMO and non-ECMO conditions. Provide a concise answer: no change, increased, or decreased. Include exact quotations and references.",
        )
        .with_definition("When using ECMO, is there a change in the drug's Vd compared to treatment without ECMO?"),
        FieldDefinition::new(
            "Circuit sequestration",
            "What is the evidence for {drug_name} sequestration in ECMO circuit tubing? Include information about tubing types and sequestration levels.",
            "Summarize in one or two words: no sequestration / minimal / high (add in parentheses original quotations, tubing type if known, and references)",
            "You are evaluating {drug_name} sequestration in ECMO circuits. Focus on circuit binding, tubing material effects, and drug loss. Categorize sequestration as: no sequestration, minimal, or high. Include original quotations, tubing types when available, and specific references.",
        )
        .with_definition("Summarize the known evidence regarding sequestration of the drug in the ECMO circuit tubing."),
        FieldDefinition::new(
            "ECMO dosage",
            "What is the recommended dosing range for {drug_name} during ECMO treatment in pediatric patients? Include minimum and maximum doses by indication.",
            "Provide a short one-sentence answer with minimum and maximum dose by indication.",
            "You are determining therapeutic dosing ranges for {drug_name} during pediatric ECMO. Identify minimum and maximum recommended doses for different indications. Provide a concise one-sentence answer with specific dose ranges and indications.",
        )
        .with_definition("What is the recommended dosing range for treatment on ECMO?"),
        FieldDefinition::new(
            "PK Properties -LogP",
            "What is the LogP (partition coefficient) value for {drug_name}? Provide the specific numerical value.",
            "Provide the absolute number.",
            "You are extracting pharmacokinetic properties for {drug_name}. Find and report the LogP (lipophilicity) value. Provide only the numerical value without additional explanation.",
        )
        .with_definition("Crop the LogP of the drug."),
        FieldDefinition::new(
            "PK Properties - Protein Binding",
            "What is the protein binding percentage for {drug_name}? Provide the specific percentage or percentage range.",
            "Provide the percentage / percentage range.",
            "You are extracting pharmacokinetic properties for {drug_name}. Find and report the protein binding percentage. Provide only the percentage value or range without additional explanation.",
        )
        .with_definition("Crop the protein binding of the drug."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_field(name: &str) -> FieldDefinition {
        FieldDefinition::new(
            name,
            "What is the half-life of {drug_name} on ECMO?",
            "Hours, as a range",
            "You are a pharmacologist studying {drug_name}.",
        )
    }

    #[test]
    fn test_defaults_keep_reference_order() {
        let registry = FieldRegistry::ecmo_defaults();
        assert_eq!(
            registry.names(),
            vec![
                "Effect on ECMO",
                "Final Recommendation",
                "Volume of distribution (Vd)",
                "Circuit sequestration",
                "ECMO dosage",
                "PK Properties -LogP",
                "PK Properties - Protein Binding",
            ]
        );
        for field in registry.iter() {
            field.validate().unwrap();
        }
    }

    #[test]
    fn test_render_substitutes_every_placeholder() {
        let registry = FieldRegistry::ecmo_defaults();
        let field = registry.get("Effect on ECMO").unwrap();
        let question = field.render_question("meropenem");
        assert!(!question.contains(DRUG_NAME_PLACEHOLDER));
        assert_eq!(question.matches("meropenem").count(), 2);
        assert!(field.render_system_prompt("meropenem").contains("ECMO on meropenem"));
    }

    #[test]
    fn test_insert_overwrite_keeps_position() {
        let mut registry = FieldRegistry::ecmo_defaults();
        let replaced = registry
            .insert(custom_field("Circuit sequestration"))
            .unwrap();
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.names()[3], "Circuit sequestration");
        assert_eq!(
            registry.get("Circuit sequestration").unwrap().answer_structure,
            "Hours, as a range"
        );
    }

    #[test]
    fn test_insert_new_field_appends() {
        let mut registry = FieldRegistry::ecmo_defaults();
        assert!(registry.insert(custom_field("Half-life")).unwrap().is_none());
        assert_eq!(registry.names().last().unwrap(), "Half-life");
        assert!(registry.remove("Half-life").is_some());
        assert!(!registry.contains("Half-life"));
    }

    #[test]
    fn test_validate_rejects_missing_keys() {
        let mut field = custom_field("Half-life");
        field.system_prompt_template = "  ".to_string();
        assert!(matches!(
            field.validate(),
            Err(AnalyzerError::InvalidFieldDefinition { .. })
        ));

        let mut field = custom_field("Half-life");
        field.question_template = "What is the half-life?".to_string();
        assert!(field.validate().is_err());

        let field = custom_field("");
        assert!(field.validate().is_err());
    }
}
