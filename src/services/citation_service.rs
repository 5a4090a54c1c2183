//! 引用整理服务 - 业务能力层
//!
//! 只负责把引擎返回的答案与引用整理为统一的字段结果，不关心流程。
//! 数据缺失时输出空字符串，从不报错。

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

use crate::clients::{Citation, QaResponse};
use crate::models::{FieldMetadata, FieldResult};

/// 最多保留的引用条数
const MAX_CITATIONS: usize = 5;
/// 原文引用的目标长度
const QUOTE_TARGET_LEN: usize = 300;
/// 寻找句号断点的窗口
const QUOTE_BREAK_WINDOW: (usize, usize) = (250, 350);
/// 短于此长度的引用视为无意义片段
const QUOTE_MIN_LEN: usize = 20;

/// References 段落中的编号行，如 `1. Shekar K, ...`
///
/// 常量模式，编译失败属于程序错误
static REFERENCE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.\s*(.+?)\s*$").expect("valid reference regex"));

/// 前几条参考文献视为被多次引用
const MULTI_CITATION_RANK: usize = 3;

/// 把引擎响应整理为字段结果
pub fn normalize_response(response: &QaResponse) -> FieldResult {
    let answer = response.answer.trim().to_string();

    let formatted_answer = match response.formatted_answer.as_deref().map(str::trim) {
        Some(formatted) if !formatted.is_empty() => formatted.to_string(),
        _ => build_formatted_answer(&answer, &response.citations),
    };

    let mut sources = collect_sources(&response.citations);
    if sources.is_empty() {
        sources = parse_reference_section(&formatted_answer)
            .into_iter()
            .map(|reference| (reference, String::new()))
            .collect();
    }

    let references: Vec<&str> = sources.iter().map(|(source, _)| source.as_str()).collect();
    let ref_details: Vec<String> = sources
        .iter()
        .enumerate()
        .map(|(i, (source, notes))| {
            if notes.is_empty() {
                classify_reference(source, i)
            } else {
                notes.clone()
            }
        })
        .collect();

    debug!(
        "整理引用完成: {} 条原文, {} 条参考文献",
        response.citations.len(),
        references.len()
    );

    FieldResult {
        answer,
        formatted_answer,
        metadata: FieldMetadata {
            exact_citation: extract_quotes(&response.citations).join("\n"),
            reference: references.join("\n"),
            ref_details: ref_details.join("\n"),
        },
    }
}

/// 引擎没有给出带引用的答案时自行拼接
fn build_formatted_answer(answer: &str, citations: &[Citation]) -> String {
    let sources = collect_sources(citations);
    if sources.is_empty() {
        return answer.to_string();
    }

    let lines: Vec<String> = sources
        .iter()
        .enumerate()
        .map(|(i, (source, _))| format!("{}. {}", i + 1, source))
        .collect();

    format!("{}\n\nReferences\n\n{}", answer, lines.join("\n"))
}

/// 去重后的文献出处及其质量说明（按出现顺序，最多 5 条）
fn collect_sources(citations: &[Citation]) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    citations
        .iter()
        .filter(|c| !c.source.trim().is_empty())
        .filter(|c| seen.insert(c.source.trim().to_string()))
        .take(MAX_CITATIONS)
        .map(|c| (c.source.trim().to_string(), c.quality_notes.trim().to_string()))
        .collect()
}

/// 提取有意义的原文片段
fn extract_quotes(citations: &[Citation]) -> Vec<String> {
    citations
        .iter()
        .take(MAX_CITATIONS)
        .map(|c| shorten_quote(c.quote.trim()))
        .filter(|q| q.chars().count() > QUOTE_MIN_LEN)
        .collect()
}

/// 把过长的引用截断到句号处
fn shorten_quote(quote: &str) -> String {
    let chars: Vec<char> = quote.chars().collect();
    if chars.len() <= QUOTE_TARGET_LEN {
        return quote.to_string();
    }

    let (start, end) = QUOTE_BREAK_WINDOW;
    let end = end.min(chars.len());
    if let Some(offset) = chars[start..end].iter().position(|&c| c == '.') {
        return chars[..start + offset + 1].iter().collect();
    }

    let mut shortened: String = chars[..QUOTE_TARGET_LEN].iter().collect();
    shortened.push_str("...");
    shortened
}

/// 从带引用答案的 References 段落中解析文献
///
/// 形如 `1. (Shekar2014 pages 2-3): Shekar K, ...` 的行取冒号后的部分
fn parse_reference_section(formatted_answer: &str) -> Vec<String> {
    let mut references = Vec::new();
    let mut in_references = false;

    for line in formatted_answer.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("References") {
            in_references = true;
            continue;
        }
        if !in_references || trimmed.is_empty() {
            continue;
        }

        if let Some(caps) = REFERENCE_LINE.captures(trimmed) {
            let entry = &caps[1];
            let entry = match entry.split_once(':') {
                Some((_, rest)) if !rest.trim().is_empty() => rest.trim(),
                _ => entry,
            };
            references.push(entry.to_string());
            if references.len() >= MAX_CITATIONS {
                break;
            }
        }
    }

    references
}

/// 根据文献描述粗略判断研究类型与人群
///
/// `rank` 为该文献在参考文献列表中的位置（从0开始）
pub fn classify_reference(reference: &str, rank: usize) -> String {
    let lower = reference.to_lowercase();

    let (study_type, quality) = if lower.contains("randomized") || lower.contains("rct") {
        ("Randomized controlled trial", "high-quality RCT")
    } else if lower.contains("prospective") || lower.contains("cohort") {
        ("Prospective observational study", "moderate-quality observational study")
    } else if lower.contains("case report") || lower.contains("case series") {
        ("Case report/series", "case-based evidence")
    } else if lower.contains("review") {
        ("Literature review", "narrative review")
    } else if lower.contains("guideline") {
        ("Clinical guideline", "expert consensus guideline")
    } else if lower.contains("pharmacokinetics") {
        ("Pharmacokinetic study", "specialized PK research")
    } else {
        ("Clinical research study", "peer-reviewed research")
    };

    let population = if lower.contains("pediatric") || lower.contains("children") {
        "pediatric ECMO patients"
    } else if lower.contains("adult") {
        "adult ECMO patients"
    } else {
        "ECMO patients"
    };

    let evidence = if rank < MULTI_CITATION_RANK {
        "multiple citations"
    } else {
        "single citation"
    };

    format!(
        "{} on {}. Quality: {}. Evidence: {} from this source.",
        study_type, population, quality, evidence
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(quote: &str, source: &str, notes: &str) -> Citation {
        Citation {
            quote: quote.to_string(),
            source: source.to_string(),
            quality_notes: notes.to_string(),
        }
    }

    #[test]
    fn test_answer_without_citations_has_empty_metadata() {
        let result = normalize_response(&QaResponse::new("Clearance increases"));
        assert_eq!(result.answer, "Clearance increases");
        assert_eq!(result.formatted_answer, "Clearance increases");
        assert_eq!(result.metadata, FieldMetadata::default());
    }

    #[test]
    fn test_citations_fill_metadata_and_formatted_answer() {
        let response = QaResponse::new("Vd is increased")
            .with_citation(citation(
                "Meropenem volume of distribution was larger in children on ECMO.",
                "Cies JJ. Pediatric pharmacokinetics of meropenem on ECMO. 2017",
                "Prospective PK study, n=11",
            ))
            .with_citation(citation(
                "short",
                "Shekar K. Adult ex vivo circuit review. 2012",
                "",
            ));

        let result = normalize_response(&response);

        assert_eq!(
            result.metadata.exact_citation,
            "Meropenem volume of distribution was larger in children on ECMO."
        );
        assert_eq!(
            result.metadata.reference,
            "Cies JJ. Pediatric pharmacokinetics of meropenem on ECMO. 2017\nShekar K. Adult ex vivo circuit review. 2012"
        );
        assert_eq!(
            result.metadata.ref_details,
            "Prospective PK study, n=11\nLiterature review on adult ECMO patients. Quality: narrative review. Evidence: multiple citations from this source."
        );
        assert!(result.formatted_answer.starts_with("Vd is increased\n\nReferences\n\n1. Cies JJ."));
        assert!(result.formatted_answer.contains("\n2. Shekar K."));
    }

    #[test]
    fn test_engine_formatted_answer_is_kept_and_parsed() {
        let response = QaResponse {
            answer: "Minimal impact".into(),
            formatted_answer: Some(
                "Minimal impact (Lee2021).\n\nReferences\n\n1. (Lee2021 pages 1-2): Lee J. A randomized trial in adults. 2021\n2. Kim S. Case series. 2019\n"
                    .into(),
            ),
            citations: vec![],
        };

        let result = normalize_response(&response);
        assert!(result.formatted_answer.starts_with("Minimal impact (Lee2021)."));
        assert_eq!(
            result.metadata.reference,
            "Lee J. A randomized trial in adults. 2021\nKim S. Case series. 2019"
        );
        assert_eq!(
            result.metadata.ref_details,
            "Randomized controlled trial on adult ECMO patients. Quality: high-quality RCT. Evidence: multiple citations from this source.\nCase report/series on ECMO patients. Quality: case-based evidence. Evidence: multiple citations from this source."
        );
    }

    #[test]
    fn test_duplicate_sources_collapse() {
        let response = QaResponse::new("a")
            .with_citation(citation("first quote long enough to be kept here", "Doc A", ""))
            .with_citation(citation("second quote long enough to be kept here", "Doc A", ""));
        let result = normalize_response(&response);
        assert_eq!(result.metadata.reference, "Doc A");
        assert_eq!(result.metadata.exact_citation.lines().count(), 2);
    }

    #[test]
    fn test_shorten_quote_prefers_sentence_break() {
        let mut quote = "a".repeat(260);
        quote.push('.');
        quote.push_str(&"b".repeat(100));
        let short = shorten_quote(&quote);
        assert_eq!(short.len(), 261);
        assert!(short.ends_with('.'));

        let long = "c".repeat(400);
        let short = shorten_quote(&long);
        assert_eq!(short.len(), 303);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn test_classify_reference_evidence_by_rank() {
        assert_eq!(
            classify_reference("Guideline for neonatal ECMO dosing", 0),
            "Clinical guideline on ECMO patients. Quality: expert consensus guideline. Evidence: multiple citations from this source."
        );
        assert_eq!(
            classify_reference("Population pharmacokinetics in children", 3),
            "Pharmacokinetic study on pediatric ECMO patients. Quality: specialized PK research. Evidence: single citation from this source."
        );
        assert!(classify_reference("Pharmacokinetic model", 0).starts_with("Clinical research study"));
    }

    #[test]
    fn test_reference_line_pattern() {
        let caps = REFERENCE_LINE.captures("  12. Cies JJ, 2017  ").unwrap();
        assert_eq!(&caps[1], "Cies JJ, 2017");
        assert!(REFERENCE_LINE.captures("Cies JJ, 2017").is_none());
    }

    #[test]
    fn test_quotes_limited_to_five() {
        let mut response = QaResponse::new("a");
        for i in 0..8 {
            response = response.with_citation(citation(
                &format!("quote number {} with plenty of text", i),
                &format!("Doc {}", i),
                "",
            ));
        }
        let result = normalize_response(&response);
        assert_eq!(result.metadata.exact_citation.lines().count(), 5);
        assert_eq!(result.metadata.reference.lines().count(), 5);
        assert_eq!(result.metadata.ref_details.lines().count(), 5);
    }
}
