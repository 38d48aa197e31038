//! Structured question intents.

use serde::{Deserialize, Serialize};

/// Which half of the platform a question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Why a product does or does not appear in a page component.
    PageComponent,
    /// Why an ATDW product was or was not imported.
    AtdwImport,
    /// Anything else; answered from retrieved context alone.
    General,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageComponent => "page_component",
            Self::AtdwImport => "atdw_import",
            Self::General => "general",
        }
    }
}

/// The shape of the question being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    WhyIncluded,
    WhyExcluded,
    WhatShows,
    WhyOrder,
    General,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhyIncluded => "why_included",
            Self::WhyExcluded => "why_excluded",
            Self::WhatShows => "what_shows",
            Self::WhyOrder => "why_order",
            Self::General => "general",
        }
    }
}

/// A free-form question distilled into a typed intent.
///
/// Produced by the intent parser from the raw question plus URL hints;
/// consumed by the collectors, the retriever, and the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIntent {
    pub domain: Domain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_name: Option<String>,
    /// Lower-cased component handle, e.g. `products`.
    pub component_type: String,
    #[serde(default)]
    pub product_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atdw_product_id: Option<String>,
    pub question_type: QuestionType,
    pub raw_question: String,
}

impl ParsedIntent {
    /// A neutral intent carrying only the raw question.
    pub fn general(raw_question: &str) -> Self {
        Self {
            domain: Domain::General,
            page_uri: None,
            page_name: None,
            component_type: "products".to_string(),
            product_names: Vec::new(),
            atdw_product_id: None,
            question_type: QuestionType::General,
            raw_question: raw_question.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_round_trips_through_serde() {
        let json = serde_json::to_string(&Domain::AtdwImport).unwrap();
        assert_eq!(json, "\"atdw_import\"");
        let back: Domain = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Domain::AtdwImport);
    }

    #[test]
    fn intent_wire_shape_is_camel_case() {
        let intent = ParsedIntent {
            domain: Domain::PageComponent,
            page_uri: Some("/stay".to_string()),
            page_name: None,
            component_type: "products".to_string(),
            product_names: vec!["Yarra Lodge".to_string()],
            atdw_product_id: None,
            question_type: QuestionType::WhyExcluded,
            raw_question: "Why isn't 'Yarra Lodge' on /stay?".to_string(),
        };
        let value = serde_json::to_value(&intent).unwrap();
        assert_eq!(value["pageUri"], "/stay");
        assert_eq!(value["questionType"], "why_excluded");
        assert_eq!(value["productNames"][0], "Yarra Lodge");
        assert!(value.get("pageName").is_none());
    }
}
