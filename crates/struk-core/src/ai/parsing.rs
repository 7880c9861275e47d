//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap their JSON in prose or code fences. The payload is taken
//! to be everything between the first `{` and the last `}`.

use serde::Deserialize;

use crate::error::{Error, Result};

use super::types::{ExtractionResult, ItemCategory, ParsedReceipt};

/// Locate the JSON object inside a model response
pub fn extract_json_object(response: &str) -> Result<&str> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::MalformedModelOutput(format!(
            "No JSON found in model response | Raw: {}",
            truncate(response)
        ))),
    }
}

/// Parse the image analysis response into a receipt or a description
pub fn parse_extraction(response: &str) -> Result<ExtractionResult> {
    let json_str = extract_json_object(response)?;
    let value: serde_json::Value = serde_json::from_str(json_str).map_err(|e| {
        Error::MalformedModelOutput(format!(
            "Invalid JSON from model: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;

    let is_receipt = value
        .get("is_receipt")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| {
            Error::MalformedModelOutput("Model response is missing is_receipt".into())
        })?;

    if !is_receipt {
        let description = value
            .get("description")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        return Ok(ExtractionResult::NonReceipt(description));
    }

    let receipt: ParsedReceipt = serde_json::from_value(value)
        .map_err(|e| Error::MalformedModelOutput(format!("Invalid receipt JSON: {}", e)))?;
    Ok(ExtractionResult::Receipt(receipt))
}

/// Parse the categorization response
pub fn parse_categories(response: &str) -> Result<Vec<ItemCategory>> {
    #[derive(Deserialize)]
    struct CategoriesResponse {
        #[serde(default)]
        categories: Vec<ItemCategory>,
    }

    let json_str = extract_json_object(response)?;
    let parsed: CategoriesResponse = serde_json::from_str(json_str)
        .map_err(|e| Error::MalformedModelOutput(format!("Invalid categories JSON: {}", e)))?;
    Ok(parsed.categories)
}

fn truncate(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extraction_receipt_in_code_fence() {
        let response = r#"Here you go:
```json
{"is_receipt": true, "store_name": "Indomaret", "date": "2024-03-01", "time": "10:15",
 "items": [{"name": "Aqua 600ml", "quantity": 2, "price": 3500, "total": 7000}],
 "subtotal": 7000, "tax": 0, "total": 7000}
```"#;
        match parse_extraction(response).unwrap() {
            ExtractionResult::Receipt(r) => {
                assert_eq!(r.store_name.as_deref(), Some("Indomaret"));
                assert_eq!(r.items.len(), 1);
                assert_eq!(r.items[0].quantity, Some(2.0));
                assert_eq!(r.total, Some(7000.0));
            }
            other => panic!("expected receipt, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_extraction_non_receipt() {
        let response = r#"{"is_receipt": false, "description": "a sunset photo"}"#;
        assert_eq!(
            parse_extraction(response).unwrap(),
            ExtractionResult::NonReceipt("a sunset photo".into())
        );
    }

    #[test]
    fn test_parse_extraction_without_json_is_malformed() {
        let err = parse_extraction("I cannot read this image, sorry.").unwrap_err();
        assert!(matches!(err, Error::MalformedModelOutput(_)));

        let err = parse_extraction("} backwards {").unwrap_err();
        assert!(matches!(err, Error::MalformedModelOutput(_)));
    }

    #[test]
    fn test_parse_extraction_missing_discriminator_is_malformed() {
        let err = parse_extraction(r#"{"store_name": "Alfamart"}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedModelOutput(_)));
    }

    #[test]
    fn test_parse_extraction_accepts_string_amounts() {
        let response = r#"{"is_receipt": true, "items": [{"name": "Kopi", "price": "18000", "total": "18000"}],
            "total": "18000", "tax": null, "subtotal": "n/a"}"#;
        let ExtractionResult::Receipt(r) = parse_extraction(response).unwrap() else {
            panic!("expected receipt");
        };
        assert_eq!(r.total, Some(18000.0));
        assert_eq!(r.tax, None);
        assert_eq!(r.subtotal, None);
        assert_eq!(r.items[0].quantity, None);
    }

    #[test]
    fn test_parse_categories() {
        let response = r#"Sure! {"categories": [
            {"category": "Makanan", "items": ["Roti Tawar"], "total": 15000},
            {"category": "Minuman", "items": ["Aqua 600ml", "Teh Botol"]}
        ]}"#;
        let cats = parse_categories(response).unwrap();
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].category, "Makanan");
        assert_eq!(cats[1].items.len(), 2);
        assert_eq!(cats[1].total, None);
    }

    #[test]
    fn test_parse_categories_no_json() {
        assert!(matches!(
            parse_categories("nope"),
            Err(Error::MalformedModelOutput(_))
        ));
    }
}
