//! Best-effort extraction of references from web-resource dependency XML.
//!
//! Same posture as the script scanner: textual attribute matching, no
//! XML parser. The caller treats a failure here as a counted fault for
//! that resource, never a run abort.

use crate::core::{DictError, Result};
use regex::Regex;

lazy_static::lazy_static! {
    static ref ENTITY_REF: Regex = Regex::new(r#"entityName\s*=\s*"([^"]+)""#).unwrap();
    static ref ATTRIBUTE_REF: Regex = Regex::new(r#"attributeName\s*=\s*"([^"]+)""#).unwrap();
}

/// Entity and attribute names referenced by the dependency XML, distinct,
/// in document order. Empty input yields an empty list; non-XML input is
/// an error.
pub fn extract_references(xml: &str) -> Result<Vec<String>> {
    let trimmed = xml.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if !trimmed.starts_with('<') {
        return Err(DictError::Store(
            "dependency payload is not XML".to_string(),
        ));
    }

    let mut references: Vec<String> = Vec::new();
    for regex in [&*ENTITY_REF, &*ATTRIBUTE_REF] {
        for caps in regex.captures_iter(trimmed) {
            if let Some(name) = caps.get(1) {
                let name = name.as_str().to_string();
                if !references.contains(&name) {
                    references.push(name);
                }
            }
        }
    }
    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_entity_and_attribute_names() {
        let xml = r#"<Dependencies>
            <Dependency componentType="Entity">
                <Library entityName="account" />
                <Library attributeName="telephone1" />
                <Library attributeName="telephone1" />
            </Dependency>
        </Dependencies>"#;

        let refs = extract_references(xml).unwrap();
        assert_eq!(refs, vec!["account", "telephone1"]);
    }

    #[test]
    fn test_empty_xml_is_fine() {
        assert!(extract_references("").unwrap().is_empty());
        assert!(extract_references("  \n ").unwrap().is_empty());
    }

    #[test]
    fn test_non_xml_payload_is_an_error() {
        assert!(extract_references("definitely not xml").is_err());
    }

    #[test]
    fn test_xml_without_references_yields_nothing() {
        let refs = extract_references("<Dependencies/>").unwrap();
        assert!(refs.is_empty());
    }
}
