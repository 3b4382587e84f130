// catalog.rs — Requirement lookup against an external control catalog.
//
// A catalog is optional input. When present, requirement ids resolve to
// the control that owns them, the requirement's descriptive text, and
// the control family — feeding tenet titles and the policy's control
// reference list.

use crate::policy::ControlRef;
use crate::source::{Catalog, CatalogControl, Family, Requirement};

/// The result of resolving one requirement id. Borrows from the
/// catalog; never persisted directly.
#[derive(Debug, Clone)]
pub struct CatalogEnrichment<'a> {
    pub control: &'a CatalogControl,
    pub requirement: &'a Requirement,
    pub family: Option<&'a Family>,
}

/// Find a requirement in the catalog by id. Returns the owning
/// control, the requirement, and the control family when declared.
pub fn lookup_requirement<'a>(
    catalog: &'a Catalog,
    requirement_id: &str,
) -> Option<CatalogEnrichment<'a>> {
    if requirement_id.is_empty() {
        return None;
    }

    for control in &catalog.controls {
        for requirement in &control.requirements {
            if requirement.id == requirement_id {
                let family = catalog.families.iter().find(|f| f.id == control.family);
                return Some(CatalogEnrichment {
                    control,
                    requirement,
                    family,
                });
            }
        }
    }
    None
}

impl CatalogEnrichment<'_> {
    /// The most specific descriptive text available: the requirement
    /// text, falling back to the control title.
    pub fn title(&self) -> Option<&str> {
        if !self.requirement.text.is_empty() {
            return Some(&self.requirement.text);
        }
        if !self.control.title.is_empty() {
            return Some(&self.control.title);
        }
        None
    }

    /// A control reference for the policy metadata, with the family
    /// title as framework and the family id as class.
    pub fn control_ref(&self) -> ControlRef {
        ControlRef {
            id: self.control.id.clone(),
            title: self.control.title.clone(),
            framework: self.family.map(|f| f.title.clone()),
            class: self.family.map(|f| f.id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> Catalog {
        Catalog {
            id: "catalog-001".to_string(),
            description: "Test catalog".to_string(),
            families: vec![Family {
                id: "CF-01".to_string(),
                title: "Build Integrity".to_string(),
                description: String::new(),
            }],
            controls: vec![CatalogControl {
                id: "CTRL-01".to_string(),
                title: "Provenance Control".to_string(),
                family: "CF-01".to_string(),
                requirements: vec![Requirement {
                    id: "REQ-01".to_string(),
                    text: "Verify build provenance is present and valid".to_string(),
                }],
            }],
        }
    }

    #[test]
    fn resolves_requirement_with_family() {
        let catalog = test_catalog();
        let enrichment = lookup_requirement(&catalog, "REQ-01").unwrap();
        assert_eq!(enrichment.control.id, "CTRL-01");
        assert_eq!(enrichment.family.unwrap().id, "CF-01");
        assert_eq!(
            enrichment.title(),
            Some("Verify build provenance is present and valid")
        );
    }

    #[test]
    fn unknown_requirement_resolves_to_none() {
        let catalog = test_catalog();
        assert!(lookup_requirement(&catalog, "REQ-99").is_none());
        assert!(lookup_requirement(&catalog, "").is_none());
    }

    #[test]
    fn control_ref_carries_family_as_framework_and_class() {
        let catalog = test_catalog();
        let control = lookup_requirement(&catalog, "REQ-01").unwrap().control_ref();
        assert_eq!(control.id, "CTRL-01");
        assert_eq!(control.title, "Provenance Control");
        assert_eq!(control.framework.as_deref(), Some("Build Integrity"));
        assert_eq!(control.class.as_deref(), Some("CF-01"));
    }

    #[test]
    fn missing_requirement_text_falls_back_to_control_title() {
        let mut catalog = test_catalog();
        catalog.controls[0].requirements[0].text = String::new();
        let enrichment = lookup_requirement(&catalog, "REQ-01").unwrap();
        assert_eq!(enrichment.title(), Some("Provenance Control"));
    }

    #[test]
    fn undeclared_family_leaves_framework_unset() {
        let mut catalog = test_catalog();
        catalog.controls[0].family = "CF-99".to_string();
        let control = lookup_requirement(&catalog, "REQ-01").unwrap().control_ref();
        assert!(control.framework.is_none());
        assert!(control.class.is_none());
    }
}
