// scope.rs — Compiles applies-to dimensions into subject filters.
//
// Each non-empty dimension becomes a `<field> in [<values>]` clause
// against the evaluation subject; clauses are joined with `&&`. Values
// are normalized per dimension so authored names ("Cloud Computing",
// "United States") match the machine form downstream subjects carry.

use crate::source::Scope;

const FIELD_TECHNOLOGY: &str = "subject.type";
const FIELD_REGION: &str = "subject.annotations.region";
const FIELD_SENSITIVITY: &str = "subject.annotations.classification";
const FIELD_GROUP: &str = "subject.annotations.group";

/// Region name → code table. Names not listed fall back to lowercase.
const REGION_CODES: &[(&str, &str)] = &[
    ("united states", "us"),
    ("european union", "eu"),
    ("canada", "ca"),
    ("united kingdom", "uk"),
    ("california", "us-ca"),
];

/// Compile scope dimensions into a boolean filter expression.
/// Returns an empty string when no dimension produces a clause.
pub fn scope_filter(scope: &Scope) -> String {
    let mut clauses = Vec::new();

    if !scope.technologies.is_empty() {
        let values: Vec<String> = scope
            .technologies
            .iter()
            .map(|t| quote(&t.to_lowercase().replace(' ', "-")))
            .collect();
        clauses.push(in_clause(FIELD_TECHNOLOGY, &values));
    }

    if !scope.regions.is_empty() {
        let values: Vec<String> = scope
            .regions
            .iter()
            .map(|r| quote(&normalize_region(r)))
            .collect();
        clauses.push(in_clause(FIELD_REGION, &values));
    }

    if !scope.sensitivity.is_empty() {
        let values: Vec<String> = scope
            .sensitivity
            .iter()
            .map(|s| quote(&s.to_lowercase()))
            .collect();
        clauses.push(in_clause(FIELD_SENSITIVITY, &values));
    }

    if !scope.groups.is_empty() {
        let values: Vec<String> = scope.groups.iter().map(|g| quote(g)).collect();
        clauses.push(in_clause(FIELD_GROUP, &values));
    }

    clauses.join(" && ")
}

/// Combine expressions with a logical operator, parenthesizing each
/// operand for `&&` and `||`.
pub fn combine_expressions(expressions: &[String], operator: &str) -> String {
    match expressions {
        [] => String::new(),
        [single] => single.clone(),
        many => {
            if operator == "&&" || operator == "||" {
                many.iter()
                    .map(|e| format!("({e})"))
                    .collect::<Vec<_>>()
                    .join(&format!(" {operator} "))
            } else {
                many.join(&format!(" {operator} "))
            }
        }
    }
}

fn normalize_region(region: &str) -> String {
    let lower = region.to_lowercase();
    REGION_CODES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, code)| code.to_string())
        .unwrap_or(lower)
}

fn in_clause(field: &str, quoted_values: &[String]) -> String {
    format!("{field} in [{}]", quoted_values.join(", "))
}

fn quote(value: &str) -> String {
    format!("\"{value}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_dimensions_produce_clauses() {
        let scope = Scope {
            technologies: vec!["Cloud Computing".to_string(), "Web Applications".to_string()],
            regions: vec!["United States".to_string(), "European Union".to_string()],
            sensitivity: vec!["Confidential".to_string(), "Secret".to_string()],
            groups: vec!["PlatformTeam".to_string()],
        };
        let filter = scope_filter(&scope);

        assert!(filter.contains(r#"subject.type in ["cloud-computing", "web-applications"]"#));
        assert!(filter.contains(r#"subject.annotations.region in ["us", "eu"]"#));
        assert!(filter.contains(r#"subject.annotations.classification in ["confidential", "secret"]"#));
        // Group values pass through unmodified.
        assert!(filter.contains(r#"subject.annotations.group in ["PlatformTeam"]"#));
        assert_eq!(filter.matches(" && ").count(), 3);
    }

    #[test]
    fn empty_scope_yields_empty_string() {
        assert_eq!(scope_filter(&Scope::default()), "");
    }

    #[test]
    fn unknown_region_falls_back_to_lowercase() {
        let scope = Scope {
            regions: vec!["Atlantis".to_string()],
            ..Default::default()
        };
        assert_eq!(
            scope_filter(&scope),
            r#"subject.annotations.region in ["atlantis"]"#
        );
    }

    #[test]
    fn single_dimension_has_no_conjunction() {
        let scope = Scope {
            sensitivity: vec!["Internal".to_string()],
            ..Default::default()
        };
        let filter = scope_filter(&scope);
        assert!(!filter.contains("&&"));
        assert_eq!(filter, r#"subject.annotations.classification in ["internal"]"#);
    }

    #[test]
    fn combine_wraps_boolean_operands() {
        let exprs = vec!["a == 1".to_string(), "b == 2".to_string()];
        assert_eq!(combine_expressions(&exprs, "&&"), "(a == 1) && (b == 2)");
        assert_eq!(combine_expressions(&exprs[..1], "&&"), "a == 1");
        assert_eq!(combine_expressions(&[], "&&"), "");
    }
}
