//! Recorded assertions over responses and Bundles
//!
//! Every `assert_*` function records its outcome in [`TestResults`] and returns
//! whether it passed; none of them panic. Scenario code branches on the
//! returned bool the same way it would on a status check.

use crate::client::FhirResponse;
use crate::results::TestResults;
use colored::Colorize;
use ferrum_inspect::resolve;
use serde_json::Value;

/// Resources of `resource_type` in a Bundle. Anything that is not a Bundle
/// yields nothing.
pub fn extract_entries<'a>(bundle: &'a Value, resource_type: &str) -> Vec<&'a Value> {
    if bundle.get("resourceType").and_then(Value::as_str) != Some("Bundle") {
        return Vec::new();
    }
    bundle
        .get("entry")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("resource"))
                .filter(|resource| {
                    resource.get("resourceType").and_then(Value::as_str) == Some(resource_type)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Number of `resource_type` resources in a response body (0 without a body).
pub fn count_entries(response: &FhirResponse, resource_type: &str) -> usize {
    response
        .json()
        .map(|bundle| extract_entries(bundle, resource_type).len())
        .unwrap_or(0)
}

/// Value at a dotted/indexed path, e.g. `name[0].given[0]`.
pub fn get_field_value<'a>(
    resource: &'a Value,
    field_path: &str,
) -> ferrum_inspect::Result<&'a Value> {
    resolve(resource, field_path)
}

/// `meta.versionId` of a resource.
pub fn version_id(resource: &Value) -> Option<&str> {
    resolve(resource, "meta.versionId").ok().and_then(Value::as_str)
}

/// Logical id of a resource.
pub fn resource_id(resource: &Value) -> Option<&str> {
    resource.get("id").and_then(Value::as_str)
}

pub fn assert_status_code(
    response: &FhirResponse,
    expected: u16,
    name: &str,
    results: &mut TestResults,
) -> bool {
    assert_status_in(response, &[expected], name, results)
}

/// Pass when the status is any of `accepted`.
pub fn assert_status_in(
    response: &FhirResponse,
    accepted: &[u16],
    name: &str,
    results: &mut TestResults,
) -> bool {
    let actual = response.status_code();
    if accepted.contains(&actual) {
        results.add_pass(name);
        return true;
    }
    let expected = accepted
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(" or ");
    results.add_fail(name, format!("Expected status {expected}, got {actual}"));
    false
}

/// Pass when the Bundle holds at least one `resource_type` resource.
pub fn assert_resource_exists(
    bundle: &Value,
    resource_type: &str,
    name: &str,
    results: &mut TestResults,
) -> bool {
    let found = extract_entries(bundle, resource_type).len();
    if found > 0 {
        println!(
            "  {}",
            format!("→ Found {found} {resource_type} resource(s)").cyan()
        );
        results.add_pass(name);
        true
    } else {
        println!(
            "  {}",
            format!("→ No {resource_type} resources found in bundle").red()
        );
        results.add_fail(name, format!("No {resource_type} resources found in bundle"));
        false
    }
}

/// Pass when the Bundle holds no `resource_type` resources.
pub fn assert_no_resources(
    bundle: &Value,
    resource_type: &str,
    name: &str,
    results: &mut TestResults,
) -> bool {
    let found = extract_entries(bundle, resource_type).len();
    if found == 0 {
        results.add_pass(name);
        true
    } else {
        results.add_fail(
            name,
            format!("Found {found} {resource_type} resources, expected 0"),
        );
        false
    }
}

/// Pass when the value at `field_path` equals `expected`. A path that does
/// not resolve is a recorded failure.
pub fn assert_field_equals(
    resource: &Value,
    field_path: &str,
    expected: &Value,
    name: &str,
    results: &mut TestResults,
) -> bool {
    match resolve(resource, field_path) {
        Ok(value) if value == expected => {
            println!(
                "  {} {}",
                format!("→ {field_path} =").cyan(),
                value.to_string().green()
            );
            results.add_pass(name);
            true
        }
        Ok(value) => {
            println!(
                "  {}",
                format!("→ {field_path}: expected {expected}, got {value}").red()
            );
            results.add_fail(
                name,
                format!("Expected {field_path}={expected}, got {value}"),
            );
            false
        }
        Err(e) => {
            println!("  {}", format!("→ Field {field_path} not found: {e}").red());
            results.add_fail(name, format!("Field {field_path} not found: {e}"));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn bundle() -> Value {
        json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "entry": [
                { "resource": { "resourceType": "Organization", "id": "o1" } },
                { "resource": { "resourceType": "Organization", "id": "o2" } },
                { "resource": { "resourceType": "OperationOutcome" } },
                { "fullUrl": "no-resource" }
            ]
        })
    }

    #[test]
    fn test_extract_entries_filters_by_type() {
        let bundle = bundle();
        let orgs = extract_entries(&bundle, "Organization");
        assert_eq!(orgs.len(), 2);
        assert_eq!(resource_id(orgs[1]), Some("o2"));
        assert!(extract_entries(&bundle, "Patient").is_empty());
    }

    #[test]
    fn test_extract_entries_ignores_non_bundles() {
        let not_bundle = json!({"resourceType": "Patient", "entry": [{"resource": {"resourceType": "Patient"}}]});
        assert!(extract_entries(&not_bundle, "Patient").is_empty());
        assert!(extract_entries(&json!({"resourceType": "Bundle"}), "Patient").is_empty());
    }

    #[test]
    fn test_count_entries_from_response() {
        let response = FhirResponse::new(StatusCode::OK, bundle().to_string());
        assert_eq!(count_entries(&response, "Organization"), 2);
        let empty = FhirResponse::new(StatusCode::OK, String::new());
        assert_eq!(count_entries(&empty, "Organization"), 0);
    }

    #[test]
    fn test_status_assertions() {
        let mut results = TestResults::new();
        let not_found = FhirResponse::new(StatusCode::NOT_FOUND, String::new());

        assert!(assert_status_in(&not_found, &[400, 404], "read missing", &mut results));
        assert!(!assert_status_code(&not_found, 200, "read", &mut results));
        assert_eq!(results.passed, 1);
        assert_eq!(results.failures[0].1, "Expected status 200, got 404");
    }

    #[test]
    fn test_bundle_assertions() {
        let mut results = TestResults::new();
        let bundle = bundle();
        assert!(assert_resource_exists(&bundle, "Organization", "exists", &mut results));
        assert!(!assert_resource_exists(&bundle, "Patient", "missing", &mut results));
        assert!(assert_no_resources(&bundle, "Patient", "none", &mut results));
        assert!(!assert_no_resources(&bundle, "Organization", "some", &mut results));
        assert_eq!(results.passed, 2);
        assert_eq!(results.failed, 2);
        assert_eq!(
            results.failures[1].1,
            "Found 2 Organization resources, expected 0"
        );
    }

    #[test]
    fn test_field_assertions_record_missing_paths() {
        let mut results = TestResults::new();
        let patient = json!({
            "resourceType": "Patient",
            "name": [{"given": ["UpdatedName"]}],
            "meta": {"versionId": "2"}
        });

        assert!(assert_field_equals(
            &patient,
            "name[0].given[0]",
            &json!("UpdatedName"),
            "given updated",
            &mut results
        ));
        assert!(!assert_field_equals(
            &patient,
            "name[0].given[0]",
            &json!("Alisher"),
            "given unchanged",
            &mut results
        ));
        assert!(!assert_field_equals(
            &patient,
            "name[1].given[0]",
            &json!("Alisher"),
            "second name",
            &mut results
        ));

        assert_eq!(results.passed, 1);
        assert_eq!(results.failed, 2);
        assert!(results.failures[1].1.starts_with("Field name[1].given[0] not found"));
    }

    #[test]
    fn test_version_and_field_helpers() {
        let patient = json!({"meta": {"versionId": "7"}, "gender": "male"});
        assert_eq!(version_id(&patient), Some("7"));
        assert_eq!(version_id(&json!({})), None);
        assert_eq!(
            get_field_value(&patient, "gender").unwrap(),
            &json!("male")
        );
    }
}
