//! Scenario scripts against a live FHIR server
//!
//! Each scenario issues its requests sequentially and records every check in
//! a [`TestResults`]. A transport failure aborts the scenario with an error;
//! unexpected statuses and payloads are recorded failures.

mod organization;
mod patient;
mod practitioner;

use crate::assertions::{
    assert_no_resources, assert_resource_exists, assert_status_code, assert_status_in,
    count_entries, resource_id,
};
use crate::client::{FhirClient, FhirResponse, RequestOptions};
use crate::config::Config;
use crate::error::Result;
use crate::results::TestResults;
use colored::Colorize;
use serde_json::Value;
use std::fmt;
use tracing::info;

/// A runnable group of checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    Organization,
    Practitioner,
    Patient,
}

impl Scenario {
    /// Canonical run order.
    pub const ALL: [Scenario; 3] = [
        Scenario::Organization,
        Scenario::Practitioner,
        Scenario::Patient,
    ];

    /// Names accepted on the command line, `all` included.
    pub const CHOICES: [&'static str; 7] = [
        "organization",
        "org",
        "practitioner",
        "pract",
        "patient",
        "pat",
        "all",
    ];

    /// Full name or short alias, case-insensitive.
    pub fn from_alias(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "organization" | "org" => Some(Scenario::Organization),
            "practitioner" | "pract" => Some(Scenario::Practitioner),
            "patient" | "pat" => Some(Scenario::Patient),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Organization => "organization",
            Scenario::Practitioner => "practitioner",
            Scenario::Patient => "patient",
        }
    }

    /// Human label of the resources covered.
    pub fn title(&self) -> &'static str {
        match self {
            Scenario::Organization => "Organization",
            Scenario::Practitioner => "Practitioner/PractitionerRole",
            Scenario::Patient => "Patient",
        }
    }

    pub async fn run(self, client: &FhirClient, config: &Config) -> Result<TestResults> {
        info!(scenario = self.name(), base_url = client.base_url(), "Running scenario");
        let ctx = ScenarioContext::new(client, config);
        match self {
            Scenario::Organization => organization::run(ctx).await,
            Scenario::Practitioner => practitioner::run(ctx).await,
            Scenario::Patient => patient::run(ctx).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve command-line names: nothing or `all` selects every scenario,
/// otherwise aliases are mapped and duplicates dropped, keeping first
/// occurrence order. Unknown names are ignored.
pub fn normalize<S: AsRef<str>>(selected: &[S]) -> Vec<Scenario> {
    if selected.is_empty()
        || selected
            .iter()
            .any(|s| s.as_ref().eq_ignore_ascii_case("all"))
    {
        return Scenario::ALL.to_vec();
    }

    let mut scenarios = Vec::new();
    for scenario in selected.iter().filter_map(|s| Scenario::from_alias(s.as_ref())) {
        if !scenarios.contains(&scenario) {
            scenarios.push(scenario);
        }
    }
    scenarios
}

/// Shared state of one scenario run.
pub(crate) struct ScenarioContext<'a> {
    client: &'a FhirClient,
    config: &'a Config,
    results: TestResults,
    /// `(resourceType, id)` of everything this run created.
    created: Vec<(String, String)>,
}

impl<'a> ScenarioContext<'a> {
    fn new(client: &'a FhirClient, config: &'a Config) -> Self {
        Self {
            client,
            config,
            results: TestResults::new(),
            created: Vec::new(),
        }
    }

    fn prefixed(&self, value: &str) -> String {
        self.config.prefixed(value)
    }

    fn heading(&self, title: &str) {
        println!("\n{}\n", format!("=== {title} ===").bold());
    }

    fn section(&self, title: &str) {
        println!("\n{}", title.bold());
    }

    async fn get(&self, endpoint: &str, options: RequestOptions) -> Result<FhirResponse> {
        self.client.get(endpoint, options).await
    }

    async fn search(&self, resource_type: &str, params: &[(&str, &str)]) -> Result<FhirResponse> {
        self.client.search(resource_type, params).await
    }

    async fn wait_for_indexing(&self) {
        let delay = self.config.indexing_delay();
        println!(
            "{}",
            format!(
                "Waiting {} seconds for server indexing...",
                delay.as_secs()
            )
            .blue()
        );
        tokio::time::sleep(delay).await;
    }

    /// POST `resource`; on 201 the new resource is tracked for cleanup and
    /// returned.
    async fn create_tracked(
        &mut self,
        resource_type: &str,
        resource: &Value,
        check: &str,
        failure_check: &str,
    ) -> Result<Option<Value>> {
        let response = self.client.create(resource_type, resource).await?;
        if !response.is(201) {
            self.fail_status(failure_check, &response);
            return Ok(None);
        }
        let Some(created) = response.into_json() else {
            self.results.add_fail(check, "Created resource has no JSON body");
            return Ok(None);
        };
        let Some(id) = resource_id(&created).map(str::to_string) else {
            self.results.add_fail(check, "Created resource has no id");
            return Ok(None);
        };
        self.created.push((resource_type.to_string(), id));
        self.results.add_pass(check);
        Ok(Some(created))
    }

    fn pass(&mut self, check: &str) {
        self.results.add_pass(check);
    }

    fn fail(&mut self, check: &str, reason: impl Into<String>) {
        self.results.add_fail(check, reason);
    }

    fn skip(&mut self, check: &str, reason: &str) {
        self.results.add_skip(check, reason);
    }

    fn fail_status(&mut self, check: &str, response: &FhirResponse) {
        self.results
            .add_fail(check, format!("Status {}", response.status_code()));
    }

    fn expect_status(&mut self, response: &FhirResponse, expected: u16, check: &str) -> bool {
        assert_status_code(response, expected, check, &mut self.results)
    }

    /// 200 with at least one match passes, 200 without matches is a skip.
    fn expect_found(
        &mut self,
        response: &FhirResponse,
        resource_type: &str,
        check: &str,
        found_label: &str,
        skip_reason: &str,
    ) {
        if !response.is(200) {
            self.fail_status(check, response);
            return;
        }
        let found = count_entries(response, resource_type);
        if found > 0 {
            println!("  {}", format!("→ Found {found} {found_label}").cyan());
            self.results.add_pass(check);
        } else {
            self.results.add_skip(check, skip_reason);
        }
    }

    /// 200 with at least one match passes; anything else fails.
    fn expect_exists(
        &mut self,
        response: &FhirResponse,
        resource_type: &str,
        check: &str,
        failure_check: &str,
    ) {
        match response.json().filter(|_| response.is(200)) {
            Some(bundle) => {
                assert_resource_exists(bundle, resource_type, check, &mut self.results);
            }
            None => self.fail_status(failure_check, response),
        }
    }

    /// 200 with no matches passes; anything else fails.
    fn expect_none(
        &mut self,
        response: &FhirResponse,
        resource_type: &str,
        check: &str,
        failure_check: &str,
    ) {
        match response.json().filter(|_| response.is(200)) {
            Some(bundle) => {
                assert_no_resources(bundle, resource_type, check, &mut self.results);
            }
            None => self.fail_status(failure_check, response),
        }
    }

    /// Reading an unknown id must answer 400 (bad id format) or 404.
    async fn expect_unknown_read(
        &mut self,
        endpoint: &str,
        check: &str,
        failure_check: &str,
    ) -> Result<()> {
        let response = self.get(endpoint, RequestOptions::new()).await?;
        if response.is(400) || response.is(404) {
            self.results.add_pass(check);
        } else {
            assert_status_in(&response, &[400, 404], failure_check, &mut self.results);
        }
        Ok(())
    }

    /// A PUT without `If-Match` must be rejected with 412. Nothing is
    /// recorded when the resource cannot be read back or edited.
    async fn expect_update_requires_if_match(
        &mut self,
        resource_type: &str,
        id: &str,
        check: &str,
        mutate: impl FnOnce(&mut Value) -> bool,
    ) -> Result<()> {
        let response = self.client.read(resource_type, id).await?;
        let Some(mut resource) = response.json().filter(|_| response.is(200)).cloned() else {
            return Ok(());
        };
        if !mutate(&mut resource) {
            return Ok(());
        }
        let response = self.client.update(resource_type, id, &resource, None).await?;
        if response.is(412) {
            self.results.add_pass(check);
        } else {
            self.results.add_fail(
                "Update without If-Match",
                format!("Expected 412, got {}", response.status_code()),
            );
        }
        Ok(())
    }

    /// Delete tracked resources when cleanup is enabled, then hand back the
    /// results.
    async fn finish(mut self, reverse: bool) -> Result<TestResults> {
        if self.config.cleanup_after_tests {
            self.section("Cleanup");
            let mut created = std::mem::take(&mut self.created);
            if reverse {
                created.reverse();
            }
            for (resource_type, id) in created {
                let response = self.client.delete(&resource_type, &id).await?;
                let check = format!("Delete {resource_type}/{id}");
                if response.is(200) {
                    self.results.add_pass(&check);
                } else {
                    self.fail_status(&check, &response);
                }
            }
        }
        Ok(self.results)
    }
}

/// Replace the value at a JSON pointer. False when the pointer does not
/// resolve, so edits of a server copy never panic on an unexpected shape.
fn set_at(resource: &mut Value, pointer: &str, value: Value) -> bool {
    match resource.pointer_mut(pointer) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Insert or replace a top-level member; false for non-objects.
fn set_member(resource: &mut Value, key: &str, value: Value) -> bool {
    match resource.as_object_mut() {
        Some(object) => {
            object.insert(key.to_string(), value);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults_to_all() {
        let none: [&str; 0] = [];
        assert_eq!(normalize(&none), Scenario::ALL.to_vec());
        assert_eq!(normalize(&["patient", "all"]), Scenario::ALL.to_vec());
    }

    #[test]
    fn test_normalize_maps_aliases_and_dedups() {
        assert_eq!(
            normalize(&["pat", "org", "patient", "ORG"]),
            vec![Scenario::Patient, Scenario::Organization]
        );
        assert_eq!(normalize(&["pract"]), vec![Scenario::Practitioner]);
    }

    #[test]
    fn test_normalize_ignores_unknown() {
        assert!(normalize(&["observation"]).is_empty());
    }

    #[test]
    fn test_every_choice_is_known() {
        for choice in Scenario::CHOICES {
            assert!(choice == "all" || Scenario::from_alias(choice).is_some());
        }
    }

    #[test]
    fn test_titles() {
        assert_eq!(Scenario::Practitioner.title(), "Practitioner/PractitionerRole");
        assert_eq!(Scenario::Organization.to_string(), "organization");
    }

    #[test]
    fn test_set_at_edits_in_place() {
        let mut patient = serde_json::json!({"name": [{"given": ["Alisher"]}]});
        assert!(set_at(&mut patient, "/name/0/given", serde_json::json!(["UpdatedName"])));
        assert_eq!(patient["name"][0]["given"][0], "UpdatedName");
        assert!(!set_at(&mut patient, "/name/3/given", serde_json::json!([])));
    }

    #[test]
    fn test_set_member() {
        let mut org = serde_json::json!({"resourceType": "Organization"});
        assert!(set_member(&mut org, "active", serde_json::json!(false)));
        assert_eq!(org["active"], false);
        assert!(!set_member(&mut serde_json::json!([]), "active", serde_json::json!(true)));
    }
}
