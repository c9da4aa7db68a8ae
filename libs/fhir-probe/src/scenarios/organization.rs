//! Organization search, CRUD and negative checks

use super::{set_member, ScenarioContext};
use crate::assertions::{count_entries, extract_entries, resource_id, version_id};
use crate::client::RequestOptions;
use crate::error::Result;
use crate::fixtures::{self, constants::SOLIQ_SYSTEM};
use crate::results::TestResults;
use reqwest::Method;
use serde_json::Value;

const RESOURCE: &str = "Organization";

pub(super) async fn run(mut ctx: ScenarioContext<'_>) -> Result<TestResults> {
    ctx.heading("Organization Tests");

    search_setup(&mut ctx).await?;
    search_checks(&mut ctx).await?;
    crud_checks(&mut ctx).await?;
    negative_checks(&mut ctx).await?;

    ctx.finish(false).await
}

async fn search_setup(ctx: &mut ScenarioContext<'_>) -> Result<()> {
    ctx.section("Search Tests Setup");
    let org = fixtures::organization(
        &ctx.prefixed("fergana-test-999"),
        &ctx.prefixed("Fergana Regional Hospital"),
    );
    let created = ctx
        .create_tracked(
            RESOURCE,
            &org,
            "Create test organization for name search",
            "Create test organization",
        )
        .await?;
    if created.is_some() {
        ctx.wait_for_indexing().await;
    }
    Ok(())
}

async fn search_checks(ctx: &mut ScenarioContext<'_>) -> Result<()> {
    ctx.section("Search Tests");

    let token = fixtures::identifier_token(SOLIQ_SYSTEM, "123456789");
    let response = ctx.search(RESOURCE, &[("identifier", token.as_str())]).await?;
    ctx.expect_found(
        &response,
        RESOURCE,
        "Search organization by soliq ID",
        "organization(s)",
        "No org with test ID found",
    );

    let response = ctx.search(RESOURCE, &[("name:contains", "Fergana")]).await?;
    if response.is(200) {
        if count_entries(&response, RESOURCE) > 0 {
            ctx.pass("Search organization by name:contains (substring)");
        } else {
            ctx.skip(
                "Search organization by name:contains",
                "No results (server indexing delay or search limitation)",
            );
        }
    } else {
        ctx.fail_status("Search organization by name:contains", &response);
    }

    let response = ctx.search(RESOURCE, &[("name:exact", "Toshkent")]).await?;
    ctx.expect_status(&response, 200, "Search organization by exact name");

    let response = ctx.search(RESOURCE, &[("type", "prov")]).await?;
    ctx.expect_exists(
        &response,
        RESOURCE,
        "Search organization by type (prov)",
        "Search organization by type",
    );

    let response = ctx.search(RESOURCE, &[("active", "true")]).await?;
    ctx.expect_exists(
        &response,
        RESOURCE,
        "Search active organizations",
        "Search active organizations",
    );

    let response = ctx
        .search(RESOURCE, &[("name:contains", "Hospital"), ("active", "true")])
        .await?;
    ctx.expect_status(&response, 200, "Search with combined parameters (AND)");

    let response = ctx.search(RESOURCE, &[("type", "prov,dept")]).await?;
    ctx.expect_exists(
        &response,
        RESOURCE,
        "Search with multiple values (OR)",
        "Search with multiple values",
    );

    let response = ctx
        .search(RESOURCE, &[("type", "prov"), ("_count", "1")])
        .await?;
    if !response.is(200) {
        ctx.fail_status("Search for departments", &response);
        return Ok(());
    }
    let parent_id = response
        .json()
        .and_then(|bundle| extract_entries(bundle, RESOURCE).first().copied())
        .and_then(resource_id)
        .map(str::to_string);
    match parent_id {
        Some(parent_id) => {
            let reference = format!("{RESOURCE}/{parent_id}");
            let response = ctx.search(RESOURCE, &[("partof", reference.as_str())]).await?;
            ctx.expect_status(&response, 200, "Search for departments (partof)");
        }
        None => ctx.skip("Search for departments", "No parent org found"),
    }
    Ok(())
}

async fn crud_checks(ctx: &mut ScenarioContext<'_>) -> Result<()> {
    ctx.section("CRUD Operations");

    let org = fixtures::organization(
        &ctx.prefixed("123456789"),
        &ctx.prefixed("Test Organization"),
    );
    let Some(created) = ctx
        .create_tracked(RESOURCE, &org, "Create organization", "Create organization")
        .await?
    else {
        return Ok(());
    };
    let Some(id) = resource_id(&created) else {
        return Ok(());
    };
    let endpoint = format!("{RESOURCE}/{id}");

    let response = ctx
        .get(
            &endpoint,
            RequestOptions::new().highlight(["name", "id", "active"]),
        )
        .await?;
    if !response.is(200) {
        ctx.fail_status("Read organization by ID", &response);
        return Ok(());
    }
    ctx.pass("Read organization by ID");

    let Some(mut org) = response.into_json() else {
        ctx.fail("Update organization", "Read returned no JSON body");
        return Ok(());
    };
    let Some(version) = version_id(&org).map(str::to_string) else {
        ctx.fail("Update organization", "Resource has no meta.versionId");
        return Ok(());
    };
    let updated_name = ctx.prefixed("Updated Test Organization");
    set_member(&mut org, "name", Value::from(updated_name.as_str()));

    let response = ctx
        .client
        .request(
            Method::PUT,
            &endpoint,
            RequestOptions::new()
                .body(org)
                .if_match(&version)
                .highlight(["name"]),
        )
        .await?;
    if !response.is(200) {
        ctx.fail_status("Update organization", &response);
        return Ok(());
    }
    ctx.pass("Update organization");

    let response = ctx.get(&endpoint, RequestOptions::new()).await?;
    if let Some(updated) = response.json().filter(|_| response.is(200)) {
        if updated.get("name").and_then(Value::as_str) == Some(updated_name.as_str()) {
            ctx.pass("Verify organization update");
        } else {
            ctx.fail("Verify organization update", "Name not updated");
        }
    }
    Ok(())
}

async fn negative_checks(ctx: &mut ScenarioContext<'_>) -> Result<()> {
    ctx.section("Negative Tests");

    ctx.expect_unknown_read(
        "Organization/nonexistent-id-12345",
        "Read non-existent organization (400 or 404)",
        "Read non-existent organization",
    )
    .await?;

    let response = ctx
        .search(RESOURCE, &[("name", "XYZ_NONEXISTENT_ORG_NAME_12345")])
        .await?;
    ctx.expect_none(
        &response,
        RESOURCE,
        "Search non-existent organization name",
        "Search non-existent organization",
    );

    if let Some((_, id)) = ctx.created.first().cloned() {
        ctx.expect_update_requires_if_match(
            RESOURCE,
            &id,
            "Update without If-Match header (correctly fails)",
            |org| set_member(org, "name", Value::from("Should fail without version")),
        )
        .await?;
    }
    Ok(())
}
