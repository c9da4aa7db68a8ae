//! Patient registration, search and duplicate-handling checks

use super::{set_at, set_member, ScenarioContext};
use crate::assertions::{assert_field_equals, count_entries, resource_id, version_id};
use crate::client::RequestOptions;
use crate::error::Result;
use crate::fixtures::{self, constants::PINFL_SYSTEM};
use crate::results::TestResults;
use reqwest::Method;
use serde_json::{json, Value};

const RESOURCE: &str = "Patient";

pub(super) async fn run(mut ctx: ScenarioContext<'_>) -> Result<TestResults> {
    ctx.heading("Patient Registration Tests");

    let pinfl = search_setup(&mut ctx).await?;
    search_checks(&mut ctx, &pinfl).await?;
    crud_checks(&mut ctx).await?;
    duplicate_checks(&mut ctx).await?;
    negative_checks(&mut ctx).await?;

    ctx.finish(false).await
}

/// Creates the search subject; returns its PINFL.
async fn search_setup(ctx: &mut ScenarioContext<'_>) -> Result<String> {
    ctx.section("Search Tests Setup");
    let pinfl = ctx.prefixed("search-12345678901234");
    let patient = fixtures::patient(
        &pinfl,
        &ctx.prefixed("SearchTest"),
        &["Test", "Patient"],
        "male",
        "1985-05-15",
    );
    let created = ctx
        .create_tracked(
            RESOURCE,
            &patient,
            "Create test patient for search tests",
            "Create test patient",
        )
        .await?;
    if created.is_some() {
        ctx.wait_for_indexing().await;
    }
    Ok(pinfl)
}

async fn search_checks(ctx: &mut ScenarioContext<'_>, pinfl: &str) -> Result<()> {
    ctx.section("Patient Search Tests");

    let token = fixtures::identifier_token(PINFL_SYSTEM, pinfl);
    let response = ctx
        .get(
            RESOURCE,
            RequestOptions::new()
                .param("identifier", token)
                .highlight(["entry[0].resource.identifier", "entry[0].resource.name"]),
        )
        .await?;
    ctx.expect_found(
        &response,
        RESOURCE,
        "Search patient by PINFL identifier",
        "patient(s) with PINFL",
        "Test patient not found",
    );

    let family = ctx.prefixed("SearchTest");
    let response = ctx
        .search(RESOURCE, &[("name:contains", family.as_str())])
        .await?;
    ctx.expect_found(
        &response,
        RESOURCE,
        "Search patient by name",
        "patient(s) with name",
        "Test patient not found by name",
    );

    let response = ctx.search(RESOURCE, &[("given:contains", "Test")]).await?;
    ctx.expect_found(
        &response,
        RESOURCE,
        "Search patient by given name",
        "patient(s) with given name",
        "No patients with test given name found",
    );

    let response = ctx
        .search(RESOURCE, &[("family:contains", family.as_str())])
        .await?;
    ctx.expect_found(
        &response,
        RESOURCE,
        "Search patient by family name",
        "patient(s) with family name",
        "Test patient not found by family name",
    );

    let response = ctx.search(RESOURCE, &[("phone", "+998901234567")]).await?;
    ctx.expect_found(
        &response,
        RESOURCE,
        "Search patient by phone",
        "patient(s) with phone",
        "Phone search not working on server (known limitation)",
    );

    let status_checks: [(&[(&str, &str)], &str); 6] = [
        (&[("birthdate", "1985-05-15")], "Search patient by birthdate"),
        (&[("gender", "male")], "Search patient by gender"),
        (
            &[("address-city", "Toshkent"), ("active", "true")],
            "Search patient by city",
        ),
        (
            &[
                ("family:contains", "Karimov"),
                ("given", "Alisher"),
                ("birthdate", "1985-05-15"),
            ],
            "Search patient with combined demographics",
        ),
        (
            &[("birthdate", "gt1980-01-01"), ("birthdate", "lt1990-12-31")],
            "Search patient with date range",
        ),
        (
            &[("organization", "Organization/123")],
            "Search patient by organization",
        ),
    ];
    for (params, check) in status_checks {
        let response = ctx.search(RESOURCE, params).await?;
        ctx.expect_status(&response, 200, check);
    }
    Ok(())
}

async fn crud_checks(ctx: &mut ScenarioContext<'_>) -> Result<()> {
    ctx.section("Patient CRUD Operations");

    let mut patient = fixtures::patient(
        &ctx.prefixed("12345678901234"),
        &ctx.prefixed("Karimov"),
        &["Alisher", "Akbarovich"],
        "male",
        "1985-05-15",
    );
    set_member(
        &mut patient,
        "telecom",
        json!([{
            "system": "phone",
            "value": ctx.prefixed("+998901234567"),
            "use": "mobile"
        }]),
    );

    let Some(created) = ctx
        .create_tracked(RESOURCE, &patient, "Create patient", "Create patient")
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
            RequestOptions::new().highlight(["name", "identifier", "gender", "birthDate"]),
        )
        .await?;
    if !response.is(200) {
        ctx.fail_status("Read patient", &response);
        return Ok(());
    }
    ctx.pass("Read patient by ID");

    let Some(mut patient) = response.into_json() else {
        ctx.fail("Update patient", "Read returned no JSON body");
        return Ok(());
    };
    let Some(version) = version_id(&patient).map(str::to_string) else {
        ctx.fail("Update patient", "Resource has no meta.versionId");
        return Ok(());
    };
    if !set_at(&mut patient, "/name/0/given", json!(["UpdatedName"])) {
        ctx.fail("Update patient", "Resource has no name[0].given");
        return Ok(());
    }

    let response = ctx
        .client
        .request(
            Method::PUT,
            &endpoint,
            RequestOptions::new()
                .body(patient)
                .if_match(&version)
                .highlight(["name[0].given"]),
        )
        .await?;
    if !response.is(200) {
        ctx.fail_status("Update patient", &response);
        return Ok(());
    }
    ctx.pass("Update patient");

    let response = ctx.get(&endpoint, RequestOptions::new()).await?;
    if let Some(updated) = response.json().filter(|_| response.is(200)) {
        assert_field_equals(
            updated,
            "name[0].given[0]",
            &json!("UpdatedName"),
            "Verify patient update",
            &mut ctx.results,
        );
    }
    Ok(())
}

async fn duplicate_checks(ctx: &mut ScenarioContext<'_>) -> Result<()> {
    ctx.section("Duplicate Detection Tests");

    let pinfl = ctx.prefixed("98765432109876");
    let token = fixtures::identifier_token(PINFL_SYSTEM, &pinfl);

    let mut duplicate_id = None;
    let response = ctx.search(RESOURCE, &[("identifier", token.as_str())]).await?;
    if !response.is(200) {
        ctx.fail_status("Search before create", &response);
    } else if count_entries(&response, RESOURCE) > 0 {
        ctx.skip("Duplicate detection test", "Test PINFL already exists");
    } else {
        ctx.pass("Search before create (no duplicate found)");

        let duplicate = fixtures::patient(
            &pinfl,
            &ctx.prefixed("Duplicate"),
            &["Test"],
            "female",
            "1990-01-01",
        );
        let response = ctx.client.create(RESOURCE, &duplicate).await?;
        duplicate_id = response
            .json()
            .filter(|_| response.is(201))
            .and_then(resource_id)
            .map(str::to_string);
        if let Some(id) = &duplicate_id {
            ctx.created.push((RESOURCE.to_string(), id.clone()));

            let response = ctx.search(RESOURCE, &[("identifier", token.as_str())]).await?;
            if response.is(200) {
                if count_entries(&response, RESOURCE) > 0 {
                    ctx.pass("Search after create (duplicate detected)");
                } else {
                    ctx.fail("Search after create", "Created patient not found");
                }
            }
        }
    }

    if let Some(duplicate_id) = &duplicate_id {
        link_duplicate(ctx, duplicate_id).await?;
    }

    let family = ctx.prefixed("Karimov");
    let response = ctx
        .search(
            RESOURCE,
            &[
                ("family:contains", family.as_str()),
                ("birthdate", "1985-05-15"),
                ("gender", "male"),
            ],
        )
        .await?;
    ctx.expect_status(&response, 200, "Search by demographics for matching");

    // Phone search is unreliable server-side; only the parameter is checked.
    let phone = ctx.prefixed("+998901234567");
    let response = ctx
        .search(
            RESOURCE,
            &[("phone", phone.as_str()), ("birthdate", "1985-05-15")],
        )
        .await?;
    ctx.expect_status(&response, 200, "Search by phone for matching");
    Ok(())
}

/// Deactivate the duplicate and point it at the first tracked patient.
async fn link_duplicate(ctx: &mut ScenarioContext<'_>, duplicate_id: &str) -> Result<()> {
    let Some(main_id) = ctx
        .created
        .first()
        .map(|(_, id)| id.clone())
        .filter(|id| id != duplicate_id)
    else {
        return Ok(());
    };

    let response = ctx.client.read(RESOURCE, duplicate_id).await?;
    let Some(mut duplicate) = response.json().filter(|_| response.is(200)).cloned() else {
        return Ok(());
    };
    let Some(version) = version_id(&duplicate).map(str::to_string) else {
        ctx.fail("Link duplicate patient", "Resource has no meta.versionId");
        return Ok(());
    };
    set_member(&mut duplicate, "active", Value::Bool(false));
    set_member(&mut duplicate, "link", fixtures::replaced_by_link(&main_id));

    let response = ctx
        .client
        .update(RESOURCE, duplicate_id, &duplicate, Some(&version))
        .await?;
    if !response.is(200) {
        ctx.fail_status("Link duplicate patient", &response);
        return Ok(());
    }
    ctx.pass("Link duplicate patient to main record");

    let response = ctx.client.read(RESOURCE, duplicate_id).await?;
    if let Some(linked) = response.json().filter(|_| response.is(200)) {
        let has_link = linked
            .get("link")
            .and_then(Value::as_array)
            .is_some_and(|links| !links.is_empty());
        if has_link {
            ctx.pass("Verify patient link created");
        } else {
            ctx.fail("Verify patient link", "Link not found in resource");
        }
    }
    Ok(())
}

async fn negative_checks(ctx: &mut ScenarioContext<'_>) -> Result<()> {
    ctx.section("Negative Tests");

    ctx.expect_unknown_read(
        "Patient/nonexistent-patient-xyz-12345",
        "Read non-existent patient (400 or 404)",
        "Read non-existent patient",
    )
    .await?;

    let token = fixtures::identifier_token(PINFL_SYSTEM, "99999999999999");
    let response = ctx.search(RESOURCE, &[("identifier", token.as_str())]).await?;
    ctx.expect_none(
        &response,
        RESOURCE,
        "Search non-existent PINFL",
        "Search non-existent PINFL",
    );

    let response = ctx
        .search(RESOURCE, &[("name", "NONEXISTENT_PATIENT_NAME_XYZ_12345")])
        .await?;
    ctx.expect_none(
        &response,
        RESOURCE,
        "Search non-existent patient name",
        "Search non-existent name",
    );

    let response = ctx.search(RESOURCE, &[("active", "false")]).await?;
    ctx.expect_status(&response, 200, "Search inactive patients");

    if let Some((_, id)) = ctx.created.first().cloned() {
        ctx.expect_update_requires_if_match(
            RESOURCE,
            &id,
            "Update without If-Match (correctly fails)",
            |patient| set_at(patient, "/name/0/given", json!(["ShouldFail"])),
        )
        .await?;
    }
    Ok(())
}
