//! Resource payloads for the uz-core profiles

use serde_json::{json, Value};

/// Profile and identifier system URLs
pub mod constants {
    pub const ORGANIZATION_PROFILE: &str =
        "https://dhp.uz/fhir/core/StructureDefinition/uz-core-organization";
    pub const PRACTITIONER_PROFILE: &str =
        "https://dhp.uz/fhir/core/StructureDefinition/uz-core-practitioner";
    pub const PRACTITIONER_ROLE_PROFILE: &str =
        "https://dhp.uz/fhir/core/StructureDefinition/uz-core-practitionerrole";
    pub const PATIENT_PROFILE: &str =
        "https://dhp.uz/fhir/core/StructureDefinition/uz-core-patient";

    /// Tax id (soliq) of organisations
    pub const SOLIQ_SYSTEM: &str = "https://dhp.uz/fhir/core/sid/org/uz/soliq";
    /// Practitioner registry id (ARGOS)
    pub const ARGOS_SYSTEM: &str = "https://dhp.uz/fhir/core/sid/pro/uz/argos";
    /// Personal id (PINFL)
    pub const PINFL_SYSTEM: &str = "https://dhp.uz/fhir/core/sid/pid/uz/ni";

    pub const V2_0203_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0203";
    pub const V2_0360_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0360";
    pub const ORGANIZATION_TYPE_SYSTEM: &str =
        "http://terminology.hl7.org/CodeSystem/organization-type";
    pub const POSITION_SYSTEM: &str =
        "https://terminology.dhp.uz/fhir/core/CodeSystem/position-and-profession-cs";
}

use constants::*;

/// `system|value` token for identifier searches.
pub fn identifier_token(system: &str, value: &str) -> String {
    format!("{system}|{value}")
}

/// Active healthcare-provider organisation with a tax identifier.
pub fn organization(tax_id: &str, name: &str) -> Value {
    json!({
        "resourceType": "Organization",
        "meta": { "profile": [ORGANIZATION_PROFILE] },
        "identifier": [
            {
                "system": SOLIQ_SYSTEM,
                "type": { "coding": [{ "system": V2_0203_SYSTEM, "code": "TAX" }] },
                "value": tax_id
            }
        ],
        "active": true,
        "type": [
            {
                "coding": [
                    {
                        "system": ORGANIZATION_TYPE_SYSTEM,
                        "code": "prov",
                        "display": "Healthcare Provider"
                    }
                ]
            }
        ],
        "language": "uz",
        "name": name
    })
}

/// Active male practitioner with an ARGOS identifier and an official name.
pub fn practitioner(argos_id: &str, family: &str, given: &[&str]) -> Value {
    json!({
        "resourceType": "Practitioner",
        "meta": { "profile": [PRACTITIONER_PROFILE] },
        "language": "uz",
        "identifier": [
            {
                "use": "official",
                "type": { "coding": [{ "system": V2_0203_SYSTEM, "code": "NI" }] },
                "system": ARGOS_SYSTEM,
                "value": argos_id
            }
        ],
        "active": true,
        "name": [{ "use": "official", "family": family, "given": given }],
        "gender": "male"
    })
}

/// Work phone and email contact points.
pub fn work_telecom(phone: &str, email: &str) -> Value {
    json!([
        { "system": "phone", "value": phone, "use": "work" },
        { "system": "email", "value": email, "use": "work" }
    ])
}

/// Doctor of Medicine qualification.
pub fn md_qualification() -> Value {
    json!([
        {
            "code": {
                "coding": [
                    {
                        "system": V2_0360_SYSTEM,
                        "code": "MD",
                        "display": "Doctor of Medicine"
                    }
                ]
            }
        }
    ])
}

/// General practitioner role linking a practitioner to an organisation.
pub fn practitioner_role(practitioner_id: &str, organization_id: &str) -> Value {
    json!({
        "resourceType": "PractitionerRole",
        "meta": { "profile": [PRACTITIONER_ROLE_PROFILE] },
        "language": "uz",
        "active": true,
        "practitioner": {
            "reference": format!("Practitioner/{practitioner_id}"),
            "display": "Test Practitioner"
        },
        "organization": {
            "reference": format!("Organization/{organization_id}"),
            "display": "Test Organization"
        },
        "code": [
            {
                "coding": [
                    {
                        "system": POSITION_SYSTEM,
                        "code": "2211.1",
                        "display": "General practitioner"
                    }
                ]
            }
        ]
    })
}

/// Active patient with a PINFL identifier and an official name.
pub fn patient(
    pinfl: &str,
    family: &str,
    given: &[&str],
    gender: &str,
    birth_date: &str,
) -> Value {
    json!({
        "resourceType": "Patient",
        "meta": { "profile": [PATIENT_PROFILE] },
        "language": "uz",
        "identifier": [
            {
                "use": "official",
                "type": { "coding": [{ "system": V2_0203_SYSTEM, "code": "NI" }] },
                "system": PINFL_SYSTEM,
                "value": pinfl
            }
        ],
        "active": true,
        "name": [{ "use": "official", "family": family, "given": given }],
        "gender": gender,
        "birthDate": birth_date
    })
}

/// `replaced-by` link pointing at the surviving patient record.
pub fn replaced_by_link(main_patient_id: &str) -> Value {
    json!([
        {
            "other": {
                "reference": format!("Patient/{main_patient_id}"),
                "display": "Main patient record"
            },
            "type": "replaced-by"
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrum_inspect::resolve;

    #[test]
    fn test_organization_shape() {
        let org = organization("TEST-123456789", "TEST-Test Organization");
        assert_eq!(*resolve(&org, "identifier[0].system").unwrap(), SOLIQ_SYSTEM);
        assert_eq!(*resolve(&org, "type[0].coding[0].code").unwrap(), "prov");
        assert_eq!(*resolve(&org, "meta.profile[0]").unwrap(), ORGANIZATION_PROFILE);
    }

    #[test]
    fn test_patient_shape() {
        let patient = patient(
            "TEST-1",
            "TEST-Karimov",
            &["Alisher", "Akbarovich"],
            "male",
            "1985-05-15",
        );
        assert_eq!(*resolve(&patient, "name[0].given[1]").unwrap(), "Akbarovich");
        assert_eq!(*resolve(&patient, "birthDate").unwrap(), "1985-05-15");
        assert_eq!(*resolve(&patient, "identifier[0].type.coding[0].code").unwrap(), "NI");
    }

    #[test]
    fn test_role_references() {
        let role = practitioner_role("p1", "o1");
        assert_eq!(*resolve(&role, "practitioner.reference").unwrap(), "Practitioner/p1");
        assert_eq!(*resolve(&role, "organization.reference").unwrap(), "Organization/o1");
    }

    #[test]
    fn test_identifier_token() {
        assert_eq!(
            identifier_token(PINFL_SYSTEM, "123"),
            "https://dhp.uz/fhir/core/sid/pid/uz/ni|123"
        );
    }
}
