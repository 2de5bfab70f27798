// file: src/models/lead.rs
// description: lead form payload and the CRM contact it is reshaped into
// reference: https://highlevel.stoplight.io/docs/integrations (contacts api)

use serde::{Deserialize, Serialize};

/// Inbound lead form payload. Either `fullName` or `name` may carry the name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub resident_state: Option<String>,
    pub budget: Option<String>,
    pub coverage_type: Option<String>,
    pub source: Option<String>,
    pub context: Option<String>,
}

impl LeadSubmission {
    pub fn display_name(&self) -> Option<&str> {
        non_blank(self.full_name.as_deref()).or_else(|| non_blank(self.name.as_deref()))
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Custom field keys must match fields provisioned in the CRM exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub key: String,
    pub field_value: String,
}

impl CustomField {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            field_value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmContact {
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub state: String,
    pub location_id: String,
    pub source: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub custom_fields: Vec<CustomField>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResult {
    pub contact_id: Option<String>,
    pub data: serde_json::Value,
}

impl RelayResult {
    /// The contacts api has answered with `id`, `contact.id` and `contactId`
    /// across versions.
    pub fn from_response(data: serde_json::Value) -> Self {
        let contact_id = data
            .get("id")
            .or_else(|| data.get("contact").and_then(|c| c.get("id")))
            .or_else(|| data.get("contactId"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Self { contact_id, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submission_accepts_camel_case() {
        let lead: LeadSubmission = serde_json::from_value(json!({
            "fullName": "Jane Q Public",
            "email": "jane@example.com",
            "coverageType": "Term",
            "residentState": "TX"
        }))
        .unwrap();

        assert_eq!(lead.display_name(), Some("Jane Q Public"));
        assert_eq!(lead.coverage_type.as_deref(), Some("Term"));
        assert_eq!(lead.resident_state.as_deref(), Some("TX"));
    }

    #[test]
    fn test_display_name_falls_back_to_name() {
        let lead = LeadSubmission {
            full_name: Some("  ".to_string()),
            name: Some("Sam".to_string()),
            ..Default::default()
        };
        assert_eq!(lead.display_name(), Some("Sam"));
    }

    #[test]
    fn test_contact_id_lookup_order() {
        assert_eq!(
            RelayResult::from_response(json!({"contact": {"id": "c1"}})).contact_id,
            Some("c1".to_string())
        );
        assert_eq!(
            RelayResult::from_response(json!({"contactId": "c2"})).contact_id,
            Some("c2".to_string())
        );
        assert_eq!(RelayResult::from_response(json!({})).contact_id, None);
    }

    #[test]
    fn test_contact_omits_empty_collections() {
        let contact = CrmContact {
            first_name: "Jane".to_string(),
            last_name: "Unknown".to_string(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: String::new(),
            date_of_birth: String::new(),
            state: String::new(),
            location_id: "loc".to_string(),
            source: "direct".to_string(),
            tags: vec![],
            custom_fields: vec![],
        };
        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["locationId"], "loc");
        assert!(json.get("tags").is_none());
        assert!(json.get("customFields").is_none());
    }
}
