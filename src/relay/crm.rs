// file: src/relay/crm.rs
// description: forwards lead form submissions to the CRM contacts api
// reference: https://highlevel.stoplight.io/docs/integrations (create contact)

use super::tracking::{DIRECT_SOURCE, SourceTracking};
use crate::config::CrmConfig;
use crate::error::{CmsError, Result};
use crate::models::lead::non_blank;
use crate::models::{CrmContact, CustomField, LeadSubmission, RelayResult};
use crate::utils::Validator;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const UNKNOWN: &str = "Unknown";

/// Custom field keys provisioned in the CRM location.
pub const FIELD_CONTEXT: &str = "context";
pub const FIELD_MONTHLY_BUDGET: &str = "monthly_budget";
pub const FIELD_COVERAGE_TYPE: &str = "coverage_type";

/// Sends each submission once. There is no retry and no deduplication, so a
/// client that resubmits creates a second request.
pub struct LeadRelay {
    client: Client,
    config: CrmConfig,
}

impl LeadRelay {
    pub fn new(config: CrmConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let token = non_blank(self.config.api_token.as_deref())
            .ok_or_else(|| CmsError::Config("CRM api token is not configured".to_string()))?;
        let location = non_blank(self.config.location_id.as_deref())
            .ok_or_else(|| CmsError::Config("CRM location id is not configured".to_string()))?;
        Ok((token, location))
    }

    /// Reshapes a submission into the CRM contact payload. Values on the
    /// submission take precedence over the session's captured attribution.
    pub fn build_contact(
        lead: &LeadSubmission,
        tracking: Option<&SourceTracking>,
        location_id: &str,
    ) -> CrmContact {
        let (first, last) = split_name(lead.display_name().unwrap_or_default());
        let full = format!("{} {}", first, last).trim().to_string();

        let source = non_blank(lead.source.as_deref())
            .or_else(|| tracking.map(|t| t.source.as_str()).filter(|s| !s.is_empty()));
        let context = non_blank(lead.context.as_deref())
            .or_else(|| tracking.and_then(|t| non_blank(t.context.as_deref())));
        let budget = non_blank(lead.budget.as_deref());
        let coverage = non_blank(lead.coverage_type.as_deref());

        let mut custom_fields = Vec::new();
        if let Some(context) = context {
            custom_fields.push(CustomField::new(FIELD_CONTEXT, context));
        }
        if let Some(budget) = budget {
            custom_fields.push(CustomField::new(FIELD_MONTHLY_BUDGET, budget));
        }
        if let Some(coverage) = coverage {
            custom_fields.push(CustomField::new(FIELD_COVERAGE_TYPE, coverage));
        }

        let mut tags = Vec::new();
        if let Some(source) = source {
            tags.push(format!("Source: {}", source));
        }
        if let Some(coverage) = coverage {
            tags.push(format!("Coverage: {}", coverage));
        }

        let or_empty = |value: &Option<String>| non_blank(value.as_deref()).unwrap_or_default().to_string();

        CrmContact {
            first_name: or_unknown(first),
            last_name: or_unknown(&last),
            name: or_unknown(&full),
            email: or_empty(&lead.email),
            phone: or_empty(&lead.phone),
            date_of_birth: or_empty(&lead.birth_date),
            state: or_empty(&lead.resident_state),
            location_id: location_id.to_string(),
            source: source.unwrap_or(DIRECT_SOURCE).to_string(),
            tags,
            custom_fields,
        }
    }

    /// Creates a contact for `lead`. The email check happens before any
    /// network traffic; a non-2xx answer surfaces the upstream status.
    pub async fn submit(
        &self,
        lead: &LeadSubmission,
        tracking: Option<&SourceTracking>,
    ) -> Result<RelayResult> {
        Validator::require("email", lead.email.as_deref())?;
        let (token, location_id) = self.credentials().inspect_err(|e| error!("{}", e))?;

        let contact = Self::build_contact(lead, tracking, location_id);
        debug!(
            "Relaying lead (source: {}, {} custom fields)",
            contact.source,
            contact.custom_fields.len()
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .header("Version", &self.config.api_version)
            .json(&contact)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = upstream_message(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "Unknown error".to_string());
            error!("CRM rejected contact with status {}: {}", status.as_u16(), body);
            return Err(CmsError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let data = if body.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or_else(|e| {
                warn!("CRM accepted the contact but sent a non-JSON body: {}", e);
                serde_json::Value::String(body)
            })
        };
        let result = RelayResult::from_response(data);

        info!(
            "CRM contact created{}",
            result
                .contact_id
                .as_deref()
                .map(|id| format!(": {}", id))
                .unwrap_or_default()
        );
        Ok(result)
    }
}

/// First whitespace token, then the rest joined by single spaces.
fn split_name(name: &str) -> (&str, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}

fn or_unknown(value: &str) -> String {
    if value.is_empty() {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

/// The `message` field of a JSON error body, or the raw body text.
fn upstream_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => match json.get("message") {
            Some(serde_json::Value::String(message)) => Some(message.clone()),
            Some(serde_json::Value::Array(messages)) => Some(
                messages
                    .iter()
                    .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        },
        Err(_) => Some(body.to_string()),
    }
}
