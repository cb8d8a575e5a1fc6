use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value Mailchimp stores in the `COUNTRY` merge field for British subscribers.
pub const UNITED_KINGDOM: &str = "United Kingdom";
pub const UNITED_STATES: &str = "United States of America";

/// One list member as returned by `GET /lists/{id}/members`.
///
/// Only the handful of fields the jobs read are modelled; everything else in
/// the payload is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub id: String,
    pub email_address: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub merge_fields: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub location: MemberLocation,
    #[serde(default)]
    pub tags: Vec<MemberTag>,
    #[serde(default)]
    pub timestamp_opt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberLocation {
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberTag {
    pub name: String,
}

impl Member {
    pub fn is_subscribed(&self) -> bool {
        self.status == "subscribed"
    }

    /// Merge field as trimmed text; non-string and missing fields read as "".
    pub fn merge_field(&self, key: &str) -> &str {
        self.merge_fields
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .unwrap_or("")
    }

    pub fn country(&self) -> &str {
        self.merge_field("COUNTRY")
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.merge_field("FNAME"), self.merge_field("LNAME"))
            .trim()
            .to_string()
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    pub fn domain(&self) -> String {
        email_domain(&self.email_address)
    }
}

/// Lower-cased text after the last `@`, or "" for malformed addresses.
pub fn email_domain(email: &str) -> String {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain.to_lowercase())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembersPage {
    #[serde(default)]
    pub members: Vec<Member>,
}

/// Error body Mailchimp sends with non-2xx responses (RFC 7807 style).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiProblem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

/// Result of `POST /lists/{id}/members`.
#[derive(Debug, Clone)]
pub enum AddMemberOutcome {
    Added,
    Rejected(ApiProblem),
}

impl ApiProblem {
    pub fn is_member_exists(&self) -> bool {
        self.title == "Member Exists"
    }
}

/// A contact row from a static CSV file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Contact {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCondition {
    pub condition_type: String,
    pub field: String,
    pub op: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentOpts {
    #[serde(rename = "match")]
    pub match_type: String,
    pub conditions: Vec<SegmentCondition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignRecipients {
    pub list_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_opts: Option<SegmentOpts>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignSettings {
    pub subject_line: String,
    pub preview_text: String,
    pub title: String,
    pub from_name: String,
    pub reply_to: String,
    pub auto_footer: bool,
    pub inline_css: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCampaign {
    #[serde(rename = "type")]
    pub campaign_type: String,
    pub recipients: CampaignRecipients,
    pub settings: CampaignSettings,
}

/// Partial settings for `PATCH /campaigns/{id}`; absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
}

impl CampaignSettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub web_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub campaign_id: String,
    pub web_id: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportKind {
    /// Remote write-backs (PATCH/POST per member).
    #[default]
    Writes,
    /// Local CSV export.
    Export,
    /// Write-backs whose counts are spelled out in `notes`.
    Tally,
}

/// Outcome counters for a job run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub kind: ReportKind,
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub exported: usize,
    pub output_path: Option<String>,
    /// Extra lines appended to the final report.
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_deserializes_with_missing_sections() {
        let member: Member = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "email_address": "jane@ifs.org.uk",
            "status": "subscribed"
        }))
        .unwrap();

        assert!(member.is_subscribed());
        assert_eq!(member.country(), "");
        assert_eq!(member.location.country_code, "");
        assert!(member.tag_names().is_empty());
    }

    #[test]
    fn test_display_name_trims_missing_parts() {
        let member: Member = serde_json::from_value(serde_json::json!({
            "email_address": "a@b.org",
            "merge_fields": {"FNAME": "Ada", "LNAME": "", "COUNTRY": "  United Kingdom "}
        }))
        .unwrap();

        assert_eq!(member.display_name(), "Ada");
        assert_eq!(member.country(), UNITED_KINGDOM);
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(email_domain("Someone@Brookings.EDU"), "brookings.edu");
        assert_eq!(email_domain("no-at-sign"), "");
    }

    #[test]
    fn test_settings_patch_skips_absent_fields() {
        let patch = CampaignSettingsPatch {
            subject_line: Some("Hello".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"subject_line": "Hello"})
        );
        assert!(CampaignSettingsPatch::default().is_empty());
    }
}
