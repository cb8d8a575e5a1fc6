use super::{export_rows, fetch_members, truncate};
use crate::core::classify::classify_dmv;
use crate::domain::model::{JobReport, Member};
use crate::domain::ports::{Job, JobPlan, MemberApi, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

pub const FILE_PREFIX: &str = "dmv_subscribers";
const COLUMNS: [&str; 8] = [
    "email",
    "name",
    "organization",
    "org_domain",
    "region",
    "country_code",
    "tags",
    "dmv_reason",
];
const SAMPLE_SIZE: usize = 20;

/// Export subscribers in the DC/Maryland/Virginia area, by location or employer.
pub struct ExtractDmvJob<C: MemberApi, S: Storage> {
    client: C,
    storage: S,
    dc_organizations: BTreeMap<String, String>,
    date: NaiveDate,
}

impl<C: MemberApi, S: Storage> ExtractDmvJob<C, S> {
    pub fn new(
        client: C,
        storage: S,
        dc_organizations: BTreeMap<String, String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            client,
            storage,
            dc_organizations,
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DmvSubscriber {
    pub email: String,
    pub name: String,
    pub organization: String,
    /// Only set when the domain belongs to a known organization.
    pub org_domain: String,
    /// Upper-cased region.
    pub region: String,
    pub country_code: String,
    pub tags: String,
    pub dmv_reason: String,
}

#[derive(Debug, Clone)]
pub struct ExtractDmvPlan {
    pub rows: Vec<DmvSubscriber>,
}

impl ExtractDmvPlan {
    fn in_region(&self, region: &str) -> usize {
        self.rows.iter().filter(|r| r.region == region).count()
    }

    pub fn by_location(&self) -> usize {
        self.in_region("DC") + self.in_region("VA") + self.in_region("MD")
    }

    pub fn by_organization(&self) -> usize {
        self.rows.iter().filter(|r| !r.organization.is_empty()).count()
    }

    pub fn organization_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for row in self.rows.iter().filter(|r| !r.organization.is_empty()) {
            *counts.entry(row.organization.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

impl JobPlan for ExtractDmvPlan {
    fn summary(&self) -> String {
        let mut lines = vec![
            format!("Found {} DMV-area subscribers\n", self.rows.len()),
            "Summary:".to_string(),
            format!(
                "  By location: {} (DC: {}, VA: {}, MD: {})",
                self.by_location(),
                self.in_region("DC"),
                self.in_region("VA"),
                self.in_region("MD")
            ),
            format!("  By DC organization: {}", self.by_organization()),
            format!("  Total unique: {}", self.rows.len()),
            "\nSample DMV subscribers:".to_string(),
        ];

        for row in self.rows.iter().take(SAMPLE_SIZE) {
            let region = if row.region.is_empty() { "???" } else { &row.region };
            let org = if row.organization.is_empty() {
                row.org_domain.clone()
            } else {
                truncate(&row.organization, 30)
            };
            lines.push(format!("  {:3} | {:45} | {}", region, row.email, org));
        }
        lines.join("\n")
    }

    fn pending_writes(&self) -> usize {
        0
    }
}

#[async_trait]
impl<C: MemberApi, S: Storage> Job for ExtractDmvJob<C, S> {
    type Input = Vec<Member>;
    type Plan = ExtractDmvPlan;

    fn name(&self) -> &str {
        "extract-dmv"
    }

    async fn extract(&self) -> Result<Vec<Member>> {
        fetch_members(&self.client).await
    }

    fn transform(&self, members: Vec<Member>) -> Result<ExtractDmvPlan> {
        let mut rows: Vec<DmvSubscriber> = members
            .iter()
            .filter(|m| m.is_subscribed())
            .filter_map(|m| {
                let found = classify_dmv(m, &self.dc_organizations)?;
                let organization = found.organization.clone().unwrap_or_default();
                let org_domain = if organization.is_empty() {
                    String::new()
                } else {
                    m.domain()
                };
                Some(DmvSubscriber {
                    email: m.email_address.clone(),
                    name: m.display_name(),
                    organization,
                    org_domain,
                    region: m.location.region.to_uppercase(),
                    country_code: m.location.country_code.clone(),
                    tags: m.tag_names().join(", "),
                    dmv_reason: found.reason(),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            (&a.organization, &a.region, &a.name).cmp(&(&b.organization, &b.region, &b.name))
        });
        Ok(ExtractDmvPlan { rows })
    }

    async fn load(&self, plan: ExtractDmvPlan) -> Result<JobReport> {
        let mut report =
            export_rows(&self.storage, FILE_PREFIX, self.date, &COLUMNS, &plan.rows).await?;

        let counts = plan.organization_counts();
        if !counts.is_empty() {
            report.notes.push("Subscribers by DC organization:".to_string());
            report.notes.extend(
                counts
                    .iter()
                    .map(|(org, count)| format!("  {:50} {:3}", org, count)),
            );
        }
        Ok(report)
    }
}
