use super::{export_rows, fetch_members};
use crate::domain::model::{JobReport, Member, ReportKind};
use crate::domain::ports::{Job, JobPlan, MemberApi, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

pub const FILE_PREFIX: &str = "dc_org_subscribers";
const COLUMNS: [&str; 7] = [
    "organization",
    "org_domain",
    "email",
    "name",
    "country",
    "country_code",
    "region",
];

/// Export subscribers whose email domain belongs to a DC-based organization.
pub struct ExtractOrgsJob<C: MemberApi, S: Storage> {
    client: C,
    storage: S,
    dc_organizations: BTreeMap<String, String>,
    date: NaiveDate,
}

impl<C: MemberApi, S: Storage> ExtractOrgsJob<C, S> {
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
pub struct OrgSubscriber {
    pub organization: String,
    pub org_domain: String,
    pub email: String,
    pub name: String,
    pub country: String,
    pub country_code: String,
    /// Upper-cased region.
    pub region: String,
}

impl OrgSubscriber {
    fn location(&self) -> &str {
        [self.region.as_str(), self.country_code.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("unknown location")
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOrgsPlan {
    /// Sorted by organization, then name.
    pub rows: Vec<OrgSubscriber>,
}

impl ExtractOrgsPlan {
    pub fn organization_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.organization.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

impl JobPlan for ExtractOrgsPlan {
    fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Found {} subscribers from {} DC-based organizations\n",
            self.rows.len(),
            self.organization_counts().len()
        )];

        let mut current: Option<&str> = None;
        for row in &self.rows {
            if current != Some(row.organization.as_str()) {
                current = Some(row.organization.as_str());
                lines.push(format!("\n{} ({}):", row.organization, row.org_domain));
            }
            lines.push(format!(
                "  {:45} | {:30} | {}",
                row.email,
                row.name,
                row.location()
            ));
        }
        lines.join("\n")
    }

    fn pending_writes(&self) -> usize {
        0
    }
}

#[async_trait]
impl<C: MemberApi, S: Storage> Job for ExtractOrgsJob<C, S> {
    type Input = Vec<Member>;
    type Plan = ExtractOrgsPlan;

    fn name(&self) -> &str {
        "extract-orgs"
    }

    async fn extract(&self) -> Result<Vec<Member>> {
        fetch_members(&self.client).await
    }

    fn transform(&self, members: Vec<Member>) -> Result<ExtractOrgsPlan> {
        let mut rows: Vec<OrgSubscriber> = members
            .iter()
            .filter(|m| m.is_subscribed())
            .filter_map(|m| {
                let domain = m.domain();
                let organization = self.dc_organizations.get(&domain)?.clone();
                Some(OrgSubscriber {
                    organization,
                    org_domain: domain,
                    email: m.email_address.clone(),
                    name: m.display_name(),
                    country: m.country().to_string(),
                    country_code: m.location.country_code.clone(),
                    region: m.location.region.to_uppercase(),
                })
            })
            .collect();

        rows.sort_by(|a, b| (&a.organization, &a.name).cmp(&(&b.organization, &b.name)));
        Ok(ExtractOrgsPlan { rows })
    }

    async fn load(&self, plan: ExtractOrgsPlan) -> Result<JobReport> {
        if plan.rows.is_empty() {
            return Ok(JobReport {
                kind: ReportKind::Export,
                notes: vec!["No subscribers from DC-based organizations found.".to_string()],
                ..Default::default()
            });
        }

        let mut report =
            export_rows(&self.storage, FILE_PREFIX, self.date, &COLUMNS, &plan.rows).await?;
        report.notes.push("Summary by organization:".to_string());
        report.notes.extend(
            plan.organization_counts()
                .iter()
                .map(|(org, count)| format!("  {:50} {:3} subscribers", org, count)),
        );
        Ok(report)
    }
}
