use super::{export_rows, fetch_members};
use crate::core::classify::is_dc_region;
use crate::domain::model::{JobReport, Member, ReportKind};
use crate::domain::ports::{Job, JobPlan, MemberApi, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

pub const FILE_PREFIX: &str = "dc_subscribers";
const COLUMNS: [&str; 7] = [
    "email",
    "name",
    "country",
    "region",
    "city",
    "zip",
    "subscribed_date",
];
const SAMPLE_SIZE: usize = 10;

/// Export subscribers whose predicted location is Washington DC.
pub struct ExtractDcJob<C: MemberApi, S: Storage> {
    client: C,
    storage: S,
    date: NaiveDate,
}

impl<C: MemberApi, S: Storage> ExtractDcJob<C, S> {
    pub fn new(client: C, storage: S, date: NaiveDate) -> Self {
        Self {
            client,
            storage,
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DcSubscriber {
    pub email: String,
    pub name: String,
    pub country: String,
    /// Region exactly as Mailchimp reports it.
    pub region: String,
    pub city: String,
    pub zip: String,
    pub subscribed_date: String,
}

impl From<&Member> for DcSubscriber {
    fn from(member: &Member) -> Self {
        Self {
            email: member.email_address.clone(),
            name: member.display_name(),
            country: member.country().to_string(),
            region: member.location.region.clone(),
            city: member.location.city.clone(),
            zip: member.location.zip.clone(),
            subscribed_date: member.timestamp_opt.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractDcPlan {
    pub rows: Vec<DcSubscriber>,
}

impl JobPlan for ExtractDcPlan {
    fn summary(&self) -> String {
        let mut lines = vec![format!("Found {} DC-based subscribers\n", self.rows.len())];
        if !self.rows.is_empty() {
            lines.push("Sample subscribers:".to_string());
            lines.extend(
                self.rows
                    .iter()
                    .take(SAMPLE_SIZE)
                    .map(|r| format!("  {:45} | {:30} | {}", r.email, r.name, r.city)),
            );
        }
        lines.join("\n")
    }

    fn pending_writes(&self) -> usize {
        0
    }
}

#[async_trait]
impl<C: MemberApi, S: Storage> Job for ExtractDcJob<C, S> {
    type Input = Vec<Member>;
    type Plan = ExtractDcPlan;

    fn name(&self) -> &str {
        "extract-dc"
    }

    async fn extract(&self) -> Result<Vec<Member>> {
        fetch_members(&self.client).await
    }

    fn transform(&self, members: Vec<Member>) -> Result<ExtractDcPlan> {
        let rows = members
            .iter()
            .filter(|m| m.is_subscribed() && is_dc_region(&m.location.region))
            .map(DcSubscriber::from)
            .collect();
        Ok(ExtractDcPlan { rows })
    }

    async fn load(&self, plan: ExtractDcPlan) -> Result<JobReport> {
        if plan.rows.is_empty() {
            return Ok(JobReport {
                kind: ReportKind::Export,
                notes: vec!["No DC-based subscribers found.".to_string()],
                ..Default::default()
            });
        }
        export_rows(&self.storage, FILE_PREFIX, self.date, &COLUMNS, &plan.rows).await
    }
}
