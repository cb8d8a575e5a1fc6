use super::{apply_country_updates, fetch_members, CountryUpdate};
use crate::core::classify::country_for_code;
use crate::domain::model::{JobReport, Member};
use crate::domain::ports::{Job, JobPlan, MemberApi};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Copy Mailchimp's predicted `location.country_code` into empty `COUNTRY` fields.
pub struct SyncCountryJob<C: MemberApi> {
    client: C,
    country_codes: BTreeMap<String, String>,
}

impl<C: MemberApi> SyncCountryJob<C> {
    pub fn new(client: C, country_codes: BTreeMap<String, String>) -> Self {
        Self {
            client,
            country_codes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncCountryPlan {
    /// `reason` carries the source country code.
    pub updates: Vec<CountryUpdate>,
}

impl SyncCountryPlan {
    fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a CountryUpdate> + 'a {
        self.updates.iter().filter(move |u| u.reason == code)
    }

    pub fn uk_count(&self) -> usize {
        self.with_code("GB").count()
    }

    pub fn us_count(&self) -> usize {
        self.with_code("US").count()
    }

    pub fn other_count(&self) -> usize {
        self.updates.len() - self.uk_count() - self.us_count()
    }

    fn examples(&self, code: &str, limit: usize) -> Vec<String> {
        self.with_code(code)
            .take(limit)
            .map(|u| format!("  {:45} | {} → {}", u.email, u.reason, u.country))
            .collect()
    }

    fn counts(&self) -> Vec<String> {
        vec![
            format!("   UK: {}", self.uk_count()),
            format!("   US: {}", self.us_count()),
            format!("   Other: {}", self.other_count()),
        ]
    }
}

impl JobPlan for SyncCountryPlan {
    fn summary(&self) -> String {
        let mut lines = vec![
            format!(
                "Can sync {} subscribers from predicted location:\n",
                self.updates.len()
            ),
            format!("  UK (GB): {}", self.uk_count()),
            format!("  US: {}", self.us_count()),
            format!("  Other: {}", self.other_count()),
            "\nUK examples:".to_string(),
        ];
        lines.extend(self.examples("GB", 10));
        lines.push("\nUS examples:".to_string());
        lines.extend(self.examples("US", 5));
        lines.join("\n")
    }

    fn pending_writes(&self) -> usize {
        self.updates.len()
    }
}

#[async_trait]
impl<C: MemberApi> Job for SyncCountryJob<C> {
    type Input = Vec<Member>;
    type Plan = SyncCountryPlan;

    fn name(&self) -> &str {
        "sync-country"
    }

    async fn extract(&self) -> Result<Vec<Member>> {
        fetch_members(&self.client).await
    }

    fn transform(&self, members: Vec<Member>) -> Result<SyncCountryPlan> {
        let updates = members
            .iter()
            .filter(|m| m.is_subscribed() && m.country().is_empty())
            .filter_map(|m| {
                let code = m.location.country_code.as_str();
                if code.is_empty() {
                    return None;
                }
                let country = country_for_code(&self.country_codes, code)?;
                Some(CountryUpdate {
                    id: m.id.clone(),
                    email: m.email_address.clone(),
                    country: country.to_string(),
                    reason: code.to_string(),
                })
            })
            .collect();

        Ok(SyncCountryPlan { updates })
    }

    async fn load(&self, plan: SyncCountryPlan) -> Result<JobReport> {
        println!("\nSyncing COUNTRY from predicted location...");
        let mut report = apply_country_updates(&self.client, &plan.updates).await;
        report.notes = plan.counts();
        Ok(report)
    }
}
