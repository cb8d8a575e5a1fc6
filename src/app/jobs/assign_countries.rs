use super::{apply_country_updates, fetch_members, CountryUpdate};
use crate::config::settings::CountryMapping;
use crate::core::classify::infer_country;
use crate::domain::model::{JobReport, Member, UNITED_KINGDOM, UNITED_STATES};
use crate::domain::ports::{Job, JobPlan, MemberApi};
use crate::utils::error::Result;
use async_trait::async_trait;

const EXAMPLES_PER_COUNTRY: usize = 5;

/// Fill in missing `COUNTRY` values inferred from email domains and tags.
pub struct AssignCountriesJob<C: MemberApi> {
    client: C,
    mapping: CountryMapping,
}

impl<C: MemberApi> AssignCountriesJob<C> {
    pub fn new(client: C, mapping: CountryMapping) -> Self {
        Self { client, mapping }
    }
}

#[derive(Debug, Clone)]
pub struct AssignCountriesPlan {
    pub updates: Vec<CountryUpdate>,
    pub subscribed: usize,
    pub already_set: usize,
}

impl AssignCountriesPlan {
    fn for_country(&self, country: &str) -> impl Iterator<Item = &CountryUpdate> {
        let country = country.to_string();
        self.updates.iter().filter(move |u| u.country == country)
    }

    pub fn uk_count(&self) -> usize {
        self.for_country(UNITED_KINGDOM).count()
    }

    pub fn us_count(&self) -> usize {
        self.for_country(UNITED_STATES).count()
    }

    pub fn unassigned(&self) -> usize {
        self.subscribed
            .saturating_sub(self.updates.len())
            .saturating_sub(self.already_set)
    }

    fn examples(&self, country: &str) -> Vec<String> {
        self.for_country(country)
            .take(EXAMPLES_PER_COUNTRY)
            .map(|u| format!("  {:45} | {}", u.email, u.reason))
            .collect()
    }
}

impl JobPlan for AssignCountriesPlan {
    fn summary(&self) -> String {
        let mut lines = vec![
            format!("Can assign country to {} subscribers:\n", self.updates.len()),
            format!("  UK: {}", self.uk_count()),
            format!("  US: {}", self.us_count()),
            format!("  Unassigned: {}", self.unassigned()),
            "\nUK examples:".to_string(),
        ];
        lines.extend(self.examples(UNITED_KINGDOM));
        lines.push("\nUS examples:".to_string());
        lines.extend(self.examples(UNITED_STATES));
        lines.join("\n")
    }

    fn pending_writes(&self) -> usize {
        self.updates.len()
    }
}

#[async_trait]
impl<C: MemberApi> Job for AssignCountriesJob<C> {
    type Input = Vec<Member>;
    type Plan = AssignCountriesPlan;

    fn name(&self) -> &str {
        "assign-countries"
    }

    async fn extract(&self) -> Result<Vec<Member>> {
        fetch_members(&self.client).await
    }

    fn transform(&self, members: Vec<Member>) -> Result<AssignCountriesPlan> {
        let mut plan = AssignCountriesPlan {
            updates: Vec::new(),
            subscribed: 0,
            already_set: 0,
        };

        for member in members.iter().filter(|m| m.is_subscribed()) {
            plan.subscribed += 1;
            if !member.country().is_empty() {
                plan.already_set += 1;
                continue;
            }

            let guess = infer_country(&member.email_address, &member.tag_names(), &self.mapping);
            if let Some(country) = guess.country {
                plan.updates.push(CountryUpdate {
                    id: member.id.clone(),
                    email: member.email_address.clone(),
                    country,
                    reason: guess.reason,
                });
            }
        }

        tracing::debug!(
            "{} of {} subscribed members can be assigned a country",
            plan.updates.len(),
            plan.subscribed
        );
        Ok(plan)
    }

    async fn load(&self, plan: AssignCountriesPlan) -> Result<JobReport> {
        let mut report = apply_country_updates(&self.client, &plan.updates).await;
        report.notes = vec![
            format!("   UK subscribers: {}", plan.uk_count()),
            format!("   US subscribers: {}", plan.us_count()),
        ];
        Ok(report)
    }
}
