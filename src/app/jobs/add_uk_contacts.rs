use crate::core::engine::report_progress;
use crate::domain::model::{AddMemberOutcome, Contact, JobReport, ReportKind, UNITED_KINGDOM};
use crate::domain::ports::{Job, JobPlan, MemberApi, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::io::Read;

const PROGRESS_EVERY: usize = 10;

/// Make sure every contact in a CSV is subscribed with `COUNTRY = United Kingdom`.
pub struct AddUkContactsJob<C: MemberApi, S: Storage> {
    client: C,
    storage: S,
    csv_path: String,
}

impl<C: MemberApi, S: Storage> AddUkContactsJob<C, S> {
    pub fn new(client: C, storage: S, csv_path: impl Into<String>) -> Self {
        Self {
            client,
            storage,
            csv_path: csv_path.into(),
        }
    }

    async fn ensure_uk(&self, contact: &Contact, report: &mut JobReport) {
        let email = contact.email.as_str();

        let existing = match self.client.get_member(email).await {
            Ok(existing) => existing,
            Err(e) => {
                report.failed += 1;
                tracing::warn!("Lookup failed for {}: {}", email, e);
                println!("✗ Failed: {}", email);
                return;
            }
        };

        if let Some(member) = existing {
            if member.country() == UNITED_KINGDOM {
                report.unchanged += 1;
                return;
            }
            match self.client.set_member_country(&member.id, UNITED_KINGDOM).await {
                Ok(()) => {
                    report.updated += 1;
                    println!("✓ Updated: {}", email);
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("Update failed for {}: {}", email, e);
                    println!("✗ Failed to update: {}", email);
                }
            }
            return;
        }

        let outcome = self
            .client
            .add_member(email, &contact.first_name, UNITED_KINGDOM)
            .await;
        match outcome {
            Ok(AddMemberOutcome::Added) => {
                report.added += 1;
                println!("✓ Added: {}", email);
            }
            Ok(AddMemberOutcome::Rejected(problem)) if problem.is_member_exists() => {
                // archived or unsubscribed members are invisible to the lookup
                match self
                    .client
                    .resubscribe_member(email, &contact.first_name, UNITED_KINGDOM)
                    .await
                {
                    Ok(()) => {
                        report.updated += 1;
                        println!("✓ Resubscribed: {}", email);
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!("Resubscribe failed for {}: {}", email, e);
                        println!("✗ Failed: {}", email);
                    }
                }
            }
            Ok(AddMemberOutcome::Rejected(problem)) => {
                report.failed += 1;
                println!("✗ Failed to add: {} - {}", email, problem.detail);
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!("Add failed for {}: {}", email, e);
                println!("✗ Failed to add: {} - {}", email, e);
            }
        }
    }
}

/// Read `email,first_name` rows, trimming values and skipping blank emails.
pub fn read_contacts<R: Read>(reader: R) -> Result<Vec<Contact>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut contacts = Vec::new();
    for row in csv_reader.deserialize::<Contact>() {
        let contact = row?;
        if contact.email.is_empty() {
            continue;
        }
        contacts.push(contact);
    }
    Ok(contacts)
}

#[derive(Debug, Clone)]
pub struct AddUkContactsPlan {
    pub contacts: Vec<Contact>,
}

impl JobPlan for AddUkContactsPlan {
    fn summary(&self) -> String {
        format!("Found {} UK contacts in CSV\n", self.contacts.len())
    }

    fn pending_writes(&self) -> usize {
        self.contacts.len()
    }
}

#[async_trait]
impl<C: MemberApi, S: Storage> Job for AddUkContactsJob<C, S> {
    type Input = Vec<Contact>;
    type Plan = AddUkContactsPlan;

    fn name(&self) -> &str {
        "add-uk-contacts"
    }

    async fn extract(&self) -> Result<Vec<Contact>> {
        tracing::debug!("Reading contacts from {}", self.csv_path);
        let data = self.storage.read_file(&self.csv_path).await?;
        read_contacts(&data[..])
    }

    fn transform(&self, contacts: Vec<Contact>) -> Result<AddUkContactsPlan> {
        Ok(AddUkContactsPlan { contacts })
    }

    async fn load(&self, plan: AddUkContactsPlan) -> Result<JobReport> {
        let total = plan.contacts.len();
        let mut report = JobReport {
            kind: ReportKind::Tally,
            ..Default::default()
        };

        for (i, contact) in plan.contacts.iter().enumerate() {
            self.ensure_uk(contact, &mut report).await;
            report_progress(i + 1, total, PROGRESS_EVERY);
        }

        report.notes = vec![
            format!("Added new subscribers: {}", report.added),
            format!("Updated to UK: {}", report.updated),
            format!("Already set to UK: {}", report.unchanged),
            format!("Failed: {}", report.failed),
            String::new(),
            format!("Total UK contacts processed: {}", total),
        ];
        Ok(report)
    }
}
