//! Subscriber jobs run by `subscriber-tools`.

pub mod add_uk_contacts;
pub mod assign_countries;
pub mod extract_dc;
pub mod extract_dmv;
pub mod extract_orgs;
pub mod sync_country;

pub use add_uk_contacts::AddUkContactsJob;
pub use assign_countries::AssignCountriesJob;
pub use extract_dc::ExtractDcJob;
pub use extract_dmv::ExtractDmvJob;
pub use extract_orgs::ExtractOrgsJob;
pub use sync_country::SyncCountryJob;

use crate::core::engine::report_progress;
use crate::core::export::{dated_filename, write_csv};
use crate::domain::model::{JobReport, Member, ReportKind};
use crate::domain::ports::{MemberApi, Storage};
use crate::utils::error::Result;
use chrono::NaiveDate;
use serde::Serialize;

pub const PROGRESS_EVERY: usize = 50;

/// A planned `COUNTRY` write for one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryUpdate {
    pub id: String,
    pub email: String,
    pub country: String,
    /// Why this country was chosen (inference reason or source country code).
    pub reason: String,
}

pub(crate) async fn fetch_members<C: MemberApi>(client: &C) -> Result<Vec<Member>> {
    println!("Fetching all subscribers...");
    let members = client.fetch_all_members().await?;
    println!("Found {} total members\n", members.len());
    Ok(members)
}

/// PATCH each update in turn; failures are counted, never fatal.
pub(crate) async fn apply_country_updates<C: MemberApi>(
    client: &C,
    updates: &[CountryUpdate],
) -> JobReport {
    println!("\nUpdating subscribers...");
    let mut report = JobReport::default();

    for update in updates {
        match client.set_member_country(&update.id, &update.country).await {
            Ok(()) => {
                report.updated += 1;
                report_progress(report.updated, updates.len(), PROGRESS_EVERY);
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!("Failed to update {}: {}", update.email, e);
                println!("  ✗ Failed: {}", update.email);
            }
        }
    }

    report
}

/// Write `rows` to `{prefix}_{date}.csv` through `storage`.
pub(crate) async fn export_rows<S: Storage, T: Serialize>(
    storage: &S,
    prefix: &str,
    date: NaiveDate,
    columns: &[&str],
    rows: &[T],
) -> Result<JobReport> {
    let filename = dated_filename(prefix, date);
    let data = write_csv(columns, rows)?;
    let path = storage.write_file(&filename, &data).await?;
    tracing::info!("Exported {} rows to {}", rows.len(), path);

    Ok(JobReport {
        kind: ReportKind::Export,
        exported: rows.len(),
        output_path: Some(path),
        ..Default::default()
    })
}

/// First `limit` characters of `text`.
pub(crate) fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
