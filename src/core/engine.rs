use crate::domain::model::{JobReport, ReportKind};
use crate::domain::ports::{Job, JobPlan};
use crate::utils::error::{NewsletterError, Result};
use std::io::{self, BufRead, Write};

pub const RULE_WIDTH: usize = 70;

/// Asks the operator whether to go ahead with the pending writes.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, pending_writes: usize) -> Result<bool>;
}

/// `--yes`: proceed without asking.
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&self, pending_writes: usize) -> Result<bool> {
        println!(
            "Auto-confirming update of {} subscribers (--yes flag)",
            pending_writes
        );
        Ok(true)
    }
}

/// Interactive prompt on stdin; only "yes" proceeds.
pub struct PromptConfirm;

impl Confirmer for PromptConfirm {
    fn confirm(&self, pending_writes: usize) -> Result<bool> {
        print!("Update {} subscribers? (yes/no): ", pending_writes);
        io::stdout().flush()?;

        let mut answer = String::new();
        let read = io::stdin().lock().read_line(&mut answer)?;
        if read == 0 {
            println!();
            return Err(NewsletterError::ConfirmationUnavailable);
        }
        Ok(is_yes(&answer))
    }
}

pub fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(JobReport),
    Cancelled,
}

pub struct JobEngine<J: Job> {
    job: J,
}

impl<J: Job> JobEngine<J> {
    pub fn new(job: J) -> Self {
        Self { job }
    }

    pub async fn run(&self, confirmer: &dyn Confirmer) -> Result<RunOutcome> {
        tracing::info!("Starting job {}", self.job.name());

        let input = self.job.extract().await?;
        let plan = self.job.transform(input)?;
        println!("{}", plan.summary());

        let pending = plan.pending_writes();
        if pending > 0 {
            println!("\n{}", "=".repeat(RULE_WIDTH));
            if !confirmer.confirm(pending)? {
                println!("Cancelled.");
                tracing::info!("Job {} cancelled by operator", self.job.name());
                return Ok(RunOutcome::Cancelled);
            }
        }

        let report = self.job.load(plan).await?;
        println!("{}", render_report(&report));
        tracing::info!(
            "Job {} finished: {} added, {} updated, {} failed",
            self.job.name(),
            report.added,
            report.updated,
            report.failed
        );

        Ok(RunOutcome::Completed(report))
    }
}

pub fn render_report(report: &JobReport) -> String {
    let mut lines = Vec::new();

    match report.kind {
        ReportKind::Export => {
            if let Some(path) = &report.output_path {
                lines.push(format!(
                    "\n✅ Exported {} subscribers to {}",
                    report.exported, path
                ));
            }
        }
        ReportKind::Writes => {
            lines.push("\n✅ Complete!".to_string());
            if report.added > 0 {
                lines.push(format!("   Added: {}", report.added));
            }
            lines.push(format!("   Success: {}", report.updated + report.added));
            if report.unchanged > 0 {
                lines.push(format!("   Already set: {}", report.unchanged));
            }
            lines.push(format!("   Failed: {}", report.failed));
        }
        ReportKind::Tally => {
            lines.push(format!("\n{}", "=".repeat(RULE_WIDTH)));
            lines.push("✅ COMPLETE".to_string());
            lines.push("=".repeat(RULE_WIDTH));
            lines.extend(report.notes.iter().cloned());
            return lines.join("\n");
        }
    }

    if !report.notes.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(report.notes.iter().cloned());
    }

    lines.join("\n")
}

/// Print a progress line after every `every` completed writes.
pub fn report_progress(done: usize, total: usize, every: usize) {
    if every > 0 && done % every == 0 {
        println!("  Progress: {}/{}...", done, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingPlan {
        writes: usize,
    }

    impl JobPlan for CountingPlan {
        fn summary(&self) -> String {
            format!("{} writes planned", self.writes)
        }

        fn pending_writes(&self) -> usize {
            self.writes
        }
    }

    struct FakeJob {
        writes: usize,
        loaded: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Job for FakeJob {
        type Input = usize;
        type Plan = CountingPlan;

        fn name(&self) -> &str {
            "fake"
        }

        async fn extract(&self) -> Result<usize> {
            Ok(self.writes)
        }

        fn transform(&self, input: usize) -> Result<CountingPlan> {
            Ok(CountingPlan { writes: input })
        }

        async fn load(&self, plan: CountingPlan) -> Result<JobReport> {
            self.loaded.fetch_add(1, Ordering::SeqCst);
            Ok(JobReport {
                updated: plan.writes,
                ..Default::default()
            })
        }
    }

    struct Answer {
        yes: bool,
        asked: AtomicUsize,
    }

    impl Answer {
        fn new(yes: bool) -> Self {
            Self {
                yes,
                asked: AtomicUsize::new(0),
            }
        }
    }

    impl Confirmer for Answer {
        fn confirm(&self, _pending_writes: usize) -> Result<bool> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            Ok(self.yes)
        }
    }

    struct NoTerminal;

    impl Confirmer for NoTerminal {
        fn confirm(&self, _pending_writes: usize) -> Result<bool> {
            Err(NewsletterError::ConfirmationUnavailable)
        }
    }

    fn job(writes: usize) -> (FakeJob, Arc<AtomicUsize>) {
        let loaded = Arc::new(AtomicUsize::new(0));
        (
            FakeJob {
                writes,
                loaded: loaded.clone(),
            },
            loaded,
        )
    }

    #[tokio::test]
    async fn test_confirmed_run_loads_plan() {
        let (job, loaded) = job(3);
        let answer = Answer::new(true);

        let outcome = JobEngine::new(job).run(&answer).await.unwrap();

        assert_eq!(loaded.load(Ordering::SeqCst), 1);
        assert_eq!(answer.asked.load(Ordering::SeqCst), 1);
        match outcome {
            RunOutcome::Completed(report) => assert_eq!(report.updated, 3),
            RunOutcome::Cancelled => panic!("expected completion"),
        }
    }

    #[tokio::test]
    async fn test_declined_run_writes_nothing() {
        let (job, loaded) = job(3);

        let outcome = JobEngine::new(job).run(&Answer::new(false)).await.unwrap();

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert_eq!(loaded.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plan_without_writes_skips_confirmation() {
        let (job, loaded) = job(0);
        let answer = Answer::new(false);

        JobEngine::new(job).run(&answer).await.unwrap();

        assert_eq!(answer.asked.load(Ordering::SeqCst), 0);
        assert_eq!(loaded.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_terminal_is_an_error() {
        let (job, loaded) = job(2);

        let err = JobEngine::new(job).run(&NoTerminal).await.unwrap_err();

        assert!(err.to_string().contains("--yes"));
        assert_eq!(loaded.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("yes\n"));
        assert!(is_yes("  YES "));
        assert!(!is_yes("y"));
        assert!(!is_yes("no"));
        assert!(!is_yes(""));
    }

    #[test]
    fn test_render_report_for_updates() {
        let report = JobReport {
            updated: 4,
            failed: 1,
            notes: vec!["   UK: 2".to_string()],
            ..Default::default()
        };
        let rendered = render_report(&report);

        assert!(rendered.contains("✅ Complete!"));
        assert!(rendered.contains("   Success: 4"));
        assert!(rendered.contains("   Failed: 1"));
        assert!(rendered.ends_with("   UK: 2"));
        assert!(!rendered.contains("Added"));
    }

    #[test]
    fn test_render_report_for_tally_prints_only_notes() {
        let report = JobReport {
            kind: ReportKind::Tally,
            added: 1,
            notes: vec!["Added new subscribers: 1".to_string()],
            ..Default::default()
        };
        let rendered = render_report(&report);

        assert!(rendered.contains("✅ COMPLETE"));
        assert!(rendered.ends_with("Added new subscribers: 1"));
        assert!(!rendered.contains("Success"));
        assert!(!rendered.contains("   Added: 1"));
    }

    #[test]
    fn test_render_report_for_export() {
        let report = JobReport {
            kind: ReportKind::Export,
            exported: 12,
            output_path: Some("out/dc_subscribers_2025-01-01.csv".to_string()),
            ..Default::default()
        };

        assert_eq!(
            render_report(&report),
            "\n✅ Exported 12 subscribers to out/dc_subscribers_2025-01-01.csv"
        );
    }

    #[test]
    fn test_render_report_for_empty_export() {
        let report = JobReport {
            kind: ReportKind::Export,
            notes: vec!["No DC-based subscribers found.".to_string()],
            ..Default::default()
        };

        assert_eq!(render_report(&report), "No DC-based subscribers found.");
    }
}
