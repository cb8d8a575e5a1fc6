use anyhow::Context;
use clap::Parser;
use newsletter_tools::app::jobs::{
    AddUkContactsJob, AssignCountriesJob, ExtractDcJob, ExtractDmvJob, ExtractOrgsJob,
    SyncCountryJob,
};
use newsletter_tools::config::{JobCommand, SubscriberToolsArgs};
use newsletter_tools::core::engine::Confirmer;
use newsletter_tools::core::export::today;
use newsletter_tools::domain::ports::Job;
use newsletter_tools::utils::{logger, validation::Validate};
use newsletter_tools::{
    AutoConfirm, JobEngine, LocalStorage, NewsletterError, PromptConfirm, RunOutcome,
};
use std::process;

#[tokio::main]
async fn main() {
    let args = SubscriberToolsArgs::parse();

    if args.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.mailchimp.verbose);
    }

    if let Err(e) = run(args).await {
        process::exit(report_failure(&e));
    }
}

async fn run(args: SubscriberToolsArgs) -> anyhow::Result<()> {
    args.validate().context("invalid arguments")?;

    let settings = args
        .mailchimp
        .settings()
        .context("could not load settings")?;
    let client = args.mailchimp.client(&settings)?;

    let confirmer: Box<dyn Confirmer> = if args.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptConfirm)
    };
    let storage = LocalStorage::new(args.output_dir.clone());
    let date = today();

    tracing::info!("Running {:?} against list {}", args.command, client.list_id());
    if !args.command.writes_members() {
        tracing::debug!("Exports go to {}", args.output_dir);
    }

    let outcome = match args.command {
        JobCommand::AssignCountries => {
            let job = AssignCountriesJob::new(client, settings.country_mapping);
            run_job(job, confirmer.as_ref()).await?
        }
        JobCommand::SyncCountry => {
            let job = SyncCountryJob::new(client, settings.country_codes);
            run_job(job, confirmer.as_ref()).await?
        }
        JobCommand::AddUkContacts { csv } => {
            let inputs = LocalStorage::new(".".to_string());
            let job = AddUkContactsJob::new(client, inputs, csv.to_string_lossy());
            run_job(job, confirmer.as_ref())
                .await
                .with_context(|| format!("processing {}", csv.display()))?
        }
        JobCommand::ExtractDc => {
            let job = ExtractDcJob::new(client, storage, date);
            run_job(job, confirmer.as_ref()).await?
        }
        JobCommand::ExtractDmv => {
            let job = ExtractDmvJob::new(client, storage, settings.dc_organizations, date);
            run_job(job, confirmer.as_ref()).await?
        }
        JobCommand::ExtractOrgs => {
            let job = ExtractOrgsJob::new(client, storage, settings.dc_organizations, date);
            run_job(job, confirmer.as_ref()).await?
        }
    };

    if let RunOutcome::Completed(report) = outcome {
        if report.failed > 0 {
            tracing::warn!("{} subscribers could not be updated", report.failed);
        }
    }
    Ok(())
}

async fn run_job<J: Job>(job: J, confirmer: &dyn Confirmer) -> Result<RunOutcome, NewsletterError> {
    JobEngine::new(job).run(confirmer).await
}

/// Print the failure and pick an exit code from its severity.
fn report_failure(e: &anyhow::Error) -> i32 {
    let Some(error) = e.downcast_ref::<NewsletterError>() else {
        eprintln!("❌ Error: {:#}", e);
        return 1;
    };

    tracing::error!(
        "{:#} (category: {:?}, severity: {:?})",
        e,
        error.category(),
        error.severity()
    );
    eprintln!("❌ Error: {}", error.user_friendly_message());
    eprintln!("💡 {}", error.recovery_suggestion());

    error.severity().exit_code()
}
