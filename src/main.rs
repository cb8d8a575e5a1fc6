use clap::Parser;
use newsletter_tools::config::UploadArgs;
use newsletter_tools::core::client::campaign_edit_url;
use newsletter_tools::domain::model::UploadResult;
use newsletter_tools::utils::{logger, validation::Validate};
use newsletter_tools::{CampaignEdits, NewsletterError, NewsletterUploader, Result, Settings};
use std::process;

const BANNER_WIDTH: usize = 60;

#[tokio::main]
async fn main() {
    let args = UploadArgs::parse();
    logger::init_cli_logger(args.mailchimp.verbose);
    tracing::debug!("Newsletter file: {}", args.html_file.display());

    let settings = match args.mailchimp.settings() {
        Ok(settings) => settings,
        Err(e) => fail(&e),
    };

    if args.mailchimp.resolve_api_key(&settings).is_none() {
        eprintln!(
            "Error: MAILCHIMP_API_KEY not found. Set it via --api-key or environment variable."
        );
        process::exit(1);
    }

    if args.campaign_id.is_none() && args.audience.is_none() {
        eprintln!("Error: --audience is required when creating a new campaign.");
        process::exit(1);
    }

    if let Err(e) = args.validate() {
        fail(&e);
    }

    print_header(&args);

    if let Err(e) = run(&args, &settings).await {
        fail(&e);
    }
}

fn fail(e: &NewsletterError) -> ! {
    tracing::error!(
        "upload failed: {} (category: {:?}, severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::debug!("Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ Error: {}", e);
    process::exit(1);
}

fn print_header(args: &UploadArgs) {
    match (&args.campaign_id, args.audience) {
        (Some(campaign_id), _) => {
            println!("📧 Updating Mailchimp draft campaign");
            println!("   Campaign ID: {}", campaign_id);
        }
        (None, Some(audience)) => {
            println!("📧 Creating Mailchimp draft campaign");
            println!("   Audience: {}", audience.as_str().to_uppercase());
        }
        (None, None) => {}
    }
    println!("   File: {}", args.html_file.display());
    println!("   Subject: {}", args.subject);
    println!();
}

async fn run(args: &UploadArgs, settings: &Settings) -> Result<()> {
    let client = args.mailchimp.client(settings)?;
    let api_key = client.api_key().to_string();
    let uploader = NewsletterUploader::new(client);

    println!("Reading HTML file...");
    let html = std::fs::read_to_string(&args.html_file)?;
    println!("✓ Read {} characters", html.chars().count());

    let (result, success_message): (UploadResult, &str) = match (&args.campaign_id, args.audience) {
        (Some(campaign_id), _) => {
            println!("\nUpdating campaign...");
            let edits = CampaignEdits {
                subject: Some(args.subject.clone()),
                preview_text: Some(args.preview.clone()),
                title: args.title.clone(),
                from_name: None,
            };
            let result = uploader.update(campaign_id, &args.html_file, edits).await?;
            println!("✓ Campaign updated (ID: {})", campaign_id);
            (result, "✅ DRAFT CAMPAIGN UPDATED SUCCESSFULLY")
        }
        (None, Some(audience)) => {
            println!("\nCreating campaign...");
            let result = uploader
                .upload(
                    &args.html_file,
                    audience,
                    &args.subject,
                    &args.preview,
                    args.title.as_deref(),
                )
                .await?;
            println!("✓ Campaign created (ID: {})", result.campaign_id);
            (result, "✅ DRAFT CAMPAIGN CREATED SUCCESSFULLY")
        }
        (None, None) => {
            return Err(NewsletterError::MissingConfigError {
                field: "audience".to_string(),
            })
        }
    };

    println!("\n{}", "=".repeat(BANNER_WIDTH));
    println!("{}", success_message);
    println!("{}", "=".repeat(BANNER_WIDTH));
    println!("Campaign ID: {}", result.campaign_id);
    println!("Web ID: {}", result.web_id);
    if let (None, Some(audience)) = (&args.campaign_id, args.audience) {
        println!("Audience: {}", audience.as_str().to_uppercase());
    }
    println!("Subject: {}", args.subject);

    println!("\n🔗 Edit in Mailchimp:");
    println!("   {}", campaign_edit_url(&api_key, result.web_id));
    println!("\n⚠️  This is a DRAFT - not sent yet. Review and send from Mailchimp.");

    Ok(())
}
