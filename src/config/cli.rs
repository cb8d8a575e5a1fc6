use crate::config::settings::Settings;
use crate::core::audience::AudienceType;
use crate::core::client::MailchimpClient;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Connection options shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct MailchimpArgs {
    /// Mailchimp API key
    #[arg(long, env = "MAILCHIMP_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Mailchimp audience (list) id
    #[arg(long, env = "MAILCHIMP_LIST_ID", global = true)]
    pub list_id: Option<String>,

    /// Settings file layered over the bundled defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "MAILCHIMP_BASE_URL", hide = true, global = true)]
    pub base_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl MailchimpArgs {
    pub fn settings(&self) -> Result<Settings> {
        let settings = Settings::load(self.config.as_deref())?;
        settings.validate()?;
        Ok(settings)
    }

    /// `--api-key`/env first, then the settings file.
    pub fn resolve_api_key<'a>(&'a self, settings: &'a Settings) -> Option<&'a str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .or_else(|| settings.api_key())
    }

    pub fn client(&self, settings: &Settings) -> Result<MailchimpClient> {
        let resolved = self.resolve_api_key(settings);
        let api_key = *validation::validate_required_field("MAILCHIMP_API_KEY", &resolved)?;
        validation::validate_api_key("api_key", api_key)?;

        let list_id = self
            .list_id
            .as_deref()
            .unwrap_or(&settings.mailchimp.list_id);
        validation::validate_non_empty_string("list_id", list_id)?;

        let mut client = MailchimpClient::new(api_key, list_id)
            .with_page_size(settings.mailchimp.page_size)
            .with_sender(settings.campaign.clone());

        if let Some(base_url) = self.base_url.as_deref().or(settings.mailchimp.base_url.as_deref()) {
            validation::validate_url("base_url", base_url)?;
            client = client.with_base_url(base_url);
        }
        tracing::debug!("Using Mailchimp API at {}", client.base_url());
        Ok(client)
    }
}

fn existing_file(value: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("file '{}' does not exist", value))
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "upload-newsletter")]
#[command(about = "Upload a newsletter HTML file to Mailchimp as a draft campaign")]
pub struct UploadArgs {
    /// Newsletter HTML file
    #[arg(value_parser = existing_file)]
    pub html_file: PathBuf,

    /// Target audience (required when creating a campaign)
    #[arg(long, value_enum, ignore_case = true)]
    pub audience: Option<AudienceType>,

    /// Email subject line
    #[arg(long)]
    pub subject: String,

    /// Preview text shown in inboxes
    #[arg(long)]
    pub preview: String,

    /// Internal campaign title (defaults to the file name)
    #[arg(long)]
    pub title: Option<String>,

    /// Update this existing draft instead of creating a new one
    #[arg(long)]
    pub campaign_id: Option<String>,

    #[command(flatten)]
    pub mailchimp: MailchimpArgs,
}

impl Validate for UploadArgs {
    fn validate(&self) -> Result<()> {
        validation::validate_path("html_file", &self.html_file.to_string_lossy())?;
        if let Some(campaign_id) = &self.campaign_id {
            validation::validate_non_empty_string("campaign_id", campaign_id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "subscriber-tools")]
#[command(about = "Classify, update and export Mailchimp subscribers")]
pub struct SubscriberToolsArgs {
    #[command(subcommand)]
    pub command: JobCommand,

    /// Apply updates without asking for confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Directory CSV exports are written to
    #[arg(long, default_value = ".", global = true)]
    pub output_dir: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(flatten)]
    pub mailchimp: MailchimpArgs,
}

#[derive(Debug, Clone, Subcommand)]
pub enum JobCommand {
    /// Infer COUNTRY from email domains and tags
    AssignCountries,
    /// Copy Mailchimp's predicted country into empty COUNTRY fields
    SyncCountry,
    /// Add or update contacts from a CSV as UK subscribers
    AddUkContacts {
        /// CSV with `email` and `first_name` columns
        #[arg(long, default_value = "uk_contacts.csv")]
        csv: PathBuf,
    },
    /// Export subscribers located in Washington DC
    ExtractDc,
    /// Export DC/Maryland/Virginia subscribers by location or employer
    ExtractDmv,
    /// Export subscribers working at DC-based organizations
    ExtractOrgs,
}

impl JobCommand {
    /// Whether the job writes back to Mailchimp.
    pub fn writes_members(&self) -> bool {
        matches!(
            self,
            Self::AssignCountries | Self::SyncCountry | Self::AddUkContacts { .. }
        )
    }
}

impl Validate for SubscriberToolsArgs {
    fn validate(&self) -> Result<()> {
        validation::validate_path("output_dir", &self.output_dir)?;
        if let JobCommand::AddUkContacts { csv } = &self.command {
            validation::validate_path("csv", &csv.to_string_lossy())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::NewsletterError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn html_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"<html></html>").unwrap();
        file
    }

    #[test]
    fn test_upload_args_parse() {
        let file = html_file();
        let path = file.path().to_str().unwrap();

        let args = UploadArgs::try_parse_from([
            "upload-newsletter",
            path,
            "--audience",
            "UK",
            "--subject",
            "Hello",
            "--preview",
            "Preview",
            "--api-key",
            "abc-us1",
        ])
        .unwrap();

        assert_eq!(args.audience, Some(AudienceType::Uk));
        assert_eq!(args.subject, "Hello");
        assert_eq!(args.mailchimp.api_key.as_deref(), Some("abc-us1"));
        assert!(args.campaign_id.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_upload_args_reject_missing_file() {
        let result = UploadArgs::try_parse_from([
            "upload-newsletter",
            "/definitely/not/here.html",
            "--subject",
            "s",
            "--preview",
            "p",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_upload_args_reject_unknown_audience() {
        let file = html_file();
        let result = UploadArgs::try_parse_from([
            "upload-newsletter",
            file.path().to_str().unwrap(),
            "--audience",
            "fr",
            "--subject",
            "s",
            "--preview",
            "p",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_subscriber_tools_subcommands() {
        let args = SubscriberToolsArgs::try_parse_from([
            "subscriber-tools",
            "add-uk-contacts",
            "--csv",
            "contacts.csv",
            "--yes",
        ])
        .unwrap();

        assert!(args.yes);
        assert!(args.command.writes_members());
        match args.command {
            JobCommand::AddUkContacts { csv } => assert_eq!(csv, PathBuf::from("contacts.csv")),
            other => panic!("unexpected command {:?}", other),
        }

        let args =
            SubscriberToolsArgs::try_parse_from(["subscriber-tools", "extract-dmv"]).unwrap();
        assert!(!args.command.writes_members());
        assert_eq!(args.output_dir, ".");
    }

    #[test]
    fn test_api_key_flag_wins_over_settings() {
        let settings = Settings::from_toml_str("[mailchimp]\napi_key = \"file-us2\"\n").unwrap();
        let mut args = MailchimpArgs {
            api_key: None,
            list_id: None,
            config: None,
            base_url: None,
            verbose: false,
        };
        assert_eq!(args.resolve_api_key(&settings), Some("file-us2"));

        args.api_key = Some("flag-us9".to_string());
        assert_eq!(args.resolve_api_key(&settings), Some("flag-us9"));
    }

    #[test]
    fn test_client_requires_api_key() {
        let settings = Settings::bundled().unwrap();
        let args = MailchimpArgs {
            api_key: None,
            list_id: Some("list".to_string()),
            config: None,
            base_url: None,
            verbose: false,
        };

        let err = args.client(&settings).unwrap_err();
        assert!(matches!(err, NewsletterError::MissingConfigError { .. }));
    }

    #[test]
    fn test_client_uses_overrides() {
        let settings = Settings::bundled().unwrap();
        let args = MailchimpArgs {
            api_key: Some("abc-us3".to_string()),
            list_id: Some("list-9".to_string()),
            config: None,
            base_url: Some("http://127.0.0.1:9999/3.0/".to_string()),
            verbose: false,
        };

        let client = args.client(&settings).unwrap();
        assert_eq!(client.list_id(), "list-9");
        assert_eq!(client.base_url(), "http://127.0.0.1:9999/3.0");
    }
}
