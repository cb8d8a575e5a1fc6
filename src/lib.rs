pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::LocalStorage;
pub use config::Settings;
pub use core::audience::AudienceType;
pub use core::client::MailchimpClient;
pub use core::engine::{AutoConfirm, JobEngine, PromptConfirm, RunOutcome};
pub use core::uploader::{CampaignEdits, NewsletterUploader};
pub use utils::error::{NewsletterError, Result};
