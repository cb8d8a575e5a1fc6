#[cfg(feature = "cli")]
pub mod cli;
pub mod settings;

#[cfg(feature = "cli")]
pub use cli::{JobCommand, MailchimpArgs, SubscriberToolsArgs, UploadArgs};
pub use settings::{CampaignDefaults, CountryMapping, Settings};
