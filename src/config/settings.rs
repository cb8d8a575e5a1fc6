use crate::utils::error::{NewsletterError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

const BUNDLED_SETTINGS: &str = include_str!("../../config/newsletter-tools.toml");

pub const DEFAULT_LIST_ID: &str = "71ed1f89d8";
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub mailchimp: MailchimpSettings,
    pub campaign: CampaignDefaults,
    pub country_mapping: CountryMapping,
    pub country_codes: BTreeMap<String, String>,
    pub dc_organizations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailchimpSettings {
    pub api_key: Option<String>,
    #[serde(default = "default_list_id")]
    pub list_id: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignDefaults {
    pub from_name: String,
    pub reply_to: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryMapping {
    #[serde(default)]
    pub us_tags: Vec<String>,
    #[serde(default)]
    pub uk_organizations: Vec<String>,
    #[serde(default)]
    pub us_organizations: Vec<String>,
}

/// Shape of a user settings file: every section optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialSettings {
    mailchimp: Option<MailchimpSettings>,
    campaign: Option<CampaignDefaults>,
    country_mapping: Option<CountryMapping>,
    country_codes: Option<BTreeMap<String, String>>,
    dc_organizations: Option<BTreeMap<String, String>>,
}

fn default_list_id() -> String {
    DEFAULT_LIST_ID.to_string()
}

fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}

impl Settings {
    /// Settings compiled into the binary.
    pub fn bundled() -> Result<Self> {
        let partial = parse_partial(BUNDLED_SETTINGS)?;
        Self::from_partial(partial).ok_or_else(|| NewsletterError::ConfigError {
            message: "bundled settings are incomplete".to_string(),
        })
    }

    /// Bundled settings with the sections of `path` layered on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = Self::bundled()?;
        if let Some(path) = path {
            tracing::debug!("Loading settings overrides from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            settings.apply(parse_partial(&content)?);
        }
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut settings = Self::bundled()?;
        settings.apply(parse_partial(content)?);
        Ok(settings)
    }

    fn from_partial(partial: PartialSettings) -> Option<Self> {
        Some(Self {
            mailchimp: partial.mailchimp?,
            campaign: partial.campaign?,
            country_mapping: partial.country_mapping?,
            country_codes: partial.country_codes?,
            dc_organizations: partial.dc_organizations?,
        })
    }

    fn apply(&mut self, partial: PartialSettings) {
        if let Some(mailchimp) = partial.mailchimp {
            self.mailchimp = mailchimp;
        }
        if let Some(campaign) = partial.campaign {
            self.campaign = campaign;
        }
        if let Some(mapping) = partial.country_mapping {
            self.country_mapping = mapping;
        }
        if let Some(codes) = partial.country_codes {
            self.country_codes = codes;
        }
        if let Some(orgs) = partial.dc_organizations {
            self.dc_organizations = orgs;
        }
    }

    /// API key from the settings file, ignoring unresolved `${VAR}` placeholders.
    pub fn api_key(&self) -> Option<&str> {
        self.mailchimp
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty() && !key.contains("${"))
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("mailchimp.list_id", &self.mailchimp.list_id)?;
        validation::validate_range("mailchimp.page_size", self.mailchimp.page_size, 1, MAX_PAGE_SIZE)?;
        if let Some(base_url) = &self.mailchimp.base_url {
            validation::validate_url("mailchimp.base_url", base_url)?;
        }
        if let Some(api_key) = self.api_key() {
            validation::validate_api_key("mailchimp.api_key", api_key)?;
        }
        validation::validate_non_empty_string("campaign.from_name", &self.campaign.from_name)?;
        validation::validate_non_empty_string("campaign.reply_to", &self.campaign.reply_to)?;
        Ok(())
    }
}

fn parse_partial(content: &str) -> Result<PartialSettings> {
    let processed = substitute_env_vars(content);
    toml::from_str(&processed).map_err(|e| NewsletterError::ConfigError {
        message: format!("TOML parsing error: {}", e),
    })
}

/// Replace `${VAR}` with the environment value; unset variables stay verbatim.
fn substitute_env_vars(content: &str) -> String {
    static ENV_REF: OnceLock<Regex> = OnceLock::new();
    let re = ENV_REF.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}
