use crate::core::audience::{segment_opts, AudienceType};
use crate::domain::model::{CampaignSettingsPatch, UploadResult};
use crate::domain::ports::CampaignApi;
use crate::utils::error::{NewsletterError, Result};
use std::path::Path;

/// Optional settings for [`NewsletterUploader::update`].
#[derive(Debug, Clone, Default)]
pub struct CampaignEdits {
    pub subject: Option<String>,
    pub preview_text: Option<String>,
    pub title: Option<String>,
    pub from_name: Option<String>,
}

/// Turns a newsletter HTML file into a draft campaign.
pub struct NewsletterUploader<C: CampaignApi> {
    client: C,
}

impl<C: CampaignApi> NewsletterUploader<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn upload(
        &self,
        html_file: &Path,
        audience: AudienceType,
        subject: &str,
        preview_text: &str,
        title: Option<&str>,
    ) -> Result<UploadResult> {
        let html = read_html(html_file)?;

        let title = match title {
            Some(title) => title.to_string(),
            None => file_stem(html_file),
        };

        let campaign = self
            .client
            .create_campaign(subject, preview_text, &title, segment_opts(audience))
            .await?;
        tracing::info!("Created campaign {} (web id {})", campaign.id, campaign.web_id);

        self.client.upload_content(&campaign.id, &html).await?;

        Ok(UploadResult {
            campaign_id: campaign.id,
            web_id: campaign.web_id,
        })
    }

    pub async fn update(
        &self,
        campaign_id: &str,
        html_file: &Path,
        edits: CampaignEdits,
    ) -> Result<UploadResult> {
        let html = read_html(html_file)?;

        // from_name alone does not trigger a settings update, nor do empty strings
        let has_settings = [&edits.subject, &edits.preview_text, &edits.title]
            .into_iter()
            .any(|field| field.as_deref().is_some_and(|value| !value.is_empty()));
        if has_settings {
            let patch = CampaignSettingsPatch {
                subject_line: edits.subject,
                preview_text: edits.preview_text,
                title: edits.title,
                from_name: edits.from_name,
            };
            self.client.update_campaign(campaign_id, patch).await?;
        }

        self.client.upload_content(campaign_id, &html).await?;

        let campaign = self.client.get_campaign(campaign_id).await?;
        tracing::info!("Updated campaign {} (web id {})", campaign_id, campaign.web_id);

        Ok(UploadResult {
            campaign_id: campaign_id.to_string(),
            web_id: campaign.web_id,
        })
    }
}

fn read_html(html_file: &Path) -> Result<String> {
    if !html_file.exists() {
        return Err(NewsletterError::FileNotFound {
            path: html_file.display().to_string(),
        });
    }
    Ok(std::fs::read_to_string(html_file)?)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
