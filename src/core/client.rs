use crate::config::settings::{CampaignDefaults, MAX_PAGE_SIZE};
use crate::domain::model::{
    AddMemberOutcome, ApiProblem, Campaign, CampaignRecipients, CampaignSettings,
    CampaignSettingsPatch, Member, MembersPage, NewCampaign, SegmentOpts,
};
use crate::domain::ports::{CampaignApi, MemberApi};
use crate::utils::error::{NewsletterError, Result};
use async_trait::async_trait;
use md5::{Digest, Md5};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

/// Basic-auth user name; Mailchimp only checks the password (the API key).
const AUTH_USER: &str = "anystring";

/// Datacenter suffix of a Mailchimp API key (`"abc-us5"` -> `"us5"`).
pub fn datacenter(api_key: &str) -> &str {
    api_key.rsplit('-').next().unwrap_or(api_key)
}

/// Member id Mailchimp derives from an address: MD5 of the lower-cased email.
pub fn subscriber_hash(email: &str) -> String {
    let digest = Md5::digest(email.to_lowercase().as_bytes());
    format!("{:x}", digest)
}

/// Link to the campaign editor in the Mailchimp web app.
pub fn campaign_edit_url(api_key: &str, web_id: u64) -> String {
    format!(
        "https://{}.admin.mailchimp.com/campaigns/edit?id={}",
        datacenter(api_key),
        web_id
    )
}

#[derive(Debug, Clone)]
pub struct MailchimpClient {
    client: Client,
    api_key: String,
    list_id: String,
    base_url: String,
    page_size: usize,
    sender: CampaignDefaults,
}

impl MailchimpClient {
    pub fn new(api_key: &str, list_id: &str) -> Self {
        let base_url = format!("https://{}.api.mailchimp.com/3.0", datacenter(api_key));
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            list_id: list_id.to_string(),
            base_url,
            page_size: MAX_PAGE_SIZE,
            sender: CampaignDefaults {
                from_name: "PolicyEngine".to_string(),
                reply_to: "hello@policyengine.org".to_string(),
            },
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_sender(mut self, sender: CampaignDefaults) -> Self {
        self.sender = sender;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn list_id(&self) -> &str {
        &self.list_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn member_url(&self, member_id: &str) -> String {
        self.url(&format!("/lists/{}/members/{}", self.list_id, member_id))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .basic_auth(AUTH_USER, Some(&self.api_key))
            .send()
            .await?;
        tracing::debug!(
            "{} -> {}",
            response.url().path(),
            response.status()
        );
        Ok(response)
    }

    /// Send and decode a 200 response; anything else becomes an `ApiError`.
    async fn send_expecting<T: DeserializeOwned>(
        &self,
        action: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.expect_ok(action, request).await?;
        Ok(response.json().await?)
    }

    async fn expect_ok(&self, action: &str, request: RequestBuilder) -> Result<Response> {
        let response = self.send(request).await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NewsletterError::api(action, status.as_u16(), body));
        }
        Ok(response)
    }
}

#[async_trait]
impl CampaignApi for MailchimpClient {
    async fn create_campaign(
        &self,
        subject: &str,
        preview_text: &str,
        title: &str,
        segment_opts: Option<SegmentOpts>,
    ) -> Result<Campaign> {
        let campaign = NewCampaign {
            campaign_type: "regular".to_string(),
            recipients: CampaignRecipients {
                list_id: self.list_id.clone(),
                segment_opts,
            },
            settings: CampaignSettings {
                subject_line: subject.to_string(),
                preview_text: preview_text.to_string(),
                title: title.to_string(),
                from_name: self.sender.from_name.clone(),
                reply_to: self.sender.reply_to.clone(),
                auto_footer: false,
                inline_css: false,
            },
        };

        tracing::debug!("Creating campaign '{}' on list {}", title, self.list_id);
        let request = self.client.post(self.url("/campaigns")).json(&campaign);
        self.send_expecting("creating campaign", request).await
    }

    async fn upload_content(&self, campaign_id: &str, html: &str) -> Result<()> {
        tracing::debug!("Uploading {} bytes of HTML to {}", html.len(), campaign_id);
        let request = self
            .client
            .put(self.url(&format!("/campaigns/{}/content", campaign_id)))
            .json(&serde_json::json!({ "html": html }));
        self.expect_ok("uploading content", request).await?;
        Ok(())
    }

    async fn update_campaign(
        &self,
        campaign_id: &str,
        settings: CampaignSettingsPatch,
    ) -> Result<Campaign> {
        let body = if settings.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::json!({ "settings": settings })
        };

        let request = self
            .client
            .patch(self.url(&format!("/campaigns/{}", campaign_id)))
            .json(&body);
        self.send_expecting("updating campaign", request).await
    }

    async fn get_campaign(&self, campaign_id: &str) -> Result<Campaign> {
        let request = self
            .client
            .get(self.url(&format!("/campaigns/{}", campaign_id)));
        self.send_expecting("getting campaign", request).await
    }
}

#[async_trait]
impl MemberApi for MailchimpClient {
    async fn fetch_all_members(&self) -> Result<Vec<Member>> {
        let mut all_members = Vec::new();
        let mut offset = 0;

        loop {
            let request = self
                .client
                .get(self.url(&format!("/lists/{}/members", self.list_id)))
                .query(&[("count", self.page_size), ("offset", offset)]);
            let page: MembersPage = self.send_expecting("fetching members", request).await?;

            let fetched = page.members.len();
            tracing::debug!("Fetched {} members at offset {}", fetched, offset);
            if fetched == 0 {
                break;
            }
            all_members.extend(page.members);

            if fetched < self.page_size {
                break;
            }
            offset += self.page_size;
        }

        tracing::info!("Fetched {} members from list {}", all_members.len(), self.list_id);
        Ok(all_members)
    }

    async fn get_member(&self, email: &str) -> Result<Option<Member>> {
        let request = self.client.get(self.member_url(&subscriber_hash(email)));
        let response = self.send(request).await?;
        if response.status() != StatusCode::OK {
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    async fn set_member_country(&self, member_id: &str, country: &str) -> Result<()> {
        let request = self
            .client
            .patch(self.member_url(member_id))
            .json(&serde_json::json!({ "merge_fields": { "COUNTRY": country } }));
        self.expect_ok("updating member", request).await?;
        Ok(())
    }

    async fn add_member(
        &self,
        email: &str,
        first_name: &str,
        country: &str,
    ) -> Result<AddMemberOutcome> {
        let request = self
            .client
            .post(self.url(&format!("/lists/{}/members", self.list_id)))
            .json(&serde_json::json!({
                "email_address": email,
                "status": "subscribed",
                "merge_fields": { "FNAME": first_name, "COUNTRY": country }
            }));
        let response = self.send(request).await?;
        if response.status() == StatusCode::OK {
            return Ok(AddMemberOutcome::Added);
        }

        let body = response.text().await.unwrap_or_default();
        let problem = serde_json::from_str::<ApiProblem>(&body).unwrap_or_default();
        Ok(AddMemberOutcome::Rejected(problem))
    }

    async fn resubscribe_member(
        &self,
        email: &str,
        first_name: &str,
        country: &str,
    ) -> Result<()> {
        let request = self
            .client
            .patch(self.member_url(&subscriber_hash(email)))
            .json(&serde_json::json!({
                "status": "subscribed",
                "merge_fields": { "FNAME": first_name, "COUNTRY": country }
            }));
        self.expect_ok("resubscribing member", request).await?;
        Ok(())
    }
}
