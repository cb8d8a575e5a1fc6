use crate::domain::model::{
    AddMemberOutcome, Campaign, CampaignSettingsPatch, JobReport, Member, SegmentOpts,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Campaign endpoints used by the newsletter uploader.
#[async_trait]
pub trait CampaignApi: Send + Sync {
    async fn create_campaign(
        &self,
        subject: &str,
        preview_text: &str,
        title: &str,
        segment_opts: Option<SegmentOpts>,
    ) -> Result<Campaign>;

    async fn upload_content(&self, campaign_id: &str, html: &str) -> Result<()>;

    async fn update_campaign(
        &self,
        campaign_id: &str,
        settings: CampaignSettingsPatch,
    ) -> Result<Campaign>;

    async fn get_campaign(&self, campaign_id: &str) -> Result<Campaign>;
}

/// List-member endpoints used by the subscriber jobs.
#[async_trait]
pub trait MemberApi: Send + Sync {
    async fn fetch_all_members(&self) -> Result<Vec<Member>>;

    /// `None` when the address is not on the list.
    async fn get_member(&self, email: &str) -> Result<Option<Member>>;

    async fn set_member_country(&self, member_id: &str, country: &str) -> Result<()>;

    async fn add_member(
        &self,
        email: &str,
        first_name: &str,
        country: &str,
    ) -> Result<AddMemberOutcome>;

    async fn resubscribe_member(&self, email: &str, first_name: &str, country: &str)
        -> Result<()>;
}

/// What a job intends to do, shown to the operator before anything is written.
pub trait JobPlan: Send {
    /// Human-readable summary printed before confirmation.
    fn summary(&self) -> String;

    /// Number of remote writes `load` will perform.
    fn pending_writes(&self) -> usize;
}

/// A subscriber job: fetch input, classify it into a plan, apply the plan.
#[async_trait]
pub trait Job: Send + Sync {
    type Input: Send;
    type Plan: JobPlan;

    fn name(&self) -> &str;

    async fn extract(&self) -> Result<Self::Input>;

    fn transform(&self, input: Self::Input) -> Result<Self::Plan>;

    async fn load(&self, plan: Self::Plan) -> Result<JobReport>;
}
