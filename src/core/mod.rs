pub mod audience;
pub mod classify;
pub mod client;
pub mod engine;
pub mod export;
pub mod uploader;

pub use crate::domain::model::{JobReport, Member, UploadResult};
pub use crate::domain::ports::{CampaignApi, Job, JobPlan, MemberApi, Storage};
pub use crate::utils::error::Result;
