pub mod identity;
pub mod polls;
pub mod reports;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::models::PollRecord;
pub use identity::{EnvIdentity, IdentityError};
pub use polls::{FetchError, HttpPollSource};
pub use reports::{HttpReportGenerator, ReportError};

#[async_trait]
pub trait PollSource: Send + Sync {
    async fn fetch_poll_data(&self) -> Result<Vec<PollRecord>, FetchError>;
}

#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate_report(&self, prompt: &str) -> Result<String, ReportError>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, username: &str, password: &str) -> Result<(), IdentityError>;
    async fn sign_out(&self) -> Result<(), IdentityError>;
    async fn current_user_attributes(&self) -> Result<HashMap<String, String>, IdentityError>;
    async fn current_user_groups(&self) -> Result<Vec<String>, IdentityError>;
}
