use async_trait::async_trait;
use log::info;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::IdentityProvider;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Sign-in failed: {0}")]
    SignInFailed(String),
}

// Identity backed by configuration, for running the dashboard without a hosted
// identity provider. Starts signed out.
pub struct EnvIdentity {
    email: String,
    password: Option<String>,
    groups: Vec<String>,
    attributes: HashMap<String, String>,
    signed_in: AtomicBool,
}

impl EnvIdentity {
    pub fn new(email: &str, password: Option<String>, groups: Vec<String>, attributes: HashMap<String, String>) -> Self {
        Self {
            email: email.to_string(),
            password,
            groups,
            attributes,
            signed_in: AtomicBool::new(false),
        }
    }

    fn ensure_signed_in(&self) -> Result<(), IdentityError> {
        if self.signed_in.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(IdentityError::NotSignedIn)
        }
    }
}

#[async_trait]
impl IdentityProvider for EnvIdentity {
    async fn sign_in(&self, username: &str, password: &str) -> Result<(), IdentityError> {
        if !username.eq_ignore_ascii_case(&self.email) {
            return Err(IdentityError::SignInFailed(format!("unknown user {}", username)));
        }
        if self.password.as_deref().is_some_and(|expected| expected != password) {
            return Err(IdentityError::SignInFailed("incorrect password".to_string()));
        }
        self.signed_in.store(true, Ordering::SeqCst);
        info!("Signed in as {}", username);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.signed_in.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn current_user_attributes(&self) -> Result<HashMap<String, String>, IdentityError> {
        self.ensure_signed_in()?;
        Ok(self.attributes.clone())
    }

    async fn current_user_groups(&self) -> Result<Vec<String>, IdentityError> {
        self.ensure_signed_in()?;
        Ok(self.groups.clone())
    }
}
