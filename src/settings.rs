//! Settings page: token regeneration and password change.

use crate::api::{REGENERATE_TOKEN_PATH, REREGISTER_PASSWORD_PATH};
use crate::errors::ApiError;
use crate::handlers::{Messages, reject, submit};
use crate::models::PasswordRequest;
use crate::state::PageContext;
use crate::validator::{PASSWORD_EMPTY, ensure_passwords_match};
use crate::view::PageView;
use reqwest::Method;

const REGENERATE: Messages = Messages {
    success: "Access token regenerated",
    failure: "Failed to regenerate token",
};
const PASSWORD: Messages = Messages {
    success: "Password updated",
    failure: "Failed to update password",
};

pub struct Settings<V: PageView> {
    ctx: PageContext,
    view: V,
}

impl<V: PageView> Settings<V> {
    pub fn new(ctx: PageContext, view: V) -> Self {
        Self { ctx, view }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub async fn regenerate_token(&mut self) -> Result<(), ApiError> {
        let api = &self.ctx.api;
        submit(
            &mut self.view,
            "regenerate_token",
            REGENERATE,
            api.mutate::<()>(Method::PATCH, REGENERATE_TOKEN_PATH, None),
        )
        .await
    }

    pub async fn change_password(&mut self, password: &str, verify: &str) -> Result<(), ApiError> {
        if password.is_empty() || verify.is_empty() {
            return reject(&mut self.view, ApiError::validation(PASSWORD_EMPTY));
        }
        if let Err(err) = ensure_passwords_match(password, verify) {
            return reject(&mut self.view, err);
        }

        let body = PasswordRequest {
            password: password.to_string(),
            verify_password: verify.to_string(),
        };
        let api = &self.ctx.api;
        submit(
            &mut self.view,
            "change_password",
            PASSWORD,
            api.mutate(Method::POST, REREGISTER_PASSWORD_PATH, Some(&body)),
        )
        .await
    }
}
