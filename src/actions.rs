//! Admin page: user management.

use crate::api::{CREATE_USER_PATH, DELETE_USER_PATH, EDIT_USER_PATH};
use crate::errors::ApiError;
use crate::handlers::{Messages, reject, submit};
use crate::models::{CreateUserRequest, DeleteUserRequest, EditUserRequest};
use crate::state::PageContext;
use crate::validator::ensure_passwords_match;
use crate::view::PageView;
use reqwest::Method;

const CREATE: Messages = Messages {
    success: "User created",
    failure: "Failed to create user",
};
const EDIT: Messages = Messages {
    success: "User updated",
    failure: "Failed to update user",
};
const DELETE: Messages = Messages {
    success: "User deleted",
    failure: "Failed to delete user",
};

#[derive(Debug, Clone, Default)]
pub struct CreateUserForm {
    pub name: String,
    pub password: String,
    pub verify_password: String,
    pub is_admin: bool,
}

pub struct AdminActions<V: PageView> {
    ctx: PageContext,
    view: V,
}

impl<V: PageView> AdminActions<V> {
    pub fn new(ctx: PageContext, view: V) -> Self {
        Self { ctx, view }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub async fn create_user(&mut self, form: CreateUserForm) -> Result<(), ApiError> {
        if form.name.trim().is_empty() {
            return reject(&mut self.view, ApiError::validation("User name is empty"));
        }
        if let Err(err) = ensure_passwords_match(&form.password, &form.verify_password) {
            return reject(&mut self.view, err);
        }

        let body = CreateUserRequest {
            name: form.name.trim().to_string(),
            password: form.password,
            verify_password: form.verify_password,
            is_admin: form.is_admin,
        };
        let api = &self.ctx.api;
        submit(
            &mut self.view,
            "create_user",
            CREATE,
            api.mutate(Method::POST, CREATE_USER_PATH, Some(&body)),
        )
        .await
    }

    pub async fn edit_user(&mut self, id: &str, is_admin: bool) -> Result<(), ApiError> {
        let Some(id) = non_empty_id(id) else {
            return reject(&mut self.view, ApiError::validation("User id is empty"));
        };

        let body = EditUserRequest { id, is_admin };
        let api = &self.ctx.api;
        submit(
            &mut self.view,
            "edit_user",
            EDIT,
            api.mutate(Method::POST, EDIT_USER_PATH, Some(&body)),
        )
        .await
    }

    pub async fn delete_user(&mut self, id: &str) -> Result<(), ApiError> {
        let Some(id) = non_empty_id(id) else {
            return reject(&mut self.view, ApiError::validation("User id is empty"));
        };

        let body = DeleteUserRequest { id };
        let api = &self.ctx.api;
        submit(
            &mut self.view,
            "delete_user",
            DELETE,
            api.mutate(Method::POST, DELETE_USER_PATH, Some(&body)),
        )
        .await
    }
}

fn non_empty_id(id: &str) -> Option<String> {
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}
