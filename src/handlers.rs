use crate::errors::ApiError;
use crate::view::PageView;
use std::future::Future;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub success: &'static str,
    pub failure: &'static str,
}

/// Transport and status errors re-enable the buttons instead of reloading.
pub async fn submit<F>(view: &mut dyn PageView, action: &str, messages: Messages, call: F) -> Result<(), ApiError>
where
    F: Future<Output = Result<(), ApiError>>,
{
    view.set_submit_disabled(true);
    info!(action, "submitting");

    match call.await {
        Ok(()) => {
            view.alert(messages.success);
            view.reload();
            Ok(())
        }
        Err(ApiError::Rejected(reason)) => {
            warn!(action, %reason, "rejected by server");
            view.alert(&format!("{}: {reason}", messages.failure));
            view.reload();
            Err(ApiError::Rejected(reason))
        }
        Err(err) => {
            warn!(action, error = %err, "request failed");
            view.alert(&err.user_message());
            view.set_submit_disabled(false);
            Err(err)
        }
    }
}

pub fn reject(view: &mut dyn PageView, err: ApiError) -> Result<(), ApiError> {
    view.alert(&err.user_message());
    Err(err)
}
