use crate::api::ApiClient;
use crate::config::Config;

#[derive(Clone)]
pub struct PageContext {
    pub api: ApiClient,
}

impl PageContext {
    pub fn new(config: Config) -> Self {
        Self {
            api: ApiClient::new(config),
        }
    }

    pub fn limit(&self) -> u32 {
        self.api.limit()
    }
}
