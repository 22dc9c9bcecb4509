use crate::errors::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub token: String,
    pub limit: u32,
}

impl Config {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        limit: u32,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if limit == 0 {
            return Err(ConfigError::InvalidLimit(limit.to_string()));
        }

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            token,
            limit,
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("MYPAGE_API_BASE").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = lookup("MYPAGE_API_TOKEN").ok_or(ConfigError::MissingToken)?;
        let limit = match lookup("MYPAGE_PAGE_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidLimit(raw.clone()))?,
            None => DEFAULT_LIMIT,
        };

        Self::new(base_url, token, limit)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed).map_err(|err| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }

    Ok(trimmed.to_string())
}
