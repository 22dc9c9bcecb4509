use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TagId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Span {
    Week,
    Month,
    All,
}

impl Span {
    pub const ALL: [Span; 3] = [Span::Week, Span::Month, Span::All];

    pub fn as_str(self) -> &'static str {
        match self {
            Span::Week => "week",
            Span::Month => "month",
            Span::All => "all",
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Span {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "week" => Ok(Span::Week),
            "month" => Ok(Span::Month),
            "all" => Ok(Span::All),
            other => Err(format!("unknown span {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Prev => "prev",
            Direction::Next => "next",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Prev => Direction::Next,
            Direction::Next => Direction::Prev,
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "prev" => Ok(Direction::Prev),
            "next" => Ok(Direction::Next),
            other => Err(format!("unknown direction {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_at: String,
    pub end_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchParam {
    pub tag_id: TagId,
    pub page: u32,
    pub span: Span,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<String>,
}

impl FetchParam {
    pub fn new(tag_id: TagId, span: Span, page: u32, limit: u32) -> Self {
        Self {
            tag_id,
            page,
            span,
            limit,
            start_at: None,
            end_at: None,
        }
    }

    pub fn with_range(mut self, range: Option<&DateRange>) -> Self {
        if let Some(range) = range {
            self.start_at = Some(range.start_at.clone());
            self.end_at = Some(range.end_at.clone());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    pub updated_at: String,
    #[serde(default)]
    pub remote_addr: String,
    #[serde(default)]
    pub hostname: String,
    pub payload: String,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub is_success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub password: String,
    pub verify_password: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct EditUserRequest {
    pub id: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteUserRequest {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct AddTagRequest {
    pub tag_name: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordRequest {
    pub password: String,
    pub verify_password: String,
}
