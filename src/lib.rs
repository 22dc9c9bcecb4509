pub mod actions;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod pager;
pub mod render;
pub mod settings;
pub mod state;
pub mod ui;
pub mod validator;
pub mod view;

pub use config::Config;
pub use dashboard::{Dashboard, PageEvent};
pub use errors::ApiError;
pub use state::PageContext;
pub use view::PageView;
