//! The contract a page host has to satisfy.
//!
//! Components never look elements up by id; they talk to the page through
//! [`PageView`], which a browser shim, the terminal host or a test double
//! implements.

use crate::models::{DateRange, Span, TagId};
use crate::render::{Chart, PointDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

pub trait PageView: Send {
    /// Blocking, user-visible message.
    fn alert(&mut self, message: &str);

    /// Full page reload; the only recovery path after a mutation.
    fn reload(&mut self);

    fn set_submit_disabled(&mut self, disabled: bool);

    /// Empty message means valid.
    fn set_verify_validity(&mut self, message: &str);

    /// Replaces whatever chart was drawn for `span`.
    fn render_chart(&mut self, span: Span, chart: &Chart);

    fn show_point(&mut self, detail: &PointDetail);

    fn set_pager_buttons(&mut self, span: Span, state: ButtonState);

    fn set_selected_tag(&mut self, tag: Option<TagId>);

    fn set_date_range(&mut self, range: &DateRange);
}
