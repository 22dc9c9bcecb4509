//! Per-span pagination. Only the newest ticket of a slot may fill it.

use crate::errors::ApiError;
use crate::models::{DateRange, Direction, FetchParam, Span, TagId};
use crate::render::Chart;
use crate::view::ButtonState;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum SlotError {
    Empty,
    Fetch(String),
}

impl SlotError {
    pub fn message(&self) -> String {
        match self {
            SlotError::Empty => ApiError::NoData.to_string(),
            SlotError::Fetch(message) => message.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SlotState {
    #[default]
    Idle,
    Failed(SlotError),
    Ready { page: u32, chart: Chart },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub span: Span,
    pub direction: Direction,
    pub page: u32,
    id: u64,
}

#[derive(Debug, Clone)]
pub struct PrefetchRequest {
    pub ticket: Ticket,
    pub params: FetchParam,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<u64>,
    state: SlotState,
}

impl Slot {
    fn clear(&mut self) {
        self.pending = None;
        self.state = SlotState::Idle;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Stale,
    Ready,
    Failed,
    Exhausted,
}

#[derive(Debug)]
pub enum ClickAction {
    Ignored,
    Render {
        chart: Chart,
        follow_up: Option<PrefetchRequest>,
    },
    /// Nothing cached and nothing known to be wrong: fetch now and click again.
    FetchNow(PrefetchRequest),
    Alert(String),
    Exhausted,
}

#[derive(Debug)]
pub struct Pager {
    span: Span,
    limit: u32,
    tag: Option<TagId>,
    range: Option<DateRange>,
    page: u32,
    next_disabled: bool,
    prev: Slot,
    next: Slot,
    issued: u64,
}

impl Pager {
    pub fn new(span: Span, limit: u32) -> Self {
        Self {
            span,
            limit,
            tag: None,
            range: None,
            page: 0,
            next_disabled: false,
            prev: Slot::default(),
            next: Slot::default(),
            issued: 0,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn tag(&self) -> Option<TagId> {
        self.tag
    }

    pub fn range(&self) -> Option<&DateRange> {
        self.range.as_ref()
    }

    pub fn buttons(&self) -> ButtonState {
        ButtonState {
            prev_disabled: self.page == 0,
            next_disabled: self.next_disabled,
        }
    }

    pub fn slot(&self, direction: Direction) -> &SlotState {
        &self.slot_ref(direction).state
    }

    pub fn is_pending(&self, direction: Direction) -> bool {
        self.slot_ref(direction).pending.is_some()
    }

    pub fn reset(&mut self, tag: Option<TagId>) {
        self.tag = tag;
        self.page = 0;
        self.next_disabled = false;
        self.prev.clear();
        self.next.clear();
    }

    pub fn switch_tag(&mut self, tag: TagId) {
        self.range = None;
        self.reset(Some(tag));
    }

    pub fn set_range(&mut self, range: Option<DateRange>) {
        self.range = range;
        self.reset(self.tag);
    }

    pub fn loaded(&mut self, chart: &Chart) {
        if self.page == 0 {
            self.next_disabled = chart.is_empty();
        }
    }

    pub fn params(&self, page: u32) -> Option<FetchParam> {
        self.params_with(self.range.as_ref(), page)
    }

    pub fn params_with(&self, range: Option<&DateRange>, page: u32) -> Option<FetchParam> {
        let tag = self.tag?;
        Some(FetchParam::new(tag, self.span, page, self.limit).with_range(range))
    }

    pub fn target_page(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Prev => self.page.saturating_sub(1),
            Direction::Next => self.page.saturating_add(1),
        }
    }

    /// Any request already in flight for the slot becomes stale.
    pub fn begin_prefetch(&mut self, direction: Direction) -> Option<PrefetchRequest> {
        if !self.can_move(direction) {
            return None;
        }

        let page = self.target_page(direction);
        let params = self.params(page)?;
        self.issued += 1;
        let id = self.issued;
        self.slot_mut(direction).pending = Some(id);
        debug!(span = %self.span, direction = direction.as_str(), page, ticket = id, "prefetch issued");

        Some(PrefetchRequest {
            ticket: Ticket {
                span: self.span,
                direction,
                page,
                id,
            },
            params,
        })
    }

    pub fn complete(&mut self, ticket: &Ticket, result: Result<Chart, ApiError>) -> Completion {
        if ticket.span != self.span || self.slot_ref(ticket.direction).pending != Some(ticket.id) {
            debug!(span = %self.span, ticket = ticket.id, "dropping stale prefetch");
            return Completion::Stale;
        }

        let (state, completion) = match result {
            Ok(chart) if chart.is_empty() => {
                if ticket.direction == Direction::Next {
                    self.next_disabled = true;
                    (SlotState::Failed(SlotError::Empty), Completion::Exhausted)
                } else {
                    (SlotState::Failed(SlotError::Empty), Completion::Failed)
                }
            }
            Ok(chart) => (
                SlotState::Ready {
                    page: ticket.page,
                    chart,
                },
                Completion::Ready,
            ),
            Err(err) => (SlotState::Failed(SlotError::Fetch(err.user_message())), Completion::Failed),
        };

        let slot = self.slot_mut(ticket.direction);
        slot.pending = None;
        slot.state = state;
        completion
    }

    pub fn click(&mut self, direction: Direction) -> ClickAction {
        if direction == Direction::Prev && self.page == 0 {
            return ClickAction::Ignored;
        }

        let target = self.target_page(direction);
        match std::mem::take(&mut self.slot_mut(direction).state) {
            SlotState::Ready { page, chart } if page == target => {
                self.page = page;
                if direction == Direction::Prev {
                    self.next_disabled = false;
                }
                self.prev.clear();
                self.next.clear();
                let follow_up = self.begin_prefetch(direction);
                ClickAction::Render { chart, follow_up }
            }
            SlotState::Failed(SlotError::Empty) => ClickAction::Exhausted,
            SlotState::Failed(err) => ClickAction::Alert(err.message()),
            SlotState::Idle | SlotState::Ready { .. } => match self.begin_prefetch(direction) {
                Some(request) => ClickAction::FetchNow(request),
                None => ClickAction::Ignored,
            },
        }
    }

    fn can_move(&self, direction: Direction) -> bool {
        match direction {
            Direction::Prev => self.page > 0,
            Direction::Next => !self.next_disabled,
        }
    }

    fn slot_ref(&self, direction: Direction) -> &Slot {
        match direction {
            Direction::Prev => &self.prev,
            Direction::Next => &self.next,
        }
    }

    fn slot_mut(&mut self, direction: Direction) -> &mut Slot {
        match direction {
            Direction::Prev => &mut self.prev,
            Direction::Next => &mut self.next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataRecord;

    fn chart(points: usize) -> Chart {
        let records = (0..points)
            .map(|i| DataRecord {
                updated_at: format!("2024-01-{:02}T00:00:00+09:00", i + 1),
                remote_addr: String::new(),
                hostname: String::new(),
                payload: format!(r#"{{"n": {i}}}"#),
            })
            .collect();
        Chart::from_records(records).unwrap()
    }

    fn pager() -> Pager {
        let mut pager = Pager::new(Span::Week, 10);
        pager.reset(Some(1));
        pager
    }

    #[test]
    fn starts_at_page_zero_with_prev_disabled() {
        let pager = pager();
        assert_eq!(pager.page(), 0);
        assert_eq!(
            pager.buttons(),
            ButtonState {
                prev_disabled: true,
                next_disabled: false
            }
        );
    }

    #[test]
    fn no_requests_without_a_tag() {
        let mut pager = Pager::new(Span::Month, 10);
        assert!(pager.begin_prefetch(Direction::Next).is_none());
        assert!(matches!(pager.click(Direction::Next), ClickAction::Ignored));
    }

    #[test]
    fn prev_at_page_zero_is_ignored() {
        let mut pager = pager();
        assert!(pager.begin_prefetch(Direction::Prev).is_none());
        assert!(matches!(pager.click(Direction::Prev), ClickAction::Ignored));
        assert_eq!(pager.page(), 0);
    }

    #[test]
    fn hover_then_click_consumes_slot_and_refills() {
        let mut pager = pager();
        let request = pager.begin_prefetch(Direction::Next).unwrap();
        assert_eq!(request.params.page, 1);
        assert_eq!(pager.complete(&request.ticket, Ok(chart(3))), Completion::Ready);
        assert!(matches!(pager.slot(Direction::Next), SlotState::Ready { page: 1, .. }));

        let ClickAction::Render { chart: drawn, follow_up } = pager.click(Direction::Next) else {
            panic!("expected render");
        };
        assert_eq!(drawn.len(), 3);
        assert_eq!(pager.page(), 1);
        assert!(!pager.buttons().prev_disabled);
        assert_eq!(pager.slot(Direction::Next), &SlotState::Idle);

        let follow_up = follow_up.expect("follow-up prefetch");
        assert_eq!(follow_up.params.page, 2);
        assert!(pager.is_pending(Direction::Next));
        assert_eq!(pager.complete(&follow_up.ticket, Ok(chart(1))), Completion::Ready);
        assert!(matches!(pager.slot(Direction::Next), SlotState::Ready { page: 2, .. }));
    }

    #[test]
    fn superseded_response_is_dropped() {
        let mut pager = pager();
        let first = pager.begin_prefetch(Direction::Next).unwrap();
        let second = pager.begin_prefetch(Direction::Next).unwrap();

        assert_eq!(pager.complete(&second.ticket, Ok(chart(2))), Completion::Ready);
        assert_eq!(pager.complete(&first.ticket, Ok(chart(5))), Completion::Stale);
        match pager.slot(Direction::Next) {
            SlotState::Ready { chart, .. } => assert_eq!(chart.len(), 2),
            other => panic!("unexpected slot {other:?}"),
        }
    }

    #[test]
    fn reset_makes_in_flight_requests_stale() {
        let mut pager = pager();
        let request = pager.begin_prefetch(Direction::Next).unwrap();
        pager.reset(Some(2));
        assert_eq!(pager.complete(&request.ticket, Ok(chart(2))), Completion::Stale);
        assert_eq!(pager.slot(Direction::Next), &SlotState::Idle);
    }

    #[test]
    fn empty_next_page_disables_next_without_alert() {
        let mut pager = pager();
        let request = pager.begin_prefetch(Direction::Next).unwrap();
        assert_eq!(pager.complete(&request.ticket, Ok(chart(0))), Completion::Exhausted);
        assert!(pager.buttons().next_disabled);

        assert!(matches!(pager.click(Direction::Next), ClickAction::Exhausted));
        assert!(matches!(pager.click(Direction::Next), ClickAction::Ignored));
        assert!(pager.begin_prefetch(Direction::Next).is_none());
        assert_eq!(pager.page(), 0);
    }

    #[test]
    fn failed_prefetch_alerts_once_then_retries() {
        let mut pager = pager();
        let request = pager.begin_prefetch(Direction::Next).unwrap();
        let completion = pager.complete(&request.ticket, Err(ApiError::Rejected("tag missing".into())));
        assert_eq!(completion, Completion::Failed);

        match pager.click(Direction::Next) {
            ClickAction::Alert(message) => assert_eq!(message, "tag missing"),
            other => panic!("expected alert, got {other:?}"),
        }
        assert!(matches!(pager.click(Direction::Next), ClickAction::FetchNow(_)));
    }

    #[test]
    fn click_without_cache_fetches_now() {
        let mut pager = pager();
        let ClickAction::FetchNow(request) = pager.click(Direction::Next) else {
            panic!("expected synchronous fetch");
        };
        assert_eq!(pager.complete(&request.ticket, Ok(chart(2))), Completion::Ready);
        assert!(matches!(pager.click(Direction::Next), ClickAction::Render { .. }));
        assert_eq!(pager.page(), 1);
    }

    #[test]
    fn moving_back_reenables_next_and_never_goes_negative() {
        let mut pager = pager();
        let request = pager.begin_prefetch(Direction::Next).unwrap();
        pager.complete(&request.ticket, Ok(chart(2)));
        let ClickAction::Render { follow_up, .. } = pager.click(Direction::Next) else {
            panic!("expected render");
        };
        let follow_up = follow_up.unwrap();
        assert_eq!(pager.complete(&follow_up.ticket, Ok(chart(0))), Completion::Exhausted);
        assert!(pager.buttons().next_disabled);

        let request = pager.begin_prefetch(Direction::Prev).unwrap();
        assert_eq!(request.params.page, 0);
        pager.complete(&request.ticket, Ok(chart(2)));
        assert!(matches!(pager.click(Direction::Prev), ClickAction::Render { follow_up: None, .. }));
        assert_eq!(pager.page(), 0);
        assert_eq!(
            pager.buttons(),
            ButtonState {
                prev_disabled: true,
                next_disabled: false
            }
        );
        assert!(matches!(pager.click(Direction::Prev), ClickAction::Ignored));
    }

    #[test]
    fn cached_page_from_before_a_move_is_not_reused() {
        let mut pager = pager();
        let next = pager.begin_prefetch(Direction::Next).unwrap();
        pager.complete(&next.ticket, Ok(chart(2)));
        let ClickAction::Render { .. } = pager.click(Direction::Next) else {
            panic!("expected render");
        };
        // Both slots were cleared by the move, so prev has to be fetched again.
        assert_eq!(pager.slot(Direction::Prev), &SlotState::Idle);
        assert!(matches!(pager.click(Direction::Prev), ClickAction::FetchNow(_)));
    }

    #[test]
    fn empty_first_page_disables_next() {
        let mut pager = pager();
        pager.loaded(&chart(0));
        assert!(pager.buttons().next_disabled);
        assert!(pager.begin_prefetch(Direction::Next).is_none());
        assert!(matches!(pager.click(Direction::Next), ClickAction::Ignored));

        pager.reset(Some(1));
        pager.loaded(&chart(2));
        assert!(!pager.buttons().next_disabled);
    }

    #[test]
    fn range_is_folded_into_params() {
        let mut pager = Pager::new(Span::All, 25);
        pager.reset(Some(4));
        pager.set_range(Some(DateRange {
            start_at: "2024-01-01".into(),
            end_at: "2024-01-31".into(),
        }));
        let params = pager.params(0).unwrap();
        assert_eq!(params.span, Span::All);
        assert_eq!(params.limit, 25);
        assert_eq!(params.start_at.as_deref(), Some("2024-01-01"));
        assert_eq!(params.end_at.as_deref(), Some("2024-01-31"));

        let unranged = pager.params_with(None, 2).unwrap();
        assert_eq!(unranged.page, 2);
        assert!(unranged.start_at.is_none());
        assert!(pager.range().is_some());
    }
}
