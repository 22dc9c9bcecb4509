use crate::api::ADD_TAG_PATH;
use crate::errors::ApiError;
use crate::handlers::{Messages, reject, submit};
use crate::models::{AddTagRequest, DateRange, Direction, FetchParam, Span, TagId};
use crate::pager::{ClickAction, Completion, Pager, PrefetchRequest, Ticket};
use crate::render::{Chart, fetch_chart};
use crate::state::PageContext;
use crate::view::PageView;
use reqwest::Method;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{info, warn};

const ADD_TAG: Messages = Messages {
    success: "Tag added",
    failure: "Failed to add tag",
};

#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    SelectTag(TagId),
    Hover(Span, Direction),
    Click(Span, Direction),
    SetRange(DateRange),
    HoverPoint(Span, usize),
    AddTag(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Moved { page: u32 },
    Exhausted,
    Failed,
    Ignored,
}

#[derive(Debug)]
pub struct PrefetchDone {
    pub ticket: Ticket,
    pub result: Result<Chart, ApiError>,
}

pub struct Dashboard<V: PageView> {
    ctx: PageContext,
    view: V,
    week: Pager,
    month: Pager,
    all: Pager,
    tag: Option<TagId>,
    shown: HashMap<Span, Chart>,
    // Spans the first page of "all" only.
    full_range: Option<DateRange>,
    in_flight: HashMap<(Span, Direction), AbortHandle>,
    done_tx: mpsc::UnboundedSender<PrefetchDone>,
    done_rx: mpsc::UnboundedReceiver<PrefetchDone>,
}

impl<V: PageView> Dashboard<V> {
    pub fn new(ctx: PageContext, view: V) -> Self {
        let limit = ctx.limit();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            ctx,
            view,
            week: Pager::new(Span::Week, limit),
            month: Pager::new(Span::Month, limit),
            all: Pager::new(Span::All, limit),
            tag: None,
            shown: HashMap::new(),
            full_range: None,
            in_flight: HashMap::new(),
            done_tx,
            done_rx,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn tag(&self) -> Option<TagId> {
        self.tag
    }

    pub fn pager(&self, span: Span) -> &Pager {
        match span {
            Span::Week => &self.week,
            Span::Month => &self.month,
            Span::All => &self.all,
        }
    }

    pub fn chart(&self, span: Span) -> Option<&Chart> {
        self.shown.get(&span)
    }

    pub fn full_range(&self) -> Option<&DateRange> {
        self.full_range.as_ref()
    }

    fn pager_mut(&mut self, span: Span) -> &mut Pager {
        match span {
            Span::Week => &mut self.week,
            Span::Month => &mut self.month,
            Span::All => &mut self.all,
        }
    }

    /// Loads page 0 of every span for `tag`. If any of the three fetches
    /// fails the page is put back the way it was.
    pub async fn switch_tag(&mut self, tag: TagId) -> Result<(), ApiError> {
        let limit = self.ctx.limit();
        let week = FetchParam::new(tag, Span::Week, 0, limit);
        let month = FetchParam::new(tag, Span::Month, 0, limit);
        let all = FetchParam::new(tag, Span::All, 0, limit);

        let api = &self.ctx.api;
        let (week, month, all) = tokio::join!(
            fetch_chart(api, &week),
            fetch_chart(api, &month),
            fetch_chart(api, &all)
        );

        let (week, month, all) = match (week, month, all) {
            (Ok(week), Ok(month), Ok(all)) => (week, month, all),
            (week, month, all) => {
                let err = [week.err(), month.err(), all.err()]
                    .into_iter()
                    .flatten()
                    .next()
                    .unwrap_or(ApiError::NoData);
                warn!(tag, error = %err, "tag switch failed, restoring previous charts");
                self.restore_shown();
                self.view.set_selected_tag(self.tag);
                self.view.alert(&err.user_message());
                return Err(err);
            }
        };

        info!(tag, week = week.len(), month = month.len(), all = all.len(), "tag loaded");
        self.cancel_all();
        self.tag = Some(tag);
        self.full_range = all.date_range();
        for (span, chart) in [(Span::Week, week), (Span::Month, month), (Span::All, all)] {
            let pager = self.pager_mut(span);
            pager.switch_tag(tag);
            pager.loaded(&chart);
            self.show(span, chart);
        }
        self.view.set_selected_tag(Some(tag));
        if let Some(range) = &self.full_range {
            self.view.set_date_range(range);
        }
        Ok(())
    }

    /// Narrows the "all" chart to `range`. The pager keeps its page and
    /// range until the narrowed page has loaded.
    pub async fn set_date_range(&mut self, range: DateRange) -> Result<(), ApiError> {
        if self.tag.is_none() || self.full_range.is_none() {
            return reject(&mut self.view, ApiError::validation("Select a tag first"));
        }
        let Some(params) = self.all.params_with(Some(&range), 0) else {
            return Ok(());
        };

        match fetch_chart(&self.ctx.api, &params).await {
            Ok(chart) => {
                self.cancel(Span::All, Direction::Prev);
                self.cancel(Span::All, Direction::Next);
                self.all.set_range(Some(range.clone()));
                self.all.loaded(&chart);
                self.show(Span::All, chart);
                self.view.set_date_range(&range);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "range fetch failed");
                self.view.alert(&err.user_message());
                Err(err)
            }
        }
    }

    pub async fn add_tag(&mut self, name: &str) -> Result<(), ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return reject(&mut self.view, ApiError::validation("Tag name is empty"));
        }

        let body = AddTagRequest {
            tag_name: name.to_string(),
        };
        let api = &self.ctx.api;
        submit(
            &mut self.view,
            "add_tag",
            ADD_TAG,
            api.mutate(Method::POST, ADD_TAG_PATH, Some(&body)),
        )
        .await
    }

    /// Starts a speculative fetch of the adjacent page. Must be called from
    /// within a tokio runtime.
    pub fn hover(&mut self, span: Span, direction: Direction) {
        if let Some(request) = self.pager_mut(span).begin_prefetch(direction) {
            self.spawn_prefetch(request);
        }
    }

    pub async fn click(&mut self, span: Span, direction: Direction) -> ClickOutcome {
        self.apply_prefetches();

        let action = match self.pager_mut(span).click(direction) {
            ClickAction::FetchNow(request) => {
                self.cancel(span, direction);
                let result = fetch_chart(&self.ctx.api, &request.params).await;
                let pager = self.pager_mut(span);
                pager.complete(&request.ticket, result);
                match pager.click(direction) {
                    ClickAction::FetchNow(_) => ClickAction::Ignored,
                    other => other,
                }
            }
            other => other,
        };

        match action {
            ClickAction::Render { chart, follow_up } => {
                self.cancel(span, direction.opposite());
                self.show(span, chart);
                if let Some(request) = follow_up {
                    self.spawn_prefetch(request);
                }
                ClickOutcome::Moved {
                    page: self.pager(span).page(),
                }
            }
            ClickAction::Alert(message) => {
                self.view.alert(&message);
                ClickOutcome::Failed
            }
            ClickAction::Exhausted => {
                self.push_buttons(span);
                ClickOutcome::Exhausted
            }
            ClickAction::Ignored | ClickAction::FetchNow(_) => ClickOutcome::Ignored,
        }
    }

    pub fn hover_point(&mut self, span: Span, index: usize) -> bool {
        match self.shown.get(&span).and_then(|chart| chart.point(index)) {
            Some(detail) => {
                self.view.show_point(&detail);
                true
            }
            None => false,
        }
    }

    pub fn prefetches_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn apply_prefetches(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(done) = self.done_rx.try_recv() {
            self.apply_prefetch(done);
            applied += 1;
        }
        applied
    }

    pub async fn next_prefetch(&mut self) -> Option<Completion> {
        let done = self.done_rx.recv().await?;
        Some(self.apply_prefetch(done))
    }

    pub async fn handle(&mut self, event: PageEvent) {
        match event {
            PageEvent::SelectTag(tag) => {
                let _ = self.switch_tag(tag).await;
            }
            PageEvent::Hover(span, direction) => self.hover(span, direction),
            PageEvent::Click(span, direction) => {
                self.click(span, direction).await;
            }
            PageEvent::SetRange(range) => {
                let _ = self.set_date_range(range).await;
            }
            PageEvent::HoverPoint(span, index) => {
                self.hover_point(span, index);
            }
            PageEvent::AddTag(name) => {
                let _ = self.add_tag(&name).await;
            }
        }
    }

    /// Event loop: user events and resolved prefetches are handled on this
    /// task only. Returns when the event channel closes.
    pub async fn run(&mut self, mut events: mpsc::Receiver<PageEvent>) {
        loop {
            tokio::select! {
                Some(done) = self.done_rx.recv() => {
                    self.apply_prefetch(done);
                }
                event = events.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
            }
        }
        self.cancel_all();
    }

    fn apply_prefetch(&mut self, done: PrefetchDone) -> Completion {
        let span = done.ticket.span;
        let direction = done.ticket.direction;
        let completion = self.pager_mut(span).complete(&done.ticket, done.result);
        if completion != Completion::Stale {
            self.in_flight.remove(&(span, direction));
        }
        if completion == Completion::Exhausted {
            self.push_buttons(span);
        }
        completion
    }

    fn spawn_prefetch(&mut self, request: PrefetchRequest) {
        let key = (request.ticket.span, request.ticket.direction);
        self.cancel(key.0, key.1);

        let api = self.ctx.api.clone();
        let done_tx = self.done_tx.clone();
        let handle = tokio::spawn(async move {
            let result = fetch_chart(&api, &request.params).await;
            let _ = done_tx.send(PrefetchDone {
                ticket: request.ticket,
                result,
            });
        });
        self.in_flight.insert(key, handle.abort_handle());
    }

    fn cancel(&mut self, span: Span, direction: Direction) {
        if let Some(handle) = self.in_flight.remove(&(span, direction)) {
            handle.abort();
        }
    }

    fn cancel_all(&mut self) {
        for (_, handle) in self.in_flight.drain() {
            handle.abort();
        }
    }

    fn show(&mut self, span: Span, chart: Chart) {
        self.view.render_chart(span, &chart);
        self.shown.insert(span, chart);
        self.push_buttons(span);
    }

    fn restore_shown(&mut self) {
        for span in Span::ALL {
            let chart = self.shown.get(&span).cloned().unwrap_or_default();
            self.view.render_chart(span, &chart);
            self.push_buttons(span);
        }
    }

    fn push_buttons(&mut self, span: Span) {
        let buttons = self.pager(span).buttons();
        self.view.set_pager_buttons(span, buttons);
    }
}
