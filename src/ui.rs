use crate::models::{DateRange, Span, TagId};
use crate::render::{Chart, PointDetail, X_KEY};
use crate::view::{ButtonState, PageView};
use serde_json::Value;
use std::io::Write;
use tracing::error;

/// Terminal host: every view update becomes a few lines of text.
pub struct ConsoleView<W: Write + Send> {
    out: W,
    reloads: usize,
}

impl<W: Write + Send> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self { out, reloads: 0 }
    }

    pub fn reloads(&self) -> usize {
        self.reloads
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}") {
            error!("failed to write to console: {err}");
        }
    }
}

impl<W: Write + Send> PageView for ConsoleView<W> {
    fn alert(&mut self, message: &str) {
        self.line(&format!("[alert] {message}"));
    }

    fn reload(&mut self) {
        self.reloads += 1;
        self.line("[reload]");
    }

    fn set_submit_disabled(&mut self, disabled: bool) {
        let state = if disabled { "disabled" } else { "enabled" };
        self.line(&format!("[submit] {state}"));
    }

    fn set_verify_validity(&mut self, message: &str) {
        if message.is_empty() {
            self.line("[verify] ok");
        } else {
            self.line(&format!("[verify] {message}"));
        }
    }

    fn render_chart(&mut self, span: Span, chart: &Chart) {
        let table = render_table(chart);
        self.line(&format!("== {span} ({} points)", chart.len()));
        self.line(&table);
    }

    fn show_point(&mut self, detail: &PointDetail) {
        let parsed = serde_json::to_string_pretty(&detail.parsed).unwrap_or_default();
        self.line(&format!(
            "[point] {} from {} ({})\n{parsed}",
            detail.raw.updated_at, detail.raw.hostname, detail.raw.remote_addr
        ));
    }

    fn set_pager_buttons(&mut self, span: Span, state: ButtonState) {
        let mark = |disabled: bool| if disabled { "-" } else { "+" };
        self.line(&format!(
            "[pager {span}] prev{} next{}",
            mark(state.prev_disabled),
            mark(state.next_disabled)
        ));
    }

    fn set_selected_tag(&mut self, tag: Option<TagId>) {
        match tag {
            Some(tag) => self.line(&format!("[tag] {tag}")),
            None => self.line("[tag] none"),
        }
    }

    fn set_date_range(&mut self, range: &DateRange) {
        self.line(&format!("[range] {} .. {}", range.start_at, range.end_at));
    }
}

pub fn render_table(chart: &Chart) -> String {
    if chart.is_empty() {
        return "(no data)".to_string();
    }

    let mut header = vec![X_KEY.to_string()];
    header.extend(chart.series.iter().cloned());

    let body: Vec<Vec<String>> = chart
        .rows
        .iter()
        .map(|row| {
            header
                .iter()
                .map(|key| row.get(key).map(cell).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            body.iter()
                .map(|cells| cells[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(header.as_slice())];
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    lines.extend(body.iter().map(|cells| format_row(cells.as_slice())));
    lines.join("\n")
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
