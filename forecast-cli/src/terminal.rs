use anyhow::Context;
use chrono::Local;
use colored::*;
use forecast_core::{
    LocationSource, Notifier, ScreenView,
    render::{DayCard, ForecastView, HourCard},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    io::{self, Write as _},
    sync::Mutex,
    time::Duration,
};
use tracing::warn;

const CARD_WIDTH: usize = 10;
const FRAME: &str = "▓▒░";

/// Indeterminate progress indicator shown while the screen is loading.
pub fn loading_spinner(message: &'static str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .context("Invalid spinner template")?
        .tick_strings(&["▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁"]);

    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Prints notices above the spinner so they are not overwritten.
///
/// A hidden spinner (stderr is not a terminal) drops its `println` output,
/// so notices then go straight to the fallback writer.
pub struct TerminalNotifier {
    spinner: ProgressBar,
    fallback: Mutex<Box<dyn io::Write + Send>>,
}

impl TerminalNotifier {
    pub fn new(spinner: ProgressBar) -> Self {
        Self::with_fallback(spinner, Box::new(io::stderr()))
    }

    fn with_fallback(spinner: ProgressBar, fallback: Box<dyn io::Write + Send>) -> Self {
        Self { spinner, fallback: Mutex::new(fallback) }
    }
}

impl std::fmt::Debug for TerminalNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalNotifier").finish_non_exhaustive()
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str) {
        let line = format!("{} {}", "⚠".yellow().bold(), message.yellow());

        if !self.spinner.is_hidden() {
            self.spinner.println(line);
            return;
        }

        let written = match self.fallback.lock() {
            Ok(mut out) => writeln!(out, "{line}").and_then(|()| out.flush()),
            Err(_) => Err(io::Error::other("notice writer poisoned")),
        };
        if let Err(err) = written {
            warn!(error = %err, notice = message, "failed to print notice");
        }
    }
}

/// Paint a screen view for the terminal.
pub fn paint(out: &mut impl io::Write, view: &ScreenView) -> io::Result<()> {
    match view {
        ScreenView::Loading { message } => writeln!(out, "{}", message.white()),
        ScreenView::Failed { message, detail } => {
            writeln!(out, "{}", message.red().bold())?;
            writeln!(out, "{}", detail.dimmed())
        }
        ScreenView::Forecast(view) => paint_forecast(out, view),
    }
}

fn paint_forecast(out: &mut impl io::Write, view: &ForecastView) -> io::Result<()> {
    writeln!(out, "{}", FRAME.repeat(16).bright_black())?;
    writeln!(out, "{}", view.title.white().bold())?;
    for line in [&view.temperature, &view.condition, &view.wind] {
        writeln!(out, "{}", line.white())?;
    }

    writeln!(out)?;
    writeln!(out, "{}", view.hourly_heading.white().bold())?;
    paint_hour_strip(out, &view.hourly)?;

    writeln!(out)?;
    writeln!(out, "{}", view.daily_heading.white().bold())?;
    for card in &view.daily {
        paint_day_card(out, card)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", footer(view).dimmed())?;
    writeln!(out, "{}", FRAME.repeat(16).bright_black())
}

/// Hourly cards side by side, one row per field.
fn paint_hour_strip(out: &mut impl io::Write, cards: &[HourCard]) -> io::Result<()> {
    writeln!(out, "{}", strip_row(cards, |c| c.hour.as_str()).white().bold())?;
    writeln!(out, "{}", strip_row(cards, |c| c.temperature.as_str()).white())?;
    writeln!(out, "{}", strip_row(cards, |c| c.wind.as_str()).white())
}

fn strip_row<'a>(cards: &'a [HourCard], field: impl Fn(&'a HourCard) -> &'a str) -> String {
    let row: String =
        cards.iter().map(|card| format!("{:<width$}", field(card), width = CARD_WIDTH)).collect();
    row.trim_end().to_string()
}

fn paint_day_card(out: &mut impl io::Write, card: &DayCard) -> io::Result<()> {
    writeln!(
        out,
        "{}  {}  {}  {}",
        card.date.white().bold(),
        card.max.white(),
        card.min.white(),
        card.condition.white(),
    )
}

fn footer(view: &ForecastView) -> String {
    let source = match view.source {
        LocationSource::Device => "sua localização",
        LocationSource::Fallback => "localização padrão",
    };
    let updated = view.fetched_at.with_timezone(&Local).format("%H:%M");

    match &view.timezone {
        Some(tz) => format!("{source} ({}) · {tz} · atualizado às {updated}", view.coordinate),
        None => format!("{source} ({}) · atualizado às {updated}", view.coordinate),
    }
}
