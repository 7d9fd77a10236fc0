use colored::Colorize;
use lib_ranksync::{RankEntry, RankingView, StreamStatus};
use std::sync::Arc;

/// Remembers what was last put on screen.
#[derive(Default)]
pub struct ViewTracker {
    printed_rows: Option<Arc<Vec<RankEntry>>>,
    status: Option<StreamStatus>,
}

/// What changed since the last observed view.
#[derive(Debug, Default, PartialEq)]
pub struct Changes {
    pub status: bool,
    pub table: bool,
}

impl ViewTracker {
    /// Compares `view` with the rows last printed, not the last view seen,
    /// so rows that arrive while a foreground load hides the table are
    /// printed once it settles.
    pub fn observe(&mut self, view: &RankingView) -> Changes {
        let status = self.status != Some(view.stream_status);
        self.status = Some(view.stream_status);

        let fresh_rows = self
            .printed_rows
            .as_ref()
            .is_none_or(|printed| !Arc::ptr_eq(printed, &view.rankings));
        let table = fresh_rows && !view.is_loading;
        if table {
            self.printed_rows = Some(Arc::clone(&view.rankings));
        }

        Changes { status, table }
    }
}

/// Renders the first `top` rows of a view as a fixed-width table.
pub fn render_table(view: &RankingView, top: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>4}  {:<20} {:<16} {:>10}  {}\n", "RANK", "MEMBER", "GAME", "PLAYED", "LAST SEEN"));
    for entry in view.rankings.iter().take(top) {
        let name = entry.nickname.as_deref().unwrap_or(&entry.member_name);
        let last = entry
            .last_played_at
            .map(|t| t.with_timezone(&chrono::Local).format("%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:>4}  {:<20} {:<16} {:>10}  {}\n",
            entry.rank,
            truncate(name, 20),
            truncate(&entry.game_code, 16),
            entry.play_time_hms(),
            last
        ));
    }
    if view.rankings.is_empty() {
        out.push_str("  (no rankings)\n");
    }
    out
}

/// One-line summary of the flags and stream status.
pub fn render_status(view: &RankingView) -> String {
    let status = match view.stream_status {
        StreamStatus::Open => view.stream_status.as_str().green(),
        StreamStatus::Connecting => view.stream_status.as_str().yellow(),
        StreamStatus::Error => view.stream_status.as_str().red(),
        StreamStatus::Idle | StreamStatus::Unsupported => view.stream_status.as_str().dimmed(),
    };
    let mut line = format!("stream: {} | rows: {}", status, view.rankings.len());
    if view.is_loading {
        line.push_str(" | loading");
    }
    if view.is_refreshing {
        line.push_str(" | refreshing");
    }
    if let Some(at) = view.last_updated_at {
        line.push_str(&format!(" | updated {}", at.with_timezone(&chrono::Local).format("%H:%M:%S")));
    }
    if let Some(err) = &view.error {
        line.push_str(&format!(" | {}", err.to_string().red()));
    }
    line
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
