//! # Leaderboard Rows
//!
//! `RankEntry` is one row of the leaderboard exactly as the snapshot endpoint
//! described it at load time. Rows are never patched in place: every
//! successful load swaps the whole sequence.
//!
//! The snapshot endpoint is not strict about its envelope, so decoding is
//! done by hand from a `serde_json::Value` instead of a derived
//! `Deserialize`. A row with missing or oddly typed fields still becomes a
//! `RankEntry`; a body with an unknown shape becomes an empty leaderboard.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEntry {
    /// Game/account code identifying the player.
    pub game_code: String,
    /// Display name of the clan member.
    pub member_name: String,
    /// Secondary identity label (in-game nickname), when the server sends one.
    pub nickname: Option<String>,
    /// Server rank when provided, otherwise the 1-based position in the list.
    pub rank: u32,
    /// Cumulative play time, in seconds.
    pub total_play_time: u64,
    /// When the player was last seen in game.
    pub last_played_at: Option<DateTime<Utc>>,
}

impl RankEntry {
    /// Builds a row from one element of the snapshot list.
    ///
    /// `index` is the zero-based position of the element and only matters when
    /// the server did not send a usable `rank`.
    pub fn from_value(index: usize, value: &Value) -> Self {
        let positional = u32::try_from(index + 1).unwrap_or(u32::MAX);

        Self {
            game_code: first_string(value, &["gameCode", "code"]).unwrap_or_default(),
            member_name: first_string(value, &["memberName", "name"]).unwrap_or_default(),
            nickname: first_string(value, &["nickname", "gameNickname", "memberNickname"]),
            rank: value
                .get("rank")
                .and_then(as_whole_number)
                .and_then(|r| u32::try_from(r).ok())
                .filter(|r| *r > 0)
                .unwrap_or(positional),
            total_play_time: value.get("totalPlayTime").and_then(as_whole_number).unwrap_or(0),
            last_played_at: value.get("lastPlayedAt").and_then(as_timestamp),
        }
    }

    /// Formats `total_play_time` as `h:mm:ss`.
    pub fn play_time_hms(&self) -> String {
        let secs = self.total_play_time;
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Maps a snapshot response body onto an ordered list of rows.
///
/// Accepted shapes are a bare array, `{ "data": [...] }` and
/// `{ "data": { "items": [...] } }`. Anything else yields an empty list.
pub fn normalize_rankings(body: &Value) -> Vec<RankEntry> {
    let items = match body {
        Value::Array(items) => Some(items),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => Some(items),
            Some(Value::Object(data)) => data.get("items").and_then(Value::as_array),
            _ => None,
        },
        _ => None,
    };

    items
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(i, item)| RankEntry::from_value(i, item))
                .collect()
        })
        .unwrap_or_default()
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// Servers send play time as an integer, a float, or occasionally a numeric string.
fn as_whole_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64),
        _ => None,
    }
}

fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        // Epoch milliseconds.
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}
