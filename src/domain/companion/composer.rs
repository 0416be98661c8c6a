//! Context composition for the empathic companion.
//!
//! Fuses the stored profile, the latest mood, the best available camera
//! reading and the rolling summary into one system message, followed by the
//! trimmed history and the new user message. Composition is a pure function
//! of its inputs: the caller supplies `now`, so identical inputs always yield
//! identical message lists.
//!
//! Camera reading precedence:
//! 1. a live signal (already filtered for freshness by the caller);
//! 2. the latest stored camera log;
//! 3. an explicit "no camera reading" line.

use std::fmt::Write as _;

use super::message::ContextMessage;
use crate::domain::foundation::{Percentage, Timestamp};
use crate::domain::journal::{CameraLog, ConversationTurn, MoodEntry, Profile};
use crate::domain::vision::{Emotion, SignalMetrics, VisionSignal};

/// Maximum number of history turns included in the composed context.
pub const HISTORY_LIMIT: usize = 6;

/// Vision line used when neither a live signal nor a camera log exists.
pub const NO_VISION_READING: &str = "no camera reading is available";

/// Mood line used when the user has never logged a mood.
pub const NO_MOOD_LOGGED: &str = "no mood has been logged yet";

/// Summary line used when there is no earlier conversation.
pub const NO_SUMMARY: &str = "this is the start of the conversation";

const NOT_SHARED: &str = "not shared";

const GUIDELINES: &str = "Guidelines: reply in the language the user writes in. \
Be warm, brief and specific. Acknowledge the feeling before offering ideas. \
Treat the camera reading as a soft hint, never as a diagnosis, and do not mention \
it unless it helps. If the user mentions self-harm, gently encourage reaching out \
to a trusted person or local emergency services.";

/// Everything the composer reads for one chat turn.
#[derive(Debug, Clone, Copy)]
pub struct CompanionContext<'a> {
    pub profile: &'a Profile,
    pub latest_mood: Option<&'a MoodEntry>,
    pub latest_camera_log: Option<&'a CameraLog>,
    pub history: &'a [ConversationTurn],
    pub user_message: &'a str,
    pub summary: Option<&'a str>,
    pub live_signal: Option<&'a VisionSignal>,
    pub now: Timestamp,
}

/// Builds the role-tagged message list sent to the language model.
#[derive(Debug, Clone)]
pub struct ContextComposer {
    history_limit: usize,
}

impl Default for ContextComposer {
    fn default() -> Self {
        Self {
            history_limit: HISTORY_LIMIT,
        }
    }
}

impl ContextComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composes `[system, ..history (newest HISTORY_LIMIT), user]`.
    pub fn compose(&self, ctx: &CompanionContext<'_>) -> Vec<ContextMessage> {
        let history = trim_history(ctx.history, self.history_limit);

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ContextMessage::system(self.system_prompt(ctx)));
        messages.extend(history.iter().map(ContextMessage::from));
        messages.push(ContextMessage::user(ctx.user_message.trim()));
        messages
    }

    /// Renders the system message on its own.
    pub fn system_prompt(&self, ctx: &CompanionContext<'_>) -> String {
        let mut prompt = String::new();
        let profile = ctx.profile;

        let _ = writeln!(
            prompt,
            "You are Moodlens, an empathic journaling companion talking with {}.",
            display_or(&profile.nickname, "the user")
        );
        let _ = writeln!(prompt, "{}", profile_line(profile));
        let _ = writeln!(prompt, "Latest mood: {}.", mood_line(ctx.latest_mood, ctx.now));
        let _ = writeln!(
            prompt,
            "Camera: {}.",
            vision_line(ctx.live_signal, ctx.latest_camera_log, ctx.now)
        );
        match ctx.summary.map(str::trim).filter(|s| !s.is_empty()) {
            Some(summary) => {
                let _ = writeln!(prompt, "Earlier conversation:\n{}", summary);
            }
            None => {
                let _ = writeln!(prompt, "Earlier conversation: {}.", NO_SUMMARY);
            }
        }
        prompt.push_str(GUIDELINES);
        prompt
    }
}

/// Keeps the newest `limit` turns in their original order.
pub fn trim_history(history: &[ConversationTurn], limit: usize) -> &[ConversationTurn] {
    let skip = history.len().saturating_sub(limit);
    &history[skip..]
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

fn optional_or(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_SHARED)
}

fn profile_line(profile: &Profile) -> String {
    let focus = if profile.focus_areas.is_empty() {
        "none given".to_string()
    } else {
        profile.focus_areas.join(", ")
    };
    let enneagram = profile
        .enneagram
        .map(|e| format!("type {}", e))
        .unwrap_or_else(|| NOT_SHARED.to_string());

    let mut line = format!(
        "Profile: mood baseline {}; focus areas {}; MBTI {}; Enneagram {}; archetype {}; zodiac {}.",
        display_or(&profile.mood_baseline, NOT_SHARED),
        focus,
        optional_or(profile.mbti.as_deref()),
        enneagram,
        optional_or(profile.archetype.as_deref()),
        optional_or(profile.zodiac.as_deref()),
    );
    if let Some(notes) = profile.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        let _ = write!(line, " Notes from the user: {}", notes);
    }
    line
}

fn mood_line(mood: Option<&MoodEntry>, now: Timestamp) -> String {
    match mood {
        None => NO_MOOD_LOGGED.to_string(),
        Some(entry) => {
            let mut line = format!(
                "\"{}\" logged {} via {}",
                entry.mood(),
                relative_age(now.millis_since(&entry.created_at())),
                entry.source()
            );
            if let Some(note) = entry.note() {
                let _ = write!(line, " (note: {})", note);
            }
            line
        }
    }
}

struct Reading<'a> {
    emotion: Emotion,
    confidence: f64,
    metrics: &'a SignalMetrics,
    at: Timestamp,
}

impl<'a> From<&'a VisionSignal> for Reading<'a> {
    fn from(signal: &'a VisionSignal) -> Self {
        Self {
            emotion: signal.emotion(),
            confidence: signal.confidence(),
            metrics: signal.metrics(),
            at: signal.timestamp(),
        }
    }
}

impl<'a> From<&'a CameraLog> for Reading<'a> {
    fn from(log: &'a CameraLog) -> Self {
        Self {
            emotion: log.emotion,
            confidence: log.confidence,
            metrics: &log.metrics,
            at: log.captured_at,
        }
    }
}

fn vision_line(live: Option<&VisionSignal>, log: Option<&CameraLog>, now: Timestamp) -> String {
    let (label, reading) = match (live, log) {
        (Some(signal), _) => ("live reading", Reading::from(signal)),
        (None, Some(log)) => ("last stored reading", Reading::from(log)),
        (None, None) => return NO_VISION_READING.to_string(),
    };

    let m = reading.metrics;
    let mut line = format!(
        "{} from {}, looks {} ({} confidence); valence {}, energy {}, tension {}, focus {}",
        label,
        relative_age(now.millis_since(&reading.at)),
        reading.emotion,
        Percentage::from_score(reading.confidence),
        Percentage::from_signed_unit(m.valence()),
        Percentage::from_unit(m.energy()),
        Percentage::from_unit(m.tension()),
        Percentage::from_unit(m.focus()),
    );
    if let Some(tilt) = m.tilt().filter(|t| t.is_finite()) {
        let _ = write!(line, ", head tilt {}°", tilt.round() as i64);
    }
    if !m.cues().is_empty() {
        let _ = write!(line, "; cues: {}", m.cues().join(", "));
    }
    line
}

/// Human phrasing for an age in milliseconds.
pub fn relative_age(millis: i64) -> String {
    const SECOND: i64 = 1_000;
    const MINUTE: i64 = 60 * SECOND;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    fn plural(n: i64, unit: &str) -> String {
        if n == 1 {
            format!("1 {} ago", unit)
        } else {
            format!("{} {}s ago", n, unit)
        }
    }

    match millis {
        m if m < 5 * SECOND => "just now".to_string(),
        m if m < MINUTE => plural(m / SECOND, "second"),
        m if m < HOUR => plural(m / MINUTE, "minute"),
        m if m < DAY => plural(m / HOUR, "hour"),
        m => plural(m / DAY, "day"),
    }
}
