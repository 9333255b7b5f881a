//! Notifications flowing out of a workout session.

use crate::landmark::LandmarkFrame;
use crate::posture::PostureStatus;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

pub const MSG_BAD_POSTURE: &str = "Dangerous posture - straighten your back!";
pub const MSG_PUSHUP_DOWN: &str = "Good down position!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormFeedback {
    pub message: String,
    pub severity: Severity,
    pub timestamp_ms: u64,
}

impl FormFeedback {
    pub fn new(message: impl Into<String>, severity: Severity, timestamp_ms: u64) -> Self {
        Self {
            message: message.into(),
            severity,
            timestamp_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoachEvent {
    RepCounted { total: u32 },
    /// Edge-triggered; `frame` is `None` when tracking was lost
    PostureChanged {
        status: PostureStatus,
        frame: Option<LandmarkFrame>,
    },
    FormFeedback(FormFeedback),
    HoldTimeUpdated { elapsed_seconds: u64 },
}

impl CoachEvent {
    /// Short machine-friendly name, used for logs and exports
    pub fn kind(&self) -> &'static str {
        match self {
            CoachEvent::RepCounted { .. } => "rep_counted",
            CoachEvent::PostureChanged { .. } => "posture_changed",
            CoachEvent::FormFeedback(_) => "form_feedback",
            CoachEvent::HoldTimeUpdated { .. } => "hold_time_updated",
        }
    }
}

/// Receives session notifications. Every callback defaults to a no-op, so
/// implementors only override what they care about.
pub trait CoachListener {
    fn on_rep_counted(&mut self, _total: u32) {}

    fn on_posture_changed(&mut self, _status: PostureStatus, _frame: Option<&LandmarkFrame>) {}

    fn on_form_feedback(&mut self, _feedback: &FormFeedback) {}

    fn on_hold_time_updated(&mut self, _elapsed_seconds: u64) {}
}

/// Routes an event to the matching listener callback
pub fn dispatch(listener: &mut dyn CoachListener, event: &CoachEvent) {
    match event {
        CoachEvent::RepCounted { total } => listener.on_rep_counted(*total),
        CoachEvent::PostureChanged { status, frame } => {
            listener.on_posture_changed(*status, frame.as_ref())
        }
        CoachEvent::FormFeedback(fb) => listener.on_form_feedback(fb),
        CoachEvent::HoldTimeUpdated { elapsed_seconds } => {
            listener.on_hold_time_updated(*elapsed_seconds)
        }
    }
}

/// Forwards every notification over a channel, e.g. to a UI thread.
/// A hung-up receiver is ignored; the session never waits on listeners.
pub struct ChannelListener {
    tx: Sender<CoachEvent>,
}

impl ChannelListener {
    pub fn new(tx: Sender<CoachEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: CoachEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("event receiver dropped");
        }
    }
}

impl CoachListener for ChannelListener {
    fn on_rep_counted(&mut self, total: u32) {
        self.send(CoachEvent::RepCounted { total });
    }

    fn on_posture_changed(&mut self, status: PostureStatus, frame: Option<&LandmarkFrame>) {
        self.send(CoachEvent::PostureChanged {
            status,
            frame: frame.cloned(),
        });
    }

    fn on_form_feedback(&mut self, feedback: &FormFeedback) {
        self.send(CoachEvent::FormFeedback(feedback.clone()));
    }

    fn on_hold_time_updated(&mut self, elapsed_seconds: u64) {
        self.send(CoachEvent::HoldTimeUpdated { elapsed_seconds });
    }
}

/// Suppresses repeated warnings inside a cooldown window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WarningCooldown {
    last_warning_at: Option<u64>,
}

impl WarningCooldown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_warning_at(&self) -> Option<u64> {
        self.last_warning_at
    }

    /// True (and re-arms the window) when a warning may fire at `now_ms`.
    /// The first warning of a segment always fires; later ones need strictly
    /// more than `cooldown_ms` since the previous one.
    pub fn try_fire(&mut self, now_ms: u64, cooldown_ms: u64) -> bool {
        let ready = match self.last_warning_at {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > cooldown_ms,
        };
        if ready {
            self.last_warning_at = Some(now_ms);
        }
        ready
    }

    pub fn reset(&mut self) {
        self.last_warning_at = None;
    }
}
