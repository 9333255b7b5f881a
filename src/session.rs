use crate::config::CoachConfig;
use crate::events::{
    dispatch, CoachEvent, CoachListener, FormFeedback, Severity, WarningCooldown,
    MSG_BAD_POSTURE, MSG_PUSHUP_DOWN,
};
use crate::exercise::ExerciseMode;
use crate::hold_timer::{HoldTick, HoldTimer};
use crate::landmark::LandmarkFrame;
use crate::posture::{PostureClassifier, PostureStatus, PostureVerdict};
use crate::reps::{Phase, PhaseChange, RepCounter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostureState {
    pub status: PostureStatus,
    pub last_change_at: Option<u64>,
}

/// Everything that is reset when a segment restarts or the mode changes
#[derive(Debug, Clone)]
pub struct SessionState {
    pub counter: RepCounter,
    pub hold: HoldTimer,
    pub posture: PostureState,
    pub cooldown: WarningCooldown,
}

impl SessionState {
    fn new(mode: ExerciseMode, config: &CoachConfig) -> Self {
        Self {
            counter: RepCounter::new(mode, config),
            hold: HoldTimer::new(),
            posture: PostureState::default(),
            cooldown: WarningCooldown::new(),
        }
    }
}

/// Snapshot returned by [`WorkoutSession::stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub mode: ExerciseMode,
    pub count: u32,
    pub phase: Phase,
    pub posture: PostureStatus,
    pub elapsed_seconds: u64,
}

/// One active workout segment: owns the classifier, the rep counter or hold
/// timer for the current mode, and the warning cooldown. Feed it one frame
/// at a time.
pub struct WorkoutSession {
    mode: ExerciseMode,
    config: CoachConfig,
    classifier: PostureClassifier,
    session_state: SessionState,
    listeners: Vec<Box<dyn CoachListener + Send>>,
}

impl std::fmt::Debug for WorkoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkoutSession")
            .field("mode", &self.mode)
            .field("config", &self.config)
            .field("session_state", &self.session_state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl WorkoutSession {
    pub fn new(mode: ExerciseMode) -> Self {
        Self::with_config(mode, CoachConfig::default())
    }

    pub fn with_config(mode: ExerciseMode, config: CoachConfig) -> Self {
        Self {
            mode,
            config,
            classifier: PostureClassifier::new(&config),
            session_state: SessionState::new(mode, &config),
            listeners: Vec::new(),
        }
    }

    pub fn mode(&self) -> ExerciseMode {
        self.mode
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn add_listener<L: CoachListener + Send + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    /// Switches exercise and discards all counters, timers and posture state
    pub fn set_exercise_mode(&mut self, mode: ExerciseMode) {
        log::debug!("exercise mode {} -> {}", self.mode, mode);
        self.mode = mode;
        self.session_state = SessionState::new(mode, &self.config);
    }

    /// Zeroes counters and clears posture/timer state, keeping the mode
    pub fn reset(&mut self) {
        self.session_state = SessionState::new(self.mode, &self.config);
    }

    pub(crate) fn state(&self) -> &SessionState {
        &self.session_state
    }

    pub fn stats(&self, now_ms: u64) -> SessionStats {
        let state = &self.session_state;
        SessionStats {
            mode: self.mode,
            count: state.counter.count(),
            phase: state.counter.phase(),
            posture: state.posture.status,
            elapsed_seconds: state.hold.elapsed_seconds(now_ms),
        }
    }

    /// Processes one frame from the pose provider. `None` means tracking was
    /// lost. Returns the notifications emitted for this frame, in order; the
    /// same events have already been delivered to every listener.
    pub fn process_frame(&mut self, frame: Option<&LandmarkFrame>, now_ms: u64) -> Vec<CoachEvent> {
        let mut events = Vec::new();

        match frame {
            None => self.on_tracking_lost(now_ms, &mut events),
            Some(frame) => self.on_landmarks(frame, now_ms, &mut events),
        }

        for listener in self.listeners.iter_mut() {
            for event in &events {
                dispatch(listener.as_mut(), event);
            }
        }

        events
    }

    fn on_tracking_lost(&mut self, now_ms: u64, events: &mut Vec<CoachEvent>) {
        self.update_posture(PostureStatus::Unknown, None, now_ms, events);
        self.pause_hold(now_ms, events);
    }

    fn on_landmarks(&mut self, frame: &LandmarkFrame, now_ms: u64, events: &mut Vec<CoachEvent>) {
        let verdict = self.classifier.evaluate(frame, self.mode);
        self.update_posture(verdict.into(), Some(frame), now_ms, events);

        if verdict != PostureVerdict::Correct {
            self.warn_bad_form(now_ms, events);
            self.pause_hold(now_ms, events);
            return;
        }

        if self.mode.is_timed() {
            let hold = &mut self.session_state.hold;
            hold.tick(true, now_ms);
            events.push(CoachEvent::HoldTimeUpdated {
                elapsed_seconds: hold.elapsed_seconds(now_ms),
            });
            return;
        }

        if let Some(change) = self.session_state.counter.update(frame) {
            self.on_phase_change(change, now_ms, events);
        }
    }

    fn on_phase_change(&mut self, change: PhaseChange, now_ms: u64, events: &mut Vec<CoachEvent>) {
        match change.counted {
            Some(total) => {
                events.push(CoachEvent::RepCounted { total });
                events.push(CoachEvent::FormFeedback(FormFeedback::new(
                    rep_message(self.mode, total),
                    Severity::Success,
                    now_ms,
                )));
            }
            None if self.mode == ExerciseMode::PushUps && change.to == Phase::Down => {
                events.push(CoachEvent::FormFeedback(FormFeedback::new(
                    MSG_PUSHUP_DOWN,
                    Severity::Success,
                    now_ms,
                )));
            }
            None => {}
        }
    }

    /// Edge-triggered: only a change of status produces an event
    fn update_posture(
        &mut self,
        status: PostureStatus,
        frame: Option<&LandmarkFrame>,
        now_ms: u64,
        events: &mut Vec<CoachEvent>,
    ) {
        let posture = &mut self.session_state.posture;
        if posture.status == status {
            return;
        }
        log::debug!("posture {} -> {}", posture.status, status);
        posture.status = status;
        posture.last_change_at = Some(now_ms);
        events.push(CoachEvent::PostureChanged {
            status,
            frame: frame.cloned(),
        });
    }

    fn warn_bad_form(&mut self, now_ms: u64, events: &mut Vec<CoachEvent>) {
        let Some(cooldown_ms) = self.config.warning_cooldown_ms(self.mode) else {
            return;
        };
        if self.session_state.cooldown.try_fire(now_ms, cooldown_ms) {
            events.push(CoachEvent::FormFeedback(FormFeedback::new(
                MSG_BAD_POSTURE,
                Severity::Warning,
                now_ms,
            )));
        } else {
            log::trace!("form warning suppressed by cooldown at {now_ms}ms");
        }
    }

    fn pause_hold(&mut self, now_ms: u64, events: &mut Vec<CoachEvent>) {
        let hold = &mut self.session_state.hold;
        if hold.tick(false, now_ms) == HoldTick::Paused {
            events.push(CoachEvent::HoldTimeUpdated {
                elapsed_seconds: hold.elapsed_seconds(now_ms),
            });
        }
    }
}

fn rep_message(mode: ExerciseMode, total: u32) -> String {
    match mode {
        ExerciseMode::PushUps => format!("Perfect push-up! Count: {total}"),
        ExerciseMode::Squats => format!("Squat {total}"),
        ExerciseMode::Lunges => format!("Lunge {total}"),
        ExerciseMode::Plank => format!("Rep {total}"),
    }
}
