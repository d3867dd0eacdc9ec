use serde::{Deserialize, Serialize};

use crate::score::StatsView;

/// Every state change a rendering layer cares about produces an Event.
///
/// Events are delivered synchronously through an [`EventBus`]; the
/// timer returns them from its transitions and the controller forwards
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A camera session began and was counted.
    SessionStarted { stats: StatsView },
    /// Score data changed (session start, completion, reset).
    ScoreUpdated { stats: StatsView },
    TimerStarted,
    TimerUpdated { elapsed_secs: f64 },
    /// Fires at most once per timer run.
    GoalReached { elapsed_secs: f64 },
    TimerReset,
    /// Smile detected while idle; the timer display should appear.
    ShowTimer,
    /// Challenge recorded; the celebration animation should begin.
    CelebrationStarted {
        duration_secs: f64,
        is_new_record: bool,
    },
    /// Animation finished; show the summary with post-completion stats.
    CelebrationFinished {
        duration_secs: f64,
        is_new_record: bool,
        message: String,
        stats: StatsView,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStarted,
    ScoreUpdated,
    TimerStarted,
    TimerUpdated,
    GoalReached,
    TimerReset,
    ShowTimer,
    CelebrationStarted,
    CelebrationFinished,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::SessionStarted { .. } => EventKind::SessionStarted,
            Event::ScoreUpdated { .. } => EventKind::ScoreUpdated,
            Event::TimerStarted => EventKind::TimerStarted,
            Event::TimerUpdated { .. } => EventKind::TimerUpdated,
            Event::GoalReached { .. } => EventKind::GoalReached,
            Event::TimerReset => EventKind::TimerReset,
            Event::ShowTimer => EventKind::ShowTimer,
            Event::CelebrationStarted { .. } => EventKind::CelebrationStarted,
            Event::CelebrationFinished { .. } => EventKind::CelebrationFinished,
        }
    }
}

type Handler = Box<dyn FnMut(&Event)>;

/// Publish/subscribe hub with typed subscriptions.
///
/// Handlers run synchronously in registration order. `None` as the
/// filter subscribes to every event.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(Option<EventKind>, Handler)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one event kind.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.subscribers.push((Some(kind), Box::new(handler)));
    }

    /// Subscribe to every event.
    pub fn subscribe_all<F>(&mut self, handler: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.subscribers.push((None, Box::new(handler)));
    }

    pub fn publish(&mut self, event: &Event) {
        let kind = event.kind();
        for (filter, handler) in &mut self.subscribers {
            if filter.map_or(true, |k| k == kind) {
                handler(event);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
