use crate::render;
use crate::timer::{DelayTimer, TimerHandle};
use std::time::{Duration, Instant};
use storewidgets_core::config::PopupConfig;
use storewidgets_core::contract::PopupView;
use storewidgets_core::matcher::{match_group, VariantGroupEntry};
use tracing::{debug, info};

/// Popup presenter states.
#[derive(Debug, Clone, PartialEq)]
enum State {
    /// Nothing rendered; a timer may be pending.
    Hidden,
    /// Entered only when the delay timer fires.
    Visible,
    /// Closed by the user. Terminal until the widget is remounted.
    Dismissed,
}

/// Actions that the widget wants the host to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Show(PopupView),
    Hide,
}

/// Observable popup state.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupState {
    pub visible: bool,
    pub matched_group_id: Option<String>,
}

/// The inputs whose change triggers a re-evaluation.
#[derive(Debug, Clone, PartialEq)]
struct Dependencies {
    variant: Option<i64>,
    entries: Vec<VariantGroupEntry>,
    delay: Duration,
    enabled: bool,
}

/// One mounted instance of the promotional popup. Dropping it (via
/// `unmount`) discards all state, including a dismissal.
pub struct PopupWidget {
    state: State,
    deps: Dependencies,
    message: String,
    matched_group_id: Option<String>,
    timer: DelayTimer<i64>,
    pending: Option<TimerHandle>,
}

impl PopupWidget {
    pub fn mount(config: &PopupConfig, variant: Option<i64>, now: Instant) -> Self {
        let mut widget = Self {
            state: State::Hidden,
            deps: Dependencies {
                variant,
                entries: config.entries(),
                delay: config.delay(),
                enabled: config.enabled(),
            },
            message: config.message().to_string(),
            matched_group_id: None,
            timer: DelayTimer::new(),
            pending: None,
        };
        info!(entries = widget.deps.entries.len(), enabled = widget.deps.enabled, "popup mounted");
        widget.reevaluate(now);
        widget
    }

    /// Cancel any pending timer and tear the widget down.
    pub fn unmount(mut self) -> Vec<Action> {
        self.timer.cancel_all();
        info!("popup unmounted");
        if self.state == State::Visible {
            vec![Action::Hide]
        } else {
            Vec::new()
        }
    }

    pub fn state(&self) -> PopupState {
        PopupState {
            visible: self.state == State::Visible,
            matched_group_id: self.matched_group_id.clone(),
        }
    }

    pub fn set_variant(&mut self, variant: Option<i64>, now: Instant) -> Vec<Action> {
        if self.deps.variant == variant {
            return Vec::new();
        }
        debug!(?variant, "current variant changed");
        self.deps.variant = variant;
        self.reevaluate(now);
        Vec::new()
    }

    /// Apply new block props. Only a change to the entries, delay or enabled
    /// flag reschedules; a message change re-renders a visible popup.
    pub fn set_config(&mut self, config: &PopupConfig, now: Instant) -> Vec<Action> {
        let deps = Dependencies {
            variant: self.deps.variant,
            entries: config.entries(),
            delay: config.delay(),
            enabled: config.enabled(),
        };
        let message_changed = self.message != config.message();
        self.message = config.message().to_string();

        if deps != self.deps {
            debug!("popup config changed");
            self.deps = deps;
            self.reevaluate(now);
        }

        if message_changed && self.state == State::Visible {
            vec![Action::Show(self.view())]
        } else {
            Vec::new()
        }
    }

    /// User closed the popup. No-op unless it is visible.
    pub fn dismiss(&mut self) -> Vec<Action> {
        if self.state == State::Visible {
            debug!("popup dismissed");
            self.state = State::Dismissed;
            return vec![Action::Hide];
        }
        Vec::new()
    }

    /// Flip to visible if the pending delay has elapsed.
    pub fn check_timer(&mut self, now: Instant) -> Vec<Action> {
        let Some(group_id) = self.timer.fire_due(now) else {
            return Vec::new();
        };
        self.pending = None;
        if self.state != State::Hidden {
            return Vec::new();
        }
        debug!(group_id, "popup delay elapsed, showing popup");
        self.matched_group_id = Some(group_id.to_string());
        self.state = State::Visible;
        vec![Action::Show(self.view())]
    }

    /// The next `Instant` at which `check_timer()` needs to run, or `None`
    /// if no timer is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.next_deadline()
    }

    pub fn view(&self) -> PopupView {
        render::popup_view(&self.message, self.matched_group_id.as_deref())
    }

    fn reevaluate(&mut self, now: Instant) {
        // Only a hidden popup can still be scheduled.
        if self.state != State::Hidden {
            return;
        }
        if let Some(handle) = self.pending.take() {
            self.timer.cancel(handle);
        }

        if !self.deps.enabled {
            debug!("popup disabled");
            return;
        }

        match match_group(self.deps.variant, &self.deps.entries) {
            Some(group_id) => {
                debug!(variant = ?self.deps.variant, group_id, "variant matched, scheduling popup");
                self.matched_group_id = Some(group_id.to_string());
                self.pending = Some(self.timer.schedule(now, self.deps.delay, group_id));
            }
            None => {
                debug!(variant = ?self.deps.variant, "no matching entry");
            }
        }
    }
}
