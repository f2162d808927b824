//! Per-label fade transitions.
//!
//! A [`FadeState`] moves one label part (text or icon) between hidden and
//! visible over a fixed duration, easing opacity with smootherstep. States
//! are independent of each other; the placement pass decides the direction
//! once per frame and then advances every visited state with
//! [`FadeState::update_fading`].

use crate::config::DEFAULT_FADE_DURATION;

/// Discrete phase of a fade transition
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FadingState {
    /// Never shown, or reset after a gap in updates
    #[default]
    Undefined,
    FadingIn,
    FadedIn,
    FadingOut,
    FadedOut,
}

impl FadingState {
    /// Opacity at the start and end of the transition this state represents
    fn endpoints(self) -> (f64, f64) {
        match self {
            FadingState::FadingIn | FadingState::FadedIn => (0.0, 1.0),
            FadingState::FadingOut | FadingState::FadedOut => (1.0, 0.0),
            FadingState::Undefined => (0.0, 0.0),
        }
    }

    pub fn is_transitioning(self) -> bool {
        matches!(self, FadingState::FadingIn | FadingState::FadingOut)
    }
}

/// Smootherstep easing: zero first and second derivative at both ends.
/// Symmetric (`f(1 - t) == 1 - f(t)`), which keeps reversals seamless.
#[inline]
pub fn smootherstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Fade state of one independently faded label part
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeState {
    state: FadingState,
    /// Normalized progress of the current transition in [0, 1]
    value: f64,
    start_time: f64,
    opacity: f64,
    /// Frame this state was last driven by the placement pass
    last_frame_number: Option<u64>,
    duration: f64,
}

impl Default for FadeState {
    fn default() -> Self {
        Self::with_duration(DEFAULT_FADE_DURATION)
    }
}

impl FadeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(duration: f64) -> Self {
        Self {
            state: FadingState::Undefined,
            value: 0.0,
            start_time: 0.0,
            opacity: 0.0,
            last_frame_number: None,
            duration: duration.max(0.0),
        }
    }

    pub fn state(&self) -> FadingState {
        self.state
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn last_frame_number(&self) -> Option<u64> {
        self.last_frame_number
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Change the transition length. An in-flight transition keeps its
    /// progress and continues at the new rate.
    pub fn set_duration(&mut self, duration: f64, time: f64) {
        let duration = duration.max(0.0);
        if duration == self.duration {
            return;
        }
        if self.state.is_transitioning() {
            self.start_time = time - self.value * duration;
        }
        self.duration = duration;
    }

    /// True while the part is on screen: fading in, faded in, or fading out
    pub fn is_visible(&self) -> bool {
        matches!(
            self.state,
            FadingState::FadingIn | FadingState::FadedIn | FadingState::FadingOut
        )
    }

    /// Not driven on the immediately preceding frame
    pub fn is_stale(&self, frame: u64) -> bool {
        match self.last_frame_number {
            Some(last) => frame.saturating_sub(last) > 1,
            None => false,
        }
    }

    /// Forget any transition; the next start re-seeds from an endpoint
    pub fn reset(&mut self) {
        self.state = FadingState::Undefined;
        self.value = 0.0;
        self.opacity = 0.0;
    }

    /// Begin fading in at `time`. A fade-out in progress is reversed from
    /// its current opacity.
    pub fn start_fade_in(&mut self, frame: u64, time: f64) {
        if self.is_stale(frame) {
            self.reset();
        }
        match self.state {
            FadingState::FadingIn | FadingState::FadedIn => {}
            FadingState::FadingOut => self.reverse(FadingState::FadingIn, time),
            FadingState::Undefined | FadingState::FadedOut => {
                self.state = FadingState::FadingIn;
                self.start_time = time;
                self.value = 0.0;
                self.opacity = 0.0;
            }
        }
    }

    /// Begin fading out at `time`. A fade-in in progress is reversed from
    /// its current opacity; a part that was never shown goes straight to
    /// `FadedOut`.
    pub fn start_fade_out(&mut self, frame: u64, time: f64) {
        if self.is_stale(frame) {
            self.reset();
        }
        match self.state {
            FadingState::FadingOut | FadingState::FadedOut => {}
            FadingState::FadingIn => self.reverse(FadingState::FadingOut, time),
            FadingState::FadedIn => {
                self.state = FadingState::FadingOut;
                self.start_time = time;
                self.value = 0.0;
                self.opacity = 1.0;
            }
            FadingState::Undefined => self.finish(FadingState::FadedOut),
        }
    }

    /// Hide immediately without a transition
    pub fn hide(&mut self, frame: u64) {
        self.finish(FadingState::FadedOut);
        self.last_frame_number = Some(frame);
    }

    /// Per-frame entry point for a placed label part. Starts the fade when
    /// forced, or when the state is undefined or stale; always stamps the
    /// frame.
    pub fn check_start_fade_in(&mut self, frame: u64, time: f64, force: bool) {
        if force || self.state == FadingState::Undefined || self.is_stale(frame) {
            self.start_fade_in(frame, time);
        }
        self.last_frame_number = Some(frame);
    }

    /// Per-frame entry point for a label part that was not placed
    pub fn check_start_fade_out(&mut self, frame: u64, time: f64, force: bool) {
        if force || self.state == FadingState::Undefined || self.is_stale(frame) {
            self.start_fade_out(frame, time);
        }
        self.last_frame_number = Some(frame);
    }

    /// Advance an in-flight transition to `time`. Returns whether the part
    /// is currently visible.
    pub fn update_fading(&mut self, time: f64, disable_fading: bool) -> bool {
        if !self.state.is_transitioning() {
            return self.is_visible();
        }

        let elapsed = time - self.start_time;
        if disable_fading || elapsed >= self.duration {
            let terminal = match self.state {
                FadingState::FadingIn => FadingState::FadedIn,
                _ => FadingState::FadedOut,
            };
            self.finish(terminal);
        } else {
            self.value = (elapsed / self.duration).clamp(0.0, 1.0);
            let (start, end) = self.state.endpoints();
            self.opacity = (start + (end - start) * smootherstep(self.value)).clamp(0.0, 1.0);
        }
        self.is_visible()
    }

    /// Back-date the start so the new direction continues from the current
    /// opacity instead of restarting at an endpoint
    fn reverse(&mut self, state: FadingState, time: f64) {
        let value = 1.0 - self.value;
        self.state = state;
        self.value = value;
        self.start_time = time - value * self.duration;
    }

    fn finish(&mut self, state: FadingState) {
        self.state = state;
        self.value = 1.0;
        self.opacity = match state {
            FadingState::FadedIn => 1.0,
            _ => 0.0,
        };
    }
}
