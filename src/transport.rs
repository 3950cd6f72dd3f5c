//! # Transport Module
//!
//! The external clock interface the synchronizer is driven by.
//!
//! The engine never generates ticks itself; the host owns the tick source
//! (an animation-frame loop, a timer) and feeds the transport's current
//! time into [`Synchronizer::render_at`](crate::sync::Synchronizer::render_at).

/// A rate-adjustable playback clock with discontinuous seeking.
pub trait Transport {
    /// The master time, in seconds.
    fn current_time(&self) -> f64;

    /// Playback-rate multiplier (1.0 = real time).
    fn set_rate(&mut self, rate: f64);

    fn play(&mut self);

    fn pause(&mut self);

    fn is_playing(&self) -> bool;

    /// Jumps the clock to `time`, clamped to `[0, total_duration]`.
    fn seek(&mut self, time: f64);

    fn total_duration(&self) -> f64;

    /// Updates the clock's length when the timeline's content changes.
    fn set_total_duration(&mut self, total: f64);
}

/// A host-driven transport: the owner calls [`TickTransport::advance`] from
/// its frame loop and the clock accumulates scaled elapsed time.
#[derive(Debug, Clone)]
pub struct TickTransport {
    time: f64,
    rate: f64,
    playing: bool,
    total: f64,
}

impl TickTransport {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            rate: 1.0,
            playing: false,
            total: 0.0,
        }
    }

    /// Advances the clock by `dt` wall seconds, rate applied.
    ///
    /// The clock stops at the end of the timeline rather than running past
    /// it.
    pub fn advance(&mut self, dt: f64) {
        if !self.playing {
            return;
        }
        self.time = (self.time + dt * self.rate).min(self.total);
        if self.time >= self.total {
            self.playing = false;
        }
    }
}

impl Default for TickTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TickTransport {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate.max(0.0);
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn seek(&mut self, time: f64) {
        self.time = time.clamp(0.0, self.total);
    }

    fn total_duration(&self) -> f64 {
        self.total
    }

    fn set_total_duration(&mut self, total: f64) {
        self.total = total.max(0.0);
        self.time = self.time.min(self.total);
    }
}
