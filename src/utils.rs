use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use image::RgbImage;

use crate::mode::Mode;

// make SharedState an alias for a Mutex protected struct State
pub type SharedState = Arc<Mutex<State>>;

/// Lock the shared state, recovering the data if another thread panicked
/// while holding it.
pub fn lock(state: &SharedState) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// data exchanged between the processing loop and the viewer window
pub struct State {
    pub fps: Option<f32>,
    pub fps_series: TimeSeries,
    pub last_frame_time: Option<SystemTime>,
    pub resolution: Option<(u32, u32)>,
    pub image: Option<RgbImage>,
    pub frame_id: u64,
    pub mode: Mode,

    // keys typed in the viewer, oldest first
    pub pending_keys: VecDeque<char>,
    // set by the viewer when the window closes
    pub window_closed: bool,
    // set by the processing loop when it exits
    pub finished: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            fps: None,
            fps_series: TimeSeries::new(10),
            last_frame_time: None,
            resolution: None,
            image: None,
            frame_id: 0,
            mode: Mode::default(),

            pending_keys: VecDeque::new(),
            window_closed: false,
            finished: false,
        }
    }
}

impl State {
    /// Record the arrival of a frame at `now` and refresh the rolling FPS.
    pub fn record_frame_time(&mut self, now: SystemTime) {
        if let Some(delta) = self
            .last_frame_time
            .and_then(|last| now.duration_since(last).ok())
            .filter(|d| !d.is_zero())
        {
            self.fps_series.push(1.0 / delta.as_secs_f32());
            self.fps = Some(self.fps_series.get_mean().round());
        }
        self.last_frame_time = Some(now);
    }
}

#[derive(Clone)]
pub struct TimeSeries {
    data: VecDeque<f32>,
    max_length: usize,
}

impl TimeSeries {
    pub fn new(max_length: usize) -> Self {
        Self {
            data: VecDeque::new(),
            max_length,
        }
    }

    pub fn push(&mut self, value: f32) {
        self.data.push_back(value);

        if self.data.len() > self.max_length {
            self.data.pop_front();
        }
    }

    pub fn get_mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f32>() / self.data.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn time_series_keeps_last_values() {
        let mut series = TimeSeries::new(3);
        assert_eq!(series.get_mean(), 0.0);
        for v in [1.0, 2.0, 3.0, 10.0] {
            series.push(v);
        }
        // 1.0 has dropped out of the window
        assert_eq!(series.get_mean(), 5.0);
    }

    #[test]
    fn fps_from_frame_deltas() {
        let mut state = State::default();
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        state.record_frame_time(start);
        assert_eq!(state.fps, None);
        state.record_frame_time(start + Duration::from_millis(40));
        state.record_frame_time(start + Duration::from_millis(80));
        assert_eq!(state.fps, Some(25.0));
    }
}
