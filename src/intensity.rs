//! Host-side source of the position bytes.
//!
//! A game reports a vibration speed (0.0..=1.0) several times a second. The
//! estimator turns that stream into a single intensity from two things: how far
//! the speed swings (amplitude) and how fast it oscillates (cycle time). The
//! result is then encoded as the servo angle byte sent over serial, where
//! intensity 0 parks the servo at its maximum angle.

use heapless::Deque;
use log::debug;

/// Max samples kept for the amplitude window. Oldest samples are dropped when full.
pub const SAMPLE_CAPACITY: usize = 256;
/// Max half-cycle durations kept for averaging.
pub const CYCLE_CAPACITY: usize = 16;

/// Speeds at or below this are treated as "not vibrating" and ignored.
const SPEED_FLOOR: f32 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub struct IntensityConfig {
    /// Half-cycle duration that maps to the lowest cycle intensity.
    pub cycle_max_ms: u32,
    /// Half-cycle duration at or below which cycle intensity is 1.
    pub cycle_min_ms: u32,
    /// How many recent half-cycles are averaged. Capped at [`CYCLE_CAPACITY`].
    pub cycle_max_samples: usize,
    /// Window the amplitude is measured over.
    pub amplitude_sample_ms: u32,
    /// Angle sent for intensity 0.
    pub servo_max_degrees: u8,
    /// Silence after which history is dropped and the servo released.
    pub idle_timeout_ms: u32,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            cycle_max_ms: 1500,
            cycle_min_ms: 200,
            cycle_max_samples: 6,
            amplitude_sample_ms: 5000,
            servo_max_degrees: 180,
            idle_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    speed: f32,
    timestamp_ms: u32,
}

/// Rolling intensity estimate over a stream of speed samples.
pub struct IntensityEstimator {
    config: IntensityConfig,
    samples: Deque<Sample, SAMPLE_CAPACITY>,
    cycle_times_ms: Deque<u32, CYCLE_CAPACITY>,
    falling_ms: Option<u32>,
    rising_ms: Option<u32>,
    last_command_ms: Option<u32>,
}

impl IntensityEstimator {
    pub fn new(config: IntensityConfig) -> Self {
        Self {
            config,
            samples: Deque::new(),
            cycle_times_ms: Deque::new(),
            falling_ms: None,
            rising_ms: None,
            last_command_ms: None,
        }
    }

    pub fn config(&self) -> &IntensityConfig {
        &self.config
    }

    /// Timestamp of the last [`update`](Self::update), quiet samples included.
    /// `None` right after creation or [`reset`](Self::reset).
    pub fn last_command_ms(&self) -> Option<u32> {
        self.last_command_ms
    }

    /// Feeds one speed sample taken at `timestamp_ms` (monotonic).
    ///
    /// Returns the new intensity in `0.0..=1.0`, or `None` if the sample was
    /// below the vibration floor and left the estimate untouched.
    pub fn update(&mut self, speed: f32, timestamp_ms: u32) -> Option<f32> {
        self.last_command_ms = Some(timestamp_ms);
        if speed <= SPEED_FLOOR {
            return None;
        }

        let avg_cycle_ms = match self.samples.back().copied() {
            Some(last) => {
                self.track_edges(last.speed, speed, timestamp_ms);
                self.avg_cycle_ms()
            }
            None => None,
        };

        push_evicting(
            &mut self.samples,
            Sample {
                speed,
                timestamp_ms,
            },
        );
        while let Some(oldest) = self.samples.front() {
            if timestamp_ms.wrapping_sub(oldest.timestamp_ms) > self.config.amplitude_sample_ms {
                self.samples.pop_front();
            } else {
                break;
            }
        }

        let amplitude = self.amplitude();
        let cycle_intensity = self.cycle_intensity(avg_cycle_ms);
        let intensity = amplitude * cycle_intensity;
        debug!("{amplitude:.2} {cycle_intensity:.2} -> {intensity:.2}");
        Some(intensity)
    }

    /// Drops all history if nothing arrived for `idle_timeout_ms`.
    /// Returns true when that happened; the caller should then send intensity 0.
    pub fn poll_timeout(&mut self, now_ms: u32) -> bool {
        match self.last_command_ms {
            Some(last) if now_ms.wrapping_sub(last) >= self.config.idle_timeout_ms => {
                debug!("stop by timeout");
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Clears samples, half-cycles and edge timestamps.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.cycle_times_ms.clear();
        self.falling_ms = None;
        self.rising_ms = None;
        self.last_command_ms = None;
    }

    /// Encodes `intensity` as the angle byte for this configuration.
    pub fn angle(&self, intensity: f32) -> u8 {
        intensity_to_angle(intensity, self.config.servo_max_degrees)
    }

    fn track_edges(&mut self, previous: f32, speed: f32, timestamp_ms: u32) {
        if previous > speed {
            if let (Some(falling), Some(rising)) = (self.falling_ms, self.rising_ms)
                && falling < rising
            {
                self.push_cycle(rising - falling);
            }
            self.falling_ms = Some(timestamp_ms);
        }
        if previous < speed {
            if let (Some(falling), Some(rising)) = (self.falling_ms, self.rising_ms)
                && rising < falling
            {
                self.push_cycle(falling - rising);
            }
            self.rising_ms = Some(timestamp_ms);
        }

        let keep = self.config.cycle_max_samples.min(CYCLE_CAPACITY);
        while self.cycle_times_ms.len() > keep {
            self.cycle_times_ms.pop_front();
        }
    }

    fn push_cycle(&mut self, duration_ms: u32) {
        push_evicting(&mut self.cycle_times_ms, duration_ms);
    }

    fn avg_cycle_ms(&self) -> Option<f32> {
        if self.cycle_times_ms.is_empty() {
            return None;
        }
        let total: u64 = self.cycle_times_ms.iter().map(|&t| t as u64).sum();
        Some(total as f32 / self.cycle_times_ms.len() as f32)
    }

    fn amplitude(&self) -> f32 {
        let (min, max) = self
            .samples
            .iter()
            .fold((f32::MAX, f32::MIN), |(min, max), s| {
                (min.min(s.speed), max.max(s.speed))
            });
        if self.samples.is_empty() { 0.0 } else { max - min }
    }

    fn cycle_intensity(&self, avg_cycle_ms: Option<f32>) -> f32 {
        let max = self.config.cycle_max_ms as f32;
        let min = self.config.cycle_min_ms as f32;
        let cycle_ms = match avg_cycle_ms {
            Some(avg) if avg > 0.0 => avg,
            _ => max,
        };
        if max <= min {
            return 1.0;
        }
        clamp_unit((max + min - cycle_ms) / (max - min))
    }
}

/// Maps intensity to a servo angle: 0 gives `max_degrees`, 1 and above give 0.
pub fn intensity_to_angle(intensity: f32, max_degrees: u8) -> u8 {
    (max_degrees as f32 * clamp_unit(1.0 - intensity)) as u8
}

/// Appends `item`, dropping the oldest entry first when `deque` is full.
fn push_evicting<T, const N: usize>(deque: &mut Deque<T, N>, item: T) {
    if deque.is_full() {
        deque.pop_front();
    }
    if deque.push_back(item).is_err() {
        // only reachable for a zero-capacity deque
        debug_assert!(N == 0, "deque still full after eviction");
    }
}

fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}
