//! Utility functions for servo calculations.
//! These functions are independent of `ServoConfig` and any HAL, so they can be tested in isolation.

use core::ops::Range;

const NANOS_IN_SEC: f32 = 1_000_000_000.0;

/// Tolerance used when comparing duty values.
pub const EPSILON: f32 = 0.01;

/// Returns true if `a` and `b` differ by less than [`EPSILON`].
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Maps pulse width in nanoseconds to absolute duty value (not percentage).
///
/// # Arguments
///
/// * `pulse_ns` - Pulse width in nanoseconds
/// * `frequency_hz` - PWM frequency in Hz
/// * `max_duty` - Maximum duty value (e.g., 65535 for 16-bit resolution)
pub fn pulse_to_duty(pulse_ns: u32, frequency_hz: f32, max_duty: f32) -> f32 {
    pulse_ns as f32 * frequency_hz * max_duty / NANOS_IN_SEC
}

/// Calculates duty range in absolute values for given pulse width range.
///
/// The result always lies within `0..=max_duty` and is never empty.
pub fn calc_duty_range(pulse_width_ns: Range<u32>, frequency_hz: f32, max_duty: f32) -> Range<f32> {
    let min_duty = pulse_to_duty(pulse_width_ns.start, frequency_hz, max_duty).min(max_duty);
    let max_duty_val = pulse_to_duty(pulse_width_ns.end, frequency_hz, max_duty).min(max_duty);

    // keep min < max even for degenerate configs
    let min_duty = min_duty.min((max_duty_val - 1.0).max(0.0));
    let max_duty_val = max_duty_val.max(min_duty + 1.0);

    min_duty..max_duty_val
}

/// Transforms angle in degrees to absolute duty value.
/// Angles outside `0..=max_angle` are constrained to the nearest bound.
pub fn angle_to_duty(angle: f32, max_angle: f32, duty_range: &Range<f32>) -> f32 {
    if max_angle <= 0.0 {
        return duty_range.start;
    }
    let normalized = (angle / max_angle).clamp(0.0, 1.0);
    duty_range.start + normalized * (duty_range.end - duty_range.start)
}

/// Transforms absolute duty value to angle in degrees (0.0..=max_angle).
pub fn duty_to_angle(duty: f32, max_angle: f32, duty_range: &Range<f32>) -> f32 {
    let span = duty_range.end - duty_range.start;
    if span <= 0.0 {
        return 0.0;
    }
    let normalized = ((duty - duty_range.start) / span).clamp(0.0, 1.0);
    normalized * max_angle
}
