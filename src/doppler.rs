use serde::Deserialize;
use std::f64::consts::PI;
use std::ops::RangeInclusive;

pub const EMIT_FREQUENCY_RANGE: RangeInclusive<f64> = 0.5..=10.0;
pub const SOURCE_VELOCITY_RANGE: RangeInclusive<f64> = -100.0..=100.0;
pub const SOUND_SPEED_RANGE: RangeInclusive<f64> = 100.0..=500.0;
pub const OBSERVER_POSITION_RANGE: RangeInclusive<f64> = -50.0..=150.0;

/// Lowest frequency worth sending to the speakers.
pub const AUDIBLE_FLOOR_HZ: f64 = 20.0;

const PROXIMITY_FLOOR: f64 = 0.05;
const PROXIMITY_FALLOFF_M: f64 = 5.0;

const WAVEFORM_WINDOW_S: f64 = 0.02;
const WAVEFORM_POINTS: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub emit_frequency: f64,
    pub source_velocity: f64,
    pub sound_speed: f64,
    pub observer_position: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            emit_frequency: 2.0,
            source_velocity: 0.0,
            sound_speed: 343.0,
            observer_position: 0.0,
        }
    }
}

impl SimulationParameters {
    pub fn validate(&self) -> anyhow::Result<()> {
        check_range("emit_frequency", self.emit_frequency, &EMIT_FREQUENCY_RANGE)?;
        check_range("source_velocity", self.source_velocity, &SOURCE_VELOCITY_RANGE)?;
        check_range("sound_speed", self.sound_speed, &SOUND_SPEED_RANGE)?;
        check_range("observer_position", self.observer_position, &OBSERVER_POSITION_RANGE)?;
        Ok(())
    }

    pub fn source_position(&self, now: f64) -> f64 {
        self.source_velocity * now
    }
}

fn check_range(name: &str, value: f64, range: &RangeInclusive<f64>) -> anyhow::Result<()> {
    if !range.contains(&value) {
        anyhow::bail!(
            "{} = {} is outside {}..={}",
            name,
            value,
            range.start(),
            range.end()
        );
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wavefront {
    pub emitted_at: f64,
    pub center: f64,
    pub radius: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerceivedSignal {
    pub frequency: f64,
    pub amplitude: f64,
}

impl PerceivedSignal {
    pub fn is_audible(&self) -> bool {
        self.frequency >= AUDIBLE_FLOOR_HZ
    }
}

/// Every wavefront emitted in `[0, now)`, oldest (largest) first.
///
/// Emissions happen at `k / emit_frequency`, so the count is
/// `ceil(now * emit_frequency)`: the emission at `t = 0` is always included
/// once `now > 0`. It grows without bound as `now` grows, so the caller is
/// responsible for capping the clock.
pub fn emit_wavefronts(params: &SimulationParameters, now: f64) -> Vec<Wavefront> {
    let f = params.emit_frequency;
    if !(f.is_finite() && f > 0.0) || !(now > 0.0) {
        return Vec::new();
    }

    let period = 1.0 / f;
    (0u64..)
        .map(|k| k as f64 * period)
        .take_while(|&t| t < now)
        .map(|t| Wavefront {
            emitted_at: t,
            center: params.source_velocity * t,
            radius: params.sound_speed * (now - t),
        })
        .collect()
}

/// Frequency heard at `observer_pos` at time `now`, or 0.0 for silence.
///
/// Approaching versus receding is decided only by which side of the
/// observer the source currently sits on (`source_pos - observer_pos > 0`
/// counts as receding), not by the direction of relative motion. A source
/// with negative velocity that has passed the observer to the left is
/// therefore treated as approaching. This approximation is kept as-is.
pub fn perceived_frequency(params: &SimulationParameters, observer_pos: f64, now: f64) -> f64 {
    let d = params.source_position(now) - observer_pos;
    let relative_speed = if d > 0.0 {
        params.sound_speed - params.source_velocity
    } else {
        params.sound_speed + params.source_velocity
    };

    if relative_speed > 0.0 {
        params.emit_frequency * params.sound_speed / relative_speed
    } else {
        0.0
    }
}

/// Synthetic loudness in `[0.05, 1.0]`, falling off with distance.
pub fn proximity_amplitude(distance: f64) -> f64 {
    (1.0 / (1.0 + distance.abs() / PROXIMITY_FALLOFF_M)).clamp(PROXIMITY_FLOOR, 1.0)
}

pub fn perceived_signal(params: &SimulationParameters, now: f64, volume_aware: bool) -> PerceivedSignal {
    let frequency = perceived_frequency(params, params.observer_position, now);
    let amplitude = if volume_aware {
        proximity_amplitude(params.source_position(now) - params.observer_position)
    } else {
        1.0
    };
    PerceivedSignal { frequency, amplitude }
}

/// The perceived waveform sampled over the first 20 ms, as `[t, y]` points.
pub fn waveform_window(signal: &PerceivedSignal) -> Vec<[f64; 2]> {
    let step = WAVEFORM_WINDOW_S / (WAVEFORM_POINTS - 1) as f64;
    (0..WAVEFORM_POINTS)
        .map(|i| {
            let t = i as f64 * step;
            [t, signal.amplitude * (2.0 * PI * signal.frequency * t).sin()]
        })
        .collect()
}
