use crate::tone::ToneBuffer;
use dasp_sample::FromSample;
use std::sync::atomic::{AtomicU32, Ordering};

/// Loops a PCM buffer on the audio thread, stepping through it at the
/// buffer's own rate regardless of the device rate.
pub struct TonePlayer {
    samples: Vec<f32>,
    position: f64,
    increment: f64,
    device_rate: f32,
    volume: AtomicU32,
}

impl TonePlayer {
    pub fn new(device_rate: f32) -> Self {
        Self {
            samples: Vec::new(),
            position: 0.0,
            increment: 1.0,
            device_rate,
            volume: AtomicU32::new(1.0f32.to_bits()),
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let volume = f32::from_bits(self.volume.load(Ordering::Relaxed));

        let len = self.samples.len();
        let index = self.position as usize % len;
        let frac = (self.position - self.position.floor()) as f32;
        let current = self.samples[index];
        let next = self.samples[(index + 1) % len];
        self.position = (self.position + self.increment) % len as f64;

        (current + (next - current) * frac) * volume
    }

    pub fn load(&mut self, tone: &ToneBuffer) {
        self.samples = tone.samples.iter().map(|&s| f32::from_sample_(s)).collect();
        self.increment = tone.sample_rate as f64 / self.device_rate as f64;
        if self.position >= self.samples.len() as f64 {
            self.position = 0.0;
        }
    }

    pub fn silence(&mut self) {
        self.samples.clear();
        self.position = 0.0;
    }

    pub fn is_playing(&self) -> bool {
        !self.samples.is_empty()
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume.store(volume.to_bits(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(sample_rate: u32) -> ToneBuffer {
        ToneBuffer {
            samples: vec![0, 8192, 16384, 24576],
            sample_rate,
        }
    }

    #[test]
    fn empty_player_is_silent() {
        let mut player = TonePlayer::new(44100.0);
        assert!(!player.is_playing());
        assert_eq!(player.next_sample(), 0.0);
    }

    #[test]
    fn loops_at_matching_rate() {
        let mut player = TonePlayer::new(44100.0);
        player.load(&ramp(44100));
        let out: Vec<f32> = (0..8).map(|_| player.next_sample()).collect();
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.25);
        assert_eq!(out[4], 0.0);
        assert_eq!(out[7], 0.75);
    }

    #[test]
    fn resamples_to_device_rate() {
        let mut player = TonePlayer::new(88200.0);
        player.load(&ramp(44100));
        let out: Vec<f32> = (0..3).map(|_| player.next_sample()).collect();
        assert_eq!(out, vec![0.0, 0.125, 0.25]);
    }

    #[test]
    fn volume_and_silence() {
        let mut player = TonePlayer::new(44100.0);
        player.load(&ramp(44100));
        player.set_volume(0.5);
        player.next_sample();
        assert_eq!(player.next_sample(), 0.125);
        player.silence();
        assert!(!player.is_playing());
        assert_eq!(player.next_sample(), 0.0);
    }
}
