use anyhow::Result;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{AudioConfig, AudioMode};
use crate::doppler::PerceivedSignal;
use crate::player::TonePlayer;
use crate::tone;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ToneKey {
    Silence,
    Preset(u32),
    // Hundredths of a hertz and of full scale.
    Synth { centi_hz: i64, centi_amp: i64 },
}

/// Decides per frame what the audio thread should be playing and loads it.
pub struct AudioDriver {
    player: Option<Arc<Mutex<TonePlayer>>>,
    config: AudioConfig,
    current: ToneKey,
    warning: Option<String>,
    missing: Option<PathBuf>,
}

impl AudioDriver {
    pub fn new(player: Option<Arc<Mutex<TonePlayer>>>, config: AudioConfig) -> Self {
        Self {
            player,
            config,
            current: ToneKey::Silence,
            warning: None,
            missing: None,
        }
    }

    pub fn has_device(&self) -> bool {
        self.player.is_some()
    }

    pub fn mode(&self) -> AudioMode {
        self.config.mode
    }

    pub fn set_mode(&mut self, mode: AudioMode) {
        if mode != self.config.mode {
            log::info!("Audio mode: {:?}", mode);
            self.config.mode = mode;
        }
    }

    pub fn volume_aware(&self) -> bool {
        self.config.volume_aware
    }

    pub fn set_volume_aware(&mut self, volume_aware: bool) {
        self.config.volume_aware = volume_aware;
    }

    pub fn is_playing(&self) -> bool {
        self.player.as_ref().map_or(false, |p| p.lock().is_playing())
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn update(&mut self, signal: &PerceivedSignal) {
        let Some(player) = self.player.clone() else {
            return;
        };

        let key = self.key_for(signal);
        let volume = match key {
            ToneKey::Preset(_) => signal.amplitude as f32,
            _ => 1.0,
        };
        player.lock().set_volume(volume);

        if key == self.current {
            if key == ToneKey::Silence {
                self.warning = None;
                self.missing = None;
            }
            return;
        }

        // A key that failed to load stays unset so the next frame retries it.
        match self.load(&player, key, signal) {
            Ok(true) => self.current = key,
            Ok(false) => self.current = ToneKey::Silence,
            Err(err) => {
                log::error!("Audio update failed: {:#}", err);
                self.warning = Some(format!("Audio error: {}", err));
                player.lock().silence();
                self.current = ToneKey::Silence;
            }
        }
    }

    fn key_for(&self, signal: &PerceivedSignal) -> ToneKey {
        match self.config.mode {
            AudioMode::Off => ToneKey::Silence,
            AudioMode::Preset if signal.frequency > 0.0 => {
                ToneKey::Preset(tone::nearest_preset(signal.frequency))
            }
            AudioMode::Synth if signal.is_audible() => ToneKey::Synth {
                centi_hz: (signal.frequency * 100.0).round() as i64,
                centi_amp: (signal.amplitude * 100.0).round() as i64,
            },
            _ => ToneKey::Silence,
        }
    }

    /// Returns false when the tone could not be loaded this frame.
    fn load(&mut self, player: &Mutex<TonePlayer>, key: ToneKey, signal: &PerceivedSignal) -> Result<bool> {
        self.warning = None;
        match key {
            ToneKey::Silence => player.lock().silence(),
            ToneKey::Preset(hz) => match tone::load_preset(&self.config.assets_dir, signal.frequency)? {
                Some(buffer) => {
                    log::debug!("Playing preset tone {} Hz", hz);
                    self.missing = None;
                    player.lock().load(&buffer);
                }
                None => {
                    let path = tone::preset_path(&self.config.assets_dir, hz);
                    if self.missing.as_ref() != Some(&path) {
                        log::warn!("Audio asset {} not found, skipping audio", path.display());
                    }
                    self.warning = Some(format!("Missing audio file: {}", path.display()));
                    self.missing = Some(path);
                    player.lock().silence();
                    return Ok(false);
                }
            },
            ToneKey::Synth { .. } => {
                log::debug!(
                    "Synthesizing {:.2} Hz at amplitude {:.2}",
                    signal.frequency,
                    signal.amplitude
                );
                let buffer = tone::synthesize_to_file(
                    &self.config.temp_path,
                    signal.frequency,
                    signal.amplitude,
                    self.config.sample_rate,
                    self.config.duration,
                )?;
                player.lock().load(&buffer);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::{preset_path, synthesize_tone, write_wav, ToneBuffer};
    use std::path::Path;
    use tempfile::TempDir;

    fn driver(mode: AudioMode, dir: &TempDir) -> (AudioDriver, Arc<Mutex<TonePlayer>>) {
        let player = Arc::new(Mutex::new(TonePlayer::new(44100.0)));
        let config = AudioConfig {
            mode,
            assets_dir: dir.path().to_path_buf(),
            temp_path: dir.path().join("tone.wav"),
            duration: 0.1,
            ..AudioConfig::default()
        };
        (AudioDriver::new(Some(Arc::clone(&player)), config), player)
    }

    fn write_preset(assets: &Path, hz: u32) {
        let tone = ToneBuffer {
            samples: synthesize_tone(hz as f64, 1.0, 44100, 0.05),
            sample_rate: 44100,
        };
        write_wav(&preset_path(assets, hz), &tone).unwrap();
    }

    fn signal(frequency: f64) -> PerceivedSignal {
        PerceivedSignal { frequency, amplitude: 1.0 }
    }

    #[test]
    fn off_mode_stays_silent() {
        let dir = tempfile::tempdir().unwrap();
        let (mut driver, player) = driver(AudioMode::Off, &dir);
        driver.update(&signal(440.0));
        assert!(!player.lock().is_playing());
        assert_eq!(driver.warning(), None);
    }

    #[test]
    fn synth_mode_plays_audible_tones_only() {
        let dir = tempfile::tempdir().unwrap();
        let (mut driver, player) = driver(AudioMode::Synth, &dir);
        driver.update(&signal(440.0));
        assert!(player.lock().is_playing());
        assert!(dir.path().join("tone.wav").exists());

        driver.update(&signal(2.3));
        assert!(!player.lock().is_playing());
    }

    #[test]
    fn missing_preset_warns_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let (mut driver, player) = driver(AudioMode::Preset, &dir);
        driver.update(&signal(2.0));
        assert!(!player.lock().is_playing());
        assert!(driver.warning().unwrap().contains("tone_220.wav"));

        driver.update(&signal(2.0));
        assert!(!player.lock().is_playing());
        assert!(driver.warning().is_some());

        driver.set_mode(AudioMode::Off);
        driver.update(&signal(2.0));
        assert_eq!(driver.warning(), None);
    }

    #[test]
    fn preset_added_later_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let (mut driver, player) = driver(AudioMode::Preset, &dir);
        driver.update(&signal(2.0));
        assert!(!player.lock().is_playing());

        write_preset(dir.path(), 220);
        driver.update(&signal(2.0));
        assert!(player.lock().is_playing());
        assert_eq!(driver.warning(), None);
    }

    #[test]
    fn preset_mode_loads_nearest_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut driver, player) = driver(AudioMode::Preset, &dir);
        write_preset(dir.path(), 330);

        driver.update(&signal(300.0));
        assert!(player.lock().is_playing());
        assert_eq!(driver.warning(), None);
    }

    #[test]
    fn no_device_is_a_no_op() {
        let mut driver = AudioDriver::new(None, AudioConfig { mode: AudioMode::Synth, ..AudioConfig::default() });
        driver.update(&signal(440.0));
        assert!(!driver.has_device());
    }
}
