use eframe::egui::{self, Color32, Vec2};
use std::time::{Duration, Instant};

use crate::audio::AudioDriver;
use crate::clock::SimulationClock;
use crate::config::{AudioMode, SimulationConfig};
use crate::doppler::{
    self, SimulationParameters, EMIT_FREQUENCY_RANGE, OBSERVER_POSITION_RANGE,
    SOUND_SPEED_RANGE, SOURCE_VELOCITY_RANGE,
};
use crate::scene;

pub struct DopplerUI {
    params: SimulationParameters,
    clock: SimulationClock,
    frame_delay: Duration,
    last_tick: Instant,
    audio: AudioDriver,
}

impl DopplerUI {
    pub fn new(simulation: &SimulationConfig, audio: AudioDriver) -> Self {
        Self {
            params: simulation.initial,
            clock: SimulationClock::new(simulation.frame_step, simulation.frame_cap()),
            frame_delay: Duration::from_millis(simulation.frame_delay_ms),
            last_tick: Instant::now(),
            audio,
        }
    }

    pub fn update(&mut self, ctx: &egui::Context) {
        self.tick();

        let now = self.clock.now();
        let signal = doppler::perceived_signal(&self.params, now, self.audio.volume_aware());
        let waves = doppler::emit_wavefronts(&self.params, now);
        self.audio.update(&signal);

        egui::SidePanel::left("parameters").min_width(260.0).show(ctx, |ui| {
            self.draw_header(ui);
            ui.add_space(10.0);
            self.draw_controls(ui);
            ui.add_space(10.0);
            self.draw_audio_controls(ui);
            ui.add_space(10.0);
            ui.separator();
            ui.label(format!("Elapsed time: {:.2} s (frame {})", now, self.clock.frame()));
            ui.label(format!("Source position: {:.1} m", self.params.source_position(now)));
            ui.label(format!("Wavefronts: {}", waves.len()));
            if signal.frequency > 0.0 {
                ui.label(format!("Perceived frequency: {:.3} Hz", signal.frequency));
            } else {
                ui.colored_label(Color32::DARK_RED, "Perceived frequency: silence (source at or above the speed of sound)");
            }
            if self.audio.volume_aware() {
                ui.label(format!("Amplitude: {:.2}", signal.amplitude));
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Circular waves emitted by a moving source");
            let width = ui.available_width();
            let height = (ui.available_height() - 180.0).max(200.0);
            scene::draw_wavefronts(ui, Vec2::new(width, height), &self.params, &waves, now);
            ui.add_space(8.0);
            let points = doppler::waveform_window(&signal);
            scene::draw_waveform(ui, Vec2::new(width, 150.0), &signal, &points);
        });

        if !self.clock.is_finished() {
            ctx.request_repaint_after(self.frame_delay);
        }
    }

    fn tick(&mut self) {
        if self.last_tick.elapsed() >= self.frame_delay {
            self.last_tick = Instant::now();
            self.clock.advance();
        }
    }

    fn draw_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Doppler Simulator");
            ui.add_space(10.0);
            if ui.button("Restart animation").clicked() {
                self.clock.reset();
                self.last_tick = Instant::now();
            }
        });
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.vertical(|ui| {
                ui.label("Emission frequency (Hz)");
                ui.add(egui::Slider::new(&mut self.params.emit_frequency, EMIT_FREQUENCY_RANGE).step_by(0.1));
                ui.label("Source velocity (m/s)");
                ui.add(egui::Slider::new(&mut self.params.source_velocity, SOURCE_VELOCITY_RANGE).step_by(1.0));
                ui.label("Speed of sound (m/s)");
                ui.add(egui::Slider::new(&mut self.params.sound_speed, SOUND_SPEED_RANGE).step_by(1.0));
                ui.label("Observer position (m)");
                ui.add(egui::Slider::new(&mut self.params.observer_position, OBSERVER_POSITION_RANGE).step_by(1.0));
            });
        });
    }

    fn draw_audio_controls(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.vertical(|ui| {
                ui.label("Audio");
                if !self.audio.has_device() {
                    ui.colored_label(Color32::GRAY, "No output device, audio disabled");
                    return;
                }
                let mut mode = self.audio.mode();
                ui.horizontal(|ui| {
                    for candidate in AudioMode::ALL {
                        ui.selectable_value(&mut mode, candidate, format!("{:?}", candidate));
                    }
                });
                self.audio.set_mode(mode);

                let mut volume_aware = self.audio.volume_aware();
                if ui.checkbox(&mut volume_aware, "Volume follows distance").changed() {
                    self.audio.set_volume_aware(volume_aware);
                }
                if self.audio.is_playing() {
                    ui.label("Playing");
                }
                if let Some(warning) = self.audio.warning() {
                    ui.colored_label(Color32::from_rgb(200, 120, 0), format!("⚠ {}", warning));
                }
            });
        });
    }
}
