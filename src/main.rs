mod audio;
mod clock;
mod config;
mod doppler;
mod player;
mod scene;
mod tone;
mod ui;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SizedSample};
use dasp_sample::FromSample;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

use audio::AudioDriver;
use config::{AudioMode, Config};
use player::TonePlayer;
use ui::DopplerUI;

#[derive(Debug, Parser)]
#[command(name = "doppler-wave", about = "Interactive Doppler effect simulator", version)]
struct Args {
    /// Path to a TOML config; default: ./doppler.toml if present
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,

    /// Audio output mode
    #[arg(long, value_enum)]
    audio: Option<AudioMode>,

    /// Directory holding tone_<hz>.wav presets
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Scale volume by source/observer distance
    #[arg(long)]
    volume_aware: bool,

    /// Run without opening an audio output device
    #[arg(long)]
    no_audio_device: bool,
}

struct DopplerApp {
    ui: DopplerUI,
    _stream: Option<cpal::Stream>,
}

impl eframe::App for DopplerApp {
    fn update(&mut self, ctx: &eframe::egui::Context, _frame: &mut eframe::Frame) {
        self.ui.update(ctx);
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    player: &Arc<Mutex<TonePlayer>>,
) -> Result<cpal::Stream>
where
    T: Sample + SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let player = Arc::clone(player);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| write_data(data, channels, &player),
        |err| log::error!("an error occurred on stream: {}", err),
        None,
    )?;
    stream.play()?;
    Ok(stream)
}

fn write_data<T>(output: &mut [T], channels: usize, player: &Arc<Mutex<TonePlayer>>)
where
    T: Sample + FromSample<f32>,
{
    let mut player = player.lock();
    for frame in output.chunks_mut(channels) {
        let value = T::from_sample(player.next_sample());
        for sample in frame.iter_mut() {
            *sample = value;
        }
    }
}

fn open_audio() -> Result<(Arc<Mutex<TonePlayer>>, cpal::Stream)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no output device available"))?;
    log::info!("Output device: {}", device.name()?);

    let supported_config = device
        .supported_output_configs()
        .context("error while querying configs")?
        .next()
        .ok_or_else(|| anyhow!("no supported output config"))?
        .with_max_sample_rate();
    log::info!("Output config: {:?}", supported_config);

    let sample_format = supported_config.sample_format();
    let config: cpal::StreamConfig = supported_config.into();
    let player = Arc::new(Mutex::new(TonePlayer::new(config.sample_rate.0 as f32)));

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, &player)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, &player)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, &player)?,
        other => anyhow::bail!("Unsupported sample format: {:?}", other),
    };
    Ok((player, stream))
}

fn main() -> Result<()> {
    let args = Args::parse();
    simple_logger::SimpleLogger::new()
        .with_level(args.log_level)
        .init()
        .context("Install logger")?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(mode) = args.audio {
        config.audio.mode = mode;
    }
    if let Some(assets) = args.assets {
        config.audio.assets_dir = assets;
    }
    config.audio.volume_aware |= args.volume_aware;

    let (player, stream) = if args.no_audio_device {
        (None, None)
    } else {
        match open_audio() {
            Ok((player, stream)) => (Some(player), Some(stream)),
            Err(err) => {
                log::warn!("Audio disabled: {:#}", err);
                (None, None)
            }
        }
    };

    let ui = DopplerUI::new(&config.simulation, AudioDriver::new(player, config.audio.clone()));

    let options = eframe::NativeOptions {
        initial_window_size: Some(eframe::egui::Vec2::new(1200.0, 800.0)),
        ..Default::default()
    };

    eframe::run_native(
        "Doppler Simulator",
        options,
        Box::new(|_cc| Box::new(DopplerApp { ui, _stream: stream })),
    )
    .map_err(|e| anyhow!(e.to_string()))?;

    Ok(())
}
