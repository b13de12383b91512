use anyhow::{Context, Result};
use dasp_sample::FromSample;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

pub const PRESET_FREQUENCIES: [u32; 5] = [220, 330, 440, 550, 660];

/// Mono PCM audio plus the rate it was recorded at.
#[derive(Clone, Debug, PartialEq)]
pub struct ToneBuffer {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

/// Sine tone as signed 16-bit samples, `round(sample_rate * duration)` long.
pub fn synthesize_tone(frequency: f64, amplitude: f64, sample_rate: u32, duration: f64) -> Vec<i16> {
    let rate = sample_rate as f64;
    let len = (rate * duration).round().max(0.0) as usize;
    let full_scale = i16::MAX as f64;

    (0..len)
        .map(|n| {
            let t = n as f64 / rate;
            let value = amplitude * (2.0 * PI * frequency * t).sin() * full_scale;
            value.round().clamp(i16::MIN as f64, full_scale) as i16
        })
        .collect()
}

pub fn write_wav(path: &Path, tone: &ToneBuffer) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: tone.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Create WAV file {}", path.display()))?;
    for &sample in &tone.samples {
        writer.write_sample(sample)?;
    }
    writer
        .finalize()
        .with_context(|| format!("Finalize WAV file {}", path.display()))?;
    Ok(())
}

/// Reads the first channel of a WAV file as 16-bit samples.
pub fn read_wav(path: &Path) -> Result<ToneBuffer> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("Open WAV file {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, bits) if bits <= 16 => {
            let shift = 16 - bits;
            reader
                .samples::<i16>()
                .map(|s| s.map(|s| s << shift))
                .collect::<Result<Vec<i16>, _>>()
                .with_context(|| format!("Decode WAV file {}", path.display()))?
        }
        (SampleFormat::Int, bits) => {
            let shift = bits - 16;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| (s >> shift) as i16))
                .collect::<Result<Vec<i16>, _>>()
                .with_context(|| format!("Decode WAV file {}", path.display()))?
        }
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .map(|s| s.map(i16::from_sample_))
            .collect::<Result<Vec<i16>, _>>()
            .with_context(|| format!("Decode WAV file {}", path.display()))?,
    };

    Ok(ToneBuffer {
        samples: interleaved.into_iter().step_by(channels).collect(),
        sample_rate: spec.sample_rate,
    })
}

/// Writes the tone to `path`, replacing whatever was there, then reads it
/// back for playback.
pub fn synthesize_to_file(
    path: &Path,
    frequency: f64,
    amplitude: f64,
    sample_rate: u32,
    duration: f64,
) -> Result<ToneBuffer> {
    let tone = ToneBuffer {
        samples: synthesize_tone(frequency, amplitude, sample_rate, duration),
        sample_rate,
    };
    write_wav(path, &tone)?;
    read_wav(path)
}

pub fn nearest_preset(frequency: f64) -> u32 {
    PRESET_FREQUENCIES
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = (*a as f64 - frequency).abs();
            let db = (*b as f64 - frequency).abs();
            da.total_cmp(&db)
        })
        .unwrap_or(PRESET_FREQUENCIES[0])
}

pub fn preset_path(assets_dir: &Path, preset: u32) -> PathBuf {
    assets_dir.join(format!("tone_{}.wav", preset))
}

/// Loads the pre-recorded tone closest to `frequency`.
///
/// A missing file is not an error: `Ok(None)` is returned so the frame
/// simply plays nothing.
pub fn load_preset(assets_dir: &Path, frequency: f64) -> Result<Option<ToneBuffer>> {
    let path = preset_path(assets_dir, nearest_preset(frequency));
    if !path.exists() {
        return Ok(None);
    }
    read_wav(&path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_length_matches_rate_and_duration() {
        assert_eq!(synthesize_tone(440.0, 1.0, 44100, 1.0).len(), 44100);
        assert_eq!(synthesize_tone(440.0, 1.0, 44100, 0.5).len(), 22050);
        assert_eq!(synthesize_tone(440.0, 1.0, 8000, 0.00006).len(), 0);
        assert_eq!(synthesize_tone(440.0, 1.0, 8000, 0.0001).len(), 1);
    }

    #[test]
    fn tone_stays_in_range() {
        let samples = synthesize_tone(523.25, 1.0, 44100, 1.0);
        assert!(samples.iter().all(|s| s.unsigned_abs() <= 32767));
    }

    #[test]
    fn tone_scales_with_amplitude() {
        let samples = synthesize_tone(441.0, 0.25, 44100, 0.1);
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!((peak as i32 - 8192).abs() <= 1, "peak {}", peak);
    }

    #[test]
    fn tone_is_periodic() {
        // 441 Hz at 44.1 kHz repeats every 100 samples.
        let samples = synthesize_tone(441.0, 1.0, 44100, 1.0);
        for n in 0..samples.len() - 100 {
            let diff = (samples[n] as i32 - samples[n + 100] as i32).abs();
            assert!(diff <= 1, "sample {} differs by {}", n, diff);
        }
    }

    #[test]
    fn nearest_preset_picks_closest() {
        assert_eq!(nearest_preset(2.0), 220);
        assert_eq!(nearest_preset(300.0), 330);
        assert_eq!(nearest_preset(446.0), 440);
        assert_eq!(nearest_preset(10_000.0), 660);
    }

    #[test]
    fn wav_round_trip_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round_trip.wav");
        let tone = ToneBuffer {
            samples: synthesize_tone(330.0, 0.8, 44100, 0.25),
            sample_rate: 44100,
        };
        write_wav(&path, &tone).unwrap();
        assert_eq!(read_wav(&path).unwrap(), tone);
    }

    #[test]
    fn eight_bit_wav_is_scaled_to_sixteen_bits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eight_bit.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 8,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for sample in [0i8, 127, 0, -128] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let read = read_wav(&path).unwrap();
        assert_eq!(read.samples, vec![0, 32512, 0, -32768]);
        assert_eq!(read.sample_rate, 8000);
    }

    #[test]
    fn stereo_wav_keeps_first_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for sample in [100i16, -1, 200, -2, 300, -3] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        assert_eq!(read_wav(&path).unwrap().samples, vec![100, 200, 300]);
    }

    #[test]
    fn synthesize_to_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overwrite.wav");
        let first = synthesize_to_file(&path, 220.0, 1.0, 44100, 0.5).unwrap();
        let second = synthesize_to_file(&path, 660.0, 0.5, 22050, 0.2).unwrap();
        assert_eq!(first.samples.len(), 22050);
        assert_eq!(second.samples.len(), 4410);
        assert_eq!(second.sample_rate, 22050);
    }

    #[test]
    fn missing_preset_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_preset(dir.path(), 440.0).unwrap(), None);
    }

    #[test]
    fn preset_is_loaded_from_assets_dir() {
        let dir = tempfile::tempdir().unwrap();
        let tone = ToneBuffer {
            samples: synthesize_tone(550.0, 1.0, 44100, 0.1),
            sample_rate: 44100,
        };
        write_wav(&preset_path(dir.path(), 550), &tone).unwrap();
        assert_eq!(load_preset(dir.path(), 530.0).unwrap(), Some(tone));
    }
}
