// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Onset detection and tempo-aligned loop points for samples.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use tracing::{debug, warn};

use super::voice::LoopPoints;
use crate::transport::TimeSignature;

/// Amplitude an onset must exceed: -40 dBFS.
pub const ONSET_THRESHOLD: f32 = 0.01;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("sample buffer is empty")]
    EmptyBuffer,
    #[error("invalid tempo {0}")]
    InvalidTempo(f64),
    #[error("invalid time signature {beats}/{unit}")]
    InvalidTimeSignature { beats: u32, unit: u32 },
    #[error("error reading WAV: {0}")]
    Wav(#[from] hound::Error),
}

/// Decoded audio, one vector of samples per channel.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> SampleBuffer {
        SampleBuffer {
            sample_rate,
            channels,
        }
    }

    /// Decodes a WAV file into normalized f32 channels.
    pub fn from_wav(path: &Path) -> Result<SampleBuffer, AnalysisError> {
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();
        let channel_count = usize::from(spec.channels.max(1));

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let mut channels = vec![Vec::with_capacity(interleaved.len() / channel_count); channel_count];
        for frame in interleaved.chunks(channel_count) {
            for (channel, sample) in frame.iter().enumerate() {
                channels[channel].push(*sample);
            }
        }

        debug!(
            path = ?path,
            sample_rate = spec.sample_rate,
            channels = channel_count,
            "Decoded WAV"
        );
        Ok(SampleBuffer::new(spec.sample_rate, channels))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, |c| c.len())
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// The first frame whose amplitude exceeds the threshold on the first channel.
    fn onset_frame(&self, threshold: f32) -> Option<usize> {
        self.channels
            .first()?
            .iter()
            .position(|sample| sample.abs() > threshold)
    }
}

/// Result of analyzing a sample against the current tempo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopAnalysis {
    /// Time of the first audible sample, in seconds.
    pub start_offset: f64,
    /// Whole bars the loop spans.
    pub bars: u32,
    /// The loop region to store on the pad.
    pub loop_points: LoopPoints,
    /// True if the nominal loop end ran past the buffer and was clipped.
    pub clipped: bool,
}

/// Finds the sample's audible onset and computes a loop that spans a whole
/// number of bars at the given tempo, starting at the onset. Bars are
/// measured the way the transport measures them, so a loop of one bar here
/// is one bar on the grid.
pub fn analyze_loop_points(
    buffer: &SampleBuffer,
    bpm: f64,
    signature: TimeSignature,
) -> Result<LoopAnalysis, AnalysisError> {
    if buffer.frames() == 0 || buffer.sample_rate == 0 {
        return Err(AnalysisError::EmptyBuffer);
    }
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(AnalysisError::InvalidTempo(bpm));
    }
    if signature.beats == 0 || signature.unit == 0 {
        return Err(AnalysisError::InvalidTimeSignature {
            beats: signature.beats,
            unit: signature.unit,
        });
    }

    let buffer_duration = buffer.duration();
    let start_offset = buffer
        .onset_frame(ONSET_THRESHOLD)
        .map_or(0.0, |frame| frame as f64 / f64::from(buffer.sample_rate));

    let seconds_per_bar = signature.seconds_per_bar(bpm);
    let effective_duration = buffer_duration - start_offset;
    let bars = ((effective_duration / seconds_per_bar).round() as u32).max(1);
    let target_duration = f64::from(bars) * seconds_per_bar;

    let nominal_end = start_offset + target_duration;
    let clipped = nominal_end > buffer_duration;
    let end = if clipped {
        warn!(
            nominal_end,
            buffer_duration, bars, "Loop end exceeds sample length, clipping to buffer end"
        );
        buffer_duration
    } else {
        nominal_end
    };

    Ok(LoopAnalysis {
        start_offset,
        bars,
        loop_points: LoopPoints {
            start: start_offset,
            end,
        },
        clipped,
    })
}

#[cfg(test)]
mod tests {
    use hound::{WavSpec, WavWriter};

    use super::*;

    const RATE: u32 = 1000;
    const FOUR_FOUR: TimeSignature = TimeSignature { beats: 4, unit: 4 };

    /// Silence for `silent` seconds, then a constant tone until `total` seconds.
    fn buffer(silent: f64, total: f64) -> SampleBuffer {
        let frames = (total * f64::from(RATE)) as usize;
        let onset = (silent * f64::from(RATE)) as usize;
        let samples = (0..frames)
            .map(|i| if i < onset { 0.001 } else { 0.5 })
            .collect();
        SampleBuffer::new(RATE, vec![samples])
    }

    #[test]
    fn test_onset_and_whole_bars() {
        // 120 BPM in 4/4: a bar is two seconds.
        let analysis = analyze_loop_points(&buffer(0.1, 4.3), 120.0, FOUR_FOUR).unwrap();
        assert!((analysis.start_offset - 0.1).abs() < 1e-9);
        assert_eq!(2, analysis.bars);
        assert!((analysis.loop_points.start - 0.1).abs() < 1e-9);
        assert!((analysis.loop_points.end - 4.1).abs() < 1e-9);
        assert!(!analysis.clipped);
    }

    #[test]
    fn test_short_sample_is_one_bar_and_clipped() {
        let analysis = analyze_loop_points(&buffer(0.0, 0.5), 120.0, FOUR_FOUR).unwrap();
        assert_eq!(1, analysis.bars);
        assert!(analysis.clipped);
        assert!((analysis.loop_points.end - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_rounding_up_overruns_buffer() {
        // 3.5s of audio after the onset rounds to two bars (4s), past the end.
        let analysis = analyze_loop_points(&buffer(0.5, 4.0), 120.0, FOUR_FOUR).unwrap();
        assert_eq!(2, analysis.bars);
        assert!(analysis.clipped);
        assert!((analysis.loop_points.end - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_compound_meter_bar_length() {
        // 6/8 at 120 BPM: six eighth notes make a 1.5s bar.
        let six_eight = TimeSignature::new(6, 8);
        let analysis = analyze_loop_points(&buffer(0.0, 1.5), 120.0, six_eight).unwrap();
        assert_eq!(1, analysis.bars);
        assert!(!analysis.clipped);
        assert!((analysis.loop_points.end - 1.5).abs() < 1e-9);

        let analysis = analyze_loop_points(&buffer(0.0, 3.0), 120.0, six_eight).unwrap();
        assert_eq!(2, analysis.bars);
        assert!(!analysis.clipped);
    }

    #[test]
    fn test_silent_sample_starts_at_zero() {
        let silent = SampleBuffer::new(RATE, vec![vec![0.0; 2000]]);
        let analysis = analyze_loop_points(&silent, 120.0, FOUR_FOUR).unwrap();
        assert_eq!(0.0, analysis.start_offset);
        assert_eq!(1, analysis.bars);
    }

    #[test]
    fn test_invalid_input() {
        let empty = SampleBuffer::new(RATE, vec![]);
        assert!(matches!(
            analyze_loop_points(&empty, 120.0, FOUR_FOUR),
            Err(AnalysisError::EmptyBuffer)
        ));
        assert!(matches!(
            analyze_loop_points(&buffer(0.0, 1.0), 0.0, FOUR_FOUR),
            Err(AnalysisError::InvalidTempo(_))
        ));
        assert!(matches!(
            analyze_loop_points(&buffer(0.0, 1.0), 120.0, TimeSignature::new(0, 4)),
            Err(AnalysisError::InvalidTimeSignature { beats: 0, unit: 4 })
        ));
    }

    #[test]
    fn test_from_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for i in 0..RATE {
            let value: i16 = if i < 250 { 0 } else { i16::MAX / 2 };
            writer.write_sample(value).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let buffer = SampleBuffer::from_wav(&path).unwrap();
        assert_eq!(RATE, buffer.sample_rate());
        assert_eq!(RATE as usize, buffer.frames());
        let analysis = analyze_loop_points(&buffer, 120.0, FOUR_FOUR).unwrap();
        assert!((analysis.start_offset - 0.25).abs() < 1e-9);
    }
}
