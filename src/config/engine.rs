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
use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::pads::PadDefinition;
use crate::engine::EngineSettings;
use crate::looper::DEFAULT_SLOTS;
use crate::state::{PadMapping, PerformanceState};
use crate::transport::{Quantization, TimeSignature, DEFAULT_TICKS_PER_BEAT};
use crate::{PadId, NUM_COLUMNS};

/// Default clock driver period in milliseconds.
pub const DEFAULT_RESOLUTION_MS: u64 = 1;

/// Default priority for the clock driver thread.
pub const DEFAULT_THREAD_PRIORITY: u8 = 70;

/// Transport settings, fixed at startup.
#[derive(Deserialize, Clone, Copy, Serialize, Debug)]
pub struct TransportConfig {
    #[serde(default = "default_ticks_per_beat")]
    ticks_per_beat: u64,

    #[serde(default = "default_bpm")]
    bpm: f64,

    #[serde(default)]
    time_signature: TimeSignature,
}

fn default_ticks_per_beat() -> u64 {
    DEFAULT_TICKS_PER_BEAT
}

fn default_bpm() -> f64 {
    120.0
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            ticks_per_beat: default_ticks_per_beat(),
            bpm: default_bpm(),
            time_signature: TimeSignature::default(),
        }
    }
}

/// Clock driver settings.
#[derive(Deserialize, Clone, Copy, Serialize, Debug, PartialEq, Eq)]
pub struct ClockConfig {
    #[serde(default = "default_resolution_ms")]
    resolution_ms: u64,

    /// 0-99; omit to leave the thread at its default priority.
    #[serde(default = "default_thread_priority")]
    thread_priority: Option<u8>,
}

fn default_resolution_ms() -> u64 {
    DEFAULT_RESOLUTION_MS
}

fn default_thread_priority() -> Option<u8> {
    Some(DEFAULT_THREAD_PRIORITY)
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            resolution_ms: default_resolution_ms(),
            thread_priority: default_thread_priority(),
        }
    }
}

impl ClockConfig {
    pub fn resolution(&self) -> Duration {
        Duration::from_millis(self.resolution_ms.max(1))
    }

    pub fn thread_priority(&self) -> Option<u8> {
        self.thread_priority
    }
}

/// The YAML layout of an engine configuration file.
#[derive(Deserialize, Clone, Serialize, Debug)]
pub struct EngineFile {
    #[serde(default)]
    transport: TransportConfig,

    #[serde(default)]
    quantization: Quantization,

    #[serde(default = "default_slots")]
    slots: usize,

    #[serde(default)]
    clock: ClockConfig,

    #[serde(default)]
    pads: Vec<PadDefinition>,
}

fn default_slots() -> usize {
    DEFAULT_SLOTS
}

impl EngineFile {
    /// Checks every field and resolves the pad table.
    pub fn validate(&self) -> Result<EngineConfig, ConfigError> {
        let transport = self.transport;
        if !transport.bpm.is_finite() || transport.bpm <= 0.0 {
            return Err(ConfigError::InvalidTempo(transport.bpm));
        }
        let signature = transport.time_signature;
        if signature.beats == 0 || !matches!(signature.unit, 1 | 2 | 4 | 8 | 16 | 32) {
            return Err(ConfigError::InvalidTimeSignature {
                beats: signature.beats,
                unit: signature.unit,
            });
        }
        if transport.ticks_per_beat == 0 {
            return Err(ConfigError::InvalidTicksPerBeat(transport.ticks_per_beat));
        }
        if self.slots == 0 || self.slots > NUM_COLUMNS {
            return Err(ConfigError::InvalidSlots {
                slots: self.slots,
                max: NUM_COLUMNS,
            });
        }

        let mut pads = HashMap::new();
        for definition in &self.pads {
            let (pad, mapping) = definition.to_mapping()?;
            if pads.insert(pad, mapping).is_some() {
                return Err(ConfigError::DuplicatePad(definition.pad()));
            }
        }

        Ok(EngineConfig {
            settings: EngineSettings {
                ticks_per_beat: transport.ticks_per_beat,
                bpm: transport.bpm,
                time_signature: signature,
                slots: self.slots,
            },
            quantization: self.quantization,
            clock: self.clock,
            pads,
        })
    }
}

/// A validated engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    settings: EngineSettings,
    quantization: Quantization,
    clock: ClockConfig,
    pads: HashMap<PadId, PadMapping>,
}

impl EngineConfig {
    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn quantization(&self) -> Quantization {
        self.quantization
    }

    pub fn clock(&self) -> ClockConfig {
        self.clock
    }

    pub fn pads(&self) -> &HashMap<PadId, PadMapping> {
        &self.pads
    }

    /// The initial performance state for this configuration.
    pub fn performance_state(&self) -> PerformanceState {
        PerformanceState::new(self.pads.clone(), self.quantization, self.settings.slots)
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;
    use crate::voices::PlaybackMode;

    fn parse(yaml: &str) -> EngineFile {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
            transport:
              ticks_per_beat: 96
              bpm: 90.5
              time_signature:
                beats: 7
                unit: 8
            quantization: 1/8
            slots: 4
            clock:
              resolution_ms: 2
              thread_priority: 50
            pads:
              - pad: 0
                type: drum
                note: 36
                choke_group: 1
              - pad: 9
                type: synth
                preset: bass
                mode: gate
            "#,
        )
        .validate()
        .unwrap();

        let settings = config.settings();
        assert_eq!(96, settings.ticks_per_beat);
        assert_eq!(90.5, settings.bpm);
        assert_eq!(TimeSignature::new(7, 8), settings.time_signature);
        assert_eq!(4, settings.slots);
        assert_eq!(Quantization::Eighth, config.quantization());
        assert_eq!(Duration::from_millis(2), config.clock().resolution());
        assert_eq!(Some(50), config.clock().thread_priority());
        assert_eq!(2, config.pads().len());
        assert_eq!(
            PlaybackMode::Gate,
            config.pads().get(&PadId(9)).unwrap().mode
        );

        let state = config.performance_state();
        assert_eq!(4, state.loop_slots().len());
        assert_eq!(Quantization::Eighth, state.launch_quantization());
    }

    #[test]
    fn test_defaults() {
        let config = parse("slots: 6\n").validate().unwrap();
        assert_eq!(EngineSettings::default(), config.settings());
        assert_eq!(Quantization::Bar, config.quantization());
        assert_eq!(ClockConfig::default(), config.clock());
        assert!(config.pads().is_empty());
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            parse("transport:\n  bpm: 0\n").validate(),
            Err(ConfigError::InvalidTempo(_))
        ));
        assert!(matches!(
            parse("transport:\n  time_signature:\n    beats: 4\n    unit: 3\n").validate(),
            Err(ConfigError::InvalidTimeSignature { beats: 4, unit: 3 })
        ));
        assert!(matches!(
            parse("transport:\n  ticks_per_beat: 0\n").validate(),
            Err(ConfigError::InvalidTicksPerBeat(0))
        ));
        assert!(matches!(
            parse("slots: 9\n").validate(),
            Err(ConfigError::InvalidSlots { slots: 9, .. })
        ));
        assert!(matches!(
            parse("pads:\n  - pad: 5\n    type: drum\n  - pad: 5\n    type: synth\n").validate(),
            Err(ConfigError::DuplicatePad(5))
        ));
    }
}
