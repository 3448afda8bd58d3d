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
use std::path::Path;

use config::{Config, File};
use tracing::info;

mod engine;
mod error;
mod pads;

pub use engine::{ClockConfig, EngineConfig, EngineFile, TransportConfig};
pub use error::ConfigError;
pub use pads::{PadDefinition, PadType};

/// Loads and validates an engine configuration from a YAML file.
pub fn load(path: &Path) -> Result<EngineConfig, ConfigError> {
    let file = Config::builder()
        .add_source(File::from(path))
        .build()?
        .try_deserialize::<EngineFile>()?;
    let config = file.validate()?;
    info!(
        path = %path.display(),
        pads = config.pads().len(),
        slots = config.settings().slots,
        "Loaded engine config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::PadId;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        fs::write(
            &path,
            "quantization: 1/4\npads:\n  - pad: 12\n    type: sample\n    file: snare.wav\n",
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert!(config.pads().contains_key(&PadId(12)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("missing.yaml")),
            Err(ConfigError::Load(_))
        ));
    }
}
