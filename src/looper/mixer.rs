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
use super::track::LoopTrack;
use crate::NUM_COLUMNS;

/// Per-column mixer flags. Updates build a new value rather than mutating in
/// place, so readers on another context never see a half-applied change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackStates {
    pub mute: [bool; NUM_COLUMNS],
    pub solo: [bool; NUM_COLUMNS],
}

impl TrackStates {
    pub fn any_solo(&self) -> bool {
        self.solo.iter().any(|s| *s)
    }

    /// Whether the mixer silences a column. Solo wins over mute: when any
    /// column is soloed only soloed columns are heard.
    pub fn is_silenced(&self, column: usize) -> bool {
        if column >= NUM_COLUMNS {
            return false;
        }
        if self.any_solo() {
            !self.solo[column]
        } else {
            self.mute[column]
        }
    }

    pub fn with_mute(self, column: usize, muted: bool) -> TrackStates {
        let mut mute = self.mute;
        if let Some(flag) = mute.get_mut(column) {
            *flag = muted;
        }
        TrackStates { mute, ..self }
    }

    pub fn with_solo(self, column: usize, soloed: bool) -> TrackStates {
        let mut solo = self.solo;
        if let Some(flag) = solo.get_mut(column) {
            *flag = soloed;
        }
        TrackStates { solo, ..self }
    }

    pub fn toggled_mute(self, column: usize) -> TrackStates {
        let current = self.mute.get(column).copied().unwrap_or(false);
        self.with_mute(column, !current)
    }

    pub fn toggled_solo(self, column: usize) -> TrackStates {
        let current = self.solo.get(column).copied().unwrap_or(false);
        self.with_solo(column, !current)
    }
}

/// Recomputes which loop tracks are audible. Column mute/solo is one layer;
/// a loop the performer stopped is muted on top of that regardless of the
/// column flags.
pub fn resolve_mutes(tracks: &mut [LoopTrack], states: &TrackStates) {
    for track in tracks.iter_mut() {
        if !track.status().has_loop() {
            track.set_muted(false);
            continue;
        }
        let muted = states.is_silenced(track.column()) || track.is_loop_stopped();
        track.set_muted(muted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::looper::track::LoopEvent;
    use crate::PadId;

    fn playing_tracks(count: usize) -> Vec<LoopTrack> {
        (0..count)
            .map(|id| {
                let mut track = LoopTrack::new(id);
                track.install(
                    vec![LoopEvent {
                        tick: 0,
                        pad: PadId(id as u8),
                    }],
                    768,
                    0,
                );
                track.set_playing(true);
                track
            })
            .collect()
    }

    fn muted(tracks: &[LoopTrack]) -> Vec<bool> {
        tracks.iter().map(|t| t.is_muted()).collect()
    }

    #[test]
    fn test_column_mute() {
        let mut tracks = playing_tracks(4);
        let states = TrackStates::default().with_mute(1, true);
        resolve_mutes(&mut tracks, &states);
        assert_eq!(vec![false, true, false, false], muted(&tracks));
    }

    #[test]
    fn test_solo_overrides_mute() {
        let mut tracks = playing_tracks(4);
        let states = TrackStates::default()
            .with_solo(2, true)
            .with_mute(2, true);
        resolve_mutes(&mut tracks, &states);
        assert_eq!(vec![true, true, false, true], muted(&tracks));
    }

    #[test]
    fn test_stopped_loop_is_muted_regardless_of_solo() {
        let mut tracks = playing_tracks(3);
        tracks[1].set_playing(false);
        let states = TrackStates::default().with_solo(1, true);
        resolve_mutes(&mut tracks, &states);
        assert_eq!(vec![true, true, true], muted(&tracks));

        resolve_mutes(&mut tracks, &TrackStates::default());
        assert_eq!(vec![false, true, false], muted(&tracks));
    }

    #[test]
    fn test_toggles_return_new_values() {
        let states = TrackStates::default();
        let toggled = states.toggled_mute(3).toggled_solo(5);
        assert!(!states.mute[3]);
        assert!(toggled.mute[3]);
        assert!(toggled.solo[5]);
        assert_eq!(states, toggled.toggled_mute(3).toggled_solo(5));
        // Out of range columns are ignored.
        assert_eq!(states, states.toggled_mute(NUM_COLUMNS));
    }
}
