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

//! Scene launching: one row of pads fired together.

use std::collections::HashMap;

use tracing::debug;

use crate::action::Action;
use crate::state::PadMapping;
use crate::transport::{ScheduleHandle, TransportClock};
use crate::{PadId, NUM_COLUMNS, NUM_ROWS};

/// What to do for one column of a launched row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneStep {
    /// The column holds a recorded loop; bring it back instead of playing the pad.
    Resume { slot: usize, column: usize },
    /// Start the pad now, stopping a sibling in the column first if one sounds.
    StartNow { pad: PadId, stop: Option<PadId> },
    /// Stop the sibling and start the pad together on a grid line.
    StartDeferred { pad: PadId, sibling: PadId, at: u64 },
}

impl SceneStep {
    pub fn column(&self) -> usize {
        match self {
            SceneStep::Resume { column, .. } => *column,
            SceneStep::StartNow { pad, .. } | SceneStep::StartDeferred { pad, .. } => pad.column(),
        }
    }
}

/// The full launch of a row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenePlan {
    /// The transport was stopped and must be started before any step runs.
    pub start_transport: bool,
    pub steps: Vec<SceneStep>,
}

/// Everything a launch decision depends on.
pub struct SceneContext<'a> {
    pub mappings: &'a HashMap<PadId, PadMapping>,
    /// Slot holding a recorded loop, per column.
    pub loops: [Option<usize>; NUM_COLUMNS],
    pub active_pads: &'a [PadId],
    pub quantized: bool,
    pub running: bool,
    /// Grid line deferred steps land on.
    pub launch_tick: u64,
}

/// Plans the launch of a row. Unmapped pads are skipped. A sibling is any
/// other sounding pad in the same column; with quantization on and the
/// transport running the swap is deferred to the launch tick, otherwise it
/// happens right away.
pub fn plan(row: usize, context: &SceneContext) -> ScenePlan {
    if row >= NUM_ROWS {
        return ScenePlan::default();
    }

    let mut steps = Vec::new();
    for column in 0..NUM_COLUMNS {
        let pad = PadId::at(row, column);
        if !context.mappings.contains_key(&pad) {
            debug!(pad = pad.0, "Scene pad has no mapping, skipping");
            continue;
        }

        if let Some(slot) = context.loops[column] {
            steps.push(SceneStep::Resume { slot, column });
            continue;
        }

        let sibling = context
            .active_pads
            .iter()
            .copied()
            .find(|p| p.column() == column && *p != pad);
        let step = match sibling {
            Some(sibling) if context.quantized && context.running => SceneStep::StartDeferred {
                pad,
                sibling,
                at: context.launch_tick,
            },
            stop => SceneStep::StartNow { pad, stop },
        };
        steps.push(step);
    }

    ScenePlan {
        start_transport: !context.running && !steps.is_empty(),
        steps,
    }
}

/// Tracks deferred scene actions per column so a relaunch can replace them.
#[derive(Debug, Default)]
pub struct SceneLauncher {
    pending: HashMap<usize, Vec<ScheduleHandle>>,
}

impl SceneLauncher {
    pub fn new() -> SceneLauncher {
        SceneLauncher::default()
    }

    /// Cancels deferred actions for a column that have not fired yet.
    pub fn cancel_column(&mut self, column: usize, clock: &mut TransportClock<Action>) -> usize {
        self.pending
            .remove(&column)
            .map(|handles| handles.into_iter().filter(|h| clock.cancel(*h)).count())
            .unwrap_or(0)
    }

    /// Schedules a deferred sibling swap.
    pub fn defer(
        &mut self,
        pad: PadId,
        sibling: PadId,
        at: u64,
        clock: &mut TransportClock<Action>,
    ) {
        let stop = clock.schedule(at, Action::SceneStop { pad: sibling });
        let start = clock.schedule(at, Action::SceneStart { pad });
        self.pending.insert(pad.column(), vec![stop, start]);
    }

    /// Number of columns with deferred actions still queued.
    pub fn pending_columns(&self, clock: &TransportClock<Action>) -> usize {
        self.pending
            .values()
            .filter(|handles| handles.iter().any(|h| clock.is_pending(*h)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TimeSignature;
    use crate::voices::InstrumentKind;

    fn mappings(pads: &[PadId]) -> HashMap<PadId, PadMapping> {
        pads.iter()
            .map(|p| (*p, PadMapping::new(InstrumentKind::Drum { kit: None }, 36)))
            .collect()
    }

    fn context<'a>(
        mappings: &'a HashMap<PadId, PadMapping>,
        active_pads: &'a [PadId],
    ) -> SceneContext<'a> {
        SceneContext {
            mappings,
            loops: [None; NUM_COLUMNS],
            active_pads,
            quantized: true,
            running: true,
            launch_tick: 768,
        }
    }

    #[test]
    fn test_unmapped_pads_are_skipped() {
        let mappings = mappings(&[PadId::at(2, 1), PadId::at(2, 6)]);
        let plan = plan(2, &context(&mappings, &[]));
        assert_eq!(
            vec![
                SceneStep::StartNow {
                    pad: PadId::at(2, 1),
                    stop: None
                },
                SceneStep::StartNow {
                    pad: PadId::at(2, 6),
                    stop: None
                },
            ],
            plan.steps
        );
        assert!(!plan.start_transport);
    }

    #[test]
    fn test_loop_column_resumes_instead_of_retriggering() {
        let mappings = mappings(&[PadId::at(1, 4)]);
        let mut context = context(&mappings, &[]);
        context.loops[4] = Some(4);
        let plan = plan(1, &context);
        assert_eq!(vec![SceneStep::Resume { slot: 4, column: 4 }], plan.steps);
    }

    #[test]
    fn test_sibling_is_deferred_to_grid() {
        let mappings = mappings(&[PadId::at(0, 3)]);
        let active = [PadId::at(1, 3), PadId::at(1, 5)];
        let plan = plan(0, &context(&mappings, &active));
        assert_eq!(
            vec![SceneStep::StartDeferred {
                pad: PadId::at(0, 3),
                sibling: PadId::at(1, 3),
                at: 768
            }],
            plan.steps
        );
    }

    #[test]
    fn test_sibling_swaps_immediately_without_quantization() {
        let mappings = mappings(&[PadId::at(0, 3)]);
        let active = [PadId::at(1, 3)];
        let mut context = context(&mappings, &active);
        context.quantized = false;
        assert_eq!(
            vec![SceneStep::StartNow {
                pad: PadId::at(0, 3),
                stop: Some(PadId::at(1, 3))
            }],
            plan(0, &context).steps
        );
    }

    #[test]
    fn test_stopped_transport_starts_first_and_launches_now() {
        let mappings = mappings(&[PadId::at(0, 3)]);
        let active = [PadId::at(1, 3)];
        let mut context = context(&mappings, &active);
        context.running = false;
        let plan = plan(0, &context);
        assert!(plan.start_transport);
        assert_eq!(
            vec![SceneStep::StartNow {
                pad: PadId::at(0, 3),
                stop: Some(PadId::at(1, 3))
            }],
            plan.steps
        );
    }

    #[test]
    fn test_out_of_range_row() {
        let mappings = mappings(&[PadId::at(0, 0)]);
        assert_eq!(ScenePlan::default(), plan(NUM_ROWS, &context(&mappings, &[])));
    }

    #[test]
    fn test_relaunch_cancels_pending_column() {
        let mut clock = TransportClock::new(192, 120.0, TimeSignature::default());
        clock.start();
        let mut launcher = SceneLauncher::new();

        launcher.defer(PadId::at(0, 2), PadId::at(3, 2), 768, &mut clock);
        assert_eq!(2, clock.pending_count());
        assert_eq!(1, launcher.pending_columns(&clock));

        assert_eq!(2, launcher.cancel_column(2, &mut clock));
        assert_eq!(0, clock.pending_count());
        assert_eq!(0, launcher.pending_columns(&clock));
        assert_eq!(0, launcher.cancel_column(2, &mut clock));
    }
}
