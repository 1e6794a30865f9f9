//! Sequence memory: watch a growing tile sequence, echo it back.

use rand::Rng;

use crate::model::{BatteryConfig, Cue, Input, Measurement, Millis, Step};
use crate::scheduler::TimerKind;

use super::{MicroTest, StepContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPhase {
    Idle,
    Presenting { position: usize },
    AwaitingInput { echoed: usize },
    Success,
    GameOver,
}

#[derive(Debug)]
pub struct MemoryTest {
    tiles: u8,
    onset_ms: Millis,
    highlight_ms: Millis,
    pause_ms: Millis,
    phase: MemoryPhase,
    level: u32,
    sequence: Vec<u8>,
}

impl MemoryTest {
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            // A single tile could never be echoed wrong.
            tiles: config.memory_tiles.max(2),
            onset_ms: config.memory_onset_ms,
            highlight_ms: config.memory_highlight_ms,
            pause_ms: config.memory_level_pause_ms,
            phase: MemoryPhase::Idle,
            level: 0,
            sequence: Vec::new(),
        }
    }

    pub fn phase(&self) -> MemoryPhase {
        self.phase
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    fn next_level(&mut self, ctx: &mut StepContext<'_>) {
        let tile = ctx.rng().gen_range(0..self.tiles);
        self.sequence.push(tile);
        self.phase = MemoryPhase::Presenting { position: 0 };
        ctx.cue(Cue::MemoryLevel { level: self.level });
        ctx.schedule(self.onset_ms, TimerKind::MemoryTileOn);
        tracing::debug!(level = self.level, len = self.sequence.len(), "presenting sequence");
    }

    fn on_tile(&mut self, tile: u8, echoed: usize, ctx: &mut StepContext<'_>) {
        if tile >= self.tiles {
            tracing::warn!(tile, "tile outside the grid ignored");
            return;
        }
        if self.sequence.get(echoed) != Some(&tile) {
            ctx.cue(Cue::MemoryWrong(tile));
            self.phase = MemoryPhase::GameOver;
            let score = self.level.saturating_sub(1);
            tracing::info!(level = self.level, score, "memory game over");
            ctx.complete(Measurement::Memory { score });
            return;
        }

        ctx.cue(Cue::MemoryCorrect(tile));
        let echoed = echoed + 1;
        if echoed < self.sequence.len() {
            self.phase = MemoryPhase::AwaitingInput { echoed };
            return;
        }
        self.phase = MemoryPhase::Success;
        self.level += 1;
        ctx.schedule(self.pause_ms, TimerKind::MemoryNextLevel);
    }
}

impl MicroTest for MemoryTest {
    fn step(&self) -> Step {
        Step::Memory
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        self.phase = MemoryPhase::Idle;
        ctx.cue(Cue::MemoryReady);
    }

    fn reset(&mut self) {
        self.phase = MemoryPhase::Idle;
        self.level = 0;
        self.sequence.clear();
    }

    fn on_input(&mut self, input: Input, ctx: &mut StepContext<'_>) {
        match (self.phase, input) {
            (MemoryPhase::Idle, Input::Press) => {
                self.level = 1;
                self.sequence.clear();
                self.next_level(ctx);
            }
            (MemoryPhase::AwaitingInput { echoed }, Input::Tile(tile)) => {
                self.on_tile(tile, echoed, ctx)
            }
            (_, Input::Tile(tile)) => {
                tracing::debug!(tile, phase = ?self.phase, "tile ignored outside echo phase")
            }
            _ => {}
        }
    }

    fn on_timer(&mut self, kind: TimerKind, ctx: &mut StepContext<'_>) {
        match (self.phase, kind) {
            (MemoryPhase::Presenting { position }, TimerKind::MemoryTileOn) => {
                ctx.cue(Cue::TileOn(self.sequence[position]));
                ctx.schedule(self.highlight_ms, TimerKind::MemoryTileOff);
            }
            (MemoryPhase::Presenting { position }, TimerKind::MemoryTileOff) => {
                ctx.cue(Cue::TileOff(self.sequence[position]));
                let position = position + 1;
                if position < self.sequence.len() {
                    self.phase = MemoryPhase::Presenting { position };
                    ctx.schedule(self.onset_ms, TimerKind::MemoryTileOn);
                } else {
                    self.phase = MemoryPhase::AwaitingInput { echoed: 0 };
                    ctx.cue(Cue::MemoryAwaitingEcho { level: self.level });
                }
            }
            (MemoryPhase::Success, TimerKind::MemoryNextLevel) => self.next_level(ctx),
            _ => {}
        }
    }

    fn is_finished(&self) -> bool {
        self.phase == MemoryPhase::GameOver
    }
}
