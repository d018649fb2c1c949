use std::f64::consts::TAU;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{RepeatingTimer, StrokeOptions, StrokeStyle, StrokeTool};
use crate::geometry::{Point, Rect};
use crate::surface::{CompositeMode, Surface};

pub const DEFAULT_SPRAY_INTERVAL: Duration = Duration::from_millis(20);

/// A finished spray burst sequence: unit-square splat footprints in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct SplatRecord {
    splats: Vec<Rect>,
    style: StrokeStyle,
}

impl SplatRecord {
    pub fn new(splats: Vec<Rect>, style: StrokeStyle) -> Self {
        Self { splats, style }
    }

    pub fn splats(&self) -> &[Rect] {
        &self.splats
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }
}

#[derive(Debug)]
pub struct SprayTool {
    options: StrokeOptions,
    interval: Duration,
    rng: StdRng,
    timer: Option<RepeatingTimer>,
    position: Point,
    splats: Vec<Rect>,
}

impl SprayTool {
    pub fn new(options: StrokeOptions, interval: Duration) -> Self {
        Self::with_rng(options, interval, StdRng::from_entropy())
    }

    pub fn with_rng(options: StrokeOptions, interval: Duration, rng: StdRng) -> Self {
        Self {
            options,
            interval,
            rng,
            timer: None,
            position: Point::default(),
            splats: Vec::new(),
        }
    }

    pub fn with_seed(options: StrokeOptions, interval: Duration, seed: u64) -> Self {
        Self::with_rng(options, interval, StdRng::seed_from_u64(seed))
    }

    pub fn splat_count(&self) -> usize {
        self.splats.len()
    }

    /// Advances the burst timer; each elapsed interval sprays one burst at the
    /// tracked pointer position. Returns the number of splats painted.
    pub fn tick(&mut self, elapsed: Duration, live: &mut Surface) -> usize {
        let Some(timer) = self.timer.as_mut() else {
            return 0;
        };
        let bursts = timer.advance(elapsed);
        let before = self.splats.len();
        for _ in 0..bursts {
            self.spray_burst(live);
        }
        self.splats.len() - before
    }

    /// Places `width / 2` splats at a uniform angle and a uniform radius
    /// within `width` of the pointer, which concentrates density toward the
    /// center.
    fn spray_burst(&mut self, live: &mut Surface) {
        let width = self.options.width;
        let count = ((width / 2.0) as usize).max(1);
        let color = self.options.color;
        let opacity = self.options.opacity;
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..TAU);
            let radius = self.rng.gen_range(0.0..width);
            let splat = Rect::new(
                (self.position.x + radius * angle.cos()).floor(),
                (self.position.y + radius * angle.sin()).floor(),
                1.0,
                1.0,
            );
            live.fill_rect(splat, color, opacity, CompositeMode::PaintOver);
            self.splats.push(splat);
        }
    }
}

impl StrokeTool for SprayTool {
    type Record = SplatRecord;

    fn options(&self) -> &StrokeOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut StrokeOptions {
        &mut self.options
    }

    fn pointer_down(&mut self, world: Point, live: &mut Surface) {
        self.splats.clear();
        self.position = world;
        self.timer = Some(RepeatingTimer::new(self.interval));
        live.clear();
    }

    fn pointer_move(&mut self, world: Point, _live: &mut Surface) {
        if self.timer.is_some() {
            self.position = world;
        }
    }

    fn pointer_up(&mut self, live: &mut Surface) -> Option<SplatRecord> {
        // taking the timer cancels it before anything else can tick
        self.timer.take()?;
        live.clear();
        let splats = std::mem::take(&mut self.splats);
        if splats.is_empty() {
            tracing::debug!("discarding spray drag without splats");
            return None;
        }
        Some(SplatRecord::new(splats, self.options.style()))
    }

    fn is_dragging(&self) -> bool {
        self.timer.is_some()
    }

    fn reset(&mut self) {
        self.timer = None;
        self.splats.clear();
    }

    fn draw_from_history(&self, record: &SplatRecord, target: &mut Surface) {
        let style = record.style;
        for splat in &record.splats {
            target.fill_rect(*splat, style.color, style.opacity, style.composite);
        }
    }
}
