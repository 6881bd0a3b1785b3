//! Time-boxed celebration bursts.
//!
//! On trigger one burst spawns immediately and another every `interval_ms`
//! until `duration_ms` has elapsed. Each burst carries freshly randomized star
//! particles and is pruned once its animation (plus margin) is over. A final
//! cleanup at `duration + lifetime + margin` drops everything. The host drives
//! time through [`EffectScheduler::advance`], usually from its animation frame.

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::clock::TimerQueue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    pub duration_ms: f64,
    pub interval_ms: f64,
    pub particles_per_burst: usize,
    pub particle_anim_ms: f64,
    pub max_particle_delay_ms: f64,
    pub margin_ms: f64,
    /// Element id the confetti library renders into.
    pub surface_id: String,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            duration_ms: 10_000.0,
            interval_ms: 1_000.0,
            particles_per_burst: 18,
            particle_anim_ms: 1_150.0,
            max_particle_delay_ms: 150.0,
            margin_ms: 250.0,
            surface_id: "tsparticles".to_string(),
        }
    }
}

impl EffectConfig {
    /// How long a single burst stays tracked after it spawns.
    pub fn burst_lifetime_ms(&self) -> f64 {
        self.particle_anim_ms + self.max_particle_delay_ms + self.margin_ms
    }

    /// Upper bound on bursts held at once.
    pub fn max_concurrent_bursts(&self) -> usize {
        (self.duration_ms / self.interval()).ceil() as usize + 1
    }

    fn interval(&self) -> f64 {
        self.interval_ms.max(1.0)
    }
}

/// One star in a burst. Positions are relative to the progress bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleDescriptor {
    /// percent from the left edge, 5..95
    pub left_pct: f64,
    pub delay_ms: f64,
    /// pixels, 40..90
    pub rise_px: f64,
    /// degrees, -40..40
    pub rotation_deg: f64,
    /// 0.7..1.3
    pub scale: f64,
}

impl ParticleDescriptor {
    fn random<R: Rng + ?Sized>(rng: &mut R, max_delay_ms: f64) -> Self {
        Self {
            left_pct: 5.0 + rng.r#gen::<f64>() * 90.0,
            delay_ms: rng.r#gen::<f64>() * max_delay_ms,
            rise_px: 40.0 + rng.r#gen::<f64>() * 50.0,
            rotation_deg: (rng.r#gen::<f64>() - 0.5) * 80.0,
            scale: 0.7 + rng.r#gen::<f64>() * 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Burst {
    pub id: u64,
    pub spawn_ms: f64,
    pub particles: Vec<ParticleDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Origin {
    pub x: f64,
    pub y: f64,
}

/// Arguments for one confetti library call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfettiParams {
    pub particle_count: u32,
    pub angle: f64,
    pub spread: f64,
    pub start_velocity: f64,
    pub gravity: f64,
    pub decay: f64,
    pub scalar: f64,
    pub shapes: [&'static str; 2],
    pub origin: Origin,
}

impl ConfettiParams {
    /// Side cannons fired with every burst: left edge aiming right, right edge aiming left.
    pub fn side_cannons() -> [ConfettiParams; 2] {
        let cannon = |angle: f64, x: f64| ConfettiParams {
            particle_count: 4,
            angle,
            spread: 75.0,
            start_velocity: 52.0,
            gravity: 1.1,
            decay: 0.92,
            scalar: 0.9,
            shapes: ["circle", "square"],
            origin: Origin { x, y: 0.6 },
        };
        [cannon(60.0, 0.0), cannon(120.0, 1.0)]
    }
}

/// Injected visual-effect library.
pub trait BurstRenderer {
    fn fire(&mut self, surface_id: &str, params: &ConfettiParams);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EffectTimer {
    Spawn,
    Cleanup,
}

pub struct EffectScheduler {
    config: EffectConfig,
    rng: StdRng,
    renderer: Option<Box<dyn BurstRenderer>>,
    active: bool,
    started_ms: f64,
    bursts: Vec<Burst>,
    timers: TimerQueue<EffectTimer>,
    next_burst_id: u64,
    warned_missing_renderer: bool,
}

impl EffectScheduler {
    pub fn new(config: EffectConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            renderer: None,
            active: false,
            started_ms: 0.0,
            bursts: Vec::new(),
            timers: TimerQueue::new(),
            next_burst_id: 0,
            warned_missing_renderer: false,
        }
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn BurstRenderer>) {
        self.renderer = Some(renderer);
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Start a run at `now_ms`. An already running effect restarts from zero.
    pub fn trigger(&mut self, now_ms: f64) {
        if self.active {
            self.cancel();
        }
        log::info!("effects: celebration started");
        self.active = true;
        self.started_ms = now_ms;
        self.warned_missing_renderer = false;
        let cleanup_at = now_ms + self.config.duration_ms + self.config.burst_lifetime_ms();
        self.timers.schedule_at(cleanup_at, EffectTimer::Cleanup);
        self.spawn(now_ms);
        self.timers.schedule_after(now_ms, self.config.interval(), EffectTimer::Spawn);
    }

    /// Process every timer due by `now_ms` and prune expired bursts.
    /// Returns the ids of bursts spawned during this call.
    pub fn advance(&mut self, now_ms: f64) -> Vec<u64> {
        let mut spawned = Vec::new();
        while let Some((due, timer)) = self.timers.pop_due(now_ms) {
            match timer {
                EffectTimer::Spawn => {
                    if due - self.started_ms < self.config.duration_ms {
                        self.prune(due);
                        spawned.push(self.spawn(due));
                        self.timers.schedule_after(due, self.config.interval(), EffectTimer::Spawn);
                    }
                }
                EffectTimer::Cleanup => self.clear(),
            }
        }
        self.prune(now_ms);
        spawned
    }

    /// Stop immediately: pending spawns are dropped along with every burst.
    pub fn cancel(&mut self) {
        if self.active {
            log::debug!("effects: cancelled");
        }
        self.clear();
    }

    fn clear(&mut self) {
        self.timers.cancel_all();
        self.bursts.clear();
        self.active = false;
    }

    fn prune(&mut self, now_ms: f64) {
        let lifetime = self.config.burst_lifetime_ms();
        self.bursts.retain(|b| now_ms - b.spawn_ms < lifetime);
    }

    fn spawn(&mut self, at_ms: f64) -> u64 {
        let id = self.next_burst_id;
        self.next_burst_id += 1;
        let max_delay = self.config.max_particle_delay_ms;
        let particles = (0..self.config.particles_per_burst)
            .map(|_| ParticleDescriptor::random(&mut self.rng, max_delay))
            .collect();
        self.bursts.push(Burst { id, spawn_ms: at_ms, particles });

        match self.renderer.as_mut() {
            Some(renderer) => {
                for params in ConfettiParams::side_cannons() {
                    renderer.fire(&self.config.surface_id, &params);
                }
            }
            None => {
                if !self.warned_missing_renderer {
                    log::warn!("effects: confetti renderer not loaded, skipping bursts");
                    self.warned_missing_renderer = true;
                }
            }
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn scheduler() -> EffectScheduler {
        EffectScheduler::new(EffectConfig::default(), StdRng::seed_from_u64(11))
    }

    struct CountingRenderer(Rc<RefCell<Vec<(String, f64)>>>);

    impl BurstRenderer for CountingRenderer {
        fn fire(&mut self, surface_id: &str, params: &ConfettiParams) {
            self.0.borrow_mut().push((surface_id.to_string(), params.angle));
        }
    }

    #[test]
    fn test_trigger_spawns_first_burst_immediately() {
        let mut fx = scheduler();
        fx.trigger(0.0);
        assert!(fx.is_active());
        assert_eq!(fx.bursts().len(), 1);
        assert_eq!(fx.bursts()[0].particles.len(), 18);
    }

    #[test]
    fn test_spawns_every_interval_until_duration() {
        let mut fx = scheduler();
        fx.trigger(0.0);
        let mut total = 1;
        let mut t = 0.0;
        while t <= 20_000.0 {
            t += 100.0;
            total += fx.advance(t).len();
        }
        // spawns at 0, 1000, ..., 9000
        assert_eq!(total, 10);
        assert!(!fx.is_active());
        assert!(fx.bursts().is_empty());
        assert_eq!(fx.pending_timers(), 0);
    }

    #[test]
    fn test_burst_count_stays_bounded() {
        let mut fx = scheduler();
        let bound = fx.config().max_concurrent_bursts();
        fx.trigger(0.0);
        let mut t = 0.0;
        while t < 12_000.0 {
            t += 50.0;
            fx.advance(t);
            assert!(fx.bursts().len() <= bound);
        }
    }

    #[test]
    fn test_large_time_jump_still_cleans_up() {
        let mut fx = scheduler();
        fx.trigger(500.0);
        let spawned = fx.advance(500.0 + 60_000.0);
        assert_eq!(spawned.len(), 9);
        assert!(fx.bursts().is_empty());
        assert!(!fx.is_active());
    }

    #[test]
    fn test_bursts_pruned_after_lifetime() {
        let mut fx = scheduler();
        fx.trigger(0.0);
        let lifetime = fx.config().burst_lifetime_ms();
        fx.advance(lifetime - 1.0);
        assert!(fx.bursts().iter().any(|b| b.id == 0));
        fx.advance(lifetime + 1.0);
        assert!(fx.bursts().iter().all(|b| b.id != 0));
    }

    #[test]
    fn test_cancel_drops_everything() {
        let mut fx = scheduler();
        fx.trigger(0.0);
        fx.advance(2_500.0);
        fx.cancel();
        assert!(!fx.is_active());
        assert!(fx.bursts().is_empty());
        assert_eq!(fx.pending_timers(), 0);
        assert!(fx.advance(5_000.0).is_empty());
    }

    #[test]
    fn test_particles_within_ranges() {
        let mut fx = scheduler();
        fx.trigger(0.0);
        for p in &fx.bursts()[0].particles {
            assert!((5.0..=95.0).contains(&p.left_pct));
            assert!((0.0..=150.0).contains(&p.delay_ms));
            assert!((40.0..=90.0).contains(&p.rise_px));
            assert!((-40.0..=40.0).contains(&p.rotation_deg));
            assert!((0.7..=1.3).contains(&p.scale));
        }
    }

    #[test]
    fn test_renderer_gets_two_cannons_per_burst() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut fx = scheduler();
        fx.set_renderer(Box::new(CountingRenderer(calls.clone())));
        fx.trigger(0.0);
        fx.advance(1_000.0);
        let calls = calls.borrow();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], ("tsparticles".to_string(), 60.0));
        assert_eq!(calls[1], ("tsparticles".to_string(), 120.0));
    }

    #[test]
    fn test_retrigger_restarts_window() {
        let mut fx = scheduler();
        fx.trigger(0.0);
        fx.advance(8_000.0);
        fx.trigger(8_000.0);
        fx.advance(15_000.0);
        assert!(fx.is_active());
        fx.advance(8_000.0 + 10_000.0 + fx.config().burst_lifetime_ms());
        assert!(!fx.is_active());
    }
}
