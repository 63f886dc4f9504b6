//! Stimulus motion: trajectory generators and the animator driving them.

use serde::{Deserialize, Serialize};
use trajex_core::{Point, Scene};

/// Produces a position for every moment of a finite animation.
pub trait TrajectoryGenerator: std::fmt::Debug {
    /// Position `t` seconds after the start; clamped to the end points outside `[0, duration]`.
    fn point_at(&self, t: f64) -> Point;

    fn duration(&self) -> f64;
}

/// Constant-speed movement between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineTrajectory {
    pub from: Point,
    pub to: Point,
    pub duration: f64,
}

impl TrajectoryGenerator for LineTrajectory {
    fn point_at(&self, t: f64) -> Point {
        if self.duration <= 0.0 {
            return self.to;
        }
        let w = (t / self.duration).clamp(0.0, 1.0);
        Point::new(
            self.from.x + w * (self.to.x - self.from.x),
            self.from.y + w * (self.to.y - self.from.y),
        )
    }

    fn duration(&self) -> f64 {
        self.duration.max(0.0)
    }
}

/// Several generators played back to back.
#[derive(Debug, Default)]
pub struct SegmentedTrajectory {
    segments: Vec<Box<dyn TrajectoryGenerator>>,
}

impl SegmentedTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Box<dyn TrajectoryGenerator>) {
        self.segments.push(segment);
    }
}

impl TrajectoryGenerator for SegmentedTrajectory {
    fn point_at(&self, t: f64) -> Point {
        let mut start = 0.0;
        for (i, seg) in self.segments.iter().enumerate() {
            let end = start + seg.duration();
            if t < end || i + 1 == self.segments.len() {
                return seg.point_at(t - start);
            }
            start = end;
        }
        Point::ORIGIN
    }

    fn duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration()).sum()
    }
}

/// Serialisable description of a generator, as used in operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrajectorySpec {
    Line { from: Point, to: Point, duration: f64 },
    Segmented { segments: Vec<TrajectorySpec> },
}

impl TrajectorySpec {
    pub fn build(&self) -> Box<dyn TrajectoryGenerator> {
        match self {
            TrajectorySpec::Line { from, to, duration } => Box::new(LineTrajectory {
                from: *from,
                to: *to,
                duration: *duration,
            }),
            TrajectorySpec::Segmented { segments } => {
                let mut seg = SegmentedTrajectory::new();
                for s in segments {
                    seg.push(s.build());
                }
                Box::new(seg)
            }
        }
    }
}

#[derive(Debug)]
struct Animation {
    stimulus: String,
    generator: Box<dyn TrajectoryGenerator>,
    started: f64,
}

/// Moves stimuli along their generators once per frame.
#[derive(Debug, Default)]
pub struct Animator {
    active: Vec<Animation>,
}

impl Animator {
    /// Starts animating `stimulus`, replacing any animation it already had.
    pub fn start(&mut self, stimulus: &str, generator: Box<dyn TrajectoryGenerator>, now: f64) {
        self.stop(stimulus);
        self.active.push(Animation {
            stimulus: stimulus.to_string(),
            generator,
            started: now,
        });
    }

    pub fn stop(&mut self, stimulus: &str) -> bool {
        let before = self.active.len();
        self.active.retain(|a| a.stimulus != stimulus);
        self.active.len() != before
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn is_animating(&self, stimulus: &str) -> bool {
        self.active.iter().any(|a| a.stimulus == stimulus)
    }

    /// Positions every animated stimulus for `now`; finished animations end at their last point.
    pub fn update(&mut self, scene: &mut Scene, now: f64) {
        self.active.retain(|a| {
            let t = now - a.started;
            scene.move_to(&a.stimulus, a.generator.point_at(t));
            t < a.generator.duration()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajex_core::{Stimulus, StimulusKind};

    fn line(from: (f64, f64), to: (f64, f64), duration: f64) -> TrajectorySpec {
        TrajectorySpec::Line {
            from: from.into(),
            to: to.into(),
            duration,
        }
    }

    #[test]
    fn line_interpolates_and_clamps() {
        let g = line((0.0, 0.0), (100.0, 50.0), 2.0).build();
        assert_eq!(g.point_at(1.0), Point::new(50.0, 25.0));
        assert_eq!(g.point_at(-1.0), Point::new(0.0, 0.0));
        assert_eq!(g.point_at(3.0), Point::new(100.0, 50.0));
    }

    #[test]
    fn segments_play_in_sequence() {
        let spec = TrajectorySpec::Segmented {
            segments: vec![line((0.0, 0.0), (10.0, 0.0), 1.0), line((10.0, 0.0), (10.0, 20.0), 2.0)],
        };
        let g = spec.build();
        assert_eq!(g.duration(), 3.0);
        assert_eq!(g.point_at(0.5), Point::new(5.0, 0.0));
        assert_eq!(g.point_at(2.0), Point::new(10.0, 10.0));
        assert_eq!(g.point_at(10.0), Point::new(10.0, 20.0));
    }

    #[test]
    fn animator_moves_and_finishes() {
        let mut scene = Scene::default();
        scene.add(Stimulus::new(
            "dot",
            StimulusKind::Circle {
                radius: 5.0,
                color: [255; 4],
            },
            Point::ORIGIN,
        ));
        let mut animator = Animator::default();
        animator.start("dot", line((0.0, 0.0), (0.0, 100.0), 1.0).build(), 10.0);

        animator.update(&mut scene, 10.5);
        assert_eq!(scene.get("dot").unwrap().position, Point::new(0.0, 50.0));
        assert!(animator.is_animating("dot"));

        animator.update(&mut scene, 11.5);
        assert_eq!(scene.get("dot").unwrap().position, Point::new(0.0, 100.0));
        assert!(!animator.is_animating("dot"));
    }
}
