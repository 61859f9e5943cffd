use serde::Serialize;

use crate::jump::Jump;
use crate::level::{Coordinate, LevelFacts};

/// The point reached after every counted step, start omitted. Stored in level files.
pub fn logical_coordinates(steps: &[Jump], start: Coordinate) -> Vec<Coordinate> {
    let mut cor = start;
    let mut cors = Vec::with_capacity(steps.len());
    for step in steps {
        cor = step.apply(cor);
        if !step.is_uncounted() {
            cors.push(cor);
        }
    }
    cors
}

/// Unflipped board positions including the start, replayed up to (excluding)
/// step `cursor`. A pipe jump repeats the previous point.
pub fn board_coordinates(steps: &[Jump], start: Coordinate, cursor: usize) -> Vec<Coordinate> {
    let mut cor = start;
    let mut flipped = false;
    let mut cors = vec![cor];
    for step in steps.iter().take(cursor) {
        if step.is_pipe() {
            flipped = !flipped;
        } else {
            let (dx, dy) = if flipped {
                step.flipped_displacement()
            } else {
                (step.dx(), step.dy())
            };
            cor = (cor.0 + dx, cor.1 + dy);
        }
        cors.push(cor);
    }
    cors
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ViewPoint {
    At(Coordinate),
    /// The step lands on the exit door.
    End,
}

pub struct ViewCoordinates<'a, L> {
    steps: std::slice::Iter<'a, Jump>,
    level: &'a L,
    cor: Coordinate,
    flipped: bool,
    started: bool,
}

pub fn view_coordinates<'a, L: LevelFacts>(
    steps: &'a [Jump],
    start: Coordinate,
    level: &'a L,
) -> ViewCoordinates<'a, L> {
    ViewCoordinates {
        steps: steps.iter(),
        level,
        cor: start,
        flipped: false,
        started: false,
    }
}

impl<L: LevelFacts> Iterator for ViewCoordinates<'_, L> {
    type Item = ViewPoint;

    fn next(&mut self) -> Option<ViewPoint> {
        if !self.started {
            self.started = true;
            return Some(ViewPoint::At(self.cor));
        }
        let step = self.steps.next()?;
        if step.is_pipe() {
            self.flipped = !self.flipped;
        }
        self.cor = step.apply(self.cor);
        if self.level.is_end_field(self.cor, self.flipped) {
            Some(ViewPoint::End)
        } else {
            Some(ViewPoint::At(self.cor))
        }
    }
}

/// Board orientation at every counted step, aligned with
/// [`logical_coordinates`].
pub fn is_flipped_per_step(steps: &[Jump]) -> impl Iterator<Item = bool> + '_ {
    steps
        .iter()
        .scan(false, |flipped, step| {
            if step.is_pipe() {
                *flipped = !*flipped;
                Some(None)
            } else if step.is_uncounted() {
                Some(None)
            } else {
                Some(Some(*flipped))
            }
        })
        .flatten()
}
