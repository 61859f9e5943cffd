use bevy::prelude::*;

use crate::catalog::{OBJ_HELIUM, OBJ_PIPE};
use crate::jump::{Jump, STEP_UP};
use crate::level::{Coordinate, LevelFacts};

/// Orientation of the board while replaying clicked coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipState {
    Normal,
    Flipped,
    /// An ambiguous or illegal jump made the orientation unknowable.
    Unknown,
}

impl FlipState {
    pub fn toggled(self) -> Self {
        match self {
            FlipState::Normal => FlipState::Flipped,
            FlipState::Flipped => FlipState::Normal,
            FlipState::Unknown => FlipState::Unknown,
        }
    }

    pub fn as_option(self) -> Option<bool> {
        match self {
            FlipState::Normal => Some(false),
            FlipState::Flipped => Some(true),
            FlipState::Unknown => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JumpOptions {
    pub has_pipes: bool,
    pub has_helium: bool,
}

impl JumpOptions {
    pub fn from_level(level: &impl LevelFacts) -> Self {
        Self {
            has_pipes: level.count(OBJ_PIPE) > 0,
            has_helium: level.count(OBJ_HELIUM) > 0,
        }
    }
}

// TODO: check whether a pipe can actually fall to the player's column.
fn is_pipe_jump_possible(options: JumpOptions) -> bool {
    options.has_pipes
}

fn is_helium_jump_possible(
    options: JumpOptions,
    level: &impl LevelFacts,
    cor: Coordinate,
    flip: FlipState,
) -> bool {
    options.has_helium && level.is_below(cor, OBJ_HELIUM, flip.as_option())
}

/// Infer the jumps leading from `start` through every point of `coordinates`.
/// Whatever cannot be explained becomes [`Jump::Ambiguous`] or [`Jump::Illegal`].
pub fn infer_steps(
    coordinates: &[Coordinate],
    start: Coordinate,
    options: JumpOptions,
    level: &impl LevelFacts,
) -> Vec<Jump> {
    let mut steps = Vec::with_capacity(coordinates.len());
    let mut last = start;
    let mut flip = FlipState::Normal;

    for &(x, y) in coordinates {
        let dx = x - last.0;
        let dy = y - last.1;

        if let Some(step) = Jump::normal(dx, dy) {
            match combined_jump_into_step(options, level, last, flip, dx, dy) {
                Some((helium, step)) => {
                    steps.extend([Jump::Pipe, helium, step]);
                    flip = flip.toggled();
                }
                None => steps.push(step),
            }
        } else if dx.abs() > 1 {
            steps.push(Jump::Illegal { dx, dy });
            flip = FlipState::Unknown;
        } else {
            flip = classify_jump(&mut steps, options, level, last, flip, (x, y));
        }

        last = (x, y);
    }

    debug!(
        "[Solution] inferred {} steps from {} coordinates",
        steps.len(),
        coordinates.len()
    );
    steps
}

/// A single field move can hide a pipe jump followed by a helium jump: the
/// player falls into a pipe while floating past it. Only considered when the
/// player stands on a pipe with helium right above it.
fn combined_jump_into_step(
    options: JumpOptions,
    level: &impl LevelFacts,
    last: Coordinate,
    flip: FlipState,
    dx: i32,
    dy: i32,
) -> Option<(Jump, Jump)> {
    if !(options.has_pipes && options.has_helium) {
        return None;
    }
    if !level.is_valid_field(last.0, last.1) || level.field(last.0, last.1) != OBJ_PIPE {
        return None;
    }
    // above, because the pipe flips the board before the helium jump happens
    let (ux, uy) = if flip == FlipState::Flipped {
        STEP_UP.flipped_displacement()
    } else {
        (STEP_UP.dx(), STEP_UP.dy())
    };
    let above = (last.0 + ux, last.1 + uy);
    if !level.is_valid_field(above.0, above.1) || level.field(above.0, above.1) != OBJ_HELIUM {
        return None;
    }

    let after_pipe = Jump::Pipe.apply(last);
    let dy_pipe = after_pipe.1 - last.1;
    // helium sits below the player after the jump, moving down is impossible
    let step = if dx == 0 { STEP_UP } else { Jump::normal(dx, dy)? };
    let helium = Jump::helium(dy - dy_pipe - step.dy())?;
    Some((helium, step))
}

/// Explain a vertical or diagonal jump. Pushes the chosen jumps and returns the
/// orientation afterwards.
fn classify_jump(
    steps: &mut Vec<Jump>,
    options: JumpOptions,
    level: &impl LevelFacts,
    last: Coordinate,
    flip: FlipState,
    (x, y): Coordinate,
) -> FlipState {
    let dx = x - last.0;
    let dy = y - last.1;

    let mut pipe_step = None;
    let mut combined = None;
    if is_pipe_jump_possible(options) {
        let after_pipe = Jump::Pipe.apply(last);
        pipe_step = Jump::normal(x - after_pipe.0, y - after_pipe.1);

        if is_helium_jump_possible(options, level, after_pipe, flip.toggled()) {
            let step = if dx == 0 {
                STEP_UP
            } else {
                Jump::Normal { dx, dy: 0 }
            };
            combined = Jump::helium(y - after_pipe.1 - step.dy()).map(|helium| (helium, step));
        }
    }

    let mut helium = None;
    if dy < 0 && is_helium_jump_possible(options, level, last, flip) {
        helium = if dx == 0 {
            Jump::helium(dy - STEP_UP.dy()).map(|jump| (jump, STEP_UP))
        } else {
            Jump::helium(dy).map(|jump| (jump, Jump::Normal { dx, dy: 0 }))
        };
    }

    match (pipe_step, helium, combined) {
        (None, None, None) => {
            steps.push(Jump::Illegal { dx, dy });
            FlipState::Unknown
        }
        (None, None, Some((helium, step))) => {
            steps.extend([Jump::Pipe, helium, step]);
            flip.toggled()
        }
        (None, Some((helium, step)), None) => {
            steps.extend([helium, step]);
            flip
        }
        // combined is always None here: it needs the target at least two rows
        // above the mirrored position, a plain pipe jump at most one
        (Some(step), None, _) => {
            steps.extend([Jump::Pipe, step]);
            flip.toggled()
        }
        _ => {
            steps.push(Jump::Ambiguous { dx, dy });
            FlipState::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OBJ_START;
    use crate::jump::{STEP_DOWN, STEP_LEFT, STEP_RIGHT};
    use crate::level::Level;
    use crate::projection::logical_coordinates;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn plain_level() -> Level {
        let mut level = Level::new();
        level.set_field(0, 0, OBJ_START);
        level
    }

    #[test]
    fn straight_walk_is_two_normal_steps() {
        let level = plain_level();
        let options = JumpOptions::from_level(&level);
        let steps = infer_steps(&[(0, 1), (0, 2)], (0, 0), options, &level);
        assert_eq!(steps, vec![STEP_DOWN, STEP_DOWN]);
        assert_eq!(logical_coordinates(&steps, (0, 0)), vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn wide_horizontal_jump_is_illegal() {
        let level = plain_level();
        let steps = infer_steps(&[(3, 0)], (0, 0), JumpOptions::default(), &level);
        assert_eq!(steps, vec![Jump::Illegal { dx: 3, dy: 0 }]);
    }

    #[test]
    fn vertical_jump_without_pipe_or_helium_is_illegal() {
        let level = plain_level();
        let steps = infer_steps(&[(0, 3), (0, 4)], (0, 0), JumpOptions::default(), &level);
        assert_eq!(steps, vec![Jump::Illegal { dx: 0, dy: 3 }, STEP_DOWN]);
    }

    #[test]
    fn standing_still_is_illegal() {
        let level = plain_level();
        let steps = infer_steps(&[(0, 0)], (0, 0), JumpOptions::default(), &level);
        assert_eq!(steps, vec![Jump::Illegal { dx: 0, dy: 0 }]);
    }

    #[test]
    fn falls_into_pipe_while_floating_past_it() {
        let mut level = Level::new();
        level.set_field(0, 2, OBJ_PIPE);
        level.set_field(0, 1, OBJ_HELIUM);
        let options = JumpOptions::from_level(&level);

        let steps = infer_steps(&[(0, 1)], (0, 2), options, &level);
        assert_eq!(steps, vec![Jump::Pipe, Jump::Helium { dy: -5 }, STEP_UP]);
        assert!(steps[0].is_uncounted());
        assert!(steps[1].is_uncounted());
        assert_eq!(logical_coordinates(&steps, (0, 2)), vec![(0, 1)]);
    }

    #[test]
    fn combined_check_falls_back_to_plain_step() {
        let mut level = Level::new();
        level.set_field(0, 7, OBJ_PIPE);
        level.set_field(0, 6, OBJ_HELIUM);
        let options = JumpOptions::from_level(&level);

        // after the pipe the player is already above the target
        let steps = infer_steps(&[(0, 8)], (0, 7), options, &level);
        assert_eq!(steps, vec![STEP_DOWN]);
    }

    #[test]
    fn pipe_then_helium_explains_a_downward_jump() {
        let mut level = Level::new();
        level.set_field(0, 2, OBJ_START);
        level.set_field(0, 1, OBJ_HELIUM);
        level.set_field(5, 5, OBJ_PIPE);
        let options = JumpOptions::from_level(&level);

        // the pipe mirrors (0,2) to (0,7), the helium floats up to (0,5)
        let steps = infer_steps(&[(0, 4), (0, 3)], (0, 2), options, &level);
        assert_eq!(
            steps,
            vec![Jump::Pipe, Jump::Helium { dy: -2 }, STEP_UP, STEP_UP]
        );
        assert_eq!(logical_coordinates(&steps, (0, 2)), vec![(0, 4), (0, 3)]);
    }

    #[test]
    fn pipe_jump_then_step() {
        let mut level = plain_level();
        level.set_field(5, 5, OBJ_PIPE);
        let options = JumpOptions::from_level(&level);

        // (0,0) -> pipe -> (0,9) -> right
        let steps = infer_steps(&[(1, 9), (2, 9)], (0, 0), options, &level);
        assert_eq!(steps, vec![Jump::Pipe, STEP_RIGHT, STEP_RIGHT]);
    }

    #[test]
    fn helium_jump_then_step() {
        let mut level = plain_level();
        level.set_field(3, 9, OBJ_HELIUM);
        let options = JumpOptions::from_level(&level);

        let steps = infer_steps(&[(3, 3)], (3, 8), options, &level);
        assert_eq!(steps, vec![Jump::Helium { dy: -4 }, STEP_UP]);

        let steps = infer_steps(&[(2, 4)], (3, 8), options, &level);
        assert_eq!(steps, vec![Jump::Helium { dy: -4 }, STEP_LEFT]);
        assert_eq!(logical_coordinates(&steps, (3, 8)), vec![(2, 4)]);
    }

    #[test]
    fn helium_needs_upward_movement() {
        let mut level = plain_level();
        level.set_field(3, 9, OBJ_HELIUM);
        let options = JumpOptions::from_level(&level);
        let steps = infer_steps(&[(3, 7)], (3, 4), options, &level);
        assert_eq!(steps, vec![Jump::Illegal { dx: 0, dy: 3 }]);
    }

    #[test]
    fn pipe_and_helium_together_are_ambiguous() {
        let mut level = plain_level();
        level.set_field(6, 9, OBJ_HELIUM);
        level.set_field(1, 1, OBJ_PIPE);
        let options = JumpOptions::from_level(&level);

        // a pipe maps (6,7) to (6,2), helium below (6,7) floats up as well
        let steps = infer_steps(&[(6, 1), (6, 0)], (6, 7), options, &level);
        assert_eq!(steps[0], Jump::Ambiguous { dx: 0, dy: -6 });
        assert_eq!(steps[1], STEP_UP);
    }

    #[test]
    fn unknown_orientation_scans_whole_column() {
        let mut level = plain_level();
        level.set_field(4, 0, OBJ_HELIUM);
        let options = JumpOptions::from_level(&level);

        // first an illegal jump, then an upward jump that only works with helium
        // somewhere in the column
        let steps = infer_steps(&[(4, 8), (4, 5)], (0, 8), options, &level);
        assert_eq!(steps[0], Jump::Illegal { dx: 4, dy: 0 });
        assert_eq!(&steps[1..], &[Jump::Helium { dy: -2 }, STEP_UP]);
    }

    #[test]
    fn random_walks_round_trip() {
        let level = plain_level();
        let mut rng = SmallRng::seed_from_u64(7);
        let moves = [STEP_UP, STEP_DOWN, STEP_LEFT, STEP_RIGHT];
        for _ in 0..50 {
            let len = rng.gen_range(0..40);
            let steps: Vec<Jump> = (0..len).map(|_| moves[rng.gen_range(0..4)]).collect();
            let cors = logical_coordinates(&steps, (0, 0));
            let inferred = infer_steps(&cors, (0, 0), JumpOptions::default(), &level);
            assert_eq!(inferred, steps);
        }
    }

    #[test]
    fn pipe_walks_round_trip() {
        let mut level = plain_level();
        level.set_field(17, 9, OBJ_PIPE);
        let options = JumpOptions::from_level(&level);
        let steps = vec![
            STEP_RIGHT,
            Jump::Pipe,
            STEP_UP,
            STEP_RIGHT,
            Jump::Pipe,
            STEP_LEFT,
        ];
        let cors = logical_coordinates(&steps, (0, 0));
        let inferred = infer_steps(&cors, (0, 0), options, &level);
        assert_eq!(logical_coordinates(&inferred, (0, 0)), cors);
        assert_eq!(inferred, steps);
    }
}
