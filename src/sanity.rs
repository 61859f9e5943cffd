use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{ObjectCatalog, OBJ_END, OBJ_START};
use crate::jump::Jump;
use crate::level::{flip_coordinate, Coordinate, Level, LevelFacts, COLS, ROWS};
use crate::solution::Solution;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::None => "OK",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

/// Forwards findings to a sink and remembers the worst one.
pub struct SanityLog<'a> {
    sink: &'a mut dyn FnMut(Severity, &str),
    worst: Severity,
}

impl<'a> SanityLog<'a> {
    pub fn new(sink: &'a mut dyn FnMut(Severity, &str)) -> Self {
        Self {
            sink,
            worst: Severity::None,
        }
    }

    pub fn log(&mut self, severity: Severity, message: &str) {
        (self.sink)(severity, message);
        self.worst = self.worst.max(severity);
    }

    pub fn error(&mut self, message: &str) {
        self.log(Severity::Error, message);
    }

    pub fn warning(&mut self, message: &str) {
        self.log(Severity::Warning, message);
    }

    pub fn worst(&self) -> Severity {
        self.worst
    }

    pub fn end(self) -> Severity {
        self.worst
    }
}

/// A sink collecting everything into `findings`.
pub fn collect_into(findings: &mut Vec<Finding>) -> impl FnMut(Severity, &str) + '_ {
    move |severity, message| {
        findings.push(Finding {
            severity,
            message: message.to_string(),
        })
    }
}

pub fn check_board(
    level: &Level,
    catalog: &ObjectCatalog,
    sink: &mut dyn FnMut(Severity, &str),
) -> Severity {
    let mut log = SanityLog::new(sink);

    match level.count(OBJ_START) {
        0 => log.error("no start field specified"),
        1 => {}
        _ => log.error("too many start fields specified"),
    }
    // a level without door is fine
    if level.count(OBJ_END) >= 2 {
        log.error("too many end fields specified");
    }
    if !level.contains_objects_to_eat_or_move(catalog) {
        log.error("nothing to eat or move");
    }

    log.end()
}

pub fn check_author(level: &Level, sink: &mut dyn FnMut(Severity, &str)) -> Severity {
    let mut log = SanityLog::new(sink);
    if level.author.trim().is_empty() {
        log.warning("no author specified");
    }
    log.end()
}

pub fn check_backgrounds(level: &Level, sink: &mut dyn FnMut(Severity, &str)) -> Severity {
    let mut log = SanityLog::new(sink);
    for (name, value) in [
        ("bgBorder", &level.bg_border),
        ("bgUntouched", &level.bg_untouched),
        ("bgTouched", &level.bg_touched),
    ] {
        if value.trim().is_empty() || value.lines().count() > 1 {
            log.error(&format!("invalid value for {}: '{}'", name, value));
        }
    }
    if level.bg_touched == level.bg_untouched {
        log.warning("backgrounds for touched and untouched fields are the same");
    }
    log.end()
}

// Step numbers count only the steps the player sees, starting at 1.
pub fn check_solution(
    solution: &Solution,
    level: &impl LevelFacts,
    catalog: &ObjectCatalog,
    sink: &mut dyn FnMut(Severity, &str),
) -> Severity {
    let mut log = SanityLog::new(sink);

    let mut number = 1;
    let mut pipe_jumps = 0;
    let mut helium_jumps = 0;
    for (i, step) in solution.steps().iter().enumerate() {
        if i == 0 {
            if step.is_pipe() {
                log.error("first step can not be a pipe jump");
            } else if step.is_uncounted() {
                log.error("first step can not be a helium jump");
            }
        }

        if !step.is_valid_step_or_jump() {
            log.error(&format!("invalid jump in step {}: {}", number, step));
        } else if matches!(step, Jump::Ambiguous { .. }) {
            log.warning(&format!("ambiguous jump in step {}", number));
        } else if step.is_pipe() {
            pipe_jumps += 1;
        } else if step.is_uncounted() {
            helium_jumps += 1;
        }

        if !step.is_uncounted() {
            number += 1;
        }
    }

    if helium_jumps >= 1 && solution.number_existing_helium() == 0 {
        log.error(&format!("{} helium jump(s) without helium", helium_jumps));
    }
    if pipe_jumps > solution.number_existing_pipes() {
        log.error(&format!(
            "smoked more pipes than are existing: {}/{}",
            pipe_jumps,
            solution.number_existing_pipes()
        ));
    }

    let forbidden = level.forbidden_fields(catalog);
    let mut last: Option<(Coordinate, bool)> = None;
    for (i, (&cor, flipped)) in solution
        .coordinates()
        .iter()
        .zip(solution.is_flipped_per_step())
        .enumerate()
    {
        let number = i + 1;
        // only an error if another step follows
        if let Some((last_cor, last_flipped)) = last {
            if level.is_end_field(last_cor, last_flipped) {
                log.error(&format!(
                    "steps on door in step {} ({},{})",
                    number - 1,
                    last_cor.0,
                    last_cor.1
                ));
            }
        }

        let (x, y) = cor;
        let on_board = if flipped { flip_coordinate(cor) } else { cor };
        if forbidden.contains(&on_board) {
            let object = catalog.describe(level.field(on_board.0, on_board.1));
            log.error(&format!(
                "steps on unmovable obstacle in step {} ({},{}): {}",
                number, x, y, object
            ));
        } else if level.is_above_fire(cor, flipped) {
            log.error(&format!("steps above fire in step {} ({},{})", number, x, y));
        } else if level.is_below_rain(cor, flipped) {
            log.error(&format!("steps under rain in step {} ({},{})", number, x, y));
        }

        if x < 0 {
            log.error(&format!("x coordinate too small after step {} ({},{})", number, x, y));
        } else if x >= COLS {
            log.error(&format!("x coordinate too large after step {} ({},{})", number, x, y));
        }
        if y < 0 {
            log.error(&format!("y coordinate too small after step {} ({},{})", number, x, y));
        } else if y >= ROWS {
            log.error(&format!("y coordinate too large after step {} ({},{})", number, x, y));
        }

        last = Some((cor, flipped));
    }

    let ends_on_door = last.is_some_and(|(cor, flipped)| level.is_end_field(cor, flipped));
    if level.has_end_field() && !ends_on_door {
        log.error("does not end on door");
    }

    log.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{OBJ_FIRE, OBJ_HELIUM, OBJ_PIPE};
    use crate::jump::{STEP_DOWN, STEP_RIGHT};

    const FRUIT: u8 = 65;

    fn run(
        check: impl FnOnce(&mut dyn FnMut(Severity, &str)) -> Severity,
    ) -> (Severity, Vec<Finding>) {
        let mut findings = Vec::new();
        let worst = {
            let mut sink = collect_into(&mut findings);
            check(&mut sink)
        };
        (worst, findings)
    }

    fn messages(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.message.as_str()).collect()
    }

    fn solved(level: &Level, coordinates: &[Coordinate]) -> Solution {
        let mut solution = Solution::default();
        for &cor in coordinates {
            solution.append_coordinate(cor);
        }
        solution.init(level).unwrap();
        solution
    }

    #[test]
    fn severity_orders_by_weight() {
        assert!(Severity::None < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!(Severity::Error.to_string(), "ERROR");
    }

    #[test]
    fn log_keeps_worst_severity() {
        let (worst, findings) = run(|sink| {
            let mut log = SanityLog::new(sink);
            log.warning("a");
            log.error("b");
            log.warning("c");
            log.end()
        });
        assert_eq!(worst, Severity::Error);
        assert_eq!(findings.len(), 3);
    }

    #[test]
    fn empty_board_reports_missing_start_and_task() {
        let level = Level::new();
        let catalog = ObjectCatalog::default();
        let (worst, findings) = run(|sink| check_board(&level, &catalog, sink));
        assert_eq!(worst, Severity::Error);
        assert_eq!(
            messages(&findings),
            vec!["no start field specified", "nothing to eat or move"]
        );
    }

    #[test]
    fn doubled_start_and_door_are_errors() {
        let level = Level::from_rows(&["00[[A"]);
        let catalog = ObjectCatalog::default();
        let (_, findings) = run(|sink| check_board(&level, &catalog, sink));
        assert_eq!(
            messages(&findings),
            vec!["too many start fields specified", "too many end fields specified"]
        );
    }

    #[test]
    fn author_and_backgrounds() {
        let mut level = Level::new();
        let (worst, _) = run(|sink| check_author(&level, sink));
        assert_eq!(worst, Severity::Warning);
        level.author = "someone".to_string();
        let (worst, _) = run(|sink| check_author(&level, sink));
        assert_eq!(worst, Severity::None);

        let (worst, _) = run(|sink| check_backgrounds(&level, sink));
        assert_eq!(worst, Severity::None);
        level.bg_touched = level.bg_untouched.clone();
        let (worst, _) = run(|sink| check_backgrounds(&level, sink));
        assert_eq!(worst, Severity::Warning);
        level.bg_border.clear();
        let (worst, findings) = run(|sink| check_backgrounds(&level, sink));
        assert_eq!(worst, Severity::Error);
        assert!(findings[0].message.contains("bgBorder"));
    }

    #[test]
    fn clean_solution_reports_nothing() {
        let mut level = Level::from_rows(&["0A["]);
        level.set_field(1, 0, FRUIT);
        let catalog = ObjectCatalog::default();
        let solution = solved(&level, &[(1, 0), (2, 0)]);
        let (worst, findings) = run(|sink| check_solution(&solution, &level, &catalog, sink));
        assert!(findings.is_empty(), "{:?}", findings);
        assert_eq!(worst, Severity::None);
    }

    #[test]
    fn wide_jump_is_reported_as_invalid() {
        let level = Level::from_rows(&["0"]);
        let catalog = ObjectCatalog::default();
        let solution = solved(&level, &[(3, 0)]);
        assert_eq!(solution.steps(), &[Jump::Illegal { dx: 3, dy: 0 }]);
        let (worst, findings) = run(|sink| check_solution(&solution, &level, &catalog, sink));
        assert_eq!(worst, Severity::Error);
        assert!(findings[0].message.contains("invalid jump"));
        assert_eq!(findings[0].message, "invalid jump in step 1: IllegalJumpStep(3,0)");
    }

    #[test]
    fn door_must_be_last() {
        let level = Level::from_rows(&["0[!"]);
        let catalog = ObjectCatalog::default();
        let solution = solved(&level, &[(1, 0), (2, 0)]);
        let (_, findings) = run(|sink| check_solution(&solution, &level, &catalog, sink));
        assert_eq!(
            messages(&findings),
            vec!["steps on door in step 1 (1,0)", "does not end on door"]
        );
    }

    #[test]
    fn hazards_and_board_edges() {
        let mut level = Level::from_rows(&["0"]);
        level.set_field(1, 1, OBJ_FIRE);
        let catalog = ObjectCatalog::default();
        let solution = solved(&level, &[(0, -1), (0, 0), (1, 0)]);
        let (_, findings) = run(|sink| check_solution(&solution, &level, &catalog, sink));
        assert_eq!(
            messages(&findings),
            vec![
                "y coordinate too small after step 1 (0,-1)",
                "steps above fire in step 3 (1,0)",
            ]
        );
    }

    #[test]
    fn unmovable_obstacles_are_checked_on_the_board() {
        let mut level = Level::from_rows(&["0"]);
        level.set_field(1, 0, OBJ_FIRE);
        let catalog = ObjectCatalog::default();
        let solution = solved(&level, &[(1, 0)]);
        let (_, findings) = run(|sink| check_solution(&solution, &level, &catalog, sink));
        assert!(findings[0].message.starts_with("steps on unmovable obstacle in step 1 (1,0)"));
        assert!(findings[0].message.contains("fire"));
    }

    #[test]
    fn jump_counts_are_compared_with_the_board() {
        let mut level = Level::from_rows(&["0"]);
        level.set_field(5, 5, OBJ_PIPE);
        let catalog = ObjectCatalog::default();
        let mut solution = solved(&level, &[]);
        solution.set_steps(vec![
            Jump::Pipe,
            STEP_RIGHT,
            Jump::Pipe,
            STEP_DOWN,
            Jump::Helium { dy: -1 },
            STEP_RIGHT,
        ]);
        solution.init(&level).unwrap();
        let (_, findings) = run(|sink| check_solution(&solution, &level, &catalog, sink));
        let messages = messages(&findings);
        assert_eq!(messages[0], "first step can not be a pipe jump");
        assert!(messages.contains(&"1 helium jump(s) without helium"));
        assert!(messages.contains(&"smoked more pipes than are existing: 2/1"));

        level.set_field(6, 6, OBJ_HELIUM);
        solution.init(&level).unwrap();
        let (_, findings) = run(|sink| check_solution(&solution, &level, &catalog, sink));
        assert!(!messages_of(&findings).iter().any(|m| m.contains("helium jump(s)")));
    }

    fn messages_of(findings: &[Finding]) -> Vec<String> {
        findings.iter().map(|f| f.message.clone()).collect()
    }
}
