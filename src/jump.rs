use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::level::{Coordinate, ROWS};

/// One action of the player. Pipe and helium jumps are not counted as steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Jump {
    Normal { dx: i32, dy: i32 },
    Pipe,
    /// Floats upward by `-dy` fields. `dy` is always negative because the
    /// board is flipped instead of the jump.
    Helium { dy: i32 },
    /// More than one explanation fits the clicked coordinates.
    Ambiguous { dx: i32, dy: i32 },
    /// No explanation fits the clicked coordinates.
    Illegal { dx: i32, dy: i32 },
}

pub const STEP_UP: Jump = Jump::Normal { dx: 0, dy: -1 };
pub const STEP_DOWN: Jump = Jump::Normal { dx: 0, dy: 1 };
pub const STEP_LEFT: Jump = Jump::Normal { dx: -1, dy: 0 };
pub const STEP_RIGHT: Jump = Jump::Normal { dx: 1, dy: 0 };

impl Jump {
    pub fn normal(dx: i32, dy: i32) -> Option<Self> {
        (dx.abs() + dy.abs() == 1).then_some(Jump::Normal { dx, dy })
    }

    pub fn helium(dy: i32) -> Option<Self> {
        (dy < 0).then_some(Jump::Helium { dy })
    }

    pub fn dx(&self) -> i32 {
        match *self {
            Jump::Normal { dx, .. } | Jump::Ambiguous { dx, .. } | Jump::Illegal { dx, .. } => dx,
            Jump::Pipe | Jump::Helium { .. } => 0,
        }
    }

    pub fn dy(&self) -> i32 {
        match *self {
            Jump::Normal { dy, .. }
            | Jump::Ambiguous { dy, .. }
            | Jump::Illegal { dy, .. }
            | Jump::Helium { dy } => dy,
            Jump::Pipe => 0,
        }
    }

    pub fn apply(&self, (x, y): Coordinate) -> Coordinate {
        match self {
            Jump::Pipe => (x, ROWS - 1 - y),
            _ => (x + self.dx(), y + self.dy()),
        }
    }

    /// Displacement on a vertically mirrored board.
    pub fn flipped_displacement(&self) -> (i32, i32) {
        (self.dx(), -self.dy())
    }

    pub fn is_uncounted(&self) -> bool {
        matches!(self, Jump::Pipe | Jump::Helium { .. })
    }

    pub fn is_pipe(&self) -> bool {
        matches!(self, Jump::Pipe)
    }

    pub fn is_normal_step(&self) -> bool {
        matches!(*self, STEP_UP | STEP_DOWN | STEP_LEFT | STEP_RIGHT)
    }

    pub fn is_valid_step_or_jump(&self) -> bool {
        self.is_normal_step()
            || matches!(self, Jump::Pipe | Jump::Helium { .. } | Jump::Ambiguous { .. })
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Jump::Normal { .. } => "NormalStep",
            Jump::Pipe => "PipeJump",
            Jump::Helium { .. } => "HeliumJump",
            Jump::Ambiguous { .. } => "AmbiguousJumpStep",
            Jump::Illegal { .. } => "IllegalJumpStep",
        }
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Jump::Pipe => write!(f, "{}()", self.class_name()),
            Jump::Helium { dy } => write!(f, "{}({})", self.class_name(), dy),
            _ => write!(f, "{}({},{})", self.class_name(), self.dx(), self.dy()),
        }
    }
}

fn step_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<class>[A-Z][A-Za-z]+)\(((?P<dx>-?[0-9]{1,2}), ?)?(?P<dy>-?[0-9]{1,2})?\)$")
            .expect("step pattern is valid")
    })
}

impl FromStr for Jump {
    type Err = String;

    /// Parse the `ClassName(dx,dy)` form written into level files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = step_pattern()
            .captures(s.trim())
            .ok_or_else(|| format!("failed to parse step: {:?}", s))?;
        let number = |name: &str| -> Option<i32> {
            caps.name(name).and_then(|m| m.as_str().parse().ok())
        };
        let dx = number("dx");
        let dy = number("dy");
        let class = &caps["class"];
        let step = match (class, dx, dy) {
            ("PipeJump", None, None) => Some(Jump::Pipe),
            ("HeliumJump", None, Some(dy)) => Jump::helium(dy),
            ("NormalStep", Some(dx), Some(dy)) => Jump::normal(dx, dy),
            ("AmbiguousJumpStep", Some(dx), Some(dy)) => Some(Jump::Ambiguous { dx, dy }),
            ("IllegalJumpStep", Some(dx), Some(dy)) => Some(Jump::Illegal { dx, dy }),
            ("PipeJump" | "HeliumJump" | "NormalStep" | "AmbiguousJumpStep" | "IllegalJumpStep", ..) => {
                return Err(format!("wrong number of arguments for {}: {:?}", class, s))
            }
            _ => return Err(format!("unknown step type {:?} in {:?}", class, s)),
        };
        step.ok_or_else(|| format!("invalid distance for {}: {:?}", class, s))
    }
}
