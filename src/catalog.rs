use serde::{Deserialize, Serialize};

/// Object codes are the byte values used in level files.
pub const OBJ_NONE: u8 = b'!';
pub const OBJ_START: u8 = b'0';
pub const OBJ_END: u8 = b'[';

pub const OBJ_HELIUM: u8 = b'b';
pub const OBJ_PIPE: u8 = b'X';
pub const OBJ_DRUM: u8 = b'W';
pub const OBJ_WAND: u8 = b'a';
pub const OBJ_SUN: u8 = b'c';

pub const OBJ_ARROW_LEFT: u8 = b'w';
pub const OBJ_ARROW_RIGHT: u8 = b'x';
pub const OBJ_ARROW_UP: u8 = b'y';
pub const OBJ_ARROW_DOWN: u8 = b'z';

pub const OBJ_BURNING_CAN: u8 = b'u';
pub const OBJ_FIRE: u8 = b'#';
pub const OBJ_RAIN: u8 = b'$';

const OBJ_HAMMER: u8 = 81;
const OBJ_HAMMER_TARGET: u8 = 60;
const OBJ_DRUM_TARGET: u8 = 61;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectCatalog {
    pub to_eat: Vec<u8>,
    pub to_move: Vec<u8>,
    pub obstacles_gravity: Vec<u8>,
    pub obstacles_fix: Vec<u8>,
    pub magic: Vec<u8>,
    /// Obstacles the player can never walk through.
    pub unmovable: Vec<u8>,
    /// Any of these groups present on the board can blow away every obstacle.
    pub explosive_groups: Vec<Vec<u8>>,
}

impl Default for ObjectCatalog {
    fn default() -> Self {
        Self {
            to_eat: vec![65, 66, 67, 68, 69, 70, 71, 72, 73, 74, 75, 76, 77, 78, 123, 125],
            to_move: vec![
                44, 55, 45, 49, 46, 50, 47, 89, 51, 52, 53, 54, 79, 80, 103, 104, 109, 110, 112,
                113,
            ],
            obstacles_gravity: vec![
                // balls
                37, 38, 39, 40, 41, 42, //
                43, 81, 82, 83, 84, 100, 101, 102, //
                115, 116, 117, 118, //
                98,
            ],
            obstacles_fix: vec![
                58, 59, 60, 61, 62, //
                56, 57, 63, 90, 105, 196, 228, //
                111, 114, //
                119, 120, 121, 122, //
                35, 36,
            ],
            magic: vec![48, 91, 33, 85, 86, 106, 107, 108, 87, 88, 97, 99],
            unmovable: vec![
                OBJ_FIRE, OBJ_RAIN, 58, 59, 62, 55, 56, 57, 63, 89, 90, 49, 105, 196, 228,
            ],
            explosive_groups: vec![vec![85, 86], vec![106], vec![107], vec![108]],
        }
    }
}

impl ObjectCatalog {
    pub fn is_known(&self, code: u8) -> bool {
        [
            &self.to_eat,
            &self.to_move,
            &self.obstacles_gravity,
            &self.obstacles_fix,
            &self.magic,
        ]
        .iter()
        .any(|category| category.contains(&code))
    }

    pub fn is_to_eat(&self, code: u8) -> bool {
        self.to_eat.contains(&code)
    }

    pub fn is_to_move(&self, code: u8) -> bool {
        self.to_move.contains(&code)
    }

    /// (obstacle, object that removes it)
    pub fn transformable_obstacles(&self) -> [(u8, u8); 2] {
        [(OBJ_HAMMER_TARGET, OBJ_HAMMER), (OBJ_DRUM_TARGET, OBJ_DRUM)]
    }

    pub fn category_name(&self, code: u8) -> &'static str {
        if self.to_eat.contains(&code) {
            "to eat"
        } else if self.to_move.contains(&code) {
            "to move"
        } else if self.obstacles_gravity.contains(&code) {
            "falling obstacle"
        } else if self.obstacles_fix.contains(&code) {
            "fixed obstacle"
        } else if self.magic.contains(&code) {
            "other"
        } else {
            "uncategorized"
        }
    }

    pub fn describe(&self, code: u8) -> String {
        let name = match code {
            OBJ_NONE => "empty field",
            OBJ_START => "start",
            OBJ_END => "door",
            OBJ_PIPE => "pipe",
            OBJ_HELIUM => "helium",
            OBJ_FIRE => "fire",
            OBJ_RAIN => "rain",
            OBJ_BURNING_CAN => "burning can",
            OBJ_DRUM => "drum",
            OBJ_WAND => "wand",
            OBJ_SUN => "sun",
            OBJ_ARROW_LEFT | OBJ_ARROW_RIGHT | OBJ_ARROW_UP | OBJ_ARROW_DOWN => "arrow",
            _ => self.category_name(code),
        };
        format!("{} ({:?}, {})", code, char::from(code), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_do_not_overlap() {
        let catalog = ObjectCatalog::default();
        let mut all: Vec<u8> = catalog
            .to_eat
            .iter()
            .chain(&catalog.to_move)
            .chain(&catalog.obstacles_gravity)
            .chain(&catalog.obstacles_fix)
            .chain(&catalog.magic)
            .copied()
            .collect();
        let n = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), n);
    }

    #[test]
    fn special_fields_are_known() {
        let catalog = ObjectCatalog::default();
        for code in [OBJ_NONE, OBJ_START, OBJ_END, OBJ_PIPE, OBJ_HELIUM, OBJ_FIRE, OBJ_RAIN] {
            assert!(catalog.is_known(code), "{} should be known", code);
        }
        assert!(!catalog.is_known(b'~'));
    }

    #[test]
    fn describe_names_special_objects() {
        let catalog = ObjectCatalog::default();
        assert!(catalog.describe(OBJ_FIRE).contains("fire"));
        assert!(catalog.describe(58).contains("fixed obstacle"));
    }
}
