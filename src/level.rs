use serde::{Deserialize, Serialize};

use crate::catalog::{ObjectCatalog, OBJ_END, OBJ_FIRE, OBJ_NONE, OBJ_RAIN, OBJ_START};

pub const COLS: i32 = 18;
pub const ROWS: i32 = 10;

/// A board cell. The origin is the top left corner, y grows downward.
pub type Coordinate = (i32, i32);

/// Mirror a coordinate vertically, the way a pipe jump flips the board.
pub fn flip_coordinate(cor: Coordinate) -> Coordinate {
    (cor.0, ROWS - 1 - cor.1)
}

/// `flipped` is `None` when the orientation could not be inferred.
pub trait LevelFacts {
    fn field(&self, x: i32, y: i32) -> u8;

    fn is_valid_field(&self, x: i32, y: i32) -> bool {
        (0..COLS).contains(&x) && (0..ROWS).contains(&y)
    }

    fn count(&self, value: u8) -> usize;

    fn find(&self, value: u8) -> Option<Coordinate>;

    /// Whether `value` lies somewhere below `cor` in the given orientation.
    fn is_below(&self, cor: Coordinate, value: u8, flipped: Option<bool>) -> bool {
        let (x, y) = cor;
        if !(0..COLS).contains(&x) {
            return false;
        }
        let rows = match flipped {
            None => 0..ROWS,
            Some(true) => 0..y.clamp(0, ROWS),
            Some(false) => (y + 1).clamp(0, ROWS)..ROWS,
        };
        rows.into_iter().any(|row| self.field(x, row) == value)
    }

    fn is_end_field(&self, cor: Coordinate, flipped: bool) -> bool {
        if !self.is_valid_field(cor.0, cor.1) {
            return false;
        }
        let (x, y) = if flipped { flip_coordinate(cor) } else { cor };
        self.field(x, y) == OBJ_END
    }

    fn has_end_field(&self) -> bool {
        self.find(OBJ_END).is_some()
    }

    fn is_above_fire(&self, cor: Coordinate, flipped: bool) -> bool {
        self.neighbour_is((cor.0, cor.1 + 1), flipped, OBJ_FIRE)
    }

    fn is_below_rain(&self, cor: Coordinate, flipped: bool) -> bool {
        self.neighbour_is((cor.0, cor.1 - 1), flipped, OBJ_RAIN)
    }

    #[doc(hidden)]
    fn neighbour_is(&self, cor: Coordinate, flipped: bool, value: u8) -> bool {
        let (x, y) = if flipped { flip_coordinate(cor) } else { cor };
        self.is_valid_field(x, y) && self.field(x, y) == value
    }

    /// Board cells the player can never step on.
    fn forbidden_fields(&self, catalog: &ObjectCatalog) -> Vec<Coordinate>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Object codes, row major.
    pub board: Vec<u8>,
    pub author: String,
    pub bg_border: String,
    pub bg_untouched: String,
    pub bg_touched: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            board: vec![OBJ_NONE; (COLS * ROWS) as usize],
            author: String::new(),
            bg_border: "irka3_1a.fld".to_string(),
            bg_untouched: "irka3_2a.fld".to_string(),
            bg_touched: "irka3_3a.fld".to_string(),
            notes: None,
        }
    }
}

impl Level {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a level from text rows, one byte per field. Missing fields stay empty.
    pub fn from_rows(rows: &[&str]) -> Self {
        let mut level = Self::default();
        for (y, row) in rows.iter().enumerate().take(ROWS as usize) {
            for (x, code) in row.bytes().enumerate().take(COLS as usize) {
                level.set_field(x as i32, y as i32, code);
            }
        }
        level
    }

    pub fn get_field(&self, x: i32, y: i32) -> u8 {
        if !(0..COLS).contains(&x) || !(0..ROWS).contains(&y) {
            return OBJ_NONE;
        }
        self.board[(y * COLS + x) as usize]
    }

    pub fn set_field(&mut self, x: i32, y: i32, value: u8) {
        if (0..COLS).contains(&x) && (0..ROWS).contains(&y) {
            self.board[(y * COLS + x) as usize] = value;
        }
    }

    pub fn has(&self, value: u8) -> bool {
        self.board.contains(&value)
    }

    /// Column by column, top to bottom, the order in which the game scans the board.
    pub fn find_all(&self, value: u8) -> impl Iterator<Item = Coordinate> + '_ {
        (0..COLS)
            .flat_map(|x| (0..ROWS).map(move |y| (x, y)))
            .filter(move |&(x, y)| self.get_field(x, y) == value)
    }

    pub fn start_field(&self) -> Option<Coordinate> {
        self.find(OBJ_START)
    }

    pub fn end_field(&self) -> Option<Coordinate> {
        self.find(OBJ_END)
    }

    pub fn number_objects_to_eat(&self, catalog: &ObjectCatalog) -> usize {
        self.board.iter().filter(|&&o| catalog.is_to_eat(o)).count()
    }

    pub fn number_objects_to_move(&self, catalog: &ObjectCatalog) -> usize {
        self.board.iter().filter(|&&o| catalog.is_to_move(o)).count()
    }

    pub fn contains_objects_to_eat_or_move(&self, catalog: &ObjectCatalog) -> bool {
        self.number_objects_to_eat(catalog) > 0 || self.number_objects_to_move(catalog) > 0
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.board.chunks(COLS as usize)
    }
}

impl LevelFacts for Level {
    fn field(&self, x: i32, y: i32) -> u8 {
        self.get_field(x, y)
    }

    fn count(&self, value: u8) -> usize {
        self.board.iter().filter(|&&o| o == value).count()
    }

    fn find(&self, value: u8) -> Option<Coordinate> {
        self.find_all(value).next()
    }

    fn forbidden_fields(&self, catalog: &ObjectCatalog) -> Vec<Coordinate> {
        if catalog
            .explosive_groups
            .iter()
            .any(|group| !group.is_empty() && group.iter().all(|&o| self.has(o)))
        {
            return Vec::new();
        }

        let mut fields: Vec<Coordinate> = Vec::new();
        for &obj in &catalog.unmovable {
            fields.extend(self.find_all(obj));
        }
        for (obstacle, remover) in catalog.transformable_obstacles() {
            if !self.has(remover) {
                fields.extend(self.find_all(obstacle));
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{OBJ_HELIUM, OBJ_PIPE};

    #[test]
    fn fields_outside_the_board_read_as_empty() {
        let mut level = Level::new();
        level.set_field(-1, 0, OBJ_PIPE);
        level.set_field(COLS, 0, OBJ_PIPE);
        assert_eq!(level.get_field(-1, 0), OBJ_NONE);
        assert_eq!(level.count(OBJ_PIPE), 0);
    }

    #[test]
    fn is_below_respects_orientation() {
        let mut level = Level::new();
        level.set_field(3, 8, OBJ_HELIUM);
        assert!(level.is_below((3, 4), OBJ_HELIUM, Some(false)));
        assert!(!level.is_below((3, 4), OBJ_HELIUM, Some(true)));
        assert!(level.is_below((3, 9), OBJ_HELIUM, Some(true)));
        assert!(level.is_below((3, 9), OBJ_HELIUM, None));
        assert!(!level.is_below((3, 8), OBJ_HELIUM, Some(false)));
        assert!(!level.is_below((4, 4), OBJ_HELIUM, None));
    }

    #[test]
    fn end_field_is_found_through_the_flip() {
        let mut level = Level::new();
        level.set_field(5, 1, OBJ_END);
        assert!(level.is_end_field((5, 1), false));
        assert!(level.is_end_field((5, 8), true));
        assert!(!level.is_end_field((5, 8), false));
        assert!(!level.is_end_field((5, -1), false));
    }

    #[test]
    fn fire_and_rain_neighbours() {
        let mut level = Level::new();
        level.set_field(2, 5, OBJ_FIRE);
        level.set_field(7, 2, OBJ_RAIN);
        assert!(level.is_above_fire((2, 4), false));
        assert!(!level.is_above_fire((2, 5), false));
        // flipped: (2,3) sits above (2,4) which mirrors to (2,5)
        assert!(level.is_above_fire((2, 3), true));
        assert!(level.is_below_rain((7, 3), false));
        assert!(!level.is_below_rain((7, 0), false));
    }

    #[test]
    fn explosives_clear_forbidden_fields() {
        let catalog = ObjectCatalog::default();
        let mut level = Level::new();
        level.set_field(0, 0, OBJ_FIRE);
        level.set_field(1, 0, 60);
        assert_eq!(level.forbidden_fields(&catalog), vec![(0, 0), (1, 0)]);

        level.set_field(2, 0, 81);
        assert_eq!(level.forbidden_fields(&catalog), vec![(0, 0)]);

        level.set_field(3, 0, 85);
        assert_eq!(level.forbidden_fields(&catalog).len(), 1);
        level.set_field(4, 0, 86);
        assert!(level.forbidden_fields(&catalog).is_empty());
    }

    #[test]
    fn from_rows_fills_board() {
        let level = Level::from_rows(&["!0!", "!![", "!XA"]);
        assert_eq!(level.start_field(), Some((1, 0)));
        assert_eq!(level.end_field(), Some((2, 1)));
        assert_eq!(level.get_field(1, 2), OBJ_PIPE);
        assert_eq!(level.rows().count(), ROWS as usize);
    }
}
