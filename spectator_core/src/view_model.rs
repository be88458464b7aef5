//! Render-ready facts derived from a snapshot.
//!
//! Every function here is a pure function of the `GameState` it is given. Missing data
//! (no beast, no engineers, an empty board, no results) yields empty output, never an error.

use beast_schema::{Coord, Engineer, GameState, GridSize, ResultRecord, BEAST_NAME};

pub const BEAST_GLYPH: &str = "👹";

/// Who stands on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant<'a> {
    Beast,
    Engineer(&'a Engineer),
}

impl<'a> Occupant<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            Occupant::Beast => BEAST_NAME,
            Occupant::Engineer(engineer) => &engineer.name,
        }
    }

    pub fn glyph(&self) -> &'a str {
        match *self {
            Occupant::Beast => BEAST_GLYPH,
            Occupant::Engineer(engineer) => &engineer.emoji,
        }
    }
}

/// Cell annotation: the occupant is being hunted by the beast (primary) or by another
/// actor such as a zombie (secondary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threat {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView<'a> {
    pub coord: Coord,
    pub occupant: Option<Occupant<'a>>,
    pub threat: Option<Threat>,
    pub wall: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridView<'a> {
    pub size: GridSize,
    pub cells: Vec<CellView<'a>>,
}

impl<'a> GridView<'a> {
    pub fn rows(&self) -> impl Iterator<Item = &[CellView<'a>]> {
        self.cells.chunks(self.size.width.max(1) as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnEntry<'a> {
    pub name: &'a str,
    pub glyph: &'a str,
    pub active: bool,
    pub zombie: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub name: String,
    pub cells: Vec<String>,
    pub total: i64,
}

/// Historical results laid out with one column per round of the first record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsTable {
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

const MISSING_SCORE: &str = "-";

pub fn beast_visible(state: &GameState) -> bool {
    !state.beast_hidden && state.beast.is_some()
}

/// Occupant of `coord`: the visible beast first, otherwise the first engineer in list order.
pub fn occupant_at(state: &GameState, coord: Coord) -> Option<Occupant<'_>> {
    if beast_visible(state) && state.beast == Some(coord) {
        return Some(Occupant::Beast);
    }
    state
        .engineers
        .iter()
        .find(|engineer| engineer.position == coord)
        .map(Occupant::Engineer)
}

/// At most one annotation per occupant; primary wins whenever both apply.
pub fn threat_for(state: &GameState, occupant: &Occupant<'_>) -> Option<Threat> {
    let Occupant::Engineer(engineer) = occupant else {
        return None;
    };
    let name = engineer.name.as_str();
    if !state.beast_hidden && state.target_of(BEAST_NAME) == Some(name) {
        return Some(Threat::Primary);
    }
    let hunted = state
        .beast_target
        .iter()
        .any(|(actor, target)| actor != BEAST_NAME && target.as_deref() == Some(name));
    hunted.then_some(Threat::Secondary)
}

pub fn cell_view(state: &GameState, coord: Coord) -> CellView<'_> {
    let occupant = occupant_at(state, coord);
    CellView {
        coord,
        threat: occupant.as_ref().and_then(|occupant| threat_for(state, occupant)),
        occupant,
        wall: state.is_wall(coord),
    }
}

/// Every cell of the board in row-major order.
pub fn grid_view(state: &GameState) -> GridView<'_> {
    grid_window(state, u32::MAX, u32::MAX)
}

/// The top-left `max_width × max_height` corner of the board, row-major. Coordinates stay
/// those of the full board.
pub fn grid_window(state: &GameState, max_width: u32, max_height: u32) -> GridView<'_> {
    let size = GridSize::new(
        state.grid_size.width.min(max_width),
        state.grid_size.height.min(max_height),
    );
    let cells = (0..size.cell_count())
        .filter_map(|index| size.coord_at(index))
        .map(|coord| cell_view(state, coord))
        .collect();
    GridView { size, cells }
}

/// Beast first, then engineers in list order. Only the first name matching
/// `current_turn_entity` is marked active.
pub fn turn_order(state: &GameState) -> Vec<TurnEntry<'_>> {
    let current = state.current_turn_entity.as_str();
    let mut active_seen = false;
    let mut claim = |name: &str| {
        let active = !active_seen && !current.is_empty() && name == current;
        active_seen |= active;
        active
    };

    let mut entries = Vec::with_capacity(state.engineers.len() + 1);
    entries.push(TurnEntry {
        name: BEAST_NAME,
        glyph: BEAST_GLYPH,
        active: claim(BEAST_NAME),
        zombie: false,
    });
    for engineer in &state.engineers {
        entries.push(TurnEntry {
            name: &engineer.name,
            glyph: &engineer.emoji,
            active: claim(engineer.name.as_str()),
            zombie: engineer.is_zombie,
        });
    }
    entries
}

pub fn player_total(record: &ResultRecord) -> i64 {
    record.total()
}

pub fn results_table(state: &GameState) -> Option<ResultsTable> {
    let first = state.csv_results.first()?;
    let columns: Vec<String> = first
        .rounds
        .iter()
        .map(|round| round.label.clone())
        .collect();
    let rows = state
        .csv_results
        .iter()
        .map(|record| ResultRow {
            name: record.name.clone(),
            cells: columns
                .iter()
                .map(|label| {
                    record
                        .round(label)
                        .and_then(|round| round.value.clone())
                        .unwrap_or_else(|| MISSING_SCORE.to_string())
                })
                .collect(),
            total: player_total(record),
        })
        .collect();
    Some(ResultsTable { columns, rows })
}

/// Engineers turned into zombies, in the order they fell.
pub fn fallen(state: &GameState) -> Vec<&str> {
    state.zombie_order.iter().map(String::as_str).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use beast_schema::RoundScore;

    use super::*;

    fn targets(pairs: &[(&str, &str)]) -> BTreeMap<String, Option<String>> {
        pairs
            .iter()
            .map(|(actor, target)| (actor.to_string(), Some(target.to_string())))
            .collect()
    }

    fn bob_under_beast(beast_hidden: bool) -> GameState {
        GameState {
            beast: Some(Coord::new(2, 2)),
            beast_hidden,
            engineers: vec![Engineer::new("Bob", "🦾", Coord::new(2, 2))],
            beast_target: targets(&[("Beast", "Bob")]),
            grid_size: GridSize::new(5, 5),
            ..GameState::default()
        }
    }

    #[test]
    fn visible_beast_takes_the_cell() {
        let state = bob_under_beast(false);
        let cell = cell_view(&state, Coord::new(2, 2));
        assert_eq!(cell.occupant, Some(Occupant::Beast));
        assert_eq!(cell.threat, None);
    }

    #[test]
    fn hidden_beast_leaves_the_engineer() {
        let state = bob_under_beast(true);
        let occupant = occupant_at(&state, Coord::new(2, 2)).expect("Bob is there");
        assert_eq!(occupant.name(), "Bob");
        // The beast's own target only counts while the beast is visible.
        assert_eq!(threat_for(&state, &occupant), None);
    }

    #[test]
    fn beast_target_marks_primary_threat() {
        let mut state = bob_under_beast(false);
        state.beast = Some(Coord::new(0, 0));
        let cell = cell_view(&state, Coord::new(2, 2));
        assert_eq!(cell.occupant.map(|o| o.name()), Some("Bob"));
        assert_eq!(cell.threat, Some(Threat::Primary));
    }

    #[test]
    fn primary_wins_over_secondary() {
        let mut state = bob_under_beast(false);
        state.beast = Some(Coord::new(0, 0));
        state.beast_target = targets(&[("Beast", "Bob"), ("Saboteur", "Bob")]);
        assert_eq!(
            cell_view(&state, Coord::new(2, 2)).threat,
            Some(Threat::Primary)
        );

        state.beast_hidden = true;
        assert_eq!(
            cell_view(&state, Coord::new(2, 2)).threat,
            Some(Threat::Secondary)
        );
    }

    #[test]
    fn cleared_targets_carry_no_annotation() {
        let mut state = bob_under_beast(true);
        state.beast_target.insert("Saboteur".to_string(), None);
        state.beast_target.insert("Beast".to_string(), None);
        assert_eq!(cell_view(&state, Coord::new(2, 2)).threat, None);
    }

    #[test]
    fn first_engineer_wins_a_shared_cell() {
        let state = GameState {
            engineers: vec![
                Engineer::new("First", "🥺", Coord::new(1, 1)),
                Engineer::new("Second", "😈", Coord::new(1, 1)),
            ],
            ..GameState::default()
        };
        let occupant = occupant_at(&state, Coord::new(1, 1)).unwrap();
        assert_eq!(occupant.name(), "First");
        assert_eq!(occupant.glyph(), "🥺");
    }

    #[test]
    fn grid_covers_board_row_major() {
        let mut state = bob_under_beast(true);
        state.grid_size = GridSize::new(3, 2);
        state.engineers[0].position = Coord::new(2, 1);
        state.walls = vec![Coord::new(0, 1)];

        let grid = grid_view(&state);
        assert_eq!(grid.cells.len(), 6);
        assert_eq!(grid.cells[3].coord, Coord::new(0, 1));
        assert!(grid.cells[3].wall);
        assert_eq!(grid.cells[5].occupant.map(|o| o.name()), Some("Bob"));
        assert_eq!(grid.rows().count(), 2);
    }

    #[test]
    fn window_clips_oversized_board() {
        let mut state = bob_under_beast(true);
        state.grid_size = GridSize::new(20_000, 3);
        state.engineers[0].position = Coord::new(1, 2);

        let window = grid_window(&state, 4, 10);
        assert_eq!(window.size, GridSize::new(4, 3));
        assert_eq!(window.cells.len(), 12);
        assert_eq!(window.rows().count(), 3);
        assert_eq!(window.cells[9].coord, Coord::new(1, 2));
        assert_eq!(window.cells[9].occupant.map(|o| o.name()), Some("Bob"));
    }

    #[test]
    fn empty_snapshot_renders_nothing() {
        let state = GameState::default();
        assert!(grid_view(&state).cells.is_empty());
        assert_eq!(grid_view(&state).rows().count(), 0);
        assert!(occupant_at(&state, Coord::new(0, 0)).is_none());
        assert!(!beast_visible(&state));
        assert!(results_table(&state).is_none());
        assert!(fallen(&state).is_empty());
        let order = turn_order(&state);
        assert_eq!(order.len(), 1);
        assert!(!order[0].active);
    }

    #[test]
    fn turn_order_marks_single_active_entry() {
        let mut state = bob_under_beast(false);
        state.engineers.push(Engineer::new("Leeroy", "🐔", Coord::new(3, 3)));
        state.current_turn_entity = "Leeroy".to_string();

        let order = turn_order(&state);
        let names: Vec<&str> = order.iter().map(|entry| entry.name).collect();
        assert_eq!(names, vec!["Beast", "Bob", "Leeroy"]);
        let active: Vec<&str> = order
            .iter()
            .filter(|entry| entry.active)
            .map(|entry| entry.name)
            .collect();
        assert_eq!(active, vec!["Leeroy"]);

        state.current_turn_entity = BEAST_NAME.to_string();
        assert!(turn_order(&state)[0].active);
    }

    #[test]
    fn results_table_fills_missing_rounds() {
        let state = GameState {
            csv_results: vec![
                ResultRecord::new(
                    "A",
                    vec![
                        RoundScore::new("Game 1", Some("5")),
                        RoundScore::new("Game 2", Some("x")),
                    ],
                ),
                ResultRecord::new("B", vec![RoundScore::new("Game 1", Some("2"))]),
            ],
            ..GameState::default()
        };

        let table = results_table(&state).expect("results present");
        assert_eq!(table.columns, vec!["Game 1", "Game 2"]);
        assert_eq!(table.rows[0].cells, vec!["5", "x"]);
        assert_eq!(table.rows[0].total, 5);
        assert_eq!(table.rows[1].cells, vec!["2", "-"]);
        assert_eq!(table.rows[1].total, 2);
    }
}
