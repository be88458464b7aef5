//! Data contracts shared between the Beast game server and its spectators.
//!
//! Field names follow the server's JSON payloads (`beast_hidden`, `turn_counter`,
//! `csv_results`, ...). Every snapshot field carries a default so a partially
//! populated payload still decodes; consumers treat missing data as "nothing to show".

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Reserved actor identifier for the beast in `beast_target` and `current_turn_entity`.
pub const BEAST_NAME: &str = "Beast";

/// Results fields carrying a per-round score start with this label.
pub const ROUND_FIELD_PREFIX: &str = "Game";

/// Results field holding the player's name.
pub const NAME_FIELD: &str = "Name";

/// Integer grid coordinate, encoded as `[x, y]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Coord> for (i32, i32) {
    fn from(coord: Coord) -> Self {
        (coord.x, coord.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Board dimensions, encoded as `[width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn cell_count(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.width
            && (coord.y as u32) < self.height
    }

    /// Maps a row-major linear index to its cell. `None` once the index leaves the board.
    pub fn coord_at(&self, index: usize) -> Option<Coord> {
        if self.width == 0 || index >= self.cell_count() {
            return None;
        }
        let width = self.width as usize;
        Some(Coord::new((index % width) as i32, (index / width) as i32))
    }
}

impl From<(u32, u32)> for GridSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl From<GridSize> for (u32, u32) {
    fn from(size: GridSize) -> Self {
        (size.width, size.height)
    }
}

/// Configured match length. The server may omit it or send a placeholder such as `"?"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnBudget {
    Turns(u32),
    #[default]
    Unknown,
}

impl TurnBudget {
    pub fn turns(&self) -> Option<u32> {
        match self {
            TurnBudget::Turns(turns) => Some(*turns),
            TurnBudget::Unknown => None,
        }
    }
}

impl fmt::Display for TurnBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnBudget::Turns(turns) => write!(f, "{turns}"),
            TurnBudget::Unknown => f.write_str("?"),
        }
    }
}

impl Serialize for TurnBudget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TurnBudget::Turns(turns) => serializer.serialize_u32(*turns),
            TurnBudget::Unknown => serializer.serialize_str("?"),
        }
    }
}

impl<'de> Deserialize<'de> for TurnBudget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Ok(value
            .as_u64()
            .and_then(|turns| u32::try_from(turns).ok())
            .map(TurnBudget::Turns)
            .unwrap_or(TurnBudget::Unknown))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engineer {
    pub name: String,
    #[serde(default)]
    pub emoji: String,
    pub position: Coord,
    #[serde(default = "default_alive")]
    pub alive: bool,
    #[serde(default)]
    pub is_zombie: bool,
    #[serde(default)]
    pub last_moved: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targeted_by: Option<String>,
}

impl Engineer {
    pub fn new(name: impl Into<String>, emoji: impl Into<String>, position: Coord) -> Self {
        Self {
            name: name.into(),
            emoji: emoji.into(),
            position,
            alive: true,
            is_zombie: false,
            last_moved: 0,
            targeted_by: None,
        }
    }
}

fn default_alive() -> bool {
    true
}

/// One authoritative snapshot of the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub beast: Option<Coord>,
    pub beast_hidden: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub engineers: Vec<Engineer>,
    #[serde(deserialize_with = "null_as_default")]
    pub walls: Vec<Coord>,
    pub game_over: bool,
    pub turn_counter: u32,
    pub end_game_turns: TurnBudget,
    pub grid_size: GridSize,
    #[serde(deserialize_with = "null_as_default")]
    pub current_turn_entity: String,
    #[serde(deserialize_with = "null_as_default")]
    pub beast_target: BTreeMap<String, Option<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub zombie_order: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub csv_results: Vec<ResultRecord>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            beast: None,
            beast_hidden: true,
            engineers: Vec::new(),
            walls: Vec::new(),
            game_over: false,
            turn_counter: 0,
            end_game_turns: TurnBudget::Unknown,
            grid_size: GridSize::default(),
            current_turn_entity: String::new(),
            beast_target: BTreeMap::new(),
            zombie_order: Vec::new(),
            csv_results: Vec::new(),
        }
    }
}

impl GameState {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Current target of `actor`, if it has one.
    pub fn target_of(&self, actor: &str) -> Option<&str> {
        self.beast_target
            .get(actor)
            .and_then(|target| target.as_deref())
    }

    pub fn engineer(&self, name: &str) -> Option<&Engineer> {
        self.engineers.iter().find(|engineer| engineer.name == name)
    }

    pub fn is_wall(&self, coord: Coord) -> bool {
        self.walls.contains(&coord)
    }
}

/// Body of `GET /update`: a snapshot plus whether it differs from the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub update_occurred: bool,
    #[serde(flatten)]
    pub state: GameState,
}

impl SyncResponse {
    pub fn changed(state: GameState) -> Self {
        Self {
            update_occurred: true,
            state,
        }
    }

    pub fn unchanged(state: GameState) -> Self {
        Self {
            update_occurred: false,
            state,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A single round column of a player's results row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoundScore {
    pub label: String,
    pub value: Option<String>,
}

impl RoundScore {
    pub fn new(label: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            label: label.into(),
            value: value.map(str::to_string),
        }
    }

    /// Leading integer of the recorded value, if any.
    pub fn points(&self) -> Option<i64> {
        self.value.as_deref().and_then(leading_integer)
    }
}

/// A player's row of historical results: a name plus round scores in column order.
///
/// The server ships these as loose CSV-derived objects (`{"Name": .., "Game 1": ..}`);
/// decoding keeps the `Game*` columns in wire order and drops anything else.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "JsonMap<String, JsonValue>", into = "JsonMap<String, JsonValue>")]
pub struct ResultRecord {
    pub name: String,
    pub rounds: Vec<RoundScore>,
}

impl ResultRecord {
    pub fn new(name: impl Into<String>, rounds: Vec<RoundScore>) -> Self {
        Self {
            name: name.into(),
            rounds,
        }
    }

    /// Sum of every parseable round score; unparseable or missing rounds count as zero.
    pub fn total(&self) -> i64 {
        self.rounds
            .iter()
            .filter_map(RoundScore::points)
            .fold(0i64, i64::saturating_add)
    }

    pub fn round(&self, label: &str) -> Option<&RoundScore> {
        self.rounds.iter().find(|round| round.label == label)
    }
}

impl From<JsonMap<String, JsonValue>> for ResultRecord {
    fn from(fields: JsonMap<String, JsonValue>) -> Self {
        let name = fields
            .get(NAME_FIELD)
            .and_then(scalar_text)
            .unwrap_or_default();
        let rounds = fields
            .iter()
            .filter(|(label, _)| label.starts_with(ROUND_FIELD_PREFIX))
            .map(|(label, value)| RoundScore {
                label: label.clone(),
                value: scalar_text(value),
            })
            .collect();
        Self { name, rounds }
    }
}

impl From<ResultRecord> for JsonMap<String, JsonValue> {
    fn from(record: ResultRecord) -> Self {
        let mut fields = JsonMap::new();
        fields.insert(NAME_FIELD.to_string(), JsonValue::String(record.name));
        for round in record.rounds {
            let value = round.value.map(JsonValue::String).unwrap_or(JsonValue::Null);
            fields.insert(round.label, value);
        }
        fields
    }
}

fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(text) if text.trim().is_empty() => None,
        JsonValue::String(text) => Some(text.clone()),
        JsonValue::Number(number) => Some(number.to_string()),
        JsonValue::Bool(flag) => Some(flag.to_string()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|value| sign * value)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
