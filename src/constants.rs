/// Column and rule-set defaults for FBref-style season tables.
/// Every value here can be overridden from `config.toml`.

// Identifying columns
pub const PLAYER_COLUMN: &str = "Player";
pub const SQUAD_COLUMN: &str = "Squad";
pub const COMPETITION_COLUMN: &str = "Comp";
pub const KEY_COLUMN: &str = "Key";

// Suffixes
pub const DERIVED_SUFFIX: &str = "_p90";

/// Labels rendered twice per table: the cumulative stat first, its per-90 form second.
pub const AMBIGUOUS_LABELS: &[&str] = &["Gls", "Ast", "G+A", "G-PK", "xG", "xAG", "npxG", "npxG+xAG"];

/// Labels the source only renders in their per-90 form.
pub const ALWAYS_DERIVED_LABELS: &[&str] = &["G+A-PK", "xG+xAG"];

/// Columns whose text is ASCII-folded after canonicalization.
pub const FOLD_COLUMNS: &[&str] = &[PLAYER_COLUMN, SQUAD_COLUMN];

// Built-in sources
pub const BIG5_SOURCE_NAME: &str = "Big 5 European Leagues";
pub const BIG5_URL: &str = "https://fbref.com/en/comps/Big5/stats/players/Big-5-European-Leagues-Stats";
pub const CHAMPIONSHIP_SOURCE_NAME: &str = "EFL Championship";
pub const CHAMPIONSHIP_URL: &str = "https://fbref.com/en/comps/10/stats/Championship-Stats";
pub const CHAMPIONSHIP_SOURCE_ID: &str = "ENG-Championship";

pub const DEFAULT_OUTPUT: &str = "data/big5_player_stats.csv";
pub const DEFAULT_CONFIG: &str = "config.toml";
pub const DEFAULT_USER_AGENT: &str = concat!("season_stats/", env!("CARGO_PKG_VERSION"));
