//! Fixed parameters of the persona block design.
//!
//! The block layout is decided when the experimental design is generated, so
//! these values only change together with the embedded design asset.

// Design layout ------------------------------------------------------------
pub const BLOCK_COUNT: u8 = 6;
pub const SETS_PER_BLOCK: usize = 6;
pub const ALTS_PER_SET: u8 = 3;

// Preference defaults ------------------------------------------------------
pub const DEFAULT_MAX_FEE: f64 = 0.0;
pub const DEFAULT_MAX_WALK: f64 = 0.0;
pub const DEFAULT_MIN_CO2: f64 = 0.0;
pub const DEFAULT_MAX_DAY: f64 = 0.0;
pub const DEFAULT_MODE: f64 = 3.0;

// Collaborator keys --------------------------------------------------------
/// Key under which the preference store keeps the serialized record.
pub const PREFS_STORAGE_KEY: &str = "prefs";
pub const PERSONA_EVENT_NAME: &str = "persona";
pub const PERSONA_EVENT_PARAM: &str = "persona_id";

// Embedded data ------------------------------------------------------------
pub(crate) const EMBEDDED_DESIGN_JSON: &str = include_str!("../assets/persona_blocks.json");
