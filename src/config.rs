// config.rs - Global game constants
//
// The game world is measured in "world units", not pixels. The playfield is
// V_WIDTH x V_HEIGHT units and every sprite is authored at 16 pixels per unit.
// Module-specific tuning values (damage per second, spawn intervals...) live
// at the top of the module that uses them.

/// Pixels per world unit, inverted: one pixel is 1/16 of a unit.
pub const UNIT_SCALE: f32 = 1.0 / 16.0;

/// Playfield width in world units. Power-ups spawn in columns `0..V_WIDTH`.
pub const V_WIDTH: u32 = 9;

/// Playfield height in world units. Power-ups spawn at the top edge.
pub const V_HEIGHT: u32 = 16;

/// How many screen pixels one authored pixel covers.
pub const WINDOW_ZOOM: u32 = 3;

pub const WINDOW_WIDTH: u32 = V_WIDTH * 16 * WINDOW_ZOOM;
pub const WINDOW_HEIGHT: u32 = V_HEIGHT * 16 * WINDOW_ZOOM;
pub const WINDOW_TITLE: &str = "Dark Matter";

/// Upper bound for a single frame's delta time (seconds).
///
/// A slow frame (window drag, breakpoint) would otherwise teleport everything
/// and let the player skip straight through the damage zone.
pub const MAX_DELTA_TIME: f32 = 1.0 / 20.0;

/// Fixed step used by the movement integrator (seconds).
pub const MOVE_UPDATE_RATE: f32 = 1.0 / 25.0;

/// Asset root handed to AssetPlugin. Bevy resolves it against
/// BEVY_ASSET_ROOT, the cargo manifest directory or the executable's folder.
pub const ASSET_DIR: &str = "assets";

/// Name of the preferences folder under the platform data directory.
pub const SAVE_FOLDER: &str = "dark-matter";
