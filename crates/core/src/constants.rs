//! Constants used throughout the wallpaper core crate.

/// Default SQLite database file when no explicit path is configured.
pub const DEFAULT_DATABASE_PATH: &str = "wallpapers.db";

/// Default static asset root; stored images live in its `uploads/` folder.
pub const DEFAULT_PUBLIC_DIR: &str = "public";

/// Maximum length of a wallpaper name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Separator between tags in the raw upload field.
pub const TAG_SEPARATOR: char = ',';
