//! Storage limits and naming constants.

/// Maximum accepted size of a single stored image (10 MiB).
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Directory name, under the public root, holding stored images.
pub const UPLOADS_FOLDER_NAME: &str = "uploads";

/// URL prefix under which stored images are served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Prefix for generated file names.
pub(crate) const FILE_NAME_PREFIX: &str = "image";

/// Upper bound (exclusive) for the random part of a generated file name.
pub(crate) const RANDOM_SUFFIX_BOUND: u32 = 1_000_000_000;

/// Attempts at allocating a fresh file name before giving up.
pub(crate) const MAX_NAME_ATTEMPTS: usize = 5;
