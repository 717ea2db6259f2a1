/// Current block version
pub const BLOCK_VERSION: u16 = 1;

/// Current transaction version
pub const TX_VERSION: u16 = 0;

/// Lock times below this threshold are DAA scores, above it they are
/// millisecond timestamps compared against past median time.
pub const LOCK_TIME_THRESHOLD: u64 = 500_000_000_000;

/// Number of sompi (base units) in one Jiocoin
pub const SOMPI_PER_JIO: u64 = 100_000_000;

/// Maximum amount of sompi that can ever exist
pub const MAX_SOMPI: u64 = 29_000_000_000 * SOMPI_PER_JIO;

/// Fixed mass charged per transaction
pub const BASE_TX_MASS: u64 = 100;
pub const MASS_PER_INPUT: u64 = 150;
pub const MASS_PER_OUTPUT: u64 = 50;
pub const MASS_PER_BYTE: u64 = 1;
