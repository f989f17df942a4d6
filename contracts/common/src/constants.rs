//! Protocol-wide fixed-point scales and storage TTL policy.

/// Scale for exchange rates, the interest accumulator and health factors
/// (7 decimals, matching the stroop).
pub const RATE_PRECISION: i128 = 10_000_000; // 1e7

/// Basis-point scale (100% = 10000 bps).
pub const BPS_DENOMINATOR: i128 = 10_000;

/// Ledgers per year at ~5s per ledger.
pub const LEDGERS_PER_YEAR: i128 = 6_307_200;

// ---------- TTL policy ----------
// Testnet: ~5s per ledger
// 30 days  ≈  518_400 ledgers
// 180 days ≈ 3_110_400 ledgers
pub const INSTANCE_LIFETIME_THRESHOLD: u32 = 100_800; // ~7 days
pub const INSTANCE_BUMP_AMOUNT: u32 = 518_400; // bump to ~30 days
pub const PERSISTENT_LIFETIME_THRESHOLD: u32 = 518_400; // ~30 days
pub const PERSISTENT_BUMP_AMOUNT: u32 = 3_110_400; // bump to ~180 days
