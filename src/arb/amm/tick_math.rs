//! Conversions between tick indices and Q64.96 sqrt-prices.
//!
//! Both directions reproduce the on-chain integer arithmetic exactly, so the
//! sqrt-price at a tick boundary here is the same value the pool contract
//! uses when it crosses that tick.

use alloy::primitives::{I256, U256};
use dashmap::DashMap;

/// The minimum tick that may be passed to [`sqrt_ratio_at_tick`]
pub const MIN_TICK: i32 = -887_272;
/// The maximum tick that may be passed to [`sqrt_ratio_at_tick`]
pub const MAX_TICK: i32 = 887_272;

/// `sqrt_ratio_at_tick(MIN_TICK)`
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4_295_128_739, 0, 0, 0]);
/// `sqrt_ratio_at_tick(MAX_TICK)`
pub const MAX_SQRT_RATIO: U256 = U256::from_limbs([
    0x5d95_1d52_6398_8d26,
    0xefd1_fc6a_5064_8849,
    0xfffd_8963,
    0,
]);

/// Multipliers for bits 1..=19 of `|tick|`, each `2^128 / sqrt(1.0001)^(2^i)`
const MAGIC: [u128; 19] = [
    0xfff9_7272_373d_4132_59a4_6990_580e_213a,
    0xfff2_e50f_5f65_6932_ef12_357c_f3c7_fdcc,
    0xffe5_caca_7e10_e4e6_1c36_24ea_a094_1cd0,
    0xffcb_9843_d60f_6159_c9db_5883_5c92_6644,
    0xff97_3b41_fa98_c081_472e_6896_dfb2_54c0,
    0xff2e_a164_66c9_6a38_43ec_78b3_26b5_2861,
    0xfe5d_ee04_6a99_a2a8_11c4_61f1_969c_3053,
    0xfcbe_86c7_900a_88ae_dcff_c83b_479a_a3a4,
    0xf987_a725_3ac4_1317_6f2b_074c_f781_5e54,
    0xf339_2b08_22b7_0005_940c_7a39_8e4b_70f3,
    0xe715_9475_a2c2_9b74_43b2_9c7f_a6e8_89d9,
    0xd097_f3bd_fd20_22b8_845a_d8f7_92aa_5825,
    0xa9f7_4646_2d87_0fdf_8a65_dc1f_90e0_61e5,
    0x70d8_69a1_56d2_a1b8_90bb_3df6_2baf_32f7,
    0x31be_135f_97d0_8fd9_8123_1505_542f_cfa6,
    0x09aa_508b_5b7a_84e1_c677_de54_f3e9_9bc9,
    0x005d_6af8_dedb_8119_6699_c329_225e_e604,
    0x0000_2216_e584_f5fa_1ea9_2604_1bed_fe98,
    0x0000_0000_048a_1703_91f7_dc42_444e_8fa2,
];

/// Multiplier for bit 0 of `|tick|`
const BIT_ZERO: u128 = 0xfffc_b933_bd6f_ad37_aa2d_162d_1a59_4001;

/// `2^128 / log2(sqrt(1.0001))`, the log base conversion factor
const LOG_SQRT_10001: u128 = 255_738_958_999_603_826_347_141;
/// Error bound subtracted for the low tick candidate
const TICK_LOW_ERROR: u128 = 3_402_992_956_809_132_418_596_140_100_660_247_210;
/// Error bound added for the high tick candidate
const TICK_HIGH_ERROR: u128 = 291_339_464_771_989_622_907_027_621_153_398_088_495;

/// Calculates `sqrt(1.0001^tick) * 2^96`, rounded up.
///
/// Returns `None` when `tick` lies outside `[MIN_TICK, MAX_TICK]`.
#[must_use]
pub fn sqrt_ratio_at_tick(tick: i32) -> Option<U256> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return None;
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 1 == 0 {
        U256::from(1u8) << 128
    } else {
        U256::from(BIT_ZERO)
    };
    for (bit, magic) in MAGIC.iter().enumerate() {
        if abs_tick & (1 << (bit + 1)) != 0 {
            ratio = (ratio * U256::from(*magic)) >> 128;
        }
    }
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 down to Q64.96, rounding up
    let round_up = !(ratio & U256::from(u32::MAX)).is_zero();
    Some((ratio >> 32) + U256::from(u8::from(round_up)))
}

/// Calculates the greatest tick such that `sqrt_ratio_at_tick(tick) <= sqrt_price_x96`.
///
/// Returns `None` when the price lies outside `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
#[must_use]
pub fn tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Option<i32> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return None;
    }
    let ratio = sqrt_price_x96 << 32usize;
    let msb = ratio.bit_len() - 1;

    // Normalize to a 128 bit mantissa in [2^127, 2^128)
    let mut r = if msb >= 128 {
        ratio >> (msb - 127)
    } else {
        ratio << (127 - msb)
    };

    let msb = i128::try_from(msb).ok()?;
    let mut log_2: i128 = (msb - 128) << 64;
    for i in 0..14 {
        r = (r * r) >> 127;
        if r.bit(128) {
            log_2 |= 1 << (63 - i);
            r >>= 1;
        }
    }

    let log_sqrt10001 = I256::try_from(log_2).ok()? * signed(LOG_SQRT_10001);
    let tick_low = (log_sqrt10001 - signed(TICK_LOW_ERROR)).asr(128);
    let tick_high = (log_sqrt10001 + signed(TICK_HIGH_ERROR)).asr(128);
    let tick_low = i32::try_from(tick_low).ok()?;
    let tick_high = i32::try_from(tick_high).ok()?;

    if tick_low == tick_high {
        return Some(tick_low);
    }
    if sqrt_ratio_at_tick(tick_high)? <= sqrt_price_x96 {
        Some(tick_high)
    } else {
        Some(tick_low)
    }
}

/// Positive u128 constant as a signed 256 bit value
fn signed(value: u128) -> I256 {
    I256::from_raw(U256::from(value))
}

/// Memo of [`sqrt_ratio_at_tick`] keyed by tick index.
///
/// Filled lazily and shared across evaluation threads. Two threads racing on the
/// same key both compute the same value, so the second insert is harmless.
#[derive(Debug, Default)]
pub struct TickCache {
    /// Computed sqrt-prices by tick
    prices: DashMap<i32, U256>,
}

impl TickCache {
    /// Creates an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached [`sqrt_ratio_at_tick`]
    #[must_use]
    pub fn sqrt_ratio_at_tick(&self, tick: i32) -> Option<U256> {
        if let Some(price) = self.prices.get(&tick) {
            return Some(*price);
        }
        let price = sqrt_ratio_at_tick(tick)?;
        self.prices.insert(tick, price);
        Some(price)
    }

    /// Number of memoized ticks
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether nothing has been memoized yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
