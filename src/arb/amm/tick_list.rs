//! Sorted list of initialized ticks and the word-bounded search used by the
//! swap loop.

use eyre::{bail, Result};

use super::tick_math::{MAX_TICK, MIN_TICK};

/// An initialized tick boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tick {
    /// Tick index, a multiple of the venue's tick spacing
    pub index: i32,
    /// Liquidity added when the price crosses this tick upward
    pub liquidity_net: i128,
}

impl Tick {
    /// Creates a tick
    #[must_use]
    pub const fn new(index: i32, liquidity_net: i128) -> Self {
        Self {
            index,
            liquidity_net,
        }
    }
}

/// Checks that a tick list can be walked by the swap loop.
///
/// # Errors
///
/// * If `tick_spacing` is not positive
/// * If an index is outside the tick range or not a multiple of `tick_spacing`
/// * If the list is not strictly ascending
/// * If the net liquidity deltas do not sum to zero
pub fn validate_ticks(ticks: &[Tick], tick_spacing: i32) -> Result<()> {
    if tick_spacing <= 0 {
        bail!("Tick spacing must be positive, got {tick_spacing}");
    }

    let mut net_sum: i128 = 0;
    for (i, tick) in ticks.iter().enumerate() {
        if !(MIN_TICK..=MAX_TICK).contains(&tick.index) {
            bail!("Tick {} is out of range", tick.index);
        }
        if tick.index % tick_spacing != 0 {
            bail!(
                "Tick {} is not aligned to spacing {}",
                tick.index,
                tick_spacing
            );
        }
        if i > 0 && ticks[i - 1].index >= tick.index {
            bail!(
                "Ticks are not strictly sorted: {} followed by {}",
                ticks[i - 1].index,
                tick.index
            );
        }
        let Some(sum) = net_sum.checked_add(tick.liquidity_net) else {
            bail!("Net liquidity overflows at tick {}", tick.index);
        };
        net_sum = sum;
    }

    if net_sum != 0 {
        bail!("Net liquidity sums to {net_sum}, expected 0");
    }
    Ok(())
}

/// Finds the next tick to step to from `tick`, looking no further than the
/// current 256-tick bitmap word, the same search window the pool uses.
///
/// # Arguments
///
/// * `ticks` - Initialized ticks, strictly ascending
/// * `tick` - Current tick
/// * `tick_spacing` - Venue tick spacing
/// * `lte` - Search at or below `tick` (price moving down) instead of above it
///
/// # Returns
///
/// The next tick index and the initialized tick at that index, if there is one.
/// When no initialized tick lies in the word, the word boundary is returned.
#[must_use]
pub fn next_initialized_tick_within_one_word(
    ticks: &[Tick],
    tick: i32,
    tick_spacing: i32,
    lte: bool,
) -> (i32, Option<&Tick>) {
    let compressed = tick.div_euclid(tick_spacing);
    // Number of ticks at or below `tick`
    let below = ticks.partition_point(|t| t.index <= tick);

    if lte {
        let word = compressed >> 8;
        let minimum = (word << 8) * tick_spacing;
        match below.checked_sub(1).map(|i| &ticks[i]) {
            Some(candidate) if candidate.index >= minimum => (candidate.index, Some(candidate)),
            _ => (minimum, None),
        }
    } else {
        let word = (compressed + 1) >> 8;
        let maximum = (((word + 1) << 8) - 1) * tick_spacing;
        match ticks.get(below) {
            Some(candidate) if candidate.index <= maximum => (candidate.index, Some(candidate)),
            _ => (maximum, None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ticks() -> Vec<Tick> {
        vec![
            Tick::new(-200, 10),
            Tick::new(-60, 5),
            Tick::new(60, -5),
            Tick::new(120, -10),
        ]
    }

    #[test]
    fn test_validate_ok() {
        assert!(validate_ticks(&ticks(), 60).is_err());
        let aligned = vec![
            Tick::new(-180, 10),
            Tick::new(-60, 5),
            Tick::new(60, -5),
            Tick::new(120, -10),
        ];
        validate_ticks(&aligned, 60).unwrap();
        validate_ticks(&[], 1).unwrap();
    }

    #[test]
    fn test_validate_errors() {
        let misaligned = validate_ticks(&ticks(), 60);
        assert_eq!(
            misaligned.err().unwrap().to_string(),
            "Tick -200 is not aligned to spacing 60"
        );

        let unsorted = validate_ticks(&[Tick::new(60, 1), Tick::new(0, -1)], 60);
        assert_eq!(
            unsorted.err().unwrap().to_string(),
            "Ticks are not strictly sorted: 60 followed by 0"
        );

        let unbalanced = validate_ticks(&[Tick::new(0, 1), Tick::new(60, -2)], 60);
        assert_eq!(
            unbalanced.err().unwrap().to_string(),
            "Net liquidity sums to -1, expected 0"
        );

        let out_of_range = validate_ticks(&[Tick::new(887_280, 0)], 10);
        assert_eq!(
            out_of_range.err().unwrap().to_string(),
            "Tick 887280 is out of range"
        );

        assert!(validate_ticks(&[], 0).is_err());
    }

    #[test]
    fn test_next_tick_lte() {
        let ticks = ticks();
        // exactly on an initialized tick counts as found
        assert_eq!(next_initialized_tick_within_one_word(&ticks, 60, 1, true).0, 60);
        // nearest tick below is past the word start
        let (next, initialized) = next_initialized_tick_within_one_word(&ticks, 59, 1, true);
        assert_eq!(next, 0);
        assert!(initialized.is_none());
        assert_eq!(next_initialized_tick_within_one_word(&ticks, -61, 1, true).0, -200);
        // below every tick: word boundary
        let (next, initialized) = next_initialized_tick_within_one_word(&ticks, -201, 1, true);
        assert_eq!(next, -256);
        assert!(initialized.is_none());
        // candidate outside the word
        let (next, initialized) = next_initialized_tick_within_one_word(&ticks, -1000, 1, true);
        assert_eq!(next, -1024);
        assert!(initialized.is_none());
    }

    #[test]
    fn test_next_tick_gt() {
        let ticks = ticks();
        let (next, initialized) = next_initialized_tick_within_one_word(&ticks, 60, 1, false);
        assert_eq!(next, 120);
        assert_eq!(initialized.unwrap().liquidity_net, -10);
        assert_eq!(next_initialized_tick_within_one_word(&ticks, -200, 1, false).0, -60);
        // above every tick
        assert_eq!(next_initialized_tick_within_one_word(&ticks, 120, 1, false).0, 255);
        // word boundary for negative ticks
        assert_eq!(next_initialized_tick_within_one_word(&ticks, -1000, 1, false).0, -769);
    }

    #[test]
    fn test_next_tick_with_spacing() {
        let ticks = vec![Tick::new(-887_270, 1), Tick::new(887_270, -1)];
        let (next, initialized) = next_initialized_tick_within_one_word(&ticks, -200_463, 10, true);
        // compressed -20047 lies in word -79, which starts at tick -202240
        assert_eq!(next, -202_240);
        assert!(initialized.is_none());
        let (next, _) = next_initialized_tick_within_one_word(&ticks, -200_463, 10, false);
        // last tick of word -79
        assert_eq!(next, -199_690);
    }
}
