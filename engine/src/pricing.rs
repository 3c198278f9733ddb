//! Linear bonding-curve pricing.
//!
//! Key prices rise linearly with the number of keys already sold. All monetary
//! math runs in u128 intermediates with checked arithmetic and truncating
//! division; no floating point anywhere.

use lastkey_types::constants::BPS_DENOMINATOR;

/// Price of the key at `key_index` (0-based ordinal, i.e. the number of keys
/// already sold): `base_price + increment * key_index`.
///
/// Returns `None` on overflow.
pub fn price_at(key_index: u64, base_price: u64, increment: u64) -> Option<u64> {
    let price = (increment as u128)
        .checked_mul(key_index as u128)?
        .checked_add(base_price as u128)?;
    u64::try_from(price).ok()
}

/// Total cost of buying `count` keys starting at supply `start_index`, as the
/// closed-form arithmetic series
/// `count * base_price + increment * count * (2 * start_index + count - 1) / 2`.
///
/// O(1) and exact for any count up to the purchase maximum. `count == 0`
/// costs nothing. Returns `None` on overflow.
pub fn cumulative_cost(
    start_index: u64,
    count: u64,
    base_price: u64,
    increment: u64,
) -> Option<u64> {
    if count == 0 {
        return Some(0);
    }
    let n = count as u128;
    let k = start_index as u128;
    let base_cost = n.checked_mul(base_price as u128)?;
    let series_numerator = n.checked_mul(k.checked_mul(2)?.checked_add(n)?.checked_sub(1)?)?;
    let series_cost = (increment as u128)
        .checked_mul(series_numerator)?
        .checked_div(2)?;
    u64::try_from(base_cost.checked_add(series_cost)?).ok()
}

/// A basis-point split: `amount * bps / 10_000`, truncating.
pub fn bps_split(amount: u64, bps: u64) -> Option<u64> {
    let split = (amount as u128)
        .checked_mul(bps as u128)?
        .checked_div(BPS_DENOMINATOR as u128)?;
    u64::try_from(split).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u64 = 10_000_000;
    const INC: u64 = 1_000_000;

    #[test]
    fn price_grows_linearly() {
        assert_eq!(price_at(0, BASE, INC), Some(10_000_000));
        assert_eq!(price_at(1, BASE, INC), Some(11_000_000));
        assert_eq!(price_at(100, BASE, INC), Some(110_000_000));
        for i in 0..1_000u64 {
            let step =
                price_at(i + 1, BASE, INC).unwrap() - price_at(i, BASE, INC).unwrap();
            assert_eq!(step, INC);
        }
    }

    #[test]
    fn cost_batch_of_5_from_supply_100() {
        // 110M + 111M + 112M + 113M + 114M
        assert_eq!(cumulative_cost(100, 5, BASE, INC), Some(560_000_000));
    }

    #[test]
    fn cost_batch_of_10_from_zero() {
        // 10 * 10M + 1M * 10 * 9 / 2 = 145M
        assert_eq!(cumulative_cost(0, 10, BASE, INC), Some(145_000_000));
    }

    #[test]
    fn closed_form_matches_brute_force() {
        for &(start, count) in &[(0u64, 1u64), (0, 17), (3, 100), (100, 5), (999, 1_000), (0, 10_000)] {
            let brute: u128 = (start..start + count)
                .map(|i| price_at(i, BASE, INC).unwrap() as u128)
                .sum();
            assert_eq!(
                cumulative_cost(start, count, BASE, INC).unwrap() as u128,
                brute,
                "mismatch at start={start} count={count}"
            );
        }
    }

    #[test]
    fn cost_sum_matches_individual_buys() {
        let batch = cumulative_cost(10, 5, BASE, INC).unwrap();
        let mut singles = 0u64;
        for i in 0..5u64 {
            singles += cumulative_cost(10 + i, 1, BASE, INC).unwrap();
        }
        assert_eq!(batch, singles);
    }

    #[test]
    fn cost_of_zero_keys_is_zero() {
        assert_eq!(cumulative_cost(0, 0, BASE, INC), Some(0));
        assert_eq!(cumulative_cost(500, 0, BASE, INC), Some(0));
    }

    #[test]
    fn cost_zero_increment_is_flat() {
        assert_eq!(cumulative_cost(100, 5, BASE, 0), Some(50_000_000));
    }

    #[test]
    fn cost_overflow_is_none() {
        assert_eq!(cumulative_cost(u64::MAX, 10_000, u64::MAX, u64::MAX), None);
    }

    #[test]
    fn bps_split_truncates() {
        assert_eq!(bps_split(1_000_000_000, 4800), Some(480_000_000));
        assert_eq!(bps_split(99, 4800), Some(47));
        assert_eq!(bps_split(0, 4800), Some(0));
        assert_eq!(bps_split(1_000_000_000, 0), Some(0));
        assert_eq!(bps_split(1_000_000_000, 10_000), Some(1_000_000_000));
    }

    #[test]
    fn fee_ordering_conserves_funds() {
        // house fee off the top, referral from the remainder, pot splits last;
        // every lamport of dust comes from truncating division
        for cost in [1u64, 100, 999, 10_000_000, 1_000_000_000, 10_000_000_000] {
            let house_fee = bps_split(cost, 200).unwrap();
            let after_fee = cost - house_fee;
            let referral = bps_split(after_fee, 1_000).unwrap();
            let pot = after_fee - referral;

            let winner = bps_split(pot, 4_800).unwrap();
            let dividend = bps_split(pot, 4_500).unwrap();
            let next_round = bps_split(pot, 700).unwrap();

            let accounted = house_fee + referral + winner + dividend + next_round;
            assert!(accounted <= cost);
            assert!(cost - accounted <= 3, "too much dust at cost {cost}");
        }
    }
}
