//! Partial-fill validation for multi-secret orders.
//!
//! An order split into `N` parts commits to `N + 1` secrets. Secret `i`
//! (1-based here, `validated_index`) authorizes the fill that brings the
//! cumulative filled amount into part `i`; the extra secret is reserved for
//! the fill that completes the order.
//!
//! ```text
//!   order = 100, parts = 4
//!
//!   filled after fill:  1..25 | 26..50 | 51..75 | 76..99 | 100
//!   required index:       1   |   2    |   3    |   4    |  5
//! ```
//!
//! Two consecutive fills that land in the same part are rejected, so every
//! secret is consumed at most once.

/// Whether a fill of `making_amount` is authorized by the secret at
/// `validated_index`.
///
/// `remaining_making_amount` is the amount left on the order *before* this
/// fill. Arithmetic is unsigned and truncating; any underflow, overflow or
/// zero order amount makes the fill invalid.
#[must_use]
pub fn is_valid_partial_fill(
    making_amount: u128,
    remaining_making_amount: u128,
    order_making_amount: u128,
    parts_amount: u16,
    validated_index: u64,
) -> bool {
    let Some(calculated_index) = part_index(
        order_making_amount,
        remaining_making_amount,
        making_amount,
        parts_amount,
    ) else {
        return false;
    };

    if remaining_making_amount == making_amount {
        // Completing fill uses the extra secret.
        return u128::from(validated_index) == calculated_index + 2;
    }

    if order_making_amount != remaining_making_amount {
        // Not the first fill: must advance to a new part.
        let Some(previous_index) =
            part_index(order_making_amount, remaining_making_amount, 0, parts_amount)
        else {
            return false;
        };
        if previous_index == calculated_index {
            return false;
        }
    }

    u128::from(validated_index) == calculated_index + 1
}

/// `((order - remaining + fill - 1) * parts) / order`
fn part_index(order: u128, remaining: u128, fill: u128, parts: u16) -> Option<u128> {
    if order == 0 {
        return None;
    }
    order
        .checked_sub(remaining)?
        .checked_add(fill)?
        .checked_sub(1)?
        .checked_mul(u128::from(parts))
        .map(|n| n / order)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: u128 = 100;
    const PARTS: u16 = 4;

    #[test]
    fn first_quarter_needs_index_one() {
        assert!(is_valid_partial_fill(25, ORDER, ORDER, PARTS, 1));
        assert!(!is_valid_partial_fill(25, ORDER, ORDER, PARTS, 0));
        assert!(!is_valid_partial_fill(25, ORDER, ORDER, PARTS, 2));
    }

    #[test]
    fn sequential_quarters_advance_the_index() {
        assert!(is_valid_partial_fill(25, 100, ORDER, PARTS, 1));
        assert!(is_valid_partial_fill(25, 75, ORDER, PARTS, 2));
        assert!(is_valid_partial_fill(25, 50, ORDER, PARTS, 3));
        // Last quarter completes the order and takes the extra secret.
        assert!(is_valid_partial_fill(25, 25, ORDER, PARTS, 5));
        assert!(!is_valid_partial_fill(25, 25, ORDER, PARTS, 4));
    }

    #[test]
    fn full_fill_in_one_go_uses_extra_secret() {
        // calc = (99 * 4) / 100 = 3, completing fill needs calc + 2.
        assert!(is_valid_partial_fill(100, 100, ORDER, PARTS, 5));
        assert!(!is_valid_partial_fill(100, 100, ORDER, PARTS, 4));
    }

    #[test]
    fn completing_fill_from_the_middle() {
        // 50 filled, 50 remaining, fill the rest: calc = (99 * 4) / 100 = 3.
        assert!(is_valid_partial_fill(50, 50, ORDER, PARTS, 5));
    }

    #[test]
    fn second_fill_in_same_part_is_rejected() {
        // First fill of 10 lands in part 0; a further 5 stays in part 0.
        assert!(is_valid_partial_fill(10, 100, ORDER, PARTS, 1));
        assert!(!is_valid_partial_fill(5, 90, ORDER, PARTS, 1));
        assert!(!is_valid_partial_fill(5, 90, ORDER, PARTS, 2));
    }

    #[test]
    fn fill_skipping_parts_takes_the_far_index() {
        // 60 in one go from a fresh order lands in part 2.
        assert!(is_valid_partial_fill(60, 100, ORDER, PARTS, 3));
        assert!(!is_valid_partial_fill(60, 100, ORDER, PARTS, 1));
    }

    #[test]
    fn degenerate_inputs_are_invalid() {
        assert!(!is_valid_partial_fill(10, 100, 0, PARTS, 1));
        // Remaining larger than the order.
        assert!(!is_valid_partial_fill(10, 200, ORDER, PARTS, 1));
        // Zero fill on a fresh order underflows.
        assert!(!is_valid_partial_fill(0, 100, ORDER, PARTS, 1));
        assert!(!is_valid_partial_fill(u128::MAX, u128::MAX, u128::MAX, PARTS, 1));
    }
}
