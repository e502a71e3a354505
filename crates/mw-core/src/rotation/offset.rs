use mw_model::Position;

/// Item index shown by the screen at `position` for relative slot `offset`.
///
/// `(global + position + offset) mod len`, normalized into `[0, len)`. Returns 0 for an
/// empty list.
pub fn product_index(global: i64, position: Position, offset: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    // Widened so extreme indices cannot overflow; the remainder is below `len`.
    (global as i128 + position as i128 + offset as i128).rem_euclid(len as i128) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_for_negative_operands() {
        assert_eq!(product_index(0, 0, -1, 3), 2);
        assert_eq!(product_index(-4, 0, 0, 3), 2);
    }

    #[test]
    fn extreme_indices_stay_in_range() {
        assert_eq!(product_index(i64::MAX, 1, 1, 3), 0);
        assert_eq!(product_index(i64::MIN, 0, -1, 3), 0);
        assert!(product_index(i64::MAX, u32::MAX, 1, 7) < 7);
    }

    #[test]
    fn empty_list_is_zero() {
        assert_eq!(product_index(17, 3, 1, 0), 0);
    }

    #[test]
    fn phase_offset_holds_at_every_index() {
        let len = 5;
        for global in -20..20 {
            for pos in 0..8u32 {
                let d = product_index(global, pos, 0, len) as i64 - product_index(global, 0, 0, len) as i64;
                assert_eq!(d.rem_euclid(len as i64), (pos as i64) % len as i64);
            }
        }
    }
}
