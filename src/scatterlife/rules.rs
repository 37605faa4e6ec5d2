//! B3/S23 transition applied to a chunk of neighbor counts.

use crate::grid::{ALIVE, DEAD};

/// Next state of a cell with `count` live neighbors.
#[inline(always)]
pub fn next_state(count: u8, alive: bool) -> bool {
    count == 3 || (count == 2 && alive)
}

/// Replace each count in `counts` with the next state of the matching cell
/// in `current`. Both slices cover the same padded positions.
///
/// Border positions carry a corrected count of 0 and therefore stay dead.
pub fn apply_rule(counts: &mut [u8], current: &[u8]) {
    assert_eq!(counts.len(), current.len(), "counts and cells cover different rows");
    for (count, &cell) in counts.iter_mut().zip(current) {
        *count = if next_state(*count, cell != DEAD) { ALIVE } else { DEAD };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_matches_reference() {
        for count in 0u8..=8 {
            for alive in [false, true] {
                let expected = match (alive, count) {
                    (true, 2) | (true, 3) => true,
                    (false, 3) => true,
                    _ => false,
                };
                assert_eq!(
                    next_state(count, alive),
                    expected,
                    "count {count} alive {alive}"
                );
            }
        }
    }

    #[test]
    fn apply_rule_rewrites_in_place() {
        let mut counts = [0u8, 2, 2, 3, 3, 4];
        let current = [0u8, 0, 1, 0, 1, 1];
        apply_rule(&mut counts, &current);
        assert_eq!(counts, [0, 0, 1, 1, 1, 0]);
    }
}
