//! Wegman-style integer scrambler used as the cost function of the puzzle.
//!
//! Not cryptographically hard. Only the low ~28 bits of the output should be
//! treated as pseudo-random; the upper bits (including the carry out of the
//! final addition) are not.

const LO_OFFSET: u32 = 0xACEF_ADE5;
const HI_OFFSET: u32 = 0xBADB_ABE5;

/// Scramble a 64-bit key. Bit-exact across platforms and processes.
pub fn digest(x: u64) -> u64 {
    let lo = (x as u32).wrapping_add(LO_OFFSET);
    let hi = ((x >> 32) as u32).wrapping_add(HI_OFFSET);

    let product = u64::from(lo) * u64::from(hi);

    let masked = product & 0xFFFF_FFFF;
    let shifted = (product >> 31) & 0xFFFF_FFFF;
    masked + shifted
}

#[cfg(test)]
mod tests {
    use super::digest;

    #[test]
    fn matches_reference_values() {
        assert_eq!(digest(0), 8_269_764_570);
        assert_eq!(digest(1), 7_109_755_841);
        assert_eq!(digest(77), 4_848_438_316);
        assert_eq!(digest(u64::MAX), 6_528_384_527);
        assert_eq!(digest(0xDEAD_BEEF_CAFE_BABE), 4_342_734_674);
    }

    #[test]
    fn is_deterministic() {
        for x in [0u64, 3, 77, 1 << 40, u64::MAX - 1] {
            assert_eq!(digest(x), digest(x));
        }
    }

    #[test]
    fn output_fits_in_33_bits() {
        for x in [0u64, 0xFFFF_FFFF, 0xFFFF_FFFF_0000_0000, u64::MAX] {
            assert!(digest(x) < (1u64 << 33));
        }
    }
}
