/// low `width` bits set. `mask(0) == 0`, anything from 32 up is all ones.
#[inline]
pub const fn mask(width: u32) -> u32 {
    if width >= u32::BITS {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}

/// `width` bits of `bin` starting at bit `shift`.
#[inline]
pub const fn extract(bin: u32, shift: u32, width: u32) -> u32 {
    let shifted = match bin.checked_shr(shift) {
        Some(v) => v,
        None => 0,
    };
    shifted & mask(width)
}

/// number of right shifts until `n` drops to 1 or below.
/// equals `log2(n)` for powers of two, and 0 for 0 and 1.
#[inline]
pub const fn count_bits(mut n: u32) -> u32 {
    let mut count = 0;
    while n > 1 {
        count += 1;
        n >>= 1;
    }
    count
}

#[inline]
pub const fn is_power_of_two(n: u32) -> bool {
    n != 0 && n & (n - 1) == 0
}
