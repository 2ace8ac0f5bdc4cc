/// Split off a fixed size array from the front of the data
#[inline]
pub(crate) fn get_split<const N: usize>(data: &[u8]) -> Option<([u8; N], &[u8])> {
    data.split_first_chunk::<N>()
        .map(|(head, rest)| (*head, rest))
}

#[inline]
pub(crate) fn le_u32(data: [u8; 4]) -> u32 {
    u32::from_le_bytes(data)
}

/// Number of bytes at the end of the data that are NUL padding
#[inline]
pub(crate) fn trailing_nuls(data: &[u8]) -> usize {
    data.iter().rev().take_while(|&&b| b == 0).count()
}
