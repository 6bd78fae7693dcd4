const SEED: u32 = 0xFFFF;
const POLYNOMIAL: u32 = 0x1021;

/// CRC-16/CCITT-FALSE over the code points of `text`.
///
/// Every character is folded into the high byte of the register, so only its low 8 bits
/// take part in the sum.
pub fn checksum_u16(text: &str) -> u16 {
    let mut crc = SEED;

    for ch in text.chars() {
        crc ^= (ch as u32) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 == 0 {
                crc << 1
            } else {
                (crc << 1) ^ POLYNOMIAL
            };
            crc &= 0xFFFF;
        }
    }

    crc as u16
}

/// Checksum rendered as 4 uppercase hex digits, the form carried by tag `63`.
pub fn checksum(text: &str) -> String {
    format!("{:04X}", checksum_u16(text))
}
