const FINGERPRINT_CAP: usize = 50;
const PREFIX_LEN: usize = 5;

/// Lightweight, order-sensitive stability key for a batch's payload:
/// concatenation of the first 5 characters of each item, truncated to
/// 50 characters total.
///
/// This is deliberately lossy — two batches whose items differ only
/// past the fifth character compare equal. A content hash (e.g.
/// blake3) would not have this blind spot, at the cost of not matching
/// "almost identical" batches the way this scheme incidentally does;
/// swapping the concatenation rule for a hash is a drop-in change
/// confined to this function.
pub fn compute(items: &[String]) -> String {
    let mut out = String::with_capacity(FINGERPRINT_CAP);
    let mut chars = 0usize;
    for item in items {
        if chars >= FINGERPRINT_CAP {
            break;
        }
        for ch in item.chars().take(PREFIX_LEN) {
            if chars >= FINGERPRINT_CAP {
                break;
            }
            out.push(ch);
            chars += 1;
        }
    }
    out
}
