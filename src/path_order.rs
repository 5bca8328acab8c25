use std::cmp::Ordering;

/// Compares two sensor paths so that runs of decimal digits are ordered by
/// their numeric value ("fan2" < "fan10") and everything else byte-wise.
///
/// When only one side has a digit at the current position, the digit side
/// sorts first. When one path is a prefix of the other, the shorter sorts first.
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match (a[i].is_ascii_digit(), b[j].is_ascii_digit()) {
            (true, true) => {
                let end_a = digit_run_end(a, i);
                let end_b = digit_run_end(b, j);
                let ord = compare_numeric(&a[i..end_a], &b[j..end_b]);
                if ord != Ordering::Equal {
                    return ord;
                }
                i = end_a;
                j = end_b;
            }
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {
                if a[i] != b[j] {
                    return a[i].cmp(&b[j]);
                }
                i += 1;
                j += 1;
            }
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn digit_run_end(s: &[u8], start: usize) -> usize {
    s[start..]
        .iter()
        .position(|c| !c.is_ascii_digit())
        .map_or(s.len(), |n| start + n)
}

// Digit runs of any length, without parsing into a fixed-width integer.
fn compare_numeric(a: &[u8], b: &[u8]) -> Ordering {
    let a = strip_leading_zeros(a);
    let b = strip_leading_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn strip_leading_zeros(s: &[u8]) -> &[u8] {
    let first = s.iter().position(|&c| c != b'0').unwrap_or(s.len());
    &s[first..]
}
