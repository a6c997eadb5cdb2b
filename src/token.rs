/// The eight brainfuck command characters; everything else is comment.
pub const COMMANDS: &[u8] = b"><+-.,[]";

/// Brainfuck source with comment bytes stripped. `src_offsets[i]` is the
/// byte offset of `ops[i]` in the raw source, kept so bracket errors can
/// point at the original text.
pub struct Normalized {
    pub ops: Vec<u8>,
    pub src_offsets: Vec<usize>,
}

impl Normalized {
    /// True if the program never reads input. The i386 generator uses
    /// this to hoist the write-syscall setup into the prologue.
    pub fn is_output_only(&self) -> bool {
        !self.ops.contains(&b',')
    }
}

/// Strips everything but the eight command characters, preserving order.
pub fn normalize(source: &[u8]) -> Normalized {
    let mut ops = Vec::with_capacity(source.len());
    let mut src_offsets = Vec::with_capacity(source.len());
    for (i, &b) in source.iter().enumerate() {
        if COMMANDS.contains(&b) {
            ops.push(b);
            src_offsets.push(i);
        }
    }
    Normalized { ops, src_offsets }
}

/// Number of consecutive occurrences of `ch` in `ops` starting at `pos`.
pub fn count_run(ops: &[u8], pos: usize, ch: u8) -> usize {
    ops[pos..].iter().take_while(|&&b| b == ch).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_preserving_order() {
        let norm = normalize(b"say + hello . to , the [ world ] -");
        assert_eq!(norm.ops, b"+.,[]-");
        assert_eq!(norm.src_offsets, vec![4, 12, 17, 23, 31, 33]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize(b"++ comment -- [>.<]");
        let twice = normalize(&once.ops);
        assert_eq!(once.ops, twice.ops);
    }

    #[test]
    fn counts_runs() {
        let ops = b"+++>>-";
        assert_eq!(count_run(ops, 0, b'+'), 3);
        assert_eq!(count_run(ops, 3, b'>'), 2);
        assert_eq!(count_run(ops, 5, b'-'), 1);
        assert_eq!(count_run(ops, 5, b'+'), 0);
        assert_eq!(count_run(ops, 6, b'-'), 0);
    }

    #[test]
    fn output_only_scan() {
        assert!(normalize(b"+++.").is_output_only());
        assert!(!normalize(b",.").is_output_only());
        assert!(normalize(b"").is_output_only());
    }
}
