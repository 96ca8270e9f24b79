//! Line-based unified diff.
//!
//! Computes a shortest edit script with the linear-space variant of Myers'
//! O(ND) algorithm, groups it into hunks with a fixed amount of context, and
//! renders the classic `---`/`+++`/`@@` format. Output is deterministic for
//! a given input.

/// Lines of unchanged context kept around each change.
pub const CONTEXT_LINES: usize = 3;

/// One run of the edit script, as half-open ranges into the old and new
/// line slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Equal { old: (usize, usize), new: (usize, usize) },
    Delete { old: (usize, usize), new: (usize, usize) },
    Insert { old: (usize, usize), new: (usize, usize) },
    Replace { old: (usize, usize), new: (usize, usize) },
}

impl OpCode {
    fn ranges(&self) -> ((usize, usize), (usize, usize)) {
        match *self {
            OpCode::Equal { old, new }
            | OpCode::Delete { old, new }
            | OpCode::Insert { old, new }
            | OpCode::Replace { old, new } => (old, new),
        }
    }

    fn is_equal(&self) -> bool {
        matches!(self, OpCode::Equal { .. })
    }

    fn with_ranges(&self, old: (usize, usize), new: (usize, usize)) -> OpCode {
        match self {
            OpCode::Equal { .. } => OpCode::Equal { old, new },
            OpCode::Delete { .. } => OpCode::Delete { old, new },
            OpCode::Insert { .. } => OpCode::Insert { old, new },
            OpCode::Replace { .. } => OpCode::Replace { old, new },
        }
    }
}

/// Render a unified diff of `old` against `new`.
///
/// Lines are compared exactly, line endings included. A final line without
/// a newline is followed by `\ No newline at end of file`. Returns an empty
/// string when the inputs are identical.
pub fn unified_diff(
    old: &[&str],
    new: &[&str],
    from_label: &str,
    to_label: &str,
    context: usize,
) -> String {
    let groups = grouped_opcodes(&opcodes(old, new), context);
    if groups.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("--- {}\n+++ {}\n", from_label, to_label));

    for group in &groups {
        let (first_old, first_new) = group[0].ranges();
        let (last_old, last_new) = group[group.len() - 1].ranges();
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            format_range(first_old.0, last_old.1),
            format_range(first_new.0, last_new.1)
        ));

        for op in group {
            let (o, n) = op.ranges();
            match op {
                OpCode::Equal { .. } => push_lines(&mut out, ' ', &old[o.0..o.1]),
                OpCode::Delete { .. } => push_lines(&mut out, '-', &old[o.0..o.1]),
                OpCode::Insert { .. } => push_lines(&mut out, '+', &new[n.0..n.1]),
                OpCode::Replace { .. } => {
                    push_lines(&mut out, '-', &old[o.0..o.1]);
                    push_lines(&mut out, '+', &new[n.0..n.1]);
                }
            }
        }
    }

    out
}

fn push_lines(out: &mut String, prefix: char, lines: &[&str]) {
    for line in lines {
        out.push(prefix);
        out.push_str(line);
        if !line.ends_with('\n') {
            out.push_str("\n\\ No newline at end of file\n");
        }
    }
}

/// Hunk range in `start,length` form; a one-line range omits the length and
/// an empty range points at the line before it.
fn format_range(start: usize, stop: usize) -> String {
    let length = stop - start;
    match length {
        1 => format!("{}", start + 1),
        0 => format!("{},0", start),
        _ => format!("{},{}", start + 1, length),
    }
}

/// Collapse the edit script into runs of equal lines and change blocks.
pub fn opcodes(old: &[&str], new: &[&str]) -> Vec<OpCode> {
    let edits = edit_script(old, new);

    let mut codes = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    let mut k = 0;

    while k < edits.len() {
        if edits[k] == Edit::Equal {
            let (i0, j0) = (i, j);
            while k < edits.len() && edits[k] == Edit::Equal {
                i += 1;
                j += 1;
                k += 1;
            }
            codes.push(OpCode::Equal {
                old: (i0, i),
                new: (j0, j),
            });
        } else {
            let (i0, j0) = (i, j);
            while k < edits.len() && edits[k] != Edit::Equal {
                match edits[k] {
                    Edit::Delete => i += 1,
                    Edit::Insert => j += 1,
                    Edit::Equal => unreachable!(),
                }
                k += 1;
            }
            let old = (i0, i);
            let new = (j0, j);
            codes.push(match (i > i0, j > j0) {
                (true, true) => OpCode::Replace { old, new },
                (true, false) => OpCode::Delete { old, new },
                _ => OpCode::Insert { old, new },
            });
        }
    }

    codes
}

/// Split opcodes into hunks, trimming equal runs to `context` lines on
/// each side of a change.
fn grouped_opcodes(codes: &[OpCode], context: usize) -> Vec<Vec<OpCode>> {
    if codes.iter().all(OpCode::is_equal) {
        return Vec::new();
    }

    let mut codes = codes.to_vec();
    if let Some(first) = codes.first_mut() {
        if first.is_equal() {
            let (o, n) = first.ranges();
            *first = first.with_ranges(
                (o.0.max(o.1.saturating_sub(context)), o.1),
                (n.0.max(n.1.saturating_sub(context)), n.1),
            );
        }
    }
    if let Some(last) = codes.last_mut() {
        if last.is_equal() {
            let (o, n) = last.ranges();
            *last = last.with_ranges(
                (o.0, o.1.min(o.0 + context)),
                (n.0, n.1.min(n.0 + context)),
            );
        }
    }

    let mut groups = Vec::new();
    let mut group: Vec<OpCode> = Vec::new();
    for code in codes {
        let (mut o, mut n) = code.ranges();
        if code.is_equal() && o.1 - o.0 > context * 2 {
            group.push(code.with_ranges(
                (o.0, o.1.min(o.0 + context)),
                (n.0, n.1.min(n.0 + context)),
            ));
            groups.push(std::mem::take(&mut group));
            o.0 = o.0.max(o.1.saturating_sub(context));
            n.0 = n.0.max(n.1.saturating_sub(context));
        }
        group.push(code.with_ranges(o, n));
    }
    if !(group.is_empty() || (group.len() == 1 && group[0].is_equal())) {
        groups.push(group);
    }

    groups
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Equal,
    Delete,
    Insert,
}

/// Shortest edit script turning `a` into `b`.
fn edit_script(a: &[&str], b: &[&str]) -> Vec<Edit> {
    let mut edits = Vec::with_capacity(a.len() + b.len());
    conquer(a, b, &mut edits);
    edits
}

fn common_prefix(a: &[&str], b: &[&str]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[&str], b: &[&str]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

fn push_edits(out: &mut Vec<Edit>, edit: Edit, count: usize) {
    out.extend(std::iter::repeat(edit).take(count));
}

/// Divide and conquer: strip the shared ends, split what is left at a point
/// on a shortest path, and solve both halves. Memory stays linear in the
/// input size however far apart the two sides are.
fn conquer(a: &[&str], b: &[&str], out: &mut Vec<Edit>) {
    let prefix = common_prefix(a, b);
    let suffix = common_suffix(&a[prefix..], &b[prefix..]);
    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];

    push_edits(out, Edit::Equal, prefix);
    if a_mid.is_empty() {
        push_edits(out, Edit::Insert, b_mid.len());
    } else if b_mid.is_empty() {
        push_edits(out, Edit::Delete, a_mid.len());
    } else if let Some((x, y)) = middle_snake(a_mid, b_mid) {
        conquer(&a_mid[..x], &b_mid[..y], out);
        conquer(&a_mid[x..], &b_mid[y..], out);
    } else {
        push_edits(out, Edit::Delete, a_mid.len());
        push_edits(out, Edit::Insert, b_mid.len());
    }
    push_edits(out, Edit::Equal, suffix);
}

/// Run the forward and backward searches in lockstep until their frontiers
/// overlap, and return the split point (x, y) where they meet.
///
/// Both inputs must be non-empty and differ in their first and last lines,
/// so the split is never (0, 0) or (n, m).
fn middle_snake(a: &[&str], b: &[&str]) -> Option<(usize, usize)> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let delta = n - m;
    let odd = delta.rem_euclid(2) == 1;
    let d_max = (n + m + 1) / 2 + 1;
    let at = |k: isize| (k + d_max) as usize;
    let on_grid = |x: isize, y: isize| (0..=n).contains(&x) && (0..=m).contains(&y);

    // Furthest x reached on each diagonal k = x - y. The backward search
    // measures x and y from the end of both inputs.
    let mut forward = vec![0isize; 2 * d_max as usize + 1];
    let mut backward = forward.clone();

    for d in 0..d_max {
        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && forward[at(k - 1)] < forward[at(k + 1)]) {
                forward[at(k + 1)]
            } else {
                forward[at(k - 1)] + 1
            };
            let (x0, y0) = (x, x - k);
            let mut y = y0;
            while x < n && (0..m).contains(&y) && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            forward[at(k)] = x;

            if odd
                && (k - delta).abs() < d
                && x + backward[at(delta - k)] >= n
                && on_grid(x0, y0)
            {
                return Some((x0 as usize, y0 as usize));
            }
        }

        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && backward[at(k - 1)] < backward[at(k + 1)]) {
                backward[at(k + 1)]
            } else {
                backward[at(k - 1)] + 1
            };
            let mut y = x - k;
            while x < n
                && (0..m).contains(&y)
                && a[(n - x - 1) as usize] == b[(m - y - 1) as usize]
            {
                x += 1;
                y += 1;
            }
            backward[at(k)] = x;

            if !odd
                && (k - delta).abs() <= d
                && x + forward[at(delta - k)] >= n
                && on_grid(n - x, m - y)
            {
                return Some(((n - x) as usize, (m - y) as usize));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.split_inclusive('\n').collect()
    }

    /// Apply an edit script back onto `a` to check it produces `b`.
    fn replay(a: &[&str], b: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        for code in opcodes(a, b) {
            match code {
                OpCode::Equal { old, .. } => {
                    out.extend(a[old.0..old.1].iter().map(|s| s.to_string()))
                }
                OpCode::Delete { .. } => {}
                OpCode::Insert { new, .. } | OpCode::Replace { new, .. } => {
                    out.extend(b[new.0..new.1].iter().map(|s| s.to_string()))
                }
            }
        }
        out
    }

    #[test]
    fn test_identical_input_yields_empty_diff() {
        let a = lines("one\ntwo\nthree\n");
        assert_eq!(unified_diff(&a, &a, "a", "b", CONTEXT_LINES), "");
    }

    #[test]
    fn test_both_empty_yields_empty_diff() {
        assert_eq!(unified_diff(&[], &[], "a", "b", CONTEXT_LINES), "");
    }

    #[test]
    fn test_single_line_change() {
        let a = lines("status: Draft\n");
        let b = lines("status: Approved\n");
        let diff = unified_diff(&a, &b, "1_v1.md", "1_v2.md", CONTEXT_LINES);
        assert_eq!(
            diff,
            "--- 1_v1.md\n+++ 1_v2.md\n@@ -1 +1 @@\n-status: Draft\n+status: Approved\n"
        );
    }

    #[test]
    fn test_all_added_from_empty() {
        let b = lines("## New\nbody\n");
        let diff = unified_diff(&[], &b, "a", "b", CONTEXT_LINES);
        assert_eq!(diff, "--- a\n+++ b\n@@ -0,0 +1,2 @@\n+## New\n+body\n");
    }

    #[test]
    fn test_all_deleted_to_empty() {
        let a = lines("## Old\nbody\n");
        let diff = unified_diff(&a, &[], "a", "b", CONTEXT_LINES);
        assert_eq!(diff, "--- a\n+++ b\n@@ -1,2 +0,0 @@\n-## Old\n-body\n");
    }

    #[test]
    fn test_context_is_limited_to_three_lines() {
        let a = lines("1\n2\n3\n4\n5\n6\n7\n8\n9\n");
        let b = lines("1\n2\n3\n4\nX\n6\n7\n8\n9\n");
        let diff = unified_diff(&a, &b, "a", "b", CONTEXT_LINES);
        assert_eq!(
            diff,
            "--- a\n+++ b\n@@ -2,7 +2,7 @@\n 2\n 3\n 4\n-5\n+X\n 6\n 7\n 8\n"
        );
    }

    #[test]
    fn test_distant_changes_form_separate_hunks() {
        let a: Vec<String> = (1..=20).map(|i| format!("{}\n", i)).collect();
        let mut b = a.clone();
        b[1] = "two\n".to_string();
        b[18] = "nineteen\n".to_string();
        let a: Vec<&str> = a.iter().map(|s| s.as_str()).collect();
        let b: Vec<&str> = b.iter().map(|s| s.as_str()).collect();
        let diff = unified_diff(&a, &b, "a", "b", CONTEXT_LINES);
        assert_eq!(diff.matches("@@ -").count(), 2);
        assert!(diff.contains("@@ -1,5 +1,5 @@"));
        assert!(diff.contains("@@ -16,5 +16,5 @@"));
    }

    #[test]
    fn test_missing_trailing_newline_is_marked() {
        let a = lines("a\nb");
        let b = lines("a\nc");
        let diff = unified_diff(&a, &b, "x", "y", CONTEXT_LINES);
        assert!(diff.ends_with(
            "-b\n\\ No newline at end of file\n+c\n\\ No newline at end of file\n"
        ));
    }

    #[test]
    fn test_adding_final_newline_is_visible() {
        let a = lines("x");
        let b = lines("x\n");
        let diff = unified_diff(&a, &b, "a", "b", CONTEXT_LINES);
        assert_eq!(
            diff,
            "--- a\n+++ b\n@@ -1 +1 @@\n-x\n\\ No newline at end of file\n+x\n"
        );
    }

    #[test]
    fn test_edit_script_reproduces_target() {
        let a = lines("a\nb\nc\na\nb\nb\na\n");
        let b = lines("c\nb\na\nb\na\nc\n");
        let got = replay(&a, &b);
        let want: Vec<String> = b.iter().map(|s| s.to_string()).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_edit_script_is_minimal_for_insertion() {
        let a = lines("x\ny\n");
        let b = lines("x\nnew\ny\n");
        let codes = opcodes(&a, &b);
        assert_eq!(
            codes,
            vec![
                OpCode::Equal { old: (0, 1), new: (0, 1) },
                OpCode::Insert { old: (1, 1), new: (1, 2) },
                OpCode::Equal { old: (1, 2), new: (2, 3) },
            ]
        );
    }

    fn numbered(prefix: &str, count: usize) -> Vec<String> {
        (0..count).map(|i| format!("{} {}\n", prefix, i)).collect()
    }

    fn as_lines(owned: &[String]) -> Vec<&str> {
        owned.iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn test_large_deletion() {
        let owned = numbered("line", 5000);
        let a = as_lines(&owned);
        let diff = unified_diff(&a, &[], "a", "b", CONTEXT_LINES);
        assert!(diff.starts_with("--- a\n+++ b\n@@ -1,5000 +0,0 @@\n-line 0\n"));
        assert_eq!(diff.lines().filter(|l| l.starts_with('-')).count(), 5001);
        assert!(!diff.lines().any(|l| l.starts_with('+') && !l.starts_with("+++")));
    }

    #[test]
    fn test_large_replacement() {
        let old = numbered("old", 2000);
        let new = numbered("new", 2000);
        let codes = opcodes(&as_lines(&old), &as_lines(&new));
        assert_eq!(
            codes,
            vec![OpCode::Replace { old: (0, 2000), new: (0, 2000) }]
        );
    }

    #[test]
    fn test_sparse_edits_in_long_input() {
        let old = numbered("line", 3000);
        let mut new = old.clone();
        for i in (0..3000).step_by(10) {
            new[i] = format!("edited {}\n", i);
        }
        let (a, b) = (as_lines(&old), as_lines(&new));
        let equal = edit_script(&a, &b)
            .iter()
            .filter(|e| **e == Edit::Equal)
            .count();
        assert_eq!(equal, 2700);
        let want: Vec<String> = new.clone();
        assert_eq!(replay(&a, &b), want);
    }

    /// Length of the longest common subsequence, by dynamic programming.
    fn lcs_len(a: &[&str], b: &[&str]) -> usize {
        let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
        for i in 0..a.len() {
            for j in 0..b.len() {
                table[i + 1][j + 1] = if a[i] == b[j] {
                    table[i][j] + 1
                } else {
                    table[i][j + 1].max(table[i + 1][j])
                };
            }
        }
        table[a.len()][b.len()]
    }

    #[test]
    fn test_edit_script_is_shortest() {
        const ALPHABET: [&str; 4] = ["a\n", "b\n", "c\n", "d\n"];
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        for _ in 0..200 {
            let len_a = (next() % 12) as usize;
            let len_b = (next() % 12) as usize;
            let a: Vec<&str> = (0..len_a).map(|_| ALPHABET[(next() % 4) as usize]).collect();
            let b: Vec<&str> = (0..len_b).map(|_| ALPHABET[(next() % 4) as usize]).collect();

            let edits = edit_script(&a, &b);
            let equal = edits.iter().filter(|e| **e == Edit::Equal).count();
            assert_eq!(equal, lcs_len(&a, &b), "a={:?} b={:?}", a, b);
            assert_eq!(edits.len(), a.len() + b.len() - equal);

            let want: Vec<String> = b.iter().map(|s| s.to_string()).collect();
            assert_eq!(replay(&a, &b), want, "a={:?} b={:?}", a, b);
        }
    }
}
