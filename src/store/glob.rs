//! Redis-style glob matching
//!
//! Supports `*`, `?`, `[...]` classes with ranges and `^` negation, and `\`
//! escapes, the same syntax `SCAN ... MATCH` accepts.

/// Returns true when `text` matches the glob `pattern`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    match_from(&pattern, &text)
}

fn match_from(p: &[char], t: &[char]) -> bool {
    let (mut pi, mut ti) = (0, 0);

    while pi < p.len() {
        match p[pi] {
            '*' => {
                while pi + 1 < p.len() && p[pi + 1] == '*' {
                    pi += 1;
                }
                if pi + 1 == p.len() {
                    return true;
                }
                return (ti..=t.len()).any(|start| match_from(&p[pi + 1..], &t[start..]));
            }
            '?' => {
                if ti >= t.len() {
                    return false;
                }
                pi += 1;
                ti += 1;
            }
            '[' => {
                if ti >= t.len() {
                    return false;
                }
                let (matched, next) = match_class(p, pi + 1, t[ti]);
                if !matched {
                    return false;
                }
                pi = next;
                ti += 1;
            }
            '\\' if pi + 1 < p.len() => {
                if ti >= t.len() || t[ti] != p[pi + 1] {
                    return false;
                }
                pi += 2;
                ti += 1;
            }
            literal => {
                if ti >= t.len() || t[ti] != literal {
                    return false;
                }
                pi += 1;
                ti += 1;
            }
        }
    }

    ti == t.len()
}

/// Matches `c` against the class starting at `p[i]` (just after `[`).
///
/// Returns the match result and the index following the closing `]`. An
/// unterminated class runs to the end of the pattern.
fn match_class(p: &[char], mut i: usize, c: char) -> (bool, usize) {
    let negate = i < p.len() && p[i] == '^';
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < p.len() {
        match p[i] {
            ']' => {
                i += 1;
                return (matched != negate, i);
            }
            '\\' if i + 1 < p.len() => {
                if p[i + 1] == c {
                    matched = true;
                }
                i += 2;
            }
            start if i + 2 < p.len() && p[i + 1] == '-' && p[i + 2] != ']' => {
                let end = p[i + 2];
                let (low, high) = if start <= end { (start, end) } else { (end, start) };
                if low <= c && c <= high {
                    matched = true;
                }
                i += 3;
            }
            literal => {
                if literal == c {
                    matched = true;
                }
                i += 1;
            }
        }
    }

    (matched != negate, i)
}
