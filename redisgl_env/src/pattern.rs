//! Redis-style glob patterns for key scans.
//!
//! Supported syntax: `*` (any run), `?` (any single char), `[abc]`, `[a-z]`,
//! `[^a]` / `[!a]` character classes, and `\` to escape the next char.

const META: [char; 5] = ['*', '?', '[', ']', '\\'];

/// Escapes every glob metacharacter in `literal`.
///
/// `escape_glob(prefix) + "*"` matches exactly the keys starting with
/// `prefix`, whatever characters the prefix contains.
pub fn escape_glob(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if META.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Returns the literal prefix of `pattern` up to its first wildcard.
///
/// Backends with ordered keys use this to narrow a scan before matching.
pub fn literal_prefix(pattern: &str) -> String {
    let mut out = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' | '?' | '[' => break,
            '\\' => match chars.next() {
                Some(next) => out.push(next),
                None => break,
            },
            _ => out.push(c),
        }
    }
    out
}

/// Matches `text` against a glob `pattern`, anchored at both ends.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    match_from(&pattern, &text)
}

fn match_from(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    // Backtrack point for the most recent `*`: (pattern index after it, text index)
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    star = Some((p + 1, t));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    t += 1;
                    continue;
                }
                '[' => {
                    if let Some((matched, next_p)) = match_class(pattern, p, text[t]) {
                        if matched {
                            p = next_p;
                            t += 1;
                            continue;
                        }
                    }
                }
                '\\' if p + 1 < pattern.len() => {
                    if pattern[p + 1] == text[t] {
                        p += 2;
                        t += 1;
                        continue;
                    }
                }
                c => {
                    if c == text[t] {
                        p += 1;
                        t += 1;
                        continue;
                    }
                }
            }
        }
        match star {
            Some((star_p, star_t)) => {
                p = star_p;
                t = star_t + 1;
                star = Some((star_p, star_t + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Evaluates the class starting at `pattern[start] == '['` against `c`.
///
/// Returns whether it matched and the pattern index after the class, or
/// `None` for an unterminated class.
fn match_class(pattern: &[char], start: usize, c: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negate = matches!(pattern.get(i), Some('^') | Some('!'));
    if negate {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    loop {
        let current = *pattern.get(i)?;
        if current == ']' && !first {
            break;
        }
        first = false;

        let lo = if current == '\\' {
            i += 1;
            *pattern.get(i)?
        } else {
            current
        };

        if pattern.get(i + 1) == Some(&'-') && pattern.get(i + 2).is_some_and(|&h| h != ']') {
            let hi = pattern[i + 2];
            if lo <= c && c <= hi {
                matched = true;
            }
            i += 3;
        } else {
            if lo == c {
                matched = true;
            }
            i += 1;
        }
    }

    Some((matched != negate, i + 1))
}
