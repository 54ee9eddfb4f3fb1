//! Word tokens of a filename.

/// Shortest token worth matching on.
pub const MIN_TOKEN_CHARS: usize = 3;

/// Alphanumeric runs of at least [`MIN_TOKEN_CHARS`], plus the letter-only and
/// digit-only pieces of mixed runs (`track09live` -> `track09live`, `track`, `live`).
/// Unique, longest first, then alphabetical.
pub fn tokens(name: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for run in name.split(|c: char| !c.is_alphanumeric()) {
        push_token(&mut out, run);
        let has_alpha = run.chars().any(char::is_alphabetic);
        let has_digit = run.chars().any(|c| c.is_numeric());
        if has_alpha && has_digit {
            for piece in split_letters_digits(run) {
                push_token(&mut out, piece);
            }
        }
    }
    out.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });
    out.dedup();
    out
}

fn push_token(out: &mut Vec<String>, token: &str) {
    if token.chars().count() >= MIN_TOKEN_CHARS {
        out.push(token.to_string());
    }
}

/// Break `run` wherever it switches between letters and digits.
fn split_letters_digits(run: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut prev_digit: Option<bool> = None;
    for (i, c) in run.char_indices() {
        let digit = c.is_numeric();
        if prev_digit.is_some_and(|p| p != digit) {
            pieces.push(&run[start..i]);
            start = i;
        }
        prev_digit = Some(digit);
    }
    pieces.push(&run[start..]);
    pieces
}

/// Longest token that occurs in every member of `group`.
pub fn longest_shared_token<S: AsRef<str>>(group: &[S]) -> Option<String> {
    group
        .iter()
        .flat_map(|member| tokens(member.as_ref()))
        .filter(|token| group.iter().all(|member| member.as_ref().contains(token.as_str())))
        .fold(None, |best: Option<String>, token| match best {
            Some(b) if b.chars().count() > token.chars().count()
                || (b.chars().count() == token.chars().count() && b <= token) =>
            {
                Some(b)
            }
            _ => Some(token),
        })
}
