/// Sanitizes a username into the `[A-Za-z0-9_.-]` charset used for journal
/// file names, replacing every other character with `_`.
pub fn sanitize_username(username: &str) -> String {
    username
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("alice", "alice"; "already clean")]
    #[test_case("alice smith", "alice_smith"; "space becomes underscore")]
    #[test_case("../../etc/passwd", ".._.._etc_passwd"; "path traversal characters are stripped")]
    #[test_case("佐藤太郎", "____"; "non ascii falls back to underscores")]
    fn sanitizes(input: &str, expected: &str) {
        assert_eq!(sanitize_username(input), expected);
    }
}
