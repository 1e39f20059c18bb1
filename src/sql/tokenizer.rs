use std::collections::VecDeque;

/// Splits a statement into whitespace-separated tokens.
///
/// The grammar has no quoting or nesting, so token boundaries are plain
/// whitespace runs; leading and trailing whitespace is ignored.
pub fn tokenize(input: &str) -> VecDeque<String> {
    input.split_whitespace().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_on_whitespace() {
        let tokens: Vec<String> = tokenize("insert  1\tuser1   u1@example.com ").into();
        assert_eq!(tokens, ["insert", "1", "user1", "u1@example.com"]);
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(tokenize("   ").is_empty());
    }
}
