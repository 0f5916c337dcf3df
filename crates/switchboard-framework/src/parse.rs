//! Prefix detection and tokenization of message bodies.

/// A command invocation extracted from a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// The command name as typed.
    pub name: &'a str,
    /// Remaining whitespace-separated tokens.
    pub args: Vec<&'a str>,
}

/// Parses `body` as `<prefix><name> [args...]`.
///
/// Returns `None` when the body does not start with `prefix` or nothing
/// follows it; such a message is not a command at all.
pub fn parse<'a>(prefix: &str, body: &'a str) -> Option<Invocation<'a>> {
    let rest = body.strip_prefix(prefix)?;
    let mut tokens = rest.split_whitespace();
    let name = tokens.next()?;
    Some(Invocation {
        name,
        args: tokens.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_with_arguments() {
        assert_eq!(
            parse("!", "!toxic alice 5"),
            Some(Invocation {
                name: "toxic",
                args: vec!["alice", "5"],
            })
        );
    }

    #[test]
    fn test_extra_whitespace_is_collapsed() {
        let invocation = parse("!", "!wiki   rust \t lang ").unwrap();
        assert_eq!(invocation.name, "wiki");
        assert_eq!(invocation.args, vec!["rust", "lang"]);
    }

    #[test]
    fn test_case_is_preserved() {
        assert_eq!(parse("!", "!Help").unwrap().name, "Help");
    }

    #[test]
    fn test_no_prefix_is_not_a_command() {
        assert_eq!(parse("!", "hello"), None);
        assert_eq!(parse("!", " !help"), None);
    }

    #[test]
    fn test_bare_prefix_is_not_a_command() {
        assert_eq!(parse("!", "!"), None);
        assert_eq!(parse("!", "!   "), None);
    }

    #[test]
    fn test_multi_character_prefix() {
        assert_eq!(parse("0x", "0xping").unwrap().name, "ping");
    }
}
