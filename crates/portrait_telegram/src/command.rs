//! Splitting incoming text into commands and free text

/// What an incoming text message asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`, with the first argument if any
    Start(Option<String>),
    /// `/status`
    Status,
    /// Any other command; never routed to the interview
    Unknown(String),
    /// Not a command
    Text(String),
}

/// Parse a message text, accepting the `/command@botname` form
pub fn parse_command(text: &str) -> Command {
    let Some(rest) = text.strip_prefix('/') else {
        return Command::Text(text.to_string());
    };

    let mut parts = rest.split_whitespace();
    let head = parts.next().unwrap_or_default();
    let name = head.split_once('@').map_or(head, |(name, _bot)| name);

    match name {
        "start" => Command::Start(parts.next().map(String::from)),
        "status" => Command::Status,
        other => Command::Unknown(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_with_and_without_argument() {
        assert_eq!(parse_command("/start"), Command::Start(None));
        assert_eq!(
            parse_command("/start ref_42"),
            Command::Start(Some("ref_42".to_string()))
        );
        assert_eq!(
            parse_command("/start@yaznayu_bot ref_42 extra"),
            Command::Start(Some("ref_42".to_string()))
        );
    }

    #[test]
    fn status_and_unknown() {
        assert_eq!(parse_command("/status"), Command::Status);
        assert_eq!(parse_command("/status@yaznayu_bot"), Command::Status);
        assert_eq!(parse_command("/help"), Command::Unknown("help".to_string()));
        assert_eq!(parse_command("/"), Command::Unknown(String::new()));
    }

    #[test]
    fn free_text_is_kept_verbatim() {
        assert_eq!(
            parse_command("  Горная река  "),
            Command::Text("  Горная река  ".to_string())
        );
        assert_eq!(parse_command("В танце /start"), Command::Text("В танце /start".to_string()));
    }
}
