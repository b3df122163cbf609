/// One line of interview input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Submit the line as a typed answer.
    Say(String),
    /// Start push-to-talk; the next Enter stops and submits.
    Voice,
    End,
    Transcript,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ReplCommand::Say(line.to_string());
        };
        match command.to_ascii_lowercase().as_str() {
            "voice" | "v" => ReplCommand::Voice,
            "end" => ReplCommand::End,
            "transcript" | "t" => ReplCommand::Transcript,
            "help" | "h" | "?" => ReplCommand::Help,
            "quit" | "q" | "exit" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        }
    }
}

pub const HELP: &str = "\
Type an answer and press Enter to send it.
  /voice       record an answer, press Enter again to stop and send
  /end         finish the interview and get your report
  /transcript  show the conversation so far
  /quit        leave without a report";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines_are_answers() {
        assert_eq!(
            ReplCommand::parse("  I led the migration  "),
            ReplCommand::Say("I led the migration".into())
        );
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(ReplCommand::parse("/voice"), ReplCommand::Voice);
        assert_eq!(ReplCommand::parse("/END"), ReplCommand::End);
        assert_eq!(ReplCommand::parse("/t"), ReplCommand::Transcript);
        assert_eq!(ReplCommand::parse("/q"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Empty);
        assert_eq!(
            ReplCommand::parse("/dance"),
            ReplCommand::Unknown("/dance".into())
        );
    }
}
