use super::ErrorCode;

/// One parsed line from a client. Keywords are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientToServer {
    // Session actions
    Nick { nickname: String },
    Create,
    List,
    Join { room_id: String },
    Quit,

    // Forwarded to the client's room
    Room(RoomCommand),
}

/// Commands that only make sense inside a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCommand {
    Ready,
    Uno,
    Hand,
    Draw,
    /// Raw card tokens; the room resolves them against the hand.
    Play { color: String, value: String },
    Wild { value: String, chosen: String },
}

impl ClientToServer {
    pub fn parse(line: &str) -> Result<Self, ErrorCode> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(keyword) = parts.first() else {
            return Err(ErrorCode::UnknownCommand);
        };
        let keyword = keyword.to_ascii_lowercase();
        let upper = |s: &str| s.to_ascii_uppercase();

        match (keyword.as_str(), parts.len()) {
            ("nick", 2) => {
                let nickname = parts[1];
                if nickname.contains([';', ',']) {
                    return Err(ErrorCode::InvalidNick);
                }
                Ok(Self::Nick {
                    nickname: nickname.to_string(),
                })
            }
            ("create", _) => Ok(Self::Create),
            ("list", _) => Ok(Self::List),
            ("join", 2) => Ok(Self::Join {
                room_id: parts[1].to_string(),
            }),
            ("quit" | "exit", _) => Ok(Self::Quit),
            ("ok", 1) => Ok(Self::Room(RoomCommand::Ready)),
            ("uno", 1) => Ok(Self::Room(RoomCommand::Uno)),
            ("hand", 1) => Ok(Self::Room(RoomCommand::Hand)),
            ("draw", 1) => Ok(Self::Room(RoomCommand::Draw)),
            ("play", 3) if parts[1].eq_ignore_ascii_case("wild") => Err(ErrorCode::WildUsage),
            ("play", 3) => Ok(Self::Room(RoomCommand::Play {
                color: upper(parts[1]),
                value: upper(parts[2]),
            })),
            ("play", _) => Err(ErrorCode::PlayUsage),
            ("wild", 3) => Ok(Self::Room(RoomCommand::Wild {
                value: upper(parts[1]),
                chosen: upper(parts[2]),
            })),
            ("wild", _) => Err(ErrorCode::WildUsage),
            _ => Err(ErrorCode::UnknownCommand),
        }
    }

    /// Keyword of a raw line, lowercased.
    pub fn keyword(line: &str) -> Option<String> {
        line.split_whitespace().next().map(str::to_ascii_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("nick alice", ClientToServer::Nick { nickname: "alice".into() })]
    #[case("CREATE", ClientToServer::Create)]
    #[case("join 12", ClientToServer::Join { room_id: "12".into() })]
    #[case("exit", ClientToServer::Quit)]
    #[case("ok", ClientToServer::Room(RoomCommand::Ready))]
    #[case("Uno", ClientToServer::Room(RoomCommand::Uno))]
    #[case("play red 5", ClientToServer::Room(RoomCommand::Play { color: "RED".into(), value: "5".into() }))]
    #[case("wild draw4 blue", ClientToServer::Room(RoomCommand::Wild { value: "DRAW4".into(), chosen: "BLUE".into() }))]
    fn parses_commands(#[case] line: &str, #[case] expected: ClientToServer) {
        assert_eq!(ClientToServer::parse(line), Ok(expected));
    }

    #[rstest]
    #[case("play red", ErrorCode::PlayUsage)]
    #[case("play wild draw4", ErrorCode::WildUsage)]
    #[case("wild color", ErrorCode::WildUsage)]
    #[case("nick", ErrorCode::UnknownCommand)]
    #[case("nick a;b", ErrorCode::InvalidNick)]
    #[case("join", ErrorCode::UnknownCommand)]
    #[case("ok now", ErrorCode::UnknownCommand)]
    #[case("shuffle", ErrorCode::UnknownCommand)]
    fn rejects_malformed_commands(#[case] line: &str, #[case] expected: ErrorCode) {
        assert_eq!(ClientToServer::parse(line), Err(expected));
    }

    #[test]
    fn keyword_is_lowercased() {
        assert_eq!(ClientToServer::keyword("  NICK bob"), Some("nick".to_string()));
        assert_eq!(ClientToServer::keyword("   "), None);
    }
}
