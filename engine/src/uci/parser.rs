use crate::{EngineInfo, Score};
use chess::parse_uci_move;
use cozy_chess::Move;

/// Incoming message from UCI engine
#[derive(Debug, Clone)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for `bestmove (none)`, sent when there is no legal move.
    /// Moves are in standard UCI notation (castling as e1g1).
    BestMove { mv: Option<Move>, ponder: Option<Move> },
    Info(EngineInfo),
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, crate::UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(crate::UciError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"bestmove") => {
            let Some(&best) = tokens.get(1) else {
                return Err(crate::UciError::MalformedMessage(line.to_string()));
            };
            let mv = match best {
                "(none)" | "0000" => None,
                text => Some(parse_uci_move(text)?),
            };
            let ponder = match (tokens.get(2), tokens.get(3)) {
                (Some(&"ponder"), Some(text)) => parse_uci_move(text).ok(),
                _ => None,
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..]))),

        _ => Err(crate::UciError::UnknownMessage(line.to_string())),
    }
}

/// Parse the fields of an `info` line after the `info` token. Fields that
/// are not needed are skipped; `string` takes the rest of the line.
fn parse_info_line(tokens: &[&str]) -> EngineInfo {
    let mut info = EngineInfo::default();
    let mut tokens = tokens.iter().copied().peekable();

    while let Some(token) = tokens.next() {
        match token {
            "depth" => info.depth = tokens.next().and_then(|s| s.parse().ok()),
            "multipv" => info.multipv = tokens.next().and_then(|s| s.parse().ok()),
            "nodes" => info.nodes = tokens.next().and_then(|s| s.parse().ok()),
            "score" => {
                let kind = tokens.next();
                let value = tokens.next().and_then(|s| s.parse().ok());
                info.score = match (kind, value) {
                    (Some("cp"), Some(cp)) => Some(Score::Centipawns(cp)),
                    (Some("mate"), Some(moves)) => Some(Score::Mate(moves)),
                    _ => None,
                };
            }
            "pv" => {
                while let Some(text) = tokens.next_if(|t| !is_keyword(t)) {
                    if let Ok(mv) = parse_uci_move(text) {
                        info.pv.push(mv);
                    }
                }
            }
            "string" => break,
            _ => {}
        }
    }

    info
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
    )
}
