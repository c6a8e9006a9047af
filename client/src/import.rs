use std::path::Path;

use types::{LeaderboardEntry, RoundId};

use crate::{error::ClientError, wire::BatchItem};

/// Parses a file holding one leaderboard API response per line.
///
/// Lines that are not JSON, or whose first item carries no leaderboard, are
/// skipped with a warning. Entries without a round id get
/// `base_round_id + response_index + item_index`, counting accepted
/// responses only.
pub fn parse_leaderboard_responses(contents: &str, base_round_id: RoundId) -> Vec<LeaderboardEntry> {
    let mut entries = Vec::new();
    let mut response_index: RoundId = 0;

    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let items: Vec<BatchItem> = match serde_json::from_str(line) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "Skipping unparseable line");
                continue;
            }
        };
        if !items.first().is_some_and(BatchItem::has_leaderboard) {
            tracing::warn!(line = line_no + 1, "Skipping line without leaderboard data");
            continue;
        }

        for (item_index, item) in items.into_iter().enumerate() {
            let default_round = base_round_id + response_index + item_index as RoundId;
            if let Some(board) = item.into_leaderboard() {
                tracing::info!(
                    response = response_index + 1,
                    round_id = default_round,
                    players = board.len(),
                    "Imported leaderboard"
                );
                entries.extend(board.into_iter().filter_map(|e| e.into_entry(default_round)));
            }
        }
        response_index += 1;
    }

    entries
}

pub async fn read_leaderboard_file(
    path: &Path,
    base_round_id: RoundId,
) -> Result<Vec<LeaderboardEntry>, ClientError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ClientError::Io {
            path: path.display().to_string(),
            source,
        })?;
    Ok(parse_leaderboard_responses(&contents, base_round_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigns_sequential_round_ids() {
        let contents = r#"
[{"result":{"data":{"leaderboard":[{"username":"alice","points":10,"position":1,"play":[{"cardId":1}]}]}}}]
this line is garbage
[{"result":{"data":{"leaderboard":[{"username":"bob","points":5,"position":2}]}}},{"result":{"data":{"leaderboard":[{"username":"Seal"},{"username":"carol"}]}}}]
"#;
        let entries = parse_leaderboard_responses(contents, 355);
        let rounds: Vec<(String, Option<RoundId>)> = entries
            .iter()
            .map(|e| (e.username.clone(), e.round_id))
            .collect();
        assert_eq!(
            rounds,
            vec![
                ("alice".to_string(), Some(355)),
                ("bob".to_string(), Some(356)),
                ("carol".to_string(), Some(357)),
            ]
        );
    }

    #[test]
    fn test_skips_responses_without_leaderboard() {
        let contents = r#"[{"result":{"data":{"latestPlays":[]}}}]"#;
        assert!(parse_leaderboard_responses(contents, 355).is_empty());
    }
}
