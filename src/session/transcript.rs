//! Transcript export — the conversation as a JSON array of turns.

use std::path::Path;

use crate::error::Result;
use crate::interview::model::Turn;

/// Serialize turns as pretty JSON (`role`, `content`, `is_final_or_follow_up`).
pub fn export_transcript(turns: &[Turn]) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(turns)
}

/// Write an exported transcript to `path`, replacing any existing file.
pub async fn save_transcript(path: &Path, json: &str) -> Result<()> {
    tokio::fs::write(path, json).await?;
    tracing::info!(path = %path.display(), bytes = json.len(), "Transcript saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_preserves_order_and_fields() {
        let turns = vec![
            Turn::assistant("Is the company profitable?"),
            Turn::user("Yes"),
            Turn::response("Keep expanding."),
        ];
        let json = export_transcript(&turns).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0]["role"], "assistant");
        assert_eq!(parsed[1]["content"], "Yes");
        assert!(parsed[1].get("is_final_or_follow_up").is_none());
        assert_eq!(parsed[2]["is_final_or_follow_up"], true);

        let back: Vec<Turn> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turns);
    }

    #[tokio::test]
    async fn save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_history.json");
        let json = export_transcript(&[Turn::user("hello")]).unwrap();
        save_transcript(&path, &json).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.contains("\"hello\""));
    }
}
