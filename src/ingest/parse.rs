use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::{MatchSummary, PlayerIdentity, RatingHistoryEntry};

/// String field, tolerating absent / null / wrong-typed values.
fn field_str(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|x| x.as_str()).map(|s| s.to_string())
}

/// Integer field, tolerating numbers encoded as strings (the provider mixes both).
fn field_i64(v: &Value, key: &str) -> Option<i64> {
    v.get(key)
        .and_then(|x| x.as_i64().or_else(|| x.as_str().and_then(|s| s.parse().ok())))
}

fn field_u32(v: &Value, key: &str) -> u32 {
    field_i64(v, key).and_then(|n| u32::try_from(n).ok()).unwrap_or(0)
}

fn epoch_to_utc(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

pub fn parse_account(v: &Value) -> Option<PlayerIdentity> {
    Some(PlayerIdentity {
        name: field_str(v, "name")?,
        tag: field_str(v, "tag")?,
        puuid: field_str(v, "puuid")?,
        region: field_str(v, "region").unwrap_or_default(),
    })
}

/// Match ids from one stored-matches index page, newest first as served.
pub fn parse_match_index_page(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e.get("meta").and_then(|m| field_str(m, "id")))
                .collect()
        })
        .unwrap_or_default()
}

/// Builds the tracked player's summary out of a full match record.
/// Returns None when the record is structurally unusable or the player
/// does not appear in it.
pub fn parse_match_summary(v: &Value, puuid: &str) -> Option<MatchSummary> {
    let meta = v.get("metadata")?;
    let match_id = field_str(meta, "matchid")?;

    let players = v.get("players")?.get("all_players")?.as_array()?;
    let me = players
        .iter()
        .find(|p| p.get("puuid").and_then(|x| x.as_str()) == Some(puuid))?;

    let team_key = field_str(me, "team")?.to_lowercase();
    let team = v.get("teams")?.get(&team_key)?;
    let won = team.get("has_won").and_then(|x| x.as_bool()).unwrap_or(false);
    let rounds_played = field_u32(team, "rounds_won") + field_u32(team, "rounds_lost");

    let stats = me.get("stats")?;

    Some(MatchSummary {
        match_id,
        map: field_str(meta, "map").unwrap_or_default(),
        mode: field_str(meta, "mode").unwrap_or_default(),
        agent: field_str(me, "character").unwrap_or_default(),
        game_start: epoch_to_utc(field_i64(meta, "game_start")?),
        game_length_secs: field_i64(meta, "game_length").unwrap_or(0),
        kills: field_u32(stats, "kills"),
        deaths: field_u32(stats, "deaths"),
        assists: field_u32(stats, "assists"),
        score: field_u32(stats, "score"),
        damage_made: field_u32(me, "damage_made"),
        rounds_played,
        won,
        // Joined later from the ranking history, when an entry exists.
        rating_delta: None,
    })
}

pub fn parse_rating_entry(v: &Value) -> Option<RatingHistoryEntry> {
    Some(RatingHistoryEntry {
        match_id: field_str(v, "match_id")?,
        delta: field_i64(v, "mmr_change_to_last_game").unwrap_or(0) as i32,
        rating_after: field_i64(v, "elo").unwrap_or(0) as i32,
        tier: field_i64(v, "currenttier").unwrap_or(0) as i32,
        timestamp: epoch_to_utc(field_i64(v, "date_raw").unwrap_or(0)),
    })
}

pub fn parse_rating_history(v: &Value) -> Vec<RatingHistoryEntry> {
    v.as_array()
        .map(|entries| entries.iter().filter_map(parse_rating_entry).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn match_payload() -> Value {
        json!({
            "metadata": {
                "matchid": "m-1",
                "map": "Ascent",
                "mode": "Competitive",
                "game_start": 1_700_000_000,
                "game_length": 2400,
            },
            "players": {
                "all_players": [
                    {
                        "puuid": "other",
                        "team": "Blue",
                        "character": "Sova",
                        "stats": {"score": 100, "kills": 4, "deaths": 12, "assists": 1},
                        "damage_made": 900,
                    },
                    {
                        "puuid": "me",
                        "team": "Red",
                        "character": "Jett",
                        "stats": {"score": 4200, "kills": 21, "deaths": 14, "assists": 7},
                        "damage_made": 3550,
                    },
                ],
            },
            "teams": {
                "red": {"has_won": true, "rounds_won": 13, "rounds_lost": 9},
                "blue": {"has_won": false, "rounds_won": 9, "rounds_lost": 13},
            },
        })
    }

    #[test]
    fn parses_tracked_player_from_match_record() {
        let m = parse_match_summary(&match_payload(), "me").unwrap();
        assert_eq!(m.match_id, "m-1");
        assert_eq!(m.map, "Ascent");
        assert_eq!(m.agent, "Jett");
        assert_eq!(m.kills, 21);
        assert_eq!(m.deaths, 14);
        assert_eq!(m.assists, 7);
        assert_eq!(m.damage_made, 3550);
        assert_eq!(m.rounds_played, 22);
        assert!(m.won);
        assert_eq!(m.game_start.timestamp(), 1_700_000_000);
        assert_eq!(m.rating_delta, None);
    }

    #[test]
    fn missing_player_yields_none() {
        assert!(parse_match_summary(&match_payload(), "nobody").is_none());
    }

    #[test]
    fn numeric_strings_are_tolerated() {
        let mut payload = match_payload();
        payload["metadata"]["game_length"] = json!("2400");
        let m = parse_match_summary(&payload, "me").unwrap();
        assert_eq!(m.game_length_secs, 2400);
    }

    #[test]
    fn parses_index_page_ids() {
        let page = json!([
            {"meta": {"id": "a"}},
            {"meta": {"id": "b"}},
            {"stats": {}},
        ]);
        assert_eq!(parse_match_index_page(&page), vec!["a", "b"]);
    }

    #[test]
    fn parses_rating_entries() {
        let entries = parse_rating_history(&json!([
            {"match_id": "a", "mmr_change_to_last_game": 17, "elo": 1234,
             "currenttier": 15, "date_raw": 1_700_000_000},
            {"no_match_id": true},
        ]));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].match_id, "a");
        assert_eq!(entries[0].delta, 17);
        assert_eq!(entries[0].rating_after, 1234);
    }
}
