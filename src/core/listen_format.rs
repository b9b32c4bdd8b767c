use crate::domain::model::ListenRecord;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shape of the records handed to the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// Forward source records untouched.
    #[default]
    Passthrough,
    /// Rewrite each record into a ListenBrainz listen.
    ListenBrainz,
}

impl RecordFormat {
    pub fn apply(self, record: ListenRecord) -> ListenRecord {
        match self {
            RecordFormat::Passthrough => record,
            RecordFormat::ListenBrainz => to_listenbrainz(&record),
        }
    }
}

const SUBMISSION_CLIENT: &str = env!("CARGO_PKG_NAME");
const LASTFM_DATE_FORMAT: &str = "%d %b %Y, %H:%M";

/// Map a `recenttracks` entry onto a ListenBrainz listen. Fields missing
/// from the source are left out, never filled with placeholders.
pub fn to_listenbrainz(record: &ListenRecord) -> ListenRecord {
    let mut metadata = Map::new();
    if let Some(artist) = text_of(record.get("artist")) {
        metadata.insert("artist_name".to_string(), Value::String(artist));
    }
    if let Some(name) = text_of(record.get("name")) {
        metadata.insert("track_name".to_string(), Value::String(name));
    }
    if let Some(album) = text_of(record.get("album")) {
        metadata.insert("release_name".to_string(), Value::String(album));
    }

    let mut info = Map::new();
    info.insert(
        "submission_client".to_string(),
        Value::String(SUBMISSION_CLIENT.to_string()),
    );
    if let Some(mbid) = non_empty_str(record.get("mbid")) {
        info.insert("recording_mbid".to_string(), Value::String(mbid.to_string()));
    }
    if let Some(mbid) = non_empty_str(record.get("artist").and_then(|a| a.get("mbid"))) {
        info.insert(
            "artist_mbids".to_string(),
            Value::Array(vec![Value::String(mbid.to_string())]),
        );
    }
    if let Some(mbid) = non_empty_str(record.get("album").and_then(|a| a.get("mbid"))) {
        info.insert("release_mbid".to_string(), Value::String(mbid.to_string()));
    }
    if let Some(url) = non_empty_str(record.get("url")) {
        info.insert("origin_url".to_string(), Value::String(url.to_string()));
    }
    metadata.insert("additional_info".to_string(), Value::Object(info));

    let mut listen = Map::new();
    if let Some(ts) = listened_at(record) {
        listen.insert("listened_at".to_string(), Value::from(ts));
    }
    listen.insert("track_metadata".to_string(), Value::Object(metadata));

    ListenRecord::new(Value::Object(listen))
}

/// Number of mapped listens that carry no `listened_at`.
///
/// These come from now-playing entries. The destination may refuse a batch
/// containing one.
pub fn undated_count(listens: &[ListenRecord]) -> usize {
    listens
        .iter()
        .filter(|l| l.get("listened_at").is_none())
        .count()
}

/// Unix timestamp of the play. Now-playing entries carry no date.
pub fn listened_at(record: &ListenRecord) -> Option<i64> {
    let date = record.get("date")?;

    match date.get("uts") {
        Some(Value::String(s)) => {
            if let Ok(ts) = s.parse() {
                return Some(ts);
            }
        }
        Some(Value::Number(n)) => {
            if let Some(ts) = n.as_i64() {
                return Some(ts);
            }
        }
        _ => {}
    }

    let text = date.get("#text").and_then(Value::as_str)?;
    NaiveDateTime::parse_from_str(text, LASTFM_DATE_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

// Last.fm sends names either as plain strings or as {"#text": ..} /
// {"name": ..} objects depending on the `extended` flag.
fn text_of(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj
            .get("#text")
            .or_else(|| obj.get("name"))
            .and_then(Value::as_str)?,
        _ => return None,
    };
    (!text.is_empty()).then(|| text.to_string())
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_passthrough_keeps_record() {
        let record = ListenRecord::new(json!({"name": "Airbag", "extra": [1, 2]}));
        assert_eq!(RecordFormat::Passthrough.apply(record.clone()), record);
    }

    #[test]
    fn test_listenbrainz_mapping() {
        let record = ListenRecord::new(json!({
            "name": "Airbag",
            "mbid": "track-mbid",
            "url": "https://www.last.fm/music/Radiohead/_/Airbag",
            "artist": {"mbid": "artist-mbid", "#text": "Radiohead"},
            "album": {"mbid": "", "#text": "OK Computer"},
            "date": {"uts": "1640995200", "#text": "01 Jan 2022, 00:00"}
        }));

        let listen = RecordFormat::ListenBrainz.apply(record);

        assert_eq!(
            listen.data,
            json!({
                "listened_at": 1640995200,
                "track_metadata": {
                    "artist_name": "Radiohead",
                    "track_name": "Airbag",
                    "release_name": "OK Computer",
                    "additional_info": {
                        "submission_client": "scrobble-migrate",
                        "recording_mbid": "track-mbid",
                        "artist_mbids": ["artist-mbid"],
                        "origin_url": "https://www.last.fm/music/Radiohead/_/Airbag"
                    }
                }
            })
        );
    }

    #[test]
    fn test_now_playing_has_no_timestamp() {
        let record = ListenRecord::new(json!({
            "name": "Lucky",
            "artist": {"#text": "Radiohead"},
            "@attr": {"nowplaying": "true"}
        }));

        let listen = to_listenbrainz(&record);

        assert!(listen.get("listened_at").is_none());
        assert_eq!(listen.data["track_metadata"]["track_name"], "Lucky");
        assert!(listen.data["track_metadata"].get("release_name").is_none());
    }

    #[test]
    fn test_album_mbid_becomes_release_mbid() {
        let record = ListenRecord::new(json!({
            "name": "Airbag",
            "mbid": "",
            "album": {"mbid": "release-mbid", "#text": "OK Computer"}
        }));

        let info = &to_listenbrainz(&record).data["track_metadata"]["additional_info"];

        assert_eq!(info["release_mbid"], "release-mbid");
        assert!(info.get("recording_mbid").is_none());
        assert!(info.get("artist_mbids").is_none());
    }

    #[test]
    fn test_undated_count_flags_now_playing() {
        let listens: Vec<_> = [
            json!({"name": "Airbag", "date": {"uts": "1640995200"}}),
            json!({"name": "Lucky", "@attr": {"nowplaying": "true"}}),
        ]
        .into_iter()
        .map(|r| to_listenbrainz(&ListenRecord::new(r)))
        .collect();

        assert_eq!(undated_count(&listens), 1);
    }

    #[test]
    fn test_listened_at_falls_back_to_date_text() {
        let record = ListenRecord::new(json!({"date": {"#text": "01 Jan 2022, 00:00"}}));
        assert_eq!(listened_at(&record), Some(1640995200));

        let record = ListenRecord::new(json!({"date": {"uts": 1640995260}}));
        assert_eq!(listened_at(&record), Some(1640995260));

        let record = ListenRecord::new(json!({"date": {"#text": "yesterday"}}));
        assert_eq!(listened_at(&record), None);
    }

    #[test]
    fn test_extended_artist_name() {
        let record = ListenRecord::new(json!({"artist": {"name": "Portishead"}}));
        let listen = to_listenbrainz(&record);
        assert_eq!(listen.data["track_metadata"]["artist_name"], "Portishead");
    }
}
