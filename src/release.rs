use chrono::{DateTime, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Layout handed to `helm list --time-format`, written in helm's own notation.
pub const HELM_TIME_FORMAT: &str = "2006-01-02 15:04:05 UTC";

/// The same layout as [`HELM_TIME_FORMAT`] in `chrono` notation. The trailing
/// `UTC` is literal text: helm renders the wall clock of its local zone.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// One entry of `helm list -o json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub name: String,
    pub namespace: String,
    #[serde(deserialize_with = "string_or_number")]
    pub revision: String,
    pub updated: String,
    pub status: String,
    pub chart: String,
    pub app_version: String,
}

impl Release {
    /// The `<namespace>:<name>` string matched by the include/exclude patterns.
    pub fn key(&self) -> String {
        format!("{}:{}", self.namespace, self.name)
    }

    /// Interprets `updated` in the zone `tz`.
    ///
    /// Values carrying their own offset (RFC 3339) keep it; values in
    /// [`TIME_FORMAT`] are read as wall-clock time of `tz`.
    pub fn updated_at<Tz: TimeZone>(&self, tz: &Tz) -> Result<DateTime<Tz>> {
        if let Ok(updated) = DateTime::parse_from_rfc3339(&self.updated) {
            return Ok(updated.with_timezone(tz));
        }
        let naive = NaiveDateTime::parse_from_str(&self.updated, TIME_FORMAT)
            .map_err(|e| self.invalid_timestamp(e.to_string()))?;
        tz.from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| self.invalid_timestamp("no such local time".to_string()))
    }

    fn invalid_timestamp(&self, reason: String) -> Error {
        Error::InvalidTimestamp {
            release: self.key(),
            updated: self.updated.clone(),
            reason,
        }
    }
}

/// Decodes the JSON array printed by `helm list -o json`.
pub fn parse_releases(json: &[u8]) -> Result<Vec<Release>> {
    Ok(serde_json::from_slice(json)?)
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Revision {
        Text(String),
        Number(u64),
    }

    Ok(match Revision::deserialize(deserializer)? {
        Revision::Text(text) => text,
        Revision::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Utc};

    const LIST_OUTPUT: &str = r#"[
        {"name":"web","namespace":"prod","revision":"3","updated":"2024-05-01 10:00:00 UTC",
         "status":"deployed","chart":"nginx-1.2.3","app_version":"1.25.0"},
        {"name":"db","namespace":"prod","revision":7,"updated":"2024-05-02 11:30:00 UTC",
         "status":"failed","chart":"postgresql-12.1.0","app_version":"16.0","extra":true}
    ]"#;

    fn release(updated: &str) -> Release {
        Release {
            name: "web".to_string(),
            namespace: "prod".to_string(),
            revision: "1".to_string(),
            updated: updated.to_string(),
            status: "deployed".to_string(),
            chart: "nginx-1.2.3".to_string(),
            app_version: "1.25.0".to_string(),
        }
    }

    #[test]
    fn decodes_helm_list_output() {
        let releases = parse_releases(LIST_OUTPUT.as_bytes()).unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0], release("2024-05-01 10:00:00 UTC").with_revision("3"));
        assert_eq!(releases[1].revision, "7");
        assert_eq!(releases[1].app_version, "16.0");
        assert_eq!(releases[1].key(), "prod:db");
    }

    #[test]
    fn rejects_missing_fields() {
        let err = parse_releases(br#"[{"name":"web"}]"#).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn rejects_non_array() {
        assert!(parse_releases(b"Error: nothing here").is_err());
    }

    #[test]
    fn reads_layout_in_given_zone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let updated = release("2024-05-01 10:00:00 UTC").updated_at(&tz).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(updated, expected);
    }

    #[test]
    fn keeps_embedded_offset() {
        let updated = release("2024-05-01T10:00:00+02:00").updated_at(&Utc).unwrap();
        assert_eq!(updated.format(TIME_FORMAT).to_string(), "2024-05-01 08:00:00 UTC");
    }

    #[test]
    fn unparsable_timestamp_names_the_release() {
        let err = release("yesterday").updated_at(&Utc).unwrap_err();
        match err {
            Error::InvalidTimestamp { release, updated, .. } => {
                assert_eq!(release, "prod:web");
                assert_eq!(updated, "yesterday");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    impl Release {
        fn with_revision(mut self, revision: &str) -> Self {
            self.revision = revision.to_string();
            self
        }
    }
}
