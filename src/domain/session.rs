// Cook session domain model
use chrono::{DateTime, Utc};

/// A bounded cooking/monitoring period tied to one device.
///
/// Activity is derived from `end_time` so a session can never be both ended
/// and active.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub device_id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Channels that were active on the device when the session started.
    pub channel_ids: Vec<String>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// The chartable span of the session: `[start_time, end_time]`, with an
    /// open session running up to `now`.
    pub fn span(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start_time, self.end_time.unwrap_or(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(end_time: Option<DateTime<Utc>>) -> Session {
        Session {
            id: "s1".to_string(),
            device_id: "d1".to_string(),
            title: "Brisket".to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 7, 4, 8, 0, 0).unwrap(),
            end_time,
            notes: None,
            channel_ids: vec!["c1".to_string()],
        }
    }

    #[test]
    fn test_active_iff_open_ended() {
        assert!(session(None).is_active());

        let ended = session(Some(Utc.with_ymd_and_hms(2024, 7, 4, 20, 0, 0).unwrap()));
        assert!(!ended.is_active());
    }

    #[test]
    fn test_span_of_open_session_ends_now() {
        let now = Utc.with_ymd_and_hms(2024, 7, 4, 12, 0, 0).unwrap();
        let (start, end) = session(None).span(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 7, 4, 8, 0, 0).unwrap());
        assert_eq!(end, now);

        let closed_at = Utc.with_ymd_and_hms(2024, 7, 4, 10, 0, 0).unwrap();
        let (_, end) = session(Some(closed_at)).span(now);
        assert_eq!(end, closed_at);
    }
}
