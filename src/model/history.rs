//! History ordering: derive a sortable timestamp from a frame's date/time
//! strings and sort an entity's detection history ascending.
//!
//! Timestamps are an opaque, locally-comparable pair — no timezone handling.
//! A frame whose date/time fails to parse sorts as oldest instead of erroring
//! so one bad record cannot break the ordering of a whole history.

use chrono::NaiveDateTime;

use super::types::Frame;

/// Wire formats used by the catalog server.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse `"{date} {time}"` into a comparable timestamp.
/// Returns `None` for malformed input (which orders before any real time).
pub fn frame_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), DATETIME_FORMAT).ok()
}

/// Sort key for a frame. `Option` ordering puts unparseable frames first.
pub fn sort_key(frame: &Frame) -> Option<NaiveDateTime> {
    frame_timestamp(&frame.date, &frame.time)
}

/// Sort a history ascending by timestamp. Stable, so same-timestamp frames
/// keep their arrival order.
pub fn sort_history(history: &mut [Frame]) {
    history.sort_by_key(sort_key);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(date: &str, time: &str, image: &str) -> Frame {
        Frame {
            date: date.into(),
            time: time.into(),
            image: image.into(),
            region: None,
            confidence: None,
        }
    }

    #[test]
    fn parses_server_format() {
        let ts = frame_timestamp("2024-01-02", "09:30:05").expect("valid");
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-02 09:30:05");
    }

    #[test]
    fn malformed_input_is_none() {
        assert!(frame_timestamp("not-a-date", "10:00:00").is_none());
        assert!(frame_timestamp("2024-01-01", "sometime").is_none());
        assert!(frame_timestamp("", "").is_none());
    }

    #[test]
    fn sorts_ascending_across_dates_and_times() {
        let mut history = vec![
            frame("2024-01-02", "08:00:00", "c"),
            frame("2024-01-01", "23:59:59", "b"),
            frame("2024-01-01", "10:00:00", "a"),
        ];
        sort_history(&mut history);
        let order: Vec<&str> = history.iter().map(|f| f.image.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn unparseable_sorts_oldest() {
        let mut history = vec![
            frame("2024-01-01", "10:00:00", "good"),
            frame("garbage", "??", "bad"),
        ];
        sort_history(&mut history);
        assert_eq!(history[0].image, "bad");
        assert_eq!(history[1].image, "good");
    }

    #[test]
    fn ties_keep_arrival_order() {
        let mut history = vec![
            frame("2024-01-01", "10:00:00", "first"),
            frame("2024-01-01", "10:00:00", "second"),
            frame("2024-01-01", "10:00:00", "third"),
        ];
        sort_history(&mut history);
        let order: Vec<&str> = history.iter().map(|f| f.image.as_str()).collect();
        assert_eq!(order, ["first", "second", "third"]);
    }
}
