//! JSON import and export of insight collections.
//!
//! The file format is a JSON array of insight records in the same camelCase
//! shape the store uses. Only `id` and `content` are required on import;
//! everything else is filled in. Timestamps may be RFC 3339 strings or
//! epoch milliseconds, and ids may be strings or numbers.
//!
//! Import is all-or-nothing: the whole file is validated before anything
//! is returned.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::core::{
    ExerciseAttempt, ExerciseKind, Insight, ReviewAction, ReviewEvent, MAX_STAGE,
};
use crate::error::{Result, SproutError};
use crate::scheduler;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Millis(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInsight {
    id: Option<RawId>,
    content: Option<String>,
    note: Option<String>,
    source: Option<String>,
    tags: Option<Vec<String>>,
    timestamp: Option<RawTime>,
    review_stage: Option<u64>,
    next_review: Option<RawTime>,
    is_mastered: Option<bool>,
    review_history: Option<Vec<RawReviewEvent>>,
    exercise_history: Option<Vec<RawExerciseAttempt>>,
    last_exercise_date: Option<RawTime>,
}

#[derive(Deserialize)]
struct RawReviewEvent {
    timestamp: RawTime,
    action: ReviewAction,
}

#[derive(Deserialize)]
struct RawExerciseAttempt {
    timestamp: RawTime,
    #[serde(rename = "type")]
    kind: ExerciseKind,
    correct: bool,
}

/// Parse and validate an exported collection.
///
/// `now` stands in for missing creation timestamps.
pub fn parse_collection(text: &str, now: DateTime<Utc>) -> Result<Vec<Insight>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| SproutError::import(format!("not valid JSON: {}", e)))?;
    parse_value(value, now)
}

/// Validate an already-decoded collection.
///
/// Stored and remotely synced values go through the same checks as an
/// imported file.
pub fn parse_value(value: Value, now: DateTime<Utc>) -> Result<Vec<Insight>> {
    let Value::Array(records) = value else {
        return Err(SproutError::import("expected a JSON array of insights"));
    };

    let mut seen = HashSet::new();
    let mut insights = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let position = index + 1;
        if !record.is_object() {
            return Err(SproutError::import(format!(
                "record {} is not an object",
                position
            )));
        }
        let raw: RawInsight = serde_json::from_value(record)
            .map_err(|e| SproutError::import(format!("record {}: {}", position, e)))?;
        let insight = into_insight(raw, now)
            .map_err(|message| SproutError::import(format!("record {}: {}", position, message)))?;

        if !seen.insert(insight.id.clone()) {
            return Err(SproutError::import(format!(
                "record {}: duplicate id '{}'",
                position, insight.id
            )));
        }
        insights.push(insight);
    }

    Ok(insights)
}

/// Serialize a collection for export.
pub fn export_json(insights: &[Insight]) -> Result<String> {
    Ok(serde_json::to_string_pretty(insights)?)
}

fn into_insight(raw: RawInsight, now: DateTime<Utc>) -> std::result::Result<Insight, String> {
    let id = match raw.id {
        Some(RawId::Text(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(RawId::Number(n)) => n.to_string(),
        _ => return Err("missing `id`".to_string()),
    };

    let content = raw
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| "missing `content`".to_string())?;

    let timestamp = match raw.timestamp {
        Some(t) => to_datetime(t, "timestamp")?,
        None => now,
    };

    let review_stage = raw
        .review_stage
        .map_or(0, |s| s.min(u64::from(MAX_STAGE)) as u8);

    let next_review = match raw.next_review {
        Some(t) => to_datetime(t, "nextReview")?,
        None => scheduler::next_review_from(review_stage, timestamp),
    };

    let mut review_history = vec![ReviewEvent::new(ReviewAction::Created, timestamp)];
    for (i, event) in raw.review_history.unwrap_or_default().into_iter().enumerate() {
        let at = to_datetime(event.timestamp, "reviewHistory.timestamp")?;
        match event.action {
            // The leading creation event replaces the synthesized one
            ReviewAction::Created if i == 0 => review_history[0].timestamp = at,
            ReviewAction::Created => {}
            action => review_history.push(ReviewEvent::new(action, at)),
        }
    }

    let mut exercise_history = Vec::new();
    for attempt in raw.exercise_history.unwrap_or_default() {
        let at = to_datetime(attempt.timestamp, "exerciseHistory.timestamp")?;
        exercise_history.push(ExerciseAttempt::new(attempt.kind, attempt.correct, at));
    }

    let last_exercise_date = raw
        .last_exercise_date
        .map(|t| to_datetime(t, "lastExerciseDate"))
        .transpose()?;

    Ok(Insight {
        id,
        content,
        note: raw.note.filter(|n| !n.trim().is_empty()),
        source: raw.source.filter(|s| !s.trim().is_empty()),
        tags: raw.tags.unwrap_or_default(),
        timestamp,
        review_stage,
        next_review,
        is_mastered: raw.is_mastered.unwrap_or(false),
        review_history,
        exercise_history,
        last_exercise_date,
    })
}

fn to_datetime(raw: RawTime, field: &str) -> std::result::Result<DateTime<Utc>, String> {
    match raw {
        RawTime::Millis(ms) => DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| format!("`{}` out of range: {}", field, ms)),
        RawTime::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| format!("`{}` is not a valid timestamp ('{}'): {}", field, s, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InsightDraft;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_minimal_records_get_defaults() {
        let insights = parse_collection(
            r#"[{"id": "a1", "content": "Minimal but valid"}, {"id": 42, "content": "Numeric id works"}]"#,
            now(),
        )
        .unwrap();

        assert_eq!(insights.len(), 2);
        let first = &insights[0];
        assert_eq!(first.id, "a1");
        assert_eq!(first.timestamp, now());
        assert_eq!(first.review_stage, 0);
        assert_eq!(first.next_review, now() + Duration::days(1));
        assert!(!first.is_mastered);
        assert_eq!(first.review_history.len(), 1);
        assert_eq!(first.review_history[0].action, ReviewAction::Created);
        assert_eq!(insights[1].id, "42");
    }

    #[test]
    fn test_missing_content_fails_whole_import() {
        let text = r#"[
            {"id": "1", "content": "A perfectly good insight"},
            {"id": "2"},
            {"id": "3", "content": "Another good one"}
        ]"#;

        let err = parse_collection(text, now()).unwrap_err();

        assert!(matches!(err, SproutError::Import { .. }));
        assert!(err.to_string().contains("record 2"));
        assert!(err.to_string().contains("content"));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        for text in [
            "not json",
            r#"{"id": "1", "content": "object not array"}"#,
            r#"["just a string"]"#,
            r#"[{"content": "no id here"}]"#,
            r#"[{"id": "", "content": "empty id"}]"#,
            r#"[{"id": "1", "content": "   "}]"#,
            r#"[{"id": "1", "content": "bad time", "timestamp": "yesterday"}]"#,
            r#"[{"id": "1", "content": "bad stage", "reviewStage": -1}]"#,
            r#"[{"id": "1", "content": "bad action", "reviewHistory": [{"timestamp": 0, "action": "deleted"}]}]"#,
        ] {
            let err = parse_collection(text, now()).unwrap_err();
            assert!(matches!(err, SproutError::Import { .. }), "{}", text);
        }
    }

    #[test]
    fn test_parse_value_checks_decoded_collections() {
        let value = serde_json::json!([{"id": "s1", "content": "Already decoded", "reviewStage": 12}]);
        let insights = parse_value(value, now()).unwrap();
        assert_eq!(insights[0].review_stage, MAX_STAGE);
        assert_eq!(insights[0].review_history[0].action, ReviewAction::Created);

        let err = parse_value(serde_json::json!({"id": "s1"}), now()).unwrap_err();
        assert!(matches!(err, SproutError::Import { .. }));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = parse_collection(
            r#"[{"id": "x", "content": "first copy"}, {"id": "x", "content": "second copy"}]"#,
            now(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate id 'x'"));
    }

    #[test]
    fn test_accepts_epoch_millis_and_clamps_stage() {
        let created_ms = now().timestamp_millis();
        let text = format!(
            r#"[{{"id": "legacy", "content": "From an older export", "timestamp": {}, "reviewStage": 9,
                 "isMastered": true, "lastExerciseDate": {}}}]"#,
            created_ms, created_ms
        );

        let insights = parse_collection(&text, Utc::now()).unwrap();
        let insight = &insights[0];

        assert_eq!(insight.timestamp, now());
        assert_eq!(insight.review_stage, MAX_STAGE);
        assert_eq!(insight.next_review, now() + Duration::days(21));
        assert!(insight.is_mastered);
        assert_eq!(insight.last_exercise_date, Some(now()));
    }

    #[test]
    fn test_history_keeps_single_leading_created() {
        let text = r#"[{"id": "h", "content": "History handling",
            "timestamp": "2026-01-01T00:00:00Z",
            "reviewHistory": [
                {"timestamp": "2026-01-01T00:00:00Z", "action": "created"},
                {"timestamp": "2026-01-02T00:00:00Z", "action": "reviewed"},
                {"timestamp": "2026-01-03T00:00:00Z", "action": "created"}
            ]}]"#;

        let insight = &parse_collection(text, now()).unwrap()[0];

        let actions: Vec<ReviewAction> = insight.review_history.iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![ReviewAction::Created, ReviewAction::Reviewed]);
    }

    #[test]
    fn test_history_without_created_gets_one() {
        let text = r#"[{"id": "h", "content": "History handling",
            "reviewHistory": [{"timestamp": "2026-01-02T00:00:00Z", "action": "reviewed"}]}]"#;

        let insight = &parse_collection(text, now()).unwrap()[0];

        assert_eq!(insight.review_history[0].action, ReviewAction::Created);
        assert_eq!(insight.review_history[0].timestamp, now());
        assert_eq!(insight.review_count(), 1);
    }

    #[test]
    fn test_export_then_import_preserves_collection() {
        let mut a = Insight::new(
            InsightDraft::new("Export keeps every field.")
                .with_note("note")
                .with_source("source")
                .with_tags(vec!["t".to_string()]),
            now(),
        )
        .unwrap();
        crate::scheduler::apply_review(&mut a, crate::scheduler::ReviewOutcome::Remembered, now())
            .unwrap();
        a.exercise_history
            .push(ExerciseAttempt::new(ExerciseKind::OpenAnswer, true, now()));
        a.last_exercise_date = Some(now());
        let b = Insight::new(InsightDraft::new("A second plain insight."), now()).unwrap();
        let original = vec![a, b];

        let json = export_json(&original).unwrap();
        let imported = parse_collection(&json, Utc::now()).unwrap();

        assert_eq!(imported, original);
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(parse_collection("[]", now()).unwrap().is_empty());
    }
}
