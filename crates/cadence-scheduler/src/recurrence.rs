//! Next-occurrence math for recurring tasks, and the instantiation of
//! successor tasks when a recurring task completes.

use chrono::{Duration, Months, NaiveDate};
use uuid::Uuid;

use cadence_core::types::{RecurrenceAnchor, RecurrencePattern, RecurrenceRule, Task};

use crate::error::{Result, SchedulerError};

/// Compute the next due date for `rule`, pure and deterministic.
///
/// The base date is `reference` (the current due date), unless the rule is
/// anchored `after_completion` and a `completion` date is supplied — then the
/// completion date is used so a task that was skipped for weeks doesn't
/// produce a stack of already-overdue occurrences.
///
/// Monthly recurrence clamps to the last valid day of the target month:
/// Jan 31 + 1 month is Feb 28 (29 in leap years), never Mar 3.
pub fn next_occurrence(
    rule: &RecurrenceRule,
    reference: NaiveDate,
    completion: Option<NaiveDate>,
) -> Result<NaiveDate> {
    if rule.interval <= 0 {
        return Err(SchedulerError::InvalidRecurrence(format!(
            "interval must be positive, got {}",
            rule.interval
        )));
    }

    let base = match rule.anchor {
        RecurrenceAnchor::AfterCompletion => completion.unwrap_or(reference),
        RecurrenceAnchor::OnSchedule => reference,
    };

    match rule.pattern {
        RecurrencePattern::Daily | RecurrencePattern::Custom => {
            Ok(base + Duration::days(rule.interval))
        }
        RecurrencePattern::Weekly => Ok(base + Duration::days(rule.interval * 7)),
        RecurrencePattern::Monthly => {
            let months = u32::try_from(rule.interval).map_err(|_| {
                SchedulerError::InvalidRecurrence(format!(
                    "monthly interval out of range: {}",
                    rule.interval
                ))
            })?;
            base.checked_add_months(Months::new(months))
                .ok_or_else(|| {
                    SchedulerError::InvalidRecurrence(format!(
                        "date overflow adding {months} months to {base}"
                    ))
                })
        }
    }
}

/// Build the successor task for a completed recurring task.
///
/// Completing a task under a recurrence rule spawns a fresh instance (new
/// id, same title/priority/rule, next due date) rather than mutating the
/// completed one. Returns `Ok(None)` for non-recurring tasks.
pub fn spawn_next_instance(task: &Task, completion: NaiveDate) -> Result<Option<Task>> {
    let Some(rule) = &task.recurrence else {
        return Ok(None);
    };

    // The reference is the current due date when one parses; otherwise fall
    // back to the completion date so a task with a mangled due date can
    // still recur instead of being silently dropped.
    let reference = task
        .due_date
        .as_deref()
        .and_then(parse_due_date)
        .unwrap_or(completion);

    let next = next_occurrence(rule, reference, Some(completion))?;

    Ok(Some(Task {
        id: Uuid::new_v4().to_string(),
        title: task.title.clone(),
        priority: task.priority,
        due_date: Some(next.format("%Y-%m-%d").to_string()),
        recurrence: task.recurrence.clone(),
        completed: false,
        archived: false,
    }))
}

/// Parse a due date as stored by the task subsystem.
///
/// Accepts plain `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::types::TaskPriority;
    use chrono::Datelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(pattern: RecurrencePattern, interval: i64, anchor: RecurrenceAnchor) -> RecurrenceRule {
        RecurrenceRule {
            pattern,
            interval,
            anchor,
        }
    }

    #[test]
    fn daily_adds_interval_days() {
        let r = rule(RecurrencePattern::Daily, 3, RecurrenceAnchor::OnSchedule);
        assert_eq!(
            next_occurrence(&r, date(2026, 8, 1), None).unwrap(),
            date(2026, 8, 4)
        );
    }

    #[test]
    fn weekly_preserves_weekday() {
        let r = rule(RecurrencePattern::Weekly, 2, RecurrenceAnchor::OnSchedule);
        let start = date(2026, 8, 3); // a Monday
        let next = next_occurrence(&r, start, None).unwrap();
        assert_eq!(next, date(2026, 8, 17));
        assert_eq!(start.weekday(), next.weekday());
    }

    #[test]
    fn monthly_clamps_to_last_valid_day() {
        let r = rule(RecurrencePattern::Monthly, 1, RecurrenceAnchor::OnSchedule);
        assert_eq!(
            next_occurrence(&r, date(2026, 1, 31), None).unwrap(),
            date(2026, 2, 28)
        );
        // Leap year clamps to Feb 29 instead.
        assert_eq!(
            next_occurrence(&r, date(2028, 1, 31), None).unwrap(),
            date(2028, 2, 29)
        );
    }

    #[test]
    fn monthly_non_clamping_day_is_untouched() {
        let r = rule(RecurrencePattern::Monthly, 2, RecurrenceAnchor::OnSchedule);
        assert_eq!(
            next_occurrence(&r, date(2026, 3, 15), None).unwrap(),
            date(2026, 5, 15)
        );
    }

    #[test]
    fn after_completion_anchors_on_completion_date() {
        let r = rule(
            RecurrencePattern::Weekly,
            1,
            RecurrenceAnchor::AfterCompletion,
        );
        // Due Aug 3, completed late on Aug 20: next is a week after
        // completion, not a backlog of missed weeks.
        let next = next_occurrence(&r, date(2026, 8, 3), Some(date(2026, 8, 20))).unwrap();
        assert_eq!(next, date(2026, 8, 27));
    }

    #[test]
    fn after_completion_without_completion_falls_back_to_reference() {
        let r = rule(
            RecurrencePattern::Daily,
            1,
            RecurrenceAnchor::AfterCompletion,
        );
        assert_eq!(
            next_occurrence(&r, date(2026, 8, 3), None).unwrap(),
            date(2026, 8, 4)
        );
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        for interval in [0, -1] {
            let r = rule(RecurrencePattern::Daily, interval, RecurrenceAnchor::OnSchedule);
            assert!(matches!(
                next_occurrence(&r, date(2026, 8, 1), None),
                Err(SchedulerError::InvalidRecurrence(_))
            ));
        }
    }

    #[test]
    fn custom_pattern_is_interval_days() {
        let r = rule(RecurrencePattern::Custom, 10, RecurrenceAnchor::OnSchedule);
        assert_eq!(
            next_occurrence(&r, date(2026, 8, 1), None).unwrap(),
            date(2026, 8, 11)
        );
    }

    #[test]
    fn spawn_next_instance_builds_fresh_task() {
        let task = Task {
            id: "t1".into(),
            title: "water plants".into(),
            priority: TaskPriority::Medium,
            due_date: Some("2026-08-03".into()),
            recurrence: Some(rule(
                RecurrencePattern::Weekly,
                1,
                RecurrenceAnchor::OnSchedule,
            )),
            completed: true,
            archived: false,
        };
        let next = spawn_next_instance(&task, date(2026, 8, 3)).unwrap().unwrap();
        assert_ne!(next.id, task.id);
        assert_eq!(next.title, task.title);
        assert_eq!(next.priority, TaskPriority::Medium);
        assert_eq!(next.due_date.as_deref(), Some("2026-08-10"));
        assert!(!next.completed);
        assert!(next.recurrence.is_some());
    }

    #[test]
    fn spawn_next_instance_none_for_non_recurring() {
        let task = Task {
            id: "t1".into(),
            title: "one-off".into(),
            priority: TaskPriority::None,
            due_date: None,
            recurrence: None,
            completed: true,
            archived: false,
        };
        assert!(spawn_next_instance(&task, date(2026, 8, 3)).unwrap().is_none());
    }

    #[test]
    fn spawn_with_unparseable_due_date_uses_completion() {
        let task = Task {
            id: "t1".into(),
            title: "stretch".into(),
            priority: TaskPriority::Low,
            due_date: Some("next tuesday".into()),
            recurrence: Some(rule(
                RecurrencePattern::Daily,
                2,
                RecurrenceAnchor::OnSchedule,
            )),
            completed: true,
            archived: false,
        };
        let next = spawn_next_instance(&task, date(2026, 8, 3)).unwrap().unwrap();
        assert_eq!(next.due_date.as_deref(), Some("2026-08-05"));
    }

    #[test]
    fn parse_due_date_accepts_rfc3339() {
        assert_eq!(
            parse_due_date("2026-08-03T10:00:00Z"),
            Some(date(2026, 8, 3))
        );
        assert_eq!(parse_due_date("2026-08-03"), Some(date(2026, 8, 3)));
        assert_eq!(parse_due_date("soon"), None);
    }
}
