//! Weighted-random choice of which task to remind the user about.
//!
//! Every eligible task gets `priority_weight × due_weight`; the draw is one
//! uniform sample against the cumulative weights, O(n) over the snapshot.
//! The multiplicative combination is the point: a critical overdue task
//! dominates the draw while a low-priority far-future task is still possible,
//! just rare.

use chrono::NaiveDate;
use rand::Rng;
use tracing::{debug, warn};

use cadence_core::types::{Task, TaskPriority};

use crate::recurrence::parse_due_date;

/// Choose one task to remind about, or `None` when nothing is eligible.
///
/// Eligible means not completed and not archived. An unparseable due date
/// demotes the task to "no due date" with a warning — it never disqualifies
/// it and never errors.
pub fn select<'a, R: Rng>(tasks: &'a [Task], today: NaiveDate, rng: &mut R) -> Option<&'a Task> {
    let weighted: Vec<(&Task, f64)> = tasks
        .iter()
        .filter(|t| !t.completed && !t.archived)
        .map(|t| (t, weight(t, today)))
        .collect();

    if weighted.is_empty() {
        return None;
    }

    let total: f64 = weighted.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        // Degenerate weights: fall back to a uniform pick over the full list.
        let idx = rng.gen_range(0..weighted.len());
        return Some(weighted[idx].0);
    }

    let draw = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    for (task, w) in &weighted {
        cumulative += w;
        if draw < cumulative {
            debug!(task = %task.id, weight = w, "reminder task selected");
            return Some(task);
        }
    }
    // Float rounding can leave `draw` a hair past the last cumulative sum.
    weighted.last().map(|(task, _)| *task)
}

/// Combined weight for one task.
pub fn weight(task: &Task, today: NaiveDate) -> f64 {
    priority_weight(task.priority) * due_weight(task, today)
}

fn priority_weight(priority: TaskPriority) -> f64 {
    match priority {
        TaskPriority::Critical => 5.0,
        TaskPriority::High => 3.0,
        TaskPriority::Medium => 2.0,
        TaskPriority::Low => 1.0,
        TaskPriority::None => 0.5,
    }
}

/// Sliding urgency scale over the due date.
///
/// overdue 5, today 4, within a week sliding 3 → 1, within a month 1,
/// no due date 0.5, beyond a month 0.25.
fn due_weight(task: &Task, today: NaiveDate) -> f64 {
    let due = match task.due_date.as_deref() {
        None => return 0.5,
        Some(raw) => match parse_due_date(raw) {
            Some(date) => date,
            None => {
                warn!(task = %task.id, raw, "unparseable due date; treating as none");
                return 0.5;
            }
        },
    };

    let days_until = (due - today).num_days();
    if days_until < 0 {
        5.0
    } else if days_until == 0 {
        4.0
    } else if days_until <= 7 {
        (3.0 - (days_until as f64 / 7.0) * 2.0).max(1.0)
    } else if days_until <= 30 {
        1.0
    } else {
        0.25
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: &str, priority: TaskPriority, due: Option<&str>) -> Task {
        Task {
            id: id.into(),
            title: id.into(),
            priority,
            due_date: due.map(String::from),
            recurrence: None,
            completed: false,
            archived: false,
        }
    }

    #[test]
    fn empty_list_selects_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select(&[], day(2026, 8, 7), &mut rng).is_none());
    }

    #[test]
    fn completed_and_archived_are_never_selected() {
        let mut done = task("done", TaskPriority::Critical, Some("2026-01-01"));
        done.completed = true;
        let mut shelved = task("shelved", TaskPriority::Critical, Some("2026-01-01"));
        shelved.archived = true;
        let open = task("open", TaskPriority::None, None);

        let tasks = vec![done, shelved, open];
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let picked = select(&tasks, day(2026, 8, 7), &mut rng).unwrap();
            assert_eq!(picked.id, "open");
        }
    }

    #[test]
    fn invalid_due_date_is_treated_as_none_and_still_selectable() {
        let tasks = vec![task("odd", TaskPriority::Medium, Some("whenever"))];
        let mut rng = StdRng::seed_from_u64(3);
        let picked = select(&tasks, day(2026, 8, 7), &mut rng).unwrap();
        assert_eq!(picked.id, "odd");
    }

    #[test]
    fn due_weight_boundaries() {
        let today = day(2026, 8, 7);
        let w = |due: &str| due_weight(&task("t", TaskPriority::None, Some(due)), today);

        assert_eq!(w("2026-08-01"), 5.0); // overdue
        assert_eq!(w("2026-08-07"), 4.0); // today
        assert!(w("2026-08-08") > w("2026-08-13")); // sliding inside the week
        assert_eq!(w("2026-08-14"), 1.0); // 7 days out floors at 1
        assert_eq!(w("2026-08-30"), 1.0); // inside a month
        assert_eq!(w("2026-10-01"), 0.25); // far future
        assert_eq!(
            due_weight(&task("t", TaskPriority::None, None), today),
            0.5
        );
    }

    #[test]
    fn weights_multiply() {
        let today = day(2026, 8, 7);
        let critical_overdue = task("a", TaskPriority::Critical, Some("2026-08-01"));
        let low_far = task("b", TaskPriority::Low, Some("2026-12-01"));
        assert_eq!(weight(&critical_overdue, today), 25.0);
        assert_eq!(weight(&low_far, today), 0.25);
    }

    #[test]
    fn critical_overdue_dominates_over_many_draws() {
        let tasks = vec![
            task("critical_overdue", TaskPriority::Critical, Some("2026-08-01")),
            task("low_far", TaskPriority::Low, Some("2026-12-01")),
        ];
        let today = day(2026, 8, 7);
        let mut rng = StdRng::seed_from_u64(42);

        let mut hits = (0u32, 0u32);
        for _ in 0..10_000 {
            match select(&tasks, today, &mut rng).unwrap().id.as_str() {
                "critical_overdue" => hits.0 += 1,
                _ => hits.1 += 1,
            }
        }
        // Expected ratio 25.0 : 0.25 = 100:1; allow a wide statistical margin.
        assert!(hits.0 > hits.1 * 50, "ratio off: {hits:?}");
        // The long tail must still be reachable.
        assert!(hits.1 > 0, "low-priority task was never drawn");
    }
}
