//! PM due-date roller
//!
//! Scans active schedules that are due, spawns a work order per due schedule
//! unless one is already open, and always advances the due date past today.
//! A failure on one schedule aborts the batch; earlier effects persist.

use chrono::NaiveDate;
use storekeep_common::auth::StoreScope;
use storekeep_common::db::Repository;
use storekeep_common::errors::Result;
use storekeep_common::metrics::record_work_order_created;
use storekeep_common::workorders::{Priority, WorkOrderStatus};
use storekeep_common::PM_TITLE_PREFIX;

/// Counts returned by a roller pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollerOutcome {
    pub processed: usize,
    pub created: usize,
}

/// Advance a due date by whole `frequency_days` steps until it lands
/// strictly after `today`. Catches up over any number of missed cycles.
pub fn advance_due_date(next_due: NaiveDate, frequency_days: i32, today: NaiveDate) -> NaiveDate {
    let step = chrono::Duration::days(i64::from(frequency_days.max(1)));
    let mut due = next_due;
    while due <= today {
        due += step;
    }
    due
}

/// Run one roller pass over the schedules visible in `scope`.
pub async fn run_roller(
    repo: &Repository,
    scope: &StoreScope,
    today: NaiveDate,
) -> Result<RollerOutcome> {
    let due_schedules = repo.list_due_pm_schedules(scope, today).await?;
    let mut created = 0;

    for schedule in &due_schedules {
        let title = format!("{}{}", PM_TITLE_PREFIX, schedule.title);

        // Heuristic guard: an open order with the generated title for the
        // same asset means this schedule already has live work
        let already_open = repo
            .find_open_work_order_by_title(schedule.asset_id, &title)
            .await?
            .is_some();

        if !already_open {
            // Fall back to the asset's store when the schedule has none
            let store_id = match schedule.store_id {
                Some(store_id) => Some(store_id),
                None => repo
                    .find_asset_by_id(schedule.asset_id)
                    .await?
                    .map(|asset| asset.store_id),
            };

            let work_order = repo
                .create_work_order(
                    title,
                    None,
                    WorkOrderStatus::Open,
                    Priority::Medium,
                    Some(schedule.asset_id),
                    store_id,
                    None,
                    None,
                    Some(schedule.next_due_date),
                )
                .await?;
            record_work_order_created("pm");
            created += 1;

            tracing::info!(
                schedule_id = %schedule.id,
                work_order_id = %work_order.id,
                "PM work order generated"
            );
        } else {
            tracing::debug!(
                schedule_id = %schedule.id,
                "Skipping PM schedule with an open work order"
            );
        }

        // Advance unconditionally so the schedule never re-fires for the
        // same due date
        let new_due = advance_due_date(schedule.next_due_date, schedule.frequency_days, today);
        repo.set_pm_schedule_due_date(schedule.id, new_due).await?;
    }

    Ok(RollerOutcome {
        processed: due_schedules.len(),
        created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_advance_single_cycle() {
        let today = date(2025, 6, 10);
        // Due today still advances: the boundary is strictly-after
        assert_eq!(
            advance_due_date(date(2025, 6, 10), 7, today),
            date(2025, 6, 17)
        );
    }

    #[test]
    fn test_advance_catches_up_missed_cycles() {
        // 20 days late at frequency 7: exactly 3 increments from the
        // original due date, landing strictly after today
        let today = date(2025, 6, 21);
        let original = date(2025, 6, 1);
        let advanced = advance_due_date(original, 7, today);
        assert_eq!(advanced, date(2025, 6, 22));
        assert_eq!((advanced - original).num_days(), 21);
        assert!(advanced > today);
    }

    #[test]
    fn test_advance_future_date_unchanged() {
        let today = date(2025, 6, 10);
        assert_eq!(
            advance_due_date(date(2025, 6, 11), 7, today),
            date(2025, 6, 11)
        );
    }

    #[test]
    fn test_advance_is_idempotent_within_a_day() {
        // A second roller pass on the same day finds nothing due: the
        // advanced date is already strictly after today
        let today = date(2025, 6, 10);
        let advanced = advance_due_date(date(2025, 6, 3), 14, today);
        assert!(advanced > today);
        assert_eq!(advance_due_date(advanced, 14, today), advanced);
    }

    #[test]
    fn test_advance_tolerates_degenerate_frequency() {
        let today = date(2025, 6, 10);
        let advanced = advance_due_date(date(2025, 6, 1), 0, today);
        assert!(advanced > today);
    }
}
