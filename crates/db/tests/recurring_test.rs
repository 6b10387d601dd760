//! Integration tests for recurring schedules and the scheduler tick.

mod common;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;

use common::setup;
use procura_core::notification::NotificationKind;
use procura_core::recurring::{Frequency, SchedulePatch, ScheduleParams};
use procura_core::request::RequestStatus;
use procura_db::RecurringRepository;
use procura_db::entities::recurring_schedules;
use procura_shared::AppError;
use procura_shared::types::ListLimit;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

fn monthly_from(start: DateTime<Utc>) -> ScheduleParams {
    ScheduleParams {
        frequency: Frequency::Monthly,
        interval: 1,
        day_of_week: None,
        day_of_month: Some(31),
        start_date: start,
        end_date: None,
    }
}

#[tokio::test]
async fn test_month_end_schedule_clamps_and_spawns_children() {
    let h = setup().await;
    let budget = h.budget("Engineering", dec!(100000)).await;
    let template = h
        .draft("office supplies", 20, dec!(400), Some(budget.budget.id))
        .await;
    let repo = RecurringRepository::new(h.ctx.clone());
    let schedule = repo
        .attach(&h.requester, template.id, monthly_from(at(2026, 1, 31)))
        .await
        .unwrap();
    let flagged = h.requests().get(&h.requester, template.id).await.unwrap();
    assert!(flagged.is_recurring);

    let report = repo.tick(&h.admin, at(2026, 2, 1)).await.unwrap();
    assert_eq!(report.processed, 1);
    assert!(report.failed.is_empty());

    let stored = recurring_schedules::Entity::find_by_id(schedule.id)
        .one(&h.ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.next_run_date.with_timezone(&Utc), at(2026, 2, 28));
    assert_eq!(
        stored.last_run_date.map(|d| d.with_timezone(&Utc)),
        Some(at(2026, 2, 1))
    );

    // Not due again until the new date.
    let report = repo.tick(&h.admin, at(2026, 2, 10)).await.unwrap();
    assert_eq!(report.processed, 0);

    let children: Vec<_> = h
        .requests()
        .list_for_owner(&h.requester, Some(RequestStatus::Draft), ListLimit::DEFAULT)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.parent_request_id == Some(template.id))
        .collect();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].category.as_deref(), Some("office supplies"));
    assert_eq!(children[0].budget_id, None);
    assert_ne!(children[0].request_number, template.request_number);

    let committed = h.budgets().get(&h.finance, budget.budget.id).await.unwrap();
    assert_eq!(committed.budget.committed_amount, dec!(400));
    let notices = h.notifier.of_kind(NotificationKind::RecurringOrder);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].recipient_id, h.requester.id);
}

#[tokio::test]
async fn test_monthly_schedule_keeps_its_start_day() {
    let h = setup().await;
    let template = h.draft("coffee", 12, dec!(180), None).await;
    let repo = RecurringRepository::new(h.ctx.clone());
    let mut params = monthly_from(at(2026, 1, 31));
    params.day_of_month = None;
    let schedule = repo.attach(&h.requester, template.id, params).await.unwrap();

    let next_run = || async {
        recurring_schedules::Entity::find_by_id(schedule.id)
            .one(&h.ctx.db)
            .await
            .unwrap()
            .unwrap()
            .next_run_date
            .with_timezone(&Utc)
    };

    repo.tick(&h.admin, at(2026, 2, 1)).await.unwrap();
    assert_eq!(next_run().await, at(2026, 2, 28));
    repo.tick(&h.admin, at(2026, 3, 1)).await.unwrap();
    assert_eq!(next_run().await, at(2026, 3, 31));
    repo.tick(&h.admin, at(2026, 4, 1)).await.unwrap();
    assert_eq!(next_run().await, at(2026, 4, 30));
}

#[tokio::test]
async fn test_paused_and_ended_schedules_do_not_run() {
    let h = setup().await;
    let paused_template = h.draft("toner", 5, dec!(250), None).await;
    let ended_template = h.draft("paper", 50, dec!(200), None).await;
    let repo = RecurringRepository::new(h.ctx.clone());

    let paused = repo
        .attach(&h.requester, paused_template.id, monthly_from(at(2026, 1, 1)))
        .await
        .unwrap();
    let paused = repo.pause(&h.requester, paused.id).await.unwrap();
    assert!(!paused.is_active);

    let mut ended = monthly_from(at(2026, 1, 1));
    ended.end_date = Some(at(2026, 1, 15));
    repo.attach(&h.requester, ended_template.id, ended)
        .await
        .unwrap();

    let report = repo.tick(&h.admin, at(2026, 2, 1)).await.unwrap();
    assert_eq!(report.processed, 0);

    let resumed = repo.resume(&h.requester, paused.id).await.unwrap();
    assert!(resumed.is_active);
    let report = repo.tick(&h.admin, at(2026, 2, 1)).await.unwrap();
    assert_eq!(report.processed, 1);
}

#[tokio::test]
async fn test_schedule_input_is_validated() {
    let h = setup().await;
    let template = h.draft("toner", 5, dec!(250), None).await;
    let repo = RecurringRepository::new(h.ctx.clone());

    let mut zero = monthly_from(at(2026, 1, 1));
    zero.interval = 0;
    let err = repo.attach(&h.requester, template.id, zero).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut backwards = monthly_from(at(2026, 3, 1));
    backwards.end_date = Some(at(2026, 2, 1));
    let err = repo
        .attach(&h.requester, template.id, backwards)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let schedule = repo
        .attach(&h.requester, template.id, monthly_from(at(2026, 1, 1)))
        .await
        .unwrap();
    let err = repo
        .attach(&h.requester, template.id, monthly_from(at(2026, 1, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let updated = repo
        .update(
            &h.requester,
            schedule.id,
            SchedulePatch {
                frequency: Some(Frequency::Quarterly),
                day_of_week: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.frequency, Frequency::Quarterly.as_str());
    assert_eq!(updated.day_of_week, Some(1));

    let err = repo
        .update(
            &h.requester,
            schedule.id,
            SchedulePatch {
                day_of_week: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    repo.delete(&h.requester, schedule.id).await.unwrap();
    let template = h.requests().get(&h.requester, template.id).await.unwrap();
    assert!(!template.is_recurring);
}

#[tokio::test]
async fn test_tick_requires_scheduler_capability() {
    let h = setup().await;
    let err = RecurringRepository::new(h.ctx.clone())
        .tick(&h.manager, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}
