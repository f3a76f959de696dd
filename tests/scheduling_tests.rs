//! Tests de integración del core de scheduling, cableado completo sobre
//! los stores en memoria (mismo contrato que los repositorios Postgres).

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use fleet_scheduling::models::{Driver, DriverRole, Trip, TripStatus};
use fleet_scheduling::repositories::memory::{
    InMemoryAssignmentTable, InMemoryDayOffLedger, InMemoryDriverDirectory, InMemoryTripStore,
};
use fleet_scheduling::services::{AssignmentCoordinator, ScheduleProjector};
use fleet_scheduling::{DayOffStatus, SchedulingError};

struct TestCore {
    trips: InMemoryTripStore,
    coordinator: Arc<AssignmentCoordinator>,
    projector: ScheduleProjector,
}

async fn core_with_drivers(driver_ids: &[i32]) -> TestCore {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let trips = InMemoryTripStore::new();
    let drivers = InMemoryDriverDirectory::new();
    for id in driver_ids {
        drivers
            .insert(Driver {
                id: *id,
                full_name: format!("Driver {}", id),
            })
            .await;
    }
    let assignments = Arc::new(InMemoryAssignmentTable::new(trips.clone()));
    let day_offs = Arc::new(InMemoryDayOffLedger::new());
    let coordinator = Arc::new(AssignmentCoordinator::new(
        Arc::new(trips.clone()),
        Arc::new(drivers),
        assignments.clone(),
        day_offs,
    ));
    let projector = ScheduleProjector::new(assignments);
    TestCore {
        trips,
        coordinator,
        projector,
    }
}

fn trip(id: i32, start: DateTime<Utc>, hours: i64, status: TripStatus) -> Trip {
    Trip {
        id,
        start_location: "Hanoi".to_string(),
        end_location: "Haiphong".to_string(),
        start_time: start,
        end_time: Some(start + Duration::hours(hours)),
        status,
    }
}

fn jan(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
}

#[tokio::test]
async fn test_non_overlapping_assignments_succeed_then_overlap_fails() {
    let core = core_with_drivers(&[10]).await;
    core.trips.insert(trip(1, jan(5, 8), 4, TripStatus::Scheduled)).await;
    core.trips.insert(trip(2, jan(6, 8), 4, TripStatus::Scheduled)).await;
    // arranca dentro de la ventana del trip 1
    core.trips.insert(trip(3, jan(5, 10), 4, TripStatus::Scheduled)).await;

    core.coordinator.assign_driver(1, 10, DriverRole::MainDriver).await.unwrap();
    core.coordinator.assign_driver(2, 10, DriverRole::MainDriver).await.unwrap();

    let err = core
        .coordinator
        .assign_driver(3, 10, DriverRole::MainDriver)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::ScheduleConflict { driver_id: 10, .. }));
    assert!(err.is_business_rule());
}

#[tokio::test]
async fn test_second_main_driver_fails_with_role_conflict() {
    let core = core_with_drivers(&[10, 11]).await;
    core.trips.insert(trip(1, jan(5, 8), 4, TripStatus::Scheduled)).await;

    core.coordinator.assign_driver(1, 10, DriverRole::MainDriver).await.unwrap();
    let err = core
        .coordinator
        .assign_driver(1, 11, DriverRole::MainDriver)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::RoleConflict { trip_id: 1 }));

    // un co-driver adicional sí entra
    core.coordinator.assign_driver(1, 11, DriverRole::CoDriver).await.unwrap();
}

#[tokio::test]
async fn test_duplicate_assignment_is_propagated() {
    let core = core_with_drivers(&[10]).await;
    core.trips.insert(trip(1, jan(5, 8), 4, TripStatus::Scheduled)).await;

    core.coordinator.assign_driver(1, 10, DriverRole::CoDriver).await.unwrap();
    let err = core
        .coordinator
        .assign_driver(1, 10, DriverRole::CoDriver)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SchedulingError::DuplicateAssignment { trip_id: 1, driver_id: 10 }
    ));
}

#[tokio::test]
async fn test_assign_fails_for_missing_trip_or_driver() {
    let core = core_with_drivers(&[10]).await;
    core.trips.insert(trip(1, jan(5, 8), 4, TripStatus::Scheduled)).await;

    let err = core
        .coordinator
        .assign_driver(99, 10, DriverRole::MainDriver)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::TripNotFound(99)));

    let err = core
        .coordinator
        .assign_driver(1, 99, DriverRole::MainDriver)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::DriverNotFound(99)));
}

#[tokio::test]
async fn test_dashboard_returns_soonest_upcoming_trip() {
    let core = core_with_drivers(&[10]).await;
    let now = jan(5, 6);
    core.trips.insert(trip(1, now + Duration::hours(3), 2, TripStatus::Scheduled)).await;
    core.trips.insert(trip(2, now + Duration::hours(1), 1, TripStatus::Scheduled)).await;

    core.coordinator.assign_driver(1, 10, DriverRole::MainDriver).await.unwrap();
    core.coordinator.assign_driver(2, 10, DriverRole::CoDriver).await.unwrap();

    // T+1h, no T+3h
    let dashboard = core.projector.dashboard_for(10).await.unwrap().unwrap();
    assert_eq!(dashboard.trip_id, 2);
}

#[tokio::test]
async fn test_schedule_lists_newest_first() {
    let core = core_with_drivers(&[10]).await;
    core.trips.insert(trip(1, jan(5, 8), 2, TripStatus::Scheduled)).await;
    core.trips.insert(trip(2, jan(7, 8), 2, TripStatus::Scheduled)).await;

    core.coordinator.assign_driver(1, 10, DriverRole::MainDriver).await.unwrap();
    core.coordinator.assign_driver(2, 10, DriverRole::MainDriver).await.unwrap();

    let schedule = core.projector.schedule_for(10, None).await.unwrap();
    let ids: Vec<i32> = schedule.iter().map(|s| s.trip_id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn test_day_off_approval_blocked_by_scheduled_trip() {
    let core = core_with_drivers(&[10]).await;
    core.trips.insert(trip(1, jan(11, 9), 4, TripStatus::Scheduled)).await;
    core.coordinator.assign_driver(1, 10, DriverRole::MainDriver).await.unwrap();

    let request = core
        .coordinator
        .request_day_off(10, jan(10, 0), jan(12, 0), Some("family".to_string()))
        .await
        .unwrap();
    assert_eq!(request.status, DayOffStatus::Pending);

    let err = core.coordinator.decide_day_off(request.id, true).await.unwrap_err();
    assert!(matches!(
        err,
        SchedulingError::ScheduleConflict { driver_id: 10, trip_id: 1 }
    ));

    // el conflicto deja la solicitud PENDING
    let still_pending = core.coordinator.day_offs_for(10).await.unwrap();
    assert_eq!(still_pending[0].status, DayOffStatus::Pending);

    // con el trip cancelado la aprobación pasa
    core.trips.set_status(1, TripStatus::Cancelled).await.unwrap();
    let approved = core.coordinator.decide_day_off(request.id, true).await.unwrap();
    assert_eq!(approved.status, DayOffStatus::Approved);
}

#[tokio::test]
async fn test_assigning_into_approved_day_off_fails() {
    let core = core_with_drivers(&[10]).await;
    let request = core
        .coordinator
        .request_day_off(10, jan(10, 0), jan(12, 0), None)
        .await
        .unwrap();
    core.coordinator.decide_day_off(request.id, true).await.unwrap();

    // trip que arranca dentro del día libre aprobado
    core.trips.insert(trip(1, jan(11, 9), 4, TripStatus::Scheduled)).await;
    let err = core
        .coordinator
        .assign_driver(1, 10, DriverRole::MainDriver)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::DayOffConflict { driver_id: 10 }));

    // trip fuera de la ventana aprobada
    core.trips.insert(trip(2, jan(13, 9), 4, TripStatus::Scheduled)).await;
    core.coordinator.assign_driver(2, 10, DriverRole::MainDriver).await.unwrap();
}

#[tokio::test]
async fn test_request_day_off_with_inverted_range_fails() {
    let core = core_with_drivers(&[10]).await;
    let err = core
        .coordinator
        .request_day_off(10, jan(5, 0), jan(3, 0), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidRange { .. }));
}

#[tokio::test]
async fn test_overlapping_day_off_request_is_rejected() {
    let core = core_with_drivers(&[10]).await;
    core.coordinator
        .request_day_off(10, jan(10, 0), jan(12, 0), None)
        .await
        .unwrap();

    let err = core
        .coordinator
        .request_day_off(10, jan(11, 0), jan(14, 0), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::OverlappingRequest { driver_id: 10 }));

    // ventana disjunta del mismo conductor
    core.coordinator
        .request_day_off(10, jan(20, 0), jan(22, 0), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_decided_request_cannot_be_decided_again() {
    let core = core_with_drivers(&[10]).await;
    let request = core
        .coordinator
        .request_day_off(10, jan(10, 0), jan(12, 0), None)
        .await
        .unwrap();

    let rejected = core.coordinator.decide_day_off(request.id, false).await.unwrap();
    assert_eq!(rejected.status, DayOffStatus::Rejected);

    let err = core.coordinator.decide_day_off(request.id, true).await.unwrap_err();
    assert!(matches!(
        err,
        SchedulingError::InvalidTransition {
            status: DayOffStatus::Rejected,
            ..
        }
    ));

    let err = core.coordinator.decide_day_off(999, true).await.unwrap_err();
    assert!(matches!(err, SchedulingError::RequestNotFound(999)));
}

#[tokio::test]
async fn test_unassign_is_idempotent() {
    let core = core_with_drivers(&[10]).await;
    core.trips.insert(trip(1, jan(5, 8), 4, TripStatus::Scheduled)).await;
    core.coordinator.assign_driver(1, 10, DriverRole::MainDriver).await.unwrap();

    core.coordinator.unassign_driver(1, 10).await.unwrap();
    // repetir no falla
    core.coordinator.unassign_driver(1, 10).await.unwrap();

    // y la ventana queda libre para otro trip solapado
    core.trips.insert(trip(2, jan(5, 9), 4, TripStatus::Scheduled)).await;
    core.coordinator.assign_driver(2, 10, DriverRole::MainDriver).await.unwrap();
}

#[tokio::test]
async fn test_remove_trip_assignments_cascades() {
    let core = core_with_drivers(&[10, 11]).await;
    core.trips.insert(trip(1, jan(5, 8), 4, TripStatus::Scheduled)).await;
    core.coordinator.assign_driver(1, 10, DriverRole::MainDriver).await.unwrap();
    core.coordinator.assign_driver(1, 11, DriverRole::CoDriver).await.unwrap();

    core.coordinator.remove_trip_assignments(1).await.unwrap();
    assert!(core.projector.schedule_for(10, None).await.unwrap().is_empty());
    assert!(core.projector.schedule_for(11, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_overlapping_assignments_have_single_winner() {
    let core = core_with_drivers(&[10]).await;
    core.trips.insert(trip(1, jan(5, 10), 4, TripStatus::Scheduled)).await;
    core.trips.insert(trip(2, jan(5, 12), 4, TripStatus::Scheduled)).await;

    let c1 = core.coordinator.clone();
    let c2 = core.coordinator.clone();
    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { c1.assign_driver(1, 10, DriverRole::MainDriver).await }),
        tokio::spawn(async move { c2.assign_driver(2, 10, DriverRole::MainDriver).await }),
    );
    let r1 = r1.unwrap();
    let r2 = r2.unwrap();

    // exactamente un ganador, nunca los dos
    assert_eq!(r1.is_ok() as u8 + r2.is_ok() as u8, 1);
    let loser = if r1.is_err() { r1.unwrap_err() } else { r2.unwrap_err() };
    assert!(matches!(loser, SchedulingError::ScheduleConflict { driver_id: 10, .. }));
}
