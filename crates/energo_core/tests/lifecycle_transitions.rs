use energo_core::domain::{DeleteConfirmation, IncidentPatch, IncidentStatus, NewIncident};
use energo_core::error::ErrorKind;
use energo_core::lifecycle::TransitionOutcome;
use energo_core::query::{EntityKind, FilterSpec, SortSpec};
use energo_core::timestamps::FixedClock;
use energo_core::Session;
use time::Duration;

fn session_at(ts: &str) -> (Session, FixedClock) {
    let clock = FixedClock::parse(ts).expect("clock");
    let session = Session::in_memory(Box::new(clock.clone())).expect("session");
    (session, clock)
}

fn line_break() -> NewIncident {
    NewIncident {
        incident_type: "Line break".to_string(),
        description: "Conductor down after storm".to_string(),
        location: "Feeder 12, pole 40".to_string(),
        affected_consumers: Some("120 households".to_string()),
        assigned_brigade: Some("Alpha".to_string()),
    }
}

fn assert_resolution_invariant(session: &Session) {
    let all = session
        .list_incidents(&FilterSpec::default(), &SortSpec::default_for(EntityKind::Incident))
        .expect("list");
    for inc in all {
        assert_eq!(
            inc.resolved_at.is_some(),
            inc.status == IncidentStatus::Resolved,
            "incident {} violates resolution invariant: {inc:?}",
            inc.id
        );
    }
}

#[test]
fn new_incident_starts_registered_with_registration_stamp() {
    let (mut session, _clock) = session_at("2024-03-01 09:15:00");
    let inc = session.create_incident(line_break()).expect("create");

    assert_eq!(inc.status, IncidentStatus::Registered);
    assert_eq!(inc.registered_at, "2024-03-01 09:15:00");
    assert_eq!(inc.resolved_at, None);
    assert_eq!(session.get_incident(inc.id).expect("get"), inc);
}

#[test]
fn registered_to_resolved_directly_stamps_resolution() {
    let (mut session, clock) = session_at("2024-01-01 00:00:00");
    let inc = session.create_incident(line_break()).expect("create");

    clock.advance(Duration::hours(3));
    let outcome = session
        .transition_incident_status(inc.id, IncidentStatus::Resolved)
        .expect("resolve");

    assert_eq!(
        outcome,
        TransitionOutcome::Applied {
            id: inc.id,
            from: IncidentStatus::Registered,
            to: IncidentStatus::Resolved,
            resolved_at: Some("2024-01-01 03:00:00".to_string()),
        }
    );
    let stored = session.get_incident(inc.id).expect("get");
    assert_eq!(stored.status, IncidentStatus::Resolved);
    assert_eq!(stored.resolved_at.as_deref(), Some("2024-01-01 03:00:00"));
    assert_eq!(stored.registered_at, "2024-01-01 00:00:00");
    assert_resolution_invariant(&session);
}

#[test]
fn repeated_in_progress_is_no_effect_and_leaves_row_unchanged() {
    let (mut session, _clock) = session_at("2024-01-01 00:00:00");
    let inc = session.create_incident(line_break()).expect("create");

    let first = session
        .transition_incident_status(inc.id, IncidentStatus::InProgress)
        .expect("first");
    assert!(!first.is_no_effect());
    let before = session.get_incident(inc.id).expect("get");

    let second = session
        .transition_incident_status(inc.id, IncidentStatus::InProgress)
        .expect("second");
    assert_eq!(
        second,
        TransitionOutcome::NoEffect {
            id: inc.id,
            current: IncidentStatus::InProgress,
        }
    );
    assert_eq!(session.get_incident(inc.id).expect("get"), before);
}

#[test]
fn re_resolving_is_no_effect_and_keeps_first_stamp() {
    let (mut session, clock) = session_at("2024-01-01 00:00:00");
    let inc = session.create_incident(line_break()).expect("create");
    session
        .transition_incident_status(inc.id, IncidentStatus::InProgress)
        .expect("progress");
    clock.advance(Duration::minutes(90));
    session
        .transition_incident_status(inc.id, IncidentStatus::Resolved)
        .expect("resolve");

    clock.advance(Duration::days(2));
    let again = session
        .transition_incident_status(inc.id, IncidentStatus::Resolved)
        .expect("again");
    assert!(again.is_no_effect());
    assert_eq!(
        session.get_incident(inc.id).expect("get").resolved_at.as_deref(),
        Some("2024-01-01 01:30:00")
    );
    assert_resolution_invariant(&session);
}

#[test]
fn no_regression_paths() {
    let (mut session, _clock) = session_at("2024-01-01 00:00:00");
    let inc = session.create_incident(line_break()).expect("create");
    session
        .transition_incident_status(inc.id, IncidentStatus::InProgress)
        .expect("progress");

    let err = session
        .transition_incident_status(inc.id, IncidentStatus::Registered)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.code, "LIFECYCLE_TRANSITION_FORBIDDEN");

    session
        .transition_incident_status(inc.id, IncidentStatus::Resolved)
        .expect("resolve");
    let err = session
        .transition_incident_status(inc.id, IncidentStatus::InProgress)
        .unwrap_err();
    assert_eq!(err.code, "LIFECYCLE_TRANSITION_FORBIDDEN");

    let stored = session.get_incident(inc.id).expect("get");
    assert_eq!(stored.status, IncidentStatus::Resolved);
    assert_resolution_invariant(&session);
}

#[test]
fn transition_on_missing_incident_is_not_found() {
    let (mut session, _clock) = session_at("2024-01-01 00:00:00");
    let err = session
        .transition_incident_status(42, IncidentStatus::Resolved)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[test]
fn field_edits_never_touch_status_or_timestamps() {
    let (mut session, clock) = session_at("2024-01-01 00:00:00");
    let inc = session.create_incident(line_break()).expect("create");
    clock.advance(Duration::hours(1));
    session
        .transition_incident_status(inc.id, IncidentStatus::Resolved)
        .expect("resolve");

    clock.advance(Duration::hours(5));
    let updated = session
        .update_incident(
            inc.id,
            IncidentPatch {
                description: Some("Conductor replaced".to_string()),
                assigned_brigade: Some(String::new()),
                ..IncidentPatch::default()
            },
        )
        .expect("update");

    assert_eq!(updated.description, "Conductor replaced");
    assert_eq!(updated.assigned_brigade, None);
    assert_eq!(updated.status, IncidentStatus::Resolved);
    assert_eq!(updated.registered_at, "2024-01-01 00:00:00");
    assert_eq!(updated.resolved_at.as_deref(), Some("2024-01-01 01:00:00"));
    assert_eq!(session.get_incident(inc.id).expect("get"), updated);

    session
        .delete_incident(inc.id, DeleteConfirmation::confirmed())
        .expect("delete");
    assert_resolution_invariant(&session);
}
