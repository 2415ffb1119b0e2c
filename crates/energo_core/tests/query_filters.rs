use energo_core::domain::{IncidentStatus, NewBrigade, NewEquipment, NewIncident};
use energo_core::error::ErrorKind;
use energo_core::query::{EntityKind, FilterSpec, SortDirection, SortSpec};
use energo_core::timestamps::FixedClock;
use energo_core::Session;
use pretty_assertions::assert_eq;
use time::Duration;

/// Three incidents one hour apart: #1 resolved, #2 in progress, #3 registered.
fn seeded() -> Session {
    let clock = FixedClock::parse("2024-02-01 06:00:00").expect("clock");
    let mut session = Session::in_memory(Box::new(clock.clone())).expect("session");
    let specs = [
        ("Line break", "Pole snapped", "Feeder 12"),
        ("Transformer fault", "Oil leak", "Substation 7"),
        ("Line break", "Sagging wire", "Riverside"),
    ];
    for (t, d, l) in specs {
        session
            .create_incident(NewIncident {
                incident_type: t.to_string(),
                description: d.to_string(),
                location: l.to_string(),
                ..NewIncident::default()
            })
            .expect("create");
        clock.advance(Duration::hours(1));
    }
    session
        .transition_incident_status(1, IncidentStatus::Resolved)
        .expect("resolve");
    session
        .transition_incident_status(2, IncidentStatus::InProgress)
        .expect("progress");
    session
}

fn ids(session: &Session, filter: &FilterSpec, sort: &SortSpec) -> Vec<i64> {
    session
        .list_incidents(filter, sort)
        .expect("list")
        .into_iter()
        .map(|i| i.id)
        .collect()
}

#[test]
fn default_incident_listing_is_newest_first() {
    let session = seeded();
    let sort = SortSpec::default_for(EntityKind::Incident);
    assert_eq!(ids(&session, &FilterSpec::default(), &sort), vec![3, 2, 1]);
}

#[test]
fn active_only_excludes_exactly_the_resolved_incidents() {
    let session = seeded();
    let filter = FilterSpec {
        active_only: true,
        ..FilterSpec::default()
    };
    let sort = SortSpec::new("id", SortDirection::Asc);
    let active = session.list_incidents(&filter, &sort).expect("list");

    assert_eq!(active.iter().map(|i| i.id).collect::<Vec<_>>(), vec![2, 3]);
    assert!(active.iter().all(|i| i.status != IncidentStatus::Resolved));
}

#[test]
fn search_matches_description_or_location_case_sensitively() {
    let session = seeded();
    let sort = SortSpec::new("id", SortDirection::Asc);

    assert_eq!(ids(&session, &FilterSpec::search("Substation"), &sort), vec![2]);
    assert_eq!(ids(&session, &FilterSpec::search("wire"), &sort), vec![3]);
    assert_eq!(ids(&session, &FilterSpec::search("substation"), &sort), Vec::<i64>::new());
    assert_eq!(ids(&session, &FilterSpec::search("   "), &sort), vec![1, 2, 3]);
}

#[test]
fn search_text_is_bound_not_interpolated() {
    let session = seeded();
    let sort = SortSpec::new("id", SortDirection::Asc);
    let hostile = FilterSpec::search("') OR 1=1; DROP TABLE incidents; --");

    assert_eq!(ids(&session, &hostile, &sort), Vec::<i64>::new());
    assert_eq!(session.count(EntityKind::Incident).expect("count"), 3);
}

#[test]
fn predicates_combine_with_and() {
    let session = seeded();
    let sort = SortSpec::new("id", SortDirection::Asc);
    let filter = FilterSpec {
        incident_type: Some("Line break".to_string()),
        active_only: true,
        ..FilterSpec::default()
    };
    assert_eq!(ids(&session, &filter, &sort), vec![3]);

    let filter = FilterSpec {
        status: Some(IncidentStatus::Resolved),
        ..FilterSpec::default()
    };
    assert_eq!(ids(&session, &filter, &sort), vec![1]);
}

#[test]
fn toggling_a_column_reverses_order_with_stable_ties() {
    let session = seeded();
    let mut sort = SortSpec::new("registered_at", SortDirection::Desc);
    sort.toggle("incident_type");
    assert_eq!(sort.direction, SortDirection::Asc);
    // Equal types keep ascending id order in both directions.
    assert_eq!(ids(&session, &FilterSpec::default(), &sort), vec![1, 3, 2]);

    sort.toggle("incident_type");
    assert_eq!(sort.direction, SortDirection::Desc);
    assert_eq!(ids(&session, &FilterSpec::default(), &sort), vec![2, 1, 3]);
}

#[test]
fn unknown_sort_column_is_rejected() {
    let session = seeded();
    let err = session
        .list_incidents(&FilterSpec::default(), &SortSpec::new("id; DROP", SortDirection::Asc))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.field.as_deref(), Some("sort"));
}

#[test]
fn brigade_search_and_incident_only_filters() {
    let mut session = seeded();
    for (name, spec) in [("Alpha", "Overhead lines"), ("Bravo", "Cable networks")] {
        session
            .create_brigade(NewBrigade {
                name: name.to_string(),
                specialization: Some(spec.to_string()),
                contact_info: None,
            })
            .expect("brigade");
    }
    let sort = SortSpec::default_for(EntityKind::Brigade);

    let found = session
        .list_brigades(&FilterSpec::search("Cable"), &sort)
        .expect("search");
    assert_eq!(found.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(), vec!["Bravo"]);

    let err = session
        .list_brigades(
            &FilterSpec {
                active_only: true,
                ..FilterSpec::default()
            },
            &sort,
        )
        .unwrap_err();
    assert_eq!(err.code, "QUERY_FILTER_UNSUPPORTED");
}

#[test]
fn equipment_search_columns_and_default_sort() {
    let mut session = seeded();
    let items = [
        ("Transformer T-2", "Power transformer", "SN-7", Some("Substation 7")),
        ("Breaker B-1", "Circuit breaker", "SN-8", None),
        ("Arrester A-1", "Surge arrester", "SN-9", Some("Feeder 12")),
    ];
    for (name, equipment_type, serial, location) in items {
        session
            .create_equipment(NewEquipment {
                name: name.to_string(),
                equipment_type: equipment_type.to_string(),
                serial_number: serial.to_string(),
                location: location.map(str::to_string),
                ..NewEquipment::default()
            })
            .expect("equipment");
    }
    let sort = SortSpec::default_for(EntityKind::Equipment);
    let names = |filter: &FilterSpec| {
        session
            .list_equipment(filter, &sort)
            .expect("list")
            .into_iter()
            .map(|e| e.name)
            .collect::<Vec<_>>()
    };

    assert_eq!(
        names(&FilterSpec::default()),
        vec!["Arrester A-1", "Breaker B-1", "Transformer T-2"]
    );
    assert_eq!(names(&FilterSpec::search("SN-7")), vec!["Transformer T-2"]);
    assert_eq!(names(&FilterSpec::search("Circuit")), vec!["Breaker B-1"]);
    assert_eq!(names(&FilterSpec::search("Feeder")), vec!["Arrester A-1"]);
    assert_eq!(names(&FilterSpec::search("breaker")), Vec::<String>::new());
}
