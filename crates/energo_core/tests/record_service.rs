use energo_core::domain::{
    BrigadePatch, DeleteConfirmation, EquipmentPatch, IncidentPatch, NewBrigade, NewEquipment,
    NewIncident,
};
use energo_core::error::ErrorKind;
use energo_core::query::{EntityKind, FilterSpec, SortSpec};
use energo_core::timestamps::FixedClock;
use energo_core::Session;
use pretty_assertions::assert_eq;

fn session() -> Session {
    let clock = FixedClock::parse("2024-05-10 12:00:00").expect("clock");
    Session::in_memory(Box::new(clock)).expect("session")
}

fn brigade(name: &str) -> NewBrigade {
    NewBrigade {
        name: name.to_string(),
        specialization: Some("Overhead lines".to_string()),
        contact_info: None,
    }
}

fn transformer(serial: &str) -> NewEquipment {
    NewEquipment {
        name: "Transformer T-1".to_string(),
        equipment_type: "Power transformer".to_string(),
        model: Some("TMG-630".to_string()),
        serial_number: serial.to_string(),
        installation_date: Some("2019-04-15".to_string()),
        status: Some("In service".to_string()),
        last_maintenance_date: None,
        location: Some("Substation 7".to_string()),
    }
}

#[test]
fn create_incident_requires_mandatory_fields_and_writes_nothing() {
    let mut session = session();
    let err = session
        .create_incident(NewIncident {
            incident_type: "Line break".to_string(),
            description: "   ".to_string(),
            location: "Feeder 3".to_string(),
            ..NewIncident::default()
        })
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.field.as_deref(), Some("description"));
    assert_eq!(session.count(EntityKind::Incident).expect("count"), 0);
}

#[test]
fn create_incident_trims_and_drops_blank_optionals() {
    let mut session = session();
    let inc = session
        .create_incident(NewIncident {
            incident_type: "  Voltage sag ".to_string(),
            description: "Dip on bus 2".to_string(),
            location: "RP-1".to_string(),
            affected_consumers: Some("  ".to_string()),
            assigned_brigade: Some(" Bravo ".to_string()),
        })
        .expect("create");

    assert_eq!(inc.incident_type, "Voltage sag");
    assert_eq!(inc.affected_consumers, None);
    assert_eq!(inc.assigned_brigade.as_deref(), Some("Bravo"));
}

#[test]
fn duplicate_brigade_name_is_constraint_violation_and_leaves_rows_unchanged() {
    let mut session = session();
    session.create_brigade(brigade("Alpha")).expect("first");

    let err = session.create_brigade(brigade("Alpha")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConstraintViolation);
    assert_eq!(err.field.as_deref(), Some("name"));

    let all = session
        .list_brigades(&FilterSpec::default(), &SortSpec::default_for(EntityKind::Brigade))
        .expect("list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Alpha");
}

#[test]
fn renaming_brigade_onto_existing_name_is_rejected() {
    let mut session = session();
    session.create_brigade(brigade("Alpha")).expect("alpha");
    let bravo = session.create_brigade(brigade("Bravo")).expect("bravo");

    let err = session
        .update_brigade(
            bravo.id,
            BrigadePatch {
                name: Some("Alpha".to_string()),
                ..BrigadePatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConstraintViolation);
    assert_eq!(session.get_brigade(bravo.id).expect("get"), bravo);
}

#[test]
fn duplicate_serial_number_is_constraint_violation() {
    let mut session = session();
    let first = session.create_equipment(transformer("SN-1")).expect("first");

    let err = session.create_equipment(transformer("SN-1")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConstraintViolation);
    assert_eq!(err.field.as_deref(), Some("serial_number"));
    assert_eq!(session.count(EntityKind::Equipment).expect("count"), 1);
    assert_eq!(session.get_equipment(first.id).expect("get"), first);
}

#[test]
fn equipment_requires_type_and_valid_dates() {
    let mut session = session();

    let mut missing_type = transformer("SN-2");
    missing_type.equipment_type = String::new();
    let err = session.create_equipment(missing_type).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.field.as_deref(), Some("type"));

    let mut bad_date = transformer("SN-3");
    bad_date.installation_date = Some("2019-13-40".to_string());
    let err = session.create_equipment(bad_date).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.field.as_deref(), Some("installation_date"));

    assert_eq!(session.count(EntityKind::Equipment).expect("count"), 0);
}

#[test]
fn equipment_patch_clears_optional_fields_and_keeps_the_rest() {
    let mut session = session();
    let eq = session.create_equipment(transformer("SN-4")).expect("create");

    let updated = session
        .update_equipment(
            eq.id,
            EquipmentPatch {
                model: Some(String::new()),
                installation_date: Some(String::new()),
                last_maintenance_date: Some("2024-02-29".to_string()),
                ..EquipmentPatch::default()
            },
        )
        .expect("update");

    assert_eq!(updated.model, None);
    assert_eq!(updated.installation_date, None);
    assert_eq!(updated.last_maintenance_date.as_deref(), Some("2024-02-29"));
    assert_eq!(updated.serial_number, "SN-4");
    assert_eq!(updated.location.as_deref(), Some("Substation 7"));
}

#[test]
fn patch_cannot_blank_a_mandatory_field() {
    let mut session = session();
    let inc = session
        .create_incident(NewIncident {
            incident_type: "Line break".to_string(),
            description: "Down".to_string(),
            location: "Feeder 3".to_string(),
            ..NewIncident::default()
        })
        .expect("create");

    let err = session
        .update_incident(
            inc.id,
            IncidentPatch {
                location: Some(" ".to_string()),
                ..IncidentPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.field.as_deref(), Some("location"));
    assert_eq!(session.get_incident(inc.id).expect("get"), inc);
}

#[test]
fn missing_ids_are_not_found_and_change_nothing() {
    let mut session = session();
    session.create_brigade(brigade("Alpha")).expect("alpha");

    let err = session
        .delete_brigade(999, DeleteConfirmation::confirmed())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(session.count(EntityKind::Brigade).expect("count"), 1);

    assert!(session.get_incident(7).unwrap_err().is_not_found());
    assert!(session
        .update_equipment(7, EquipmentPatch::default())
        .unwrap_err()
        .is_not_found());
    session
        .create_incident(NewIncident {
            incident_type: "Line break".to_string(),
            description: "Down".to_string(),
            location: "Feeder 3".to_string(),
            ..NewIncident::default()
        })
        .expect("create");
    let err = session
        .delete_incident(7, DeleteConfirmation::confirmed())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(session.count(EntityKind::Incident).expect("count"), 1);
}

#[test]
fn confirmed_delete_removes_the_record() {
    let mut session = session();
    let eq = session.create_equipment(transformer("SN-5")).expect("create");
    session
        .delete_equipment(eq.id, DeleteConfirmation::confirmed())
        .expect("delete");
    assert!(session.get_equipment(eq.id).unwrap_err().is_not_found());
    assert_eq!(session.count(EntityKind::Equipment).expect("count"), 0);
}

#[test]
fn distinct_types_are_sorted_and_unique() {
    let mut session = session();
    for t in ["Voltage sag", "Line break", "Voltage sag"] {
        session
            .create_incident(NewIncident {
                incident_type: t.to_string(),
                description: "d".to_string(),
                location: "l".to_string(),
                ..NewIncident::default()
            })
            .expect("create");
    }
    assert_eq!(
        session.list_distinct_incident_types().expect("types"),
        vec!["Line break".to_string(), "Voltage sag".to_string()]
    );
}

#[test]
fn brigade_rename_and_delete_leave_incident_labels_alone() {
    let mut session = session();
    let alpha = session.create_brigade(brigade("Alpha")).expect("brigade");
    let inc = session
        .create_incident(NewIncident {
            incident_type: "Line break".to_string(),
            description: "Down".to_string(),
            location: "Feeder 3".to_string(),
            assigned_brigade: Some("Alpha".to_string()),
            ..NewIncident::default()
        })
        .expect("incident");

    session
        .update_brigade(
            alpha.id,
            BrigadePatch {
                name: Some("Alpha-2".to_string()),
                ..BrigadePatch::default()
            },
        )
        .expect("rename");
    assert_eq!(
        session.get_incident(inc.id).expect("get").assigned_brigade.as_deref(),
        Some("Alpha")
    );

    session
        .delete_brigade(alpha.id, DeleteConfirmation::confirmed())
        .expect("delete");
    assert_eq!(session.get_incident(inc.id).expect("get"), inc);
}
