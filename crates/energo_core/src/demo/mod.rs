use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::domain::{IncidentStatus, NewBrigade, NewEquipment, NewIncident};
use crate::error::AppError;
use crate::query::EntityKind;
use crate::records;
use crate::repo::count_rows;
use crate::timestamps::{parse_timestamp, FixedClock};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemoSeedSummary {
    pub brigades: i64,
    pub equipment: i64,
    pub incidents: i64,
    pub resolved: i64,
}

const BRIGADES: [(&str, &str, &str); 4] = [
    ("Alpha", "Overhead lines", "+7 900 000-01-01"),
    ("Bravo", "Cable networks", "+7 900 000-02-02"),
    ("Delta", "Substations", "+7 900 000-03-03"),
    ("Echo", "Metering", "+7 900 000-04-04"),
];

const INCIDENT_TYPES: [&str; 4] = ["Line break", "Transformer fault", "Voltage sag", "Meter failure"];
const LOCATIONS: [&str; 5] = [
    "Substation 7",
    "Feeder 12, pole 40",
    "Industrial park TP-3",
    "Riverside district",
    "Central RP-1",
];

/// Seed a deterministic dataset large enough to make lists and reports meaningful.
///
/// Registration times are spread over January 2026, half a day apart; every
/// third incident is resolved and every third-plus-one is left in progress.
/// Only an empty workspace is seeded; anything else is refused before the first insert.
pub fn seed_demo_dataset(conn: &mut Connection) -> Result<DemoSeedSummary, AppError> {
    for kind in [EntityKind::Incident, EntityKind::Brigade, EntityKind::Equipment] {
        let existing = count_rows(conn, kind)?;
        if existing > 0 {
            return Err(AppError::validation(
                "DEMO_WORKSPACE_NOT_EMPTY",
                "Demo data can only be seeded into an empty workspace",
            )
            .with_details(format!("{}={existing}", kind.table())));
        }
    }

    let base = parse_timestamp("2026-01-01 08:00:00")?;
    let clock = FixedClock::new(base);

    for (name, specialization, contact) in BRIGADES {
        records::create_brigade(
            conn,
            NewBrigade {
                name: name.to_string(),
                specialization: Some(specialization.to_string()),
                contact_info: Some(contact.to_string()),
            },
        )?;
    }

    let mut equipment = 0;
    for i in 1..=6 {
        records::create_equipment(
            conn,
            NewEquipment {
                name: format!("Transformer T-{i}"),
                equipment_type: "Power transformer".to_string(),
                model: Some("TMG-630".to_string()),
                serial_number: format!("SN-2019-{i:04}"),
                installation_date: Some(format!("2019-0{}-15", 1 + i % 9)),
                status: Some(if i % 4 == 0 { "Under repair" } else { "In service" }.to_string()),
                last_maintenance_date: Some(format!("2025-1{}-01", i % 3)),
                location: Some(LOCATIONS[(i - 1) % LOCATIONS.len()].to_string()),
            },
        )?;
        equipment += 1;
    }

    let mut incidents = 0;
    let mut resolved = 0;
    for i in 0..24usize {
        let incident = records::create_incident(
            conn,
            &clock,
            NewIncident {
                incident_type: INCIDENT_TYPES[i % INCIDENT_TYPES.len()].to_string(),
                description: format!("Demo incident {}", i + 1),
                location: LOCATIONS[i % LOCATIONS.len()].to_string(),
                affected_consumers: Some(format!("{} households", 50 * (i + 1))),
                assigned_brigade: (i % 5 != 4).then(|| BRIGADES[i % BRIGADES.len()].0.to_string()),
            },
        )?;
        incidents += 1;

        match i % 3 {
            0 => {
                clock.advance(Duration::hours(2 + (i as i64 % 7)));
                records::transition_incident_status(
                    conn,
                    &clock,
                    incident.id,
                    IncidentStatus::Resolved,
                )?;
                resolved += 1;
            }
            1 => {
                records::transition_incident_status(
                    conn,
                    &clock,
                    incident.id,
                    IncidentStatus::InProgress,
                )?;
            }
            _ => {}
        }

        clock.set(base + Duration::hours(12 * (i as i64 + 1)));
    }

    Ok(DemoSeedSummary {
        brigades: BRIGADES.len() as i64,
        equipment,
        incidents,
        resolved,
    })
}
