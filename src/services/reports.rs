use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::database::models::event::Event;

/// Roster rows fed into the report builders.
pub struct TeacherRow {
    pub name: String,
}

pub struct ParticipantRow {
    pub name: String,
    pub attended: Option<bool>,
}

fn attendance_counts(participants: &[ParticipantRow]) -> (usize, usize, usize) {
    let present = participants
        .iter()
        .filter(|p| p.attended == Some(true))
        .count();
    let absent = participants
        .iter()
        .filter(|p| p.attended == Some(false))
        .count();
    let unmarked = participants.len() - present - absent;
    (present, absent, unmarked)
}

/// Event report: metadata, staff roster, participation summary.
pub fn build_event_report(
    event: &Event,
    teachers: &[TeacherRow],
    participants: &[ParticipantRow],
) -> String {
    let (present, absent, unmarked) = attendance_counts(participants);

    let mut output = String::new();
    let _ = writeln!(output, "# Event Report: {}", event.title);
    let _ = writeln!(output);
    let _ = writeln!(output, "- Status: {}", event.status);
    let _ = writeln!(
        output,
        "- Schedule: {} to {}",
        event.starts_at.format("%Y-%m-%d %H:%M"),
        event.ends_at.format("%Y-%m-%d %H:%M")
    );
    if !event.description.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", event.description);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Staff");
    if teachers.is_empty() {
        let _ = writeln!(output, "No teachers assigned.");
    } else {
        for teacher in teachers {
            let _ = writeln!(output, "- {}", teacher.name);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Participation");
    let _ = writeln!(
        output,
        "{} volunteers enrolled: {} present, {} absent, {} unmarked.",
        participants.len(),
        present,
        absent,
        unmarked
    );

    output
}

/// Attendance sheet: one line per enrolled volunteer.
pub fn build_attendance_sheet(event: &Event, participants: &[ParticipantRow]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Attendance Sheet: {}", event.title);
    let _ = writeln!(
        output,
        "Event on {} ({})",
        event.starts_at.format("%Y-%m-%d"),
        event.status
    );
    let _ = writeln!(output);

    if participants.is_empty() {
        let _ = writeln!(output, "No volunteers enrolled.");
        return output;
    }

    for participant in participants {
        let mark = match participant.attended {
            Some(true) => "present",
            Some(false) => "absent",
            None => "unmarked",
        };
        let _ = writeln!(output, "- {}: {}", participant.name, mark);
    }

    output
}

/// Participation certificate for a volunteer whose attendance was marked
/// present.
pub fn build_certificate(
    student_name: &str,
    event: &Event,
    issued_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Certificate of Participation");
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "This certifies that **{}** participated in the National Service Scheme event \"{}\" held on {}.",
        student_name,
        event.title,
        event.starts_at.format("%Y-%m-%d")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Issued on {}.", issued_at.format("%Y-%m-%d"));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn sample_event() -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Blood Donation Camp".to_string(),
            description: "Annual camp with the district hospital.".to_string(),
            institution_id: Uuid::new_v4(),
            status: "Completed".to_string(),
            starts_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2026, 3, 14, 16, 0, 0).unwrap(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn event_report_counts_attendance() {
        let event = sample_event();
        let teachers = vec![TeacherRow {
            name: "Arun Pillai".to_string(),
        }];
        let participants = vec![
            ParticipantRow {
                name: "Divya Menon".to_string(),
                attended: Some(true),
            },
            ParticipantRow {
                name: "Rahul Varma".to_string(),
                attended: Some(false),
            },
            ParticipantRow {
                name: "Asha Kumar".to_string(),
                attended: None,
            },
        ];

        let report = build_event_report(&event, &teachers, &participants);
        assert!(report.contains("# Event Report: Blood Donation Camp"));
        assert!(report.contains("- Arun Pillai"));
        assert!(report.contains("3 volunteers enrolled: 1 present, 1 absent, 1 unmarked."));
    }

    #[test]
    fn attendance_sheet_lists_every_participant() {
        let event = sample_event();
        let participants = vec![
            ParticipantRow {
                name: "Divya Menon".to_string(),
                attended: Some(true),
            },
            ParticipantRow {
                name: "Rahul Varma".to_string(),
                attended: None,
            },
        ];

        let sheet = build_attendance_sheet(&event, &participants);
        assert!(sheet.contains("- Divya Menon: present"));
        assert!(sheet.contains("- Rahul Varma: unmarked"));
    }

    #[test]
    fn attendance_sheet_handles_empty_roster() {
        let event = sample_event();
        let sheet = build_attendance_sheet(&event, &[]);
        assert!(sheet.contains("No volunteers enrolled."));
    }

    #[test]
    fn certificate_names_student_and_event() {
        let event = sample_event();
        let issued = Utc.with_ymd_and_hms(2026, 3, 20, 0, 0, 0).unwrap();
        let cert = build_certificate("Divya Menon", &event, issued);
        assert!(cert.contains("**Divya Menon**"));
        assert!(cert.contains("Blood Donation Camp"));
        assert!(cert.contains("2026-03-14"));
        assert!(cert.contains("Issued on 2026-03-20."));
    }
}
