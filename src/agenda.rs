//! Per-date agenda built from tours, payment alerts and client events.

use std::fmt;

use crate::model::{ClientEventKind, Document, TourStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgendaKind {
    Tour,
    Deadline,
    Appointment,
    Note,
}

impl fmt::Display for AgendaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AgendaKind::Tour => "tour",
            AgendaKind::Deadline => "deadline",
            AgendaKind::Appointment => "appointment",
            AgendaKind::Note => "note",
        })
    }
}

impl From<&ClientEventKind> for AgendaKind {
    fn from(kind: &ClientEventKind) -> Self {
        match kind {
            ClientEventKind::Appointment => AgendaKind::Appointment,
            ClientEventKind::Deadline => AgendaKind::Deadline,
            ClientEventKind::Note | ClientEventKind::Other(_) => AgendaKind::Note,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgendaEntry {
    /// `YYYY-MM-DD`
    pub date: String,
    pub kind: AgendaKind,
    pub title: String,
    /// Set for entries that belong to a client.
    pub client_id: Option<String>,
    pub client_name: Option<String>,
}

/// Every dated item in the document, ordered by date. Entries on the same
/// date keep the order tours, then clients in roster order. Cancelled tours
/// are left out.
pub fn agenda(doc: &Document) -> Vec<AgendaEntry> {
    let mut entries = Vec::new();

    for tour in &doc.tours {
        if tour.status == TourStatus::Cancelled {
            continue;
        }
        entries.push(AgendaEntry {
            date: tour.date.clone(),
            kind: AgendaKind::Tour,
            title: format!("{} ({} stops)", tour.name, tour.stops.len()),
            client_id: None,
            client_name: None,
        });
    }

    for client in &doc.clients {
        for tx in &client.transactions {
            let Some(alert) = &tx.alert_date else {
                continue;
            };
            entries.push(AgendaEntry {
                date: alert.clone(),
                kind: AgendaKind::Deadline,
                title: format!("Due: {}", tx.description),
                client_id: Some(client.id.clone()),
                client_name: Some(client.company_name.clone()),
            });
        }

        for event in &client.events {
            entries.push(AgendaEntry {
                date: event.date.clone(),
                kind: AgendaKind::from(&event.kind),
                title: event.title.clone(),
                client_id: Some(client.id.clone()),
                client_name: Some(client.company_name.clone()),
            });
        }
    }

    // Stable, so same-date entries keep insertion order.
    entries.sort_by(|a, b| a.date.cmp(&b.date));
    entries
}

/// Agenda entries on one `YYYY-MM-DD` date.
pub fn entries_on(doc: &Document, date: &str) -> Vec<AgendaEntry> {
    agenda(doc).into_iter().filter(|e| e.date == date).collect()
}
