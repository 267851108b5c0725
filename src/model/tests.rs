#![cfg(test)]
use crate::error::ValidationError;
use crate::model::{
    ClientDraft, ClientEventKind, Coordinate, Document, OpeningBalance, RouteStop, Tour,
    TourStatus, TransactionKind, UNKNOWN_CLIENT,
};

// =========================================================================
// Helpers
// =========================================================================

fn draft(name: &str) -> ClientDraft {
    ClientDraft {
        company_name: name.to_string(),
        coords: Coordinate::new(41.9, 12.5),
        ..ClientDraft::default()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[test]
fn add_client_requires_company_name() {
    let mut doc = Document::default();
    let err = doc.add_client(draft("   "), None).unwrap_err();
    assert_eq!(err, ValidationError::MissingCompanyName);
    assert!(doc.clients.is_empty(), "no state change on validation error");
}

#[test]
fn opening_balance_becomes_first_transaction() {
    let mut doc = Document::default();
    let client = doc
        .add_client(draft("Salone Bella"), Some(OpeningBalance::debit(120.0)))
        .unwrap();

    assert_eq!(client.transactions.len(), 1);
    assert_eq!(client.transactions[0].kind, TransactionKind::Debit);
    assert_eq!(client.balance(), 120.0);
    assert!(client.created_at.is_some());
}

#[test]
fn zero_opening_balance_is_ignored() {
    let mut doc = Document::default();
    let client = doc
        .add_client(draft("Salone Bella"), Some(OpeningBalance::debit(0.0)))
        .unwrap();
    assert!(client.transactions.is_empty());
}

#[test]
fn credits_reduce_balance() {
    let mut doc = Document::default();
    let id = doc
        .add_client(draft("Salone Bella"), Some(OpeningBalance::debit(100.0)))
        .unwrap()
        .id
        .clone();

    doc.add_transaction(&id, TransactionKind::Credit, 40.0, "cash", None)
        .unwrap();

    let client = doc.find_client(&id).unwrap();
    assert_eq!(client.transactions.len(), 2);
    assert_eq!(client.balance(), 60.0);
}

#[test]
fn transaction_rejects_non_positive_amount() {
    let mut doc = Document::default();
    let id = doc.add_client(draft("A"), None).unwrap().id.clone();
    assert_eq!(
        doc.add_transaction(&id, TransactionKind::Debit, -5.0, "", None)
            .unwrap_err(),
        ValidationError::InvalidAmount
    );
}

#[test]
fn update_client_keeps_transaction_history() {
    let mut doc = Document::default();
    let id = doc
        .add_client(draft("Old Name"), Some(OpeningBalance::debit(10.0)))
        .unwrap()
        .id
        .clone();

    let mut edited = doc.find_client(&id).unwrap().clone();
    edited.company_name = "New Name".to_string();
    edited.transactions.clear();
    doc.update_client(edited).unwrap();

    let stored = doc.find_client(&id).unwrap();
    assert_eq!(stored.company_name, "New Name");
    assert_eq!(stored.transactions.len(), 1);
}

#[test]
fn deleting_client_leaves_dangling_stop_as_unknown() {
    let mut doc = Document::default();
    let id = doc.add_client(draft("Gone"), None).unwrap().id.clone();
    doc.save_tour(Tour {
        id: "t1".to_string(),
        name: "Monday".to_string(),
        date: "2026-10-19".to_string(),
        stops: vec![RouteStop {
            client_id: id.clone(),
            time: "09:00".to_string(),
        }],
        status: TourStatus::Planned,
    });

    assert!(doc.delete_client(&id).is_some());
    assert_eq!(doc.tours.len(), 1, "no cascade into tours");
    assert_eq!(doc.stop_label(&doc.tours[0].stops[0]), UNKNOWN_CLIENT);
}

#[test]
fn search_matches_company_and_contact_names() {
    let mut doc = Document::default();
    doc.add_client(
        ClientDraft {
            company_name: "Hair Studio".to_string(),
            first_name: "Maria".to_string(),
            ..ClientDraft::default()
        },
        None,
    )
    .unwrap();
    doc.add_client(draft("Barber Shop"), None).unwrap();

    assert_eq!(doc.search("studio").len(), 1);
    assert_eq!(doc.search("MARIA").len(), 1);
    assert_eq!(doc.search("").len(), 2);
    assert!(doc.search("nobody").is_empty());
}

#[test]
fn document_ignores_unknown_fields() {
    let json = r#"{
        "clients": [{"id": "c1", "companyName": "X", "coords": {"lat": 1.0, "lng": 2.0}, "legacy": true}],
        "tours": [],
        "settings": {"theme": "dark"}
    }"#;
    let doc: Document = serde_json::from_str(json).unwrap();
    assert_eq!(doc.clients.len(), 1);
    assert_eq!(doc.clients[0].coords, Coordinate::new(1.0, 2.0));
}

#[test]
fn unfamiliar_values_do_not_reject_the_document() {
    let json = r#"{
        "clients": [{
            "id": "c1",
            "companyName": "X",
            "coords": {"lat": 1.0, "lng": 2.0},
            "rating": 4.5,
            "loyaltyPoints": 12.5,
            "createdAt": 1735689600000,
            "events": [
                {"id": "e1", "date": "2026-03-02", "type": "visit", "title": "Walk-in"},
                {"id": "e2", "date": "2026-03-03", "type": "deadline"}
            ]
        }, {
            "id": "c2",
            "companyName": "Y",
            "coords": {"lat": 0.0, "lng": 0.0},
            "createdAt": "yesterday"
        }],
        "tours": [{"id": "t1", "name": "T", "date": "2026-03-02", "stops": [], "status": "in_progress"}]
    }"#;
    let doc: Document = serde_json::from_str(json).unwrap();

    let c1 = &doc.clients[0];
    assert_eq!(c1.rating, 4.5);
    assert_eq!(c1.loyalty_points, 12.5);
    assert_eq!(
        c1.created_at.map(|t| t.timestamp_millis()),
        Some(1_735_689_600_000)
    );
    assert_eq!(c1.events[0].kind, ClientEventKind::Other("visit".to_string()));
    assert_eq!(c1.events[1].kind, ClientEventKind::Deadline);
    assert_eq!(doc.clients[1].created_at, None);
    assert_eq!(doc.tours[0].status, TourStatus::Other("in_progress".to_string()));
}

#[test]
fn unfamiliar_tags_are_written_back_unchanged() {
    let json = r#"{
        "clients": [{
            "id": "c1",
            "companyName": "X",
            "coords": {"lat": 1.0, "lng": 2.0},
            "createdAt": "2025-01-01T00:00:00Z",
            "events": [{"id": "e1", "date": "2026-03-02", "type": "visit"}]
        }],
        "tours": [{"id": "t1", "name": "T", "date": "2026-03-02", "stops": [], "status": "in_progress"}]
    }"#;
    let doc: Document = serde_json::from_str(json).unwrap();
    let out = serde_json::to_value(&doc).unwrap();

    assert_eq!(out["tours"][0]["status"], "in_progress");
    assert_eq!(out["clients"][0]["events"][0]["type"], "visit");
    assert_eq!(serde_json::to_value(TourStatus::Cancelled).unwrap(), "cancelled");

    let again: Document = serde_json::from_value(out).unwrap();
    assert_eq!(again, doc);
}

#[test]
fn transaction_kind_uses_wire_tags() {
    let json = serde_json::to_string(&TransactionKind::Credit).unwrap();
    assert_eq!(json, "\"avere\"");
}

#[test]
fn set_status_on_missing_tour_fails() {
    let mut doc = Document::default();
    assert_eq!(
        doc.set_tour_status("nope", TourStatus::Completed).unwrap_err(),
        ValidationError::UnknownTour("nope".to_string())
    );
}
