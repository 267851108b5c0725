//! Foreground commands over the document: the only code that edits clients
//! and tours in place. Lookups never assume a referenced id is present.

use chrono::Utc;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::model::types::{
    Address, Client, Coordinate, Document, RouteStop, Tour, TourStatus, Transaction,
    TransactionKind,
};

/// Label rendered for a stop whose client no longer exists.
pub const UNKNOWN_CLIENT: &str = "unknown";

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Input of the "add client" form.
#[derive(Debug, Clone, Default)]
pub struct ClientDraft {
    pub company_name: String,
    pub first_name: String,
    pub last_name: String,
    pub vat_id: String,
    pub phone: String,
    pub whatsapp: String,
    pub email: String,
    pub website: String,
    pub address: Address,
    pub coords: Coordinate,
    pub notes: String,
}

/// Balance carried over from before the client was entered.
#[derive(Debug, Clone)]
pub struct OpeningBalance {
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
}

impl OpeningBalance {
    pub fn debit(amount: f64) -> Self {
        Self {
            kind: TransactionKind::Debit,
            amount,
            description: "Previous balance".to_string(),
        }
    }
}

impl Document {
    pub fn find_client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn find_client_mut(&mut self, id: &str) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.id == id)
    }

    pub fn find_tour(&self, id: &str) -> Option<&Tour> {
        self.tours.iter().find(|t| t.id == id)
    }

    /// Display name for a stop, or [`UNKNOWN_CLIENT`] when the client was deleted.
    pub fn stop_label(&self, stop: &RouteStop) -> &str {
        self.find_client(&stop.client_id)
            .map(|c| c.company_name.as_str())
            .unwrap_or(UNKNOWN_CLIENT)
    }

    /// Case-insensitive match on company, first or last name. An empty query
    /// matches everyone.
    pub fn search(&self, query: &str) -> Vec<&Client> {
        let q = query.trim().to_lowercase();
        self.clients
            .iter()
            .filter(|c| {
                q.is_empty()
                    || c.company_name.to_lowercase().contains(&q)
                    || c.first_name.to_lowercase().contains(&q)
                    || c.last_name.to_lowercase().contains(&q)
            })
            .collect()
    }

    /// Appends a new client built from `draft`. A positive opening balance
    /// becomes the client's first transaction, dated today.
    pub fn add_client(
        &mut self,
        draft: ClientDraft,
        opening: Option<OpeningBalance>,
    ) -> Result<&Client, ValidationError> {
        if draft.company_name.trim().is_empty() {
            return Err(ValidationError::MissingCompanyName);
        }

        let mut transactions = Vec::new();
        if let Some(opening) = opening {
            if opening.amount.is_finite() && opening.amount > 0.0 {
                transactions.push(Transaction {
                    id: new_id(),
                    date: today(),
                    kind: opening.kind,
                    amount: opening.amount,
                    description: opening.description,
                    alert_date: None,
                });
            }
        }

        self.clients.push(Client {
            id: new_id(),
            company_name: draft.company_name.trim().to_string(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            vat_id: draft.vat_id,
            phone: draft.phone,
            whatsapp: draft.whatsapp,
            email: draft.email,
            website: draft.website,
            address: draft.address,
            coords: draft.coords,
            notes: draft.notes,
            transactions,
            events: Vec::new(),
            loyalty_points: 0.0,
            last_visit: None,
            logo: None,
            rating: 0.0,
            tags: Vec::new(),
            created_at: Some(Utc::now()),
        });

        Ok(&self.clients[self.clients.len() - 1])
    }

    /// Replaces the stored client carrying the same id. Transactions are
    /// history and are kept from the stored record.
    pub fn update_client(&mut self, client: Client) -> Result<(), ValidationError> {
        if client.company_name.trim().is_empty() {
            return Err(ValidationError::MissingCompanyName);
        }
        let stored = self
            .find_client_mut(&client.id)
            .ok_or_else(|| ValidationError::UnknownClient(client.id.clone()))?;

        let transactions = std::mem::take(&mut stored.transactions);
        *stored = Client {
            transactions,
            ..client
        };
        Ok(())
    }

    /// Removes a client. Tours referencing it are left as they are.
    pub fn delete_client(&mut self, id: &str) -> Option<Client> {
        let idx = self.clients.iter().position(|c| c.id == id)?;
        Some(self.clients.remove(idx))
    }

    /// Appends a transaction to a client's history.
    pub fn add_transaction(
        &mut self,
        client_id: &str,
        kind: TransactionKind,
        amount: f64,
        description: &str,
        alert_date: Option<String>,
    ) -> Result<&Transaction, ValidationError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::InvalidAmount);
        }
        let client = self
            .find_client_mut(client_id)
            .ok_or_else(|| ValidationError::UnknownClient(client_id.to_string()))?;

        client.transactions.push(Transaction {
            id: new_id(),
            date: today(),
            kind,
            amount,
            description: description.to_string(),
            alert_date,
        });

        let last = client.transactions.len() - 1;
        Ok(&client.transactions[last])
    }

    /// Inserts a tour, or replaces the one with the same id.
    pub fn save_tour(&mut self, tour: Tour) {
        match self.tours.iter_mut().find(|t| t.id == tour.id) {
            Some(existing) => *existing = tour,
            None => self.tours.push(tour),
        }
    }

    pub fn delete_tour(&mut self, id: &str) -> Option<Tour> {
        let idx = self.tours.iter().position(|t| t.id == id)?;
        Some(self.tours.remove(idx))
    }

    pub fn set_tour_status(&mut self, id: &str, status: TourStatus) -> Result<(), ValidationError> {
        let tour = self
            .tours
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownTour(id.to_string()))?;
        tour.status = status;
        Ok(())
    }
}
