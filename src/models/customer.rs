// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Customer records as exchanged with the customer API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidateEmail, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::AppError;

/// A customer record owned by the external customer service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Customer {
    pub id: String,

    // Identity
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub nric: String,
    pub dob: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,

    // Address
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_continue: Option<String>,

    // Sales
    pub sales_consultant: String,
    /// Vehicle Sales Agreement number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsa_no: Option<String>,
    #[serde(default)]
    pub deal_closed: bool,

    #[serde(default)]
    pub checklist: Checklist,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Link to the customer's Google Drive folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_folder_link: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Build a new record from create input.
    pub fn from_input(id: String, input: CreateCustomerInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            phone: input.phone,
            email: input.email,
            nric: input.nric,
            dob: input.dob,
            occupation: input.occupation,
            address: input.address,
            address_continue: input.address_continue,
            sales_consultant: input.sales_consultant,
            vsa_no: input.vsa_no,
            deal_closed: input.deal_closed,
            checklist: input.checklist,
            notes: input.notes,
            drive_folder_link: input.drive_folder_link,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Fields absent from `update` are left as-is.
    pub fn apply_update(&mut self, update: &UpdateCustomerInput, now: DateTime<Utc>) {
        macro_rules! set {
            ($field:ident) => {
                if let Some(v) = &update.$field {
                    self.$field = v.clone();
                }
            };
            ($field:ident, optional) => {
                if let Some(v) = &update.$field {
                    self.$field = if v.is_empty() { None } else { Some(v.clone()) };
                }
            };
        }

        set!(name);
        set!(phone);
        set!(email, optional);
        set!(nric);
        set!(occupation, optional);
        set!(address);
        set!(address_continue, optional);
        set!(sales_consultant);
        set!(vsa_no, optional);
        set!(notes, optional);
        set!(drive_folder_link, optional);

        if let Some(dob) = update.dob {
            self.dob = dob;
        }
        if let Some(deal_closed) = update.deal_closed {
            self.deal_closed = deal_closed;
        }
        if let Some(checklist) = update.checklist {
            self.checklist = checklist;
        }

        self.updated_at = now;
    }

    /// Case-insensitive substring match across the searchable fields.
    ///
    /// `query` must already be lowercased.
    pub fn matches_search(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self.phone.contains(query)
            || self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(query))
            || self.nric.to_lowercase().contains(query)
            || self
                .vsa_no
                .as_deref()
                .is_some_and(|v| v.to_lowercase().contains(query))
    }
}

/// The five task-completion flags tracked per customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Checklist {
    #[serde(default)]
    pub nric_collected: bool,
    #[serde(default)]
    pub test_drive_completed: bool,
    #[serde(default)]
    pub vsa_signed: bool,
    #[serde(default)]
    pub trade_in_documents: bool,
    #[serde(default)]
    pub payment_received: bool,
}

impl Checklist {
    pub fn get(&self, key: ChecklistKey) -> bool {
        match key {
            ChecklistKey::NricCollected => self.nric_collected,
            ChecklistKey::TestDriveCompleted => self.test_drive_completed,
            ChecklistKey::VsaSigned => self.vsa_signed,
            ChecklistKey::TradeInDocuments => self.trade_in_documents,
            ChecklistKey::PaymentReceived => self.payment_received,
        }
    }

    /// Set one flag, leaving the other four untouched.
    pub fn set(&mut self, key: ChecklistKey, value: bool) {
        let flag = match key {
            ChecklistKey::NricCollected => &mut self.nric_collected,
            ChecklistKey::TestDriveCompleted => &mut self.test_drive_completed,
            ChecklistKey::VsaSigned => &mut self.vsa_signed,
            ChecklistKey::TradeInDocuments => &mut self.trade_in_documents,
            ChecklistKey::PaymentReceived => &mut self.payment_received,
        };
        *flag = value;
    }

    /// Copy of this checklist with one flag changed.
    pub fn with(mut self, key: ChecklistKey, value: bool) -> Self {
        self.set(key, value);
        self
    }

    /// Flags in display order.
    pub fn iter(&self) -> impl Iterator<Item = (ChecklistKey, bool)> + '_ {
        ChecklistKey::ALL.iter().map(move |&k| (k, self.get(k)))
    }

    pub fn completed(&self) -> usize {
        self.iter().filter(|(_, done)| *done).count()
    }

    pub fn is_complete(&self) -> bool {
        self.completed() == ChecklistKey::ALL.len()
    }
}

/// Identifies one checklist flag. Serialized with the API's camelCase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ChecklistKey {
    NricCollected,
    TestDriveCompleted,
    VsaSigned,
    TradeInDocuments,
    PaymentReceived,
}

impl ChecklistKey {
    pub const ALL: [ChecklistKey; 5] = [
        ChecklistKey::NricCollected,
        ChecklistKey::TestDriveCompleted,
        ChecklistKey::VsaSigned,
        ChecklistKey::TradeInDocuments,
        ChecklistKey::PaymentReceived,
    ];

    /// Wire name of the flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecklistKey::NricCollected => "nricCollected",
            ChecklistKey::TestDriveCompleted => "testDriveCompleted",
            ChecklistKey::VsaSigned => "vsaSigned",
            ChecklistKey::TradeInDocuments => "tradeInDocuments",
            ChecklistKey::PaymentReceived => "paymentReceived",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ChecklistKey::NricCollected => "NRIC Collected",
            ChecklistKey::TestDriveCompleted => "Test Drive Completed",
            ChecklistKey::VsaSigned => "VSA Signed",
            ChecklistKey::TradeInDocuments => "Trade-In Documents Received",
            ChecklistKey::PaymentReceived => "Payment Received",
        }
    }
}

impl fmt::Display for ChecklistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecklistKey {
    type Err = AppError;

    /// Accepts the wire name, case-insensitively, with or without separators
    /// (`vsaSigned`, `vsa-signed`, `vsa_signed`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        ChecklistKey::ALL
            .into_iter()
            .find(|k| k.as_str().to_lowercase() == normalized)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown checklist item: {}", s)))
    }
}

/// Aggregate counts for the consultant's customers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CustomerStats {
    pub total: u32,
    pub deals_closed: u32,
    pub deals_open: u32,
    /// Customers with every checklist item done
    #[serde(default)]
    pub checklist_complete: u32,
}

impl CustomerStats {
    pub fn from_customers<'a>(customers: impl IntoIterator<Item = &'a Customer>) -> Self {
        customers
            .into_iter()
            .fold(CustomerStats::default(), |mut stats, c| {
                stats.total += 1;
                if c.deal_closed {
                    stats.deals_closed += 1;
                } else {
                    stats.deals_open += 1;
                }
                if c.checklist.is_complete() {
                    stats.checklist_complete += 1;
                }
                stats
            })
    }
}

/// Payload for creating a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_nric"))]
    pub nric: String,
    pub dob: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_continue: Option<String>,
    #[validate(length(min = 1, message = "Sales consultant is required"))]
    pub sales_consultant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsa_no: Option<String>,
    #[serde(default)]
    pub deal_closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_folder_link: Option<String>,
    #[serde(default)]
    pub checklist: Checklist,
}

/// Partial update payload. `None` leaves a field unchanged; an empty string
/// clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_nric"))]
    pub nric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_continue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Sales consultant is required"))]
    pub sales_consultant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsa_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_closed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_folder_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<Checklist>,
}

impl UpdateCustomerInput {
    pub fn is_empty(&self) -> bool {
        *self == UpdateCustomerInput::default()
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Singapore NRIC/FIN: prefix letter, seven digits, checksum letter.
pub fn validate_nric(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let bytes = value.as_bytes();
    let valid = bytes.len() == 9
        && matches!(bytes[0].to_ascii_uppercase(), b'S' | b'T' | b'F' | b'G' | b'M')
        && bytes[1..8].iter().all(u8::is_ascii_digit)
        && bytes[8].is_ascii_alphabetic();

    if valid {
        Ok(())
    } else {
        Err(invalid("nric", "NRIC must look like S1234567A"))
    }
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));

    if value.trim().is_empty() {
        return Err(invalid("required", "Phone number is required"));
    }
    if !allowed || digits < 8 {
        return Err(invalid("phone", "Invalid phone number"));
    }
    Ok(())
}

fn validate_optional_email(value: &str) -> Result<(), ValidationError> {
    // An empty string clears the email on update
    if value.is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(invalid("email", "Invalid email address"))
    }
}
