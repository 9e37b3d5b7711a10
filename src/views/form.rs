// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Create/edit customer form state.
//!
//! Field values are kept as entered and converted to API inputs on submit.
//! Editing a field clears its error. Create submits the checklist; edit
//! submits the field values only, leaving the stored checklist alone.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, Result};
use crate::models::{Checklist, ChecklistKey, CreateCustomerInput, Customer, UpdateCustomerInput};
use crate::queries::CustomerQueries;
use crate::time_utils::parse_form_date;
use crate::views::components::{Input, InputType, Textarea};

/// Error key for failures not tied to a field.
pub const SUBMIT_ERROR_KEY: &str = "submit";
pub const SUBMIT_ERROR_MESSAGE: &str = "Failed to save customer. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { customer_id: String },
}

/// Raw form values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFormData {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub nric: String,
    /// As typed; parsed on submit
    pub dob: String,
    pub occupation: String,
    pub address: String,
    pub address_continue: String,
    pub sales_consultant: String,
    pub vsa_no: String,
    pub deal_closed: bool,
    pub notes: String,
}

impl CustomerFormData {
    fn from_customer(c: &Customer) -> Self {
        Self {
            name: c.name.clone(),
            phone: c.phone.clone(),
            email: c.email.clone().unwrap_or_default(),
            nric: c.nric.clone(),
            dob: c.dob.format("%Y-%m-%d").to_string(),
            occupation: c.occupation.clone().unwrap_or_default(),
            address: c.address.clone(),
            address_continue: c.address_continue.clone().unwrap_or_default(),
            sales_consultant: c.sales_consultant.clone(),
            vsa_no: c.vsa_no.clone().unwrap_or_default(),
            deal_closed: c.deal_closed,
            notes: c.notes.clone().unwrap_or_default(),
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        Some(match name {
            "name" => &mut self.name,
            "phone" => &mut self.phone,
            "email" => &mut self.email,
            "nric" => &mut self.nric,
            "dob" => &mut self.dob,
            "occupation" => &mut self.occupation,
            "address" => &mut self.address,
            "addressContinue" => &mut self.address_continue,
            "salesConsultant" => &mut self.sales_consultant,
            "vsaNo" => &mut self.vsa_no,
            "notes" => &mut self.notes,
            _ => return None,
        })
    }
}

fn blank_to_none(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Map validator's snake_case field names onto form field names.
fn form_field_name(field: &str) -> &str {
    match field {
        "address_continue" => "addressContinue",
        "sales_consultant" => "salesConsultant",
        "vsa_no" => "vsaNo",
        other => other,
    }
}

/// Field name (camelCase) to message.
pub type FieldErrors = BTreeMap<String, String>;

fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .iter()
        .filter_map(|(field, errs)| {
            let first = errs.first()?;
            let message = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid {}", field));
            Some((form_field_name(field).to_string(), message))
        })
        .collect()
}

/// Form state for creating or editing a customer.
#[derive(Debug, Clone)]
pub struct CustomerForm {
    pub mode: FormMode,
    pub data: CustomerFormData,
    pub checklist: Checklist,
    pub errors: FieldErrors,
    pub show_checklist: bool,
    pub submitting: bool,
}

impl CustomerForm {
    /// Empty form with an all-false checklist.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            data: CustomerFormData::default(),
            checklist: Checklist::default(),
            errors: BTreeMap::new(),
            show_checklist: false,
            submitting: false,
        }
    }

    /// Form pre-filled from an existing record.
    pub fn edit(customer: &Customer) -> Self {
        Self {
            mode: FormMode::Edit {
                customer_id: customer.id.clone(),
            },
            data: CustomerFormData::from_customer(customer),
            checklist: customer.checklist,
            errors: BTreeMap::new(),
            show_checklist: false,
            submitting: false,
        }
    }

    /// Set a text field by its form name and clear that field's error.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let slot = self
            .data
            .field_mut(name)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown form field: {}", name)))?;
        *slot = value.into();
        self.errors.remove(name);
        Ok(())
    }

    pub fn set_deal_closed(&mut self, closed: bool) {
        self.data.deal_closed = closed;
        self.errors.remove("dealClosed");
    }

    pub fn set_checklist(&mut self, key: ChecklistKey, checked: bool) {
        self.checklist.set(key, checked);
    }

    pub fn toggle_checklist_section(&mut self) {
        self.show_checklist = !self.show_checklist;
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    fn parse_dob(&self) -> std::result::Result<chrono::NaiveDate, FieldErrors> {
        parse_form_date(&self.data.dob).ok_or_else(|| {
            BTreeMap::from([(
                "dob".to_string(),
                "Enter the date of birth as YYYY-MM-DD".to_string(),
            )])
        })
    }

    /// Build and validate the create payload.
    pub fn create_input(&self) -> std::result::Result<CreateCustomerInput, FieldErrors> {
        let dob = self.parse_dob();
        let d = &self.data;

        let input = CreateCustomerInput {
            name: d.name.trim().to_string(),
            phone: d.phone.trim().to_string(),
            email: blank_to_none(&d.email),
            nric: d.nric.trim().to_uppercase(),
            dob: dob.clone().unwrap_or_default(),
            occupation: blank_to_none(&d.occupation),
            address: d.address.trim().to_string(),
            address_continue: blank_to_none(&d.address_continue),
            sales_consultant: d.sales_consultant.trim().to_string(),
            vsa_no: blank_to_none(&d.vsa_no),
            deal_closed: d.deal_closed,
            notes: blank_to_none(&d.notes),
            drive_folder_link: None,
            checklist: self.checklist,
        };

        let mut errors = input.validate().err().map(|e| field_errors(&e)).unwrap_or_default();
        if let Err(dob_errors) = dob {
            errors.extend(dob_errors);
        }

        if errors.is_empty() {
            Ok(input)
        } else {
            Err(errors)
        }
    }

    /// Build and validate the update payload: every field, no checklist.
    pub fn update_input(&self) -> std::result::Result<UpdateCustomerInput, FieldErrors> {
        let dob = self.parse_dob();
        let d = &self.data;

        let input = UpdateCustomerInput {
            name: Some(d.name.trim().to_string()),
            phone: Some(d.phone.trim().to_string()),
            email: Some(d.email.trim().to_string()),
            nric: Some(d.nric.trim().to_uppercase()),
            dob: dob.clone().ok(),
            occupation: Some(d.occupation.trim().to_string()),
            address: Some(d.address.trim().to_string()),
            address_continue: Some(d.address_continue.trim().to_string()),
            sales_consultant: Some(d.sales_consultant.trim().to_string()),
            vsa_no: Some(d.vsa_no.trim().to_string()),
            deal_closed: Some(d.deal_closed),
            notes: Some(d.notes.trim().to_string()),
            drive_folder_link: None,
            checklist: None,
        };

        let mut errors = input.validate().err().map(|e| field_errors(&e)).unwrap_or_default();
        if let Err(dob_errors) = dob {
            errors.extend(dob_errors);
        }

        if errors.is_empty() {
            Ok(input)
        } else {
            Err(errors)
        }
    }

    /// Validate and save.
    ///
    /// Field problems are recorded per field; a failed save records
    /// [`SUBMIT_ERROR_MESSAGE`] under [`SUBMIT_ERROR_KEY`].
    pub async fn submit(&mut self, queries: &CustomerQueries) -> Result<Customer> {
        self.errors.clear();

        let mode = self.mode.clone();
        let saved = match &mode {
            FormMode::Create => match self.create_input() {
                Ok(input) => {
                    self.submitting = true;
                    queries.create_customer(&input).await
                }
                Err(errors) => return Err(self.reject(errors)),
            },
            FormMode::Edit { customer_id } => match self.update_input() {
                Ok(input) => {
                    self.submitting = true;
                    queries.update_customer(customer_id, &input).await
                }
                Err(errors) => return Err(self.reject(errors)),
            },
        };
        self.submitting = false;

        saved.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to save customer");
            self.errors
                .insert(SUBMIT_ERROR_KEY.to_string(), SUBMIT_ERROR_MESSAGE.to_string());
        })
    }

    fn reject(&mut self, errors: FieldErrors) -> AppError {
        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        let err = AppError::BadRequest(format!("invalid fields: {}", fields.join(", ")));
        self.errors = errors;
        err
    }

    pub fn submit_label(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Create Customer",
            FormMode::Edit { .. } => "Save Changes",
        }
    }

    pub fn render(&self) -> String {
        let d = &self.data;
        let busy = self.submitting;
        let mut out = String::new();

        let _ = writeln!(out, "Personal Information");
        let fields = [
            Input::new("Full Name", &d.name).required(true).error(self.error("name")),
            Input::new("Phone Number", &d.phone)
                .input_type(InputType::Tel)
                .required(true)
                .error(self.error("phone")),
            Input::new("Email Address", &d.email)
                .input_type(InputType::Email)
                .error(self.error("email")),
            Input::new("NRIC", &d.nric)
                .required(true)
                .helper_text("Format: S1234567A")
                .error(self.error("nric")),
            Input::new("Date of Birth", &d.dob)
                .input_type(InputType::Date)
                .required(true)
                .error(self.error("dob")),
            Input::new("Occupation", &d.occupation).error(self.error("occupation")),
        ];
        for field in fields {
            let _ = writeln!(out, "{}", field.disabled(busy).render());
        }

        let _ = writeln!(out, "\nAddress");
        let fields = [
            Input::new("Address Line 1", &d.address)
                .required(true)
                .error(self.error("address")),
            Input::new("Address Line 2", &d.address_continue).error(self.error("addressContinue")),
        ];
        for field in fields {
            let _ = writeln!(out, "{}", field.disabled(busy).render());
        }

        let _ = writeln!(out, "\nSales Information");
        let fields = [
            Input::new("Sales Consultant", &d.sales_consultant)
                .required(true)
                .error(self.error("salesConsultant")),
            Input::new("VSA Number", &d.vsa_no)
                .helper_text("Vehicle Sales Agreement number")
                .error(self.error("vsaNo")),
        ];
        for field in fields {
            let _ = writeln!(out, "{}", field.disabled(busy).render());
        }
        let _ = writeln!(out, "[{}] Deal Closed", if d.deal_closed { "x" } else { " " });

        let toggle = if self.show_checklist { "Hide" } else { "Show" };
        let _ = writeln!(out, "\nChecklist ({})", toggle);
        if self.show_checklist {
            for (key, done) in self.checklist.iter() {
                let _ = writeln!(out, "  [{}] {}", if done { "x" } else { " " }, key.label());
            }
        }

        let _ = writeln!(
            out,
            "\n{}",
            Textarea::new("Notes", &d.notes)
                .rows(4)
                .disabled(busy)
                .helper_text("Visible to you only")
                .error(self.error("notes"))
                .render()
        );

        if let Some(submit_error) = self.error(SUBMIT_ERROR_KEY) {
            let _ = writeln!(out, "\n{}", submit_error);
        }

        let _ = write!(out, "\n[ Cancel ]  [ {} ]", self.submit_label());
        out
    }
}
