use std::{fmt, sync::Arc};

use shared::{
    domain::{SpyCat, SpyCatCreate},
    error::ServiceError,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    api::SpyCatApi,
    events::{EventSink, Notice},
    store::RefreshHandle,
};

pub const CREATED_NOTICE: &str = "Spy cat added successfully!";
const MIN_SALARY: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Breed,
    YearsOfExperience,
    Salary,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Name => "name",
            Self::Breed => "breed",
            Self::YearsOfExperience => "years_of_experience",
            Self::Salary => "salary",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_field_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, field: FormField) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

fn render_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raw text as typed into the creation modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationForm {
    pub name: String,
    pub breed: String,
    pub years_of_experience: String,
    pub salary: String,
}

impl CreationForm {
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Name => self.name = value,
            FormField::Breed => self.breed = value,
            FormField::YearsOfExperience => self.years_of_experience = value,
            FormField::Salary => self.salary = value,
        }
    }

    /// Checks every field and produces the payload only when all pass.
    pub fn validate(&self) -> Result<SpyCatCreate, ValidationErrors> {
        let mut errors = Vec::new();
        let mut reject = |field, message: &str| {
            errors.push(FieldError {
                field,
                message: message.to_string(),
            })
        };

        let name = self.name.trim();
        if name.is_empty() {
            reject(FormField::Name, "Name is required");
        }

        let breed = self.breed.trim();
        if breed.is_empty() {
            reject(FormField::Breed, "Breed is required");
        }

        let years = self.years_of_experience.trim();
        let years_of_experience = if years.is_empty() {
            reject(FormField::YearsOfExperience, "Required");
            None
        } else {
            match years.parse::<i64>() {
                Ok(value) if value < 0 => {
                    reject(FormField::YearsOfExperience, "Cannot be negative");
                    None
                }
                Ok(value) => match u32::try_from(value) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        reject(FormField::YearsOfExperience, "Value is too large");
                        None
                    }
                },
                Err(_) => {
                    reject(FormField::YearsOfExperience, "Must be a whole number");
                    None
                }
            }
        };

        let salary_text = self.salary.trim();
        let salary = if salary_text.is_empty() {
            reject(FormField::Salary, "Required");
            None
        } else {
            match salary_text.parse::<f64>() {
                Ok(value) if !value.is_finite() => {
                    reject(FormField::Salary, "Must be a number");
                    None
                }
                Ok(value) if value < MIN_SALARY => {
                    reject(FormField::Salary, "Must be greater than 0");
                    None
                }
                Ok(_) if fraction_digits(salary_text) > 2 => {
                    reject(FormField::Salary, "Use at most two decimal places");
                    None
                }
                Ok(value) => Some(value),
                Err(_) => {
                    reject(FormField::Salary, "Must be a number");
                    None
                }
            }
        };

        match (years_of_experience, salary) {
            (Some(years_of_experience), Some(salary)) if errors.is_empty() => Ok(SpyCatCreate {
                name: name.to_string(),
                breed: breed.to_string(),
                years_of_experience,
                salary,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }
}

fn fraction_digits(text: &str) -> usize {
    let mantissa = text.split(['e', 'E']).next().unwrap_or(text);
    mantissa
        .split_once('.')
        .map(|(_, fraction)| fraction.trim_end_matches('0').len())
        .unwrap_or(0)
}

#[derive(Debug, Error)]
pub enum CreationError {
    #[error("creation form is not open")]
    Closed,
    #[error("a submission is already in flight")]
    Submitting,
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    Service(#[from] ServiceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationSnapshot {
    pub open: bool,
    pub form: CreationForm,
    pub field_errors: Vec<FieldError>,
    pub submitting: bool,
    pub last_error: Option<String>,
}

impl CreationSnapshot {
    pub fn controls_enabled(&self) -> bool {
        self.open && !self.submitting
    }
}

#[derive(Default)]
struct ModalState {
    open: bool,
    form: CreationForm,
    field_errors: Vec<FieldError>,
    submitting: bool,
    last_error: Option<String>,
}

pub struct CreationFlow {
    api: Arc<dyn SpyCatApi>,
    refresh: RefreshHandle,
    events: EventSink,
    inner: Mutex<ModalState>,
}

impl CreationFlow {
    pub fn new(api: Arc<dyn SpyCatApi>, refresh: RefreshHandle, events: EventSink) -> Self {
        Self {
            api,
            refresh,
            events,
            inner: Mutex::new(ModalState::default()),
        }
    }

    pub async fn open(&self) {
        self.inner.lock().await.open = true;
    }

    /// Closes the modal and drops whatever was typed. Ignored mid-submit.
    pub async fn cancel(&self) -> Result<(), CreationError> {
        let mut guard = self.inner.lock().await;
        if guard.submitting {
            return Err(CreationError::Submitting);
        }
        *guard = ModalState::default();
        Ok(())
    }

    pub async fn set_field(
        &self,
        field: FormField,
        value: impl Into<String>,
    ) -> Result<(), CreationError> {
        let mut guard = self.inner.lock().await;
        if !guard.open {
            return Err(CreationError::Closed);
        }
        if guard.submitting {
            return Err(CreationError::Submitting);
        }
        guard.form.set(field, value);
        guard.field_errors.retain(|e| e.field != field);
        Ok(())
    }

    pub async fn submit(&self) -> Result<SpyCat, CreationError> {
        let draft = {
            let mut guard = self.inner.lock().await;
            if !guard.open {
                return Err(CreationError::Closed);
            }
            if guard.submitting {
                return Err(CreationError::Submitting);
            }
            match guard.form.validate() {
                Ok(draft) => {
                    guard.field_errors.clear();
                    guard.last_error = None;
                    guard.submitting = true;
                    draft
                }
                Err(errors) => {
                    guard.field_errors = errors.0.clone();
                    return Err(errors.into());
                }
            }
        };

        let result = self.api.create(&draft).await;

        {
            let mut guard = self.inner.lock().await;
            guard.submitting = false;
            match &result {
                Ok(_) => *guard = ModalState::default(),
                Err(err) => guard.last_error = Some(err.message.clone()),
            }
        }

        match result {
            Ok(created) => {
                info!(id = %created.id, name = %created.name, "spy cat created");
                self.events.notify(Notice::success(CREATED_NOTICE));
                self.refresh.request().await;
                Ok(created)
            }
            Err(err) => {
                warn!(error = %err, "spy cat creation failed");
                self.events.notify(Notice::error(err.message.clone()));
                Err(err.into())
            }
        }
    }

    pub async fn snapshot(&self) -> CreationSnapshot {
        let guard = self.inner.lock().await;
        CreationSnapshot {
            open: guard.open,
            form: guard.form.clone(),
            field_errors: guard.field_errors.clone(),
            submitting: guard.submitting,
            last_error: guard.last_error.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/creation_tests.rs"]
mod tests;
