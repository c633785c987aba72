//! Form logic behind the registration and new-event views.
//!
//! Each form runs its local checks before any request, then maps a failed
//! call onto a banner plus per-field messages.

use std::collections::BTreeMap;
use std::fmt;

use chrono::DateTime;
use evento_types::{ApiError, Category, EventPayload, NewEvent, RawFieldErrors, SigninPayload};

use crate::client::EventoClient;
use crate::session::SessionStore;

pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";
pub const CATEGORY_NOT_FOUND: &str = "not found";
pub const TIME_MUST_BE_SET: &str = "must be set";
pub const TIME_INVALID: &str = "must be an RFC 3339 timestamp";

/// Field name -> the single message shown under that input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Takes the first server message for each of `fields`. Fields without a
    /// server message get no entry.
    pub fn from_api_error(error: &ApiError, fields: &[&str]) -> Self {
        Self(
            fields
                .iter()
                .filter_map(|field| {
                    error
                        .field_error(field)
                        .map(|msg| ((*field).to_string(), msg.to_string()))
                })
                .collect(),
        )
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A failed form submission: the underlying error plus what each field shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    pub error: ApiError,
    pub fields: FieldErrors,
}

impl FormError {
    pub fn from_api(error: ApiError, fields: &[&str]) -> Self {
        let fields = FieldErrors::from_api_error(&error, fields);
        Self { error, fields }
    }

    /// A check that failed before any request was made.
    pub fn local(field: &str, message: &str) -> Self {
        let mut raw = RawFieldErrors::new();
        raw.insert(field.to_string(), vec![message.to_string()]);
        Self::from_api(ApiError::validation(raw), &[field])
    }

    /// Page-level message.
    pub fn banner(&self) -> &str {
        &self.error.message
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error.message)
    }
}

impl std::error::Error for FormError {}

/// Registration form. A successful registration signs in with the same
/// credentials.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl RegistrationForm {
    pub const FIELDS: &'static [&'static str] =
        &["name", "email", "password", "password_confirmation"];

    /// Checks that can be made without the server.
    ///
    /// # Errors
    /// Fails when the password confirmation does not match.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.password != self.password_confirmation {
            return Err(FormError::local(
                "password_confirmation",
                PASSWORDS_DO_NOT_MATCH,
            ));
        }
        Ok(())
    }

    /// Registers, then signs in.
    ///
    /// # Errors
    /// Returns the local validation failure, or the failing call's error
    /// mapped onto the form fields.
    pub async fn submit<S: SessionStore>(
        &self,
        client: &EventoClient<S>,
    ) -> Result<SigninPayload, FormError> {
        self.validate()?;

        client
            .register(&self.name, &self.email, &self.password)
            .await
            .map_err(|e| FormError::from_api(e, Self::FIELDS))?;

        client
            .signin(&self.email, &self.password)
            .await
            .map_err(|e| FormError::from_api(e, Self::FIELDS))
    }
}

/// New-event form. The category is picked by name and the start time is
/// entered as RFC 3339 text.
#[derive(Debug, Clone, Default)]
pub struct NewEventForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub start_time: Option<String>,
    pub location: String,
    pub image: Option<String>,
}

impl NewEventForm {
    pub const FIELDS: &'static [&'static str] = &[
        "title",
        "description",
        "category",
        "time",
        "location",
        "image",
    ];

    /// Resolves the category and start time into the request body.
    ///
    /// # Errors
    /// Fails with a `category` error when no category has that name, or a
    /// `time` error when the start time is missing or unparseable.
    pub fn resolve(&self, categories: &[Category]) -> Result<NewEvent, FormError> {
        let category = categories
            .iter()
            .find(|c| c.name == self.category)
            .ok_or_else(|| FormError::local("category", CATEGORY_NOT_FOUND))?;

        let start_time = self
            .start_time
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FormError::local("time", TIME_MUST_BE_SET))?;
        let start_time = DateTime::parse_from_rfc3339(start_time)
            .ok()
            .ok_or_else(|| FormError::local("time", TIME_INVALID))?;

        Ok(NewEvent {
            title: self.title.clone(),
            description: self.description.clone(),
            category_id: category.id,
            time: start_time.to_rfc3339(),
            location: self.location.clone(),
            image_url: self.image.clone().filter(|i| !i.trim().is_empty()),
        })
    }

    /// Fetches categories, resolves the form, and creates the event.
    ///
    /// # Errors
    /// Returns the local validation failure, or the failing call's error
    /// mapped onto the form fields.
    pub async fn submit<S: SessionStore>(
        &self,
        client: &EventoClient<S>,
    ) -> Result<EventPayload, FormError> {
        let categories = client
            .get_categories()
            .await
            .map_err(|e| FormError::from_api(e, Self::FIELDS))?
            .categories;

        let body = self.resolve(&categories)?;

        client
            .create_new_event(&body)
            .await
            .map_err(|e| FormError::from_api(e, Self::FIELDS))
    }
}
