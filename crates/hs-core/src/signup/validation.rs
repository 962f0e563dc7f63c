//! Per-step validity predicates.
//!
//! Each wizard step owns one predicate. A predicate reports every problem it
//! finds instead of stopping at the first, so the UI can mark all offending
//! fields at once.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::signup::fields::{FieldValue, FieldValues, EMAIL_FIELD, ROLE_FIELD};
use crate::signup::role::Role;

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 256;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_RE.is_match(candidate.trim())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub kind: IssueKind,
}

impl FieldIssue {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: IssueKind::Missing,
        }
    }

    pub fn invalid(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: IssueKind::Invalid,
        }
    }
}

pub type StepResult = Result<(), Vec<FieldIssue>>;

/// Accumulates issues for one step.
struct Checks<'a> {
    values: &'a FieldValues,
    issues: Vec<FieldIssue>,
}

impl<'a> Checks<'a> {
    fn new(values: &'a FieldValues) -> Self {
        Self {
            values,
            issues: Vec::new(),
        }
    }

    fn require(&mut self, field: &str) -> &mut Self {
        if !self.values.is_present(field) {
            self.issues.push(FieldIssue::missing(field));
        }
        self
    }

    fn require_list(&mut self, field: &str) -> &mut Self {
        match self.values.get(field) {
            Some(FieldValue::List(items)) if items.iter().any(|i| !i.trim().is_empty()) => {}
            Some(FieldValue::List(_)) | None => self.issues.push(FieldIssue::missing(field)),
            Some(_) => self.issues.push(FieldIssue::invalid(field)),
        }
        self
    }

    fn require_place(&mut self, field: &str) -> &mut Self {
        match self.values.get(field) {
            None => self.issues.push(FieldIssue::missing(field)),
            Some(FieldValue::Location(location)) if location.is_resolved() => {}
            Some(FieldValue::Location(location)) if location.search.trim().is_empty() => {
                self.issues.push(FieldIssue::missing(field))
            }
            // Typed text that never resolved to a recognized place.
            Some(_) => self.issues.push(FieldIssue::invalid(field)),
        }
        self
    }

    fn require_number(&mut self, field: &str) -> Option<f64> {
        match self.values.get(field) {
            None => {
                self.issues.push(FieldIssue::missing(field));
                None
            }
            Some(value) if !value.is_present() => {
                self.issues.push(FieldIssue::missing(field));
                None
            }
            Some(value) => {
                let number = value.as_number();
                if number.is_none() {
                    self.issues.push(FieldIssue::invalid(field));
                }
                number
            }
        }
    }

    fn require_email(&mut self, field: &str) -> &mut Self {
        match self.values.text(field) {
            Some(email) if is_valid_email(email) => {}
            Some(email) if !email.trim().is_empty() => {
                self.issues.push(FieldIssue::invalid(field))
            }
            _ => self.issues.push(FieldIssue::missing(field)),
        }
        self
    }

    fn require_password(&mut self, field: &str) -> &mut Self {
        // Passwords are not trimmed.
        match self.values.get(field) {
            None => self.issues.push(FieldIssue::missing(field)),
            Some(FieldValue::Text(password)) if password.is_empty() => {
                self.issues.push(FieldIssue::missing(field))
            }
            Some(FieldValue::Text(password)) => {
                let len = password.chars().count();
                if !(PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&len) {
                    self.issues.push(FieldIssue::invalid(field));
                }
            }
            Some(_) => self.issues.push(FieldIssue::invalid(field)),
        }
        self
    }

    fn push(&mut self, issue: FieldIssue) -> &mut Self {
        self.issues.push(issue);
        self
    }

    fn finish(&mut self) -> StepResult {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.issues))
        }
    }
}

pub fn role_select(_role: Option<Role>, values: &FieldValues) -> StepResult {
    let mut checks = Checks::new(values);
    match values.text(ROLE_FIELD) {
        Some(raw) if raw.parse::<Role>().is_ok() => {}
        Some(raw) if !raw.trim().is_empty() => {
            checks.push(FieldIssue::invalid(ROLE_FIELD));
        }
        _ => {
            checks.push(FieldIssue::missing(ROLE_FIELD));
        }
    }
    checks.require_email(EMAIL_FIELD).finish()
}

pub fn location(_role: Option<Role>, values: &FieldValues) -> StepResult {
    Checks::new(values)
        .require_place("location")
        .require("zipCode")
        .finish()
}

pub fn price_range(role: Option<Role>, values: &FieldValues) -> StepResult {
    let mut checks = Checks::new(values);
    match role {
        Some(Role::Seller) => {
            checks.require("priceRange");
        }
        _ => {
            let min = checks.require_number("minPrice");
            let max = checks.require_number("maxPrice");
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    checks.push(FieldIssue::invalid("maxPrice"));
                }
            }
        }
    }
    checks.finish()
}

pub fn home_type(role: Option<Role>, values: &FieldValues) -> StepResult {
    let field = match role {
        Some(Role::Seller) => "propertyTypeSeller",
        _ => "propertyTypeBuyer",
    };
    Checks::new(values).require_list(field).finish()
}

pub fn timeline(_role: Option<Role>, values: &FieldValues) -> StepResult {
    Checks::new(values).require("timeline").finish()
}

pub fn property_details(_role: Option<Role>, values: &FieldValues) -> StepResult {
    let mut checks = Checks::new(values);
    checks
        .require("propertyAddress")
        .require("squareFoot")
        .require("bedroom")
        .require("bathrooms");
    checks.require_number("yearBuilt");
    checks.finish()
}

pub fn compensation(_role: Option<Role>, values: &FieldValues) -> StepResult {
    let mut checks = Checks::new(values);
    match values.text("compensationOffer").map(str::trim) {
        Some("percentage") => {
            checks.require("compPercentage");
        }
        Some("fixed-amount") => {
            checks.require_number("compPrice");
        }
        Some(other) if !other.is_empty() => {
            checks.push(FieldIssue::invalid("compensationOffer"));
        }
        _ => {
            checks.push(FieldIssue::missing("compensationOffer"));
        }
    }
    checks.finish()
}

pub fn motivation(role: Option<Role>, values: &FieldValues) -> StepResult {
    let field = match role {
        Some(Role::Seller) => "motivationToSell",
        _ => "motivationToBuy",
    };
    Checks::new(values).require(field).finish()
}

pub fn prequalification(_role: Option<Role>, values: &FieldValues) -> StepResult {
    Checks::new(values).require("prequalifiedBank").finish()
}

pub fn company(_role: Option<Role>, values: &FieldValues) -> StepResult {
    Checks::new(values)
        .require("companyName")
        .require_place("headquarterAddress")
        .finish()
}

pub fn dealer_profile(_role: Option<Role>, values: &FieldValues) -> StepResult {
    Checks::new(values)
        .require_list("productService")
        .require_place("yardLocations")
        .finish()
}

pub fn installer_profile(_role: Option<Role>, values: &FieldValues) -> StepResult {
    let mut checks = Checks::new(values);
    checks.require_list("serviceRegions");
    checks.require_number("crewSize");
    checks.require_list("systemExpertise").finish()
}

pub fn account(role: Option<Role>, values: &FieldValues) -> StepResult {
    let mut checks = Checks::new(values);
    checks
        .require("fname")
        .require("lname")
        .require_email(EMAIL_FIELD)
        .require_password("password");
    if role == Some(Role::Agent) {
        checks
            .require("licenseNumber")
            .require("certifications")
            .require("specialties");
    }
    checks.finish()
}
