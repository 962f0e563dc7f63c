//! Wizard steps and the role → step-sequence table.
//!
//! Every step has exactly one entry in [`STEP_TABLE`], indexed by the step's
//! discriminant. Role sequences are fixed ordered lists; navigation looks up
//! positions in those lists instead of branching on step numbers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::signup::fields::FieldValues;
use crate::signup::role::Role;
use crate::signup::validation::{self, StepResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    RoleSelect,
    Location,
    PriceRange,
    HomeType,
    Timeline,
    PropertyDetails,
    Compensation,
    Motivation,
    Prequalification,
    Company,
    DealerProfile,
    InstallerProfile,
    Account,
}

pub type StepPredicate = fn(Option<Role>, &FieldValues) -> StepResult;

pub struct StepSpec {
    pub id: StepId,
    pub name: &'static str,
    pub validate: StepPredicate,
}

pub static STEP_TABLE: [StepSpec; 13] = [
    StepSpec {
        id: StepId::RoleSelect,
        name: "role-select",
        validate: validation::role_select,
    },
    StepSpec {
        id: StepId::Location,
        name: "location",
        validate: validation::location,
    },
    StepSpec {
        id: StepId::PriceRange,
        name: "price-range",
        validate: validation::price_range,
    },
    StepSpec {
        id: StepId::HomeType,
        name: "home-type",
        validate: validation::home_type,
    },
    StepSpec {
        id: StepId::Timeline,
        name: "timeline",
        validate: validation::timeline,
    },
    StepSpec {
        id: StepId::PropertyDetails,
        name: "property-details",
        validate: validation::property_details,
    },
    StepSpec {
        id: StepId::Compensation,
        name: "compensation",
        validate: validation::compensation,
    },
    StepSpec {
        id: StepId::Motivation,
        name: "motivation",
        validate: validation::motivation,
    },
    StepSpec {
        id: StepId::Prequalification,
        name: "prequalification",
        validate: validation::prequalification,
    },
    StepSpec {
        id: StepId::Company,
        name: "company",
        validate: validation::company,
    },
    StepSpec {
        id: StepId::DealerProfile,
        name: "dealer-profile",
        validate: validation::dealer_profile,
    },
    StepSpec {
        id: StepId::InstallerProfile,
        name: "installer-profile",
        validate: validation::installer_profile,
    },
    StepSpec {
        id: StepId::Account,
        name: "account",
        validate: validation::account,
    },
];

const UNSELECTED_STEPS: &[StepId] = &[StepId::RoleSelect];

const BUYER_STEPS: &[StepId] = &[
    StepId::RoleSelect,
    StepId::Location,
    StepId::PriceRange,
    StepId::HomeType,
    StepId::Timeline,
    StepId::Compensation,
    StepId::Motivation,
    StepId::Prequalification,
    StepId::Account,
];

const SELLER_STEPS: &[StepId] = &[
    StepId::RoleSelect,
    StepId::Location,
    StepId::PriceRange,
    StepId::HomeType,
    StepId::Timeline,
    StepId::PropertyDetails,
    StepId::Compensation,
    StepId::Motivation,
    StepId::Account,
];

const DEALER_STEPS: &[StepId] = &[
    StepId::RoleSelect,
    StepId::Company,
    StepId::DealerProfile,
    StepId::Account,
];

const INSTALLER_STEPS: &[StepId] = &[
    StepId::RoleSelect,
    StepId::Company,
    StepId::InstallerProfile,
    StepId::Account,
];

const AGENT_STEPS: &[StepId] = &[StepId::RoleSelect, StepId::Account];

/// Ordered step sequence for a role. Without a role only the first step exists.
pub fn steps_for(role: Option<Role>) -> &'static [StepId] {
    match role {
        None => UNSELECTED_STEPS,
        Some(Role::Buyer) => BUYER_STEPS,
        Some(Role::Seller) => SELLER_STEPS,
        Some(Role::Dealer) => DEALER_STEPS,
        Some(Role::Installer) => INSTALLER_STEPS,
        Some(Role::Agent) => AGENT_STEPS,
    }
}

impl StepId {
    pub const INITIAL: StepId = StepId::RoleSelect;

    pub fn spec(self) -> &'static StepSpec {
        &STEP_TABLE[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.spec().name
    }

    pub fn validate(self, role: Option<Role>, values: &FieldValues) -> StepResult {
        (self.spec().validate)(role, values)
    }

    pub fn position(self, role: Option<Role>) -> Option<usize> {
        steps_for(role).iter().position(|step| *step == self)
    }

    pub fn belongs_to(self, role: Option<Role>) -> bool {
        self.position(role).is_some()
    }

    pub fn next(self, role: Option<Role>) -> Option<StepId> {
        let steps = steps_for(role);
        let idx = self.position(role)?;
        steps.get(idx + 1).copied()
    }

    /// Role-specific predecessor. A step outside the role's sequence falls back
    /// to the initial step.
    pub fn previous(self, role: Option<Role>) -> Option<StepId> {
        if self == StepId::INITIAL {
            return None;
        }
        match self.position(role) {
            Some(idx) => steps_for(role).get(idx.checked_sub(1)?).copied(),
            None => Some(StepId::INITIAL),
        }
    }

    pub fn is_last(self, role: Option<Role>) -> bool {
        role.is_some() && steps_for(role).last() == Some(&self)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown step: {0}")]
pub struct UnknownStep(pub String);

impl FromStr for StepId {
    type Err = UnknownStep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STEP_TABLE
            .iter()
            .find(|spec| spec.name == s)
            .map(|spec| spec.id)
            .ok_or_else(|| UnknownStep(s.to_string()))
    }
}
