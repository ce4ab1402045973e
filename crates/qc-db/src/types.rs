use std::{fmt, str::FromStr};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("'{value}' is not a valid {kind}")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

macro_rules! impl_db_string_enum {
    {
        Enum $enum_type:ident, Kind $kind:expr; $($variant:ident => $name:literal),+
    } => {
        impl $enum_type {
            pub const ALL: &'static [$enum_type] = &[$($enum_type::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($enum_type::$variant => $name),+
                }
            }
        }

        impl FromStr for $enum_type {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($enum_type::$variant)),+,
                    other => Err(ParseError {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }

        impl fmt::Display for $enum_type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $enum_type {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

/// Access tier of a user. `admin` and `user` may edit, `viewer` and `QC` are read only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
    Viewer,
    Qc,
}

impl Role {
    pub fn can_edit(&self) -> bool {
        matches!(self, Role::Admin | Role::User)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShipmentStatus {
    InProgress,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChecklistStatus {
    Passed,
    NotApplicable,
}

impl_db_string_enum! {
    Enum Role, Kind "role";
    Admin => "admin",
    User => "user",
    Viewer => "viewer",
    Qc => "QC"
}

impl_db_string_enum! {
    Enum ShipmentStatus, Kind "shipment status";
    InProgress => "In Progress",
    Completed => "Completed"
}

impl_db_string_enum! {
    Enum ChecklistStatus, Kind "checklist status";
    Passed => "Passed",
    NotApplicable => "NA"
}
