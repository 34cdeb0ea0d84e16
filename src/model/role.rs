use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, ToSchema,
)]
pub enum Role {
    Admin,
    /// Front-desk terminal that records attendance for anyone.
    Gate,
    Employee,
}

impl Role {
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Gate)
    }
}

impl TryFrom<String> for Role {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_names_only() {
        assert_eq!("Gate".parse::<Role>().unwrap(), Role::Gate);
        assert_eq!(Role::Admin.to_string(), "Admin");
        assert!("admin".parse::<Role>().is_err());
        assert!("Hr".parse::<Role>().is_err());
    }

    #[test]
    fn staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Gate.is_staff());
        assert!(!Role::Employee.is_staff());
    }
}
