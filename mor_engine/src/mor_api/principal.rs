use serde::{Deserialize, Serialize};

use crate::gateway::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Merchant,
    Admin,
}

/// The authenticated caller of an API operation. It is resolved once per request and handed to every operation
/// that acts on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub account_id: i64,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub account_type: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.lastname, self.firstname).trim().to_string()
    }
}

impl From<User> for Principal {
    /// Every user is a merchant. `admin` and `business_admin` account types are admins as well.
    fn from(user: User) -> Self {
        let mut roles = vec![Role::Merchant];
        let account_type = user.account_type.trim().to_ascii_lowercase();
        if account_type == "admin" || account_type == "business_admin" {
            roles.push(Role::Admin);
        }
        Self {
            account_id: user.account_id,
            email: user.email,
            firstname: user.firstname,
            lastname: user.lastname,
            account_type: user.account_type,
            roles,
        }
    }
}
