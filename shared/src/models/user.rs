//! User and role models

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account, owned by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

/// Staff roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "staff_role", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Pharmacist,
    Nurse,
    Technician,
    Viewer,
}

/// Individual capabilities granted by a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CreateSupplies,
    UpdateSupplies,
    DeleteSupplies,
    CreateCategories,
    UpdateCategories,
    DeleteCategories,
    CreateSuppliers,
    UpdateSuppliers,
    DeleteSuppliers,
    ManageUsers,
    ViewAnalytics,
    ManageOrders,
    ViewAuditLogs,
    SystemSettings,
    StockMovements,
    ViewSupplies,
    CreateAlerts,
    UpdateInventory,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateSupplies => "create_supplies",
            Permission::UpdateSupplies => "update_supplies",
            Permission::DeleteSupplies => "delete_supplies",
            Permission::CreateCategories => "create_categories",
            Permission::UpdateCategories => "update_categories",
            Permission::DeleteCategories => "delete_categories",
            Permission::CreateSuppliers => "create_suppliers",
            Permission::UpdateSuppliers => "update_suppliers",
            Permission::DeleteSuppliers => "delete_suppliers",
            Permission::ManageUsers => "manage_users",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ManageOrders => "manage_orders",
            Permission::ViewAuditLogs => "view_audit_logs",
            Permission::SystemSettings => "system_settings",
            Permission::StockMovements => "stock_movements",
            Permission::ViewSupplies => "view_supplies",
            Permission::CreateAlerts => "create_alerts",
            Permission::UpdateInventory => "update_inventory",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The set of permissions a role carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Role {
    /// Permissions granted to this role
    pub fn permissions(&self) -> PermissionSet {
        use Permission::*;

        let granted: &[Permission] = match self {
            Role::Admin => &[
                CreateSupplies,
                UpdateSupplies,
                DeleteSupplies,
                CreateCategories,
                UpdateCategories,
                DeleteCategories,
                CreateSuppliers,
                UpdateSuppliers,
                DeleteSuppliers,
                ManageUsers,
                ViewAnalytics,
                ManageOrders,
                ViewAuditLogs,
                SystemSettings,
                StockMovements,
                CreateAlerts,
            ],
            Role::Manager => &[
                CreateSupplies,
                UpdateSupplies,
                CreateCategories,
                UpdateCategories,
                CreateSuppliers,
                UpdateSuppliers,
                ViewAnalytics,
                ManageOrders,
                ViewAuditLogs,
                StockMovements,
                CreateAlerts,
            ],
            Role::Pharmacist => &[
                CreateSupplies,
                UpdateSupplies,
                StockMovements,
                ViewAnalytics,
                ManageOrders,
            ],
            Role::Nurse => &[StockMovements, ViewSupplies, CreateAlerts],
            Role::Technician => &[StockMovements, ViewSupplies, UpdateInventory],
            Role::Viewer => &[ViewSupplies, ViewAnalytics],
        };

        granted.iter().copied().collect()
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions().contains(permission)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Pharmacist => "pharmacist",
            Role::Nurse => "nurse",
            Role::Technician => "technician",
            Role::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's role assignment. Permissions are derived from `role`, not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub department: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRole {
    pub fn permissions(&self) -> PermissionSet {
        self.role.permissions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_holds_every_management_permission() {
        let perms = Role::Admin.permissions();
        assert!(perms.contains(Permission::ManageUsers));
        assert!(perms.contains(Permission::DeleteCategories));
        assert!(perms.contains(Permission::StockMovements));
        assert!(perms.contains(Permission::CreateAlerts));
    }

    #[test]
    fn test_manager_cannot_delete() {
        let perms = Role::Manager.permissions();
        assert!(!perms.contains(Permission::DeleteSupplies));
        assert!(!perms.contains(Permission::DeleteCategories));
        assert!(!perms.contains(Permission::ManageUsers));
        assert!(perms.contains(Permission::StockMovements));
    }

    #[test]
    fn test_viewer_is_read_only() {
        let perms = Role::Viewer.permissions();
        assert_eq!(perms.len(), 2);
        assert!(!perms.contains(Permission::StockMovements));
    }

    #[test]
    fn test_permission_set_serializes_as_list() {
        let json = serde_json::to_value(Role::Nurse.permissions()).unwrap();
        assert_eq!(
            json,
            serde_json::json!(["stock_movements", "view_supplies", "create_alerts"])
        );
    }
}
