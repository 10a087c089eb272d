//! Permission selection rules for the role editor.
//!
//! "escritura" cannot exist without "lectura", so selecting it pulls
//! "lectura" in and locks it. "admin" is exclusive.

use std::collections::BTreeSet;

use crate::error::{ConsoleError, Result};
use crate::models::role::{PERMISSION_ADMIN, PERMISSION_READ, PERMISSION_WRITE};
use crate::models::{PermissionInfo, RoleRequest};

const ADMIN_NAME: &str = "admin";
const READ_NAME: &str = "lectura";
const WRITE_NAME: &str = "escritura";

#[derive(Debug, Clone)]
pub struct RoleEditor {
    catalog: Vec<PermissionInfo>,
    selected: BTreeSet<u32>,
    admin: u32,
    read: u32,
    write: u32,
}

impl RoleEditor {
    /// Start from a catalog and the role's current permissions.
    ///
    /// The special permissions are located by name; the well-known codes
    /// are used when the catalog does not name them.
    pub fn new(catalog: Vec<PermissionInfo>, current: impl IntoIterator<Item = u32>) -> Self {
        let find = |name: &str, fallback: u32| {
            catalog
                .iter()
                .find(|p| p.nombre.trim().eq_ignore_ascii_case(name))
                .map(|p| p.id)
                .unwrap_or(fallback)
        };
        let admin = find(ADMIN_NAME, PERMISSION_ADMIN);
        let read = find(READ_NAME, PERMISSION_READ);
        let write = find(WRITE_NAME, PERMISSION_WRITE);

        let mut editor = Self {
            catalog,
            selected: BTreeSet::new(),
            admin,
            read,
            write,
        };
        for id in current {
            editor.select(id);
        }
        editor
    }

    pub fn catalog(&self) -> &[PermissionInfo] {
        &self.catalog
    }

    pub fn is_selected(&self, id: u32) -> bool {
        self.selected.contains(&id)
    }

    /// "lectura" is locked while "escritura" is selected.
    pub fn is_locked(&self, id: u32) -> bool {
        id == self.read && self.selected.contains(&self.write)
    }

    pub fn select(&mut self, id: u32) {
        if id == self.admin {
            self.selected.clear();
            self.selected.insert(id);
            return;
        }

        self.selected.remove(&self.admin);
        self.selected.insert(id);
        if id == self.write {
            self.selected.insert(self.read);
        }
    }

    pub fn deselect(&mut self, id: u32) -> Result<()> {
        if self.is_locked(id) {
            return Err(ConsoleError::Validation(
                "El permiso de lectura es obligatorio mientras escritura esté seleccionado"
                    .to_string(),
            ));
        }
        self.selected.remove(&id);
        Ok(())
    }

    pub fn toggle(&mut self, id: u32) -> Result<()> {
        if self.is_selected(id) {
            self.deselect(id)
        } else {
            self.select(id);
            Ok(())
        }
    }

    pub fn selected_ids(&self) -> Vec<u32> {
        self.selected.iter().copied().collect()
    }

    pub fn to_request(&self, nombre: &str, descripcion: &str, activo: bool) -> RoleRequest {
        RoleRequest {
            nombre: nombre.trim().to_string(),
            descripcion: descripcion.trim().to_string(),
            activo,
            permisos_ids: self.selected_ids(),
        }
    }
}
