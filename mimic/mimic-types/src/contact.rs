//! Contact information consumed by body models.

use serde::{Deserialize, Serialize};

/// An active contact between two named geoms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeomContact {
    /// First geom in contact.
    pub geom1: String,
    /// Second geom in contact.
    pub geom2: String,
}

impl GeomContact {
    /// Create a contact between two geoms.
    #[must_use]
    pub fn new(geom1: impl Into<String>, geom2: impl Into<String>) -> Self {
        Self {
            geom1: geom1.into(),
            geom2: geom2.into(),
        }
    }

    /// Returns true if this contact is between `a` and `b`, in either order.
    #[must_use]
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.geom1 == a && self.geom2 == b) || (self.geom1 == b && self.geom2 == a)
    }
}

/// Ground contact of both feet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FootContacts {
    /// Left foot touches the ground.
    pub left: bool,
    /// Right foot touches the ground.
    pub right: bool,
}

impl FootContacts {
    /// Create a contact pair.
    #[must_use]
    pub const fn new(left: bool, right: bool) -> Self {
        Self { left, right }
    }

    /// Both feet on the ground.
    #[must_use]
    pub const fn is_double_stance(&self) -> bool {
        self.left && self.right
    }

    /// Contacts as `[left, right]` flags (1.0 for contact).
    #[must_use]
    pub fn as_flags(&self) -> [f64; 2] {
        [f64::from(u8::from(self.left)), f64::from(u8::from(self.right))]
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn contact_is_symmetric() {
        let contact = GeomContact::new("floor", "foot_geom");
        assert!(contact.is_between("foot_geom", "floor"));
        assert!(contact.is_between("floor", "foot_geom"));
        assert!(!contact.is_between("foot_left_geom", "floor"));
    }

    #[test]
    fn flags_follow_contacts() {
        let contacts = FootContacts::new(true, false);
        assert_eq!(contacts.as_flags(), [1.0, 0.0]);
        assert!(!contacts.is_double_stance());
        assert!(FootContacts::new(true, true).is_double_stance());
    }
}
