// ABOUTME: Opaque identifiers for panels, layout nodes and tabs.
// ABOUTME: Random v4 UUIDs so ids never collide across tabs or sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Allocate a fresh, globally unique id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Short form keeps log lines readable
                let simple = self.0.simple().to_string();
                f.write_str(&simple[..8])
            }
        }
    };
}

define_id!(
    /// Identifies a terminal session and the panel that renders it
    PanelId
);
define_id!(
    /// Identifies a node (leaf or split) inside one layout tree
    NodeId
);
define_id!(TabId);
