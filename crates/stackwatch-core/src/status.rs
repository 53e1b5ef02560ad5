//! Status values and classification tables
//!
//! Resource and stack statuses are classified by set membership against
//! process-wide tables. A value present in no table is treated as pending so
//! that a status introduced by the API later keeps the watcher polling
//! instead of ending it early.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Declares an enum over the string values of an API field.
///
/// Unrecognized strings are kept verbatim in an `Other` variant so that they
/// round-trip through serde unchanged.
macro_rules! api_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A value this version does not know about
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $text,)+
                    Self::Other(value) => value,
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                match value {
                    $($text => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::from(value.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use api_enum;

api_enum! {
    /// Status of a single resource as reported by a stack event
    ResourceStatus {
        CreateInProgress => "CREATE_IN_PROGRESS",
        CreateFailed => "CREATE_FAILED",
        CreateComplete => "CREATE_COMPLETE",
        DeleteInProgress => "DELETE_IN_PROGRESS",
        DeleteFailed => "DELETE_FAILED",
        DeleteComplete => "DELETE_COMPLETE",
        DeleteSkipped => "DELETE_SKIPPED",
        UpdateInProgress => "UPDATE_IN_PROGRESS",
        UpdateFailed => "UPDATE_FAILED",
        UpdateComplete => "UPDATE_COMPLETE",
        ImportInProgress => "IMPORT_IN_PROGRESS",
        ImportFailed => "IMPORT_FAILED",
        ImportComplete => "IMPORT_COMPLETE",
        ImportRollbackInProgress => "IMPORT_ROLLBACK_IN_PROGRESS",
        ImportRollbackFailed => "IMPORT_ROLLBACK_FAILED",
        ImportRollbackComplete => "IMPORT_ROLLBACK_COMPLETE",
        RollbackInProgress => "ROLLBACK_IN_PROGRESS",
        RollbackFailed => "ROLLBACK_FAILED",
        RollbackComplete => "ROLLBACK_COMPLETE",
        UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
        UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
        UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
    }
}

api_enum! {
    /// Status of a whole stack
    StackStatus {
        CreateInProgress => "CREATE_IN_PROGRESS",
        CreateFailed => "CREATE_FAILED",
        CreateComplete => "CREATE_COMPLETE",
        RollbackInProgress => "ROLLBACK_IN_PROGRESS",
        RollbackFailed => "ROLLBACK_FAILED",
        RollbackComplete => "ROLLBACK_COMPLETE",
        DeleteInProgress => "DELETE_IN_PROGRESS",
        DeleteFailed => "DELETE_FAILED",
        DeleteComplete => "DELETE_COMPLETE",
        UpdateInProgress => "UPDATE_IN_PROGRESS",
        UpdateCompleteCleanupInProgress => "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
        UpdateComplete => "UPDATE_COMPLETE",
        UpdateFailed => "UPDATE_FAILED",
        UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
        UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
        UpdateRollbackCompleteCleanupInProgress => "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS",
        UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
        ReviewInProgress => "REVIEW_IN_PROGRESS",
        ImportInProgress => "IMPORT_IN_PROGRESS",
        ImportComplete => "IMPORT_COMPLETE",
        ImportRollbackInProgress => "IMPORT_ROLLBACK_IN_PROGRESS",
        ImportRollbackFailed => "IMPORT_ROLLBACK_FAILED",
        ImportRollbackComplete => "IMPORT_ROLLBACK_COMPLETE",
    }
}

/// Resource statuses that mean the resource reached a good state
pub static POSITIVE_EVENT_STATUS: LazyLock<HashSet<ResourceStatus>> = LazyLock::new(|| {
    HashSet::from([
        ResourceStatus::CreateComplete,
        ResourceStatus::DeleteComplete,
        ResourceStatus::UpdateComplete,
    ])
});

/// Resource statuses that mean the resource operation failed
pub static NEGATIVE_EVENT_STATUS: LazyLock<HashSet<ResourceStatus>> = LazyLock::new(|| {
    HashSet::from([
        ResourceStatus::CreateFailed,
        ResourceStatus::DeleteFailed,
        ResourceStatus::UpdateFailed,
    ])
});

/// Resource statuses that are still moving
pub static PENDING_EVENT_STATUS: LazyLock<HashSet<ResourceStatus>> = LazyLock::new(|| {
    HashSet::from([
        ResourceStatus::CreateInProgress,
        ResourceStatus::DeleteInProgress,
        ResourceStatus::UpdateInProgress,
    ])
});

/// Stack statuses that end a watch successfully
pub static POSITIVE_STACK_STATUS: LazyLock<HashSet<StackStatus>> = LazyLock::new(|| {
    HashSet::from([
        StackStatus::CreateComplete,
        StackStatus::DeleteComplete,
        StackStatus::UpdateComplete,
        StackStatus::RollbackComplete,
    ])
});

/// Stack statuses that end a watch with a failure
pub static NEGATIVE_STACK_STATUS: LazyLock<HashSet<StackStatus>> = LazyLock::new(|| {
    HashSet::from([
        StackStatus::CreateFailed,
        StackStatus::DeleteFailed,
        StackStatus::UpdateRollbackComplete,
        StackStatus::UpdateRollbackFailed,
        StackStatus::RollbackFailed,
    ])
});

/// Stack statuses that are not terminal yet
pub static PENDING_STACK_STATUS: LazyLock<HashSet<StackStatus>> = LazyLock::new(|| {
    HashSet::from([
        StackStatus::CreateInProgress,
        StackStatus::DeleteInProgress,
        StackStatus::UpdateInProgress,
        StackStatus::ReviewInProgress,
        StackStatus::UpdateRollbackInProgress,
        StackStatus::RollbackInProgress,
        StackStatus::UpdateCompleteCleanupInProgress,
        StackStatus::UpdateRollbackCompleteCleanupInProgress,
    ])
});

/// Stack statuses that indicate an automatic rollback is running
pub static ROLLBACK_STACK_STATUS: LazyLock<HashSet<StackStatus>> =
    LazyLock::new(|| HashSet::from([StackStatus::RollbackInProgress]));

/// Outcome class of a status value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Positive,
    Negative,
    Pending,
}

impl StatusClass {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StatusClass::Pending)
    }
}

impl std::fmt::Display for StatusClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusClass::Positive => write!(f, "positive"),
            StatusClass::Negative => write!(f, "negative"),
            StatusClass::Pending => write!(f, "pending"),
        }
    }
}

fn classify<T: Eq + std::hash::Hash>(
    value: &T,
    positive: &HashSet<T>,
    negative: &HashSet<T>,
) -> StatusClass {
    if positive.contains(value) {
        StatusClass::Positive
    } else if negative.contains(value) {
        StatusClass::Negative
    } else {
        StatusClass::Pending
    }
}

impl ResourceStatus {
    pub fn class(&self) -> StatusClass {
        classify(self, &POSITIVE_EVENT_STATUS, &NEGATIVE_EVENT_STATUS)
    }

    pub fn is_positive(&self) -> bool {
        POSITIVE_EVENT_STATUS.contains(self)
    }

    pub fn is_negative(&self) -> bool {
        NEGATIVE_EVENT_STATUS.contains(self)
    }

    /// True for in-progress statuses and for anything not in a table.
    pub fn is_pending(&self) -> bool {
        self.class() == StatusClass::Pending
    }

    /// Whether the status is listed in any classification table
    pub fn is_known(&self) -> bool {
        POSITIVE_EVENT_STATUS.contains(self)
            || NEGATIVE_EVENT_STATUS.contains(self)
            || PENDING_EVENT_STATUS.contains(self)
    }
}

impl StackStatus {
    pub fn class(&self) -> StatusClass {
        classify(self, &POSITIVE_STACK_STATUS, &NEGATIVE_STACK_STATUS)
    }

    pub fn is_positive(&self) -> bool {
        POSITIVE_STACK_STATUS.contains(self)
    }

    pub fn is_negative(&self) -> bool {
        NEGATIVE_STACK_STATUS.contains(self)
    }

    /// True for in-progress statuses and for anything not in a table.
    pub fn is_pending(&self) -> bool {
        self.class() == StatusClass::Pending
    }

    pub fn is_rollback(&self) -> bool {
        ROLLBACK_STACK_STATUS.contains(self)
    }

    /// Whether the status is listed in any classification table
    pub fn is_known(&self) -> bool {
        POSITIVE_STACK_STATUS.contains(self)
            || NEGATIVE_STACK_STATUS.contains(self)
            || PENDING_STACK_STATUS.contains(self)
    }
}
