use std::fmt;

/// The client's operations, used for error context, logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    GetById,
    GetByApiKey,
    Update,
    Delete,
    List,
    Validate,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create_api_key",
            Operation::GetById => "get_api_key_by_id",
            Operation::GetByApiKey => "get_api_key_by_api_key",
            Operation::Update => "update_api_key",
            Operation::Delete => "delete_api_key",
            Operation::List => "list_api_keys",
            Operation::Validate => "validate_api_key",
        }
    }

    /// Reads that can be repeated without side effects on the service.
    pub fn is_idempotent(self) -> bool {
        matches!(
            self,
            Operation::GetById | Operation::GetByApiKey | Operation::List | Operation::Validate
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
