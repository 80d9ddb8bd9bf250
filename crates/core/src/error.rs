use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("{0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Another action is already in progress")]
    Busy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_entity_and_id() {
        let err = CoreError::NotFound {
            entity: "Grape",
            id: 7,
        };
        assert_eq!(err.to_string(), "Grape with id 7 not found");
    }

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = CoreError::Validation("Select a vineyard type".into());
        assert_eq!(err.to_string(), "Select a vineyard type");
    }
}
