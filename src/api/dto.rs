use serde::Deserialize;

/// Request DTO for creating a todo. Any `id` or timestamps sent by the
/// client are ignored.
#[derive(Debug, Deserialize)]
pub struct CreateTodoReq {
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Request DTO for updating a todo. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoReq {
    pub description: Option<String>,
    pub completed: Option<bool>,
}
