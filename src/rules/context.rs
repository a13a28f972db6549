use serde_json::{Map, Value};

/// An authenticated user as seen by rule expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl AuthUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }
}

/// Who is making the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthContext {
    #[default]
    Guest,
    User(AuthUser),
    Admin(AuthUser),
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        matches!(self, AuthContext::Admin(_))
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, AuthContext::Guest)
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthContext::Guest => None,
            AuthContext::User(user) | AuthContext::Admin(user) => Some(user),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.user().map(|u| u.id.as_str())
    }

    /// Value of `@request.auth.<field>`; guests resolve every field to `""`.
    pub fn field(&self, name: &str) -> Value {
        match self.user() {
            None => Value::String(String::new()),
            Some(user) if name == "id" => Value::String(user.id.clone()),
            Some(user) => user.fields.get(name).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Everything a rule expression can read.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub auth: &'a AuthContext,
    pub record: &'a Map<String, Value>,
    pub data: &'a Map<String, Value>,
}
