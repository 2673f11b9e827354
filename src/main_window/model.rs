use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Status {
    #[default]
    Initializing,
    Active,
    Inactive,
    Error,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Status::Initializing => "Initializing",
            Status::Active => "Active (sleep prevented)",
            Status::Inactive => "Inactive (sleep allowed)",
            Status::Error => "Error",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    /// Distinguishes repeated notifications with the same text.
    pub id: u64,
    pub title: String,
    pub body: String,
    pub severity: Severity,
}

/// Model defines the current state of the application.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub status: Status,
    /// Verb of the state the toggle would switch to.
    pub toggle_label: &'static str,
    pub notification: Option<Notification>,
}

impl Model {
    pub fn tooltip(&self) -> String {
        format!("Insomnia: {}", self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text() {
        assert_eq!(Status::Initializing.to_string(), "Initializing");
        assert_eq!(Status::Active.to_string(), "Active (sleep prevented)");
        assert_eq!(Status::Inactive.to_string(), "Inactive (sleep allowed)");
        assert_eq!(Status::Error.to_string(), "Error");
    }

    #[test]
    fn default_model_is_initializing() {
        let model = Model::default();
        assert_eq!(model.status, Status::Initializing);
        assert_eq!(model.tooltip(), "Insomnia: Initializing");
        assert!(model.notification.is_none());
    }
}
