use super::commands::Command;
use super::model::{Model, Notification, Severity, Status};
use crate::error::{Error, PowerRequest};
use crate::insomnia::{Insomnia, State};
use crate::power::ExecutionState;

/// Controller owns the toggle and the model, and processes user commands.
pub struct Controller<P: ExecutionState> {
    insomnia: Insomnia<P>,
    model: Model,
    next_notification_id: u64,
}

impl<P: ExecutionState> Controller<P> {
    /// Takes over `power` and immediately asks it to keep the system awake.
    pub fn new(power: P) -> Self {
        let mut controller = Controller {
            insomnia: Insomnia::new(power),
            model: Model::default(),
            next_notification_id: 0,
        };
        let result = controller.insomnia.enable();
        controller.apply(result);
        controller
    }

    /// Processes a command and returns `false` once the application should quit.
    pub fn on_command(&mut self, command: Command) -> bool {
        match command {
            Command::Toggle => {
                self.on_toggle();
                true
            }
            Command::Exit => {
                self.on_exit();
                false
            }
        }
    }

    pub fn on_toggle(&mut self) {
        let result = self.insomnia.toggle().map(|_| ());
        self.apply(result);
    }

    pub fn on_exit(&mut self) {
        info!("Exiting");
        self.insomnia.shutdown();
    }

    pub fn get_model(&self) -> &Model {
        &self.model
    }

    fn apply(&mut self, result: Result<(), Error>) {
        if let Err(err) = &result {
            error!("{}", err);
            // Failing to allow sleep leaves the machine awake, which is the lesser problem
            let severity = match err {
                Error::PowerStateChangeFailed {
                    request: PowerRequest::Disable,
                    ..
                } => Severity::Warning,
                _ => Severity::Error,
            };
            self.notify(severity, "Insomnia", err.to_string());
        }
        self.model.status = match self.insomnia.state() {
            State::Enabled => {
                info!("Sleep prevention enabled");
                Status::Active
            }
            State::Disabled => {
                info!("Sleep prevention disabled");
                Status::Inactive
            }
            State::Error => Status::Error,
        };
        self.model.toggle_label = if self.insomnia.is_enabled() {
            "Disable"
        } else {
            "Enable"
        };
    }

    fn notify(&mut self, severity: Severity, title: &str, body: String) {
        self.next_notification_id += 1;
        self.model.notification = Some(Notification {
            id: self.next_notification_id,
            title: title.to_string(),
            body,
            severity,
        });
    }
}
