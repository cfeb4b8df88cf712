use tokio::sync::mpsc;

/// Transient, dismissible message for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Success(m) => write!(f, "[ok] {m}"),
            Notice::Error(m) => write!(f, "[error] {m}"),
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(Notice::Success(message.into()));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(Notice::Error(message.into()));
    }

    fn send(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            log::debug!("notice dropped, nobody is listening");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_arrive_in_order() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.success("Logged in successfully");
        notifier.error("Email or password are incorrect.");

        assert_eq!(
            rx.try_recv().unwrap(),
            Notice::Success("Logged in successfully".into())
        );
        let error = rx.try_recv().unwrap();
        assert!(error.is_error());
        assert_eq!(error.to_string(), "[error] Email or password are incorrect.");
    }

    #[test]
    fn sending_without_receiver_is_harmless() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.error("nobody hears this");
    }
}
