/// Channel for user-facing notices.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn alert(&self, message: &str);
}

/// Writes notices to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }
}
