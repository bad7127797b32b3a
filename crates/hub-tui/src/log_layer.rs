//! Tracing layer that forwards WARN and ERROR events to the TUI log panel.

use tokio::sync::mpsc;

pub struct ForwardLayer {
    sender: mpsc::UnboundedSender<String>,
}

impl ForwardLayer {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }
}

impl<S> tracing_subscriber::Layer<S> for ForwardLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let meta = event.metadata();
        let level = meta.level();
        if !matches!(*level, tracing::Level::WARN | tracing::Level::ERROR) {
            return;
        }

        let mut message = format!(
            "{} [{}] {}: ",
            chrono::Local::now().format("%H:%M:%S"),
            level,
            meta.target()
        );
        let mut visitor = MessageVisitor(&mut message);
        event.record(&mut visitor);

        // The receiver is gone once the UI has shut down.
        let _ = self.sender.send(message);
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{:?}", value));
        } else {
            self.0.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_only_warn_and_error_are_forwarded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscriber = tracing_subscriber::registry().with(ForwardLayer::new(tx));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("hidden");
            tracing::warn!(code = 7, "stats poll failed");
            tracing::error!("upload failed");
        });

        let first = rx.try_recv().expect("warn line");
        assert!(first.contains("[WARN]"), "{}", first);
        assert!(first.ends_with("stats poll failed code=7"), "{}", first);
        let second = rx.try_recv().expect("error line");
        assert!(second.contains("[ERROR]") && second.ends_with("upload failed"));
        assert!(rx.try_recv().is_err());
    }
}
