use crate::messages::Outbound;
use tokio::sync::mpsc;

/// Everything currently queued on a connection's outbound channel.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut items = Vec::new();
    while let Ok(item) = rx.try_recv() {
        items.push(item);
    }
    items
}

pub fn line(text: &str) -> Outbound {
    Outbound::Line(text.to_string())
}

pub fn contains_line(items: &[Outbound], text: &str) -> bool {
    items
        .iter()
        .any(|item| matches!(item, Outbound::Line(l) if l == text))
}
