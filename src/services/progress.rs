use std::sync::Mutex;

use crate::types::progress::ProgressEvent;

/// Ordered publish/subscribe sink for scan-lifecycle events.
///
/// Subscribers receive every event emitted after they subscribe, in
/// emission order. A terminal event (`complete` or `error`) is delivered
/// and then drops every sender, so subscriber streams end; the channel is
/// single-use per scan.
pub struct ProgressChannel {
    subscribers: Mutex<Vec<flume::Sender<ProgressEvent>>>,
}

impl ProgressChannel {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a subscriber. The receiver yields events until the scan's
    /// terminal event has been delivered, then disconnects.
    pub fn subscribe(&self) -> flume::Receiver<ProgressEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    pub fn emit(&self, event: ProgressEvent) {
        let terminal = event.is_terminal();
        let mut subscribers = self.subscribers.lock().unwrap();
        // Dropped receivers fail the send; prune them as we go.
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if terminal {
            subscribers.clear();
        }
    }

    pub fn connecting(&self, host: &str) {
        self.emit(ProgressEvent::Connecting {
            message: format!("Connecting to {}...", host),
        });
    }

    pub fn folders_found(&self, count: usize) {
        self.emit(ProgressEvent::FoldersFound {
            message: format!("Found {} folders to scan", count),
            total: count,
        });
    }

    pub fn scanning_folder(&self, folder: &str, current: usize, total: usize) {
        self.emit(ProgressEvent::ScanningFolder {
            message: format!("Scanning folder: {}", folder),
            current,
            total,
            folder: folder.to_string(),
            percentage: percentage(current, total),
        });
    }

    pub fn processing(&self, current: usize, total: usize) {
        self.emit(ProgressEvent::Processing {
            message: format!("Processing emails ({}/{})", current, total),
            current,
            total,
            percentage: percentage(current, total),
        });
    }

    pub fn saving(&self, count: usize) {
        self.emit(ProgressEvent::Saving {
            message: format!("Saving {} emails to database...", count),
        });
    }

    pub fn complete(&self, total: usize) {
        self.emit(ProgressEvent::Complete {
            message: format!("Scan complete! Found {} emails.", total),
            total,
        });
    }

    pub fn error(&self, message: &str) {
        self.emit(ProgressEvent::Error {
            message: message.to_string(),
        });
    }
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new()
    }
}

fn percentage(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((current as f64 / total as f64) * 100.0).round() as u8
}
