use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use opsdesk::channel::{ChannelError, RealtimeTransport, TransportSignal};

/// Transport whose sessions replay pre-scripted signal batches.
///
/// Each `open` call consumes the next script. Senders are held so a session
/// only ends through an explicit `Disconnected` signal, like a stream that
/// stays open between events.
pub struct ScriptedTransport {
    scripts: Mutex<Vec<Vec<TransportSignal>>>,
    held_open: Mutex<Vec<mpsc::UnboundedSender<TransportSignal>>>,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<Vec<TransportSignal>>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            held_open: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RealtimeTransport for ScriptedTransport {
    async fn open(&self) -> Result<mpsc::UnboundedReceiver<TransportSignal>, ChannelError> {
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.is_empty() {
            return Err(ChannelError::Connect("no more scripted sessions".to_string()));
        }
        let signals = scripts.remove(0);
        let (tx, rx) = mpsc::unbounded_channel();
        for signal in signals {
            let _ = tx.send(signal);
        }
        self.held_open.lock().unwrap().push(tx);
        Ok(rx)
    }
}
