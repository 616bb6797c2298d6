use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use scopelog_types::Notification;

/// Events consumed by the main loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Drives demo traffic and redraws
    Tick,
    Key(KeyEvent),
    Resize(u16, u16),
    /// Error reading terminal input
    Error(String),
    /// Notification forwarded from the log engine
    Notify(Notification),
}

impl Event {
    /// Map a terminal event; key releases and repeats are dropped
    pub fn from_terminal(event: CrosstermEvent) -> Option<Self> {
        match event {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Self::Key(key)),
            CrosstermEvent::Resize(width, height) => Some(Self::Resize(width, height)),
            _ => None,
        }
    }
}

/// Cloneable handle that feeds the main loop from outside the terminal reader
#[derive(Clone, Debug)]
pub struct EventSender(mpsc::UnboundedSender<Event>);

impl EventSender {
    /// Forward an engine notification; false once the loop has gone away
    pub fn notify(&self, kind: Notification) -> bool {
        self.0.send(Event::Notify(kind)).is_ok()
    }
}

/// Single queue for terminal input, ticks and engine notifications
pub struct EventHandler {
    sender: mpsc::UnboundedSender<Event>,
    receiver: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventHandler {
    /// Spawn the terminal reader; must be called inside a tokio runtime
    pub fn new(tick_rate: Duration) -> Self {
        let handler = Self::detached();

        let mut ticks = tokio::time::interval(tick_rate);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::spawn(read_terminal(
            handler.sender.clone(),
            handler.cancel.clone(),
            ticks,
        ));

        handler
    }

    /// Queue with no terminal reader attached
    fn detached() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            cancel: CancellationToken::new(),
        }
    }

    pub fn sender(&self) -> EventSender {
        EventSender(self.sender.clone())
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Stop the terminal reader; queued events stay readable
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn read_terminal(
    sender: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    mut ticks: Interval,
) {
    let mut input = EventStream::new();

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticks.tick() => Event::Tick,
            next = input.next() => match next {
                Some(Ok(raw)) => match Event::from_terminal(raw) {
                    Some(event) => event,
                    None => continue,
                },
                Some(Err(e)) => Event::Error(e.to_string()),
                None => return,
            },
        };

        if sender.send(event).is_err() {
            return;
        }
    }
}
