use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use crate::game::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCommand {
    Steer(Direction),
}

/// Cloneable remote control for a controller running on another thread.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    commands: Sender<NodeCommand>,
    running: Arc<AtomicBool>,
}

impl NodeHandle {
    pub(crate) fn new(commands: Sender<NodeCommand>, running: Arc<AtomicBool>) -> Self {
        Self { commands, running }
    }

    /// Returns `false` once the controller is gone.
    pub fn steer(&self, direction: Direction) -> bool {
        self.commands.send(NodeCommand::Steer(direction)).is_ok()
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
