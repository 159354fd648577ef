use crate::domain::session::{NavCommand, ScanEvent, SessionMachine, SessionView};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// Folds scanner events and UI commands into the session machine until both
/// channels close, publishing every new view.
///
/// Returns the final view.
pub async fn run_session(
    mut machine: SessionMachine,
    mut events: mpsc::UnboundedReceiver<ScanEvent>,
    mut commands: mpsc::Receiver<NavCommand>,
    views: watch::Sender<SessionView>,
) -> SessionView {
    let mut events_open = true;
    let mut commands_open = true;

    while events_open || commands_open {
        let view = tokio::select! {
            event = events.recv(), if events_open => match event {
                Some(event) => machine.apply_event(&event).clone(),
                None => {
                    events_open = false;
                    continue;
                }
            },
            command = commands.recv(), if commands_open => match command {
                Some(command) => machine.apply_command(command).clone(),
                None => {
                    commands_open = false;
                    continue;
                }
            },
        };
        debug!(state = ?view.state, balance = %view.balance, "Session view updated");
        views.send_replace(view);
    }

    machine.view().clone()
}

/// Handles to a session task spawned by [`spawn_session`].
pub struct SessionHandle {
    pub commands: mpsc::Sender<NavCommand>,
    pub views: watch::Receiver<SessionView>,
    pub task: JoinHandle<SessionView>,
}

/// Spawns [`run_session`] on the current runtime.
///
/// The task ends once the event sender is dropped and `commands` is dropped too.
pub fn spawn_session(
    machine: SessionMachine,
    events: mpsc::UnboundedReceiver<ScanEvent>,
) -> SessionHandle {
    let (commands_tx, commands_rx) = mpsc::channel(16);
    let (views_tx, views_rx) = watch::channel(machine.view().clone());
    let task = tokio::spawn(run_session(machine, events, commands_rx, views_tx));
    SessionHandle {
        commands: commands_tx,
        views: views_rx,
        task,
    }
}
