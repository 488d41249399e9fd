use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Instant;

use log::{debug, error, info, trace, warn};

use super::config::NodeConfig;
use super::error::NodeError;
use super::events::{MasterChange, NodeEvent};
use super::handle::{NodeCommand, NodeHandle};
use super::roles::pick_deputy;
use crate::game::{
    Direction, GameConfig, GameState, NetAddress, NodeRole, PlayerId, PlayerInfo, PlayerType,
    ROUND_RESTART_PAUSE, Simulation, TickOutcome, UNASSIGNED_ID,
};
use crate::net::{
    Announcement, Message, MessageHeader, MessagePayload, NetworkEndpoint, NetworkStats,
    PeerTable, ResendQueue,
};
use crate::presentation::Presenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MasterLink {
    id: PlayerId,
    addr: SocketAddr,
}

/// The node event loop. Owns the socket, the role state machine and, while
/// this node is master, the simulation.
pub struct NodeController {
    endpoint: NetworkEndpoint,
    node_config: NodeConfig,
    presenter: Arc<dyn Presenter>,
    role: NodeRole,
    my_id: PlayerId,
    master: Option<MasterLink>,
    simulation: Option<Simulation>,
    replica: Option<GameState>,
    timings: GameConfig,
    peers: PeerTable,
    resend: ResendQueue,
    sequence: u64,
    next_tick: Instant,
    next_announce: Instant,
    command_tx: Sender<NodeCommand>,
    command_rx: Receiver<NodeCommand>,
    running: Arc<AtomicBool>,
    pending_events: VecDeque<NodeEvent>,
}

impl NodeController {
    fn new(
        mut endpoint: NetworkEndpoint,
        timings: GameConfig,
        node_config: NodeConfig,
        presenter: Arc<dyn Presenter>,
        role: NodeRole,
        my_id: PlayerId,
    ) -> Self {
        if let Some(loss) = node_config.packet_loss.clone() {
            endpoint.set_loss_simulation(loss);
        }
        let (command_tx, command_rx) = mpsc::channel();
        let now = Instant::now();

        Self {
            endpoint,
            presenter,
            role,
            my_id,
            master: None,
            simulation: None,
            replica: None,
            peers: PeerTable::new(timings.ping_delay(), timings.node_timeout()),
            resend: ResendQueue::new(timings.ping_delay()),
            timings,
            sequence: 0,
            next_tick: now + timings.iteration_delay(),
            next_announce: now,
            command_tx,
            command_rx,
            running: Arc::new(AtomicBool::new(true)),
            pending_events: VecDeque::new(),
            node_config,
        }
    }

    /// Starts a new game with this node as master and player 0.
    pub fn host(
        endpoint: NetworkEndpoint,
        config: GameConfig,
        node_config: NodeConfig,
        presenter: Arc<dyn Presenter>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let me = PlayerInfo::new(
            0,
            node_config.player_name.clone(),
            None,
            NodeRole::Master,
            node_config.player_type,
        );
        let mut controller =
            Self::new(endpoint, config, node_config, presenter, NodeRole::Master, 0);
        let simulation = Simulation::new(config, me);
        controller.presenter.paint_state(simulation.snapshot());
        controller.simulation = Some(simulation);

        info!(
            "Hosting {}x{} game on {}",
            config.width,
            config.height,
            controller.local_addr()
        );
        Ok(controller)
    }

    /// Joins the game run by `master_addr`, retrying the Join every ping
    /// interval until Ack, Error or `join_timeout`. `config` supplies the
    /// timings used until the first snapshot arrives.
    pub fn join(
        mut endpoint: NetworkEndpoint,
        master_addr: SocketAddr,
        config: GameConfig,
        only_view: bool,
        node_config: NodeConfig,
        presenter: Arc<dyn Presenter>,
    ) -> Result<Self, NodeError> {
        if let Some(loss) = node_config.packet_loss.clone() {
            endpoint.set_loss_simulation(loss);
        }

        let join_sequence = 0;
        let request = Message::new(
            MessageHeader::new(join_sequence, UNASSIGNED_ID, UNASSIGNED_ID),
            MessagePayload::Join {
                player_type: node_config.player_type,
                only_view,
                player_name: node_config.player_name.clone(),
            },
        );
        let data = request.encode()?;

        let start = Instant::now();
        let deadline = start + node_config.join_timeout;
        let mut next_send = start;
        let mut backlog = Vec::new();

        let (my_id, master_id) = loop {
            let now = Instant::now();
            if now >= deadline {
                warn!("No answer from {} to join request", master_addr);
                return Err(NodeError::JoinTimeout {
                    addr: master_addr,
                    timeout: node_config.join_timeout,
                });
            }
            if now >= next_send {
                endpoint.send_raw(&data, master_addr)?;
                next_send = now + config.ping_delay();
            }

            let wait = next_send.min(deadline).saturating_duration_since(now);
            let Some((message, from)) = endpoint.receive_timeout(wait)? else {
                continue;
            };
            if from != master_addr {
                trace!("Ignoring {} from {} while joining", message.payload.kind(), from);
                continue;
            }
            match message.payload {
                MessagePayload::Ack if message.sequence() == join_sequence => {
                    break (message.receiver_id(), message.sender_id());
                }
                MessagePayload::Error { reason } => {
                    warn!("Join rejected by {}: {}", master_addr, reason);
                    presenter.show_error_message(&reason);
                    return Err(NodeError::JoinRejected(reason));
                }
                _ => backlog.push((message, from)),
            }
        };

        let role = if only_view {
            NodeRole::Viewer
        } else {
            NodeRole::Normal
        };
        let mut controller = Self::new(endpoint, config, node_config, presenter, role, my_id);
        controller.sequence = join_sequence + 1;
        controller.adopt_master(master_id, master_addr, Instant::now());
        info!(
            "Joined game at {} as player {} ({})",
            master_addr,
            my_id,
            role.as_str()
        );

        for (message, from) in backlog {
            controller.dispatch(message, from)?;
        }
        Ok(controller)
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn my_id(&self) -> PlayerId {
        self.my_id
    }

    pub fn master_id(&self) -> Option<PlayerId> {
        match self.role {
            NodeRole::Master => Some(self.my_id),
            _ => self.master.map(|m| m.id),
        }
    }

    pub fn master_addr(&self) -> Option<SocketAddr> {
        match self.role {
            NodeRole::Master => Some(self.local_addr()),
            _ => self.master.map(|m| m.addr),
        }
    }

    /// Latest snapshot: the live one on the master, the last adopted one elsewhere.
    pub fn state(&self) -> Option<&GameState> {
        match &self.simulation {
            Some(simulation) => Some(simulation.state()),
            None => self.replica.as_ref(),
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub fn stats(&self) -> &NetworkStats {
        self.endpoint.stats()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn pending_resends(&self) -> usize {
        self.resend.len()
    }

    pub fn handle(&self) -> NodeHandle {
        NodeHandle::new(self.command_tx.clone(), Arc::clone(&self.running))
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = NodeEvent> + '_ {
        self.pending_events.drain(..)
    }

    /// Runs until the interrupt flag is cleared. Pending resends are not flushed.
    pub fn run(&mut self) -> Result<(), NodeError> {
        while self.running.load(Ordering::SeqCst) {
            if let Err(e) = self.poll_once() {
                error!("Node {} stopping: {}", self.my_id, e);
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        }
        info!("Node {} shut down", self.my_id);
        Ok(())
    }

    /// One loop iteration: drain local commands, wait for at most one datagram
    /// until the nearest deadline, then fire whatever timers are due.
    pub fn poll_once(&mut self) -> Result<(), NodeError> {
        self.drain_commands()?;

        let now = Instant::now();
        let wait = self
            .next_deadline()
            .map_or(self.node_config.max_wait, |deadline| {
                deadline.saturating_duration_since(now)
            })
            .min(self.node_config.max_wait);

        if let Some((message, from)) = self.endpoint.receive_timeout(wait)? {
            self.dispatch(message, from)?;
        }
        self.fire_timers(Instant::now())
    }

    fn next_deadline(&self) -> Option<Instant> {
        let master_timers = match self.role {
            NodeRole::Master => [Some(self.next_tick), Some(self.next_announce)],
            _ => [None, None],
        };
        master_timers
            .into_iter()
            .chain([self.peers.next_deadline(), self.resend.next_deadline()])
            .flatten()
            .min()
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        sequence
    }

    fn send_unreliable(
        &mut self,
        payload: MessagePayload,
        sequence: u64,
        receiver_id: PlayerId,
        addr: SocketAddr,
    ) -> Result<(), NodeError> {
        let message = Message::new(MessageHeader::new(sequence, self.my_id, receiver_id), payload);
        self.endpoint.send_to(&message, addr)?;
        if let Some(id) = self.peers.id_by_addr(addr) {
            self.peers.touch_sent(id, Instant::now());
        }
        Ok(())
    }

    fn send_reliable(&mut self, peer: PlayerId, payload: MessagePayload) -> Result<(), NodeError> {
        let Some(addr) = self.peers.addr(peer) else {
            debug!("No address for peer {}, dropping {}", peer, payload.kind());
            return Ok(());
        };
        let sequence = self.next_sequence();
        let message = Message::new(MessageHeader::new(sequence, self.my_id, peer), payload);
        let data = self.endpoint.send_to(&message, addr)?;
        let now = Instant::now();
        self.resend.enqueue(peer, sequence, data, now);
        self.peers.touch_sent(peer, now);
        Ok(())
    }

    fn send_ack(&mut self, message: &Message, addr: SocketAddr) -> Result<(), NodeError> {
        self.send_unreliable(MessagePayload::Ack, message.sequence(), message.sender_id(), addr)
    }

    fn drain_commands(&mut self) -> Result<(), NodeError> {
        loop {
            match self.command_rx.try_recv() {
                Ok(NodeCommand::Steer(direction)) => self.steer_local(direction)?,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
    }

    fn steer_local(&mut self, direction: Direction) -> Result<(), NodeError> {
        match self.role {
            NodeRole::Master => {
                if let Some(simulation) = self.simulation.as_mut() {
                    simulation.state_mut().steer(self.my_id, direction);
                }
                Ok(())
            }
            NodeRole::Viewer => Ok(()),
            NodeRole::Normal | NodeRole::Deputy => {
                let Some(master) = self.master else {
                    return Ok(());
                };
                let sequence = self.next_sequence();
                self.send_unreliable(
                    MessagePayload::Steer { direction },
                    sequence,
                    master.id,
                    master.addr,
                )
            }
        }
    }

    fn dispatch(&mut self, message: Message, from: SocketAddr) -> Result<(), NodeError> {
        let now = Instant::now();
        let sender = self.peers.id_by_addr(from);
        if let Some(id) = sender {
            self.peers.touch_received(id, now);
        }
        trace!(
            "{} #{} from {} ({:?})",
            message.payload.kind(),
            message.sequence(),
            from,
            sender
        );

        let is_join = matches!(message.payload, MessagePayload::Join { .. });
        if message.payload.requires_ack() && !is_join {
            self.send_ack(&message, from)?;
        }

        let header = message.header;
        match message.payload {
            MessagePayload::Ack => {
                if let Some(id) = sender {
                    if !self.resend.acknowledge(id, header.sequence) {
                        trace!("Duplicate ack #{} from {}", header.sequence, id);
                    }
                }
            }
            MessagePayload::Ping => {}
            MessagePayload::Join {
                player_type,
                only_view,
                player_name,
            } => self.handle_join(&header, from, player_type, only_view, player_name)?,
            MessagePayload::State(state) => self.handle_state(header.sender_id, from, state)?,
            MessagePayload::Steer { direction } => {
                if let (Some(id), Some(simulation)) = (sender, self.simulation.as_mut()) {
                    simulation.state_mut().steer(id, direction);
                }
            }
            MessagePayload::ChangeRole {
                sender_role,
                receiver_role,
            } => self.handle_change_role(header.sender_id, from, sender_role, receiver_role)?,
            MessagePayload::Error { reason } => {
                warn!("Error from {}: {}", from, reason);
                self.presenter.show_error_message(&reason);
            }
            MessagePayload::Announcement(_) => {}
        }
        Ok(())
    }

    fn handle_join(
        &mut self,
        header: &MessageHeader,
        from: SocketAddr,
        player_type: PlayerType,
        only_view: bool,
        player_name: String,
    ) -> Result<(), NodeError> {
        if self.role != NodeRole::Master {
            debug!("Ignoring join from {}: not the master", from);
            return Ok(());
        }

        if let Some(existing) = self.peers.id_by_addr(from) {
            // retransmitted join whose ack got lost
            return self.send_unreliable(MessagePayload::Ack, header.sequence, existing, from);
        }

        let Some(simulation) = self.simulation.as_mut() else {
            return Ok(());
        };
        let id = simulation.state().next_free_id();
        let role = if only_view {
            NodeRole::Viewer
        } else {
            NodeRole::Normal
        };
        let player = PlayerInfo::new(
            id,
            player_name,
            NetAddress::from_socket_addr(from),
            role,
            player_type,
        );

        if !simulation.add_player(player) {
            let reason = "no free space on the board".to_string();
            warn!("Rejected join from {}: {}", from, reason);
            self.pending_events.push_back(NodeEvent::JoinRejected {
                addr: from,
                reason: reason.clone(),
            });
            return self.send_unreliable(
                MessagePayload::Error { reason },
                header.sequence,
                header.sender_id,
                from,
            );
        }

        self.peers.insert(id, from, Instant::now());
        self.send_unreliable(MessagePayload::Ack, header.sequence, id, from)?;
        info!("Player {} joined from {} as {}", id, from, role.as_str());
        self.pending_events
            .push_back(NodeEvent::PlayerJoined { id, addr: from, role });

        let needs_deputy = self.state().is_some_and(|s| s.deputy().is_none());
        if !only_view && needs_deputy {
            self.assign_deputy(id)?;
        }
        Ok(())
    }

    fn handle_state(
        &mut self,
        sender_id: PlayerId,
        from: SocketAddr,
        state: GameState,
    ) -> Result<(), NodeError> {
        if self.role == NodeRole::Master {
            error!("Received game state from {} while being master", from);
            return Err(NodeError::ConflictingMaster {
                id: sender_id,
                addr: from,
            });
        }
        if self.master.map(|m| m.addr) != Some(from) {
            debug!("Ignoring state from {}: not our master", from);
            return Ok(());
        }
        if let Some(current) = &self.replica {
            if !state.is_newer_than(current) {
                trace!("Stale state {:?} <= {:?}", state.freshness(), current.freshness());
                return Ok(());
            }
        }

        if state.config != self.timings {
            self.apply_timings(state.config);
        }
        self.presenter.paint_state(state.clone());
        self.replica = Some(state);
        Ok(())
    }

    fn handle_change_role(
        &mut self,
        sender_id: PlayerId,
        from: SocketAddr,
        sender_role: Option<NodeRole>,
        receiver_role: Option<NodeRole>,
    ) -> Result<(), NodeError> {
        if sender_role == Some(NodeRole::Master) {
            if self.role == NodeRole::Master {
                error!("Player {} at {} claims master as well", sender_id, from);
                return Err(NodeError::ConflictingMaster {
                    id: sender_id,
                    addr: from,
                });
            }
            if self.master.map(|m| m.addr) != Some(from) {
                info!("Player {} at {} is the new master", sender_id, from);
                self.switch_master(sender_id, from, MasterChange::Announced);
            } else if self.master.map(|m| m.id) != Some(sender_id) {
                self.adopt_master(sender_id, from, Instant::now());
            }
        }

        match receiver_role {
            Some(NodeRole::Deputy) if self.role == NodeRole::Normal => {
                self.set_role(NodeRole::Deputy);
            }
            Some(NodeRole::Master) if self.role != NodeRole::Master => {
                let old_master = self.master.map(|m| m.id);
                self.promote_to_master(old_master)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn fire_timers(&mut self, now: Instant) -> Result<(), NodeError> {
        if self.role == NodeRole::Master {
            if now >= self.next_tick {
                self.run_tick(now)?;
            }
            if now >= self.next_announce {
                self.announce()?;
                self.next_announce = now + self.node_config.announce_interval;
            }
        }

        for (peer, data) in self.resend.take_due(now) {
            let Some(addr) = self.peers.addr(peer) else {
                continue;
            };
            debug!("Resending {} bytes to {}", data.len(), peer);
            self.endpoint.send_raw(&data, addr)?;
            self.endpoint.record_retransmission();
            self.peers.touch_sent(peer, now);
        }

        for peer in self.peers.pings_due(now) {
            self.send_reliable(peer, MessagePayload::Ping)?;
        }

        for peer in self.peers.timed_out(now) {
            if self.peers.contains(peer) {
                self.handle_peer_timeout(peer)?;
            }
        }
        Ok(())
    }

    fn run_tick(&mut self, now: Instant) -> Result<(), NodeError> {
        let Some(simulation) = self.simulation.as_mut() else {
            return Ok(());
        };
        let outcome = simulation.tick();
        let snapshot = simulation.snapshot();

        let delay = self.timings.iteration_delay();
        self.next_tick = (self.next_tick + delay).max(now);
        if outcome == TickOutcome::RoundRestarted {
            self.next_tick = now + ROUND_RESTART_PAUSE + delay;
            self.pending_events.push_back(NodeEvent::RoundRestarted {
                round: snapshot.round,
            });
        }

        for peer in self.peers.ids() {
            self.send_reliable(peer, MessagePayload::State(snapshot.clone()))?;
        }
        self.presenter.paint_state(snapshot);
        Ok(())
    }

    /// Multicasts the current game. A failed send is logged and skipped, so a
    /// host without a multicast route stays reachable by address only.
    fn announce(&mut self) -> Result<(), NodeError> {
        let Some(state) = self.state() else {
            return Ok(());
        };
        let payload = MessagePayload::Announcement(Announcement::from_state(state));
        let sequence = self.next_sequence();
        let target = self.node_config.announce_target;
        let message = Message::new(MessageHeader::new(sequence, self.my_id, UNASSIGNED_ID), payload);
        if let Err(e) = self.endpoint.send_to(&message, target) {
            warn!("Announcement to {} failed: {}", target, e);
        }
        Ok(())
    }

    fn handle_peer_timeout(&mut self, peer: PlayerId) -> Result<(), NodeError> {
        warn!("Peer {} timed out", peer);
        self.pending_events
            .push_back(NodeEvent::PeerTimedOut { id: peer });

        match self.role {
            NodeRole::Master => self.remove_peer(peer),
            NodeRole::Deputy if self.master.map(|m| m.id) == Some(peer) => {
                self.promote_to_master(Some(peer))
            }
            NodeRole::Normal | NodeRole::Viewer if self.master.map(|m| m.id) == Some(peer) => {
                self.fail_over_to_deputy(peer)
            }
            _ => {
                self.peers.remove(peer);
                self.resend.drop_peer(peer);
                Ok(())
            }
        }
    }

    /// Master side: forget a dead peer, leave its snake behind as a zombie and
    /// replace it if it was the deputy.
    fn remove_peer(&mut self, peer: PlayerId) -> Result<(), NodeError> {
        self.peers.remove(peer);
        self.resend.drop_peer(peer);
        let Some(simulation) = self.simulation.as_mut() else {
            return Ok(());
        };
        let Some(removed) = simulation.state_mut().remove_player(peer) else {
            return Ok(());
        };
        info!("Removed player {} ({})", removed.id, removed.name);

        if removed.role == NodeRole::Deputy {
            self.choose_new_deputy()?;
        }
        Ok(())
    }

    /// Deputy pick among the players we can currently reach.
    fn deputy_candidate(&self) -> Option<PlayerId> {
        let state = self.state()?;
        let reachable = state
            .players
            .values()
            .filter(|p| p.id == self.my_id || self.peers.contains(p.id));
        pick_deputy(reachable, self.my_id)
    }

    fn choose_new_deputy(&mut self) -> Result<(), NodeError> {
        match self.deputy_candidate() {
            Some(id) => self.assign_deputy(id),
            None => {
                debug!("No candidate for deputy");
                Ok(())
            }
        }
    }

    fn assign_deputy(&mut self, id: PlayerId) -> Result<(), NodeError> {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.state_mut().set_role(id, NodeRole::Deputy);
        }
        info!("Player {} is now deputy", id);
        self.pending_events.push_back(NodeEvent::DeputyAssigned { id });
        self.send_reliable(
            id,
            MessagePayload::ChangeRole {
                sender_role: Some(NodeRole::Master),
                receiver_role: Some(NodeRole::Deputy),
            },
        )
    }

    /// Normal side: the master is gone, carry on with its deputy.
    fn fail_over_to_deputy(&mut self, dead_master: PlayerId) -> Result<(), NodeError> {
        self.peers.clear();
        self.resend.clear();

        let deputy = self
            .replica
            .as_ref()
            .and_then(|state| state.deputy())
            .filter(|deputy| deputy.id != dead_master)
            .and_then(|deputy| deputy.socket_addr().map(|addr| (deputy.id, addr)));

        let Some((id, addr)) = deputy else {
            error!("Master {} lost and no deputy to fall back on", dead_master);
            return Err(NodeError::NoDeputy {
                master: dead_master,
            });
        };
        if id == self.my_id {
            // our promotion is still in flight
            return self.promote_to_master(Some(dead_master));
        }
        info!("Master {} lost, switching to deputy {} at {}", dead_master, id, addr);
        self.switch_master(id, addr, MasterChange::Timeout);
        Ok(())
    }

    /// Deputy side: take over the last replicated snapshot and run the game.
    fn promote_to_master(&mut self, old_master: Option<PlayerId>) -> Result<(), NodeError> {
        let Some(mut state) = self.replica.take() else {
            error!("Cannot become master without a snapshot");
            return Err(NodeError::NoSnapshot);
        };
        if let Some(old) = old_master {
            state.remove_player(old);
        }
        state.set_role(self.my_id, NodeRole::Master);
        if let Some(me) = state.player_mut(self.my_id) {
            me.address = None;
        }

        let now = Instant::now();
        self.peers.clear();
        self.resend.clear();
        for player in state.players.values() {
            if player.id == self.my_id {
                continue;
            }
            if let Some(addr) = player.socket_addr() {
                self.peers.insert(player.id, addr, now);
            }
        }

        self.apply_timings(state.config);
        self.simulation = Some(Simulation::from_state(state));
        self.master = None;
        self.set_role(NodeRole::Master);
        self.next_tick = now + self.timings.iteration_delay();
        self.next_announce = now;
        info!("Player {} took over as master", self.my_id);

        let deputy = self.deputy_candidate();
        for peer in self.peers.ids() {
            let receiver_role = if Some(peer) == deputy {
                if let Some(simulation) = self.simulation.as_mut() {
                    simulation.state_mut().set_role(peer, NodeRole::Deputy);
                }
                self.pending_events
                    .push_back(NodeEvent::DeputyAssigned { id: peer });
                Some(NodeRole::Deputy)
            } else {
                None
            };
            self.send_reliable(
                peer,
                MessagePayload::ChangeRole {
                    sender_role: Some(NodeRole::Master),
                    receiver_role,
                },
            )?;
        }
        Ok(())
    }

    fn switch_master(&mut self, id: PlayerId, addr: SocketAddr, cause: MasterChange) {
        self.peers.clear();
        self.resend.clear();
        self.adopt_master(id, addr, Instant::now());
        self.pending_events
            .push_back(NodeEvent::MasterChanged { id, addr, cause });
    }

    fn adopt_master(&mut self, id: PlayerId, addr: SocketAddr, now: Instant) {
        if let Some(old) = self.master {
            self.peers.remove(old.id);
            self.resend.drop_peer(old.id);
        }
        self.master = Some(MasterLink { id, addr });
        self.peers.insert(id, addr, now);
    }

    fn set_role(&mut self, role: NodeRole) {
        if self.role == role {
            return;
        }
        info!(
            "Player {} role {} -> {}",
            self.my_id,
            self.role.as_str(),
            role.as_str()
        );
        self.pending_events.push_back(NodeEvent::RoleChanged {
            from: self.role,
            to: role,
        });
        self.role = role;
    }

    fn apply_timings(&mut self, config: GameConfig) {
        self.timings = config;
        self.peers
            .set_timings(config.ping_delay(), config.node_timeout());
        self.resend.set_interval(config.ping_delay());
    }
}
