use rand::Rng;

/// Drops outbound datagrams at random. Used to exercise the resend queue.
#[derive(Debug, Clone, Default)]
pub struct PacketLossSimulation {
    pub enabled: bool,
    /// Probability in `0.0..=1.0`.
    pub loss_rate: f64,
}

impl PacketLossSimulation {
    pub fn new(loss_rate: f64) -> Self {
        Self {
            enabled: loss_rate > 0.0,
            loss_rate: loss_rate.clamp(0.0, 1.0),
        }
    }

    pub fn should_drop(&self) -> bool {
        if !self.enabled || self.loss_rate <= 0.0 {
            return false;
        }
        rand::rng().random_bool(self.loss_rate.min(1.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub malformed_dropped: u64,
    pub simulated_losses: u64,
    pub retransmissions: u64,
}
