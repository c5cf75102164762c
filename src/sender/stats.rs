use std::time::Duration;

use log::info;

use super::Phase;

/* Send counters partitioned by the congestion phase they were issued in. */
#[derive(Debug, Clone, Default)]
pub struct PacketStats {
    pub slow_start_packets: u64,
    pub cong_avd_packets: u64,
    pub retransmits: u64,
}

impl PacketStats {
    pub fn new() -> Self {
        PacketStats::default()
    }

    pub fn record_send(&mut self, phase: Phase) {
        match phase {
            Phase::SlowStart => self.slow_start_packets += 1,
            Phase::CongAvd => self.cong_avd_packets += 1,
            Phase::FastRecovery => {}
        }
    }

    pub fn total_sent(&self) -> u64 {
        self.slow_start_packets + self.cong_avd_packets
    }

    pub fn log_summary(&self, elapsed: Duration) {
        let total = self.total_sent();

        info!("========================================");
        info!("Total time: {:.6} secs", elapsed.as_secs_f64());
        info!(
            "Packets sent: slow start: {} cong avd: {}",
            self.slow_start_packets, self.cong_avd_packets
        );
        if total > 0 {
            info!(
                "Phase split: slow start: {:.1}% cong avd: {:.1}%",
                self.slow_start_packets as f64 / total as f64 * 100.0,
                self.cong_avd_packets as f64 / total as f64 * 100.0
            );
        }
        info!("Retransmissions: {}", self.retransmits);
        info!("========================================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sends_are_split_by_phase() {
        let mut stats = PacketStats::new();
        stats.record_send(Phase::SlowStart);
        stats.record_send(Phase::SlowStart);
        stats.record_send(Phase::CongAvd);
        stats.record_send(Phase::FastRecovery);

        assert_eq!(stats.slow_start_packets, 2);
        assert_eq!(stats.cong_avd_packets, 1);
        assert_eq!(stats.total_sent(), 3);
    }
}
