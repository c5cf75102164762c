use std::cmp;

/*
        RFC 5681 S3.1

    The slow start algorithm is used when cwnd < ssthresh, while the
    congestion avoidance algorithm is used when cwnd > ssthresh.  When
    cwnd and ssthresh are equal, the sender may use either slow start or
    congestion avoidance.

Here the phases are an explicit tag rather than a comparison: the transfer
moves between them only at the transition points below, and fast recovery is
a phase of its own.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SlowStart,
    CongAvd,
    FastRecovery,
}

/* cwnd and ssthresh are counted in segments, not bytes. */
#[derive(Debug, Clone)]
pub struct Congestion {
    pub cwnd: u64,
    pub ssthresh: u64,
    pub phase: Phase,
}

impl Congestion {
    pub fn new() -> Self {
        Congestion {
            cwnd: 1,
            ssthresh: 128,
            phase: Phase::SlowStart,
        }
    }

    /* Growth happens once per fully drained window, not per ack. */
    pub fn on_window_drained(&mut self) {
        match self.phase {
            Phase::SlowStart => self.cwnd *= 2,
            Phase::CongAvd | Phase::FastRecovery => self.cwnd += 1,
        }
    }

    /* Leaving slow start restarts the window at 1 and pins ssthresh to 64.
       Checked after every processed ack. */
    pub fn maybe_leave_slow_start(&mut self) {
        if self.phase == Phase::SlowStart && self.cwnd >= self.ssthresh {
            self.phase = Phase::CongAvd;
            self.cwnd = 1;
            self.ssthresh = 64;
        }
    }

    /* An ack that advances send_base ends fast recovery. */
    pub fn on_new_ack(&mut self) {
        if self.phase == Phase::FastRecovery {
            self.cwnd += 1;
            self.phase = Phase::CongAvd;
        }
    }

    /* A retransmission timeout interrupts whatever phase is active,
       fast recovery included. */
    pub fn on_timeout(&mut self) {
        self.ssthresh = cmp::max(1, self.cwnd / 2);
        self.cwnd = 1;
        self.phase = Phase::SlowStart;
    }

    pub fn on_triple_dup_ack(&mut self) {
        if self.cwnd > 1 {
            self.cwnd /= 2;
        }
        self.ssthresh = self.cwnd;
        self.phase = Phase::FastRecovery;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_start_doubles_per_drained_window() {
        let mut congestion = Congestion::new();
        assert_eq!(congestion.cwnd, 1);
        assert_eq!(congestion.ssthresh, 128);
        assert_eq!(congestion.phase, Phase::SlowStart);

        for expected in [2u64, 4, 8, 16] {
            congestion.on_window_drained();
            assert_eq!(congestion.cwnd, expected);
        }
    }

    #[test]
    fn reaching_ssthresh_leaves_slow_start_and_restarts_the_window() {
        let mut congestion = Congestion::new();
        for _ in 0..7 {
            congestion.on_window_drained();
            congestion.maybe_leave_slow_start();
        }

        // 1 doubled seven times hits 128 == ssthresh.
        assert_eq!(congestion.phase, Phase::CongAvd);
        assert_eq!(congestion.cwnd, 1);
        assert_eq!(congestion.ssthresh, 64);
    }

    #[test]
    fn congestion_avoidance_grows_linearly() {
        let mut congestion = Congestion {
            cwnd: 5,
            ssthresh: 64,
            phase: Phase::CongAvd,
        };

        congestion.on_window_drained();
        congestion.maybe_leave_slow_start();

        assert_eq!(congestion.cwnd, 6);
        assert_eq!(congestion.phase, Phase::CongAvd);
    }

    #[test]
    fn triple_dup_ack_halves_the_window_into_fast_recovery() {
        let mut congestion = Congestion {
            cwnd: 8,
            ssthresh: 128,
            phase: Phase::SlowStart,
        };

        congestion.on_triple_dup_ack();

        assert_eq!(congestion.cwnd, 4);
        assert_eq!(congestion.ssthresh, 4);
        assert_eq!(congestion.phase, Phase::FastRecovery);
    }

    #[test]
    fn window_of_one_survives_a_triple_dup_ack() {
        let mut congestion = Congestion::new();
        congestion.on_triple_dup_ack();

        assert_eq!(congestion.cwnd, 1);
        assert_eq!(congestion.ssthresh, 1);
    }

    #[test]
    fn advancing_ack_exits_fast_recovery() {
        let mut congestion = Congestion {
            cwnd: 4,
            ssthresh: 4,
            phase: Phase::FastRecovery,
        };

        congestion.on_new_ack();

        assert_eq!(congestion.cwnd, 5);
        assert_eq!(congestion.phase, Phase::CongAvd);

        // Outside fast recovery the ack itself changes nothing.
        congestion.on_new_ack();
        assert_eq!(congestion.cwnd, 5);
    }

    #[test]
    fn timeout_resets_to_slow_start_from_any_phase() {
        for phase in [Phase::SlowStart, Phase::CongAvd, Phase::FastRecovery] {
            let mut congestion = Congestion {
                cwnd: 10,
                ssthresh: 128,
                phase,
            };

            congestion.on_timeout();

            assert_eq!(congestion.cwnd, 1);
            assert_eq!(congestion.ssthresh, 5);
            assert_eq!(congestion.phase, Phase::SlowStart);
        }
    }

    #[test]
    fn timeout_ssthresh_never_drops_below_one() {
        let mut congestion = Congestion::new();
        congestion.on_timeout();

        assert_eq!(congestion.ssthresh, 1);
    }
}
