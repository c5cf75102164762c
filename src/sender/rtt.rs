use std::time::Duration;

use rand::Rng;

/* All figures are microseconds, the unit the ack-wait timeout is quoted in. */
const INITIAL_SRTT: f64 = 20_000.0;
const INITIAL_RTO: f64 = 30_000.0;
const RTO_CEILING: f64 = 1_000_000.0;

/*
        RFC 6298 S2

    When a subsequent RTT measurement R' is made, a host MUST set

        RTTVAR <- (1 - beta) * RTTVAR + beta * |SRTT - R'|
        SRTT <- (1 - alpha) * SRTT + alpha * R'

    The above SHOULD be computed using alpha=1/8 and beta=1/4.

    After the computation, a host MUST update
        RTO <- SRTT + max (G, K*RTTVAR)

Deviations here: srtt is updated before rttvar (so the deviation is taken
against the fresh srtt), there is no backoff, and a timeout above one second
is re-rolled to a random value below the initial timeout instead of being
clamped.
*/
#[derive(Debug, Clone)]
pub struct RttEstimator {
    srtt: f64,
    dev_rtt: f64,
    rto: f64,
}

impl RttEstimator {
    pub fn new() -> Self {
        RttEstimator {
            srtt: INITIAL_SRTT,
            dev_rtt: 0.0,
            rto: INITIAL_RTO,
        }
    }

    /* One sample per ack that retires an entry, measured against the
       entry's most recent send time. A retransmitted segment contributes a
       sample like any other. */
    pub fn sample(&mut self, rtt: Duration) {
        let r = rtt.as_micros() as f64;

        self.srtt += 0.125 * (r - self.srtt);
        self.dev_rtt = 0.75 * self.dev_rtt + 0.25 * (self.srtt - r).abs();
        self.rto = self.srtt + 4.0 * self.dev_rtt;

        if self.rto > RTO_CEILING {
            self.rto = rand::thread_rng().gen_range(0.0..INITIAL_RTO);
        }
    }

    pub fn rto(&self) -> Duration {
        Duration::from_micros(self.rto as u64)
    }
}
