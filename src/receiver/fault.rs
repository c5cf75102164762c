use std::time::Duration;

use rand::Rng;

/* Test harness for lossy links: incoming segments are randomly dropped or
   held back before they reach the reassembly path. Outgoing acks are never
   touched. */
#[derive(Debug, Clone, Copy)]
pub struct FaultInjector {
    drop_enabled: bool,
    delay_enabled: bool,
    percent: u32,
}

impl FaultInjector {
    pub fn none() -> Self {
        FaultInjector {
            drop_enabled: false,
            delay_enabled: false,
            percent: 0,
        }
    }

    /* control: 0 none, 1 drop, 2 delay, 3 both. */
    pub fn from_control(control: u32, percent: u32) -> Option<Self> {
        let (drop_enabled, delay_enabled) = match control {
            0 => (false, false),
            1 => (true, false),
            2 => (false, true),
            3 => (true, true),
            _ => return None,
        };

        Some(FaultInjector {
            drop_enabled,
            delay_enabled,
            percent,
        })
    }

    pub fn should_drop(&self) -> bool {
        self.drop_enabled && rand::thread_rng().gen_range(0..100) < self.percent
    }

    /* Drawn independently of the drop decision. */
    pub fn delay(&self) -> Option<Duration> {
        if self.delay_enabled && rand::thread_rng().gen_range(0..100) < self.percent {
            let millis = rand::thread_rng().gen_range(0..10u64);
            Some(Duration::from_micros(millis * 1000))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_values_map_to_drop_and_delay() {
        assert!(!FaultInjector::from_control(0, 50).unwrap().drop_enabled);
        assert!(FaultInjector::from_control(1, 50).unwrap().drop_enabled);
        assert!(FaultInjector::from_control(2, 50).unwrap().delay_enabled);

        let both = FaultInjector::from_control(3, 50).unwrap();
        assert!(both.drop_enabled && both.delay_enabled);

        assert!(FaultInjector::from_control(4, 50).is_none());
    }

    #[test]
    fn zero_percent_never_fires() {
        let fault = FaultInjector::from_control(3, 0).unwrap();
        for _ in 0..1000 {
            assert!(!fault.should_drop());
            assert!(fault.delay().is_none());
        }
    }

    #[test]
    fn hundred_percent_always_fires() {
        let fault = FaultInjector::from_control(3, 100).unwrap();
        for _ in 0..1000 {
            assert!(fault.should_drop());
            assert!(fault.delay().unwrap() < Duration::from_millis(10));
        }
    }

    #[test]
    fn disabled_injector_is_inert() {
        let fault = FaultInjector::none();
        for _ in 0..100 {
            assert!(!fault.should_drop());
            assert!(fault.delay().is_none());
        }
    }
}
