//! Unit tests for dt-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EdgeId, NodeId, VehicleId};

    #[test]
    fn index_roundtrip() {
        let id = VehicleId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(VehicleId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(VehicleId(0) < VehicleId(1));
        assert!(NodeId(100) > NodeId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(VehicleId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::default(), EdgeId::INVALID);
    }

    #[test]
    fn parse_bare_integer() {
        assert_eq!(" 17".parse::<EdgeId>().unwrap(), EdgeId(17));
        assert!("e17".parse::<EdgeId>().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(VehicleId(7).to_string(), "VehicleId(7)");
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimConfig, Tick, MAX_DURATION_TICKS};

    #[test]
    fn tick_arithmetic() {
        let t = Tick(10);
        assert_eq!(t + 5, Tick(15));
        assert_eq!(Tick(15) - Tick(10), 5u64);
        assert_eq!(Tick(3).saturating_since(Tick(10)), 0);
    }

    #[test]
    fn clock_elapsed() {
        let mut clock = SimClock::new(0.5);
        assert_eq!(clock.elapsed_secs(), 0.0);
        clock.advance();
        clock.advance();
        assert_eq!(clock.elapsed_secs(), 1.0);
    }

    #[test]
    fn clock_hms() {
        let mut clock = SimClock::new(60.0);
        for _ in 0..61 {
            clock.advance();
        }
        assert_eq!(clock.elapsed_hms(), (1, 1, 0));
    }

    #[test]
    fn ticks_for_secs_rounds_up() {
        let clock = SimClock::new(1.0);
        assert_eq!(clock.ticks_for_secs(30.0), 30);
        assert_eq!(clock.ticks_for_secs(0.0), 0);
        assert_eq!(clock.ticks_for_secs(0.2), 1);

        let coarse = SimClock::new(0.1);
        // 3.0 / 0.1 is not exactly 30 in binary floating point.
        assert_eq!(coarse.ticks_for_secs(3.0), 30);
    }

    #[test]
    fn duration_ticks_is_bounded_and_never_rounds_to_zero() {
        let clock = SimClock::new(1.0);
        assert_eq!(clock.duration_ticks(30.0), Some(30));
        assert_eq!(clock.duration_ticks(0.0), Some(0));
        assert_eq!(clock.duration_ticks(1e-12), Some(1));
        assert_eq!(clock.duration_ticks(MAX_DURATION_TICKS as f64), Some(MAX_DURATION_TICKS));
        assert_eq!(clock.duration_ticks(1e30), None);
        assert_eq!(clock.duration_ticks(-1.0), None);
        assert_eq!(clock.duration_ticks(f64::NAN), None);
    }

    #[test]
    fn reset_to_moves_clock() {
        let mut clock = SimClock::default();
        clock.reset_to(Tick(500));
        assert_eq!(clock.current_tick, Tick(500));
        assert_eq!(clock.to_string(), "T500 (00:08:20)");
    }

    #[test]
    fn sim_config_end_tick() {
        let cfg = SimConfig {
            tick_duration_secs: 1.0,
            total_ticks: 3_600,
            seed: 42,
        };
        assert_eq!(cfg.end_tick(), Tick(3_600));
        assert_eq!(cfg.make_clock().current_tick, Tick::ZERO);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn sim_config_rejects_bad_tick_duration() {
        for tick_duration_secs in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let cfg = SimConfig { tick_duration_secs, total_ticks: 10, seed: 0 };
            assert!(matches!(cfg.validate(), Err(crate::DtError::Config(_))));
        }
    }
}

#[cfg(test)]
mod rng {
    use crate::{VehicleId, VehicleRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = VehicleRng::new(12345, VehicleId(0));
        let mut r2 = VehicleRng::new(12345, VehicleId(0));
        for _ in 0..100 {
            assert_eq!(r1.gen_bool(0.5), r2.gen_bool(0.5));
        }
    }

    #[test]
    fn different_vehicles_differ() {
        let mut r0 = VehicleRng::new(1, VehicleId(0));
        let mut r1 = VehicleRng::new(1, VehicleId(1));
        let a: Vec<bool> = (0..64).map(|_| r0.gen_bool(0.5)).collect();
        let b: Vec<bool> = (0..64).map(|_| r1.gen_bool(0.5)).collect();
        assert_ne!(a, b, "seeds for adjacent vehicles should diverge");
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = VehicleRng::new(0, VehicleId(0));
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }
}
