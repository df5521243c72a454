//! Records serialized by one session and decoded by another
use rtcm::prelude::*;

fn gpst(tow: f64) -> Epoch {
    let nanos = (tow * 1.0E9).round() as u64;
    Epoch::from_time_of_week(2300, nanos, TimeScale::GPST)
}

fn decode(session: &mut Session, frame: &[u8]) -> Vec<Status> {
    frame
        .iter()
        .map(|byte| session.input_rtcm3(*byte))
        .filter(|status| status.is_complete())
        .collect()
}

fn decode_one(session: &mut Session, frame: &[u8]) -> Message {
    let mut statuses = decode(session, frame);
    assert_eq!(statuses.len(), 1);
    match statuses.remove(0) {
        Status::Decoded { message, .. } => message,
        status => panic!("unexpected status: {:?}", status),
    }
}

fn signal(code: ObsCode, lambda: f64, pseudorange: f64) -> SignalObservation {
    SignalObservation::new(code)
        .with_pseudorange(pseudorange)
        .with_phase(pseudorange / lambda - 42.5)
        .with_snr(45.0)
        .with_lock_time(Duration::from_seconds(30.0))
}

#[test]
fn legacy_gps_observations() {
    let (l1, l2) = (ObsCode::L1C, ObsCode::L2W);
    let lambda1 = l1.wavelength(Constellation::GPS, None).unwrap();
    let lambda2 = l2.wavelength(Constellation::GPS, None).unwrap();

    let mut tx = Session::default();
    tx.station_id = 77;
    tx.obs.epoch = gpst(259200.0);
    for (prn, pr) in [(5, 21_000_123.456), (12, 23_456_789.012), (30, 24_999_999.99)] {
        let sat = Sat::new(Constellation::GPS, prn).unwrap();
        let mut obs = Observation::new(sat);
        obs.insert(signal(l1, lambda1, pr));
        obs.insert(signal(l2, lambda2, pr + 3.5));
        tx.obs.records.push(obs);
    }

    let mut rx = Session::default().with_time(gpst(259000.0));
    for msg_type in [1001, 1002, 1003, 1004] {
        let frame = tx.encode_rtcm3(msg_type, 0, false).unwrap();
        let message = decode_one(&mut rx, &frame);
        assert_eq!(message, Message::Observation { complete: true });
        assert_eq!(rx.obs.epoch, gpst(259200.0));
        assert_eq!(rx.obs.station_id, 77);
        assert_eq!(rx.obs.len(), 3);

        for sent in tx.obs.records.iter() {
            let received = rx.obs.get(sent.sat).unwrap();
            let (s1, r1) = (sent.signal(l1).unwrap(), received.signal(l1).unwrap());
            if msg_type == 1001 || msg_type == 1003 {
                // pseudorange modulo one light millisecond
                let err = (s1.pseudorange.unwrap() - r1.pseudorange.unwrap()).abs()
                    % 299_792.458;
                assert!(err < 0.01 || err > 299_792.448);
                continue;
            }
            let err = (s1.pseudorange.unwrap() - r1.pseudorange.unwrap()).abs();
            assert!(err < 0.01, "{}: pseudorange error {}", sent.sat, err);
            let err = (s1.phase.unwrap() - r1.phase.unwrap()).abs();
            assert!(err < 0.005, "{}: phase error {}", sent.sat, err);
            assert_eq!(r1.snr, Some(45.0));
            assert_eq!(r1.lock_time, Duration::from_seconds(30.0));

            if msg_type == 1004 {
                let (s2, r2) = (sent.signal(l2).unwrap(), received.signal(l2).unwrap());
                let err = (s2.pseudorange.unwrap() - r2.pseudorange.unwrap()).abs();
                assert!(err < 0.02, "{}: L2 pseudorange error {}", sent.sat, err);
                let err = (s2.phase.unwrap() - r2.phase.unwrap()).abs();
                assert!(err < 0.005, "{}: L2 phase error {}", sent.sat, err);
            }
        }
    }
    assert_eq!(rx.stats.count(1004), 1);
}

#[test]
fn legacy_glonass_observations() {
    let sat = Sat::new(Constellation::Glonass, 7).unwrap();
    let fcn = Some(-3);
    let lambda1 = ObsCode::L1C.wavelength(Constellation::Glonass, fcn).unwrap();
    let lambda2 = ObsCode::L2C.wavelength(Constellation::Glonass, fcn).unwrap();

    let mut tx = Session::default();
    tx.obs.epoch = gpst(100000.0);
    let mut obs = Observation::new(sat);
    obs.insert(signal(ObsCode::L1C, lambda1, 20_123_456.78));
    obs.insert(signal(ObsCode::L2C, lambda2, 20_123_460.01));
    tx.obs.records.push(obs);

    // frequency channel is required
    assert!(matches!(
        tx.encode_rtcm3(1012, 0, false),
        Err(Error::NoData(1012))
    ));
    tx.nav.set_glonass_channel(7, -3);
    let frame = tx.encode_rtcm3(1012, 0, false).unwrap();

    let mut rx = Session::default().with_time(gpst(99000.0));
    decode_one(&mut rx, &frame);
    assert_eq!(rx.nav.glonass_channel(7), fcn);
    let received = rx.obs.get(sat).unwrap();
    let l1 = received.signal(ObsCode::L1C).unwrap();
    assert!((l1.pseudorange.unwrap() - 20_123_456.78).abs() < 0.01);
    let sent_phase = tx.obs.records[0].signal(ObsCode::L1C).unwrap().phase.unwrap();
    assert!((l1.phase.unwrap() - sent_phase).abs() < 0.005);
    let l2 = received.signal(ObsCode::L2C).unwrap();
    assert!((l2.pseudorange.unwrap() - 20_123_460.01).abs() < 0.02);
}

#[test]
fn station_metadata() {
    let mut tx = Session::default().with_time(gpst(100000.0));
    tx.station_id = 1234;
    tx.station = Station {
        station_id: 1234,
        itrf_year: 20,
        position: [4027881.8478, 306998.7631, 4919498.9842],
        antenna_height: 1.2345,
        antenna_descriptor: "TRM59800.00".to_string(),
        antenna_setup_id: 1,
        antenna_serial: "5000118726".to_string(),
        receiver_type: "SEPT POLARX5".to_string(),
        receiver_firmware: "5.5.0".to_string(),
        receiver_serial: "3047936".to_string(),
        glonass_bias_alignment: true,
        glonass_code_phase_bias: [Some(1.24), None, Some(-0.5), None],
        ..Default::default()
    };
    tx.text = "reference station moved".to_string();

    let mut rx = Session::default().with_time(gpst(100000.0));
    for (msg_type, message) in [
        (1006, Message::Station),
        (1008, Message::Station),
        (1033, Message::Station),
        (1230, Message::Station),
        (1029, Message::Text),
    ] {
        let frame = tx.encode_rtcm3(msg_type, 0, false).unwrap();
        assert_eq!(decode_one(&mut rx, &frame), message, "failed for {}", msg_type);
    }

    let station = &rx.station;
    assert_eq!(station.station_id, 1234);
    assert_eq!(station.itrf_year, 20);
    for i in 0..3 {
        assert!((station.position[i] - tx.station.position[i]).abs() < 1.0E-4);
    }
    assert!((station.antenna_height - 1.2345).abs() < 1.0E-4);
    assert_eq!(station.antenna_descriptor, "TRM59800.00");
    assert_eq!(station.antenna_serial, "5000118726");
    assert_eq!(station.receiver_type, "SEPT POLARX5");
    assert_eq!(station.receiver_firmware, "5.5.0");
    assert_eq!(station.receiver_serial, "3047936");
    assert!(station.glonass_bias_alignment);
    assert!((station.glonass_code_phase_bias[0].unwrap() - 1.24).abs() < 0.01);
    assert!(station.glonass_code_phase_bias[1].is_none());
    assert!((station.glonass_code_phase_bias[2].unwrap() + 0.5).abs() < 0.01);
    assert_eq!(rx.text, "reference station moved");
}

#[test]
fn ssr_code_biases() {
    let t = gpst(100010.0);
    let mut tx = Session::default();
    let sat = Sat::new(Constellation::GPS, 24).unwrap();
    let ssr = &mut tx.ssr[sat.index() - 1];
    ssr.set_epoch(
        SsrCategory::CodeBias,
        SsrEpoch {
            epoch: t,
            udi: 5,
            iod: 3,
        },
    );
    ssr.provider_id = 100;
    ssr.code_biases.insert(ObsCode::L1C, -1.23);
    ssr.code_biases.insert(ObsCode::L2W, 0.5);

    let frame = tx.encode_rtcm3(1059, 0, false).unwrap();
    let mut rx = Session::default().with_time(gpst(100000.0));
    assert_eq!(decode_one(&mut rx, &frame), Message::Ssr);

    let ssr = &rx.ssr[sat.index() - 1];
    assert!(ssr.updated);
    let epoch = ssr.epoch(SsrCategory::CodeBias).unwrap();
    assert_eq!(epoch.epoch, t);
    assert_eq!(epoch.update_interval(), Duration::from_seconds(30.0));
    assert_eq!(ssr.provider_id, 100);
    assert_eq!(ssr.code_biases.len(), 2);
    assert!((ssr.code_biases[&ObsCode::L1C] + 1.23).abs() < 1.0E-9);
    assert!((ssr.code_biases[&ObsCode::L2W] - 0.5).abs() < 1.0E-9);
}

#[test]
fn rtcm2_reference_time() {
    let mut tx = Session::default().with_time(gpst(100000.0));
    tx.station_id = 12;
    let frame = tx.encode_rtcm2(14).unwrap();

    let mut rx = Session::default().with_time(gpst(90000.0));
    let statuses = frame
        .iter()
        .map(|byte| rx.input_rtcm2(*byte))
        .filter(|status| status.is_complete())
        .collect::<Vec<_>>();
    assert_eq!(statuses.len(), 1);
    assert!(matches!(
        statuses[0],
        Status::Decoded {
            msg_type: 14,
            message: Message::Time
        }
    ));
    let t = rx.time.unwrap();
    assert!((t - gpst(100000.0)).abs() < Duration::from_milliseconds(600.0));
}

/// Observation with doppler consistent with this range rate [m/s]
fn moving_signal(
    constellation: Constellation,
    code: ObsCode,
    pseudorange: f64,
    range_rate: f64,
) -> SignalObservation {
    let lambda = code.wavelength(constellation, None).unwrap();
    signal(code, lambda, pseudorange).with_doppler(-range_rate / lambda)
}

/// Distance to the nearest multiple of one light millisecond [m]
fn modulo_ms(err: f64) -> f64 {
    let range_ms = 299_792.458;
    (err - (err / range_ms).round() * range_ms).abs()
}

#[test]
fn msm_variants() {
    for (constellation, satellites, codes, first) in [
        (
            Constellation::GPS,
            &[(3, 21_000_123.456), (29, 24_321_987.654)][..],
            &[ObsCode::L1C, ObsCode::L2W][..],
            1071,
        ),
        (
            Constellation::QZSS,
            &[(193, 37_000_123.456), (199, 38_456_789.012)][..],
            &[ObsCode::L1C, ObsCode::L2L, ObsCode::L5Q][..],
            1111,
        ),
    ] {
        let t = gpst(345600.0);
        let mut tx = Session::default();
        tx.station_id = 9;
        tx.obs.epoch = t;
        for (prn, pr) in satellites {
            let sat = Sat::new(constellation, *prn).unwrap();
            let mut obs = Observation::new(sat);
            for (i, code) in codes.iter().enumerate() {
                obs.insert(moving_signal(constellation, *code, pr + i as f64, 250.0));
            }
            tx.obs.records.push(obs);
        }

        for msg_type in first..first + 7 {
            let n = msg_type - first + 1;
            let frame = tx.encode_rtcm3(msg_type, 0, false).unwrap();

            let mut rx = Session::default().with_time(gpst(345590.0));
            let message = decode_one(&mut rx, &frame);
            assert_eq!(message, Message::Observation { complete: true });
            assert_eq!(rx.obs.epoch, t, "{}: bad epoch", msg_type);
            assert_eq!(rx.obs.station_id, 9);
            assert_eq!(rx.obs.len(), satellites.len(), "{}", msg_type);

            let (pr_tol, cp_tol) = if n >= 6 {
                (0.001, 0.0002)
            } else {
                (0.01, 0.0005)
            };

            for sent in tx.obs.records.iter() {
                let received = rx.obs.get(sent.sat).unwrap();
                for code in codes.iter() {
                    let lambda = code.wavelength(constellation, None).unwrap();
                    let (s, r) = (sent.signal(*code).unwrap(), received.signal(*code).unwrap());

                    match r.pseudorange {
                        Some(pr) => {
                            assert!(n != 2, "{}: unexpected pseudorange", msg_type);
                            let err = s.pseudorange.unwrap() - pr;
                            let err = if n <= 3 { modulo_ms(err) } else { err.abs() };
                            assert!(
                                err < pr_tol,
                                "{} {} {}: pr error {}",
                                msg_type,
                                sent.sat,
                                code,
                                err
                            );
                        },
                        None => assert_eq!(n, 2, "{}: missing pseudorange", msg_type),
                    }

                    match r.phase {
                        Some(phase) => {
                            let err = (s.phase.unwrap() - phase) * lambda;
                            let err = if n <= 3 { modulo_ms(err) } else { err.abs() };
                            assert!(
                                err < cp_tol,
                                "{} {} {}: phase error {}",
                                msg_type,
                                sent.sat,
                                code,
                                err
                            );
                            assert!(r.lock_time > Duration::ZERO);
                        },
                        None => assert_eq!(n, 1, "{}: missing phase", msg_type),
                    }

                    if n >= 4 {
                        assert_eq!(r.snr, Some(45.0), "{}: bad snr", msg_type);
                    } else {
                        assert!(r.snr.is_none());
                    }

                    match r.doppler {
                        Some(doppler) => {
                            let err = (s.doppler.unwrap() - doppler).abs();
                            assert!(err < 0.001, "{} {}: doppler error {}", msg_type, code, err);
                        },
                        None => assert!(n != 5 && n != 7, "{}: missing doppler", msg_type),
                    }
                }
            }
        }
    }
}

/// Keplerian ephemeris with quantization friendly values
fn kepler(sat: Sat, week: u32, toe_s: f64) -> Ephemeris {
    let mut eph = Ephemeris::new(sat);
    eph.week = week;
    eph.iode = 77;
    eph.iodc = 77;
    eph.sva = 1;
    eph.toe_s = toe_s;
    eph.toe = gpst(toe_s);
    eph.toc = eph.toe;
    eph.sqrt_a = 6493.3;
    eph.e = 0.075;
    eph.i0_rad = 0.72;
    eph.omega_0_rad = 1.1;
    eph.omega_rad = -1.57;
    eph.m0_rad = 0.25;
    eph.delta_n_rad_s = 2.5E-9;
    eph.omega_dot_rad_s = -3.0E-9;
    eph.crs = -12.5;
    eph.crc = 150.0;
    eph.clock_offset = -2.0E-4;
    eph.clock_drift = 5.0E-12;
    eph
}

#[test]
fn qzss_and_galileo_fnav_ephemerides() {
    let qzs = Sat::new(Constellation::QZSS, 195).unwrap();
    let gal = Sat::new(Constellation::Galileo, 26).unwrap();

    let mut qzs_eph = kepler(qzs, 2300, 100800.0);
    qzs_eph.fit_hours = 2.0;
    qzs_eph.tgd[0] = -4.0E-9;

    let mut gal_eph = kepler(gal, 1276, 100800.0);
    gal_eph.sv_health = (2 << 4) + (1 << 3);
    gal_eph.sva = 107;

    let mut tx = Session::default();
    assert!(tx.nav.update_ephemeris(qzs_eph.clone(), 0, false));
    assert!(tx.nav.update_ephemeris(gal_eph.clone(), 1, false));

    let mut rx = Session::default().with_time(gpst(100000.0));
    for (msg_type, sat, set, sent) in [(1044, qzs, 0, &qzs_eph), (1045, gal, 1, &gal_eph)] {
        tx.eph_sat = Some(sat);
        tx.eph_set = set;
        let frame = tx.encode_rtcm3(msg_type, 0, false).unwrap();
        assert_eq!(
            decode_one(&mut rx, &frame),
            Message::Ephemeris { sat, updated: true },
            "failed for {}",
            msg_type
        );
        assert_eq!(rx.eph_sat, Some(sat));
        assert_eq!(rx.eph_set, set);

        let eph = rx.nav.ephemeris(sat, set).unwrap();
        assert_eq!(eph.sat, sat);
        assert_eq!(eph.week, sent.week);
        assert_eq!(eph.iode, sent.iode);
        assert_eq!(eph.sva, sent.sva);
        assert_eq!(eph.sv_health, sent.sv_health);
        assert_eq!(eph.toe_s, 100800.0);
        assert!((eph.toe - sent.toe).abs() < Duration::from_milliseconds(1.0));
        assert!((eph.toc - sent.toc).abs() < Duration::from_milliseconds(1.0));
        assert!((eph.sqrt_a - sent.sqrt_a).abs() < 1.0E-5);
        assert!((eph.e - sent.e).abs() < 1.0E-9);
        assert!((eph.m0_rad - sent.m0_rad).abs() < 1.0E-8);
        assert!((eph.omega_rad - sent.omega_rad).abs() < 1.0E-8);
        assert!((eph.crc - sent.crc).abs() < 0.05);
        assert!((eph.clock_offset - sent.clock_offset).abs() < 1.0E-9);
        assert!((eph.clock_drift - sent.clock_drift).abs() < 1.0E-13);
        assert!(eph.is_valid(gpst(100000.0)));
    }

    let qzs_rx = rx.nav.ephemeris(qzs, 0).unwrap();
    assert_eq!(qzs_rx.iodc, 77);
    assert_eq!(qzs_rx.fit_hours, 2.0);
    assert!((qzs_rx.tgd[0] - qzs_eph.tgd[0]).abs() < 1.0E-9);

    // F/NAV data set only
    let gal_rx = rx.nav.ephemeris(gal, 1).unwrap();
    assert_eq!(gal_rx.code, (1 << 1) + (1 << 8));
    assert!(rx.nav.ephemeris(gal, 0).is_none());
}

#[test]
fn ssr_messages() {
    for (msg_type, constellation, prn, updated) in [
        (1057, Constellation::GPS, 8, &[SsrCategory::Orbit][..]),
        (1058, Constellation::GPS, 8, &[SsrCategory::Clock][..]),
        (1061, Constellation::GPS, 8, &[SsrCategory::Ura][..]),
        (1062, Constellation::GPS, 8, &[SsrCategory::HighRateClock][..]),
        (1063, Constellation::Glonass, 14, &[SsrCategory::Orbit][..]),
        (1064, Constellation::Glonass, 14, &[SsrCategory::Clock][..]),
        (1065, Constellation::Glonass, 14, &[SsrCategory::CodeBias][..]),
        (1066, Constellation::Glonass, 14, &[SsrCategory::Orbit, SsrCategory::Clock][..]),
        (1067, Constellation::Glonass, 14, &[SsrCategory::Ura][..]),
        (1068, Constellation::Glonass, 14, &[SsrCategory::HighRateClock][..]),
        (1266, Constellation::Glonass, 14, &[SsrCategory::PhaseBias][..]),
        (1246, Constellation::QZSS, 194, &[SsrCategory::Orbit][..]),
        (1247, Constellation::QZSS, 194, &[SsrCategory::Clock][..]),
        (1248, Constellation::QZSS, 194, &[SsrCategory::CodeBias][..]),
        (1249, Constellation::QZSS, 194, &[SsrCategory::Orbit, SsrCategory::Clock][..]),
        (1250, Constellation::QZSS, 194, &[SsrCategory::Ura][..]),
        (1251, Constellation::QZSS, 194, &[SsrCategory::HighRateClock][..]),
        (1268, Constellation::QZSS, 194, &[SsrCategory::PhaseBias][..]),
    ] {
        let t = gpst(100010.0);
        let sat = Sat::new(constellation, prn).unwrap();

        let mut tx = Session::default();
        let ssr = &mut tx.ssr[sat.index() - 1];
        for category in SsrCategory::ALL {
            ssr.set_epoch(
                category,
                SsrEpoch {
                    epoch: t,
                    udi: 3,
                    iod: 9,
                },
            );
        }
        ssr.provider_id = 4321;
        ssr.solution_id = 2;
        ssr.iode = 55;
        ssr.orbit = [0.1234, -0.5, 1.0];
        ssr.orbit_rate = [0.000123, 0.0, -0.00004];
        ssr.clock = [-1.5, 0.001, 0.0];
        ssr.ura = 23;
        ssr.high_rate_clock = 0.0125;
        ssr.code_biases.insert(ObsCode::L1C, -1.23);
        ssr.yaw_angle = 90.0;
        ssr.phase_biases.insert(
            ObsCode::L1C,
            PhaseBias {
                bias: 0.1234,
                integer: true,
                wide_lane: 2,
                discontinuity: 9,
            },
        );

        let frame = tx.encode_rtcm3(msg_type, 0, false).unwrap();
        let mut rx = Session::default().with_time(gpst(100000.0));
        assert_eq!(decode_one(&mut rx, &frame), Message::Ssr, "failed for {}", msg_type);

        let ssr = &rx.ssr[sat.index() - 1];
        assert!(ssr.updated);
        assert_eq!((ssr.provider_id, ssr.solution_id), (4321, 2));
        for category in SsrCategory::ALL {
            match ssr.epoch(category) {
                Some(epoch) => {
                    assert!(updated.contains(&category), "{}: {:?}", msg_type, category);
                    assert!((epoch.epoch - t).abs() < Duration::from_milliseconds(1.0));
                    assert_eq!((epoch.udi, epoch.iod), (3, 9));
                },
                None => assert!(!updated.contains(&category), "{}: {:?}", msg_type, category),
            }
        }

        if updated.contains(&SsrCategory::Orbit) {
            assert_eq!(ssr.iode, 55);
            for i in 0..3 {
                assert!((ssr.orbit[i] - tx.ssr[sat.index() - 1].orbit[i]).abs() < 1.0E-9);
                assert!(
                    (ssr.orbit_rate[i] - tx.ssr[sat.index() - 1].orbit_rate[i]).abs() < 1.0E-9
                );
            }
        }
        if updated.contains(&SsrCategory::Clock) {
            assert!((ssr.clock[0] + 1.5).abs() < 1.0E-9);
            assert!((ssr.clock[1] - 0.001).abs() < 1.0E-9);
        }
        if updated.contains(&SsrCategory::Ura) {
            assert_eq!(ssr.ura, 23);
        }
        if updated.contains(&SsrCategory::HighRateClock) {
            assert!((ssr.high_rate_clock - 0.0125).abs() < 1.0E-9);
        }
        if updated.contains(&SsrCategory::CodeBias) {
            assert_eq!(ssr.code_biases.len(), 1);
            assert!((ssr.code_biases[&ObsCode::L1C] + 1.23).abs() < 1.0E-9);
        }
        if updated.contains(&SsrCategory::PhaseBias) {
            assert_eq!(ssr.yaw_angle, 90.0);
            let bias = ssr.phase_biases[&ObsCode::L1C];
            assert!(bias.integer);
            assert_eq!((bias.wide_lane, bias.discontinuity), (2, 9));
            assert!((bias.bias - 0.1234).abs() < 1.0E-9);
        } else {
            assert!(ssr.phase_biases.is_empty());
        }
    }
}
