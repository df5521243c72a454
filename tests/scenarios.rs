//! Hand built frames, decoded through the public API
use rtcm::prelude::*;

fn gpst(tow: f64) -> Epoch {
    let nanos = (tow * 1.0E9).round() as u64;
    Epoch::from_time_of_week(2300, nanos, TimeScale::GPST)
}

/// GPS MSM4, station 0, tow 100000 s:
/// G05 and G12, 1C and 2W signals, 4 cells.
const MSM4_2X2: [u8; 57] = [
    0xD3, 0x00, 0x33, 0x43, 0x20, 0x00, 0x17, 0xD7, 0x84, 0x00, 0x00, 0x00, 0x04, 0x08,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x20, 0x20, 0x00, 0x00, 0x7A, 0x32, 0x70, 0xF6,
    0xE4, 0x03, 0xE8, 0xF0, 0x60, 0x2E, 0xE3, 0x83, 0x00, 0x13, 0x88, 0x1F, 0x63, 0xC0,
    0x03, 0xA9, 0x81, 0xEC, 0x78, 0x02, 0xAB, 0x01, 0x5B, 0x45, 0x93, 0x80, 0xBD, 0xA1,
    0x03,
];

fn feed(session: &mut Session, bytes: &[u8]) -> Vec<Status> {
    bytes
        .iter()
        .map(|byte| session.input_rtcm3(*byte))
        .filter(|status| status.is_complete())
        .collect()
}

#[test]
fn msm4_two_by_two() {
    let mut session = Session::default().with_time(gpst(100000.0));
    let statuses = feed(&mut session, &MSM4_2X2);
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].code(), 1074);

    assert_eq!(session.obs.epoch, gpst(100000.0));
    assert_eq!(session.obs.len(), 2);
    let entries = session
        .obs
        .records
        .iter()
        .map(|obs| obs.signals().count())
        .sum::<usize>();
    assert_eq!(entries, 4);

    let g05 = Sat::new(Constellation::GPS, 5).unwrap();
    let g12 = Sat::new(Constellation::GPS, 12).unwrap();

    for (sat, code, pseudorange, phase, snr) in [
        (g05, ObsCode::L1C, 21021500.155911636, 110468752.39746809, 45.0),
        (g05, ObsCode::L2W, 21021446.54884274, 86079272.93272018, 40.0),
        (g12, ObsCode::L1C, 23517366.66002202, 123584666.35256052, 44.0),
        (g12, ObsCode::L2W, 23517241.576861262, 96299099.77169037, 39.0),
    ] {
        let signal = session.obs.get(sat).unwrap().signal(code).unwrap();
        let err = (signal.pseudorange.unwrap() - pseudorange).abs();
        assert!(err < 0.0005, "{} {}: pseudorange error {}", sat, code, err);
        let err = (signal.phase.unwrap() - phase).abs();
        assert!(err < 1.0E-4, "{} {}: phase error {}", sat, code, err);
        assert_eq!(signal.snr, Some(snr));
        assert!(signal.doppler.is_none());
    }

    // lock indicators
    let l1 = session.obs.get(g05).unwrap().signal(ObsCode::L1C).unwrap();
    assert_eq!(l1.lock_time, Duration::from_milliseconds(512.0));
    assert!(l1.lli.is_empty());

    let l1 = session.obs.get(g12).unwrap().signal(ObsCode::L1C).unwrap();
    assert_eq!(l1.lock_time, Duration::from_milliseconds(1024.0));
    assert!(l1.lli.contains(LliFlags::HALF_CYCLE_SLIP));
    assert!(!l1.lli.contains(LliFlags::LOCK_LOSS));

    // null lock time, never locked
    let l2 = session.obs.get(g12).unwrap().signal(ObsCode::L2W).unwrap();
    assert!(l2.lli.contains(LliFlags::LOCK_LOSS));
    assert_eq!(session.lock_tracker().losses(g12, 1), 1);

    // same frame again: lock loss is declared once more for the null lock time only
    feed(&mut session, &MSM4_2X2);
    assert_eq!(session.lock_tracker().losses(g12, 1), 2);
    assert_eq!(session.lock_tracker().losses(g12, 0), 0);
    assert_eq!(session.lock_tracker().losses(g05, 0), 0);
    assert_eq!(session.stats.count(1074), 2);
}

#[test]
fn truncated_msm4_is_not_committed() {
    let mut session = Session::default().with_time(gpst(100000.0));
    feed(&mut session, &MSM4_2X2);

    // same content, cut after 40 payload bytes
    let mut frame = vec![0xD3, 0x00, 40];
    frame.extend_from_slice(&MSM4_2X2[3..43]);
    frame.extend_from_slice(&[0xEB, 0x09, 0x44]);

    let statuses = feed(&mut session, &frame);
    assert_eq!(statuses.len(), 1);
    assert!(matches!(statuses[0], Status::Rejected(Error::NotEnoughBits)));
    assert_eq!(statuses[0].code(), -3);

    // previous epoch untouched
    assert_eq!(session.obs.len(), 2);
    let g12 = Sat::new(Constellation::GPS, 12).unwrap();
    assert_eq!(session.lock_tracker().losses(g12, 1), 1);
    assert_eq!(session.stats.decode_failures, 1);
}

#[test]
fn session_reset() {
    let mut session = Session::default().with_time(gpst(100000.0));
    feed(&mut session, &MSM4_2X2);
    // partial frame pending
    feed(&mut session, &MSM4_2X2[..10]);
    assert_ne!(session.state(), State::Synchronizing);

    session.reset();
    assert_eq!(session.state(), State::Synchronizing);
    assert!(session.obs.is_empty());
    assert!(session.time.is_none());
    assert_eq!(session.stats, Statistics::default());
    let g12 = Sat::new(Constellation::GPS, 12).unwrap();
    assert_eq!(session.lock_tracker().losses(g12, 1), 0);
}
