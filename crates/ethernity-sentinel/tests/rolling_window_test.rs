use bigdecimal::BigDecimal;
use ethernity_core::Error;
use ethernity_sentinel::RollingWindow;
use std::num::NonZeroUsize;

fn window(capacity: usize) -> RollingWindow {
    RollingWindow::new(NonZeroUsize::new(capacity).unwrap())
}

fn d(text: &str) -> BigDecimal {
    text.parse().unwrap()
}

#[test]
fn empty_window_has_no_average() {
    let w = window(3);
    assert!(w.is_empty());
    assert!(matches!(w.average(), Err(Error::InsufficientData(_))));
}

#[test]
fn keeps_only_the_most_recent_samples() {
    let mut w = window(3);
    for sample in ["1", "2", "3", "4", "5"] {
        w.add_element(d(sample));
    }

    assert_eq!(w.len(), 3);
    assert_eq!(w.capacity(), 3);
    assert_eq!(w.iter().cloned().collect::<Vec<_>>(), vec![d("3"), d("4"), d("5")]);
    assert_eq!(w.average().unwrap(), d("4"));
}

#[test]
fn partial_window_averages_what_it_has() {
    let mut w = window(10);
    w.add_element(d("100"));
    w.add_element(d("50"));
    assert_eq!(w.average().unwrap(), d("75"));
}

#[test]
fn average_is_exact_after_many_evictions() {
    let mut w = window(4);
    for i in 0..10_000u32 {
        w.add_element(d(&i.to_string()) / d("10"));
    }

    // 999.6 + 999.7 + 999.8 + 999.9
    assert_eq!(w.average().unwrap(), d("999.75"));
}

#[test]
fn fractional_samples_keep_precision() {
    let mut w = window(3);
    w.add_element(d("0.1"));
    w.add_element(d("0.2"));
    w.add_element(d("0.3"));
    assert_eq!(w.average().unwrap(), d("0.2"));
}

#[test]
fn capacity_one_tracks_last_sample() {
    let mut w = window(1);
    w.add_element(d("7"));
    w.add_element(d("-2"));
    assert_eq!(w.len(), 1);
    assert_eq!(w.average().unwrap(), d("-2"));
}

#[test]
fn full_window_of_256_bit_values_keeps_exact_mean() {
    // perto do máximo de um uint256
    let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
    let mut w = window(20);
    for _ in 0..20 {
        w.add_element(d(max));
    }
    assert_eq!(w.average().unwrap(), d(max));

    w.add_element(d("1000000000000000000000000000001"));
    assert_eq!(w.len(), 20);
    assert!(w.average().unwrap() < d(max));
}
