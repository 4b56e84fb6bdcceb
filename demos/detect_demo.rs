//! Demonstration of paw detection on the live keyboard.
//!
//! This example shows how to:
//! 1. Check for Input Monitoring permission
//! 2. Build the default rule chain
//! 3. Start a detector on the platform key hook
//! 4. React to detections without locking anything
//!
//! Run with: cargo run --example detect_demo
//!
//! Try mashing three neighboring keys (e.g. s, d and f) at the same time.
//!
//! Note: Requires Input Monitoring permission on macOS.
//! Grant permission in System Settings > Privacy & Security > Input Monitoring

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use paws::{
    collector::{check_permission, Collector},
    config::Config,
    logging::init_logging,
    Detector, PRIVACY_DECLARATION,
};

fn main() {
    let _guard = init_logging("info", false, None).expect("Failed to initialize logging");

    println!("Paws - Detect Demo");
    println!("==================");
    println!();
    println!("{PRIVACY_DECLARATION}");
    println!();

    print!("Checking Input Monitoring permission... ");
    if check_permission() {
        println!("OK ✓");
    } else {
        println!("FAILED ✗");
        println!();
        println!("Please grant Input Monitoring permission:");
        println!("1. Open System Settings");
        println!("2. Go to Privacy & Security > Input Monitoring");
        println!("3. Add this application");
        println!("4. Restart this demo");
        return;
    }
    println!();

    let chain = Config::default()
        .build_chain()
        .expect("Default rules are valid");

    let (paw_tx, paw_rx) = crossbeam_channel::unbounded();
    let mut detector = Detector::new(Collector::new(), chain, move || {
        let _ = paw_tx.send(());
    });

    println!("Watching for 30 seconds...");
    println!("Mash a few neighboring keys at once!");
    println!();

    if let Err(e) = detector.start() {
        eprintln!("Error starting detector: {e}");
        return;
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let start = std::time::Instant::now();
    let mut paws_seen = 0;

    while running.load(Ordering::SeqCst) && start.elapsed() < Duration::from_secs(30) {
        match paw_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(()) => {
                paws_seen += 1;
                println!(
                    "  [{:>4.1}s] Paw detected! (buffer: {:?})",
                    start.elapsed().as_secs_f64(),
                    detector
                        .buffered_events()
                        .iter()
                        .map(|e| e.key.to_string())
                        .collect::<Vec<_>>()
                );
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    println!();
    println!("Stopping detector...");
    if let Err(e) = detector.stop() {
        eprintln!("Error stopping detector: {e}");
    }

    println!();
    println!("Paws seen: {paws_seen}");
    println!("{}", detector.transparency_log().summary());
}
