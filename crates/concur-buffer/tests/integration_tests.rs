//! Multi-threaded integration coverage for `Buffer`: no byte lost or
//! duplicated across concurrent producers draining to a single consumer.

use concur_buffer::Buffer;
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_producers_single_consumer_no_loss_or_duplication() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 200;

    let buf = Arc::new(Buffer::new(12).unwrap()); // 4096-byte capacity
    let mut handles = Vec::new();

    for p in 0..PRODUCERS {
        let buf = Arc::clone(&buf);
        handles.push(thread::spawn(move || {
            let marker = p as u8;
            let mut sent = 0usize;
            while sent < PER_PRODUCER {
                let chunk = [marker; 1];
                let mut backoff_spins = 0;
                loop {
                    let n = buf.put(&chunk);
                    if n == 1 {
                        sent += 1;
                        break;
                    }
                    backoff_spins += 1;
                    if backoff_spins > 1_000_000 {
                        panic!("producer {p} could not make progress");
                    }
                    std::thread::yield_now();
                }
            }
        }));
    }

    let total_expected = PRODUCERS * PER_PRODUCER;
    let mut received_counts = [0usize; PRODUCERS];
    let mut total_received = 0usize;

    while total_received < total_expected {
        let mut dest = [0u8; 4096];
        let n = buf.get(&mut dest);
        for &b in &dest[..n] {
            received_counts[b as usize] += 1;
        }
        total_received += n;
        if n == 0 {
            std::thread::yield_now();
        }
    }

    for h in handles {
        h.join().unwrap();
    }

    for (p, &count) in received_counts.iter().enumerate() {
        assert_eq!(count, PER_PRODUCER, "producer {p} byte count mismatch");
    }
}
