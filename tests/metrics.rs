//! Metrics emitted while serving, captured with an in-process recorder.

use std::io::Write;
use std::net::TcpStream;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use metrics::{
    Counter, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};

mod common;

use common::{raw_request, TestServer};

/// Every value the queue depth gauge was set to, in order.
#[derive(Default)]
struct DepthHistory(Mutex<Vec<f64>>);

impl DepthHistory {
    fn values(&self) -> Vec<f64> {
        self.0.lock().unwrap().clone()
    }
}

impl GaugeFn for DepthHistory {
    fn increment(&self, _value: f64) {}

    fn decrement(&self, _value: f64) {}

    fn set(&self, value: f64) {
        self.0.lock().unwrap().push(value);
    }
}

struct CapturingRecorder {
    depth: Arc<DepthHistory>,
}

impl Recorder for CapturingRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
        Counter::noop()
    }

    fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
        if key.name() == "fileserver_queue_depth" {
            Gauge::from_arc(Arc::clone(&self.depth))
        } else {
            Gauge::noop()
        }
    }

    fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

fn depth_history() -> Arc<DepthHistory> {
    static HISTORY: OnceLock<Arc<DepthHistory>> = OnceLock::new();
    HISTORY
        .get_or_init(|| {
            let depth = Arc::new(DepthHistory::default());
            let recorder = CapturingRecorder {
                depth: Arc::clone(&depth),
            };
            if metrics::set_global_recorder(recorder).is_err() {
                panic!("a metrics recorder was already installed");
            }
            depth
        })
        .clone()
}

#[test]
fn test_queue_depth_gauge_falls_as_workers_drain() {
    let history = depth_history();
    let server = TestServer::start_with(|config| {
        config.workers.threads = 1;
        config.workers.queue_capacity = 4;
    });
    std::fs::write(server.path("f"), "ok").unwrap();

    // Holds the only worker until its head is complete.
    let mut slow = TcpStream::connect(server.addr).unwrap();
    slow.write_all(b"GET /f HTTP/1.1\r\n").unwrap();

    let waiting: Vec<_> = (0..3)
        .map(|_| {
            let addr = server.addr;
            std::thread::spawn(move || raw_request(addr, b"GET /f HTTP/1.1\r\n\r\n"))
        })
        .collect();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !history.values().contains(&3.0) {
        assert!(Instant::now() < deadline, "queue never reached 3: {:?}", history.values());
        std::thread::sleep(Duration::from_millis(10));
    }

    slow.write_all(b"\r\n").unwrap();
    for waiter in waiting {
        let response = waiter.join().unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    }
    drop(slow);

    assert_eq!(server.audit_lines(4).len(), 4);
    assert_eq!(history.values().last(), Some(&0.0));
}
