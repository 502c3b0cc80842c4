use super::{Detection, DetectionBackend, Frame};
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);
const PROBE_SIZE: u32 = 64;

/// Ordered detection backends. The first one that initializes and answers a
/// probe within the timeout is used from then on.
pub struct BackendChain {
    backends: Vec<Arc<dyn DetectionBackend>>,
    active: OnceCell<Option<Arc<dyn DetectionBackend>>>,
    probe_timeout: Duration,
}

impl Default for BackendChain {
    fn default() -> Self {
        BackendChain::new(Vec::new())
    }
}

impl BackendChain {
    pub fn new(backends: Vec<Arc<dyn DetectionBackend>>) -> BackendChain {
        BackendChain {
            backends,
            active: OnceCell::new(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> BackendChain {
        self.probe_timeout = timeout;
        self
    }

    /// Select a backend. Later calls reuse the first result; concurrent
    /// callers wait on the same selection.
    pub async fn init(&self) -> bool {
        self.active
            .get_or_init(|| self.select())
            .await
            .is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.active.initialized()
    }

    pub fn active_name(&self) -> Option<&'static str> {
        self.active.get()?.as_ref().map(|b| b.name())
    }

    /// `None` when there is no face or no usable backend.
    pub async fn detect(&self, frame: Frame) -> Option<Detection> {
        let backend = self.active.get()?.as_ref()?;
        backend.detect(frame).await
    }

    async fn select(&self) -> Option<Arc<dyn DetectionBackend>> {
        for backend in &self.backends {
            let name = backend.name();
            info!("Initializing detection backend {name}");

            if !backend.init().await {
                warn!("Backend {name} failed to initialize");
                continue;
            }
            if self.probe(backend.as_ref()).await {
                info!("Using detection backend {name}");
                return Some(backend.clone());
            }
        }

        warn!("No detection backend available");
        None
    }

    async fn probe(&self, backend: &dyn DetectionBackend) -> bool {
        let frame = Arc::new(RgbaImage::new(PROBE_SIZE, PROBE_SIZE));
        match tokio::time::timeout(self.probe_timeout, backend.detect(frame)).await {
            Ok(_) => true,
            Err(_) => {
                warn!(
                    "Backend {} probe timed out after {:?}",
                    backend.name(),
                    self.probe_timeout
                );
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shapes::Rect;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scriptable backend for exercising the chain and session.
    pub struct MockBackend {
        pub name: &'static str,
        pub ready: bool,
        pub delay: Duration,
        pub face: Option<Rect>,
        pub inits: AtomicUsize,
        pub detects: AtomicUsize,
    }

    impl MockBackend {
        pub fn new(name: &'static str, face: Option<Rect>) -> MockBackend {
            MockBackend {
                name,
                ready: true,
                delay: Duration::ZERO,
                face,
                inits: AtomicUsize::new(0),
                detects: AtomicUsize::new(0),
            }
        }
    }

    impl DetectionBackend for MockBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        fn init(&self) -> BoxFuture<'_, bool> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            async move { self.ready }.boxed()
        }

        fn detect(&self, _frame: Frame) -> BoxFuture<'_, Option<Detection>> {
            self.detects.fetch_add(1, Ordering::SeqCst);
            async move {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                self.face.map(|b| Detection::from_box(b, 0.9))
            }
            .boxed()
        }
    }

    fn frame() -> Frame {
        Arc::new(RgbaImage::new(4, 4))
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain = BackendChain::default();
        assert!(!chain.init().await);
        assert!(chain.is_initialized());
        assert!(chain.detect(frame()).await.is_none());
    }

    #[tokio::test]
    async fn test_detect_before_init() {
        let fast = Arc::new(MockBackend::new("fast", Some(Rect::new(1., 1., 5., 5.))));
        let chain = BackendChain::new(vec![fast]);
        assert!(chain.detect(frame()).await.is_none());
    }

    #[tokio::test]
    async fn test_falls_back_when_unavailable() {
        let mut fast = MockBackend::new("fast", None);
        fast.ready = false;
        let heavy = Arc::new(MockBackend::new("heavy", Some(Rect::new(10., 10., 20., 20.))));
        let chain = BackendChain::new(vec![Arc::new(fast), heavy.clone()]);

        assert!(chain.init().await);
        assert_eq!(chain.active_name(), Some("heavy"));
        let det = chain.detect(frame()).await.unwrap();
        assert_eq!(det.bounds, Rect::new(10., 10., 20., 20.));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probe_falls_back() {
        let mut slow = MockBackend::new("slow", None);
        slow.delay = Duration::from_secs(5);
        let heavy = Arc::new(MockBackend::new("heavy", None));
        let chain = BackendChain::new(vec![Arc::new(slow), heavy]);

        assert!(chain.init().await);
        assert_eq!(chain.active_name(), Some("heavy"));
    }

    #[tokio::test]
    async fn test_selects_once() {
        let fast = Arc::new(MockBackend::new("fast", None));
        let chain = Arc::new(BackendChain::new(vec![fast.clone()]));

        let (a, b) = tokio::join!(chain.init(), chain.init());
        assert!(a && b);
        assert!(chain.init().await);
        assert_eq!(fast.inits.load(Ordering::SeqCst), 1);
        // one probe only
        assert_eq!(fast.detects.load(Ordering::SeqCst), 1);
    }
}
