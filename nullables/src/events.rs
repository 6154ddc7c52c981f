//! Event capture for assertions.

use ecn_registry::CertificateEvent;
use std::sync::{Arc, Mutex};

/// Collects every event delivered to the listeners it hands out.
#[derive(Clone, Debug, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<CertificateEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener suitable for `CertificateRegistry::subscribe`.
    pub fn listener(&self) -> Box<dyn Fn(&CertificateEvent) + Send + Sync> {
        let events = Arc::clone(&self.events);
        Box::new(move |event: &CertificateEvent| {
            events.lock().unwrap().push(event.clone());
        })
    }

    /// Everything recorded so far, oldest first.
    pub fn events(&self) -> Vec<CertificateEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<CertificateEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecn_types::HolderAddress;

    #[test]
    fn listener_records_in_order() {
        let recorder = EventRecorder::new();
        let listener = recorder.listener();
        let by = HolderAddress::new([1; 20]);
        listener(&CertificateEvent::Suspended { by });
        listener(&CertificateEvent::Resumed { by });
        assert_eq!(
            recorder.events(),
            vec![
                CertificateEvent::Suspended { by },
                CertificateEvent::Resumed { by }
            ]
        );
        assert_eq!(recorder.drain().len(), 2);
        assert!(recorder.is_empty());
    }
}
